//! Human-readable summaries of actuator state changes.

use super::payload::ActuatorState;

/// Phrasing used for summary clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    /// `Speed changed from 50% to 80%`.
    Automatic,
    /// `Speed manually changed from 50% to 80%`.
    Manual,
}

impl SummaryStyle {
    const fn verb(self) -> &'static str {
        match self {
            Self::Automatic => "changed",
            Self::Manual => "manually changed",
        }
    }
}

/// Compares `old` and `new` field by field and describes every difference.
///
/// Fields absent on both sides are skipped. A numeric field present on
/// only one side compares against 0; a status present on only one side
/// compares against `N/A`. Returns `None` when nothing changed.
#[must_use]
pub fn summarize_changes(
    old: Option<&ActuatorState>,
    new: Option<&ActuatorState>,
    style: SummaryStyle,
) -> Option<String> {
    let empty = ActuatorState::default();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);
    let verb = style.verb();

    let mut clauses = Vec::new();

    if old.status.is_some() || new.status.is_some() {
        let before = old.status.as_deref().unwrap_or("N/A");
        let after = new.status.as_deref().unwrap_or("N/A");
        if before != after {
            clauses.push(format!("Status {verb} from {before} to {after}"));
        }
    }

    let numeric = [
        ("Speed", old.speed, new.speed, "%"),
        ("Level", old.level, new.level, ""),
        ("Target speed", old.target_speed, new.target_speed, "%"),
    ];
    for (label, before, after, unit) in numeric {
        if before.is_none() && after.is_none() {
            continue;
        }
        let before = before.unwrap_or(0.0);
        let after = after.unwrap_or(0.0);
        if (before - after).abs() > f64::EPSILON {
            clauses.push(format!(
                "{label} {verb} from {}{unit} to {}{unit}",
                format_number(before),
                format_number(after)
            ));
        }
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(", "))
    }
}

/// Formats whole numbers without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: Option<&str>, speed: Option<f64>) -> ActuatorState {
        ActuatorState {
            status: status.map(str::to_string),
            speed,
            ..ActuatorState::default()
        }
    }

    #[test]
    fn status_change_without_speed_change() {
        let old = state(Some("ON"), Some(50.0));
        let new = state(Some("OFF"), Some(50.0));
        let summary = summarize_changes(Some(&old), Some(&new), SummaryStyle::Automatic);
        assert_eq!(summary.as_deref(), Some("Status changed from ON to OFF"));
    }

    #[test]
    fn multiple_clauses_in_field_order() {
        let old = ActuatorState {
            status: Some("OFF".to_string()),
            speed: Some(0.0),
            level: Some(1.0),
            target_speed: None,
        };
        let new = ActuatorState {
            status: Some("ON".to_string()),
            speed: Some(75.5),
            level: Some(1.0),
            target_speed: Some(80.0),
        };
        let summary = summarize_changes(Some(&old), Some(&new), SummaryStyle::Automatic);
        assert_eq!(
            summary.as_deref(),
            Some(
                "Status changed from OFF to ON, Speed changed from 0% to 75.5%, \
                 Target speed changed from 0% to 80%"
            )
        );
    }

    #[test]
    fn new_only_numeric_defaults_old_to_zero() {
        let new = state(None, Some(40.0));
        let summary = summarize_changes(None, Some(&new), SummaryStyle::Manual);
        assert_eq!(
            summary.as_deref(),
            Some("Speed manually changed from 0% to 40%")
        );
    }

    #[test]
    fn new_only_zero_is_not_a_change() {
        let new = state(None, Some(0.0));
        assert_eq!(
            summarize_changes(None, Some(&new), SummaryStyle::Automatic),
            None
        );
    }

    #[test]
    fn identical_states_yield_none() {
        let s = state(Some("ON"), Some(20.0));
        assert_eq!(
            summarize_changes(Some(&s), Some(&s), SummaryStyle::Automatic),
            None
        );
        assert_eq!(summarize_changes(None, None, SummaryStyle::Automatic), None);
    }
}
