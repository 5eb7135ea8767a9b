//! Human-readable formatting of broker identifiers.

/// Turns an identifier such as `server_room` or `rack-01` into a display
/// name (`Server Room`, `Rack 01`).
///
/// Underscores and hyphens become spaces and the first letter of every word
/// is upper-cased. The rest of each word is left untouched.
#[must_use]
pub fn format_name(raw: &str) -> String {
    let spaced = raw.replace(['_', '-'], " ");
    spaced
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
