//! Broker connection state machine.
//!
//! [`ConnectionManager::spawn`] runs one background task that owns the
//! transport. The task moves through
//! `Disconnected → Connecting → Connected` and back, retrying on a fixed
//! interval with no upper bound. Every (re)connect re-subscribes the full
//! filter set. Inbound messages go to a single [`MessageHandler`], in
//! transport order, without buffering.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::topics::{SubscriptionTracker, TopicFilterSet};
use super::transport::{BrokerTransport, InboundMessage};
use crate::domain::ConnectionState;
use crate::error::BrokerError;

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Receives every inbound broker message.
///
/// Called synchronously on the connection task, so implementations must
/// not block.
pub trait MessageHandler: Send + 'static {
    /// Handles one message.
    fn handle(&mut self, message: InboundMessage);
}

impl<F> MessageHandler for F
where
    F: FnMut(InboundMessage) + Send + 'static,
{
    fn handle(&mut self, message: InboundMessage) {
        self(message);
    }
}

/// Control messages from [`ConnectionHandle`] to the task.
#[derive(Debug)]
enum Command {
    SetFilters(TopicFilterSet),
    Disconnect,
}

/// Why the connected phase ended.
enum SessionEnd {
    Lost(BrokerError),
    Shutdown,
}

/// Entry point for starting a broker connection.
#[derive(Debug)]
pub struct ConnectionManager;

impl ConnectionManager {
    /// Spawns the connection task and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T, H>(
        transport: T,
        filters: TopicFilterSet,
        reconnect_interval: Duration,
        handler: H,
    ) -> ConnectionHandle
    where
        T: BrokerTransport,
        H: MessageHandler,
    {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(8);

        let task = ConnectionTask {
            transport,
            handler,
            filters,
            tracker: SubscriptionTracker::new(),
            reconnect_interval,
            state: state_tx,
            commands: command_rx,
        };
        let join = tokio::spawn(task.run());

        ConnectionHandle {
            commands: command_tx,
            state: state_rx,
            join: Some(join),
        }
    }
}

/// Owner-side handle of a running connection.
///
/// Dropping the handle aborts the task, which closes the transport and
/// cancels any pending reconnect. Use [`ConnectionHandle::disconnect`] for
/// a graceful close.
#[derive(Debug)]
pub struct ConnectionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
    join: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `true` while the state is [`ConnectionState::Connected`].
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns a receiver that observes every state transition.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Replaces the wanted filter set. On a live session only the
    /// difference against the last subscribed set is sent.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Closed`] if the connection task has stopped.
    pub async fn set_topic_filters(&self, filters: TopicFilterSet) -> Result<(), BrokerError> {
        self.commands
            .send(Command::SetFilters(filters))
            .await
            .map_err(|_| BrokerError::Closed)
    }

    /// Closes the connection and waits for the task to finish.
    pub async fn disconnect(mut self) {
        if self.commands.send(Command::Disconnect).await.is_err() {
            return;
        }
        if let Some(join) = self.join.take()
            && let Err(e) = join.await
        {
            tracing::warn!(error = %e, "broker connection task ended abnormally");
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

struct ConnectionTask<T, H> {
    transport: T,
    handler: H,
    filters: TopicFilterSet,
    tracker: SubscriptionTracker,
    reconnect_interval: Duration,
    state: watch::Sender<ConnectionState>,
    commands: mpsc::Receiver<Command>,
}

impl<T: BrokerTransport, H: MessageHandler> ConnectionTask<T, H> {
    async fn run(mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);

            let end = match self.connect_or_shutdown().await {
                Some(Ok(())) => self.run_session().await,
                Some(Err(e)) => SessionEnd::Lost(e),
                None => SessionEnd::Shutdown,
            };

            self.tracker.reset();
            match end {
                SessionEnd::Shutdown => {
                    self.transport.close().await;
                    self.set_state(ConnectionState::Disconnected);
                    tracing::info!("broker connection closed");
                    return;
                }
                SessionEnd::Lost(e) => {
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = self.reconnect_interval.as_millis() as u64,
                        "broker connection failed, retrying"
                    );
                    self.transport.close().await;
                    self.set_state(ConnectionState::Disconnected);
                }
            }

            if !self.wait_for_retry().await {
                tracing::info!("broker connection closed");
                return;
            }
        }
    }

    /// Runs one connect attempt. Returns `None` if a shutdown arrived
    /// first; the pending attempt is dropped. Filter changes are kept for
    /// the subscription step.
    async fn connect_or_shutdown(&mut self) -> Option<Result<(), BrokerError>> {
        let connect = self.transport.connect();
        tokio::pin!(connect);
        loop {
            tokio::select! {
                result = &mut connect => return Some(result),
                command = self.commands.recv() => match command {
                    Some(Command::SetFilters(filters)) => self.filters = filters,
                    Some(Command::Disconnect) | None => return None,
                },
            }
        }
    }

    /// Subscribes and pumps messages until the session ends.
    async fn run_session(&mut self) -> SessionEnd {
        if let Err(e) = self.sync_subscriptions().await {
            return SessionEnd::Lost(e);
        }
        self.set_state(ConnectionState::Connected);
        tracing::info!(filters = self.tracker.count(), "broker connected");

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::SetFilters(filters)) => {
                        self.filters = filters;
                        if let Err(e) = self.sync_subscriptions().await {
                            return SessionEnd::Lost(e);
                        }
                    }
                    Some(Command::Disconnect) | None => return SessionEnd::Shutdown,
                },
                message = self.transport.next_message() => match message {
                    Ok(message) => self.handler.handle(message),
                    Err(e) => return SessionEnd::Lost(e),
                },
            }
        }
    }

    /// Applies the set difference between wanted and subscribed filters.
    async fn sync_subscriptions(&mut self) -> Result<(), BrokerError> {
        let plan = self.tracker.plan(&self.filters);
        for filter in &plan.unsubscribe {
            self.transport.unsubscribe(filter).await?;
            self.tracker.mark_unsubscribed(filter);
            tracing::debug!(filter = %filter, "unsubscribed");
        }
        for filter in &plan.subscribe {
            self.transport.subscribe(filter).await?;
            self.tracker.mark_subscribed(filter);
            tracing::debug!(filter = %filter, "subscribed");
        }
        Ok(())
    }

    /// Sleeps for the reconnect interval. Returns `false` if a shutdown
    /// arrived meanwhile. Filter changes are applied on the next connect.
    async fn wait_for_retry(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.reconnect_interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(Command::SetFilters(filters)) => self.filters = filters,
                    Some(Command::Disconnect) | None => return false,
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
