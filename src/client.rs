//! Presence client facade and the connection task behind it.
//!
//! SYSTEM CONTEXT
//! ==============
//! `PresenceClient` is the only type surrounding code depends on. Each client
//! spawns one task that exclusively owns the socket, the reconnect timer, the
//! presence list and the retry counter. The facade sends `Control` messages
//! to the task and reads state from a `watch` channel, so every published
//! snapshot reflects the most recently processed frame.
//!
//! LIFECYCLE
//! =========
//! ```text
//! Disconnected --connect()--> Connecting --open--> Connected
//! Connected --close(attempts<cap)--> Disconnected --(after delay)--> Connecting
//! Connected --close(attempts==cap)--> Disconnected [until manual connect()]
//! any state --disconnect()--> Disconnected [timer cleared]
//! ```
//!
//! The pending retry lives inside `Link::Retrying`, so the task can hold at
//! most one timer. An opening handshake is raced against the control channel
//! and bounded by the configured connect timeout, so teardown never waits on
//! the network. Errors never cross the facade; they land in
//! [`PresenceSnapshot::last_error`].

use frames::{Inbound, Outbound, PresenceEntry};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::PresenceConfig;
use crate::connection::{ConnectionState, ReconnectCounter};
use crate::dispatch::dispatch;
use crate::error::PresenceError;
use crate::presence::PresenceList;
use crate::transport::{Connector, Transport};

/// Room and user the client represents. Both are needed to auto-connect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub room_id: Option<String>,
    pub user_id: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(room_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id.into()),
            user_id: Some(user_id.into()),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.room_id.is_some() && self.user_id.is_some()
    }
}

/// Observable client state, republished after every change.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PresenceSnapshot {
    pub state: ConnectionState,
    pub users: Vec<PresenceEntry>,
    pub last_error: Option<PresenceError>,
    /// Automatic attempts used since the last successful open.
    pub reconnect_attempts: u32,
    pub retry_pending: bool,
    /// Attempts exhausted; nothing further happens until `connect()`.
    pub gave_up: bool,
}

impl PresenceSnapshot {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

enum Control {
    Connect,
    Disconnect,
    SetIdentity(Identity),
    Send(Outbound),
    Shutdown,
}

/// Handle to one presence session.
///
/// Dropping the handle tears the session down: the task closes the socket,
/// cancels any pending retry and exits.
pub struct PresenceClient {
    control: mpsc::UnboundedSender<Control>,
    snapshot: watch::Receiver<PresenceSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl PresenceClient {
    /// Start the connection task on the current tokio runtime.
    ///
    /// Connects immediately when `identity` is complete.
    #[must_use]
    pub fn spawn<C: Connector>(config: PresenceConfig, connector: C, identity: Identity) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (published, snapshot) = watch::channel(PresenceSnapshot::default());
        let counter = ReconnectCounter::new(config.reconnect.max_attempts);

        let task = ConnectionTask {
            config,
            connector,
            identity,
            control: control_rx,
            published,
            link: Link::Idle,
            state: ConnectionState::Disconnected,
            presence: PresenceList::new(),
            counter,
            last_error: None,
            gave_up: false,
            deferred: None,
        };

        Self {
            control: control_tx,
            snapshot,
            task: Some(tokio::spawn(task.run())),
        }
    }

    /// Open the socket. No-op when already connected; cancels a pending retry.
    pub fn connect(&self) {
        self.control(Control::Connect);
    }

    /// Close the socket, cancel any retry and clear presence. Idempotent.
    pub fn disconnect(&self) {
        self.control(Control::Disconnect);
    }

    /// Switch identity. A changed identity ends the current session and, if
    /// complete, starts a new one.
    pub fn set_identity(&self, identity: Identity) {
        self.control(Control::SetIdentity(identity));
    }

    pub fn join(&self, room_id: impl Into<String>) {
        self.send_outbound(Outbound::join(room_id));
    }

    pub fn leave(&self, room_id: impl Into<String>) {
        self.send_outbound(Outbound::leave(room_id));
    }

    pub fn send_typing(&self, room_id: impl Into<String>, is_typing: bool) {
        self.send_outbound(Outbound::typing(room_id, is_typing));
    }

    pub fn send_cursor(&self, room_id: impl Into<String>, position: Value) {
        self.send_outbound(Outbound::cursor(room_id, position));
    }

    /// Send a free-form frame `{ "type": kind, ...payload }`.
    pub fn send(&self, kind: impl Into<String>, payload: Map<String, Value>) {
        self.send_outbound(Outbound::custom(kind, payload));
    }

    /// Queue a frame for the socket. Dropped by the task if it is not open.
    pub fn send_outbound(&self, outbound: Outbound) {
        self.control(Control::Send(outbound));
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().is_connected()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    #[must_use]
    pub fn presence(&self) -> Vec<PresenceEntry> {
        self.snapshot.borrow().users.clone()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<PresenceError> {
        self.snapshot.borrow().last_error.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> PresenceSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PresenceSnapshot> {
        self.snapshot.clone()
    }

    /// Tear down and wait until the socket is closed and the task has exited.
    pub async fn dispose(mut self) {
        self.control(Control::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::warn!(%error, "presence connection task failed");
            }
        }
    }

    fn control(&self, control: Control) {
        if self.control.send(control).is_err() {
            tracing::debug!("presence connection task already stopped");
        }
    }
}

impl Drop for PresenceClient {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.control(Control::Shutdown);
        }
    }
}

enum Link {
    Idle,
    Open(Box<dyn Transport>),
    Retrying(Instant),
}

enum Step {
    Control(Option<Control>),
    Inbound(Option<Result<String, PresenceError>>),
    RetryDue,
}

struct ConnectionTask<C> {
    config: PresenceConfig,
    connector: C,
    identity: Identity,
    control: mpsc::UnboundedReceiver<Control>,
    published: watch::Sender<PresenceSnapshot>,
    link: Link,
    state: ConnectionState,
    presence: PresenceList,
    counter: ReconnectCounter,
    last_error: Option<PresenceError>,
    gave_up: bool,
    /// Control message that interrupted a handshake, handled before polling again.
    deferred: Option<Control>,
}

impl<C: Connector> ConnectionTask<C> {
    async fn run(mut self) {
        if self.identity.is_complete() {
            self.connect().await;
        }

        loop {
            let step = if let Some(control) = self.deferred.take() {
                Step::Control(Some(control))
            } else {
                self.next_step().await
            };

            match step {
                Step::Control(None | Some(Control::Shutdown)) => break,
                Step::Control(Some(control)) => self.handle_control(control).await,
                Step::Inbound(Some(Ok(text))) => self.handle_frame(&text),
                Step::Inbound(Some(Err(error))) => {
                    tracing::warn!(%error, "realtime socket error");
                    self.last_error = Some(error);
                    self.publish();
                }
                Step::Inbound(None) => self.handle_close(),
                Step::RetryDue => {
                    self.link = Link::Idle;
                    tracing::info!(attempt = self.counter.attempts(), "reconnecting realtime socket");
                    self.open().await;
                }
            }
        }

        self.disconnect().await;
        tracing::debug!("presence connection task stopped");
    }

    /// Wait for whatever the current link can produce next.
    async fn next_step(&mut self) -> Step {
        match &mut self.link {
            Link::Idle => Step::Control(self.control.recv().await),
            Link::Retrying(deadline) => {
                let deadline = *deadline;
                tokio::select! {
                    () = time::sleep_until(deadline) => Step::RetryDue,
                    control = self.control.recv() => Step::Control(control),
                }
            }
            Link::Open(transport) => tokio::select! {
                inbound = transport.recv() => Step::Inbound(inbound),
                control = self.control.recv() => Step::Control(control),
            },
        }
    }

    async fn handle_control(&mut self, control: Control) {
        match control {
            Control::Connect => self.connect().await,
            Control::Disconnect => self.disconnect().await,
            Control::SetIdentity(identity) => {
                if identity == self.identity {
                    return;
                }
                self.disconnect().await;
                self.identity = identity;
                self.counter.reset();
                if self.identity.is_complete() {
                    self.connect().await;
                }
            }
            Control::Send(outbound) => self.send_outbound(outbound).await,
            Control::Shutdown => {}
        }
    }

    async fn connect(&mut self) {
        match &self.link {
            Link::Open(_) => {
                tracing::debug!("connect ignored; socket already open");
                return;
            }
            Link::Retrying(_) => {
                tracing::debug!("manual connect replaces pending reconnect");
                self.link = Link::Idle;
            }
            Link::Idle => {}
        }
        self.gave_up = false;
        self.open().await;
    }

    async fn open(&mut self) {
        let url = match self.config.ws_url(self.identity.user_id.as_deref()) {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(%error, "cannot build realtime socket url; not retrying");
                self.fail(error.into());
                return;
            }
        };

        self.state = ConnectionState::Connecting;
        self.publish();

        let limit = self.config.connect_timeout;
        let outcome = {
            let connecting = time::timeout(limit, self.connector.connect(&url));
            tokio::pin!(connecting);
            loop {
                tokio::select! {
                    outcome = &mut connecting => break outcome,
                    control = self.control.recv() => match control {
                        Some(Control::Connect) => tracing::debug!("connect ignored; handshake in flight"),
                        Some(Control::Send(outbound)) => {
                            tracing::debug!(kind = outbound.kind(), "socket not open; dropping command");
                        }
                        Some(Control::SetIdentity(identity)) if identity == self.identity => {}
                        interrupt => {
                            tracing::debug!(%url, "handshake abandoned");
                            self.state = ConnectionState::Disconnected;
                            self.deferred = Some(interrupt.unwrap_or(Control::Shutdown));
                            return;
                        }
                    },
                }
            }
        };

        let result = outcome.unwrap_or_else(|_| {
            Err(PresenceError::Unreachable(format!(
                "handshake timed out after {} ms",
                limit.as_millis()
            )))
        });
        match result {
            Ok(transport) => {
                self.link = Link::Open(transport);
                self.state = ConnectionState::Connected;
                self.counter.reset();
                self.last_error = None;
                self.gave_up = false;
                tracing::info!(%url, "realtime socket open");
                if let Some(room_id) = self.identity.room_id.clone() {
                    self.send_outbound(Outbound::join(room_id)).await;
                }
                self.publish();
            }
            Err(error) if error.is_retryable() => {
                tracing::warn!(%error, "realtime connect failed");
                self.last_error = Some(error);
                self.handle_close();
            }
            Err(error) => {
                tracing::warn!(%error, "realtime connect rejected; not retrying");
                self.fail(error);
            }
        }
    }

    async fn disconnect(&mut self) {
        match std::mem::replace(&mut self.link, Link::Idle) {
            Link::Open(mut transport) => {
                transport.close().await;
                tracing::info!("realtime socket closed by client");
            }
            Link::Retrying(_) => tracing::debug!("pending reconnect cancelled"),
            Link::Idle => {}
        }
        self.state = ConnectionState::Disconnected;
        self.presence.clear();
        self.gave_up = false;
        self.publish();
    }

    /// Unsolicited close, or a network-class open failure.
    fn handle_close(&mut self) {
        self.link = Link::Idle;
        self.state = ConnectionState::Disconnected;
        match self.counter.next_attempt() {
            Some(attempt) => {
                let delay = self.config.reconnect.delay;
                tracing::info!(
                    attempt,
                    max_attempts = self.counter.cap(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "realtime socket closed; reconnect scheduled"
                );
                self.link = Link::Retrying(Instant::now() + delay);
            }
            None => {
                tracing::warn!(
                    attempts = self.counter.attempts(),
                    "realtime socket closed; reconnect attempts exhausted"
                );
                self.gave_up = true;
            }
        }
        self.publish();
    }

    fn handle_frame(&mut self, text: &str) {
        match frames::decode_event(text) {
            Ok(Inbound::Event(event)) => {
                if self.presence.apply(&event) {
                    self.publish();
                } else {
                    tracing::trace!(kind = event.kind(), "presence unchanged");
                }
            }
            Ok(Inbound::Unknown(kind)) => {
                tracing::debug!(%kind, "ignoring unknown realtime event");
            }
            Err(error) => {
                tracing::warn!(%error, "dropping malformed realtime frame");
            }
        }
    }

    async fn send_outbound(&mut self, outbound: Outbound) {
        let transport = match &mut self.link {
            Link::Open(transport) => Some(transport.as_mut()),
            Link::Idle | Link::Retrying(_) => None,
        };
        match dispatch(transport, &outbound).await {
            Ok(_) => {}
            Err(error @ PresenceError::Protocol(_)) => {
                tracing::warn!(%error, kind = outbound.kind(), "command not sent");
            }
            Err(error) => {
                tracing::warn!(%error, kind = outbound.kind(), "realtime write failed");
                self.last_error = Some(error);
                self.handle_close();
            }
        }
    }

    fn fail(&mut self, error: PresenceError) {
        self.link = Link::Idle;
        self.state = ConnectionState::Disconnected;
        self.last_error = Some(error);
        self.publish();
    }

    fn publish(&self) {
        let next = PresenceSnapshot {
            state: self.state,
            users: self.presence.entries().to_vec(),
            last_error: self.last_error.clone(),
            reconnect_attempts: self.counter.attempts(),
            retry_pending: matches!(self.link, Link::Retrying(_)),
            gave_up: self.gave_up,
        };
        self.published.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
