//! Companion session state: role, readiness and the delayed snapshot send.
//!
//! The host event loop drives a session explicitly: it calls
//! [`CompanionSession::poll`] on timer ticks and feeds drained envelopes to
//! [`CompanionSession::receive`]. There is no cancellation; a scheduled send
//! stays pending until it is due.

use crate::sync::channel::{DeliveryError, LinkedPort, MessagePort};
use crate::sync::message::{decode_envelope, CompanionMessage, Envelope};
use log::debug;
use std::time::{Duration, Instant};

/// Grace delay between opening the companion and sending its snapshot.
pub const DEFAULT_SNAPSHOT_DELAY: Duration = Duration::from_millis(400);

/// Which side of the link a window plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionRole {
    /// Window that owns the board and opened the companion.
    Primary,
    /// Mirror window opened by the primary.
    Secondary,
}

/// Opens the secondary display surface.
pub trait CompanionOpener {
    type Port: MessagePort;

    /// Returns `None` when the host refuses to open it (e.g. popup blocked).
    fn open(&mut self) -> Option<Self::Port>;
}

/// Opener handing out a pre-built [`LinkedPort`] once.
#[derive(Debug, Default)]
pub struct LinkedOpener {
    port: Option<LinkedPort>,
}

impl LinkedOpener {
    pub fn new(port: LinkedPort) -> Self {
        Self { port: Some(port) }
    }

    /// Opener that always refuses.
    pub fn blocked() -> Self {
        Self { port: None }
    }
}

impl CompanionOpener for LinkedOpener {
    type Port = LinkedPort;

    fn open(&mut self) -> Option<LinkedPort> {
        self.port.take()
    }
}

#[derive(Debug, Clone)]
struct PendingSend {
    due_at: Instant,
    message: CompanionMessage,
}

/// One window's view of the companion link.
pub struct CompanionSession<P: MessagePort> {
    role: CompanionRole,
    port: P,
    peer_origin: String,
    expected_origin: String,
    ready: bool,
    pending: Option<PendingSend>,
}

impl<P: MessagePort> CompanionSession<P> {
    /// Primary side; ready to receive immediately.
    pub fn primary(
        port: P,
        peer_origin: impl Into<String>,
        expected_origin: impl Into<String>,
    ) -> Self {
        Self::new(
            CompanionRole::Primary,
            port,
            peer_origin.into(),
            expected_origin.into(),
            true,
        )
    }

    /// Secondary side; drops inbound messages until [`Self::mark_ready`].
    pub fn secondary(
        port: P,
        peer_origin: impl Into<String>,
        expected_origin: impl Into<String>,
    ) -> Self {
        Self::new(
            CompanionRole::Secondary,
            port,
            peer_origin.into(),
            expected_origin.into(),
            false,
        )
    }

    fn new(
        role: CompanionRole,
        port: P,
        peer_origin: String,
        expected_origin: String,
        ready: bool,
    ) -> Self {
        Self {
            role,
            port,
            peer_origin,
            expected_origin,
            ready,
            pending: None,
        }
    }

    pub fn role(&self) -> CompanionRole {
        self.role
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Marks the window as initialized; later messages are processed.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedules `message` for `due_at`, replacing any earlier pending send.
    pub fn schedule(&mut self, message: CompanionMessage, due_at: Instant) {
        self.pending = Some(PendingSend { due_at, message });
    }

    /// Sends the pending message once due.
    ///
    /// Returns `None` when nothing was sent on this tick.
    pub fn poll(&mut self, now: Instant) -> Option<Result<(), DeliveryError>> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.due_at <= now);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        Some(self.send(&pending.message))
    }

    /// Posts `message` to the peer immediately.
    pub fn send(&self, message: &CompanionMessage) -> Result<(), DeliveryError> {
        self.port.post(message, &self.peer_origin)
    }

    /// Validates an inbound envelope. Returns `None` for anything that must be
    /// ignored, including every envelope that arrives before readiness.
    pub fn receive(&self, envelope: &Envelope) -> Option<CompanionMessage> {
        if !self.ready {
            debug!("event=companion_recv module=sync status=skip reason=not_ready");
            return None;
        }
        decode_envelope(envelope, &self.expected_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::{CompanionSession, DEFAULT_SNAPSHOT_DELAY};
    use crate::sync::channel::{companion_link, MessagePort};
    use crate::sync::message::CompanionMessage;
    use std::time::{Duration, Instant};

    const ORIGIN: &str = "app://tablon";

    #[test]
    fn scheduled_send_waits_for_due_time() {
        let (primary_end, secondary_end) = companion_link(ORIGIN, ORIGIN);
        let mut session = CompanionSession::primary(primary_end.port, ORIGIN, ORIGIN);
        let opened_at = Instant::now();
        session.schedule(
            CompanionMessage::Snapshot { notes: vec![] },
            opened_at + DEFAULT_SNAPSHOT_DELAY,
        );

        assert!(session.poll(opened_at + Duration::from_millis(100)).is_none());
        assert!(secondary_end.inbox.drain().is_empty());

        let sent = session.poll(opened_at + DEFAULT_SNAPSHOT_DELAY);
        assert!(matches!(sent, Some(Ok(()))));
        assert!(!session.has_pending());
        assert_eq!(secondary_end.inbox.drain().len(), 1);
        assert!(session.poll(opened_at + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn secondary_drops_messages_until_ready() {
        let (primary_end, secondary_end) = companion_link(ORIGIN, ORIGIN);
        let mut secondary = CompanionSession::secondary(secondary_end.port, ORIGIN, ORIGIN);
        primary_end
            .port
            .post(&CompanionMessage::Snapshot { notes: vec![] }, ORIGIN)
            .unwrap();

        let early = secondary_end.inbox.drain();
        assert!(secondary.receive(&early[0]).is_none());

        secondary.mark_ready();
        primary_end
            .port
            .post(&CompanionMessage::Deleted { id: "n1".into() }, ORIGIN)
            .unwrap();
        let late = secondary_end.inbox.drain();
        assert_eq!(
            secondary.receive(&late[0]),
            Some(CompanionMessage::Deleted { id: "n1".into() })
        );
    }
}
