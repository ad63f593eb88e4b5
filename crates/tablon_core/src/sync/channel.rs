//! Cross-window transport.
//!
//! A [`MessagePort`] posts messages to the peer window; an [`Inbox`] collects
//! what the peer posted. [`companion_link`] builds an in-process pair backed
//! by `std::sync::mpsc`, which gives at-most-once, in-order delivery per
//! sender.

use crate::sync::message::{CompanionMessage, Envelope};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender};

/// Send-side failure. Callers log it and move on; nothing is retried.
#[derive(Debug)]
pub enum DeliveryError {
    /// Peer window is gone.
    Closed,
    Encode(serde_json::Error),
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "companion window is closed"),
            Self::Encode(err) => write!(f, "failed to encode companion message: {err}"),
        }
    }
}

impl Error for DeliveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Closed => None,
            Self::Encode(err) => Some(err),
        }
    }
}

/// Outbound half of a window-to-window channel.
pub trait MessagePort {
    /// Posts `message` for delivery to a window whose origin is
    /// `target_origin`. A mismatching peer silently receives nothing.
    fn post(&self, message: &CompanionMessage, target_origin: &str) -> Result<(), DeliveryError>;
}

/// In-process port posting to the linked peer.
#[derive(Debug, Clone)]
pub struct LinkedPort {
    own_origin: String,
    peer_origin: String,
    outbound: Sender<Envelope>,
}

impl LinkedPort {
    pub fn own_origin(&self) -> &str {
        &self.own_origin
    }

    pub fn peer_origin(&self) -> &str {
        &self.peer_origin
    }
}

impl MessagePort for LinkedPort {
    fn post(&self, message: &CompanionMessage, target_origin: &str) -> Result<(), DeliveryError> {
        if target_origin != self.peer_origin {
            debug!(
                "event=companion_send module=sync status=skip reason=target_origin_mismatch tipo={}",
                message.tipo()
            );
            return Ok(());
        }
        let payload = serde_json::to_value(message).map_err(DeliveryError::Encode)?;
        self.outbound
            .send(Envelope {
                origin: self.own_origin.clone(),
                payload,
            })
            .map_err(|_| DeliveryError::Closed)
    }
}

/// Inbound half of a window-to-window channel.
#[derive(Debug)]
pub struct Inbox {
    inbound: Receiver<Envelope>,
}

impl Inbox {
    /// Takes every envelope delivered so far, in arrival order.
    pub fn drain(&self) -> Vec<Envelope> {
        self.inbound.try_iter().collect()
    }
}

/// One window's side of a link.
#[derive(Debug)]
pub struct LinkEnd {
    pub port: LinkedPort,
    pub inbox: Inbox,
}

/// Builds a linked `(primary, secondary)` pair.
pub fn companion_link(primary_origin: &str, secondary_origin: &str) -> (LinkEnd, LinkEnd) {
    let (to_secondary, secondary_inbound) = mpsc::channel();
    let (to_primary, primary_inbound) = mpsc::channel();

    let primary = LinkEnd {
        port: LinkedPort {
            own_origin: primary_origin.to_string(),
            peer_origin: secondary_origin.to_string(),
            outbound: to_secondary,
        },
        inbox: Inbox {
            inbound: primary_inbound,
        },
    };
    let secondary = LinkEnd {
        port: LinkedPort {
            own_origin: secondary_origin.to_string(),
            peer_origin: primary_origin.to_string(),
            outbound: to_primary,
        },
        inbox: Inbox {
            inbound: secondary_inbound,
        },
    };
    (primary, secondary)
}
