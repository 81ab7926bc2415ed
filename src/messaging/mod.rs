//! One-way notification sink
//!
//! Handlers emit text (optionally with a structured payload) addressed to
//! an entity or broadcast to a room. Delivery to a client is someone
//! else's job; the core only records intent.

use serde::Serialize;
use serde_json::Value;

use crate::core::types::{EntityId, GridPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Error,
    Success,
    System,
    Combat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            payload: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Info, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Success, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageKind::System, text)
    }

    pub fn combat(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Combat, text)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Where the core sends text. Fire-and-forget.
pub trait MessageSink {
    fn send(&mut self, to: &EntityId, message: Message);

    /// Everyone in `room` except the ids in `exclude`
    fn broadcast(&mut self, room: GridPos, exclude: &[EntityId], message: Message);
}

/// A recorded send
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Direct {
        to: EntityId,
        message: Message,
    },
    Room {
        room: GridPos,
        exclude: Vec<EntityId>,
        message: Message,
    },
}

/// Collecting sink. The server drains it after each command and tick;
/// tests read it directly.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.deliveries)
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn clear(&mut self) {
        self.deliveries.clear();
    }

    /// Direct messages addressed to `id`, in send order
    pub fn messages_for(&self, id: &EntityId) -> Vec<&Message> {
        self.deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Direct { to, message } if to == id => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Room broadcasts sent to `room`
    pub fn room_messages(&self, room: GridPos) -> Vec<&Message> {
        self.deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Room { room: r, message, .. } if *r == room => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl MessageSink for Outbox {
    fn send(&mut self, to: &EntityId, message: Message) {
        self.deliveries.push(Delivery::Direct {
            to: to.clone(),
            message,
        });
    }

    fn broadcast(&mut self, room: GridPos, exclude: &[EntityId], message: Message) {
        self.deliveries.push(Delivery::Room {
            room,
            exclude: exclude.to_vec(),
            message,
        });
    }
}
