//! Message bus between the control surface, the coordinator and the scanner
//!
//! Each endpoint owns an unbounded inbox of [`Envelope`]s. A request carries a
//! oneshot reply slot and is answered exactly once or times out; a
//! notification carries none. Delivery is best-effort: sending to an endpoint
//! that has gone away is logged and otherwise ignored.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::models::{PostRecord, ScanStatus, StatsSnapshot};

/// Message catalogue
///
/// Serialized as `{"type": "START_AUTO_SCAN", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// control -> coordinator, replies [`Reply::Ack`]
    StartAutoScan,
    /// control -> coordinator, replies [`Reply::Ack`]
    StopAutoScan,
    /// control -> coordinator, replies [`Reply::Status`]
    GetScanStatus,
    /// scanner -> coordinator, notification
    ScanBatchComplete { posts: Vec<PostRecord> },
    /// scanner -> coordinator, notification
    PostDetected(PostRecord),
    /// control -> scanner, replies [`Reply::Ack`]
    ManualScan,
    /// control -> coordinator, replies [`Reply::Stats`]
    GetStats,
    /// control -> coordinator, replies [`Reply::Ack`]
    ResetStats,
    /// coordinator -> control, notification
    ScanComplete { count: usize },
}

impl Message {
    /// Message type as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartAutoScan => "START_AUTO_SCAN",
            Self::StopAutoScan => "STOP_AUTO_SCAN",
            Self::GetScanStatus => "GET_SCAN_STATUS",
            Self::ScanBatchComplete { .. } => "SCAN_BATCH_COMPLETE",
            Self::PostDetected(_) => "POST_DETECTED",
            Self::ManualScan => "MANUAL_SCAN",
            Self::GetStats => "GET_STATS",
            Self::ResetStats => "RESET_STATS",
            Self::ScanComplete { .. } => "SCAN_COMPLETE",
        }
    }

    /// Whether the sender waits for a reply
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Self::StartAutoScan
                | Self::StopAutoScan
                | Self::GetScanStatus
                | Self::ManualScan
                | Self::GetStats
                | Self::ResetStats
        )
    }
}

/// `{success, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Status(ScanStatus),
    Stats(StatsSnapshot),
    Ack(Ack),
}

impl Reply {
    pub fn ok() -> Self {
        Self::Ack(Ack {
            success: true,
            error: None,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Ack(Ack {
            success: false,
            error: Some(error.into()),
        })
    }

    /// `true` for a successful ack and for any data reply
    pub fn is_success(&self) -> bool {
        match self {
            Self::Ack(ack) => ack.success,
            Self::Status(_) | Self::Stats(_) => true,
        }
    }

    pub fn into_status(self) -> Option<ScanStatus> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }

    pub fn into_stats(self) -> Option<StatsSnapshot> {
        match self {
            Self::Stats(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn into_ack(self) -> Option<Ack> {
        match self {
            Self::Ack(ack) => Some(ack),
            _ => None,
        }
    }
}

/// Errors raised by request/response exchanges
#[derive(Error, Debug)]
pub enum BusError {
    /// The receiving endpoint has shut down
    #[error("{0} endpoint is not listening")]
    Disconnected(&'static str),

    /// No reply arrived in time
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    /// The receiver dropped the reply slot without answering
    #[error("{0} endpoint dropped the request")]
    NoReply(&'static str),

    /// The reply did not have the shape the request asks for
    #[error("Unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

/// A message in flight, with its reply slot when it is a request
#[derive(Debug)]
pub struct Envelope {
    pub message: Message,
    reply: Option<oneshot::Sender<Reply>>,
}

impl Envelope {
    pub fn notification(message: Message) -> Self {
        Self {
            message,
            reply: None,
        }
    }

    pub fn request(message: Message) -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                message,
                reply: Some(tx),
            },
            rx,
        )
    }

    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Split into the message and a responder that answers at most once
    pub fn into_parts(self) -> (Message, Responder) {
        (self.message, Responder(self.reply))
    }

    /// Answer the request; a no-op for notifications or gone requesters
    pub fn respond(self, reply: Reply) {
        self.into_parts().1.send(reply);
    }
}

/// Reply slot detached from its message
#[derive(Debug)]
pub struct Responder(Option<oneshot::Sender<Reply>>);

impl Responder {
    pub fn send(self, reply: Reply) {
        if let Some(tx) = self.0 {
            if tx.send(reply).is_err() {
                tracing::debug!("Requester went away before the reply");
            }
        }
    }
}

/// Receiving side of an endpoint
pub type Inbox = mpsc::UnboundedReceiver<Envelope>;

/// Sending side of an endpoint
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: &'static str,
    tx: mpsc::UnboundedSender<Envelope>,
}

/// Create a named endpoint and its inbox
pub fn endpoint(name: &'static str) -> (Endpoint, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Endpoint { name, tx }, rx)
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fire-and-forget; an absent receiver is not an error
    pub fn notify(&self, message: Message) {
        let kind = message.kind();
        if self.tx.send(Envelope::notification(message)).is_err() {
            tracing::debug!(endpoint = self.name, kind, "Notification dropped, receiver gone");
        }
    }

    /// Send a request and wait for its single reply
    pub async fn request(&self, message: Message, timeout: Duration) -> Result<Reply, BusError> {
        let (envelope, rx) = Envelope::request(message);
        self.tx
            .send(envelope)
            .map_err(|_| BusError::Disconnected(self.name))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(BusError::NoReply(self.name)),
            Err(_) => Err(BusError::Timeout(timeout)),
        }
    }
}

/// Broadcast feed of coordinator -> control notifications
#[derive(Debug, Clone)]
pub struct ControlFeed {
    tx: broadcast::Sender<Message>,
}

impl ControlFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }

    /// Publish to whoever is listening; nobody listening is fine
    pub fn publish(&self, message: Message) {
        let kind = message.kind();
        if self.tx.send(message).is_err() {
            tracing::debug!(kind, "No control surface listening");
        }
    }
}

impl Default for ControlFeed {
    fn default() -> Self {
        Self::new(16)
    }
}
