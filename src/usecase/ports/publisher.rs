use thiserror::Error;

use crate::domain::entities::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    #[error("client setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    pub status: u16,
    pub body: String,
    pub record_count: usize,
}

/// Destination for the contact push side-channel.
pub trait RecordPublisher: Send + Sync {
    fn publish(&self, records: &[Record]) -> Result<PushReceipt, PushError>;
}
