use std::sync::Arc;

use tracing::info;

use crate::domain::entities::record::Record;
use crate::usecase::ports::publisher::{PushError, PushReceipt, RecordPublisher};

pub const EMAIL_COLUMN: &str = "email";
pub const PHONE_COLUMN: &str = "Phone Number 1";

/// Records worth pushing: both an email and a primary phone number.
pub fn pushable_records(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter(|record| {
            [EMAIL_COLUMN, PHONE_COLUMN]
                .iter()
                .all(|column| record.get(column).is_some_and(|value| !value.is_empty()))
        })
        .cloned()
        .collect()
}

pub struct PushService {
    publisher: Arc<dyn RecordPublisher>,
}

impl PushService {
    pub fn new(publisher: Arc<dyn RecordPublisher>) -> Self {
        Self { publisher }
    }

    pub fn push(&self, records: &[Record]) -> Result<PushReceipt, PushError> {
        let payload = pushable_records(records);
        info!(total = records.len(), pushing = payload.len(), "pushing records");
        self.publisher.publish(&payload)
    }
}
