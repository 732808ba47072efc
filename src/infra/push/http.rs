use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::entities::record::Record;
use crate::usecase::ports::publisher::{PushError, PushReceipt, RecordPublisher};

/// Posts the record array as JSON to a fixed endpoint. Blocking; no runtime needed.
pub struct HttpPublisher {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpPublisher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PushError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("leadbook/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| PushError::Setup(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RecordPublisher for HttpPublisher {
    fn publish(&self, records: &[Record]) -> Result<PushReceipt, PushError> {
        debug!(endpoint = %self.endpoint, count = records.len(), "posting records");
        let response = self
            .http
            .post(&self.endpoint)
            .json(records)
            .send()
            .map_err(|err| PushError::Network(err.to_string()))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            warn!(status = status.as_u16(), "push rejected");
            return Err(PushError::Http(status.as_u16(), body));
        }

        Ok(PushReceipt {
            status: status.as_u16(),
            body,
            record_count: records.len(),
        })
    }
}
