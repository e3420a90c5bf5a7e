//! The seam between request building and actual recording.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::EventRequest;

/// A request as accepted by a recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Identifier assigned by the recorder.
    pub id: String,
    /// When the recorder accepted the request.
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub request: EventRequest,
}

/// Accepts finished event requests and persists or forwards them.
///
/// Errors are opaque to the builders and surface to the caller unchanged.
pub trait EventRecorder {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record(&mut self, request: &EventRequest) -> Result<RecordedEvent, Self::Error>;
}
