//! Event requests handed to the recording collaborator.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::plant::{Material, Reason, UnitOfMeasure};
use crate::types::EntityId;

/// Routing tag telling downstream consumers how to interpret an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventResolverType {
    Availability,
    ProdGood,
    ProdReject,
    MatlChange,
}

impl EventResolverType {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Availability => "availability",
            Self::ProdGood => "prod_good",
            Self::ProdReject => "prod_reject",
            Self::MatlChange => "matl_change",
        }
    }
}

impl std::fmt::Display for EventResolverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reason applying from a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEventRequest {
    pub equipment: EntityId,
    pub reason: Reason,
    pub timestamp: DateTime<Utc>,
}

/// A reason applying over a time range with an explicit elapsed duration.
///
/// `start_time` and `end_time` are not checked against each other here.
/// Deserialization rejects a duration [`duration`](Self::duration) cannot return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAvailabilitySummary")]
pub struct AvailabilitySummaryRequest {
    pub equipment: EntityId,
    pub reason: Reason,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Elapsed time in seconds, never negative.
    pub duration_secs: i64,
}

#[derive(Deserialize)]
struct RawAvailabilitySummary {
    equipment: EntityId,
    reason: Reason,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_secs: i64,
}

impl TryFrom<RawAvailabilitySummary> for AvailabilitySummaryRequest {
    type Error = EventError;

    fn try_from(raw: RawAvailabilitySummary) -> Result<Self, Self::Error> {
        let request = Self {
            equipment: raw.equipment,
            reason: raw.reason,
            start_time: raw.start_time,
            end_time: raw.end_time,
            duration_secs: raw.duration_secs,
        };
        request.duration()?;
        Ok(request)
    }
}

impl AvailabilitySummaryRequest {
    /// The elapsed time. Fails for negative values and values beyond chrono's range.
    pub fn duration(&self) -> Result<Duration, EventError> {
        let invalid = || EventError::InvalidDuration {
            field: "duration_secs",
            value: self.duration_secs,
        };
        if self.duration_secs < 0 {
            return Err(invalid());
        }
        Duration::try_seconds(self.duration_secs).ok_or_else(invalid)
    }
}

/// A production count for the equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEventRequest {
    pub equipment: EntityId,
    pub amount: f64,
    pub unit: UnitOfMeasure,
    pub material: Material,
    pub timestamp: DateTime<Utc>,
    pub resolver_type: EventResolverType,
}

/// A job/material changeover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeoverEventRequest {
    pub equipment: EntityId,
    /// `None` when the changeover carries no job assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    pub material: Material,
    pub timestamp: DateTime<Utc>,
}

/// Any request the recording collaborator accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRequest {
    Availability(AvailabilityEventRequest),
    AvailabilitySummary(AvailabilitySummaryRequest),
    Production(ProductionEventRequest),
    Changeover(ChangeoverEventRequest),
}

impl EventRequest {
    pub const fn equipment(&self) -> &EntityId {
        match self {
            Self::Availability(req) => &req.equipment,
            Self::AvailabilitySummary(req) => &req.equipment,
            Self::Production(req) => &req.equipment,
            Self::Changeover(req) => &req.equipment,
        }
    }

    /// When the event took effect (the start of a summary window).
    pub fn event_time(&self) -> DateTime<Utc> {
        match self {
            Self::Availability(req) => req.timestamp,
            Self::AvailabilitySummary(req) => req.start_time,
            Self::Production(req) => req.timestamp,
            Self::Changeover(req) => req.timestamp,
        }
    }

    pub const fn resolver_type(&self) -> EventResolverType {
        match self {
            Self::Availability(_) | Self::AvailabilitySummary(_) => EventResolverType::Availability,
            Self::Production(req) => req.resolver_type,
            Self::Changeover(_) => EventResolverType::MatlChange,
        }
    }
}

impl From<AvailabilityEventRequest> for EventRequest {
    fn from(req: AvailabilityEventRequest) -> Self {
        Self::Availability(req)
    }
}

impl From<AvailabilitySummaryRequest> for EventRequest {
    fn from(req: AvailabilitySummaryRequest) -> Self {
        Self::AvailabilitySummary(req)
    }
}

impl From<ProductionEventRequest> for EventRequest {
    fn from(req: ProductionEventRequest) -> Self {
        Self::Production(req)
    }
}

impl From<ChangeoverEventRequest> for EventRequest {
    fn from(req: ChangeoverEventRequest) -> Self {
        Self::Changeover(req)
    }
}
