//! Availability capture: point-in-time events and summarized time ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::plant::{Equipment, Reason};
use crate::request::{AvailabilityEventRequest, AvailabilitySummaryRequest};
use crate::types::ValidationError;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

/// How an availability change is captured.
///
/// The caller picks the mode and then invokes the matching builder;
/// [`build_summary`] is the only one that needs a time range and a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityCaptureMode {
    /// A single timestamp from which the reason applies.
    Event,
    /// A time range plus an explicit elapsed duration.
    #[default]
    Summary,
}

impl AvailabilityCaptureMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for AvailabilityCaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AvailabilityCaptureMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "event" => Ok(Self::Event),
            "summary" => Ok(Self::Summary),
            _ => Err(ValidationError::InvalidCaptureMode {
                value: s.to_string(),
            }),
        }
    }
}

/// The reason as typed by the operator plus the entity it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReasonSelection {
    pub text: String,
    pub reason: Option<Reason>,
}

impl ReasonSelection {
    pub fn new(text: impl Into<String>, reason: Option<Reason>) -> Self {
        Self {
            text: text.into(),
            reason,
        }
    }

    /// A selection made by picking the reason directly.
    pub fn resolved(reason: Reason) -> Self {
        Self {
            text: reason.name.to_string(),
            reason: Some(reason),
        }
    }

    fn require(&self) -> Result<&Reason, EventError> {
        match &self.reason {
            Some(reason) if !self.text.trim().is_empty() => Ok(reason),
            _ => Err(EventError::MissingReason),
        }
    }
}

/// Elapsed time entered as hours and minutes. Unset fields count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationSpec {
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
}

impl DurationSpec {
    #[must_use]
    pub const fn new(hours: Option<i64>, minutes: Option<i64>) -> Self {
        Self { hours, minutes }
    }

    /// Parses the two text fields. Blank text leaves the field unset.
    pub fn parse(hours: Option<&str>, minutes: Option<&str>) -> Result<Self, EventError> {
        Ok(Self {
            hours: parse_field("hours", hours)?,
            minutes: parse_field("minutes", minutes)?,
        })
    }

    /// Total elapsed seconds: `hours * 3600 + minutes * 60`.
    pub fn total_seconds(&self) -> Result<i64, EventError> {
        let hours = non_negative("hours", self.hours)?;
        let minutes = non_negative("minutes", self.minutes)?;

        let hour_secs = hours
            .checked_mul(SECONDS_PER_HOUR)
            .ok_or(EventError::InvalidDuration {
                field: "hours",
                value: hours,
            })?;
        let minute_secs = minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .ok_or(EventError::InvalidDuration {
                field: "minutes",
                value: minutes,
            })?;
        let seconds = hour_secs.saturating_add(minute_secs);

        // chrono caps durations well below i64::MAX seconds.
        if Duration::try_seconds(seconds).is_none() {
            return Err(EventError::InvalidDuration {
                field: "duration",
                value: seconds,
            });
        }
        Ok(seconds)
    }
}

fn parse_field(field: &'static str, value: Option<&str>) -> Result<Option<i64>, EventError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| EventError::MalformedDuration {
            field,
            value: value.to_string(),
        })
}

fn non_negative(field: &'static str, value: Option<i64>) -> Result<i64, EventError> {
    match value {
        Some(v) if v < 0 => Err(EventError::InvalidDuration { field, value: v }),
        Some(v) => Ok(v),
        None => Ok(0),
    }
}

/// Builds a point-in-time availability event.
pub fn build_event(
    equipment: &Equipment,
    reason: &ReasonSelection,
    timestamp: DateTime<Utc>,
) -> Result<AvailabilityEventRequest, EventError> {
    let reason = reason.require()?;
    tracing::debug!(equipment = %equipment.name, reason = %reason.name, %timestamp, "built availability event");
    Ok(AvailabilityEventRequest {
        equipment: equipment.name.clone(),
        reason: reason.clone(),
        timestamp,
    })
}

/// Builds a summarized availability record over `[start_time, end_time]`.
///
/// The ordering of the two times is left to the recording collaborator.
pub fn build_summary(
    equipment: &Equipment,
    reason: &ReasonSelection,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration: &DurationSpec,
) -> Result<AvailabilitySummaryRequest, EventError> {
    let reason = reason.require()?;
    let duration_secs = duration.total_seconds()?;
    tracing::debug!(
        equipment = %equipment.name,
        reason = %reason.name,
        %start_time,
        %end_time,
        duration_secs,
        "built availability summary"
    );
    Ok(AvailabilitySummaryRequest {
        equipment: equipment.name.clone(),
        reason: reason.clone(),
        start_time,
        end_time,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ErrorKind;
    use crate::types::{EntityId, ReasonId};

    fn filler() -> Equipment {
        Equipment::new(EntityId::new("Filler").unwrap())
    }

    fn jam() -> Reason {
        Reason::new(ReasonId::new("Jam").unwrap())
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn capture_mode_defaults_to_summary() {
        assert_eq!(AvailabilityCaptureMode::default(), AvailabilityCaptureMode::Summary);
        assert_eq!(
            "EVENT".parse::<AvailabilityCaptureMode>().unwrap(),
            AvailabilityCaptureMode::Event
        );
        assert!("both".parse::<AvailabilityCaptureMode>().is_err());
    }

    #[test]
    fn builds_event_with_resolved_reason() {
        let request =
            build_event(&filler(), &ReasonSelection::resolved(jam()), at("2025-01-01T08:00:00Z"))
                .unwrap();
        assert_eq!(request.equipment.as_str(), "Filler");
        assert_eq!(request.reason, jam());
        assert_eq!(request.timestamp, at("2025-01-01T08:00:00Z"));
    }

    #[test]
    fn empty_reason_text_without_entity_fails() {
        let selection = ReasonSelection::new("", None);
        let err = build_event(&filler(), &selection, at("2025-01-01T08:00:00Z")).unwrap_err();
        assert_eq!(err, EventError::MissingReason);
        assert_eq!(err.kind(), ErrorKind::MissingField);
    }

    #[test]
    fn typed_but_unresolved_reason_fails() {
        let selection = ReasonSelection::new("Jam", None);
        let result = build_event(&filler(), &selection, at("2025-01-01T08:00:00Z"));
        assert_eq!(result, Err(EventError::MissingReason));
    }

    #[test]
    fn resolved_reason_with_blank_text_fails() {
        let selection = ReasonSelection::new("  ", Some(jam()));
        let result = build_summary(
            &filler(),
            &selection,
            at("2025-01-01T08:00:00Z"),
            at("2025-01-01T09:00:00Z"),
            &DurationSpec::default(),
        );
        assert_eq!(result, Err(EventError::MissingReason));
    }

    #[test]
    fn duration_combines_hours_and_minutes() {
        let spec = DurationSpec::parse(Some("2"), Some("30")).unwrap();
        assert_eq!(spec.total_seconds().unwrap(), 9000);

        for (h, m) in [(0, 0), (1, 0), (0, 45), (7, 59), (100, 120)] {
            let spec = DurationSpec::new(Some(h), Some(m));
            assert_eq!(spec.total_seconds().unwrap(), h * 3600 + m * 60);
        }
    }

    #[test]
    fn blank_fields_count_as_zero() {
        assert_eq!(DurationSpec::parse(None, None).unwrap().total_seconds().unwrap(), 0);
        assert_eq!(
            DurationSpec::parse(Some(" "), Some("15")).unwrap().total_seconds().unwrap(),
            900
        );
        assert_eq!(
            DurationSpec::parse(Some(" 3 "), Some("")).unwrap().total_seconds().unwrap(),
            10_800
        );
    }

    #[test]
    fn malformed_duration_is_a_parse_error() {
        let err = DurationSpec::parse(Some("two"), None).unwrap_err();
        assert_eq!(
            err,
            EventError::MalformedDuration {
                field: "hours",
                value: "two".into()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let spec = DurationSpec::parse(Some("1"), Some("-5")).unwrap();
        let err = spec.total_seconds().unwrap_err();
        assert_eq!(
            err,
            EventError::InvalidDuration {
                field: "minutes",
                value: -5
            }
        );
        assert_eq!(err.kind(), ErrorKind::Duration);
    }

    #[test]
    fn overflowing_duration_is_rejected() {
        let spec = DurationSpec::new(Some(i64::MAX), None);
        let err = spec.total_seconds().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duration);
        assert_eq!(
            err,
            EventError::InvalidDuration {
                field: "hours",
                value: i64::MAX,
            }
        );

        let spec = DurationSpec::new(None, Some(i64::MAX / 2));
        assert_eq!(
            spec.total_seconds().unwrap_err(),
            EventError::InvalidDuration {
                field: "minutes",
                value: i64::MAX / 2,
            }
        );
    }

    #[test]
    fn duration_beyond_chrono_range_reports_total_seconds() {
        let spec = DurationSpec::new(Some(3_000_000_000_000), Some(0));
        assert_eq!(
            spec.total_seconds().unwrap_err(),
            EventError::InvalidDuration {
                field: "duration",
                value: 10_800_000_000_000_000,
            }
        );
    }

    #[test]
    fn summary_does_not_order_times() {
        let request = build_summary(
            &filler(),
            &ReasonSelection::resolved(jam()),
            at("2025-01-01T09:00:00Z"),
            at("2025-01-01T08:00:00Z"),
            &DurationSpec::new(Some(0), Some(30)),
        )
        .unwrap();
        assert_eq!(request.duration_secs, 1800);
        assert_eq!(request.duration().unwrap(), Duration::minutes(30));
        assert!(request.start_time > request.end_time);
    }

    #[test]
    fn builders_are_idempotent() {
        let equipment = filler();
        let reason = ReasonSelection::resolved(jam());
        let spec = DurationSpec::new(Some(1), None);
        let start = at("2025-01-01T08:00:00Z");
        let end = at("2025-01-01T09:00:00Z");

        assert_eq!(
            build_summary(&equipment, &reason, start, end, &spec).unwrap(),
            build_summary(&equipment, &reason, start, end, &spec).unwrap()
        );
        assert_eq!(
            build_event(&equipment, &reason, start).unwrap(),
            build_event(&equipment, &reason, start).unwrap()
        );
    }
}
