//! Errors raised while turning operator input into an event request.
//!
//! Every variant is an operator-input defect: nothing is retried and nothing
//! partial is dispatched. Callers branch on [`EventError::kind`].

use thiserror::Error;

use crate::plant::EntityLevel;
use crate::production::ProductionClassification;
use crate::types::{EntityId, MaterialId};

/// Coarse classification of an [`EventError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No equipment, or a non-leaf node, was selected.
    Selection,
    /// A reason or material was required but absent.
    MissingField,
    /// A unit of measure or material configuration could not be derived.
    Resolution,
    /// A numeric amount or duration was malformed.
    Parse,
    /// A duration was negative or out of range.
    Duration,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventError {
    #[error("equipment must be selected in order to record the event")]
    NoSelection,

    #[error(
        "equipment must be selected in order to record the event ({entity} is at the {level} level)"
    )]
    InvalidLevel { entity: EntityId, level: EntityLevel },

    #[error("a reason must be selected")]
    MissingReason,

    #[error("a material must be selected")]
    MissingMaterial,

    #[error("the material being processed by {equipment} must be defined")]
    UndefinedMaterial { equipment: EntityId },

    #[error("the equipment settings of {equipment} for material {material} have not been defined")]
    UndefinedEquipmentMaterial {
        equipment: EntityId,
        material: MaterialId,
    },

    #[error("the {classification} unit of measure has not been defined for material {material}")]
    UndefinedUnit {
        material: MaterialId,
        classification: ProductionClassification,
    },

    #[error("invalid amount {value:?}: expected a number")]
    InvalidAmount { value: String },

    #[error("invalid {field} {value:?}: expected a whole number")]
    MalformedDuration { field: &'static str, value: String },

    #[error("invalid {field} value {value}: expected a non-negative duration")]
    InvalidDuration { field: &'static str, value: i64 },
}

impl EventError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSelection | Self::InvalidLevel { .. } => ErrorKind::Selection,
            Self::MissingReason | Self::MissingMaterial => ErrorKind::MissingField,
            Self::UndefinedMaterial { .. }
            | Self::UndefinedEquipmentMaterial { .. }
            | Self::UndefinedUnit { .. } => ErrorKind::Resolution,
            Self::InvalidAmount { .. } | Self::MalformedDuration { .. } => ErrorKind::Parse,
            Self::InvalidDuration { .. } => ErrorKind::Duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(EventError::NoSelection.kind(), ErrorKind::Selection);
        assert_eq!(EventError::MissingMaterial.kind(), ErrorKind::MissingField);
        assert_eq!(
            EventError::InvalidAmount {
                value: "abc".into()
            }
            .kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            EventError::InvalidDuration {
                field: "hours",
                value: -1
            }
            .kind(),
            ErrorKind::Duration
        );
    }

    #[test]
    fn operator_messages() {
        let err = EventError::InvalidLevel {
            entity: EntityId::new("Line 1").unwrap(),
            level: EntityLevel::ProductionLine,
        };
        assert_snapshot!(err.to_string(), @"equipment must be selected in order to record the event (Line 1 is at the production_line level)");

        let err = EventError::UndefinedUnit {
            material: MaterialId::new("PN-1000").unwrap(),
            classification: ProductionClassification::RejectRework,
        };
        assert_snapshot!(err.to_string(), @"the reject/rework unit of measure has not been defined for material PN-1000");

        let err = EventError::MalformedDuration {
            field: "minutes",
            value: "1.5".into(),
        };
        assert_snapshot!(err.to_string(), @r#"invalid minutes "1.5": expected a whole number"#);
    }
}
