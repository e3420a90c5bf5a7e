//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Unknown hierarchy level name.
    #[error("invalid entity level: {value}")]
    InvalidLevel { value: String },

    /// Unknown availability capture mode.
    #[error("invalid capture mode: {value}")]
    InvalidCaptureMode { value: String },

    /// Unknown production classification.
    #[error("invalid production classification: {value}")]
    InvalidClassification { value: String },

    /// Unknown loss category name.
    #[error("invalid loss category: {value}")]
    InvalidLossCategory { value: String },

    /// Aggregation nodes cannot sit at the leaf level.
    #[error("{name} is an aggregation node and cannot use the equipment level")]
    GroupAtEquipmentLevel { name: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated plant entity name.
    ///
    /// Names are unique across the whole plant hierarchy, so the name doubles as
    /// the identity of an equipment node.
    EntityId, "entity name"
);

define_string_id!(
    /// A validated material name.
    MaterialId, "material name"
);

define_string_id!(
    /// A validated reason name.
    ReasonId, "reason name"
);

/// Loss bucket a reason is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCategory {
    NotScheduled,
    Unscheduled,
    PlannedDowntime,
    Setup,
    UnplannedDowntime,
    MinorStoppages,
    ReducedSpeed,
    RejectRework,
    StartupYield,
    NoLoss,
}

impl LossCategory {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotScheduled => "not_scheduled",
            Self::Unscheduled => "unscheduled",
            Self::PlannedDowntime => "planned_downtime",
            Self::Setup => "setup",
            Self::UnplannedDowntime => "unplanned_downtime",
            Self::MinorStoppages => "minor_stoppages",
            Self::ReducedSpeed => "reduced_speed",
            Self::RejectRework => "reject_rework",
            Self::StartupYield => "startup_yield",
            Self::NoLoss => "no_loss",
        }
    }
}

impl fmt::Display for LossCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LossCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "not_scheduled" => Ok(Self::NotScheduled),
            "unscheduled" => Ok(Self::Unscheduled),
            "planned_downtime" => Ok(Self::PlannedDowntime),
            "setup" => Ok(Self::Setup),
            "unplanned_downtime" => Ok(Self::UnplannedDowntime),
            "minor_stoppages" => Ok(Self::MinorStoppages),
            "reduced_speed" => Ok(Self::ReducedSpeed),
            "reject_rework" => Ok(Self::RejectRework),
            "startup_yield" => Ok(Self::StartupYield),
            "no_loss" => Ok(Self::NoLoss),
            _ => Err(ValidationError::InvalidLossCategory {
                value: s.to_string(),
            }),
        }
    }
}
