//! Production counts and the unit of measure they are recorded in.
//!
//! Good production is counted in the equipment's run-rate unit for the material;
//! reject/rework production in its reject unit. Both come from the
//! equipment-material configuration and are never defaulted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::plant::{Equipment, EquipmentMaterial, Material, UnitOfMeasure};
use crate::request::{EventResolverType, ProductionEventRequest};
use crate::types::ValidationError;

/// Whether a production count is good output or reject/rework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionClassification {
    Good,
    RejectRework,
}

impl ProductionClassification {
    #[must_use]
    pub const fn resolver_type(self) -> EventResolverType {
        match self {
            Self::Good => EventResolverType::ProdGood,
            Self::RejectRework => EventResolverType::ProdReject,
        }
    }

    /// The configured unit this classification is counted in.
    pub const fn unit_of(self, config: &EquipmentMaterial) -> Option<&UnitOfMeasure> {
        match self {
            Self::Good => config.run_rate_uom.as_ref(),
            Self::RejectRework => config.reject_uom.as_ref(),
        }
    }
}

impl fmt::Display for ProductionClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Good => "good",
            Self::RejectRework => "reject/rework",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ProductionClassification {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "reject" | "reject/rework" | "reject_rework" | "reject-rework" => {
                Ok(Self::RejectRework)
            }
            _ => Err(ValidationError::InvalidClassification {
                value: s.to_string(),
            }),
        }
    }
}

/// Resolves the unit a production count is recorded in.
///
/// `material` overrides the equipment's current material when given.
pub fn resolve_unit(
    equipment: &Equipment,
    material: Option<&Material>,
    classification: ProductionClassification,
) -> Result<UnitOfMeasure, EventError> {
    let material = active_material(equipment, material)?;

    let Some(config) = equipment.equipment_material(&material.name) else {
        tracing::debug!(equipment = %equipment.name, material = %material.name, "no equipment material settings");
        return Err(EventError::UndefinedEquipmentMaterial {
            equipment: equipment.name.clone(),
            material: material.name.clone(),
        });
    };

    classification
        .unit_of(config)
        .cloned()
        .ok_or_else(|| EventError::UndefinedUnit {
            material: material.name.clone(),
            classification,
        })
}

/// Builds a production event from the operator's quantity text.
pub fn build_event(
    equipment: &Equipment,
    amount: &str,
    material: Option<&Material>,
    timestamp: DateTime<Utc>,
    classification: ProductionClassification,
) -> Result<ProductionEventRequest, EventError> {
    let unit = resolve_unit(equipment, material, classification)?;
    let amount = parse_amount(amount)?;
    let material = active_material(equipment, material)?;

    tracing::debug!(
        equipment = %equipment.name,
        material = %material.name,
        amount,
        unit = %unit,
        %classification,
        "built production event"
    );
    Ok(ProductionEventRequest {
        equipment: equipment.name.clone(),
        amount,
        unit,
        material: material.clone(),
        timestamp,
        resolver_type: classification.resolver_type(),
    })
}

fn active_material<'a>(
    equipment: &'a Equipment,
    material: Option<&'a Material>,
) -> Result<&'a Material, EventError> {
    material
        .or(equipment.current_material.as_ref())
        .ok_or_else(|| EventError::UndefinedMaterial {
            equipment: equipment.name.clone(),
        })
}

/// Parses a quantity. Range is not checked; zero and negative counts pass.
fn parse_amount(amount: &str) -> Result<f64, EventError> {
    let trimmed = amount.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(EventError::InvalidAmount {
            value: amount.to_string(),
        }),
    }
}
