//! Plant model: the hierarchy levels and the entities an operator can select.
//!
//! Only the leaf of the hierarchy ([`EntityLevel::Equipment`]) carries recording
//! context (current job, current material, per-material unit configuration).
//! Everything above it is an [`EntityGroup`] with a name and a level.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, LossCategory, MaterialId, ReasonId, ValidationError};

/// ISA-95 hierarchy levels, from the top down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityLevel {
    Enterprise,
    Site,
    Area,
    ProductionLine,
    WorkCell,
    Equipment,
}

impl EntityLevel {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise",
            Self::Site => "site",
            Self::Area => "area",
            Self::ProductionLine => "production_line",
            Self::WorkCell => "work_cell",
            Self::Equipment => "equipment",
        }
    }

    /// Whether this is the leaf level events can be recorded against.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Equipment)
    }
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Plant exports use upper snake case (PRODUCTION_LINE).
        match s.to_ascii_lowercase().as_str() {
            "enterprise" => Ok(Self::Enterprise),
            "site" => Ok(Self::Site),
            "area" => Ok(Self::Area),
            "production_line" | "line" => Ok(Self::ProductionLine),
            "work_cell" | "cell" => Ok(Self::WorkCell),
            "equipment" => Ok(Self::Equipment),
            _ => Err(ValidationError::InvalidLevel {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for EntityLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A unit of measure, identified by its symbol (e.g. `kg`, `cans`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UnitOfMeasure {
    pub fn new(symbol: impl Into<String>) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "unit symbol",
            });
        }
        Ok(Self { symbol, name: None })
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A material (product, part number) an equipment can process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub name: MaterialId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Material {
    #[must_use]
    pub const fn new(name: MaterialId) -> Self {
        Self {
            name,
            description: None,
            category: None,
        }
    }
}

/// A reason an availability state applies (e.g. "Jam", "Lunch").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub name: ReasonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_category: Option<LossCategory>,
}

impl Reason {
    #[must_use]
    pub const fn new(name: ReasonId) -> Self {
        Self {
            name,
            description: None,
            loss_category: None,
        }
    }
}

/// Equipment-specific settings for one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentMaterial {
    pub material: MaterialId,
    /// Unit good production is counted in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_rate_uom: Option<UnitOfMeasure>,
    /// Unit reject/rework production is counted in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_uom: Option<UnitOfMeasure>,
}

/// A leaf-level equipment node with its current recording context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub name: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Job currently running, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job: Option<String>,
    /// Material currently being processed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_material: Option<Material>,
    /// Per-material configuration keyed by material name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub materials: BTreeMap<MaterialId, EquipmentMaterial>,
}

impl Equipment {
    #[must_use]
    pub const fn new(name: EntityId) -> Self {
        Self {
            name,
            description: None,
            current_job: None,
            current_material: None,
            materials: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the configuration for one material.
    #[must_use]
    pub fn with_material_config(mut self, config: EquipmentMaterial) -> Self {
        self.materials.insert(config.material.clone(), config);
        self
    }

    /// Looks up the configuration for a material.
    pub fn equipment_material(&self, material: &MaterialId) -> Option<&EquipmentMaterial> {
        self.materials.get(material)
    }
}

/// An aggregation node above the equipment level (site, area, line, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntityGroup")]
pub struct EntityGroup {
    name: EntityId,
    level: EntityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawEntityGroup {
    name: EntityId,
    level: EntityLevel,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<RawEntityGroup> for EntityGroup {
    type Error = ValidationError;

    fn try_from(raw: RawEntityGroup) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.name, raw.level)?.with_description(raw.description))
    }
}

impl EntityGroup {
    /// Creates an aggregation node. The leaf level is reserved for [`Equipment`].
    pub fn new(name: EntityId, level: EntityLevel) -> Result<Self, ValidationError> {
        if level.is_leaf() {
            return Err(ValidationError::GroupAtEquipmentLevel {
                name: name.into(),
            });
        }
        Ok(Self {
            name,
            level,
            description: None,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub const fn name(&self) -> &EntityId {
        &self.name
    }

    pub const fn level(&self) -> EntityLevel {
        self.level
    }
}

/// Any node of the plant hierarchy an operator can select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlantEntity {
    Equipment(Equipment),
    Group(EntityGroup),
}

impl PlantEntity {
    pub const fn name(&self) -> &EntityId {
        match self {
            Self::Equipment(equipment) => &equipment.name,
            Self::Group(group) => group.name(),
        }
    }

    pub const fn level(&self) -> EntityLevel {
        match self {
            Self::Equipment(_) => EntityLevel::Equipment,
            Self::Group(group) => group.level(),
        }
    }
}

impl From<Equipment> for PlantEntity {
    fn from(equipment: Equipment) -> Self {
        Self::Equipment(equipment)
    }
}

impl From<EntityGroup> for PlantEntity {
    fn from(group: EntityGroup) -> Self {
        Self::Group(group)
    }
}
