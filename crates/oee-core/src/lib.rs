//! Core domain logic for operator event capture.
//!
//! This crate turns raw operator input into validated event requests:
//! - Selection: resolving the single leaf-level equipment an action targets
//! - Availability: point-in-time events and summarized time ranges
//! - Production: unit-of-measure resolution and production counts
//! - Changeover: job/material changes
//!
//! Everything here is a pure function over the supplied context. Recording is
//! delegated to an [`EventRecorder`].

pub mod availability;
pub mod changeover;
mod error;
pub mod plant;
pub mod production;
mod recorder;
mod request;
pub mod selection;
mod types;

pub use availability::{AvailabilityCaptureMode, DurationSpec, ReasonSelection};
pub use error::{ErrorKind, EventError};
pub use plant::{
    EntityGroup, EntityLevel, Equipment, EquipmentMaterial, Material, PlantEntity, Reason,
    UnitOfMeasure,
};
pub use production::ProductionClassification;
pub use recorder::{EventRecorder, RecordedEvent};
pub use request::{
    AvailabilityEventRequest, AvailabilitySummaryRequest, ChangeoverEventRequest, EventRequest,
    EventResolverType, ProductionEventRequest,
};
pub use types::{EntityId, LossCategory, MaterialId, ReasonId, ValidationError};
