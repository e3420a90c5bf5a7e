//! Job/material changeover.

use chrono::{DateTime, Utc};

use crate::error::EventError;
use crate::plant::{Equipment, Material};
use crate::request::ChangeoverEventRequest;

/// Builds a changeover to `material`, optionally assigning a job.
///
/// A blank job is a changeover without a job assignment.
pub fn build_event(
    equipment: &Equipment,
    job: &str,
    material: Option<&Material>,
    timestamp: DateTime<Utc>,
) -> Result<ChangeoverEventRequest, EventError> {
    let material = material.ok_or(EventError::MissingMaterial)?;
    let job = Some(job.trim())
        .filter(|job| !job.is_empty())
        .map(str::to_string);

    tracing::debug!(equipment = %equipment.name, material = %material.name, ?job, "built changeover event");
    Ok(ChangeoverEventRequest {
        equipment: equipment.name.clone(),
        job,
        material: material.clone(),
        timestamp,
    })
}
