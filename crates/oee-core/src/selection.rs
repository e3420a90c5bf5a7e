//! Resolves the equipment an operator action applies to.

use crate::error::EventError;
use crate::plant::{Equipment, PlantEntity};

/// Returns the selected equipment from a selection set.
///
/// Selection is single-select; when more than one node is supplied only the
/// first iterated node is considered. The node must be at the equipment level.
pub fn resolve<'a, I>(selection: I) -> Result<&'a Equipment, EventError>
where
    I: IntoIterator<Item = &'a PlantEntity>,
{
    let Some(node) = selection.into_iter().next() else {
        tracing::debug!("no plant entity selected");
        return Err(EventError::NoSelection);
    };

    match node {
        PlantEntity::Equipment(equipment) => {
            tracing::debug!(equipment = %equipment.name, "resolved equipment context");
            Ok(equipment)
        }
        PlantEntity::Group(group) => {
            tracing::debug!(entity = %group.name(), level = %group.level(), "selection is not equipment");
            Err(EventError::InvalidLevel {
                entity: group.name().clone(),
                level: group.level(),
            })
        }
    }
}
