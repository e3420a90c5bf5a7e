//! Record commands: one per event kind.
//!
//! Every command loads the equipment context fresh from the catalog, resolves
//! it through the selection rules, builds the request and hands it to the
//! database recorder. Nothing is recorded when any step fails.

use anyhow::{Context, Result};
use clap::Args;

use oee_core::{
    AvailabilityCaptureMode, DurationSpec, Equipment, EventRecorder, EventRequest, PlantEntity,
    ProductionClassification, ReasonSelection, RecordedEvent, availability, changeover,
    production, selection,
};
use oee_db::Database;

use super::util::{lookup_material, parse_datetime, time_or_now};
use crate::Config;

#[derive(Debug, Args)]
pub struct AvailabilityArgs {
    /// Equipment the event applies to.
    #[arg(short, long)]
    pub equipment: String,

    /// Reason name from the catalog.
    #[arg(short, long)]
    pub reason: Option<String>,

    /// Capture mode (defaults to the configured mode).
    #[arg(long)]
    pub mode: Option<AvailabilityCaptureMode>,

    /// Event time, or summary start time (defaults to now).
    #[arg(long)]
    pub at: Option<String>,

    /// Summary end time.
    #[arg(long)]
    pub to: Option<String>,

    /// Summary duration, hours part.
    #[arg(long, allow_hyphen_values = true)]
    pub hours: Option<String>,

    /// Summary duration, minutes part.
    #[arg(long, allow_hyphen_values = true)]
    pub minutes: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProductionArgs {
    /// Equipment the count applies to.
    #[arg(short, long)]
    pub equipment: String,

    /// `good` or `reject-rework`.
    #[arg(long)]
    pub classification: ProductionClassification,

    /// Quantity produced.
    #[arg(short, long, allow_hyphen_values = true)]
    pub amount: String,

    /// Material produced (defaults to the equipment's current material).
    #[arg(short, long)]
    pub material: Option<String>,

    /// Event time (defaults to now).
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Args)]
pub struct ChangeoverArgs {
    /// Equipment being changed over.
    #[arg(short, long)]
    pub equipment: String,

    /// Material to change over to.
    #[arg(short, long)]
    pub material: Option<String>,

    /// Job to assign; omit for a changeover without a job.
    #[arg(short, long)]
    pub job: Option<String>,

    /// Event time (defaults to now).
    #[arg(long)]
    pub at: Option<String>,
}

pub fn availability(
    db: &mut Database,
    config: &Config,
    args: &AvailabilityArgs,
) -> Result<RecordedEvent> {
    let selected = select(db, &args.equipment)?;
    let equipment = resolve(&selected)?;

    let text = args.reason.as_deref().unwrap_or_default();
    let reason = ReasonSelection::new(text, db.reason(text.trim())?);
    let mode = args.mode.unwrap_or(config.default_capture_mode);

    let request = match mode {
        AvailabilityCaptureMode::Event => {
            let timestamp = time_or_now(args.at.as_deref())?;
            EventRequest::from(availability::build_event(equipment, &reason, timestamp)?)
        }
        AvailabilityCaptureMode::Summary => {
            let start = time_or_now(args.at.as_deref())?;
            let end = args
                .to
                .as_deref()
                .context("summary mode requires --to")
                .and_then(parse_datetime)?;
            let duration = DurationSpec::parse(args.hours.as_deref(), args.minutes.as_deref())?;
            EventRequest::from(availability::build_summary(
                equipment, &reason, start, end, &duration,
            )?)
        }
    };

    record(db, &request)
}

pub fn production(db: &mut Database, args: &ProductionArgs) -> Result<RecordedEvent> {
    let selected = select(db, &args.equipment)?;
    let equipment = resolve(&selected)?;

    let material = args
        .material
        .as_deref()
        .map(|name| lookup_material(db, name))
        .transpose()?;
    let timestamp = time_or_now(args.at.as_deref())?;

    let request = production::build_event(
        equipment,
        &args.amount,
        material.as_ref(),
        timestamp,
        args.classification,
    )?;
    record(db, &EventRequest::from(request))
}

pub fn changeover(db: &mut Database, args: &ChangeoverArgs) -> Result<RecordedEvent> {
    let selected = select(db, &args.equipment)?;
    let equipment = resolve(&selected)?;

    let material = args
        .material
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(|name| lookup_material(db, name))
        .transpose()?;
    let timestamp = time_or_now(args.at.as_deref())?;

    let request = changeover::build_event(
        equipment,
        args.job.as_deref().unwrap_or_default(),
        material.as_ref(),
        timestamp,
    )?;
    record(db, &EventRequest::from(request))
}

/// Loads the operator's selection. An unknown name selects nothing.
pub(crate) fn select(db: &Database, name: &str) -> Result<Vec<PlantEntity>> {
    let entity = db.plant_entity(name)?;
    if entity.is_none() {
        tracing::warn!(entity = name, "entity not in catalog");
    }
    Ok(entity.into_iter().collect())
}

pub(crate) fn resolve(selected: &[PlantEntity]) -> Result<&Equipment> {
    Ok(selection::resolve(selected)?)
}

fn record(db: &mut Database, request: &EventRequest) -> Result<RecordedEvent> {
    db.record(request)
        .with_context(|| format!("failed to record {} event", request.resolver_type()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use oee_core::{
        EntityId, EntityLevel, ErrorKind, EventError, LossCategory, Material, MaterialId, Reason,
        ReasonId,
    };
    use oee_db::{Catalog, EntityRecord, EquipmentMaterialRecord};

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let mut jam = Reason::new(ReasonId::new("Jam").unwrap());
        jam.loss_category = Some(LossCategory::MinorStoppages);
        db.import_catalog(&Catalog {
            entities: vec![
                EntityRecord {
                    name: EntityId::new("Line 1").unwrap(),
                    level: EntityLevel::ProductionLine,
                    description: None,
                    parent: None,
                    current_job: None,
                    current_material: None,
                },
                EntityRecord {
                    name: EntityId::new("Filler").unwrap(),
                    level: EntityLevel::Equipment,
                    description: None,
                    parent: Some(EntityId::new("Line 1").unwrap()),
                    current_job: Some("JOB-1".into()),
                    current_material: Some(MaterialId::new("PN-1000").unwrap()),
                },
            ],
            materials: vec![Material::new(MaterialId::new("PN-1000").unwrap())],
            reasons: vec![jam],
            equipment_materials: vec![EquipmentMaterialRecord {
                equipment: EntityId::new("Filler").unwrap(),
                material: MaterialId::new("PN-1000").unwrap(),
                run_rate_uom: Some("cans".into()),
                reject_uom: Some("cans".into()),
            }],
        })
        .unwrap();
        db
    }

    fn availability_args(mode: AvailabilityCaptureMode) -> AvailabilityArgs {
        AvailabilityArgs {
            equipment: "Filler".into(),
            reason: Some("Jam".into()),
            mode: Some(mode),
            at: Some("2025-01-01T08:00:00Z".into()),
            to: Some("2025-01-01T10:30:00Z".into()),
            hours: Some("2".into()),
            minutes: Some("30".into()),
        }
    }

    fn event_error(err: &anyhow::Error) -> &EventError {
        err.downcast_ref::<EventError>().expect("event error")
    }

    #[test]
    fn summary_records_duration() {
        let mut db = seeded();
        let args = availability_args(AvailabilityCaptureMode::Summary);

        let recorded = availability(&mut db, &Config::default(), &args).unwrap();
        let EventRequest::AvailabilitySummary(summary) = recorded.request else {
            panic!("expected summary");
        };
        assert_eq!(summary.duration_secs, 9000);
        assert_eq!(db.list_events().unwrap().len(), 1);
    }

    #[test]
    fn configured_mode_applies_when_flag_is_absent() {
        let mut db = seeded();
        let mut args = availability_args(AvailabilityCaptureMode::Summary);
        args.mode = None;
        let config = Config {
            default_capture_mode: AvailabilityCaptureMode::Event,
            ..Config::default()
        };

        let recorded = availability(&mut db, &config, &args).unwrap();
        assert!(matches!(recorded.request, EventRequest::Availability(_)));
    }

    #[test]
    fn unknown_reason_records_nothing() {
        let mut db = seeded();
        let mut args = availability_args(AvailabilityCaptureMode::Event);
        args.reason = Some("Coffee".into());

        let err = availability(&mut db, &Config::default(), &args).unwrap_err();
        assert_eq!(event_error(&err), &EventError::MissingReason);
        assert!(db.list_events().unwrap().is_empty());
    }

    #[test]
    fn summary_without_end_time_fails() {
        let mut db = seeded();
        let mut args = availability_args(AvailabilityCaptureMode::Summary);
        args.to = None;

        let err = availability(&mut db, &Config::default(), &args).unwrap_err();
        assert!(err.to_string().contains("--to"));
    }

    #[test]
    fn line_selection_is_rejected() {
        let mut db = seeded();
        let mut args = availability_args(AvailabilityCaptureMode::Event);
        args.equipment = "Line 1".into();

        let err = availability(&mut db, &Config::default(), &args).unwrap_err();
        assert_eq!(event_error(&err).kind(), ErrorKind::Selection);
    }

    #[test]
    fn unknown_equipment_selects_nothing() {
        let db = seeded();
        let selected = select(&db, "Ghost").unwrap();
        let err = resolve(&selected).unwrap_err();
        assert_eq!(event_error(&err), &EventError::NoSelection);
    }

    #[test]
    fn production_uses_current_material_unit() {
        let mut db = seeded();
        let args = ProductionArgs {
            equipment: "Filler".into(),
            classification: ProductionClassification::RejectRework,
            amount: " 12 ".into(),
            material: None,
            at: Some("2025-01-01T09:00:00Z".into()),
        };

        let recorded = production(&mut db, &args).unwrap();
        let EventRequest::Production(request) = recorded.request else {
            panic!("expected production");
        };
        assert_eq!(request.unit.symbol, "cans");
        assert_eq!(request.material.name.as_str(), "PN-1000");
        assert_eq!(db.event_counts_by_type().unwrap()[0].kind, "prod_reject");
    }

    #[test]
    fn production_for_unconfigured_material_fails() {
        let mut db = seeded();
        let args = ProductionArgs {
            equipment: "Filler".into(),
            classification: ProductionClassification::Good,
            amount: "12".into(),
            material: Some("PN-2000".into()),
            at: None,
        };

        let err = production(&mut db, &args).unwrap_err();
        assert!(matches!(
            event_error(&err),
            EventError::UndefinedEquipmentMaterial { .. }
        ));
    }

    #[test]
    fn changeover_then_production_needs_new_settings() {
        let mut db = seeded();
        changeover(
            &mut db,
            &ChangeoverArgs {
                equipment: "Filler".into(),
                material: Some("PN-2000".into()),
                job: Some("JOB-2".into()),
                at: Some("2025-01-01T06:00:00Z".into()),
            },
        )
        .unwrap();

        let args = ProductionArgs {
            equipment: "Filler".into(),
            classification: ProductionClassification::Good,
            amount: "5".into(),
            material: None,
            at: None,
        };
        let err = production(&mut db, &args).unwrap_err();
        assert!(matches!(
            event_error(&err),
            EventError::UndefinedEquipmentMaterial { material, .. } if material.as_str() == "PN-2000"
        ));
    }

    #[test]
    fn changeover_requires_material() {
        let mut db = seeded();
        let err = changeover(
            &mut db,
            &ChangeoverArgs {
                equipment: "Filler".into(),
                material: None,
                job: Some("JOB-2".into()),
                at: None,
            },
        )
        .unwrap_err();
        assert_eq!(event_error(&err), &EventError::MissingMaterial);
    }
}
