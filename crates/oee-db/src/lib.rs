//! Storage layer for operator event capture.
//!
//! Provides the plant catalog (entities, materials, reasons, equipment-material
//! settings) the capture workflow queries, and persists finished event requests
//! using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Use one `Database` per thread, or wrap it in a `Mutex`.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g. `2024-01-15T10:30:00.000Z`), so lexicographic order matches
//! chronological order.
//!
//! The `data` column of `events` stores the full JSON-encoded request, tagged by
//! `type`. The `type` column stores the resolver type (`availability`,
//! `prod_good`, ...) for routing queries.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use oee_core::{
    EntityGroup, EntityId, EntityLevel, Equipment, EquipmentMaterial, EventRecorder,
    EventRequest, LossCategory, Material, MaterialId, PlantEntity, Reason, ReasonId,
    RecordedEvent, UnitOfMeasure, ValidationError,
};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored value failed domain validation.
    #[error("invalid stored value: {0}")]
    Validation(#[from] ValidationError),
    /// Failed to encode or decode an event payload.
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for event {event_id}: {timestamp}")]
    TimestampParse {
        event_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A catalog row refers to an equipment that is not in the catalog.
    #[error("unknown equipment {0}")]
    UnknownEquipment(String),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A plant entity row as imported from a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: EntityId,
    pub level: EntityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_material: Option<MaterialId>,
}

/// Equipment-material settings as imported from a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentMaterialRecord {
    pub equipment: EntityId,
    pub material: MaterialId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_rate_uom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_uom: Option<String>,
}

/// A plant catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub reasons: Vec<Reason>,
    #[serde(default)]
    pub equipment_materials: Vec<EquipmentMaterialRecord>,
}

/// Row counts of the catalog tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub entities: usize,
    pub materials: usize,
    pub reasons: usize,
    pub equipment_materials: usize,
}

/// A stored event row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: String,
    pub recorded_at: String,
    pub event_time: String,
    pub kind: String,
    pub equipment: String,
    pub data: String,
}

impl EventRecord {
    /// Decodes the stored payload back into a recorded event.
    pub fn to_recorded(&self) -> Result<RecordedEvent, DbError> {
        let recorded_at = DateTime::parse_from_rfc3339(&self.recorded_at)
            .map_err(|source| DbError::TimestampParse {
                event_id: self.id.clone(),
                timestamp: self.recorded_at.clone(),
                source,
            })?
            .with_timezone(&Utc);
        let request: EventRequest = serde_json::from_str(&self.data)?;
        Ok(RecordedEvent {
            id: self.id.clone(),
            recorded_at,
            request,
        })
    }
}

/// Number of stored events of one resolver type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeCount {
    pub kind: String,
    pub count: usize,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS materials (
                name TEXT PRIMARY KEY,
                description TEXT,
                category TEXT
            );

            CREATE TABLE IF NOT EXISTS entities (
                name TEXT PRIMARY KEY,
                description TEXT,
                level TEXT NOT NULL,
                parent TEXT,
                current_job TEXT,
                current_material TEXT
            );

            CREATE TABLE IF NOT EXISTS reasons (
                name TEXT PRIMARY KEY,
                description TEXT,
                loss_category TEXT
            );

            -- run_rate_uom / reject_uom: unit symbols, NULL when not configured
            CREATE TABLE IF NOT EXISTS equipment_materials (
                equipment TEXT NOT NULL,
                material TEXT NOT NULL,
                run_rate_uom TEXT,
                reject_uom TEXT,
                PRIMARY KEY (equipment, material),
                FOREIGN KEY (equipment) REFERENCES entities(name) ON DELETE CASCADE,
                FOREIGN KEY (material) REFERENCES materials(name) ON DELETE CASCADE
            );

            -- type: resolver type (e.g. 'availability', 'prod_good')
            -- data: JSON-encoded event request
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL,
                event_time TEXT NOT NULL,
                type TEXT NOT NULL,
                equipment TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_event_time ON events(event_time);
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(type);
            CREATE INDEX IF NOT EXISTS idx_events_equipment ON events(equipment);
            ",
        )?;
        Ok(())
    }

    /// Upserts a catalog document in one transaction.
    ///
    /// Materials are written first so equipment settings can reference them.
    pub fn import_catalog(&mut self, catalog: &Catalog) -> Result<CatalogCounts, DbError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO materials (name, description, category) VALUES (?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    description = excluded.description,
                    category = excluded.category
                ",
            )?;
            for material in &catalog.materials {
                stmt.execute(params![
                    material.name.as_str(),
                    material.description,
                    material.category,
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO entities (name, description, level, parent, current_job, current_material)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    description = excluded.description,
                    level = excluded.level,
                    parent = excluded.parent,
                    current_job = excluded.current_job,
                    current_material = excluded.current_material
                ",
            )?;
            for entity in &catalog.entities {
                stmt.execute(params![
                    entity.name.as_str(),
                    entity.description,
                    entity.level.as_str(),
                    entity.parent.as_ref().map(EntityId::as_str),
                    entity.current_job,
                    entity.current_material.as_ref().map(MaterialId::as_str),
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO reasons (name, description, loss_category) VALUES (?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    description = excluded.description,
                    loss_category = excluded.loss_category
                ",
            )?;
            for reason in &catalog.reasons {
                stmt.execute(params![
                    reason.name.as_str(),
                    reason.description,
                    reason.loss_category.map(|c| c.as_str()),
                ])?;
            }
        }
        {
            let mut level_stmt = tx.prepare("SELECT level FROM entities WHERE name = ?")?;
            let mut stmt = tx.prepare(
                "
                INSERT INTO equipment_materials (equipment, material, run_rate_uom, reject_uom)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(equipment, material) DO UPDATE SET
                    run_rate_uom = excluded.run_rate_uom,
                    reject_uom = excluded.reject_uom
                ",
            )?;
            for record in &catalog.equipment_materials {
                let level: Option<String> = level_stmt
                    .query_row([record.equipment.as_str()], |row| row.get(0))
                    .optional()?;
                let is_equipment = level
                    .as_deref()
                    .map(str::parse::<EntityLevel>)
                    .transpose()?
                    .is_some_and(EntityLevel::is_leaf);
                if !is_equipment {
                    return Err(DbError::UnknownEquipment(record.equipment.to_string()));
                }
                stmt.execute(params![
                    record.equipment.as_str(),
                    record.material.as_str(),
                    record.run_rate_uom,
                    record.reject_uom,
                ])?;
            }
        }
        tx.commit()?;

        let counts = CatalogCounts {
            entities: catalog.entities.len(),
            materials: catalog.materials.len(),
            reasons: catalog.reasons.len(),
            equipment_materials: catalog.equipment_materials.len(),
        };
        tracing::info!(?counts, "imported catalog");
        Ok(counts)
    }

    /// Counts rows in the catalog tables.
    pub fn catalog_counts(&self) -> Result<CatalogCounts, DbError> {
        let count = |table: &str| -> Result<usize, DbError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or_default())
        };
        Ok(CatalogCounts {
            entities: count("entities")?,
            materials: count("materials")?,
            reasons: count("reasons")?,
            equipment_materials: count("equipment_materials")?,
        })
    }

    /// Lists all plant entities ordered by name.
    pub fn list_entities(&self) -> Result<Vec<EntityRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT name, description, level, parent, current_job, current_material
            FROM entities
            ORDER BY name ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;
        let mut entities = Vec::new();
        for row in rows {
            let (name, description, level, parent, current_job, current_material) = row?;
            entities.push(EntityRecord {
                name: EntityId::new(name)?,
                level: level.parse()?,
                description,
                parent: parent.map(EntityId::new).transpose()?,
                current_job,
                current_material: current_material.map(MaterialId::new).transpose()?,
            });
        }
        Ok(entities)
    }

    /// Loads a plant entity by name.
    ///
    /// Equipment nodes come back hydrated with their current material and their
    /// equipment-material settings.
    pub fn plant_entity(&self, name: &str) -> Result<Option<PlantEntity>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT name, description, level, current_job, current_material
                FROM entities
                WHERE name = ?
                ",
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((name, description, level, current_job, current_material)) = row else {
            return Ok(None);
        };

        let name = EntityId::new(name)?;
        let level: EntityLevel = level.parse()?;
        if !level.is_leaf() {
            let group = EntityGroup::new(name, level)?.with_description(description);
            return Ok(Some(PlantEntity::Group(group)));
        }

        let current_material = match current_material {
            Some(material) => Some(self.material_or_bare(&material)?),
            None => None,
        };
        let mut equipment = Equipment::new(name);
        equipment.description = description;
        equipment.current_job = current_job;
        equipment.current_material = current_material;
        for config in self.equipment_materials(equipment.name.as_str())? {
            equipment = equipment.with_material_config(config);
        }
        Ok(Some(PlantEntity::Equipment(equipment)))
    }

    fn equipment_materials(&self, equipment: &str) -> Result<Vec<EquipmentMaterial>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT material, run_rate_uom, reject_uom
            FROM equipment_materials
            WHERE equipment = ?
            ORDER BY material ASC
            ",
        )?;
        let rows = stmt.query_map([equipment], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut configs = Vec::new();
        for row in rows {
            let (material, run_rate, reject) = row?;
            configs.push(EquipmentMaterial {
                material: MaterialId::new(material)?,
                run_rate_uom: unit_from_column(run_rate)?,
                reject_uom: unit_from_column(reject)?,
            });
        }
        Ok(configs)
    }

    /// Looks up a material by name.
    pub fn material(&self, name: &str) -> Result<Option<Material>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT name, description, category FROM materials WHERE name = ?",
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((name, description, category)) = row else {
            return Ok(None);
        };
        Ok(Some(Material {
            name: MaterialId::new(name)?,
            description,
            category,
        }))
    }

    /// A current material may name a material the catalog never listed.
    fn material_or_bare(&self, name: &str) -> Result<Material, DbError> {
        match self.material(name)? {
            Some(material) => Ok(material),
            None => Ok(Material::new(MaterialId::new(name)?)),
        }
    }

    /// Looks up a reason by name.
    pub fn reason(&self, name: &str) -> Result<Option<Reason>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT name, description, loss_category FROM reasons WHERE name = ?",
                [name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((name, description, loss_category)) = row else {
            return Ok(None);
        };
        Ok(Some(Reason {
            name: ReasonId::new(name)?,
            description,
            loss_category: loss_category
                .map(|c| c.parse::<LossCategory>())
                .transpose()?,
        }))
    }

    /// Lists all events ordered by event time then ID.
    pub fn list_events(&self) -> Result<Vec<EventRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, recorded_at, event_time, type, equipment, data
            FROM events
            ORDER BY event_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], event_from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Lists events whose event time falls in a range.
    ///
    /// Both bounds are optional; `after` is inclusive and `before` exclusive.
    pub fn list_events_in_range(
        &self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventRecord>, DbError> {
        let after = after.map(format_timestamp);
        let before = before.map(format_timestamp);
        let mut stmt = self.conn.prepare(
            "
            SELECT id, recorded_at, event_time, type, equipment, data
            FROM events
            WHERE (?1 IS NULL OR event_time >= ?1) AND (?2 IS NULL OR event_time < ?2)
            ORDER BY event_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![after, before], event_from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Counts events per resolver type, most frequent first.
    pub fn event_counts_by_type(&self) -> Result<Vec<EventTypeCount>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT type, COUNT(*) AS n
            FROM events
            GROUP BY type
            ORDER BY n DESC, type ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            let (kind, count) = row?;
            counts.push(EventTypeCount {
                kind,
                count: usize::try_from(count).unwrap_or_default(),
            });
        }
        Ok(counts)
    }

    fn record_at(
        &mut self,
        request: &EventRequest,
        recorded_at: DateTime<Utc>,
    ) -> Result<RecordedEvent, DbError> {
        let id = Uuid::new_v4().to_string();
        let data = serde_json::to_string(request)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "
            INSERT INTO events (id, recorded_at, event_time, type, equipment, data)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                id,
                format_timestamp(recorded_at),
                format_timestamp(request.event_time()),
                request.resolver_type().as_str(),
                request.equipment().as_str(),
                data,
            ],
        )?;
        if let EventRequest::Changeover(changeover) = request {
            tx.execute(
                "INSERT OR IGNORE INTO materials (name, description, category) VALUES (?, ?, ?)",
                params![
                    changeover.material.name.as_str(),
                    changeover.material.description,
                    changeover.material.category,
                ],
            )?;
            let updated = tx.execute(
                "UPDATE entities SET current_job = ?, current_material = ? WHERE name = ?",
                params![
                    changeover.job,
                    changeover.material.name.as_str(),
                    changeover.equipment.as_str(),
                ],
            )?;
            if updated == 0 {
                return Err(DbError::UnknownEquipment(changeover.equipment.to_string()));
            }
        }
        tx.commit()?;

        tracing::info!(%id, kind = %request.resolver_type(), equipment = %request.equipment(), "recorded event");
        Ok(RecordedEvent {
            id,
            recorded_at,
            request: request.clone(),
        })
    }
}

impl EventRecorder for Database {
    type Error = DbError;

    /// Stores the request. A changeover also becomes the equipment's current
    /// job and material.
    fn record(&mut self, request: &EventRequest) -> Result<RecordedEvent, DbError> {
        self.record_at(request, Utc::now())
    }
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        id: row.get(0)?,
        recorded_at: row.get(1)?,
        event_time: row.get(2)?,
        kind: row.get(3)?,
        equipment: row.get(4)?,
        data: row.get(5)?,
    })
}

fn unit_from_column(symbol: Option<String>) -> Result<Option<UnitOfMeasure>, DbError> {
    Ok(symbol
        .filter(|s| !s.trim().is_empty())
        .map(UnitOfMeasure::new)
        .transpose()?)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
