//! Spatial anchor service contract and a SQLite-backed implementation.
//!
//! Anchors are keyed by entity name. Attaching under an existing name
//! overwrites that anchor's pose; it is never a conflict.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Pose, Quaternion, Vector3};

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("Anchor database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Anchor service unavailable: {0}")]
    Unavailable(String),
}

/// Contract for the external service that pins entities to real-world poses.
pub trait SpatialAnchorPort: Send {
    /// Create or overwrite the anchor `name` at `pose`. Returns a diagnostic message.
    fn attach(&self, name: &str, pose: &Pose) -> Result<String, AnchorError>;

    /// Release the anchor from its entity without forgetting it.
    fn detach(&self, name: &str) -> Result<(), AnchorError>;

    /// Forget the anchor permanently. Unknown names are not an error.
    fn delete(&self, name: &str) -> Result<(), AnchorError>;

    /// The stored pose of `name`, if the service knows it.
    fn locate(&self, name: &str) -> Result<Option<Pose>, AnchorError>;
}

/// A row of the anchor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnchor {
    pub name: String,
    pub pose: Pose,
    pub attached: bool,
    pub updated_at: DateTime<Utc>,
}

/// Durable anchor store. Clones share one connection.
#[derive(Clone)]
pub struct SqliteAnchorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAnchorStore {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Anchor database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AnchorError> {
        self.conn
            .lock()
            .map_err(|_| AnchorError::Unavailable("anchor database lock poisoned".to_string()))
    }

    pub fn get(&self, name: &str) -> Result<Option<StoredAnchor>, AnchorError> {
        let conn = self.lock()?;
        let anchor = conn
            .query_row(
                "SELECT name, pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w, attached, updated_at
                 FROM anchors WHERE name = ?",
                [name],
                row_to_anchor,
            )
            .optional()?;
        Ok(anchor)
    }

    pub fn list(&self) -> Result<Vec<StoredAnchor>, AnchorError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w, attached, updated_at
             FROM anchors ORDER BY name",
        )?;
        let anchors = stmt
            .query_map([], row_to_anchor)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(anchors)
    }
}

impl SpatialAnchorPort for SqliteAnchorStore {
    fn attach(&self, name: &str, pose: &Pose) -> Result<String, AnchorError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let Pose { position, rotation } = pose;

        let replaced = conn
            .query_row("SELECT 1 FROM anchors WHERE name = ?", [name], |_| Ok(()))
            .optional()?
            .is_some();

        conn.execute(
            "INSERT INTO anchors (name, pos_x, pos_y, pos_z, rot_x, rot_y, rot_z, rot_w, attached, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
             ON CONFLICT(name) DO UPDATE SET
                pos_x = excluded.pos_x, pos_y = excluded.pos_y, pos_z = excluded.pos_z,
                rot_x = excluded.rot_x, rot_y = excluded.rot_y, rot_z = excluded.rot_z, rot_w = excluded.rot_w,
                attached = 1, updated_at = excluded.updated_at",
            (
                name,
                f64::from(position.x),
                f64::from(position.y),
                f64::from(position.z),
                f64::from(rotation.x),
                f64::from(rotation.y),
                f64::from(rotation.z),
                f64::from(rotation.w),
                &now,
            ),
        )?;

        Ok(if replaced {
            format!("Anchor {} re-attached", name)
        } else {
            format!("Anchor {} created", name)
        })
    }

    fn detach(&self, name: &str) -> Result<(), AnchorError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE anchors SET attached = 0, updated_at = ? WHERE name = ?",
            (Utc::now().to_rfc3339(), name),
        )?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), AnchorError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM anchors WHERE name = ?", [name])?;
        Ok(())
    }

    fn locate(&self, name: &str) -> Result<Option<Pose>, AnchorError> {
        Ok(self.get(name)?.map(|anchor| anchor.pose))
    }
}

fn row_to_anchor(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredAnchor> {
    let coord = |idx: usize| -> rusqlite::Result<f32> { Ok(row.get::<_, f64>(idx)? as f32) };
    Ok(StoredAnchor {
        name: row.get(0)?,
        pose: Pose::new(
            Vector3::new(coord(1)?, coord(2)?, coord(3)?),
            Quaternion {
                x: coord(4)?,
                y: coord(5)?,
                z: coord(6)?,
                w: coord(7)?,
            },
        ),
        attached: row.get::<_, i32>(8)? != 0,
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
