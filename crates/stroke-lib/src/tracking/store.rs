//! SQLite-backed tracking store
//!
//! A single-file store for experiments, runs (params, metrics, artifacts)
//! and a versioned model registry. Artifacts and model blobs live on disk
//! next to the database; the store records their paths and checksums.

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Identifier of a run within the store.
pub type RunId = i64;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS experiments (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY,
    experiment_id INTEGER NOT NULL REFERENCES experiments(id),
    name TEXT,
    started_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS run_params (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    key TEXT NOT NULL,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS run_metrics (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    key TEXT NOT NULL,
    value REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS run_artifacts (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    name TEXT NOT NULL,
    path TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS registered_models (
    name TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS model_versions (
    model_name TEXT NOT NULL REFERENCES registered_models(name),
    version INTEGER NOT NULL,
    run_id INTEGER,
    path TEXT NOT NULL,
    checksum TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (model_name, version)
);
";

/// One registered version of a named model.
#[derive(Debug, Clone)]
pub struct ModelVersion {
    pub model_name: String,
    pub version: i64,
    pub path: PathBuf,
    pub checksum: String,
    pub created_at: i64,
}

/// Tracking store handle. Opening applies the schema, so `open` doubles as
/// provisioning for a fresh database file.
pub struct TrackingStore {
    conn: Connection,
    root: PathBuf,
}

impl TrackingStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        debug!(path = %path.display(), "Opened tracking store");
        Ok(Self { conn, root })
    }

    /// Create a named experiment. A second create for the same name fails
    /// with [`Error::ExperimentAlreadyExists`]; setup paths that re-run are
    /// expected to catch it, log it and look the experiment up instead.
    pub fn create_experiment(&self, name: &str) -> Result<i64> {
        match self.conn.execute(
            "INSERT INTO experiments (name, created_at) VALUES (?1, ?2)",
            params![name, now()],
        ) {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::ExperimentAlreadyExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn experiment_id(&self, name: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM experiments WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn start_run(&self, experiment_id: i64, name: Option<&str>) -> Result<RunId> {
        self.conn.execute(
            "INSERT INTO runs (experiment_id, name, started_at) VALUES (?1, ?2, ?3)",
            params![experiment_id, name, now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn log_param(&self, run_id: RunId, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO run_params (run_id, key, value) VALUES (?1, ?2, ?3)",
            params![run_id, key, value],
        )?;
        Ok(())
    }

    pub fn log_metric(&self, run_id: RunId, key: &str, value: f64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO run_metrics (run_id, key, value) VALUES (?1, ?2, ?3)",
            params![run_id, key, value],
        )?;
        Ok(())
    }

    /// Copy a file into the store's artifact area and record it against the
    /// run. Returns the stored path.
    pub fn log_artifact(&self, run_id: RunId, source: &Path) -> Result<PathBuf> {
        let name = source
            .file_name()
            .ok_or_else(|| Error::tracking(format!("artifact {} has no file name", source.display())))?
            .to_string_lossy()
            .into_owned();
        let dir = self.root.join("artifacts").join(format!("run_{run_id}"));
        fs::create_dir_all(&dir)?;
        let dest = dir.join(&name);
        fs::copy(source, &dest)?;
        self.conn.execute(
            "INSERT INTO run_artifacts (run_id, name, path) VALUES (?1, ?2, ?3)",
            params![run_id, name, dest.to_string_lossy().into_owned()],
        )?;
        Ok(dest)
    }

    /// Create a registry entry for a model name. Conflicts surface as
    /// [`Error::ModelAlreadyRegistered`] so re-runs can continue.
    pub fn create_registered_model(&self, name: &str) -> Result<()> {
        match self.conn.execute(
            "INSERT INTO registered_models (name, created_at) VALUES (?1, ?2)",
            params![name, now()],
        ) {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::ModelAlreadyRegistered(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store a model blob as the next version of a registered name.
    pub fn create_model_version(
        &self,
        name: &str,
        model_bytes: &[u8],
        run_id: Option<RunId>,
    ) -> Result<ModelVersion> {
        let version: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM model_versions WHERE model_name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        let dir = self.root.join("models").join(name);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("v{version}.bin"));
        fs::write(&path, model_bytes)?;
        let checksum = sha256_hex(model_bytes);
        let created_at = now();
        self.conn.execute(
            "INSERT INTO model_versions (model_name, version, run_id, path, checksum, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                version,
                run_id,
                path.to_string_lossy().into_owned(),
                checksum,
                created_at
            ],
        )?;
        Ok(ModelVersion {
            model_name: name.to_string(),
            version,
            path,
            checksum,
            created_at,
        })
    }

    /// Newest version registered under a name, if any.
    pub fn latest_version(&self, name: &str) -> Result<Option<ModelVersion>> {
        self.conn
            .query_row(
                "SELECT model_name, version, path, checksum, created_at FROM model_versions \
                 WHERE model_name = ?1 ORDER BY version DESC LIMIT 1",
                params![name],
                |row| {
                    Ok(ModelVersion {
                        model_name: row.get(0)?,
                        version: row.get(1)?,
                        path: PathBuf::from(row.get::<_, String>(2)?),
                        checksum: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

/// Hex-encoded SHA-256 of a byte slice, shared with the model loader's
/// artifact verification.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, TrackingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackingStore::open(dir.path().join("store.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn experiment_create_is_idempotency_aware() {
        let (_dir, store) = open_temp();
        let id = store.create_experiment("stroke-tuning").unwrap();
        assert!(id > 0);

        let err = store.create_experiment("stroke-tuning").unwrap_err();
        assert!(matches!(err, Error::ExperimentAlreadyExists(_)));
        assert!(err.is_already_exists());
        assert_eq!(store.experiment_id("stroke-tuning").unwrap(), Some(id));
    }

    #[test]
    fn runs_record_params_and_metrics() {
        let (_dir, store) = open_temp();
        let exp = store.create_experiment("exp").unwrap();
        let run = store.start_run(exp, Some("trial-0")).unwrap();
        store.log_param(run, "max_depth", "12").unwrap();
        store.log_metric(run, "mean_accuracy", 0.91).unwrap();
    }

    #[test]
    fn registered_model_conflict_is_typed() {
        let (_dir, store) = open_temp();
        store.create_registered_model("StrokePredictor").unwrap();
        let err = store.create_registered_model("StrokePredictor").unwrap_err();
        assert!(matches!(err, Error::ModelAlreadyRegistered(_)));
    }

    #[test]
    fn versions_increment_and_latest_resolves() {
        let (_dir, store) = open_temp();
        store.create_registered_model("StrokePredictor").unwrap();

        let v1 = store
            .create_model_version("StrokePredictor", b"first", None)
            .unwrap();
        let v2 = store
            .create_model_version("StrokePredictor", b"second", None)
            .unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);

        let latest = store.latest_version("StrokePredictor").unwrap().unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.checksum, sha256_hex(b"second"));
        assert_eq!(std::fs::read(&latest.path).unwrap(), b"second");
    }

    #[test]
    fn unregistered_name_has_no_versions() {
        let (_dir, store) = open_temp();
        assert!(store.latest_version("nope").unwrap().is_none());
    }

    #[test]
    fn artifacts_are_copied_into_the_store() {
        let (dir, store) = open_temp();
        let exp = store.create_experiment("exp").unwrap();
        let run = store.start_run(exp, None).unwrap();

        let src = dir.path().join("results.csv");
        std::fs::write(&src, "number,mean_accuracy\n0,0.9\n").unwrap();

        let stored = store.log_artifact(run, &src).unwrap();
        assert!(stored.exists());
        assert_ne!(stored, src);
        assert!(stored.to_string_lossy().contains("artifacts"));
    }
}
