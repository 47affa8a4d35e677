//! SQLite tracking store and model registry.
//!
//! Runs belong to named experiments and carry params, metrics, tags, input
//! datasets and artifacts. Registered model versions point at an artifact of
//! a run; aliases name a version of a model (`latest-model`, ...).

use crate::error::{ModelError, Result};
use crate::pipeline::FarePipeline;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run in progress
    Running,
    /// Run completed
    Finished,
    /// Run aborted with an error
    Failed,
}

impl RunStatus {
    /// Convert to database string representation.
    pub const fn to_db_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "RUNNING" => Some(Self::Running),
            "FINISHED" => Some(Self::Finished),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A dataset a run consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    /// Dataset name, e.g. the blob it was read from
    pub name: String,
    /// Role of the dataset ("training", ...)
    pub context: String,
    /// Row count
    pub rows: u64,
}

/// Everything recorded for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Run id
    pub run_id: String,
    /// Experiment name
    pub experiment: String,
    /// Current status
    pub status: RunStatus,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time, once ended
    pub end_time: Option<DateTime<Utc>>,
    /// Logged params
    pub params: BTreeMap<String, String>,
    /// Latest value of each logged metric
    pub metrics: BTreeMap<String, f64>,
    /// Run tags
    pub tags: BTreeMap<String, String>,
    /// Logged input datasets
    pub inputs: Vec<RunInput>,
}

/// One registered version of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Registered model name
    pub name: String,
    /// Version number, from 1
    pub version: i64,
    /// Run that produced the artifact
    pub run_id: String,
    /// Artifact path within the run
    pub artifact_path: String,
    /// Version tags
    pub tags: BTreeMap<String, String>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl ModelVersion {
    /// `runs:/{run_id}/{artifact_path}`
    pub fn source_uri(&self) -> String {
        format!("runs:/{}/{}", self.run_id, self.artifact_path)
    }
}

/// SQLite-backed experiment tracking and model registry.
#[derive(Debug)]
pub struct TrackingStore {
    conn: Connection,
}

impl TrackingStore {
    /// Open (or create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS experiments (
                experiment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                experiment_id INTEGER NOT NULL REFERENCES experiments(experiment_id),
                status TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT
            );

            CREATE TABLE IF NOT EXISTS run_params (
                run_id TEXT NOT NULL REFERENCES runs(run_id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (run_id, key)
            );

            CREATE TABLE IF NOT EXISTS run_metrics (
                run_id TEXT NOT NULL REFERENCES runs(run_id),
                key TEXT NOT NULL,
                value REAL NOT NULL,
                logged_at TEXT NOT NULL,
                PRIMARY KEY (run_id, key)
            );

            CREATE TABLE IF NOT EXISTS run_tags (
                run_id TEXT NOT NULL REFERENCES runs(run_id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (run_id, key)
            );

            CREATE TABLE IF NOT EXISTS run_inputs (
                run_id TEXT NOT NULL REFERENCES runs(run_id),
                name TEXT NOT NULL,
                context TEXT NOT NULL,
                rows INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS artifacts (
                run_id TEXT NOT NULL REFERENCES runs(run_id),
                path TEXT NOT NULL,
                content BLOB NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (run_id, path)
            );

            CREATE TABLE IF NOT EXISTS model_versions (
                name TEXT NOT NULL,
                version INTEGER NOT NULL,
                run_id TEXT NOT NULL REFERENCES runs(run_id),
                artifact_path TEXT NOT NULL,
                tags TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (name, version)
            );

            CREATE TABLE IF NOT EXISTS model_aliases (
                name TEXT NOT NULL,
                alias TEXT NOT NULL,
                version INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (name, alias),
                FOREIGN KEY (name, version) REFERENCES model_versions(name, version)
            );",
        )?;
        Ok(())
    }

    /// Id of experiment `name`, creating it if needed.
    pub fn get_or_create_experiment(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO experiments (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        let id = self.conn.query_row(
            "SELECT experiment_id FROM experiments WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Start a run in `experiment` and return its id.
    pub fn create_run(&self, experiment: &str, tags: &BTreeMap<String, String>) -> Result<String> {
        let experiment_id = self.get_or_create_experiment(experiment)?;
        let run_id = Uuid::new_v4().simple().to_string();

        self.conn.execute(
            "INSERT INTO runs (run_id, experiment_id, status, start_time) VALUES (?1, ?2, ?3, ?4)",
            params![
                run_id,
                experiment_id,
                RunStatus::Running.to_db_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        for (key, value) in tags {
            self.set_tag(&run_id, key, value)?;
        }

        info!(experiment, run_id = %run_id, "started run");
        Ok(run_id)
    }

    /// Mark a run ended with `status`.
    pub fn end_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, end_time = ?2 WHERE run_id = ?3",
            params![status.to_db_str(), Utc::now().to_rfc3339(), run_id],
        )?;
        if updated == 0 {
            return Err(ModelError::RunNotFound(run_id.to_string()));
        }
        Ok(())
    }

    fn ensure_run(&self, run_id: &str) -> Result<()> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM runs WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        found
            .map(|_| ())
            .ok_or_else(|| ModelError::RunNotFound(run_id.to_string()))
    }

    /// Set a run tag, replacing any previous value.
    pub fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_run(run_id)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO run_tags (run_id, key, value) VALUES (?1, ?2, ?3)",
            params![run_id, key, value],
        )?;
        Ok(())
    }

    /// Log a run parameter.
    pub fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_run(run_id)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO run_params (run_id, key, value) VALUES (?1, ?2, ?3)",
            params![run_id, key, value],
        )?;
        Ok(())
    }

    /// Log a metric; a later value for the same key replaces the earlier one.
    pub fn log_metric(&self, run_id: &str, key: &str, value: f64) -> Result<()> {
        self.ensure_run(run_id)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO run_metrics (run_id, key, value, logged_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![run_id, key, value, Utc::now().to_rfc3339()],
        )?;
        debug!(run_id, key, value, "logged metric");
        Ok(())
    }

    /// Record a dataset the run consumed.
    pub fn log_input(&self, run_id: &str, input: &RunInput) -> Result<()> {
        self.ensure_run(run_id)?;
        self.conn.execute(
            "INSERT INTO run_inputs (run_id, name, context, rows) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, input.name, input.context, input.rows as i64],
        )?;
        Ok(())
    }

    /// Store an artifact under `path` in the run.
    pub fn log_artifact(&self, run_id: &str, path: &str, content: &[u8]) -> Result<()> {
        self.ensure_run(run_id)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO artifacts (run_id, path, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![run_id, path, content, Utc::now().to_rfc3339()],
        )?;
        debug!(run_id, path, bytes = content.len(), "logged artifact");
        Ok(())
    }

    /// Read an artifact back.
    pub fn read_artifact(&self, run_id: &str, path: &str) -> Result<Vec<u8>> {
        self.conn
            .query_row(
                "SELECT content FROM artifacts WHERE run_id = ?1 AND path = ?2",
                params![run_id, path],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ModelError::ArtifactNotFound {
                run_id: run_id.to_string(),
                path: path.to_string(),
            })
    }

    /// Everything recorded for a run.
    pub fn get_run(&self, run_id: &str) -> Result<RunInfo> {
        let header = self
            .conn
            .query_row(
                "SELECT r.run_id, e.name, r.status, r.start_time, r.end_time
                 FROM runs r JOIN experiments e ON e.experiment_id = r.experiment_id
                 WHERE r.run_id = ?1",
                params![run_id],
                |row| {
                    let status: String = row.get(2)?;
                    let status = RunStatus::from_db_str(&status).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            Type::Text,
                            format!("unknown run status {status}").into(),
                        )
                    })?;
                    let end_time: Option<String> = row.get(4)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        status,
                        parse_time(3, &row.get::<_, String>(3)?)?,
                        end_time.map(|t| parse_time(4, &t)).transpose()?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| ModelError::RunNotFound(run_id.to_string()))?;

        let (run_id, experiment, status, start_time, end_time) = header;

        let inputs = {
            let mut stmt = self.conn.prepare(
                "SELECT name, context, rows FROM run_inputs WHERE run_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![run_id], |row| {
                Ok(RunInput {
                    name: row.get(0)?,
                    context: row.get(1)?,
                    rows: row.get::<_, i64>(2)? as u64,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        Ok(RunInfo {
            params: self.key_values("run_params", &run_id)?,
            tags: self.key_values("run_tags", &run_id)?,
            metrics: self.metrics(&run_id)?,
            inputs,
            run_id,
            experiment,
            status,
            start_time,
            end_time,
        })
    }

    fn key_values(&self, table: &str, run_id: &str) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT key, value FROM {table} WHERE run_id = ?1"))?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
    }

    fn metrics(&self, run_id: &str) -> Result<BTreeMap<String, f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM run_metrics WHERE run_id = ?1")?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
    }

    /// Register the artifact at `artifact_path` of `run_id` as the next
    /// version of model `name`.
    pub fn register_model(
        &self,
        name: &str,
        run_id: &str,
        artifact_path: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<ModelVersion> {
        self.ensure_run(run_id)?;

        let tx = self.conn.unchecked_transaction()?;
        let version: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM model_versions WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        let created_at = Utc::now();
        tx.execute(
            "INSERT INTO model_versions (name, version, run_id, artifact_path, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                version,
                run_id,
                artifact_path,
                serde_json::to_string(tags)?,
                created_at.to_rfc3339()
            ],
        )?;
        tx.commit()?;

        info!(model = name, version, run_id, "registered model version");
        Ok(ModelVersion {
            name: name.to_string(),
            version,
            run_id: run_id.to_string(),
            artifact_path: artifact_path.to_string(),
            tags: tags.clone(),
            created_at,
        })
    }

    /// Look up one version of a model.
    pub fn get_model_version(&self, name: &str, version: i64) -> Result<ModelVersion> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, artifact_path, tags, created_at
                 FROM model_versions WHERE name = ?1 AND version = ?2",
                params![name, version],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        parse_time(3, &row.get::<_, String>(3)?)?,
                    ))
                },
            )
            .optional()?;

        let (run_id, artifact_path, tags, created_at) =
            row.ok_or_else(|| ModelError::VersionNotFound {
                name: name.to_string(),
                version,
            })?;

        Ok(ModelVersion {
            name: name.to_string(),
            version,
            run_id,
            artifact_path,
            tags: serde_json::from_str(&tags)?,
            created_at,
        })
    }

    /// Highest registered version of a model.
    pub fn latest_version(&self, name: &str) -> Result<Option<i64>> {
        let version = self.conn.query_row(
            "SELECT MAX(version) FROM model_versions WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    /// Point `alias` of model `name` at `version`.
    pub fn set_alias(&self, name: &str, alias: &str, version: i64) -> Result<()> {
        self.get_model_version(name, version)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO model_aliases (name, alias, version, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, alias, version, Utc::now().to_rfc3339()],
        )?;
        info!(model = name, alias, version, "moved alias");
        Ok(())
    }

    /// Version currently named by `alias`.
    pub fn get_version_by_alias(&self, name: &str, alias: &str) -> Result<ModelVersion> {
        let version: Option<i64> = self
            .conn
            .query_row(
                "SELECT version FROM model_aliases WHERE name = ?1 AND alias = ?2",
                params![name, alias],
                |row| row.get(0),
            )
            .optional()?;

        let version = version.ok_or_else(|| ModelError::AliasNotFound {
            name: name.to_string(),
            alias: alias.to_string(),
        })?;
        self.get_model_version(name, version)
    }

    /// Load the pipeline behind `alias` of model `name`.
    pub fn load_model(&self, name: &str, alias: &str) -> Result<FarePipeline> {
        let version = self.get_version_by_alias(name, alias)?;
        let content = self.read_artifact(&version.run_id, &version.artifact_path)?;
        let json = String::from_utf8(content).map_err(|e| {
            ModelError::InvalidState(format!("artifact {} is not UTF-8: {e}", version.source_uri()))
        })?;
        FarePipeline::from_json(&json)
    }
}

fn parse_time(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("git_sha".to_string(), "abc123".to_string()),
            ("branch".to_string(), "main".to_string()),
        ])
    }

    #[test]
    fn test_run_records_params_metrics_tags() {
        let store = TrackingStore::in_memory().unwrap();
        let run_id = store.create_run("taxi", &tags()).unwrap();

        store.log_param(&run_id, "model_type", "linear").unwrap();
        store.log_metric(&run_id, "rmse", 2.0).unwrap();
        store.log_metric(&run_id, "rmse", 1.5).unwrap();
        store
            .log_input(
                &run_id,
                &RunInput {
                    name: "train.parquet".into(),
                    context: "training".into(),
                    rows: 10,
                },
            )
            .unwrap();
        store.end_run(&run_id, RunStatus::Finished).unwrap();

        let run = store.get_run(&run_id).unwrap();
        assert_eq!(run.experiment, "taxi");
        assert_eq!(run.status, RunStatus::Finished);
        assert!(run.end_time.is_some());
        assert_eq!(run.params["model_type"], "linear");
        assert_eq!(run.metrics["rmse"], 1.5);
        assert_eq!(run.tags, tags());
        assert_eq!(run.inputs.len(), 1);
    }

    #[test]
    fn test_unknown_run() {
        let store = TrackingStore::in_memory().unwrap();
        assert!(matches!(
            store.log_metric("missing", "rmse", 1.0),
            Err(ModelError::RunNotFound(_))
        ));
        assert!(matches!(
            store.get_run("missing"),
            Err(ModelError::RunNotFound(_))
        ));
    }

    #[test]
    fn test_experiment_reused() {
        let store = TrackingStore::in_memory().unwrap();
        let a = store.get_or_create_experiment("taxi").unwrap();
        let b = store.get_or_create_experiment("taxi").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_versions_increase_and_alias_moves() {
        let store = TrackingStore::in_memory().unwrap();
        let run_a = store.create_run("taxi", &tags()).unwrap();
        let run_b = store.create_run("taxi", &tags()).unwrap();

        let v1 = store
            .register_model("taxi.fare", &run_a, "pipe", &tags())
            .unwrap();
        let v2 = store
            .register_model("taxi.fare", &run_b, "pipe", &tags())
            .unwrap();
        assert_eq!((v1.version, v2.version), (1, 2));
        assert_eq!(store.latest_version("taxi.fare").unwrap(), Some(2));
        assert_eq!(store.latest_version("other").unwrap(), None);

        store.set_alias("taxi.fare", "latest-model", 1).unwrap();
        store.set_alias("taxi.fare", "latest-model", 2).unwrap();
        let current = store
            .get_version_by_alias("taxi.fare", "latest-model")
            .unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.run_id, run_b);
        assert_eq!(current.source_uri(), format!("runs:/{run_b}/pipe"));
    }

    #[test]
    fn test_alias_requires_version() {
        let store = TrackingStore::in_memory().unwrap();
        assert!(matches!(
            store.set_alias("taxi.fare", "latest-model", 3),
            Err(ModelError::VersionNotFound { version: 3, .. })
        ));
        assert!(matches!(
            store.get_version_by_alias("taxi.fare", "latest-model"),
            Err(ModelError::AliasNotFound { .. })
        ));
    }

    #[test]
    fn test_artifact_round_trip() {
        let store = TrackingStore::in_memory().unwrap();
        let run_id = store.create_run("taxi", &BTreeMap::new()).unwrap();

        store.log_artifact(&run_id, "notes.txt", b"hello").unwrap();
        assert_eq!(store.read_artifact(&run_id, "notes.txt").unwrap(), b"hello");
        assert!(matches!(
            store.read_artifact(&run_id, "other"),
            Err(ModelError::ArtifactNotFound { .. })
        ));
    }
}
