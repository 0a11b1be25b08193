//! Embedded SQLite implementation of the graph store contract.
//!
//! Node and relation tables are declared one-to-one with the data model;
//! declarations are idempotent, so re-initialization is a no-op. List
//! parameters bind through the `rarray` table-valued function. The FTS5
//! index over Memory(content, summary) is probed at init and kept in sync
//! with triggers; when the probe fails the capability flag stays false and
//! the service falls back to containment search.

use rusqlite::types::Value as SqlValue;
use rusqlite::vtab::array;
use rusqlite::{Connection, ToSql};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::{GraphStore, Row, Value};
use crate::{Error, Result};

/// Node table declarations, one per entity type.
const NODE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS Memory (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        summary TEXT NOT NULL,
        created TEXT NOT NULL,
        lastAccessed TEXT NOT NULL,
        accessCount INTEGER NOT NULL DEFAULT 0,
        confidence REAL NOT NULL DEFAULT 1.0,
        permeability TEXT NOT NULL DEFAULT 'open'
    )",
    "CREATE TABLE IF NOT EXISTS Concept (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Keyword (
        id TEXT PRIMARY KEY,
        term TEXT NOT NULL,
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Topic (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Entity (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        aliases TEXT NOT NULL DEFAULT '[]',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Source (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL,
        reference TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        reliability REAL NOT NULL DEFAULT 1.0,
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Decision (
        id TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        rationale TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        outcome TEXT NOT NULL DEFAULT '',
        reversible INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS Goal (
        id TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        priority INTEGER NOT NULL DEFAULT 5,
        targetDate TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Question (
        id TEXT PRIMARY KEY,
        text TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'open',
        answeredDate TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Context (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'active',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Preference (
        id TEXT PRIMARY KEY,
        category TEXT NOT NULL,
        preference TEXT NOT NULL,
        strength REAL NOT NULL DEFAULT 0.5,
        observations INTEGER NOT NULL DEFAULT 1,
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS TemporalMarker (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL,
        description TEXT NOT NULL,
        startDate TEXT NOT NULL DEFAULT '',
        endDate TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Contradiction (
        id TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        resolution TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'unresolved',
        created TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Compartment (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        permeability TEXT NOT NULL DEFAULT 'open',
        allowExternalConnections INTEGER NOT NULL DEFAULT 1,
        description TEXT NOT NULL DEFAULT '',
        created TEXT NOT NULL
    )",
];

/// Relation table declarations; weighted relations carry REAL properties.
const REL_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS HAS_CONCEPT (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Concept(id),
        relevance REAL NOT NULL DEFAULT 1.0,
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS HAS_KEYWORD (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Keyword(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS BELONGS_TO (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Topic(id),
        isPrimary INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS MENTIONS (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Entity(id),
        role TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS FROM_SOURCE (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Source(id),
        excerpt TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS IN_CONTEXT (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Context(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS INFORMED (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Decision(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS PARTIALLY_ANSWERS (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Question(id),
        completeness REAL NOT NULL DEFAULT 0.5,
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS SUPPORTS (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Goal(id),
        strength REAL NOT NULL DEFAULT 0.5,
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS REVEALS (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Preference(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS OCCURRED_DURING (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES TemporalMarker(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS RELATES_TO (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Memory(id),
        strength REAL NOT NULL DEFAULT 0.5,
        relType TEXT NOT NULL DEFAULT '',
        permeability TEXT NOT NULL DEFAULT 'open',
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS IN_COMPARTMENT (
        from_id TEXT NOT NULL REFERENCES Memory(id),
        to_id TEXT NOT NULL REFERENCES Compartment(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS CONCEPT_RELATED_TO (
        from_id TEXT NOT NULL REFERENCES Concept(id),
        to_id TEXT NOT NULL REFERENCES Concept(id),
        relType TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS DEPENDS_ON (
        from_id TEXT NOT NULL REFERENCES Goal(id),
        to_id TEXT NOT NULL REFERENCES Goal(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS LED_TO (
        from_id TEXT NOT NULL REFERENCES Decision(id),
        to_id TEXT NOT NULL REFERENCES Decision(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS PART_OF (
        from_id TEXT NOT NULL REFERENCES Context(id),
        to_id TEXT NOT NULL REFERENCES Context(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS CONFLICTS_WITH (
        from_id TEXT NOT NULL REFERENCES Contradiction(id),
        to_id TEXT NOT NULL REFERENCES Memory(id),
        PRIMARY KEY (from_id, to_id)
    )",
    "CREATE TABLE IF NOT EXISTS SUPERSEDES (
        from_id TEXT NOT NULL REFERENCES Contradiction(id),
        to_id TEXT NOT NULL REFERENCES Memory(id),
        PRIMARY KEY (from_id, to_id)
    )",
];

/// Secondary indexes for reverse traversals and membership lookups.
const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_relates_to_target ON RELATES_TO(to_id)",
    "CREATE INDEX IF NOT EXISTS idx_relates_to_strength ON RELATES_TO(strength)",
    "CREATE INDEX IF NOT EXISTS idx_has_concept_target ON HAS_CONCEPT(to_id)",
    "CREATE INDEX IF NOT EXISTS idx_has_keyword_target ON HAS_KEYWORD(to_id)",
    "CREATE INDEX IF NOT EXISTS idx_in_compartment_target ON IN_COMPARTMENT(to_id)",
    "CREATE INDEX IF NOT EXISTS idx_concept_name ON Concept(name)",
    "CREATE INDEX IF NOT EXISTS idx_keyword_term ON Keyword(term)",
    "CREATE INDEX IF NOT EXISTS idx_compartment_name ON Compartment(name)",
];

/// FTS5 index plus the triggers that keep it in sync with Memory.
const FTS_SCHEMA: &[&str] = &[
    "CREATE VIRTUAL TABLE IF NOT EXISTS memory_fts USING fts5(id UNINDEXED, content, summary)",
    "CREATE TRIGGER IF NOT EXISTS memory_fts_insert AFTER INSERT ON Memory BEGIN
        INSERT INTO memory_fts(id, content, summary) VALUES (new.id, new.content, new.summary);
    END",
    "CREATE TRIGGER IF NOT EXISTS memory_fts_delete AFTER DELETE ON Memory BEGIN
        DELETE FROM memory_fts WHERE id = old.id;
    END",
    "CREATE TRIGGER IF NOT EXISTS memory_fts_update AFTER UPDATE OF content, summary ON Memory BEGIN
        UPDATE memory_fts SET content = new.content, summary = new.summary WHERE id = new.id;
    END",
];

fn store_error(operation: &str, cause: impl std::fmt::Display) -> Error {
    Error::Store {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}

/// Acquires a mutex lock, recovering from poisoning.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("graph store mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        // Nested lists flatten to NULL; list parameters are one level deep.
        Value::List(_) => SqlValue::Null,
    }
}

fn from_sql_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Int(i),
        SqlValue::Real(f) => Value::Float(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(_) => Value::Null,
    }
}

/// `SQLite`-backed graph store.
///
/// # Concurrency Model
///
/// A single `Mutex<Connection>`: explicit transactions span multiple calls,
/// so every statement must run on the same connection. WAL mode and
/// `busy_timeout` handle concurrent processes gracefully.
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    schema_initialized: AtomicBool,
    fts_available: AtomicBool,
}

impl SqliteGraphStore {
    /// Opens (creating if needed) a store at the given path.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| store_error("create_db_directory", e))?;
            }
        }
        let conn = Connection::open(&db_path).map_err(|e| store_error("open", e))?;
        Self::from_connection(conn, Some(db_path))
    }

    /// Opens an in-memory store (used throughout the test suite).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| store_error("open_in_memory", e))?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        // Pragmas that echo their value back (journal_mode, busy_timeout)
        // report an error from pragma_update while still applying.
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", 5000);
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| store_error("configure_connection", e))?;

        array::load_module(&conn).map_err(|e| store_error("load_array_module", e))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            schema_initialized: AtomicBool::new(false),
            fts_available: AtomicBool::new(false),
        })
    }

    /// Returns the database path, or `None` for in-memory stores.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Prepares a statement, binds named parameters, and executes it.
    fn execute_with_params(
        conn: &Connection,
        sql: &str,
        params: &[(&str, Value)],
        operation: &str,
    ) -> Result<usize> {
        let mut stmt = conn.prepare(sql).map_err(|e| store_error(operation, e))?;
        let bindings = Self::bind(params);
        let refs: Vec<(&str, &dyn ToSql)> = bindings
            .iter()
            .map(|(name, boxed)| (*name, boxed.as_ref()))
            .collect();
        stmt.execute(refs.as_slice())
            .map_err(|e| store_error(operation, e))
    }

    fn bind<'a>(params: &'a [(&'a str, Value)]) -> Vec<(&'a str, Box<dyn ToSql>)> {
        params
            .iter()
            .map(|(name, value)| {
                let boxed: Box<dyn ToSql> = match value {
                    Value::List(items) => {
                        let values: Vec<SqlValue> = items.iter().map(to_sql_value).collect();
                        Box::new(Rc::new(values))
                    }
                    other => Box::new(to_sql_value(other)),
                };
                (*name, boxed)
            })
            .collect()
    }
}

impl GraphStore for SqliteGraphStore {
    fn initialize_schema(&self) -> Result<()> {
        if self.schema_initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        for stmt in NODE_TABLES.iter().chain(REL_TABLES).chain(INDEXES) {
            self.run_schema_write(stmt)?;
        }

        // Probe for FTS5. Failure is not an error: the capability flag stays
        // false and search falls back to containment scans.
        let mut fts_ok = true;
        for stmt in FTS_SCHEMA {
            if let Err(e) = self.run_schema_write(stmt) {
                debug!("full-text index unavailable: {e}");
                fts_ok = false;
                break;
            }
        }
        self.fts_available.store(fts_ok, Ordering::SeqCst);
        self.schema_initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn run_query(&self, sql: &str, params: &[(&str, Value)]) -> Result<Vec<Row>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(sql).map_err(|e| store_error("run_query", e))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let bindings = Self::bind(params);
        let refs: Vec<(&str, &dyn ToSql)> = bindings
            .iter()
            .map(|(name, boxed)| (*name, boxed.as_ref()))
            .collect();

        let mut rows = stmt
            .query(refs.as_slice())
            .map_err(|e| store_error("run_query", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| store_error("run_query", e))? {
            let mut columns = HashMap::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                let value: SqlValue = row.get(i).map_err(|e| store_error("run_query", e))?;
                columns.insert(name.clone(), from_sql_value(value));
            }
            out.push(Row::from_columns(columns));
        }
        Ok(out)
    }

    fn run_write(&self, sql: &str, params: &[(&str, Value)]) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        Self::execute_with_params(&conn, sql, params, "run_write")?;
        Ok(())
    }

    fn run_schema_write(&self, sql: &str) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(sql)
            .map_err(|e| store_error("run_schema_write", e))
    }

    fn begin_transaction(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch("BEGIN")
            .map_err(|e| store_error("begin_transaction", e))
    }

    fn commit(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch("COMMIT")
            .map_err(|e| store_error("commit", e))
    }

    fn rollback(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch("ROLLBACK")
            .map_err(|e| store_error("rollback", e))
    }

    fn fts_available(&self) -> bool {
        self.fts_available.load(Ordering::SeqCst)
    }
}
