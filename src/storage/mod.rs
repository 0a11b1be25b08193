//! Storage layer: the transactional query contract and its SQLite adapter.
//!
//! The core never talks to a database driver directly; it issues
//! parameterized queries through [`GraphStore`] and gets typed [`Row`]s
//! back. Any property-graph engine that supports parameterized queries over
//! typed node/relation tables, list parameters, and explicit
//! `BEGIN`/`COMMIT`/`ROLLBACK` can implement the contract.
//!
//! [`SqliteGraphStore`] is the embedded implementation.

mod sqlite;

pub use sqlite::SqliteGraphStore;

use std::collections::HashMap;

use crate::{Error, Result};

/// A typed parameter or result value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean (stored as 0/1).
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// List parameter; binds through the engine's array mechanism so a
    /// single query can range over it (the adapter's `UNWIND`).
    List(Vec<Value>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::List(v.into_iter().map(Value::Text).collect())
    }
}

/// One result row: column name to value.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: HashMap<String, Value>,
}

fn decode_error(column: &str, detail: &str) -> Error {
    Error::Store {
        operation: "decode_row".to_string(),
        cause: format!("column '{column}': {detail}"),
    }
}

impl Row {
    /// Builds a row from decoded columns.
    #[must_use]
    pub fn from_columns(columns: HashMap<String, Value>) -> Self {
        Self { columns }
    }

    /// Raw access to a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// A required text column.
    pub fn text(&self, column: &str) -> Result<String> {
        match self.columns.get(column) {
            Some(Value::Text(s)) => Ok(s.clone()),
            Some(other) => Err(decode_error(column, &format!("expected text, got {other:?}"))),
            None => Err(decode_error(column, "missing")),
        }
    }

    /// An optional text column; NULL and absent both map to `None`.
    #[must_use]
    pub fn opt_text(&self, column: &str) -> Option<String> {
        match self.columns.get(column) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// A required float column; integer affinity is widened.
    pub fn float(&self, column: &str) -> Result<f64> {
        match self.columns.get(column) {
            Some(Value::Float(v)) => Ok(*v),
            Some(Value::Int(v)) => Ok(*v as f64),
            Some(other) => Err(decode_error(column, &format!("expected float, got {other:?}"))),
            None => Err(decode_error(column, "missing")),
        }
    }

    /// An optional float column.
    #[must_use]
    pub fn opt_float(&self, column: &str) -> Option<f64> {
        match self.columns.get(column) {
            Some(Value::Float(v)) => Some(*v),
            Some(Value::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    /// A required integer column.
    pub fn int(&self, column: &str) -> Result<i64> {
        match self.columns.get(column) {
            Some(Value::Int(v)) => Ok(*v),
            Some(other) => Err(decode_error(
                column,
                &format!("expected integer, got {other:?}"),
            )),
            None => Err(decode_error(column, "missing")),
        }
    }

    /// A required boolean column; 0/1 integers decode as booleans.
    pub fn boolean(&self, column: &str) -> Result<bool> {
        match self.columns.get(column) {
            Some(Value::Bool(v)) => Ok(*v),
            Some(Value::Int(v)) => Ok(*v != 0),
            Some(other) => Err(decode_error(
                column,
                &format!("expected boolean, got {other:?}"),
            )),
            None => Err(decode_error(column, "missing")),
        }
    }
}

/// Transactional query contract every graph store adapter satisfies.
///
/// # Implementor Notes
///
/// - Methods take `&self`; use interior mutability (e.g. `Mutex<Connection>`)
///   so a store can sit behind `Box<dyn GraphStore>`.
/// - Parameter names carry their `:` prefix and must match the query text
///   exactly.
/// - `initialize_schema` must be idempotent; re-initialization is a no-op.
/// - The full-text capability is probed during `initialize_schema`; callers
///   consult [`fts_available`](GraphStore::fts_available) and fall back to
///   containment search when it is false.
/// - Engine errors propagate as [`Error::Store`]; the adapter never retries.
pub trait GraphStore: Send + Sync {
    /// Declares the node and relation tables and probes capabilities.
    fn initialize_schema(&self) -> Result<()>;

    /// Executes a read query and returns its rows.
    fn run_query(&self, sql: &str, params: &[(&str, Value)]) -> Result<Vec<Row>>;

    /// Executes a data write.
    fn run_write(&self, sql: &str, params: &[(&str, Value)]) -> Result<()>;

    /// Executes a schema (DDL) write.
    fn run_schema_write(&self, sql: &str) -> Result<()>;

    /// Opens an explicit transaction.
    fn begin_transaction(&self) -> Result<()>;

    /// Commits the open transaction.
    fn commit(&self) -> Result<()>;

    /// Rolls back the open transaction.
    fn rollback(&self) -> Result<()>;

    /// Whether a full-text index over Memory(content, summary) is available.
    fn fts_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_typed_getters() {
        let mut cols = HashMap::new();
        cols.insert("id".to_string(), Value::Text("m1".to_string()));
        cols.insert("count".to_string(), Value::Int(4));
        cols.insert("strength".to_string(), Value::Float(0.5));
        cols.insert("flag".to_string(), Value::Int(1));
        cols.insert("missing_text".to_string(), Value::Null);
        let row = Row::from_columns(cols);

        assert_eq!(row.text("id").unwrap(), "m1");
        assert_eq!(row.int("count").unwrap(), 4);
        assert_eq!(row.float("strength").unwrap(), 0.5);
        assert!(row.boolean("flag").unwrap());
        assert_eq!(row.opt_text("missing_text"), None);
        assert!(row.text("absent").is_err());
    }

    #[test]
    fn test_float_widens_integers() {
        let mut cols = HashMap::new();
        cols.insert("v".to_string(), Value::Int(2));
        let row = Row::from_columns(cols);
        assert_eq!(row.float("v").unwrap(), 2.0);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from("x"), Value::Text("x".to_string()));
        assert_eq!(Value::from(3_i64), Value::Int(3));
        assert_eq!(
            Value::from(vec!["a".to_string()]),
            Value::List(vec![Value::Text("a".to_string())])
        );
    }
}
