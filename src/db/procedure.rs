//! Stored-procedure invocation and result shaping.

use super::params::PgBindValue;
use super::pool::Database;
use super::rows::row_to_json;
use crate::error::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo};
use std::sync::OnceLock;

/// Rows of one statement, each a JSON object.
pub type ResultSet = Vec<Value>;

/// Transaction handle passed back into [`db_request`].
pub type Transaction = sqlx::Transaction<'static, Postgres>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedReturn {
    /// Discard output; returns `null`.
    None,
    /// First row of the first result set, or `null`.
    #[default]
    Single,
    /// Every result set; keyed by label when labels are given.
    Multi,
}

/// Execute `routine` with named parameters and shape the output.
///
/// Runs inside `tx` when given; otherwise in a short transaction of its own so
/// cursor-returning routines can be read. Database errors are returned as-is.
pub async fn db_request(
    db: &Database,
    routine: &str,
    params: &Map<String, Value>,
    expected: ExpectedReturn,
    tx: Option<&mut Transaction>,
    result_set_names: Option<&[&str]>,
) -> Result<Value, AppError> {
    let sql = call_sql(routine, params.keys().map(String::as_str))?;
    let binds: Vec<PgBindValue> = params.values().map(PgBindValue::from_json).collect();
    tracing::debug!(routine, sql = %sql, params = params.len(), "db request");

    let sets = match tx {
        Some(tx) => fetch_result_sets(&mut **tx, &sql, binds).await?,
        None => {
            let mut own = db.pool().await?.begin().await?;
            let sets = fetch_result_sets(&mut *own, &sql, binds).await?;
            own.commit().await?;
            sets
        }
    };
    Ok(shape_result_sets(expected, sets, result_set_names))
}

pub async fn begin_transaction(db: &Database) -> Result<Transaction, AppError> {
    Ok(db.pool().await?.begin().await?)
}

pub async fn commit_transaction(tx: Transaction) -> Result<(), AppError> {
    Ok(tx.commit().await?)
}

pub async fn rollback_transaction(tx: Transaction) -> Result<(), AppError> {
    Ok(tx.rollback().await?)
}

/// `None` → null; `Single` → first row of first set (or null); `Multi` with
/// labels → object of label → set by position, labels without a set omitted;
/// `Multi` without labels → array of sets.
pub fn shape_result_sets(expected: ExpectedReturn, sets: Vec<ResultSet>, names: Option<&[&str]>) -> Value {
    match expected {
        ExpectedReturn::None => Value::Null,
        ExpectedReturn::Single => sets
            .into_iter()
            .next()
            .and_then(|set| set.into_iter().next())
            .unwrap_or(Value::Null),
        ExpectedReturn::Multi => match names {
            Some(names) if !names.is_empty() => Value::Object(
                names
                    .iter()
                    .zip(sets)
                    .map(|(name, set)| (name.to_string(), Value::Array(set)))
                    .collect(),
            ),
            _ => Value::Array(sets.into_iter().map(Value::Array).collect()),
        },
    }
}

fn identifier_re() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles"))
}

/// Identifiers are validated rather than quoted so they fold to lower case the
/// same way unquoted names in `CREATE FUNCTION` do.
fn call_sql<'a>(routine: &str, names: impl Iterator<Item = &'a str>) -> Result<String, AppError> {
    let re = identifier_re();
    let parts: Vec<&str> = routine.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| re.is_match(p)) {
        return Err(AppError::Internal(format!("invalid routine name: {}", routine)));
    }
    let mut args = Vec::new();
    for (i, name) in names.enumerate() {
        if !re.is_match(name) {
            return Err(AppError::Internal(format!("invalid parameter name: {}", name)));
        }
        args.push(format!("{} => ${}", name, i + 1));
    }
    Ok(format!("SELECT * FROM {}({})", routine, args.join(", ")))
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

async fn fetch_result_sets(
    conn: &mut PgConnection,
    sql: &str,
    binds: Vec<PgBindValue>,
) -> Result<Vec<ResultSet>, sqlx::Error> {
    let mut query = sqlx::query(sql);
    for b in binds {
        query = query.bind(b);
    }
    let rows = query.fetch_all(&mut *conn).await?;

    let Some(cursors) = cursor_names(&rows) else {
        return Ok(vec![rows.iter().map(row_to_json).collect()]);
    };
    let mut sets = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        let rows = sqlx::query(&format!("FETCH ALL FROM {}", quoted(&cursor)))
            .fetch_all(&mut *conn)
            .await?;
        sets.push(rows.iter().map(row_to_json).collect());
    }
    Ok(sets)
}

/// Names of the cursors when the routine returned a single `refcursor` column.
fn cursor_names(rows: &[PgRow]) -> Option<Vec<String>> {
    let first = rows.first()?;
    let columns = first.columns();
    if columns.len() != 1 || !columns[0].type_info().name().eq_ignore_ascii_case("refcursor") {
        return None;
    }
    rows.iter()
        .map(|r| r.try_get_unchecked::<String, _>(0).ok())
        .collect()
}
