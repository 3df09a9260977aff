//! [`RecordStore`] over PostgreSQL.
//!
//! Rows travel as `jsonb` in both directions: reads select `to_jsonb(t.*)`
//! and writes go through `jsonb_populate_record`, so one code path serves
//! every table without per-resource row structs. Table and column names are
//! checked against [`IDENTIFIER`] and double-quoted; values are always bound.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use vstack_core::query::{
    value_text, CompareOp, ListQuery, OrderBy, Page, Predicate, SortDirection,
};
use vstack_core::types::{DbId, Record};

use crate::error::StoreError;
use crate::store::RecordStore;

/// Plain, unquoted SQL identifier.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

type Sql = QueryBuilder<'static, Postgres>;

/// PostgreSQL-backed record store.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// SQL generation
// ---------------------------------------------------------------------------

fn quote(identifier: &str) -> Result<String, StoreError> {
    if IDENTIFIER.is_match(identifier) {
        Ok(format!("\"{identifier}\""))
    } else {
        Err(StoreError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Escape `LIKE` wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn push_predicate(qb: &mut Sql, predicate: &Predicate) -> Result<(), StoreError> {
    match predicate {
        Predicate::All(children) | Predicate::Any(children) if children.is_empty() => {
            let neutral = matches!(predicate, Predicate::All(_));
            qb.push(if neutral { "TRUE" } else { "FALSE" });
        }
        Predicate::All(children) | Predicate::Any(children) => {
            let joiner = if matches!(predicate, Predicate::All(_)) {
                " AND "
            } else {
                " OR "
            };
            qb.push("(");
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_predicate(qb, child)?;
            }
            qb.push(")");
        }
        Predicate::Compare { field, op, value } => {
            let column = format!("t.{}", quote(field)?);
            push_compare(qb, &column, *op, value);
        }
    }
    Ok(())
}

fn push_compare(qb: &mut Sql, column: &str, op: CompareOp, value: &Value) {
    let symbol = match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Gt => ">",
        CompareOp::Gte => ">=",
        CompareOp::Lt => "<",
        CompareOp::Lte => "<=",
        CompareOp::Contains => "ILIKE",
    };

    if value.is_null() {
        match op {
            CompareOp::Eq => qb.push(format!("{column} IS NULL")),
            CompareOp::Ne => qb.push(format!("{column} IS NOT NULL")),
            _ => qb.push("FALSE"),
        };
        return;
    }

    match (op, value) {
        (CompareOp::Contains, _) => {
            let term = value_text(value).unwrap_or_default();
            qb.push(format!("{column}::text ILIKE "));
            qb.push_bind(like_pattern(&term));
        }
        (CompareOp::Eq | CompareOp::Ne, Value::Bool(flag)) => {
            qb.push(format!("{column}::text {symbol} "));
            qb.push_bind(flag.to_string());
        }
        (CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte, _)
            if numeric(value).is_some() =>
        {
            qb.push(format!("{column} {symbol} "));
            qb.push_bind(numeric(value).unwrap_or_default());
        }
        _ => {
            qb.push(format!("{column}::text {symbol} "));
            qb.push_bind(value_text(value).unwrap_or_default());
        }
    }
}

fn select_rows(
    table: &str,
    condition: &Predicate,
    order: &OrderBy,
    limit: Option<u64>,
    offset: u64,
) -> Result<Sql, StoreError> {
    let mut qb = Sql::new(format!("SELECT to_jsonb(t.*) FROM {} AS t WHERE ", quote(table)?));
    push_predicate(&mut qb, condition)?;
    qb.push(format!(
        " ORDER BY t.{} {}",
        quote(&order.field)?,
        order.direction.as_sql()
    ));
    if order.field != "id" {
        qb.push(", t.\"id\" ASC");
    }
    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if offset > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }
    Ok(qb)
}

fn count_rows(table: &str, condition: &Predicate) -> Result<Sql, StoreError> {
    let mut qb = Sql::new(format!("SELECT COUNT(*) FROM {} AS t WHERE ", quote(table)?));
    push_predicate(&mut qb, condition)?;
    Ok(qb)
}

fn column_list(attributes: &Record) -> Result<String, StoreError> {
    attributes
        .keys()
        .map(|c| quote(c))
        .collect::<Result<Vec<_>, _>>()
        .map(|cols| cols.join(", "))
}

fn insert_row(table: &str, attributes: &Record) -> Result<Sql, StoreError> {
    let table = quote(table)?;
    if attributes.is_empty() {
        return Ok(Sql::new(format!(
            "INSERT INTO {table} DEFAULT VALUES RETURNING to_jsonb({table}.*)"
        )));
    }
    let columns = column_list(attributes)?;
    let mut qb = Sql::new(format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
    ));
    qb.push_bind(Value::Object(attributes.clone()));
    qb.push(format!(") RETURNING to_jsonb({table}.*)"));
    Ok(qb)
}

fn update_row(table: &str, id: DbId, attributes: &Record) -> Result<Sql, StoreError> {
    let table = quote(table)?;
    let mut changes = attributes.clone();
    changes.remove("id");

    let mut qb = if changes.is_empty() {
        // Nothing to write; still report whether the row exists.
        Sql::new(format!("UPDATE {table} SET \"id\" = \"id\""))
    } else {
        let columns = column_list(&changes)?;
        let mut qb = Sql::new(format!(
            "UPDATE {table} SET ({columns}) = (SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
        ));
        qb.push_bind(Value::Object(changes));
        qb.push("))");
        qb
    };
    qb.push(" WHERE \"id\" = ");
    qb.push_bind(id);
    qb.push(format!(" RETURNING to_jsonb({table}.*)"));
    Ok(qb)
}

fn delete_row(table: &str, id: DbId) -> Result<Sql, StoreError> {
    let mut qb = Sql::new(format!("DELETE FROM {} WHERE \"id\" = ", quote(table)?));
    qb.push_bind(id);
    Ok(qb)
}

fn into_record(table: &str, value: Value) -> Result<Record, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Decode(table.to_string())),
    }
}

/// Surface integrity violations as [`StoreError::Constraint`].
fn classify(err: sqlx::Error) -> StoreError {
    let store_err = StoreError::Database(err);
    if store_err.is_constraint() {
        StoreError::Constraint(store_err.to_string())
    } else {
        store_err
    }
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn paginate(&self, table: &str, query: &ListQuery) -> Result<Page<Record>, StoreError> {
        let condition = query.condition();

        let total = count_rows(table, &condition)?
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let rows = select_rows(
            table,
            &condition,
            &query.order,
            Some(query.per_page),
            query.offset(),
        )?
        .build_query_scalar::<Value>()
        .fetch_all(&self.pool)
        .await?;

        let data = rows
            .into_iter()
            .map(|row| into_record(table, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(data, total.max(0) as u64, query.page, query.per_page))
    }

    async fn select(
        &self,
        table: &str,
        condition: &Predicate,
        limit: Option<u64>,
    ) -> Result<Vec<Record>, StoreError> {
        let order = OrderBy {
            field: "id".to_string(),
            direction: SortDirection::Asc,
        };
        let rows = select_rows(table, condition, &order, limit, 0)?
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|row| into_record(table, row)).collect()
    }

    async fn find(&self, table: &str, id: DbId) -> Result<Option<Record>, StoreError> {
        let rows = self.select(table, &Predicate::eq("id", id), Some(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_by(
        &self,
        table: &str,
        column: &str,
        value: &Value,
    ) -> Result<Option<Record>, StoreError> {
        let rows = self
            .select(table, &Predicate::eq(column, value.clone()), Some(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, table: &str, attributes: Record) -> Result<Record, StoreError> {
        let row = insert_row(table, &attributes)?
            .build_query_scalar::<Value>()
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        into_record(table, row)
    }

    async fn update(
        &self,
        table: &str,
        id: DbId,
        attributes: Record,
    ) -> Result<Option<Record>, StoreError> {
        let row = update_row(table, id, &attributes)?
            .build_query_scalar::<Value>()
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.map(|r| into_record(table, r)).transpose()
    }

    async fn delete(&self, table: &str, id: DbId) -> Result<bool, StoreError> {
        let result = delete_row(table, id)?
            .build()
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert_matches!(quote("users; DROP"), Err(StoreError::InvalidIdentifier(_)));
        assert_matches!(quote("1abc"), Err(StoreError::InvalidIdentifier(_)));
        assert_eq!(quote("user_roles").unwrap(), "\"user_roles\"");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn empty_condition_selects_everything() {
        let qb = select_rows("users", &Predicate::All(vec![]), &OrderBy::default(), Some(20), 0)
            .unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT to_jsonb(t.*) FROM \"users\" AS t WHERE TRUE ORDER BY t.\"id\" DESC LIMIT $1"
        );
    }

    #[test]
    fn search_and_filters_compose() {
        let condition = Predicate::All(vec![
            Predicate::eq("status", "active"),
            Predicate::Any(vec![
                Predicate::contains("name", "ann"),
                Predicate::contains("email", "ann"),
            ]),
            Predicate::compare("age", CompareOp::Gte, "18"),
        ]);
        let order = OrderBy {
            field: "name".into(),
            direction: SortDirection::Asc,
        };
        let qb = select_rows("users", &condition, &order, Some(20), 40).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT to_jsonb(t.*) FROM \"users\" AS t WHERE (t.\"status\"::text = $1 AND \
             (t.\"name\"::text ILIKE $2 OR t.\"email\"::text ILIKE $3) AND t.\"age\" >= $4) \
             ORDER BY t.\"name\" ASC, t.\"id\" ASC LIMIT $5 OFFSET $6"
        );
    }

    #[test]
    fn null_comparisons_use_is_null() {
        let qb = count_rows("users", &Predicate::eq("deleted_at", Value::Null)).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM \"users\" AS t WHERE t.\"deleted_at\" IS NULL"
        );
    }

    #[test]
    fn empty_any_is_false() {
        let qb = count_rows("users", &Predicate::Any(vec![])).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM \"users\" AS t WHERE FALSE");
    }

    #[test]
    fn bad_column_in_predicate_is_rejected() {
        let result = count_rows("users", &Predicate::eq("name\" OR 1=1 --", "x"));
        assert_matches!(result.err(), Some(StoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn insert_goes_through_jsonb_populate_record() {
        let qb = insert_row("users", &record(json!({"name": "Ann", "age": 3}))).unwrap();
        assert_eq!(
            qb.sql(),
            "INSERT INTO \"users\" (\"age\", \"name\") SELECT \"age\", \"name\" FROM \
             jsonb_populate_record(NULL::\"users\", $1) RETURNING to_jsonb(\"users\".*)"
        );
    }

    #[test]
    fn insert_without_attributes_uses_defaults() {
        let qb = insert_row("users", &Record::new()).unwrap();
        assert_eq!(
            qb.sql(),
            "INSERT INTO \"users\" DEFAULT VALUES RETURNING to_jsonb(\"users\".*)"
        );
    }

    #[test]
    fn update_never_rewrites_id() {
        let qb = update_row("users", 7, &record(json!({"id": 9, "name": "Ann"}))).unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE \"users\" SET (\"name\") = (SELECT \"name\" FROM \
             jsonb_populate_record(NULL::\"users\", $1)) WHERE \"id\" = $2 \
             RETURNING to_jsonb(\"users\".*)"
        );
    }

    #[test]
    fn delete_binds_id() {
        let qb = delete_row("users", 7).unwrap();
        assert_eq!(qb.sql(), "DELETE FROM \"users\" WHERE \"id\" = $1");
    }
}
