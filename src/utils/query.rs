//! Query-string translation for list endpoints.
//!
//! Turns raw query parameters into a [`QuerySpec`] (filter, sort,
//! field selection, pagination), compiles the spec against a typed
//! per-resource [`QueryTarget`] into bound SQL, and executes it into a
//! [`ResultPage`] carrying the page data plus pagination metadata.
//!
//! Filter comparators are written as bracketed key suffixes, e.g.
//! `averageCost[gte]=1000&careers[in]=Business,UI/UX`. Keys without a
//! suffix are strict equality. The reserved keys `select`, `sort`,
//! `page` and `limit` control projection, ordering and the pagination
//! window and never become filter terms.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::errors::AppError;

pub const DEFAULT_LIMIT: i64 = 25;
pub const MAX_LIMIT: i64 = 100;

const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Comparator {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    fn sql_operator(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            // `in` compiles to `= ANY(..)` / array overlap, not an operator
            Self::In => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
    pub field: String,
    pub op: Comparator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// Structured translation of raw query parameters. Built once per
/// list request and immutable afterwards.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub filters: Vec<FilterTerm>,
    pub select: Option<Vec<String>>,
    pub sort: Vec<SortKey>,
    pub page: i64,
    pub limit: i64,
}

impl QuerySpec {
    /// Parses raw query parameters. Non-numeric `page`/`limit` and
    /// unknown comparator suffixes are client errors. Taking the
    /// parameters as a `BTreeMap` keeps the compiled SQL stable across
    /// requests with the same terms.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, AppError> {
        let page = match params.get("page") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid page parameter")))?
                .max(1),
            None => 1,
        };

        let limit = match params.get("limit") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Invalid limit parameter")))?
                .clamp(1, MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };

        let select = params.get("select").map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        let sort = match params.get("sort") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|entry| match entry.strip_prefix('-') {
                    Some(field) => SortKey {
                        field: field.to_string(),
                        descending: true,
                    },
                    None => SortKey {
                        field: entry.to_string(),
                        descending: false,
                    },
                })
                .collect(),
            None => Vec::new(),
        };

        let mut filters = Vec::new();
        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let (field, op) = split_filter_key(key)?;
            filters.push(FilterTerm {
                field,
                op,
                value: value.clone(),
            });
        }

        Ok(Self {
            filters,
            select,
            sort,
            page,
            limit,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn split_filter_key(key: &str) -> Result<(String, Comparator), AppError> {
    let Some(open) = key.find('[') else {
        return Ok((key.to_string(), Comparator::Eq));
    };

    let suffix = key[open..]
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Malformed filter key '{key}'")))?;

    let op = Comparator::from_suffix(suffix).ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!("Unknown comparator '{suffix}' in '{key}'"))
    })?;

    Ok((key[..open].to_string(), op))
}

/// How a column is typed on the database side, which decides how a
/// filter value is coerced and which comparators apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Bool,
    TextArray,
    Timestamp,
}

/// One queryable column: the public (query/JSON) name, the SQL column
/// it maps to, and its kind.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql: &'static str,
    pub kind: ColumnKind,
}

/// A collection the translator may run against: table name, column
/// allow-list and default ordering (newest first).
#[derive(Debug, Clone, Copy)]
pub struct QueryTarget {
    pub table: &'static str,
    pub columns: &'static [Column],
    pub default_sort: &'static str,
}

impl QueryTarget {
    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A value bound into the compiled query at `$n`.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    TextList(Vec<String>),
    Number(f64),
    NumberList(Vec<f64>),
    Bool(bool),
    Id(Uuid),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug)]
pub struct CompiledQuery {
    pub where_sql: String,
    pub order_sql: String,
    pub binds: Vec<BindValue>,
    pub limit: i64,
    pub offset: i64,
}

/// Compiles a spec against a target. `scope` pins an extra equality
/// term outside the client's control (e.g. the parent bootcamp on a
/// nested course listing). Unknown filter or sort fields are client
/// errors, never passed through to SQL.
pub fn compile(
    spec: &QuerySpec,
    target: &QueryTarget,
    scope: Option<(&'static str, Uuid)>,
) -> Result<CompiledQuery, AppError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();

    if let Some((column, id)) = scope {
        binds.push(BindValue::Id(id));
        clauses.push(format!("{column} = ${}", binds.len()));
    }

    for term in &spec.filters {
        let column = target.column(&term.field).ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("Cannot filter on field '{}'", term.field))
        })?;
        let clause = compile_term(column, term, &mut binds)?;
        clauses.push(clause);
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let order_sql = if spec.sort.is_empty() {
        format!(" ORDER BY {} DESC", target.default_sort)
    } else {
        let mut keys = Vec::with_capacity(spec.sort.len());
        for key in &spec.sort {
            let column = target.column(&key.field).ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!("Cannot sort on field '{}'", key.field))
            })?;
            let direction = if key.descending { "DESC" } else { "ASC" };
            keys.push(format!("{} {direction}", column.sql));
        }
        format!(" ORDER BY {}", keys.join(", "))
    };

    if let Some(select) = &spec.select {
        for field in select {
            if target.column(field).is_none() {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Cannot select field '{field}'"
                )));
            }
        }
    }

    Ok(CompiledQuery {
        where_sql,
        order_sql,
        binds,
        limit: spec.limit,
        offset: spec.offset(),
    })
}

fn compile_term(
    column: &Column,
    term: &FilterTerm,
    binds: &mut Vec<BindValue>,
) -> Result<String, AppError> {
    let sql = column.sql;
    let op = term.op.sql_operator();

    let clause = match (column.kind, term.op) {
        (ColumnKind::Number, Comparator::In) => {
            binds.push(BindValue::NumberList(parse_number_list(term)?));
            format!("{sql} = ANY(${})", binds.len())
        }
        (ColumnKind::Number, _) => {
            binds.push(BindValue::Number(parse_number(term)?));
            format!("{sql} {op} ${}", binds.len())
        }
        (ColumnKind::Text, Comparator::In) => {
            binds.push(BindValue::TextList(split_list(&term.value)));
            format!("{sql} = ANY(${})", binds.len())
        }
        (ColumnKind::Text, _) => {
            binds.push(BindValue::Text(term.value.clone()));
            format!("{sql} {op} ${}", binds.len())
        }
        (ColumnKind::Bool, Comparator::Eq) => {
            binds.push(BindValue::Bool(parse_bool(term)?));
            format!("{sql} = ${}", binds.len())
        }
        (ColumnKind::TextArray, Comparator::Eq) => {
            binds.push(BindValue::Text(term.value.clone()));
            format!("${} = ANY({sql})", binds.len())
        }
        (ColumnKind::TextArray, Comparator::In) => {
            binds.push(BindValue::TextList(split_list(&term.value)));
            format!("{sql} && ${}", binds.len())
        }
        (ColumnKind::Timestamp, Comparator::In) => {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Comparator 'in' is not supported on field '{}'",
                term.field
            )));
        }
        (ColumnKind::Timestamp, _) => {
            binds.push(BindValue::Timestamp(parse_timestamp(term)?));
            format!("{sql} {op} ${}", binds.len())
        }
        (kind, op) => {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Comparator {op:?} is not supported on {kind:?} field '{}'",
                term.field
            )));
        }
    };

    Ok(clause)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number(term: &FilterTerm) -> Result<f64, AppError> {
    term.value.parse().map_err(|_| {
        AppError::bad_request(anyhow::anyhow!(
            "Invalid numeric value '{}' for field '{}'",
            term.value,
            term.field
        ))
    })
}

fn parse_number_list(term: &FilterTerm) -> Result<Vec<f64>, AppError> {
    split_list(&term.value)
        .iter()
        .map(|item| {
            item.parse().map_err(|_| {
                AppError::bad_request(anyhow::anyhow!(
                    "Invalid numeric value '{item}' for field '{}'",
                    term.field
                ))
            })
        })
        .collect()
}

fn parse_bool(term: &FilterTerm) -> Result<bool, AppError> {
    match term.value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::bad_request(anyhow::anyhow!(
            "Invalid boolean value '{other}' for field '{}'",
            term.field
        ))),
    }
}

fn parse_timestamp(term: &FilterTerm) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(&term.value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = term.value.parse::<NaiveDate>() {
        return Ok(DateTime::from_naive_utc_and_offset(
            date.and_time(chrono::NaiveTime::MIN),
            Utc,
        ));
    }
    Err(AppError::bad_request(anyhow::anyhow!(
        "Invalid timestamp '{}' for field '{}'",
        term.value,
        term.field
    )))
}

/// Descriptor of an adjacent page that would contain results.
#[derive(Debug, Serialize, PartialEq)]
pub struct PageLink {
    pub page: i64,
    pub limit: i64,
}

/// Pagination metadata. `total` reflects the filter only, independent
/// of the pagination window.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
}

pub fn build_pagination(page: i64, limit: i64, total: i64) -> Pagination {
    let skip = (page - 1) * limit;
    Pagination {
        total,
        prev: (page > 1).then(|| PageLink {
            page: page - 1,
            limit,
        }),
        next: (skip + limit < total).then(|| PageLink {
            page: page + 1,
            limit,
        }),
    }
}

/// One page of a filtered collection, serialized as the list response
/// envelope: `{"success": true, "count": .., "pagination": .., "data": [..]}`.
#[derive(Debug, Serialize)]
pub struct ResultPage {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

/// Prunes each serialized record down to the selected fields. The
/// record id always survives projection.
pub fn project_fields(items: &mut [Value], select: &[String]) {
    for item in items {
        if let Value::Object(map) = item {
            map.retain(|key, _| key == "id" || select.iter().any(|s| s == key));
        }
    }
}

/// Executes a spec against a target: counts the filtered collection,
/// fetches the requested window, and assembles the page.
pub async fn run<T>(
    db: &PgPool,
    target: &QueryTarget,
    spec: &QuerySpec,
    scope: Option<(&'static str, Uuid)>,
) -> Result<ResultPage, AppError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Serialize + Send + Unpin,
{
    let compiled = compile(spec, target, scope)?;

    let count_sql = format!("SELECT COUNT(*) FROM {}{}", target.table, compiled.where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &compiled.binds {
        count_query = match bind {
            BindValue::Text(v) => count_query.bind(v.clone()),
            BindValue::TextList(v) => count_query.bind(v.clone()),
            BindValue::Number(v) => count_query.bind(*v),
            BindValue::NumberList(v) => count_query.bind(v.clone()),
            BindValue::Bool(v) => count_query.bind(*v),
            BindValue::Id(v) => count_query.bind(*v),
            BindValue::Timestamp(v) => count_query.bind(*v),
        };
    }
    let total = count_query.fetch_one(db).await.map_err(AppError::database)?;

    let data_sql = format!(
        "SELECT * FROM {}{}{} LIMIT {} OFFSET {}",
        target.table, compiled.where_sql, compiled.order_sql, compiled.limit, compiled.offset
    );
    let mut data_query = sqlx::query_as::<_, T>(&data_sql);
    for bind in &compiled.binds {
        data_query = match bind {
            BindValue::Text(v) => data_query.bind(v.clone()),
            BindValue::TextList(v) => data_query.bind(v.clone()),
            BindValue::Number(v) => data_query.bind(*v),
            BindValue::NumberList(v) => data_query.bind(v.clone()),
            BindValue::Bool(v) => data_query.bind(*v),
            BindValue::Id(v) => data_query.bind(*v),
            BindValue::Timestamp(v) => data_query.bind(*v),
        };
    }
    let rows = data_query.fetch_all(db).await.map_err(AppError::database)?;

    let mut items = rows
        .into_iter()
        .map(|row| serde_json::to_value(row).map_err(AppError::internal))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(select) = &spec.select {
        project_fields(&mut items, select);
    }

    Ok(ResultPage {
        success: true,
        count: items.len(),
        pagination: build_pagination(spec.page, spec.limit, total),
        data: items,
    })
}
