use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::FilterConfig;
use crate::database::collection::{Collection, FieldKind, BOOTCAMPS, COURSES};
use crate::database::store::{Store, StoreError};
use crate::filter::{FilterData, FilterError, FilterOrder};

const RESERVED: [&str; 4] = ["select", "sort", "page", "limit"];
const DEFAULT_SORT: &str = "-createdAt";

/// Related documents to embed into each listed document
#[derive(Debug, Clone, Copy)]
pub enum Populate {
    /// Replace a reference field with the referenced document's fields
    Forward {
        field: &'static str,
        collection: &'static Collection,
        select: &'static [&'static str],
    },
    /// Attach the documents whose `foreign_key` points back at this one
    Reverse {
        field: &'static str,
        collection: &'static Collection,
        foreign_key: &'static str,
        select: &'static [&'static str],
    },
}

pub const BOOTCAMP_SUMMARY: Populate = Populate::Forward {
    field: "bootcamp",
    collection: &BOOTCAMPS,
    select: &["id", "name", "description"],
};

pub const BOOTCAMP_COURSES: Populate = Populate::Reverse {
    field: "courses",
    collection: &COURSES,
    foreign_key: "bootcamp",
    select: &["id", "title", "description"],
};

/// Parsed list request: conditions, projection, sort and page window
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedQuery {
    pub conditions: Map<String, Value>,
    pub select: Option<Vec<String>>,
    pub sort: String,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
}

impl Pagination {
    pub fn for_page(page: u64, limit: u64, total: u64) -> Self {
        let page = page.max(1);
        let end = page.checked_mul(limit);
        Self {
            prev: (page > 1 && limit > 0).then(|| PageRef { page: page - 1, limit }),
            next: end
                .filter(|end| *end < total)
                .map(|_| PageRef { page: page.saturating_add(1), limit }),
        }
    }
}

/// Response body of every list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

impl AdvancedQuery {
    /// Interpret raw query-string pairs against `collection`
    pub fn parse(collection: &Collection, params: &[(String, String)], config: &FilterConfig) -> Result<Self, FilterError> {
        let mut query = Self {
            conditions: Map::new(),
            select: None,
            sort: DEFAULT_SORT.to_string(),
            page: 1,
            limit: config.default_limit.max(1) as u64,
        };

        for (key, raw) in params {
            match key.as_str() {
                "select" => {
                    let mut fields = split_list(raw);
                    for field in &fields {
                        ensure_field(collection, field)?;
                    }
                    if !fields.iter().any(|f| f == "id") {
                        fields.insert(0, "id".to_string());
                    }
                    query.select = Some(fields);
                }
                "sort" => {
                    let infos = FilterOrder::validate_and_parse(&Value::String(raw.clone()))?;
                    for info in &infos {
                        ensure_field(collection, &info.column)?;
                    }
                    if !infos.is_empty() {
                        query.sort = raw.clone();
                    }
                }
                "page" => {
                    query.page = raw
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|p| *p >= 1)
                        .ok_or_else(|| FilterError::InvalidOffset(format!("Invalid page: {}", raw)))?;
                }
                "limit" => {
                    query.limit = raw
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|l| *l >= 1)
                        .ok_or_else(|| FilterError::InvalidLimit(format!("Invalid limit: {}", raw)))?;
                }
                _ => query.add_condition(collection, key, raw)?,
            }
        }

        if let Some(max) = config.max_limit {
            query.limit = query.limit.min(max.max(1) as u64);
        }
        if i64::try_from(query.limit).is_err() {
            return Err(FilterError::InvalidLimit(format!("Invalid limit: {}", query.limit)));
        }
        // The row offset must be representable in SQL
        let offset = (query.page - 1).checked_mul(query.limit).filter(|o| i64::try_from(*o).is_ok());
        if offset.is_none() {
            return Err(FilterError::InvalidOffset(format!("Invalid page: {}", query.page)));
        }
        Ok(query)
    }

    /// `field=v` or `field[op]=v`
    fn add_condition(&mut self, collection: &Collection, key: &str, raw: &str) -> Result<(), FilterError> {
        let (field, op) = match key.strip_suffix(']').and_then(|k| k.split_once('[')) {
            Some((field, op)) => (field, op),
            None => (key, "eq"),
        };
        ensure_field(collection, field)?;

        let kind = collection.kind(field);
        let (operator, operand) = match op {
            "eq" => ("$eq", cast(field, kind, raw)?),
            "gt" => ("$gt", cast(field, kind, raw)?),
            "gte" => ("$gte", cast(field, kind, raw)?),
            "lt" => ("$lt", cast(field, kind, raw)?),
            "lte" => ("$lte", cast(field, kind, raw)?),
            "in" => {
                let values = split_list(raw)
                    .iter()
                    .map(|v| cast(field, kind, v))
                    .collect::<Result<Vec<_>, _>>()?;
                ("$in", Value::Array(values))
            }
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        };

        // List-valued fields match when they share any element
        let (operator, operand) = if collection.is_list_field(field) && matches!(operator, "$eq" | "$in") {
            let values = match operand {
                Value::Array(values) => values,
                single => vec![single],
            };
            ("$any", Value::Array(values))
        } else {
            (operator, operand)
        };

        let entry = self
            .conditions
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(ops) = entry {
            ops.insert(operator.to_string(), operand);
        }
        Ok(())
    }

    pub fn where_clause(&self) -> Option<Value> {
        (!self.conditions.is_empty()).then(|| Value::Object(self.conditions.clone()))
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Count, fetch one page, embed related documents
    pub async fn execute(
        &self,
        store: &dyn Store,
        collection: &Collection,
        populate: &[Populate],
    ) -> Result<QueryPage, StoreError> {
        let total = store
            .count(collection, FilterData { where_clause: self.where_clause(), ..Default::default() })
            .await?;

        let filter = FilterData {
            select: self.select.clone(),
            where_clause: self.where_clause(),
            order: Some(Value::String(self.sort.clone())),
            limit: Some(i64::try_from(self.limit).unwrap_or(i64::MAX)),
            offset: Some(i64::try_from(self.offset()).unwrap_or(i64::MAX)),
        };
        let mut data = store.find(collection, filter).await?;

        for directive in populate {
            populate_documents(store, &mut data, directive).await?;
        }

        Ok(QueryPage {
            success: true,
            count: data.len(),
            total,
            pagination: Pagination::for_page(self.page, self.limit, total),
            data,
        })
    }
}

/// Embed related documents per `directive` into each of `docs`
pub async fn populate_documents(store: &dyn Store, docs: &mut [Value], directive: &Populate) -> Result<(), StoreError> {
    match *directive {
        Populate::Forward { field, collection, select } => {
            let ids = unique_strings(docs.iter().filter_map(|d| d.get(field).and_then(Value::as_str)));
            if ids.is_empty() {
                return Ok(());
            }
            let filter = FilterData {
                select: Some(with_field(select, "id")),
                where_clause: Some(json!({ "id": { "$in": ids } })),
                ..Default::default()
            };
            let related: HashMap<String, Value> = store
                .find(collection, filter)
                .await?
                .into_iter()
                .filter_map(|r| Some((r.get("id")?.as_str()?.to_string(), r)))
                .collect();

            for doc in docs.iter_mut() {
                let Some(obj) = doc.as_object_mut() else { continue };
                let Some(id) = obj.get(field).and_then(Value::as_str).map(str::to_string) else { continue };
                obj.insert(field.to_string(), related.get(&id).cloned().unwrap_or(Value::Null));
            }
        }
        Populate::Reverse { field, collection, foreign_key, select } => {
            let ids = unique_strings(docs.iter().filter_map(|d| d.get("id").and_then(Value::as_str)));
            if ids.is_empty() {
                return Ok(());
            }
            let filter = FilterData {
                select: Some(with_field(select, foreign_key)),
                where_clause: Some(json!({ foreign_key: { "$in": ids } })),
                order: Some(json!("createdAt")),
                ..Default::default()
            };

            let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
            for mut child in store.find(collection, filter).await? {
                let Some(obj) = child.as_object_mut() else { continue };
                let owner = obj.get(foreign_key).and_then(Value::as_str).map(str::to_string);
                if !select.contains(&foreign_key) {
                    obj.remove(foreign_key);
                }
                if let Some(owner) = owner {
                    grouped.entry(owner).or_default().push(child);
                }
            }

            for doc in docs.iter_mut() {
                let Some(obj) = doc.as_object_mut() else { continue };
                let children = obj
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|id| grouped.remove(id))
                    .unwrap_or_default();
                obj.insert(field.to_string(), Value::Array(children));
            }
        }
    }
    Ok(())
}

fn ensure_field(collection: &Collection, field: &str) -> Result<(), FilterError> {
    if collection.has_field(field) {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(format!("Unknown field '{}' for {}", field, collection.name)))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Cast a query-string value to the storage type of `field`
fn cast(field: &str, kind: FieldKind, raw: &str) -> Result<Value, FilterError> {
    let trimmed = raw.trim();
    let invalid = || FilterError::InvalidOperatorData(format!("Invalid value for {}: {}", field, raw));
    match kind {
        FieldKind::Text => Ok(Value::String(raw.to_string())),
        FieldKind::Numeric => {
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from)
                .ok_or_else(invalid)
        }
        FieldKind::Boolean => match trimmed {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        // Normalized to the fixed-width UTC form the stores compare against
        FieldKind::Timestamp => {
            let parsed = DateTime::parse_from_rfc3339(trimmed)
                .map(|t| t.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|t| t.and_utc())
                })
                .ok_or_else(invalid)?;
            Ok(Value::String(parsed.to_rfc3339_opts(SecondsFormat::Micros, true)))
        }
    }
}

fn unique_strings<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).map(str::to_string).collect()
}

fn with_field(select: &[&str], extra: &str) -> Vec<String> {
    let mut fields: Vec<String> = select.iter().map(|s| s.to_string()).collect();
    if !select.contains(&extra) {
        fields.push(extra.to_string());
    }
    fields
}
