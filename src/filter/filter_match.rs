use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

/// Evaluates parsed filter conditions directly against JSON documents.
/// Semantics follow the SQL rendering in `FilterWhere`, with one document-store
/// twist: equality and `$in` against a list-valued field match when any element
/// matches.
pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(doc: &Map<String, Value>, conditions: &[FilterWhereInfo]) -> bool {
        conditions.iter().all(|c| Self::matches_one(doc.get(&c.column).unwrap_or(&Value::Null), c))
    }

    fn matches_one(field: &Value, condition: &FilterWhereInfo) -> bool {
        match condition.operator {
            FilterOp::Eq => match field {
                Value::Array(items) if !condition.data.is_array() => {
                    items.iter().any(|item| Self::equals(item, &condition.data))
                }
                _ => Self::equals(field, &condition.data),
            },
            FilterOp::Gt => Self::compare_non_null(field, &condition.data) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                Self::compare_non_null(field, &condition.data),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => Self::compare_non_null(field, &condition.data) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                Self::compare_non_null(field, &condition.data),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::In | FilterOp::Any => {
                let candidates: &[Value] = match &condition.data {
                    Value::Array(values) => values,
                    other => std::slice::from_ref(other),
                };
                match field {
                    Value::Array(items) => items.iter().any(|item| candidates.iter().any(|c| Self::equals(item, c))),
                    value => candidates.iter().any(|c| Self::equals(value, c)),
                }
            }
        }
    }

    /// Numbers compare by value regardless of integer/float representation
    pub fn equals(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
            _ => a == b,
        }
    }

    fn compare_non_null(a: &Value, b: &Value) -> Option<Ordering> {
        if a.is_null() || b.is_null() {
            return None;
        }
        Self::compare(a, b)
    }

    /// Ordering between comparable scalars; `None` for mismatched types
    pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    /// Stable multi-key sort; missing fields sort as null (first when ascending)
    pub fn sort(docs: &mut [Value], order: &[FilterOrderInfo]) {
        if order.is_empty() {
            return;
        }
        docs.sort_by(|a, b| {
            for info in order {
                let left = a.get(&info.column).unwrap_or(&Value::Null);
                let right = b.get(&info.column).unwrap_or(&Value::Null);
                let ord = Self::compare(left, right).unwrap_or(Ordering::Equal);
                let ord = match info.sort {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Keep only the listed fields; `*` or an empty list keeps everything
    pub fn project(doc: &Map<String, Value>, select: &[String]) -> Map<String, Value> {
        if select.is_empty() || select.iter().any(|s| s == "*") {
            return doc.clone();
        }
        select
            .iter()
            .filter_map(|field| doc.get(field).map(|v| (field.clone(), v.clone())))
            .collect()
    }
}
