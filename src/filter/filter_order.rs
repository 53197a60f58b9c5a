use serde_json::Value;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["createdAt desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    if let Value::String(s) = v {
                        out.extend(Self::parse_order_string(s));
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "createdAt": "desc", "name": "asc" }
                obj.iter()
                    .map(|(k, v)| {
                        let sort = match v.as_str().unwrap_or("asc").to_ascii_lowercase().as_str() {
                            "desc" => SortDirection::Desc,
                            _ => SortDirection::Asc,
                        };
                        FilterOrderInfo { column: k.clone(), sort }
                    })
                    .collect()
            }
            _ => vec![],
        };

        for info in &infos {
            FilterWhere::validate_column(&info.column)?;
        }
        Ok(infos)
    }

    /// Accepts both `name desc` and `-name` forms, comma separated
    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let (col, prefixed_desc) = match col.strip_prefix('-') {
                    Some(rest) => (rest, true),
                    None => (col, false),
                };
                let dir = it.next().unwrap_or(if prefixed_desc { "desc" } else { "asc" });
                let sort = if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        out
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_prefix_and_suffix_forms() {
        let infos = FilterOrder::validate_and_parse(&json!("name,-averageCost")).unwrap();
        assert_eq!(infos[0], FilterOrderInfo { column: "name".into(), sort: SortDirection::Asc });
        assert_eq!(infos[1], FilterOrderInfo { column: "averageCost".into(), sort: SortDirection::Desc });

        let infos = FilterOrder::validate_and_parse(&json!(["createdAt desc"])).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"createdAt\" DESC");
    }

    #[test]
    fn rejects_injection_in_sort_column() {
        assert!(FilterOrder::validate_and_parse(&json!("name;drop")).is_err());
    }
}
