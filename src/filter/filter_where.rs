use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Parses `{ field: value | { "$op": value } }` conditions and renders them as
/// parameterized SQL. Conditions are always AND-ed.
pub struct FilterWhere<'a> {
    param_values: Vec<Value>,
    param_index: usize,
    casts: &'a [(String, String)],
}

impl<'a> FilterWhere<'a> {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            casts: &[],
        }
    }

    /// Render `where_data` to a SQL predicate plus its bind values
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        Self::generate_with_casts(where_data, starting_param_index, &[])
    }

    /// Like [`FilterWhere::generate`], but params compared against a column
    /// listed in `casts` are rendered as `$n::type`
    pub fn generate_with_casts(
        where_data: &Value,
        starting_param_index: usize,
        casts: &'a [(String, String)],
    ) -> Result<(String, Vec<Value>), FilterError> {
        let conditions = Self::parse(where_data)?;
        let mut filter_where = Self { casts, ..Self::new(starting_param_index) };
        let where_clause = filter_where.build(&conditions)?;
        Ok((where_clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    /// Flatten a WHERE object into individual column conditions
    pub fn parse(where_data: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(vec![]),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut conditions = vec![];
        for (field, value) in obj {
            if field.starts_with('$') {
                return Err(FilterError::UnsupportedOperator(field.clone()));
            }
            Self::validate_column(field)?;
            match value {
                Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
                    for (op_key, op_val) in ops {
                        let operator = Self::map_operator(op_key)?;
                        if matches!(operator, FilterOp::In | FilterOp::Any) && !op_val.is_array() {
                            return Err(FilterError::InvalidOperatorData(format!("{} requires an array", op_key)));
                        }
                        conditions.push(FilterWhereInfo { column: field.clone(), operator, data: op_val.clone() });
                    }
                }
                // Implicit equality: { field: value }
                _ => conditions.push(FilterWhereInfo { column: field.clone(), operator: FilterOp::Eq, data: value.clone() }),
            }
        }
        Ok(conditions)
    }

    pub fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$in" => FilterOp::In,
            "$any" => FilterOp::Any,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn build(&mut self, conditions: &[FilterWhereInfo]) -> Result<String, FilterError> {
        let mut sql_conditions = vec![];
        for condition in conditions {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        Ok(if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = condition.column.as_str();
        let quoted_column = format!("\"{}\"", column);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NULL", quoted_column))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(column, condition.data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(column, condition.data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(column, condition.data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(column, condition.data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(column, condition.data.clone()))),
            FilterOp::In => {
                let values = Self::operand_list(&condition.data);
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(column, v)).collect();
                Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
            }
            FilterOp::Any => {
                let values = Self::operand_list(&condition.data);
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(column, v)).collect();
                Ok(format!("{} && ARRAY[{}]", quoted_column, params.join(", ")))
            }
        }
    }

    fn operand_list(data: &Value) -> Vec<Value> {
        match data {
            Value::Array(values) => values.clone(),
            other => vec![other.clone()],
        }
    }

    fn param(&mut self, column: &str, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        match self.casts.iter().find(|(c, _)| c == column) {
            Some((_, sql_type)) => format!("${}::{}", self.param_index, sql_type),
            None => format!("${}", self.param_index),
        }
    }
}
