use crate::domain::{AggregationRequest, GroupBy, SumTarget};

/// A positional parameter of a built statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Integer(i64),
    Text(String),
}

/// A statement built from an [`AggregationRequest`] with its positional binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSql {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Build the SQL for an aggregation request.
///
/// Every statement returns two columns: `group_key` (INTEGER for years, TEXT
/// for months and values, NULL when the request is not grouped) and `total`
/// (REAL, NULL when a SUM saw no rows). Table and column names only ever come
/// from static descriptors; years, dates, lengths and limits are bound as
/// parameters.
pub fn build_aggregation_sql(request: &AggregationRequest) -> AggregationSql {
    let total_expr = match request.sum {
        SumTarget::Rows => "COUNT(*)".to_string(),
        SumTarget::Distinct(column) => format!("COUNT(DISTINCT {})", column),
        SumTarget::Column(_) | SumTarget::Columns(_) => {
            let terms: Vec<String> = request
                .sum
                .columns()
                .iter()
                .map(|c| format!("COALESCE({}, 0)", c))
                .collect();
            format!("SUM({})", terms.join(" + "))
        }
    };

    let key_expr = match request.group_by {
        GroupBy::Nothing => "NULL".to_string(),
        GroupBy::YearOf(column) => format!("CAST(strftime('%Y', {}) AS INTEGER)", column),
        GroupBy::MonthOf(column) => format!("strftime('%Y-%m', {})", column),
        GroupBy::Value(column) => column.to_string(),
    };

    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(filter) = request.filter {
        conditions.push(format!("{} = 1", filter));
    }

    if let GroupBy::Value(column) = request.group_by {
        conditions.push(format!("{} IS NOT NULL", column));
        if let Some(length) = request.value_length {
            conditions.push(format!("LENGTH({}) = ?", column));
            binds.push(BindValue::Integer(i64::from(length)));
        }
    }

    if let (Some(column), Some(since)) = (request.group_by.timestamp_column(), request.since) {
        // RFC 3339 text sorts chronologically, so a date prefix bounds it.
        conditions.push(format!("{} >= ?", column));
        binds.push(BindValue::Text(since.format("%Y-%m-%d").to_string()));
    }

    if let (GroupBy::YearOf(_), Some(years)) = (request.group_by, &request.years) {
        let placeholders = vec!["?"; years.len()].join(", ");
        conditions.push(format!("{} IN ({})", key_expr, placeholders));
        binds.extend(years.iter().map(|y| BindValue::Integer(i64::from(y))));
    }

    let mut sql = format!(
        "SELECT {} AS group_key, CAST({} AS REAL) AS total FROM {}",
        key_expr, total_expr, request.table
    );

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    match request.group_by {
        GroupBy::Nothing => {}
        GroupBy::YearOf(_) | GroupBy::MonthOf(_) => {
            sql.push_str(" GROUP BY group_key ORDER BY group_key");
        }
        GroupBy::Value(_) => {
            sql.push_str(" GROUP BY group_key ORDER BY total DESC, group_key");
        }
    }

    if let Some(limit) = request.limit {
        sql.push_str(" LIMIT ?");
        binds.push(BindValue::Integer(i64::from(limit)));
    }

    AggregationSql { sql, binds }
}
