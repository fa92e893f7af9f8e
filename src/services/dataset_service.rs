/// Embedded dataset engine
///
/// The dataset is a single CSV file queried through an embedded SQLite
/// database. The CSV is re-read and the working table rebuilt on every query
/// (drop + create + bulk insert), so edits to the dataset file are picked up
/// without a restart. Queries run on the blocking thread pool with a fresh
/// connection per call.

use std::path::Path;
use std::time::Instant;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::config::DatasetConfig;
use crate::middleware::error_handling::{AppError, Result};

const SAMPLE_ROWS_FOR_INFERENCE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    /// One JSON object per row, keyed by column name.
    pub rows: Vec<Value>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Render the result as a plain text table for the summarization prompt.
    /// Rows beyond `max_rows` are elided with a count so huge result sets
    /// don't blow up the prompt.
    pub fn to_prompt_table(&self, max_rows: usize) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join(" | "));
        out.push('\n');
        out.push_str(&"-".repeat(self.columns.join(" | ").len().min(80)));
        out.push('\n');

        for row in self.rows.iter().take(max_rows) {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|col| match row.get(col) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                })
                .collect();
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }

        if self.rows.len() > max_rows {
            out.push_str(&format!("... ({} more rows)\n", self.rows.len() - max_rows));
        }

        out
    }
}

pub struct DatasetService {
    config: DatasetConfig,
}

impl DatasetService {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Rebuild the working table from the CSV and run `sql` against it.
    pub async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let config = self.config.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || run_query(&config, &sql))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("query task failed: {}", e)))?
    }

    /// Column names with their inferred SQL types.
    pub async fn schema(&self) -> Result<Vec<(String, ColumnType)>> {
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let (headers, types, _) = read_csv(&config.csv_path)?;
            Ok(headers.into_iter().zip(types).collect())
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("schema task failed: {}", e)))?
    }
}

/// Render a table description for prompting, e.g.
/// `Table: finance_data` followed by one `- column (TYPE)` line per column.
pub fn schema_description(table_name: &str, columns: &[(String, ColumnType)]) -> String {
    let mut out = format!("Table: {}\nColumns:\n", table_name);
    for (name, column_type) in columns {
        out.push_str(&format!("- {} ({})\n", name, column_type.sql_name()));
    }
    out
}

fn run_query(config: &DatasetConfig, sql: &str) -> Result<QueryResult> {
    let start_time = Instant::now();

    let (headers, types, records) = read_csv(&config.csv_path)?;
    let mut conn = open_connection(config)?;
    rebuild_table(&mut conn, &config.table_name, &headers, &types, &records)?;

    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut out_rows = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut object = Map::new();
        for (idx, name) in columns.iter().enumerate() {
            object.insert(name.clone(), value_to_json(row.get_ref(idx)?));
        }
        out_rows.push(Value::Object(object));
    }

    Ok(QueryResult {
        columns,
        row_count: out_rows.len(),
        rows: out_rows,
        execution_time_ms: start_time.elapsed().as_millis() as u64,
    })
}

fn open_connection(config: &DatasetConfig) -> Result<Connection> {
    let conn = match &config.scratch_db_path {
        Some(path) => Connection::open(path)?,
        None => Connection::open_in_memory()?,
    };
    Ok(conn)
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<ColumnType>, Vec<csv::StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "dataset {} has no header row",
            path.display()
        )));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    let types = infer_column_types(&headers, &records);
    Ok((headers, types, records))
}

/// Infer a storage type per column from a sample of the data. Types only ever
/// widen: INTEGER → REAL → TEXT. Columns with no values at all land on TEXT.
fn infer_column_types(headers: &[String], records: &[csv::StringRecord]) -> Vec<ColumnType> {
    (0..headers.len())
        .map(|idx| {
            let mut saw_value = false;
            let mut column_type = ColumnType::Integer;

            for record in records.iter().take(SAMPLE_ROWS_FOR_INFERENCE) {
                let field = record.get(idx).unwrap_or("").trim();
                if field.is_empty() {
                    continue;
                }
                saw_value = true;

                if field.parse::<i64>().is_ok() {
                    continue;
                }
                if field.parse::<f64>().is_ok() {
                    column_type = ColumnType::Real;
                    continue;
                }
                column_type = ColumnType::Text;
                break;
            }

            if saw_value {
                column_type
            } else {
                ColumnType::Text
            }
        })
        .collect()
}

fn rebuild_table(
    conn: &mut Connection,
    table_name: &str,
    headers: &[String],
    types: &[ColumnType],
    records: &[csv::StringRecord],
) -> Result<()> {
    let table_ident = quote_ident(table_name);

    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", table_ident))?;

    let column_defs: Vec<String> = headers
        .iter()
        .zip(types)
        .map(|(name, column_type)| format!("{} {}", quote_ident(name), column_type.sql_name()))
        .collect();
    conn.execute(
        &format!("CREATE TABLE {} ({})", table_ident, column_defs.join(", ")),
        [],
    )?;

    let placeholders = vec!["?"; headers.len()].join(", ");
    let insert_sql = format!("INSERT INTO {} VALUES ({})", table_ident, placeholders);

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for record in records {
            let values: Vec<SqlValue> = (0..headers.len())
                .map(|idx| field_to_sql(record.get(idx).unwrap_or(""), types[idx]))
                .collect();
            stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;

    Ok(())
}

fn field_to_sql(field: &str, column_type: ColumnType) -> SqlValue {
    let field = field.trim();
    if field.is_empty() {
        return SqlValue::Null;
    }
    match column_type {
        ColumnType::Integer => field
            .parse::<i64>()
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Null),
        ColumnType::Real => field
            .parse::<f64>()
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        ColumnType::Text => SqlValue::Text(field.to_string()),
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_csv(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("finsight-dataset-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    fn service_for(path: PathBuf) -> DatasetService {
        DatasetService::new(DatasetConfig {
            csv_path: path,
            table_name: "finance_data".to_string(),
            scratch_db_path: None,
        })
    }

    #[test]
    fn infers_column_types_from_data() {
        let headers: Vec<String> = ["country", "units_sold", "profit", "empty"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let records = vec![
            csv::StringRecord::from(vec!["Canada", "1618", "16185.5", ""]),
            csv::StringRecord::from(vec!["France", "888", "-100", ""]),
        ];

        let types = infer_column_types(&headers, &records);
        assert_eq!(types[0], ColumnType::Text);
        assert_eq!(types[1], ColumnType::Integer);
        assert_eq!(types[2], ColumnType::Real);
        assert_eq!(types[3], ColumnType::Text);
    }

    #[test]
    fn integer_column_widens_to_real_not_back() {
        let headers: Vec<String> = vec!["amount".to_string()];
        let records = vec![
            csv::StringRecord::from(vec!["10"]),
            csv::StringRecord::from(vec!["10.5"]),
            csv::StringRecord::from(vec!["11"]),
        ];

        let types = infer_column_types(&headers, &records);
        assert_eq!(types[0], ColumnType::Real);
    }

    #[tokio::test]
    async fn executes_aggregation_over_csv() {
        let path = write_csv(
            "country,units_sold,profit\nCanada,1618,16185.5\nFrance,888,888.0\nCanada,100,100.5\n",
        );
        let service = service_for(path.clone());

        let result = service
            .execute_query(
                "SELECT country, SUM(profit) AS total_profit FROM finance_data GROUP BY country ORDER BY country",
            )
            .await
            .unwrap();

        assert_eq!(result.row_count, 2);
        assert_eq!(result.columns, vec!["country", "total_profit"]);
        assert_eq!(result.rows[0]["country"], "Canada");
        assert_eq!(result.rows[0]["total_profit"], 16286.0);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn table_is_rebuilt_from_csv_on_each_query() {
        let path = write_csv("country,profit\nCanada,10\n");
        let service = service_for(path.clone());

        let first = service
            .execute_query("SELECT COUNT(*) AS n FROM finance_data")
            .await
            .unwrap();
        assert_eq!(first.rows[0]["n"], 1);

        std::fs::write(&path, "country,profit\nCanada,10\nFrance,20\n").unwrap();

        let second = service
            .execute_query("SELECT COUNT(*) AS n FROM finance_data")
            .await
            .unwrap();
        assert_eq!(second.rows[0]["n"], 2);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn empty_fields_become_null() {
        let path = write_csv("country,profit\nCanada,\n");
        let service = service_for(path.clone());

        let result = service
            .execute_query("SELECT profit FROM finance_data")
            .await
            .unwrap();
        assert_eq!(result.rows[0]["profit"], serde_json::Value::Null);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn missing_csv_is_an_error() {
        let service = service_for(PathBuf::from("/nonexistent/finsight.csv"));
        let result = service.execute_query("SELECT 1").await;
        assert!(result.is_err());
    }

    #[test]
    fn prompt_table_elides_extra_rows() {
        let result = QueryResult {
            columns: vec!["n".to_string()],
            rows: (0..5)
                .map(|i| serde_json::json!({"n": i}))
                .collect(),
            row_count: 5,
            execution_time_ms: 0,
        };

        let table = result.to_prompt_table(2);
        assert!(table.starts_with("n\n"));
        assert!(table.contains("(3 more rows)"));
    }

    #[test]
    fn schema_description_lists_columns() {
        let columns = vec![
            ("country".to_string(), ColumnType::Text),
            ("profit".to_string(), ColumnType::Real),
        ];

        let description = schema_description("finance_data", &columns);
        assert!(description.contains("Table: finance_data"));
        assert!(description.contains("- country (TEXT)"));
        assert!(description.contains("- profit (REAL)"));
    }
}
