/// Models for the dataset schema endpoint

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
}
