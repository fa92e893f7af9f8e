/// Models for date-ranged report generation

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub fn validate_report_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("date_format"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateReportRequest {
    #[validate(custom(function = validate_report_date))]
    pub start_date: String,
    #[validate(custom(function = validate_report_date))]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub message: String,
    pub status: String,
    pub data: ReportData,
}

#[derive(Debug, Serialize)]
pub struct ReportData {
    /// Flat question → prose answer mapping. Questions whose pipeline failed
    /// are absent; iteration order is not part of the contract.
    pub questions: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_iso_dates() {
        assert!(validate_report_date("2014-01-31").is_ok());
    }

    #[test]
    fn rejects_other_formats() {
        assert!(validate_report_date("31-01-2014").is_err());
        assert!(validate_report_date("2014/01/31").is_err());
        assert!(validate_report_date("last month").is_err());
        assert!(validate_report_date("2014-13-01").is_err());
    }
}
