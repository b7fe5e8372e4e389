//! Session Models
//!
//! The per-run session record and the structured replies the pipeline parses
//! out of the routing boundary.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::{AppError, AppResult};

// ============================================================================
// SessionRecord
// ============================================================================

/// Output slots filled by the pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    ServiceInfo,
    AccessData,
    ReportResult,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::ServiceInfo => write!(f, "service_info"),
            Slot::AccessData => write!(f, "access_data"),
            Slot::ReportResult => write!(f, "report_result"),
        }
    }
}

/// Mutable accumulator for one run, owned by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    session_id: String,
    execution_date: NaiveDate,
    site_identifier: String,
    service_info: String,
    access_data: String,
    report_result: String,
}

impl SessionRecord {
    pub fn new(site_identifier: impl Into<String>, execution_date: NaiveDate) -> Self {
        Self::with_session_id(new_session_id(), site_identifier, execution_date)
    }

    pub fn with_session_id(
        session_id: impl Into<String>,
        site_identifier: impl Into<String>,
        execution_date: NaiveDate,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            execution_date,
            site_identifier: site_identifier.into(),
            service_info: String::new(),
            access_data: String::new(),
            report_result: String::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn execution_date(&self) -> NaiveDate {
        self.execution_date
    }

    pub fn site_identifier(&self) -> &str {
        &self.site_identifier
    }

    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::ServiceInfo => &self.service_info,
            Slot::AccessData => &self.access_data,
            Slot::ReportResult => &self.report_result,
        }
    }

    pub fn service_info(&self) -> &str {
        &self.service_info
    }

    pub fn access_data(&self) -> &str {
        &self.access_data
    }

    pub fn report_result(&self) -> &str {
        &self.report_result
    }

    /// Fill a slot. Each slot is written at most once.
    pub fn write(&mut self, slot: Slot, value: impl Into<String>) -> AppResult<()> {
        let target = match slot {
            Slot::ServiceInfo => &mut self.service_info,
            Slot::AccessData => &mut self.access_data,
            Slot::ReportResult => &mut self.report_result,
        };
        if !target.is_empty() {
            return Err(AppError::internal(format!("{} was already written", slot)));
        }
        *target = value.into();
        Ok(())
    }
}

/// First 16 hex characters of a v4 UUID.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(16).collect()
}

// ============================================================================
// DateRange / DateCandidate
// ============================================================================

/// A validated, ordered pair of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> AppResult<Self> {
        if from > to {
            return Err(AppError::validation(format!(
                "date_from {} is after date_to {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn parse(from: &str, to: &str) -> AppResult<Self> {
        Self::new(parse_iso_date("date_from", from)?, parse_iso_date("date_to", to)?)
    }

    pub fn from_iso(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    pub fn to_iso(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from_iso(), self.to_iso())
    }
}

fn parse_iso_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!("{} is not a YYYY-MM-DD date: {:?}", field, value))
    })
}

/// Date range proposed by the date-identification capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateCandidate {
    pub is_date: bool,
    pub date_from: String,
    pub date_to: String,
    pub reasoning: String,
}

impl DateCandidate {
    /// Whether the candidate names a range the operator can confirm.
    pub fn is_resolved(&self) -> bool {
        self.is_date && !self.date_from.trim().is_empty() && !self.date_to.trim().is_empty()
    }

    /// Parse and order-check the candidate's dates.
    pub fn range(&self) -> AppResult<DateRange> {
        DateRange::parse(&self.date_from, &self.date_to)
    }

    /// JSON schema for structured output.
    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "is_date": {
                    "type": "boolean",
                    "description": "true when both dates could be identified"
                },
                "date_from": {
                    "type": "string",
                    "description": "first day of the range, YYYY-MM-DD, empty when unknown"
                },
                "date_to": {
                    "type": "string",
                    "description": "last day of the range, YYYY-MM-DD, empty when unknown"
                },
                "reasoning": {
                    "type": "string",
                    "description": "why these dates were chosen, or what to ask the user"
                }
            },
            "required": ["is_date", "date_from", "date_to", "reasoning"],
            "additionalProperties": false
        })
    }
}

// ============================================================================
// ColumnSelection
// ============================================================================

/// Columns identified from a free-text request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSelection {
    pub columns: Vec<String>,
    pub reasoning: String,
}

impl ColumnSelection {
    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "columns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "catalog column names, empty when nothing matches"
                },
                "reasoning": {
                    "type": "string",
                    "description": "why these columns were chosen, or what is unclear"
                }
            },
            "required": ["columns", "reasoning"],
            "additionalProperties": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_session_id_is_16_hex_chars() {
        let id = new_session_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_session_id());
    }

    #[test]
    fn test_slots_written_once() {
        let mut record = SessionRecord::new("111", day(2025, 3, 1));
        assert_eq!(record.site_identifier(), "111");
        assert!(record.service_info().is_empty());

        record.write(Slot::ServiceInfo, "PC Rental").unwrap();
        assert_eq!(record.get(Slot::ServiceInfo), "PC Rental");
        assert!(record.write(Slot::ServiceInfo, "other").is_err());
        assert_eq!(record.service_info(), "PC Rental");
    }

    #[test]
    fn test_candidate_resolution() {
        let candidate: DateCandidate = serde_json::from_str(
            r#"{"is_date": true, "date_from": "2024-01-01", "date_to": "2024-01-31", "reasoning": ""}"#,
        )
        .unwrap();
        assert!(candidate.is_resolved());
        assert_eq!(
            candidate.range().unwrap(),
            DateRange {
                from: day(2024, 1, 1),
                to: day(2024, 1, 31)
            }
        );

        let partial = DateCandidate {
            is_date: true,
            date_from: "2024-01-01".into(),
            ..Default::default()
        };
        assert!(!partial.is_resolved());
    }

    #[test]
    fn test_candidate_missing_fields_default() {
        let candidate: DateCandidate =
            serde_json::from_str(r#"{"is_date": false, "reasoning": "ambiguous month"}"#).unwrap();
        assert!(!candidate.is_resolved());
        assert_eq!(candidate.reasoning, "ambiguous month");
    }

    #[test]
    fn test_range_rejects_inverted_and_malformed() {
        assert!(matches!(
            DateRange::parse("2024-02-01", "2024-01-01"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            DateRange::parse("2024/01/01", "2024-01-31"),
            Err(AppError::Validation(_))
        ));
        let range = DateRange::parse("2024-01-01", "2024-01-01").unwrap();
        assert_eq!(range.to_string(), "2024-01-01 to 2024-01-01");
    }

    #[test]
    fn test_schemas_require_every_field() {
        assert_eq!(DateCandidate::schema()["required"].as_array().unwrap().len(), 4);
        assert_eq!(ColumnSelection::schema()["required"][0], "columns");
    }
}
