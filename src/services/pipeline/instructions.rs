//! Phase Instructions
//!
//! Texts the phases send to the routing boundary and append to the
//! conversation log.

use chrono::NaiveDate;

use siteline_tools::AccessColumn;

use crate::models::DateRange;

pub fn execution_date(date: NaiveDate) -> String {
    format!(
        "Execution date: {}. Interpret relative periods such as \"last month\" against this date.",
        date.format("%Y-%m-%d")
    )
}

pub fn service_lookup(site_identifier: &str) -> String {
    format!(
        r#"# Instruction
Look up the service information for the site below.

# Site
site_id: {site_identifier}

# Notes
- Answer with the service information only; do not repeat the site_id."#
    )
}

pub fn column_request(request: &str) -> String {
    format!(
        r#"# Instruction
Identify which catalog columns the request below asks for.

# Request
{request}"#
    )
}

pub fn metric_extraction(
    site_identifier: &str,
    range: &DateRange,
    columns: &[AccessColumn],
    request: &str,
) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
    format!(
        r#"# Instruction
Extract the access data below and show the query you used next to the result.
Target site: {site_identifier}
Period: {from} to {to}

# Columns
{columns}

# Operator request
{request}

# Available columns
{catalog}
# Notes
- Group the output by dimension values.
- Choose the dimensions from date, page_title and url."#,
        from = range.from_iso(),
        to = range.to_iso(),
        columns = names.join(", "),
        catalog = AccessColumn::catalog_markdown(),
    )
}

/// Log entry stamping extracted data with its period.
pub fn period_summary(range: &DateRange, access_data: &str) -> String {
    format!(
        "# Analysis period\n{} to {}\n\n# Extracted data\n{}",
        range.from_iso(),
        range.to_iso(),
        access_data
    )
}

pub fn report(service_info: &str, access_data: &str, range: &DateRange) -> String {
    format!(
        r#"# Instruction
Write a website report from the information below.

# Context
## Service information
{service_info}
## Access data
{access_data}
## Query period of the access data
{from} to {to}

# Expected output
- Give insights specific to this site, grounded in its service information, rather than generic advice."#,
        from = range.from_iso(),
        to = range.to_iso(),
    )
}

pub fn generated_report(report: &str) -> String {
    format!("# Generated report\n{}", report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn january() -> DateRange {
        DateRange::parse("2024-01-01", "2024-01-31").unwrap()
    }

    #[test]
    fn test_metric_extraction_embeds_everything() {
        let text = metric_extraction(
            "111",
            &january(),
            &[AccessColumn::Visits, AccessColumn::ConversionRate],
            "visits and cv rate",
        );
        assert!(text.contains("Target site: 111"));
        assert!(text.contains("Period: 2024-01-01 to 2024-01-31"));
        assert!(text.contains("visits, conversion_rate"));
        assert!(text.contains("visits and cv rate"));
        assert!(text.contains("`avg_session_duration`"));
    }

    #[test]
    fn test_report_embeds_payloads_verbatim() {
        let text = report("PC Rental for SMBs", "| visits |\n|---:|\n| 10 |", &january());
        assert!(text.contains("PC Rental for SMBs"));
        assert!(text.contains("| visits |\n|---:|\n| 10 |"));
        assert!(text.contains("2024-01-01 to 2024-01-31"));
    }

    #[test]
    fn test_execution_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert!(execution_date(date).starts_with("Execution date: 2025-03-14."));
    }
}
