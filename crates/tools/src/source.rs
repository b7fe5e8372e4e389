//! Tabular Source Adapter
//!
//! Loads a named dataset into a typed `Table`. Every call goes back to
//! storage; nothing is cached between calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::{AccessColumn, ColumnKind};
use crate::error::{ToolError, ToolResult};
use crate::table::{Cell, Table};

/// Default file names inside the data directory.
pub const DEFAULT_ACCESS_FILE: &str = "landingpage_data.csv";
pub const DEFAULT_SERVICE_FILE: &str = "site_data.csv";

/// Column names of the service dataset after loading.
pub const SERVICE_KEY: &str = "site_identifier";
pub const SERVICE_NAME: &str = "service";
pub const SERVICE_OVERVIEW: &str = "overview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetName {
    /// Per-page daily access metrics
    AccessMetrics,
    /// Site descriptions keyed by site identifier
    Services,
}

impl DatasetName {
    /// Loaded column names, in order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            DatasetName::AccessMetrics => {
                AccessColumn::ALL.iter().map(|c| c.name().to_string()).collect()
            }
            DatasetName::Services => vec![
                SERVICE_KEY.to_string(),
                SERVICE_NAME.to_string(),
                SERVICE_OVERVIEW.to_string(),
            ],
        }
    }
}

/// Source of tabular datasets.
pub trait TabularSource: Send + Sync {
    /// Load `dataset` in full. Fails with `SourceUnavailable` when it is missing.
    fn load(&self, dataset: DatasetName) -> ToolResult<Table>;
}

// ============================================================================
// CsvTableSource
// ============================================================================

/// Reads datasets from CSV files in one directory.
#[derive(Debug, Clone)]
pub struct CsvTableSource {
    root: PathBuf,
    access_file: String,
    service_file: String,
}

impl CsvTableSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            access_file: DEFAULT_ACCESS_FILE.to_string(),
            service_file: DEFAULT_SERVICE_FILE.to_string(),
        }
    }

    pub fn with_files(mut self, access_file: impl Into<String>, service_file: impl Into<String>) -> Self {
        self.access_file = access_file.into();
        self.service_file = service_file.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(&self, dataset: DatasetName) -> &str {
        match dataset {
            DatasetName::AccessMetrics => &self.access_file,
            DatasetName::Services => &self.service_file,
        }
    }

    fn open(&self, dataset: DatasetName) -> ToolResult<csv::Reader<std::fs::File>> {
        let file = self.file_name(dataset);
        let path = self.root.join(file);
        match std::fs::File::open(&path) {
            Ok(handle) => Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(handle)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::SourceUnavailable {
                file: file.to_string(),
                path,
            }),
            Err(e) => Err(ToolError::unexpected(format!("cannot read {}: {}", path.display(), e))),
        }
    }
}

/// Map each wanted column to its position among the CSV headers.
fn header_positions(
    headers: &csv::StringRecord,
    wanted: &[(&str, &[&str])],
) -> ToolResult<Vec<usize>> {
    wanted
        .iter()
        .map(|(name, accepted)| {
            headers
                .iter()
                .position(|h| {
                    let h = h.trim_start_matches('\u{feff}');
                    accepted.iter().any(|a| a.eq_ignore_ascii_case(h))
                })
                .ok_or_else(|| ToolError::malformed(format!("missing column {}", name)))
        })
        .collect()
}

impl TabularSource for CsvTableSource {
    fn load(&self, dataset: DatasetName) -> ToolResult<Table> {
        let mut reader = self.open(dataset)?;
        let headers = reader.headers()?.clone();
        let mut table = Table::new(dataset.columns());

        match dataset {
            DatasetName::AccessMetrics => {
                let wanted: Vec<(&str, &[&str])> = AccessColumn::ALL
                    .iter()
                    .map(|c| (c.name(), c.headers()))
                    .collect();
                let positions = header_positions(&headers, &wanted)?;
                for (line, record) in reader.records().enumerate() {
                    let record = record?;
                    let row = AccessColumn::ALL
                        .iter()
                        .zip(&positions)
                        .map(|(col, &pos)| {
                            Cell::parse(col.kind(), record.get(pos).unwrap_or("")).map_err(|e| match e {
                                ToolError::MalformedSource(msg) => {
                                    ToolError::malformed(format!("row {}, {}: {}", line + 2, col, msg))
                                }
                                other => other,
                            })
                        })
                        .collect::<ToolResult<Vec<_>>>()?;
                    table.push_row(row)?;
                }
            }
            DatasetName::Services => {
                let wanted: [(&str, &[&str]); 3] = [
                    (SERVICE_KEY, &["site_identifier", "site_id"][..]),
                    (SERVICE_NAME, &["service"][..]),
                    (SERVICE_OVERVIEW, &["overview"][..]),
                ];
                let positions = header_positions(&headers, &wanted)?;
                for record in reader.records() {
                    let record = record?;
                    let row = positions
                        .iter()
                        .map(|&pos| Cell::parse(ColumnKind::Text, record.get(pos).unwrap_or("")))
                        .collect::<ToolResult<Vec<_>>>()?;
                    table.push_row(row)?;
                }
            }
        }

        tracing::debug!(
            "[CsvTableSource] loaded {:?}: {} rows from {}",
            dataset,
            table.len(),
            self.root.join(self.file_name(dataset)).display()
        );
        Ok(table)
    }
}

// ============================================================================
// InMemorySource
// ============================================================================

/// Fixed tables held in memory. A dataset without a table is unavailable.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: HashMap<DatasetName, Table>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, dataset: DatasetName, table: Table) -> Self {
        self.tables.insert(dataset, table);
        self
    }
}

impl TabularSource for InMemorySource {
    fn load(&self, dataset: DatasetName) -> ToolResult<Table> {
        self.tables
            .get(&dataset)
            .cloned()
            .ok_or_else(|| ToolError::SourceUnavailable {
                file: format!("{:?}", dataset),
                path: PathBuf::from("<memory>"),
            })
    }
}
