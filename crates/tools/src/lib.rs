//! Siteline Tools
//!
//! Deterministic data access behind the capability graph:
//! - `catalog` - the fixed access-metric column catalog
//! - `table` - typed in-memory tables
//! - `source` - tabular source adapter (CSV directory, in-memory)
//! - `query` - structured select/filter/group-by builder
//! - `markdown` - pipe-table rendering
//! - `metric_query` / `service_lookup` - the two tools exposed to the model
//!
//! Both tools always answer with text. Validation and data problems come back
//! as sentinel strings (see `error`) so the model can relay them.

pub mod catalog;
pub mod error;
pub mod markdown;
pub mod metric_query;
pub mod query;
pub mod service_lookup;
pub mod source;
pub mod table;

pub use catalog::{AccessColumn, ColumnKind};
pub use error::{ToolError, ToolResult};
pub use markdown::render_markdown;
pub use metric_query::{MetricQueryArgs, MetricQueryTool};
pub use query::{Predicate, Query};
pub use service_lookup::ServiceLookupTool;
pub use source::{CsvTableSource, DatasetName, InMemorySource, TabularSource};
pub use table::{Cell, Table};
