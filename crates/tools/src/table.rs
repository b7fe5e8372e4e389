//! Typed In-Memory Tables
//!
//! A `Table` is a list of named columns plus rows of `Cell`s. Cells carry the
//! parsed value so filters compare dates as dates and aggregation can sum
//! counts and average rates without re-parsing strings.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::catalog::ColumnKind;
use crate::error::{ToolError, ToolResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    /// Percentage value, `35.0` for "35%"
    Percent(f64),
    /// Whole seconds
    Duration(u32),
    Empty,
}

impl Cell {
    /// Parse a raw CSV field according to the column kind.
    pub fn parse(kind: ColumnKind, raw: &str) -> ToolResult<Cell> {
        let raw = raw.trim();
        match kind {
            ColumnKind::Text => Ok(Cell::Text(raw.to_string())),
            _ if raw.is_empty() && kind == ColumnKind::Count => Ok(Cell::Integer(0)),
            _ if raw.is_empty() => Ok(Cell::Empty),
            ColumnKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Cell::Date)
                .map_err(|_| ToolError::malformed(format!("bad date value {:?}", raw))),
            ColumnKind::Count => raw
                .replace(',', "")
                .parse::<u64>()
                .ok()
                .and_then(|n| i64::try_from(n).ok())
                .map(Cell::Integer)
                .ok_or_else(|| ToolError::malformed(format!("bad count value {:?}", raw))),
            ColumnKind::Percent => raw
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .map(Cell::Percent)
                .map_err(|_| ToolError::malformed(format!("bad percentage value {:?}", raw))),
            ColumnKind::Duration => parse_duration(raw)
                .map(Cell::Duration)
                .ok_or_else(|| ToolError::malformed(format!("bad duration value {:?}", raw))),
        }
    }

    /// Ordering between comparable cells of the same variant.
    pub fn compare(&self, other: &Cell) -> Option<Ordering> {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => Some(a.cmp(b)),
            (Cell::Integer(a), Cell::Integer(b)) => Some(a.cmp(b)),
            (Cell::Date(a), Cell::Date(b)) => Some(a.cmp(b)),
            (Cell::Percent(a), Cell::Percent(b)) => a.partial_cmp(b),
            (Cell::Duration(a), Cell::Duration(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Whether this cell renders right-aligned.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Integer(_) | Cell::Percent(_) | Cell::Duration(_))
    }

    /// Key used to group equal cells. Built from the stored value, not the
    /// rendered text, so rates that round alike stay apart.
    pub(crate) fn group_key(&self) -> String {
        match self {
            Cell::Text(s) => format!("t:{}", s),
            Cell::Integer(n) => format!("i:{}", n),
            Cell::Date(d) => format!("d:{}", d),
            Cell::Percent(p) => format!("p:{:016x}", p.to_bits()),
            Cell::Duration(secs) => format!("s:{}", secs),
            Cell::Empty => "e:".to_string(),
        }
    }
}

/// `h:mm:ss` or `mm:ss` to seconds.
fn parse_duration(raw: &str) -> Option<u32> {
    let parts: Vec<u32> = raw
        .split(':')
        .map(|p| p.trim().parse::<u32>().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s),
        [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s),
        _ => None,
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(n) => write!(f, "{}", n),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Percent(p) if p.fract() == 0.0 => write!(f, "{:.0}%", p),
            Cell::Percent(p) => write!(f, "{:.2}%", p),
            Cell::Duration(secs) => write!(
                f,
                "{}:{:02}:{:02}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60
            ),
            Cell::Empty => Ok(()),
        }
    }
}

// ============================================================================
// Table
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) -> ToolResult<()> {
        if row.len() != self.columns.len() {
            return Err(ToolError::unexpected(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
