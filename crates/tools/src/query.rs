//! Structured Query Builder
//!
//! Select, filter and group over an in-memory `Table`. Predicates hold typed
//! `Cell` values, so caller input is compared as data and never spliced into
//! query text.
//!
//! Grouped output has one row per distinct key, in first-appearance order.
//! Projected non-key columns aggregate by cell type: integers are summed,
//! percentages and durations are averaged, anything else keeps the first
//! value seen in the group.

use std::collections::HashMap;

use crate::error::{ToolError, ToolResult};
use crate::table::{Cell, Table};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `from <= column <= to`
    Between { column: String, from: Cell, to: Cell },
    /// `column == value`
    Equals { column: String, value: Cell },
}

impl Predicate {
    fn column(&self) -> &str {
        match self {
            Predicate::Between { column, .. } | Predicate::Equals { column, .. } => column,
        }
    }

    fn matches(&self, cell: &Cell) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Predicate::Between { from, to, .. } => {
                matches!(cell.compare(from), Some(Greater | Equal))
                    && matches!(cell.compare(to), Some(Less | Equal))
            }
            Predicate::Equals { value, .. } => cell.compare(value) == Some(Equal),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    select: Vec<String>,
    filters: Vec<Predicate>,
    group_by: Vec<String>,
}

impl Query {
    pub fn select<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            select: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    fn index_of(table: &Table, name: &str) -> ToolResult<usize> {
        table
            .column_index(name)
            .ok_or_else(|| ToolError::UnknownColumn(name.to_string()))
    }

    /// Run the query and return a new table holding the selected columns.
    pub fn execute(&self, table: &Table) -> ToolResult<Table> {
        let select_idx = self
            .select
            .iter()
            .map(|c| Self::index_of(table, c))
            .collect::<ToolResult<Vec<_>>>()?;
        let group_idx = self
            .group_by
            .iter()
            .map(|c| Self::index_of(table, c))
            .collect::<ToolResult<Vec<_>>>()?;
        let filters = self
            .filters
            .iter()
            .map(|p| Self::index_of(table, p.column()).map(|idx| (idx, p)))
            .collect::<ToolResult<Vec<_>>>()?;

        let matching = table
            .rows()
            .iter()
            .filter(|row| filters.iter().all(|(idx, p)| p.matches(&row[*idx])));

        let mut out = Table::new(self.select.clone());
        if group_idx.is_empty() {
            for row in matching {
                out.push_row(select_idx.iter().map(|&i| row[i].clone()).collect())?;
            }
            return Ok(out);
        }

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&Vec<Cell>>> = HashMap::new();
        for row in matching {
            let key = group_idx
                .iter()
                .map(|&i| row[i].group_key())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(row);
        }

        for key in &order {
            let members = &groups[key];
            let row = select_idx
                .iter()
                .map(|&i| {
                    if group_idx.contains(&i) {
                        members[0][i].clone()
                    } else {
                        aggregate(members.iter().map(|r| &r[i]))
                    }
                })
                .collect();
            out.push_row(row)?;
        }
        Ok(out)
    }
}

fn aggregate<'a>(cells: impl Iterator<Item = &'a Cell>) -> Cell {
    let cells: Vec<&Cell> = cells.filter(|c| !matches!(c, Cell::Empty)).collect();
    let Some(first) = cells.first() else {
        return Cell::Empty;
    };
    let n = cells.len() as f64;
    match first {
        Cell::Integer(_) => Cell::Integer(
            cells
                .iter()
                .filter_map(|c| match c {
                    Cell::Integer(v) => Some(*v),
                    _ => None,
                })
                .fold(0i64, i64::saturating_add),
        ),
        Cell::Percent(_) => Cell::Percent(
            cells
                .iter()
                .filter_map(|c| match c {
                    Cell::Percent(v) => Some(*v),
                    _ => None,
                })
                .sum::<f64>()
                / n,
        ),
        Cell::Duration(_) => {
            let total: f64 = cells
                .iter()
                .filter_map(|c| match c {
                    Cell::Duration(v) => Some(f64::from(*v)),
                    _ => None,
                })
                .sum();
            Cell::Duration((total / n).round() as u32)
        }
        other => (*other).clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> Cell {
        Cell::Date(NaiveDate::from_ymd_opt(2025, 1, d).unwrap())
    }

    fn sample() -> Table {
        let mut t = Table::new(vec![
            "date".into(),
            "page_title".into(),
            "visits".into(),
            "bounce_rate".into(),
            "avg_session_duration".into(),
        ]);
        let rows = [
            (1, "Top", 100, 30.0, 100),
            (1, "Pricing", 40, 50.0, 60),
            (2, "Top", 120, 40.0, 200),
            (3, "Top", 90, 20.0, 90),
        ];
        for (d, title, visits, bounce, secs) in rows {
            t.push_row(vec![
                date(d),
                Cell::Text(title.into()),
                Cell::Integer(visits),
                Cell::Percent(bounce),
                Cell::Duration(secs),
            ])
            .unwrap();
        }
        t
    }

    #[test]
    fn test_between_is_inclusive() {
        let out = Query::select(["date", "visits"])
            .filter(Predicate::Between {
                column: "date".into(),
                from: date(1),
                to: date(2),
            })
            .execute(&sample())
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.columns(), &["date", "visits"]);
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let out = Query::select(["visits"])
            .filter(Predicate::Between {
                column: "date".into(),
                from: date(3),
                to: date(1),
            })
            .execute(&sample())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_equals_filter() {
        let out = Query::select(["visits"])
            .filter(Predicate::Equals {
                column: "page_title".into(),
                value: Cell::Text("Pricing".into()),
            })
            .execute(&sample())
            .unwrap();
        assert_eq!(out.rows(), &[vec![Cell::Integer(40)]]);
    }

    #[test]
    fn test_group_by_sums_counts_and_averages_rates() {
        let out = Query::select(["page_title", "visits", "bounce_rate", "avg_session_duration"])
            .group_by(["page_title"])
            .execute(&sample())
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(
            out.rows()[0],
            vec![
                Cell::Text("Top".into()),
                Cell::Integer(310),
                Cell::Percent(30.0),
                Cell::Duration(130),
            ]
        );
        assert_eq!(out.rows()[1][1], Cell::Integer(40));
    }

    #[test]
    fn test_group_by_keeps_first_appearance_order() {
        let out = Query::select(["date", "visits"])
            .group_by(["date"])
            .execute(&sample())
            .unwrap();
        let dates: Vec<_> = out.rows().iter().map(|r| r[0].clone()).collect();
        assert_eq!(dates, vec![date(1), date(2), date(3)]);
        assert_eq!(out.rows()[0][1], Cell::Integer(140));
    }

    #[test]
    fn test_group_by_rate_keeps_close_values_apart() {
        let mut t = Table::new(vec!["conversion_rate".into(), "visits".into()]);
        for (rate, visits) in [(1.666, 10), (1.667, 20), (1.666, 5)] {
            t.push_row(vec![Cell::Percent(rate), Cell::Integer(visits)])
                .unwrap();
        }
        let out = Query::select(["conversion_rate", "visits"])
            .group_by(["conversion_rate"])
            .execute(&t)
            .unwrap();
        assert_eq!(
            out.rows(),
            &[
                vec![Cell::Percent(1.666), Cell::Integer(15)],
                vec![Cell::Percent(1.667), Cell::Integer(20)],
            ]
        );
    }

    #[test]
    fn test_count_sum_saturates() {
        let mut t = Table::new(vec!["page_title".into(), "visits".into()]);
        for visits in [i64::MAX, 1] {
            t.push_row(vec![Cell::Text("Top".into()), Cell::Integer(visits)])
                .unwrap();
        }
        let out = Query::select(["page_title", "visits"])
            .group_by(["page_title"])
            .execute(&t)
            .unwrap();
        assert_eq!(out.rows()[0][1], Cell::Integer(i64::MAX));
    }

    #[test]
    fn test_unknown_column() {
        let err = Query::select(["sessions"]).execute(&sample()).unwrap_err();
        assert!(matches!(err, ToolError::UnknownColumn(ref c) if c == "sessions"));
    }
}
