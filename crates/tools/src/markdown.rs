//! Markdown Pipe-Table Rendering
//!
//! Header row, alignment row, one line per data row, no index column.
//! Numeric columns are right-aligned.

use crate::table::{Cell, Table};

pub fn render_markdown(table: &Table) -> String {
    let rendered: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| escape(&c.to_string())).collect())
        .collect();

    let columns = table.columns();
    let right_aligned: Vec<bool> = (0..columns.len())
        .map(|i| {
            let mut cells = table.rows().iter().map(|r| &r[i]).filter(|c| !matches!(c, Cell::Empty));
            let mut any = false;
            let all_numeric = cells.all(|c| {
                any = true;
                c.is_numeric()
            });
            any && all_numeric
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rendered
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| escape(c)).collect();
    push_line(&mut out, &header, &widths, &right_aligned);

    out.push('|');
    for (width, right) in widths.iter().zip(&right_aligned) {
        let dashes = "-".repeat(width + 1);
        if *right {
            out.push_str(&format!("{}:|", dashes));
        } else {
            out.push_str(&format!(":{}|", dashes));
        }
    }
    out.push('\n');

    for row in &rendered {
        push_line(&mut out, row, &widths, &right_aligned);
    }
    out.truncate(out.trim_end().len());
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize], right_aligned: &[bool]) {
    out.push('|');
    for ((cell, width), right) in cells.iter().zip(widths).zip(right_aligned) {
        let pad = " ".repeat(width.saturating_sub(cell.chars().count()));
        if *right {
            out.push_str(&format!(" {}{} |", pad, cell));
        } else {
            out.push_str(&format!(" {}{} |", cell, pad));
        }
    }
    out.push('\n');
}

/// Keep cell text on one line and out of the column separators.
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
