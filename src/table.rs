use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{frame::ColumnSummary, sql::SqlColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths, align));

    let separator_cells = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &widths, &[]));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, align));
    }

    output
}

/// Column listing in the style of a dataframe `info()` report.
pub fn render_summary(summary: &[ColumnSummary], row_count: usize) -> String {
    let rows = summary
        .iter()
        .map(|column| {
            vec![
                column.position.to_string(),
                column.name.clone(),
                format!("{} non-null", column.non_null),
                column.nulls.to_string(),
                column.dtype.clone(),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = format!("{row_count} row(s), {} column(s)\n", summary.len());
    output.push_str(&render_table(
        &["#", "column", "non-null count", "nulls", "dtype"],
        &rows,
        &[Align::Right, Align::Left, Align::Right, Align::Right, Align::Left],
    ));
    output
}

pub fn render_sql_columns(columns: &[SqlColumn]) -> String {
    let rows = columns
        .iter()
        .map(|column| vec![column.name.clone(), column.sql_type.clone()])
        .collect::<Vec<_>>();
    render_table(&["column", "sql type"], &rows, &[])
}

fn format_row(values: &[String], widths: &[usize], align: &[Align]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate().take(widths.len()) {
        let sanitized = sanitize_cell(value);
        let padding = widths[idx].saturating_sub(display_width(sanitized.as_ref()));
        let cell = match align.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => format!("{sanitized}{}", " ".repeat(padding)),
            Align::Right => format!("{}{sanitized}", " ".repeat(padding)),
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
