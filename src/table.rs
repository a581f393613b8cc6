//! Plain-text rendering of the field policy table.

use std::fmt::Write as _;

use crate::policy::PolicyRegistry;

const COLUMN_GAP: &str = "  ";

pub fn render_policy_table(registry: &PolicyRegistry) -> String {
    let headers = ["#", "field", "strategy", "mandatory", "behavior"];
    let rows = registry
        .entries()
        .enumerate()
        .map(|(idx, (field, policy))| {
            [
                (idx + 1).to_string(),
                field.to_string(),
                policy.strategy.to_string(),
                policy.mandatory.to_string(),
                policy.strategy.describe().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render(&headers, &rows)
}

fn render<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers.iter().copied(), &widths);
    push_line(
        &mut output,
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().iter().map(String::as_str),
        &widths,
    );
    for row in rows {
        push_line(&mut output, row.iter().map(|cell| single_line(cell)), &widths);
    }
    output
}

fn push_line<'a, I>(output: &mut String, cells: I, widths: &[usize])
where
    I: Iterator<Item = &'a str>,
{
    let mut line = String::new();
    for (idx, (cell, width)) in cells.zip(widths.iter().copied()).enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        let _ = write!(line, "{cell:<width$}");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn single_line(value: &str) -> &str {
    value.lines().next().unwrap_or("")
}
