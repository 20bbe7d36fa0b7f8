//! Command implementations and shared terminal output helpers

pub mod ask;
pub mod chat;
pub mod import;
pub mod log;
pub mod meals;
pub mod nutrients;
pub mod summary;

use serde_json::Value;

use crate::model::QueryResult;

/// Widest a table cell may get before truncation
const MAX_CELL_WIDTH: usize = 32;

/// Print query rows as an aligned text table
pub fn print_result(result: &QueryResult) {
    if result.columns.is_empty() {
        return;
    }
    if result.is_empty() {
        println!("(no rows)");
        return;
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| truncate(&cell(v), MAX_CELL_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row.get(i).map_or(0, |c| c.chars().count()))
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(result.columns.iter().map(String::as_str).collect()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in &cells {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }

    if result.truncated {
        println!("... (showing first {} rows)", result.rows.len());
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_amount(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Two decimals at most, trailing zeros dropped
pub fn format_amount(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Shorten to `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.lines().next().unwrap_or_default();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer meal name", 10), "a much ...");
        assert_eq!(truncate("first line\nsecond", 20), "first line");
        assert_eq!(truncate("crème brûlée bowl", 8), "crème...");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(52.0), "52");
        assert_eq!(format_amount(3.456), "3.46");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn test_cell() {
        assert_eq!(cell(&Value::Null), "-");
        assert_eq!(cell(&serde_json::json!(7)), "7");
        assert_eq!(cell(&serde_json::json!(12.5)), "12.5");
        assert_eq!(cell(&serde_json::json!("Lunch")), "Lunch");
    }
}
