use chrono::DateTime;
use crossterm::style::Stylize;
use serde_json::Value;
use std::io::IsTerminal;
use unicode_width::UnicodeWidthStr;

const GUTTER: &str = "  ";
const EMPTY_PLACEHOLDER: &str = "No results.";

/// One table column: the JSON field it reads (dotted paths reach into
/// nested objects) and the header it prints.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
}

impl Column {
    pub const fn new(key: &'static str, title: &'static str) -> Self {
        Self { key, title }
    }
}

/// Render rows as an aligned plain-text table: header, dash separator, one
/// line per row. Cells are never truncated; widths follow the widest cell
/// by display width so CJK and emoji content stays aligned. Zero rows
/// render as a fixed placeholder line.
pub fn render_table(items: &[Value], columns: &[Column]) -> String {
    if items.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let cells: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| value_to_cell(lookup(item, column.key)))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.title.width()).collect();
    for row in &cells {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.width());
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(render_line(
        columns.iter().map(|c| c.title.to_string()).collect(),
        &widths,
    ));
    lines.push(render_line(
        widths.iter().map(|w| "-".repeat(*w)).collect(),
        &widths,
    ));
    for row in cells {
        lines.push(render_line(row, &widths));
    }
    lines.join("\n")
}

/// Render a single record as aligned `TITLE  value` lines, skipping fields
/// the record does not carry.
pub fn render_card(item: &Value, fields: &[Column]) -> String {
    let present: Vec<(&Column, String)> = fields
        .iter()
        .filter_map(|field| {
            let value = lookup(item, field.key);
            if is_non_empty(value) {
                Some((field, value_to_cell(value)))
            } else {
                None
            }
        })
        .collect();

    if present.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let title_width = present
        .iter()
        .map(|(field, _)| field.title.width())
        .max()
        .unwrap_or(0);

    present
        .iter()
        .map(|(field, value)| {
            let mut line = String::new();
            line.push_str(field.title);
            line.push_str(&" ".repeat(title_width - field.title.width()));
            line.push_str(GUTTER);
            line.push_str(value);
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(cells: Vec<String>, widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            line.push_str(GUTTER);
        }
        line.push_str(cell);
        let pad = widths[idx].saturating_sub(cell.width());
        line.push_str(&" ".repeat(pad));
    }
    line.trim_end().to_string()
}

/// Resolve a possibly dotted key path against a JSON object.
fn lookup<'a>(item: &'a Value, key: &str) -> &'a Value {
    let mut current = item;
    for part in key.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return &Value::Null,
        }
    }
    current
}

pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => items
            .iter()
            .map(value_to_cell)
            .collect::<Vec<_>>()
            .join(", "),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) | Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Compact RFC 3339 timestamps to `YYYY-MM-DD HH:MM` in the timestamp's own
/// offset. Anything unparseable passes through unchanged.
pub fn fmt_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn print_error(message: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{} {message}", "Error:".red().bold());
    } else {
        eprintln!("Error: {message}");
    }
}

pub fn print_hint(message: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{}", message.dim());
    } else {
        eprintln!("{message}");
    }
}

pub fn print_success(message: &str) {
    if std::io::stdout().is_terminal() {
        println!("{} {message}", "✓".green());
    } else {
        println!("{message}");
    }
}
