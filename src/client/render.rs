//! Plain-text rendering of the drug table for terminals

use chrono::{DateTime, Utc};
use colored::Colorize;

use super::state::{LoadPhase, TableState};
use crate::model::{DrugView, SortDirection};
use crate::services::table_config::ColumnConfig;

/// Pixels per terminal cell when translating configured widths
const PIXELS_PER_CHAR: u32 = 10;
const MIN_COLUMN_CHARS: usize = 4;

pub fn format_launch_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn column_chars(column: &ColumnConfig) -> usize {
    let from_width = (column.width / PIXELS_PER_CHAR) as usize;
    from_width
        .max(column.label.chars().count() + 2)
        .max(MIN_COLUMN_CHARS)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    " ".repeat(width.saturating_sub(len))
}

pub fn cell_value(drug: &DrugView, key: &str) -> String {
    match key {
        "id" => drug.id.to_string(),
        "code" => drug.code.clone(),
        "genericName" => drug.generic_name.clone(),
        "brandName" => drug.brand_name.clone(),
        "company" => drug.company.clone(),
        "launchDate" => format_launch_date(&drug.launch_date),
        "displayName" => drug.display_name.clone(),
        "sequentialId" => drug
            .sequential_id
            .map(|n| n.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn header_line(state: &TableState, columns: &[&ColumnConfig]) -> String {
    let sort = &state.query().sort;
    let mut line = String::new();
    for column in columns {
        let width = column_chars(column);
        let mut label = column.label.clone();
        if column.sortable && column.key == sort.field.as_str() {
            label.push(' ');
            label.push(match sort.direction {
                SortDirection::Asc => '^',
                SortDirection::Desc => 'v',
            });
        }
        let label = truncate(&label, width);
        line.push_str(&format!("{}{} ", label.bold(), pad(&label, width)));
    }
    line.trim_end().to_string()
}

fn row_line(drug: &DrugView, columns: &[&ColumnConfig]) -> String {
    let mut line = String::new();
    for column in columns {
        let width = column_chars(column);
        let text = truncate(&cell_value(drug, &column.key), width);
        let styled = if column.clickable {
            text.underline().to_string()
        } else {
            text.clone()
        };
        line.push_str(&format!("{}{} ", styled, pad(&text, width)));
    }
    line.trim_end().to_string()
}

pub fn render(state: &TableState) -> String {
    let mut out = Vec::new();

    let filter = match &state.query().company {
        Some(company) => format!("Company: {}", company),
        None => "Company: All companies".to_string(),
    };
    out.push(format!("{}  ({} companies)", filter, state.companies().len()));

    match state.phase() {
        LoadPhase::Error(message) => {
            out.push(format!("{} {}", "Error:".red().bold(), message.red()));
            out.push("(press d to dismiss)".dimmed().to_string());
        }
        LoadPhase::Loading => out.push("Loading...".yellow().to_string()),
        LoadPhase::Filtering => out.push("Loading...".yellow().to_string()),
        LoadPhase::Ready => {}
    }

    let Some(config) = state.config() else {
        return out.join("\n");
    };
    let columns: Vec<&ColumnConfig> = config.visible_columns().collect();
    let total_width: usize = columns.iter().map(|c| column_chars(c) + 1).sum();

    out.push(header_line(state, &columns));
    out.push("-".repeat(total_width.saturating_sub(1)));
    if state.drugs().is_empty() && state.pagination().is_some() {
        out.push("No drugs found".dimmed().to_string());
    }
    for drug in state.drugs() {
        out.push(row_line(drug, &columns));
    }

    if let Some(p) = state.pagination() {
        out.push(format!(
            "Page {} of {} ({} drugs)",
            p.current_page, p.total_pages, p.total_count
        ));
    }

    out.join("\n")
}
