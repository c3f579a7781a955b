use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub fn print_rows(columns: &[String], rows: &[Vec<String>], format: &OutputFormat) {
    println!("{}", render_rows(columns, rows, format));
}

pub fn render_rows(columns: &[String], rows: &[Vec<String>], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(columns);
            for row in rows {
                table.add_row(row);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let objects: Vec<Value> = rows
                .iter()
                .map(|row| {
                    let map: Map<String, Value> = columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().map(Value::String))
                        .collect();
                    Value::Object(map)
                })
                .collect();
            serde_json::to_string_pretty(&objects).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => {
            let mut lines = vec![csv_line(columns)];
            lines.extend(rows.iter().map(|row| csv_line(row)));
            lines.join("\n")
        }
    }
}

/// Print a single status line, or a JSON object in JSON mode.
pub fn print_status(format: &OutputFormat, text: &str, fields: Value) {
    match format {
        OutputFormat::Json => println!("{fields}"),
        _ => println!("{text}"),
    }
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| {
            if cell.contains([',', '"', '\n']) {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
