use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use loralog_store::MessageRecord;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Same shape as the `/api/messages` body.
#[derive(Serialize)]
struct MessagesOutput<'a> {
    count: usize,
    messages: &'a [MessageRecord],
}

#[derive(Serialize)]
struct LineOutput<'a> {
    index: u64,
    message: &'a str,
}

pub fn print_records(records: &[MessageRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessagesOutput {
                count: records.len(),
                messages: records,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "TIMESTAMP", "MESSAGE"]);
            for record in records {
                table.add_row(vec![
                    record.id.to_string(),
                    record.timestamp.clone(),
                    record.message.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "#{} [{}] {}",
                    record.id, record.timestamp, record.message
                );
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout().lock();
            for record in records {
                let _ = writeln!(out, "{}", record.message);
            }
            let _ = out.flush();
        }
    }
}

/// Print one framed line. Table output is not streamable, so it falls back
/// to the pretty form.
pub fn print_line(index: u64, line: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = LineOutput {
                index,
                message: line,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{index:>6}  {line}"),
        OutputFormat::Raw => {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}
