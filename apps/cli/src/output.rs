//! Output formatting utilities

use crate::OutputFormat;
use serde::Serialize;

/// Print output in the specified format
pub fn print_output<T: Serialize + std::fmt::Display>(
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Human => {
            println!("{}", value);
        }
    }
    Ok(())
}

/// Format a byte count as human-readable
pub fn format_bytes(bytes: usize) -> String {
    human_bytes::human_bytes(bytes as f64)
}

/// Format a duration in seconds as human-readable
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}{}h {}m {}s", sign, hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}{}m {}s", sign, minutes, secs)
    } else {
        format!("{}{}s", sign, secs)
    }
}
