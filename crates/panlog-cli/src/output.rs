//! Terminal output for panlog (grouped views, tables, json)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use panlog_core::normalize::{ConfigEntry, SystemEntry};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables and grouped views (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    self.info("No data");
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
        }
    }
}

/// Render a provider timestamp (`YYYY/MM/DD HH:MM:SS`) for display.
///
/// Anything that does not parse is shown as-is.
pub fn format_time(raw: &str) -> String {
    match chrono::NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S") {
        Ok(parsed) => parsed.format("%b %d %Y %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Print grouped config entries, one group header per key.
///
/// With `nest_by_command` each group is further broken down by command type,
/// the default Admin → Command Type drill-down.
pub fn print_config_groups(
    ctx: &OutputContext,
    groups: &[(String, Vec<&ConfigEntry>)],
    nest_by_command: bool,
) {
    if groups.is_empty() {
        ctx.info("No config log entries cached; run `panlog sync` first");
        return;
    }
    for (key, members) in groups {
        print_group_header(key, members.len());
        if nest_by_command {
            for (command, entries) in
                panlog_core::group_by(members, |entry: &&ConfigEntry| entry.command_type.clone())
            {
                let label = if command.is_empty() { "(none)" } else { &command };
                println!("  {} ({})", label.bold(), entries.len());
                for entry in entries {
                    print_config_line(entry, "    ");
                }
            }
        } else {
            for entry in members {
                print_config_line(entry, "  ");
            }
        }
    }
}

fn print_config_line(entry: &ConfigEntry, indent: &str) {
    let line = format!(
        "{indent}{}  {}",
        format_time(&entry.received_time),
        entry.full_path
    );
    if entry.is_failed() {
        println!("{} {}", line, "FAILED".red().bold());
    } else {
        println!("{line}");
    }
}

/// Print grouped system entries.
pub fn print_system_groups(ctx: &OutputContext, groups: &[(String, Vec<&SystemEntry>)]) {
    if groups.is_empty() {
        ctx.info("No system log entries cached; run `panlog sync` first");
        return;
    }
    for (key, members) in groups {
        print_group_header(key, members.len());
        for entry in members {
            println!(
                "  {}  {:<18} {}",
                format_time(&entry.time),
                entry.event_id,
                entry.description
            );
        }
    }
}

/// Print grouped failed commits with full detail per entry.
pub fn print_failed_groups(ctx: &OutputContext, groups: &[(String, Vec<&&ConfigEntry>)]) {
    if groups.is_empty() {
        ctx.success("No failed commits in the cached config log");
        return;
    }
    for (key, members) in groups {
        print_group_header(key, members.len());
        for entry in members {
            println!(
                "  {}  {:<10} {} ({})",
                format_time(&entry.received_time),
                entry.command_type,
                entry.full_path,
                entry.result.red()
            );
        }
    }
}

fn print_group_header(key: &str, count: usize) {
    let label = if key.is_empty() { "(none)" } else { key };
    println!("\n{} ({count})", label.bold().cyan());
}

/// Search result display
#[derive(Debug, Tabled, Serialize)]
pub struct SearchRow {
    #[tabled(rename = "Received")]
    pub received: String,
    #[tabled(rename = "Admin")]
    pub admin: String,
    #[tabled(rename = "Command")]
    pub command: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Result")]
    pub result: String,
}

impl From<&ConfigEntry> for SearchRow {
    fn from(entry: &ConfigEntry) -> Self {
        Self {
            received: format_time(&entry.received_time),
            admin: entry.admin.clone(),
            command: entry.command_type.clone(),
            path: entry.full_path.clone(),
            result: entry.result.clone(),
        }
    }
}

/// Profile display for the profiles command
#[derive(Debug, Tabled, Serialize)]
pub struct ProfileRow {
    #[tabled(rename = "Active")]
    pub active: String,
    #[tabled(rename = "Host")]
    pub host: String,
    #[tabled(rename = "Id")]
    pub id: u64,
    #[tabled(rename = "Token")]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn provider_timestamps_are_reformatted() {
        assert_eq!(format_time("2024/03/01 16:20:05"), "Mar 01 2024 16:20:05");
    }

    #[test]
    fn unparseable_timestamps_pass_through() {
        assert_eq!(format_time("not a time"), "not a time");
        assert_eq!(format_time(""), "");
    }
}
