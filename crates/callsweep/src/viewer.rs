//! Interactive session browser for terminal runs.

use std::io::IsTerminal;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

use callsweep_records::{columns, SessionRecord};

/// Print the result table and, on a terminal, open a fuzzy picker for
/// per-session detail. Esc leaves the picker.
pub fn show(records: &[SessionRecord], full_detail: bool) -> Result<()> {
    if records.is_empty() {
        println!("{}", "No sessions matched.".dimmed());
        return Ok(());
    }

    print_table(records);

    if !std::io::stdout().is_terminal() {
        return Ok(());
    }

    let items: Vec<String> = records.iter().map(summary_line).collect();
    loop {
        let selection = dialoguer::FuzzySelect::new()
            .with_prompt("Select a session (Esc to quit)")
            .items(&items)
            .default(0)
            .interact_opt()?;
        match selection {
            Some(index) => print_record(&records[index], full_detail),
            None => break,
        }
    }

    Ok(())
}

fn print_table(records: &[SessionRecord]) {
    println!(
        "{:<24} {:<17} {:<17} {:<28} {:<28} {}",
        "SUBJECT".dimmed(),
        "START".dimmed(),
        "END".dimmed(),
        "FROM".dimmed(),
        "TO".dimmed(),
        "MEDIA".dimmed(),
    );

    for record in records {
        println!("{}", table_line(record));
    }
}

fn table_line(record: &SessionRecord) -> String {
    format!(
        "{:<24} {:<17} {:<17} {:<28} {:<28} {}",
        truncate(&record.subject_uri, 24),
        short_instant(record.start_time),
        short_instant(record.end_time),
        truncate(&record.from_uri, 28),
        truncate(&record.to_uri, 28),
        record.media_types,
    )
}

fn summary_line(record: &SessionRecord) -> String {
    format!(
        "{} | {} -> {} | {} | {}",
        short_instant(record.start_time),
        record.from_uri,
        record.to_uri,
        record.media_types,
        record.subject_uri,
    )
}

fn print_record(record: &SessionRecord, full_detail: bool) {
    println!();
    println!("{}", "=== Session Detail ===".bright_blue().bold());
    println!("{}  {}", "Session:".dimmed(), record.id);
    println!("{}  {}", "Subject:".dimmed(), record.subject_uri);
    if !record.subject_display_name.is_empty() {
        println!("{}  {}", "Name:".dimmed(), record.subject_display_name);
    }
    println!(
        "{}  {}",
        "Started:".dimmed(),
        columns::format_instant(record.start_time)
    );
    if record.end_time.is_some() {
        println!(
            "{}  {}",
            "Ended:".dimmed(),
            columns::format_instant(record.end_time)
        );
    } else {
        println!(
            "{}  {}",
            "Ended:".dimmed(),
            "never (incomplete)".bright_yellow()
        );
    }
    println!(
        "{}  {} -> {}",
        "Route:".dimmed(),
        record.from_uri,
        record.to_uri
    );
    if let Some(ref number) = record.from_number {
        println!("{}  {}", "From number:".dimmed(), number);
    }
    if let Some(ref number) = record.to_number {
        println!("{}  {}", "To number:".dimmed(), number);
    }
    if let Some(ref referred) = record.referred_by {
        println!("{}  {}", "Referred by:".dimmed(), referred);
    }
    println!(
        "{}  {} / {}",
        "Clients:".dimmed(),
        record.from_client_version,
        record.to_client_version
    );
    println!("{}  {}", "Media:".dimmed(), record.media_types);
    if full_detail && !record.detail.is_empty() {
        println!("{}", "Detail:".dimmed());
        if let Ok(json) = serde_json::to_string_pretty(&record.detail) {
            println!("{json}");
        }
    }
    println!();
}

fn short_instant(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut cut = max - 3;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}
