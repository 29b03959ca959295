use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use stream_core::FileAnalysis;
use stream_model::{
    BatchSummary, DatePattern, ProcessingResult, ProcessingStatus, QualityDimension,
    QualityScoreResult, Severity, TextEncoding,
};
use stream_platforms::PlatformRegistry;

pub fn print_batch_summary(summary: &BatchSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Platform"),
        header_cell("Status"),
        header_cell("Records"),
        header_cell("Failed"),
        header_cell("Score"),
        header_cell("Quality"),
    ]);
    apply_table_style(&mut table, 140);
    for index in 3..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 6, CellAlignment::Center);

    for result in &summary.results {
        table.add_row(vec![
            Cell::new(file_name(&result.file_path)),
            optional_cell(result.platform_code.as_deref()),
            status_cell(result.status),
            count_cell(result.records_processed, Color::Reset),
            count_cell(result.records_failed, Color::Red),
            score_cell(result.quality_score),
            passed_cell(result.quality_passed),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} files", summary.files_total)).add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} ok / {} failed",
            summary.succeeded, summary.failed
        ))
        .add_attribute(Attribute::Bold),
        Cell::new(summary.records_total).add_attribute(Attribute::Bold),
        dim_cell("-"),
        score_cell(summary.average_quality_score).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    if summary.skipped_duplicates > 0 {
        println!(
            "Skipped {} file(s) whose content was already processed.",
            summary.skipped_duplicates
        );
    }
    let failures: Vec<&ProcessingResult> = summary
        .results
        .iter()
        .filter(|result| result.status == ProcessingStatus::Failed)
        .collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for result in failures {
            eprintln!(
                "- {}: {}",
                result.file_path.display(),
                result.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

pub fn print_inspection(path: &Path, analysis: &FileAnalysis, max_issues: usize) {
    println!("File: {}", path.display());
    println!(
        "Platform: {} ({}, confidence {:.2})",
        analysis.platform_code(),
        analysis.detection_method,
        analysis.detection_confidence
    );
    println!("Encoding: {}", analysis.parsed.encoding);
    println!("Content hash: {}", analysis.content_hash);
    println!(
        "Rows: {} parsed, {} skipped, {} with unparsed dates",
        analysis.parsed.records.len(),
        analysis.parsed.rows_skipped,
        analysis.parsed.degraded_records()
    );

    print_score_table(&analysis.quality);
    print_issue_table(&analysis.quality, max_issues);
}

fn print_score_table(quality: &QualityScoreResult) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Dimension"), header_cell("Score")]);
    apply_table_style(&mut table, 60);
    align_column(&mut table, 1, CellAlignment::Right);
    for dimension in [
        QualityDimension::Completeness,
        QualityDimension::Validity,
        QualityDimension::Consistency,
    ] {
        table.add_row(vec![
            Cell::new(dimension.label()),
            score_cell(Some(quality.dimension_scores.get(dimension))),
        ]);
    }
    table.add_row(vec![
        Cell::new("Overall")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        score_cell(Some(quality.overall_score)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!(
        "{} of {} rows valid",
        quality.records_valid, quality.records_total
    );
}

fn print_issue_table(quality: &QualityScoreResult, max_issues: usize) {
    if quality.issues.is_empty() {
        println!("No issues.");
        return;
    }

    let counts: Vec<String> = Severity::all()
        .iter()
        .map(|severity| format!("{} {}", quality.count_by_severity(*severity), severity))
        .collect();
    println!();
    println!("Issues: {}", counts.join(", "));

    let mut issues: Vec<_> = quality.issues.iter().collect();
    issues.sort_by_key(|issue| std::cmp::Reverse(issue.severity.rank()));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Line"),
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Field"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table, 160);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Center);
    for issue in issues.iter().take(max_issues) {
        table.add_row(vec![
            issue
                .row_index
                .map_or_else(|| dim_cell("-"), Cell::new),
            severity_cell(issue.severity),
            Cell::new(issue.kind.code()),
            optional_cell(issue.field.map(|field| field.name())),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
    if issues.len() > max_issues {
        println!("... {} more issue(s) not shown", issues.len() - max_issues);
    }
}

pub fn print_platforms(registry: &PlatformRegistry) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Name"),
        header_cell("Delimiter"),
        header_cell("Quoting"),
        header_cell("Date patterns"),
        header_cell("Encodings"),
        header_cell("Metric"),
    ]);
    apply_table_style(&mut table, 160);
    align_column(&mut table, 2, CellAlignment::Center);
    for profile in registry.iter() {
        let patterns: Vec<&str> = profile
            .date_patterns
            .iter()
            .map(DatePattern::label)
            .collect();
        let encodings: Vec<&str> = profile
            .encoding_chain()
            .iter()
            .map(TextEncoding::label)
            .collect();
        table.add_row(vec![
            Cell::new(&profile.code)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&profile.display_name),
            Cell::new(delimiter_label(profile.delimiter)),
            Cell::new(profile.quoting.label()),
            Cell::new(patterns.join(", ")),
            Cell::new(encodings.join(" > ")),
            Cell::new(&profile.metric_type),
        ]);
    }
    println!("{table}");
}

fn delimiter_label(delimiter: char) -> String {
    match delimiter {
        '\t' => "tab".to_string(),
        ' ' => "space".to_string(),
        other => other.to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn apply_table_style(table: &mut Table, width: u16) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: ProcessingStatus) -> Cell {
    match status {
        ProcessingStatus::Completed => Cell::new("completed").fg(Color::Green),
        ProcessingStatus::Duplicate => Cell::new("duplicate").fg(Color::DarkGrey),
        ProcessingStatus::Failed => Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Critical => Cell::new("CRITICAL")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Error => Cell::new("ERROR").fg(Color::Red),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => dim_cell("INFO"),
    }
}

fn score_cell(score: Option<f64>) -> Cell {
    match score {
        Some(value) if value >= 90.0 => Cell::new(format!("{value:.1}")).fg(Color::Green),
        Some(value) if value >= 70.0 => Cell::new(format!("{value:.1}")).fg(Color::Yellow),
        Some(value) => Cell::new(format!("{value:.1}")).fg(Color::Red),
        None => dim_cell("-"),
    }
}

fn passed_cell(passed: Option<bool>) -> Cell {
    match passed {
        Some(true) => Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Some(false) => Cell::new("below threshold").fg(Color::Yellow),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
