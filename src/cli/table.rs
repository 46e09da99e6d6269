//! Table formatting for CLI list commands
//!
//! Every list command renders through [`TableFormatter`] and every stat card
//! row through [`print_stat_cards`], so columns, colours and the pipe-friendly
//! formats behave the same for all entities.
//!
//! # Text Wrapping
//!
//! `TableConfig::with_wrap(width)` enables word-wrapped multi-line rows.
//! CSV, ID, and ShortId formats stay single-line for pipability.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::views::{StatCard, Tone};

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "5 material(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    let push_word = |word: &str, current: &mut String, lines: &mut Vec<String>| {
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_width).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                *current = piece;
            }
        }
    };

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if current.is_empty() {
            push_word(word, &mut current, &mut lines);
        } else if current.chars().count() + 1 + len <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            push_word(word, &mut current, &mut lines);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn styled(text: &str, tone: Tone) -> String {
    match tone {
        Tone::Neutral => text.to_string(),
        Tone::Good => style(text).green().to_string(),
        Tone::Warn => style(text).yellow().to_string(),
        Tone::Bad => style(text).red().bold().to_string(),
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Short ID reference (e.g., "NCR@1", cyan colored)
    ShortId(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Status word with a colour tone
    Status(String, Tone),
    /// Percentage with a colour tone
    Percent(f64, Tone),
    /// Boolean marker (✓ / -)
    Flag(bool),
    /// Timestamp displayed as local date
    Date(DateTime<Utc>),
    /// Calendar date
    Day(NaiveDate),
    /// Integer value
    Number(i64),
    /// Float value with precision
    Float(f64, usize),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Text cell that renders "-" when blank
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Optional text cell
    pub fn opt(value: Option<&str>) -> Self {
        value.map_or(CellValue::Empty, CellValue::text)
    }

    pub fn status(value: impl ToString, tone: Tone) -> Self {
        CellValue::Status(value.to_string(), tone)
    }

    pub fn count(n: usize) -> Self {
        CellValue::Number(n as i64)
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::ShortId(s) | CellValue::Text(s) | CellValue::Status(s, _) => s.clone(),
            CellValue::Percent(p, _) => format!("{:.1}%", p),
            CellValue::Flag(b) => (if *b { "yes" } else { "no" }).to_string(),
            CellValue::Date(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::Day(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        let pad = |s: String, visible: usize| {
            let fill = width.saturating_sub(visible);
            format!("{}{}", s, " ".repeat(fill))
        };
        match self {
            CellValue::ShortId(sid) => pad(style(sid).cyan().to_string(), sid.chars().count()),
            CellValue::Text(s) => {
                let t = truncate_str(s, width.saturating_sub(2));
                let n = t.chars().count();
                pad(t, n)
            }
            CellValue::Status(s, tone) => pad(styled(s, *tone), s.chars().count()),
            CellValue::Percent(p, tone) => {
                let s = format!("{:.1}%", p);
                let n = s.len();
                format!("{}{}", " ".repeat(width.saturating_sub(n)), styled(&s, *tone))
            }
            CellValue::Flag(b) => {
                if *b {
                    pad(style("✓").green().to_string(), 1)
                } else {
                    pad(style("-").dim().to_string(), 1)
                }
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Float(f, precision) => {
                format!("{:>width$.prec$}", f, width = width, prec = precision)
            }
            CellValue::Empty => pad(style("-").dim().to_string(), 1),
            other => {
                let raw = other.raw();
                let n = raw.chars().count();
                pad(raw, n)
            }
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Flag(b) => (if *b { "Y" } else { "N" }).to_string(),
            CellValue::Percent(p, _) => format!("{:.1}", p),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Flag(b) => (if *b { "✓" } else { "-" }).to_string(),
            CellValue::Status(s, Tone::Bad) => format!("**{}**", s),
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Flag(_) | CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    /// Marker shown after the short ID, e.g. "!" for a malformed payload
    pub flag: Option<&'static str>,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: String, short_id: String) -> Self {
        Self {
            short_id,
            full_id,
            flag: None,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn flagged(mut self, flag: &'static str) -> Self {
        self.flag = Some(flag);
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    fn label(&self) -> String {
        match self.flag {
            Some(flag) => format!("{}{}", self.short_id, flag),
            None => self.short_id.clone(),
        }
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    entity_prefix: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str, entity_prefix: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            entity_prefix,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Output rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => self.output_md(rows),
            OutputFormat::Id => self.output_ids(rows, false),
            OutputFormat::ShortId => self.output_ids(rows, true),
            _ => self.output_tsv(rows),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let short_width = rows
            .iter()
            .map(|r| r.label().chars().count())
            .max()
            .unwrap_or(5)
            .max(5);

        let mut widths = vec![short_width];
        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(|v| v.display_width())
                .max()
                .unwrap_or(0);
            let natural = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural.min(col.width));
        }
        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header = vec![format!(
            "{}{}",
            style("SHORT").bold().dim(),
            " ".repeat(widths[0].saturating_sub(5))
        )];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!(
                "{}{}",
                style(col.header).bold(),
                " ".repeat(width.saturating_sub(col.header.len()))
            ));
        }
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            if let Some(wrap_width) = self.config.wrap_width {
                self.output_tsv_row_wrapped(row, &widths, wrap_width);
            } else {
                self.output_tsv_row(row, &widths);
            }
        }

        if self.config.show_summary {
            println!();
            println!(
                "{} {}(s) found. Use {} to reference by short ID.",
                style(rows.len()).cyan(),
                self.entity_name,
                style(format!("{}@N", self.entity_prefix)).cyan()
            );
        }
    }

    fn output_tsv_row(&self, row: &TableRow, widths: &[usize]) {
        let label = row.label();
        let mut parts = vec![format!(
            "{}{}",
            style(&label).cyan(),
            " ".repeat(widths[0].saturating_sub(label.chars().count()))
        )];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            match row.get(col.key) {
                Some(value) => parts.push(value.format_tsv(*width)),
                None => parts.push(CellValue::Empty.format_tsv(*width)),
            }
        }
        println!("{}", parts.join(" "));
    }

    fn output_tsv_row_wrapped(&self, row: &TableRow, widths: &[usize], wrap_width: usize) {
        let mut wrapped: Vec<Vec<String>> = vec![vec![row.label()]];
        for col in self.columns {
            let lines = match row.get(col.key) {
                Some(CellValue::Text(s)) => wrap_text(s, wrap_width),
                Some(value) => vec![value.raw()],
                None => vec!["-".to_string()],
            };
            wrapped.push(lines);
        }

        let max_lines = wrapped.iter().map(|c| c.len()).max().unwrap_or(1);
        for line_idx in 0..max_lines {
            let parts: Vec<String> = wrapped
                .iter()
                .enumerate()
                .map(|(col_idx, lines)| {
                    let width = widths.get(col_idx).copied().unwrap_or(10);
                    let content = lines.get(line_idx).map(String::as_str).unwrap_or("");
                    let fill = " ".repeat(width.saturating_sub(content.chars().count()));
                    if col_idx == 0 {
                        format!("{}{}", style(content).cyan(), fill)
                    } else {
                        format!("{}{}", content, fill)
                    }
                })
                .collect();
            println!("{}", parts.join(" "));
        }

        if max_lines > 1 {
            println!();
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let mut headers = vec!["short_id".to_string(), "id".to_string()];
        headers.extend(self.columns.iter().map(|c| c.key.to_string()));
        println!("{}", headers.join(","));

        for row in rows {
            let mut values = vec![escape_csv(&row.short_id), escape_csv(&row.full_id)];
            for col in self.columns {
                values.push(row.get(col.key).map(CellValue::format_csv).unwrap_or_default());
            }
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut headers = vec!["Short".to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));
        println!("| {} |", headers.join(" | "));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let mut values = vec![row.label()];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow], use_short: bool) {
        for row in rows {
            if use_short {
                println!("{}", row.short_id);
            } else {
                println!("{}", row.full_id);
            }
        }
    }
}

/// Render stat cards as a one-row table: labels above values
pub fn render_stat_cards(cards: &[StatCard], markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(cards.iter().map(|c| c.label.clone()));
    builder.push_record(cards.iter().map(|c| match (c.tone, markdown) {
        (Tone::Bad, true) => format!("**{}**", c.value),
        (Tone::Bad, false) | (Tone::Warn, false) => format!("{} !", c.value),
        _ => c.value.clone(),
    }));
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    table.to_string()
}

/// Print stat cards above a list, when the format is meant for humans
pub fn print_stat_cards(cards: &[StatCard], format: OutputFormat) {
    if cards.is_empty() {
        return;
    }
    match format {
        OutputFormat::Auto | OutputFormat::Tsv => {
            println!("{}", render_stat_cards(cards, false));
            println!();
        }
        OutputFormat::Md => {
            println!("{}", render_stat_cards(cards, true));
            println!();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(matches!(CellValue::text("  "), CellValue::Empty));
        assert!(matches!(CellValue::opt(None), CellValue::Empty));
        assert_eq!(CellValue::Empty.format_md(), "-");
        assert_eq!(CellValue::Empty.format_csv(), "");
    }

    #[test]
    fn test_status_and_percent() {
        let cell = CellValue::status("CLOSED", Tone::Good);
        assert_eq!(cell.format_csv(), "CLOSED");
        assert_eq!(CellValue::status("FAIL", Tone::Bad).format_md(), "**FAIL**");
        assert_eq!(CellValue::Percent(12.345, Tone::Warn).format_csv(), "12.3");
        assert_eq!(CellValue::Percent(0.0, Tone::Good).raw(), "0.0%");
    }

    #[test]
    fn test_flag_formats() {
        assert_eq!(CellValue::Flag(true).format_csv(), "Y");
        assert_eq!(CellValue::Flag(false).format_md(), "-");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b|c".to_string());
        assert_eq!(cell.format_md(), "a\\|b\\|c");
    }

    #[test]
    fn test_table_row_builder() {
        let row = TableRow::new("MDR-123".to_string(), "MDR@1".to_string())
            .cell("joint", CellValue::text("J1"))
            .flagged("!");
        assert_eq!(row.label(), "MDR@1!");
        assert!(row.get("joint").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("hello", 20), vec!["hello"]);
        assert_eq!(wrap_text("hello world foo bar", 11), vec!["hello world", "foo bar"]);
        let long = wrap_text("supercalifragilisticexpialidocious", 10);
        assert_eq!(long, vec!["supercalif", "ragilistic", "expialidoc", "ious"]);
    }

    #[test]
    fn test_stat_cards_render_labels_and_values() {
        let cards = vec![
            StatCard::count("Total", 4),
            StatCard::percent("Pass rate", 50.0).tone(Tone::Bad),
        ];
        let plain = render_stat_cards(&cards, false);
        assert!(plain.contains("Total"));
        assert!(plain.contains("50.0% !"));
        let md = render_stat_cards(&cards, true);
        assert!(md.contains("| Total"));
        assert!(md.contains("**50.0%**"));
    }

    #[test]
    fn test_table_config_wrap() {
        assert!(TableConfig::default().wrap_width.is_none());
        assert_eq!(TableConfig::with_wrap(40).wrap_width, Some(40));
    }
}
