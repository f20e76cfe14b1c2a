use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gedcom_types::{FileSummary, GedcomDocument, RecordNode};

use gedcom_extract::builder::{self, DocumentBuilder};
use gedcom_extract::error::AppError;
use gedcom_extract::period::{CaseMatching, PeriodTable};
use gedcom_extract::{extract, scanner};

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser)]
#[command(
    name = "gedcom_extract",
    about = "GEDCOM hierarchy and date-period extractor"
)]
struct Cli {
    /// Directory for JSON output files
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Match period keywords with exact casing ("abt" no longer means ABT)
    #[arg(long, global = true)]
    case_sensitive: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the record tree of one file → output/<name>.json
    Parse {
        file: PathBuf,
    },
    /// Build every *.ged file under a directory → output/summary.json
    Scan {
        /// Directory to search
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Print the record tree of one file
    Outline {
        file: PathBuf,
    },
    /// Extract the period qualifier from a date, e.g. "BET 1900 AND 1905"
    Date {
        text: Vec<String>,
    },
    /// Print the period keyword table in lookup order
    Rules,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let case = if cli.case_sensitive {
        CaseMatching::Sensitive
    } else {
        CaseMatching::Insensitive
    };
    let table = PeriodTable::standard_with(case);

    let result = match cli.command {
        Some(Command::Parse { file }) => run_parse(&file, &cli.output_dir, table),
        Some(Command::Scan { root }) => run_scan(&root, &cli.output_dir, table),
        Some(Command::Outline { file }) => run_outline(&file, table),
        Some(Command::Date { text }) => run_date(&text, table),
        Some(Command::Rules) => {
            print!("{}", format_rules(table));
            Ok(())
        }
        // Default: scan the current directory
        None => run_scan(Path::new("."), &cli.output_dir, table),
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  FILE HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn read_file(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, data: &T) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|source| AppError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(&path, &json).map_err(|source| AppError::Write {
        path: path.clone(),
        source,
    })?;
    log::info!("  {} ({} bytes)", path.display(), json.len());
    Ok(())
}

fn output_name(file: &Path) -> String {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    format!("{stem}.json")
}

fn log_diagnostics(file: &str, doc: &GedcomDocument) {
    if doc.diagnostics.is_empty() {
        return;
    }
    log::warn!("{file}: {} diagnostic(s)", doc.diagnostics.len());
    for d in doc.diagnostics.iter().take(10) {
        log::warn!("  line {}: {:?}", d.line, d.kind);
    }
    if doc.diagnostics.len() > 10 {
        log::warn!("  ... and {} more", doc.diagnostics.len() - 10);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  PARSE MODE: one file → output/<name>.json
// ═══════════════════════════════════════════════════════════════════════

fn run_parse(file: &Path, output_dir: &Path, table: &PeriodTable) -> Result<(), AppError> {
    let content = read_file(file)?;
    let doc = builder::build_document(&content, table);
    let display = file.display().to_string();

    let summary = FileSummary::from_document(&display, &doc);
    log::info!(
        "{}: {} lines, {} records, {} nodes, {} dates",
        display,
        summary.line_count,
        doc.records.len(),
        summary.node_count,
        summary.date_count
    );
    log_diagnostics(&display, &doc);

    write_json(output_dir, &output_name(file), &doc)
}

// ═══════════════════════════════════════════════════════════════════════
//  SCAN MODE: every *.ged under a root → statistics + summary.json
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, serde::Serialize)]
struct ScanTotals {
    files: usize,
    unreadable: Vec<String>,
    record_counts: BTreeMap<String, usize>,
    period_counts: BTreeMap<String, usize>,
    date_count: usize,
    diagnostic_count: usize,
}

impl ScanTotals {
    fn add(&mut self, summary: &FileSummary) {
        self.files += 1;
        self.date_count += summary.date_count;
        self.diagnostic_count += summary.diagnostic_count;
        for (tag, count) in &summary.record_counts {
            *self.record_counts.entry(tag.clone()).or_insert(0) += count;
        }
        for (period, count) in &summary.period_counts {
            *self.period_counts.entry(period.clone()).or_insert(0) += count;
        }
    }
}

fn run_scan(root: &Path, output_dir: &Path, table: &PeriodTable) -> Result<(), AppError> {
    log::info!("Scanning for GEDCOM files under: {}", root.display());

    // Phase 1: discover files
    let files = scanner::scan_corpus(root, Some(output_dir));
    log::info!("Found {} GEDCOM files", files.len());

    // Phase 2: build each file with one reusable session
    let mut session = DocumentBuilder::new(table);
    let mut summaries = Vec::new();
    let mut totals = ScanTotals::default();

    for file in &files {
        let content = match read_file(&file.path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{e}");
                totals.unreadable.push(file.relative.clone());
                continue;
            }
        };
        let doc = session.build(&content);
        log_diagnostics(&file.relative, &doc);

        let summary = FileSummary::from_document(&file.relative, &doc);
        totals.add(&summary);
        summaries.push(summary);
    }

    // ── Print statistics ───────────────────────────────────────────
    log::info!("══════════════════════════════════════════");
    log::info!("  GEDCOM STATISTICS");
    log::info!("══════════════════════════════════════════");

    log::info!("Records by tag:");
    let mut by_tag: Vec<_> = totals.record_counts.iter().collect();
    by_tag.sort_by_key(|(_, c)| std::cmp::Reverse(**c));
    for (tag, count) in &by_tag {
        log::info!("  {tag}: {count}");
    }

    log::info!("Dates by period ({} total):", totals.date_count);
    for (period, count) in &totals.period_counts {
        log::info!("  {period}: {count}");
    }

    if totals.diagnostic_count > 0 {
        log::info!("Diagnostics: {}", totals.diagnostic_count);
    }

    if !totals.unreadable.is_empty() {
        log::warn!("Unreadable files ({} total):", totals.unreadable.len());
        for f in totals.unreadable.iter().take(30) {
            log::warn!("  {f}");
        }
    }

    #[derive(serde::Serialize)]
    struct SummaryOutput {
        totals: ScanTotals,
        files: Vec<FileSummary>,
    }
    write_json(
        output_dir,
        "summary.json",
        &SummaryOutput {
            totals,
            files: summaries,
        },
    )
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTLINE MODE: print the record tree with box-drawing characters
// ═══════════════════════════════════════════════════════════════════════

fn run_outline(file: &Path, table: &PeriodTable) -> Result<(), AppError> {
    let content = read_file(file)?;
    let doc = builder::build_document(&content, table);
    log_diagnostics(&file.display().to_string(), &doc);
    print!("{}", render_outline(&doc));
    Ok(())
}

/// Format a node line: "@I1@ INDI", "DATE ABT 1900 [About: 1900]".
fn format_node_line(node: &RecordNode) -> String {
    let mut out = String::new();
    if let Some(xref) = &node.xref {
        out.push_str(xref);
        out.push(' ');
    }
    out.push_str(&node.tag);
    if let Some(value) = &node.value {
        out.push(' ');
        out.push_str(&value.replace('\n', "\\n"));
    }
    if let Some(date) = &node.date
        && date.period != gedcom_types::Period::None
    {
        out.push_str(&format!(" [{}: {}]", date.period.as_str(), date.residual));
    }
    out
}

fn render_outline(doc: &GedcomDocument) -> String {
    let mut out = String::new();
    for record in &doc.records {
        out.push_str(&format_node_line(record));
        out.push('\n');
        render_children(&record.children, "", &mut out);
    }
    out
}

/// Recursively render children; `prefix` is the accumulated line-drawing
/// prefix for the current depth.
fn render_children(children: &[RecordNode], prefix: &str, out: &mut String) {
    let total = children.len();
    for (i, child) in children.iter().enumerate() {
        let is_last = i == total - 1;
        let connector = if is_last { "└─ " } else { "├─ " };
        let continuation = if is_last { "   " } else { "│  " };

        out.push_str(&format!("{}{}{}\n", prefix, connector, format_node_line(child)));
        let sub_prefix = format!("{}{}", prefix, continuation);
        render_children(&child.children, &sub_prefix, out);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DATE MODE: period extraction on one string
// ═══════════════════════════════════════════════════════════════════════

fn run_date(text_args: &[String], table: &PeriodTable) -> Result<(), AppError> {
    let raw = text_args.join(" ");
    let result = extract::extract(&raw, table);

    #[derive(serde::Serialize)]
    struct DateOutput<'a> {
        input: &'a str,
        #[serde(flatten)]
        result: extract::ExtractionResult,
    }

    let json = serde_json::to_string_pretty(&DateOutput {
        input: &raw,
        result,
    })?;
    println!("{json}");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  RULES MODE: the keyword table
// ═══════════════════════════════════════════════════════════════════════

fn format_rules(table: &PeriodTable) -> String {
    let mut out = String::new();
    let case = match table.case() {
        CaseMatching::Insensitive => "case-insensitive",
        CaseMatching::Sensitive => "case-sensitive",
    };
    out.push_str(&format!(
        "# {} rules, {case}, first match wins\n",
        table.rules().len()
    ));
    for (i, rule) in table.rules().iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<12} {:<8} {}\n",
            i + 1,
            rule.match_text,
            rule.position.as_str(),
            rule.target.as_str()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_outline_connectors() {
        let doc = builder::build_document(
            "0 @I1@ INDI\n1 NAME Ann /Lee/\n1 BIRT\n2 DATE ABT 1900\n2 PLAC Leeds\n0 TRLR\n",
            PeriodTable::standard(),
        );
        let expected = "\
@I1@ INDI
├─ NAME Ann /Lee/
└─ BIRT
   ├─ DATE ABT 1900 [About: 1900]
   └─ PLAC Leeds
TRLR
";
        assert_eq!(render_outline(&doc), expected);
    }

    #[test]
    fn test_format_node_line_escapes_newlines() {
        let doc = builder::build_document("0 NOTE a\n1 CONT b\n", PeriodTable::standard());
        assert_eq!(format_node_line(&doc.records[0]), "NOTE a\\nb");
    }

    #[test]
    fn test_exact_date_has_no_bracket() {
        let doc = builder::build_document("0 DATE 1900\n", PeriodTable::standard());
        assert_eq!(format_node_line(&doc.records[0]), "DATE 1900");
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name(Path::new("data/smith.ged")), "smith.json");
        assert_eq!(output_name(Path::new("")), "document.json");
    }

    #[test]
    fn test_format_rules_lists_in_order() {
        let text = format_rules(PeriodTable::standard());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("# 12 rules, case-insensitive"));
        assert_eq!(lines[1], " 1. ABOUT        prefix   About");
        assert_eq!(lines[2], " 2. ABT          prefix   About");
    }

    #[test]
    fn test_scan_totals_accumulate() {
        let doc = builder::build_document(
            "0 @I1@ INDI\n1 BIRT\n2 DATE BEF 1900\n0 @I2@ INDI\n",
            PeriodTable::standard(),
        );
        let summary = FileSummary::from_document("a.ged", &doc);
        let mut totals = ScanTotals::default();
        totals.add(&summary);
        totals.add(&summary);
        assert_eq!(totals.files, 2);
        assert_eq!(totals.record_counts.get("INDI"), Some(&4));
        assert_eq!(totals.period_counts.get("Before"), Some(&2));
    }

    #[test]
    fn test_parse_writes_document_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("tiny.ged");
        std::fs::write(&file, "0 HEAD\n1 DATE EST 1750\n").unwrap();
        let out_dir = tmp.path().join("out");

        run_parse(&file, &out_dir, PeriodTable::standard()).unwrap();

        let json = std::fs::read_to_string(out_dir.join("tiny.json")).unwrap();
        let doc: GedcomDocument = serde_json::from_str(&json).unwrap();
        let date = doc.records[0].children[0].date.as_ref().unwrap();
        assert_eq!(date.period, gedcom_types::Period::Estimated);
        assert_eq!(date.residual, "1750");
    }

    #[test]
    fn test_scan_writes_summary() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.ged"), "0 @I1@ INDI\n1 DEAT\n2 DATE AFT 1800\n")
            .unwrap();
        let out_dir = tmp.path().join("output");

        run_scan(tmp.path(), &out_dir, PeriodTable::standard()).unwrap();

        let json = std::fs::read_to_string(out_dir.join("summary.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["files"], 1);
        assert_eq!(value["totals"]["period_counts"]["After"], 1);
        assert_eq!(value["files"][0]["file"], "a.ged");
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let err = read_file(Path::new("/definitely/not/here.ged")).unwrap_err();
        assert!(matches!(err, AppError::Read { .. }));
    }
}
