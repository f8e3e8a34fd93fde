//! xmlfmt -- format XML and DTD files.
//!
//! Prints the formatted document, rewrites files in place, checks whether
//! files are formatted, or prints the edit list as JSON.

use std::fs;
use std::io::{self, Read, Write};
use std::ops::Range;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use xmlfmt::encoding;
use xmlfmt::format::{
    apply_edits, CancelToken, EmptyElements, EnforceQuoteStyle, FormattingOptions, QuoteStyle, SchemaLocationSplit,
    XmlFormatter,
};
use xmlfmt::parser::{parse_str_with_options, ParseOptions};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmlfmt -- format XML and DTD files with minimal edits.
///
/// Settings are read from `--config` (a JSON object with camelCase keys)
/// and then overridden by flags.
#[derive(Parser, Debug)]
#[command(name = "xmlfmt", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Files to format (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Log formatting decisions and parser recoveries to stderr.
    #[arg(long)]
    verbose: bool,

    // -- Settings ----------------------------------------------------------
    /// JSON file with formatting settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Width of one indentation step.
    #[arg(long, value_name = "N")]
    tab_size: Option<usize>,

    /// Indent with tabs instead of spaces.
    #[arg(long)]
    use_tabs: bool,

    /// Maximum line width for text wrapping (0 disables wrapping).
    #[arg(long, value_name = "N")]
    max_line_width: Option<usize>,

    /// Put every attribute of a multi-attribute tag on its own line.
    #[arg(long)]
    split_attributes: bool,

    /// Join the lines of text content.
    #[arg(long)]
    join_content_lines: bool,

    /// Join the lines of comments.
    #[arg(long)]
    join_comment_lines: bool,

    /// Join the lines of CDATA sections.
    #[arg(long = "join-cdata-lines")]
    join_cdata_lines: bool,

    /// How to rewrite empty elements.
    #[arg(long, value_enum, value_name = "POLICY")]
    empty_elements: Option<EmptyElements>,

    /// Write `<a />` rather than `<a/>`.
    #[arg(long)]
    space_before_empty_close_tag: bool,

    /// Preferred attribute value delimiter.
    #[arg(long, value_enum, value_name = "STYLE")]
    quote_style: Option<QuoteStyle>,

    /// Rewrite attribute value delimiters to the preferred quote style.
    #[arg(long)]
    enforce_quotes: bool,

    /// End every document with a line break.
    #[arg(long)]
    insert_final_newline: bool,

    /// Remove spaces and tabs at the end of lines.
    #[arg(long)]
    trim_trailing_whitespace: bool,

    /// Leave comments exactly as written.
    #[arg(long)]
    no_format_comments: bool,

    /// Put `xsi:schemaLocation` locations on separate lines.
    #[arg(long, value_enum, value_name = "POLICY")]
    xsi_schema_location_split: Option<SchemaLocationSplit>,

    // -- Input -------------------------------------------------------------
    /// Treat input as a standalone DTD (implied for `.dtd` files).
    #[arg(long)]
    dtd: bool,

    /// Only format the byte range START..END.
    #[arg(long, value_name = "START..END", value_parser = parse_range)]
    range: Option<Range<usize>>,

    // -- Output ------------------------------------------------------------
    /// Rewrite files in place instead of printing them.
    #[arg(long, conflicts_with_all = ["check", "edits"])]
    write: bool,

    /// Exit with status 1 if any file is not formatted.
    #[arg(long, conflicts_with = "edits")]
    check: bool,

    /// Print the edit list as JSON instead of the formatted text.
    #[arg(long)]
    edits: bool,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_CHECK_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("xmlfmt: {e:#}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let formatter = XmlFormatter::new(options);

    let mut worst_exit = EXIT_SUCCESS;
    for file in &cli.files {
        let exit = match process_file(&cli, &formatter, file) {
            Ok(changed) if changed && cli.check => EXIT_CHECK_FAILED,
            Ok(_) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("{file}: {e:#}");
                EXIT_ERROR
            }
        };
        worst_exit = worst_exit.max(exit);
    }
    ExitCode::from(worst_exit)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

/// Builds the settings: defaults, then `--config`, then flags.
fn load_options(cli: &Cli) -> Result<FormattingOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&json).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => FormattingOptions::default(),
    };
    if let Some(size) = cli.tab_size {
        options.tab_size = size;
    }
    if cli.use_tabs {
        options.insert_spaces = false;
    }
    if let Some(width) = cli.max_line_width {
        options.max_line_width = width;
    }
    options.split_attributes |= cli.split_attributes;
    options.join_content_lines |= cli.join_content_lines;
    options.join_comment_lines |= cli.join_comment_lines;
    options.join_cdata_lines |= cli.join_cdata_lines;
    options.space_before_empty_close_tag |= cli.space_before_empty_close_tag;
    options.insert_final_newline |= cli.insert_final_newline;
    options.trim_trailing_whitespace |= cli.trim_trailing_whitespace;
    if cli.no_format_comments {
        options.format_comments = false;
    }
    if let Some(split) = cli.xsi_schema_location_split {
        options.xsi_schema_location_split = split;
    }
    if let Some(policy) = cli.empty_elements {
        options.empty_elements = policy;
    }
    if let Some(style) = cli.quote_style {
        options.quote_style = style;
    }
    if cli.enforce_quotes {
        options.enforce_quote_style = EnforceQuoteStyle::Preferred;
    }
    debug!(?options, "settings");
    Ok(options)
}

fn parse_range(value: &str) -> Result<Range<usize>> {
    let Some((start, end)) = value.split_once("..") else {
        bail!("expected START..END, got `{value}`");
    };
    let start: usize = start.trim().parse().context("invalid range start")?;
    let end: usize = end.trim().parse().context("invalid range end")?;
    if start > end {
        bail!("range start {start} is after its end {end}");
    }
    Ok(start..end)
}

// ---------------------------------------------------------------------------
// File processing
// ---------------------------------------------------------------------------

/// Formats one file. Returns whether formatting changes it.
fn process_file(cli: &Cli, formatter: &XmlFormatter, filename: &str) -> Result<bool> {
    let bytes = read_input(filename).context("failed to read")?;
    let decoded = encoding::decode(&bytes)?;
    let dtd = cli.dtd || filename.ends_with(".dtd");
    let doc = parse_str_with_options(&decoded.text, &ParseOptions::default().dtd(dtd));
    for diagnostic in &doc.diagnostics {
        debug!(file = filename, "{diagnostic}");
    }

    let edits = formatter.format(&doc, cli.range.clone(), &CancelToken::new())?;
    let changed = !edits.is_empty();
    debug!(file = filename, edits = edits.len(), "formatted");

    if cli.edits {
        let json = serde_json::to_string_pretty(&edits)?;
        println!("{json}");
        return Ok(changed);
    }
    if cli.check {
        if changed {
            eprintln!("{filename}: not formatted");
        }
        return Ok(changed);
    }

    let formatted = apply_edits(doc.text(), &edits)?;
    if cli.write && filename != "-" {
        if changed {
            let bytes = encoding::encode(&formatted, &decoded)?;
            fs::write(filename, bytes).context("failed to write")?;
        }
    } else {
        io::stdout().write_all(formatted.as_bytes())?;
    }
    Ok(changed)
}

fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}
