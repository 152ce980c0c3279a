use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use feedwalk::util::{strip_control_chars, strip_markup, truncate_to_width};
use feedwalk::{Config, FeedParser, Item};

/// Get the default config file path (~/.config/feedwalk/config.toml)
fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("feedwalk")
            .join("config.toml"),
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "feedwalk",
    about = "Parse Atom/RSS files and print the reconciled item tree"
)]
struct Args {
    /// Config file (default: ~/.config/feedwalk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print JSON instead of a text tree
    #[arg(long)]
    json: bool,

    /// Parse every file into one feed collection, in order
    #[arg(long)]
    merge: bool,

    /// Truncate text lines to this many columns
    #[arg(long, value_name = "N", default_value_t = 100)]
    width: usize,

    /// Feed documents to parse
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,
}

/// One printed feed and the files it was built from.
#[derive(Debug, Serialize)]
struct FeedReport {
    sources: Vec<String>,
    feed: Item,
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display())),
        None => match default_config_path() {
            Some(path) => Config::load(&path)
                .with_context(|| format!("Failed to load config file '{}'", path.display())),
            None => {
                tracing::debug!("HOME not set, using default config");
                Ok(Config::default())
            }
        },
    }
}

fn parse_file(parser: &FeedParser, path: &Path, feed: &mut Item) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    parser
        .parse(&bytes, feed)
        .with_context(|| format!("Failed to parse '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), entries = feed.len(), "Parsed feed");
    Ok(())
}

/// Single line, safe for a terminal, at most `width` columns.
fn display_line(s: &str, width: usize) -> String {
    let plain = strip_markup(s);
    let clean = strip_control_chars(&plain);
    let line = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_to_width(&line, width).into_owned()
}

fn write_item(out: &mut String, item: &Item, depth: usize, width: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    let budget = width.saturating_sub(indent.len() + 2);

    let name = item.name().map_or_else(|| "(untitled)".to_string(), |n| display_line(n, budget));
    writeln!(out, "{}- {}", indent, name)?;

    for (label, value) in [("token", item.token()), ("uri", item.uri())] {
        if let Some(value) = value {
            let line = display_line(&format!("{}: {}", label, value), budget);
            writeln!(out, "{}  {}", indent, line)?;
        }
    }
    if item.added != 0 {
        let when = chrono::DateTime::from_timestamp(item.added, 0)
            .map_or_else(|| item.added.to_string(), |d| d.to_rfc3339());
        writeln!(out, "{}  added: {}", indent, when)?;
    }
    if let Some(text) = item.text() {
        let line = display_line(text, budget);
        if !line.is_empty() {
            writeln!(out, "{}  {}", indent, line)?;
        }
    }

    for child in item.children() {
        write_item(out, child, depth + 1, width)?;
    }
    Ok(())
}

fn render_tree(reports: &[FeedReport], width: usize) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for report in reports {
        let sources = display_line(&report.sources.join(", "), width.saturating_sub(3));
        writeln!(out, "== {}", sources)?;
        write_item(&mut out, &report.feed, 0, width)?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let parser = FeedParser::from_config(&config);
    tracing::debug!(?parser, "Parser ready");

    let mut reports = Vec::new();
    let mut failures = 0usize;

    if args.merge {
        let mut feed = Item::new();
        let mut sources = Vec::new();
        for path in &args.files {
            // Entries reconciled before a failure are kept
            if let Err(e) = parse_file(&parser, path, &mut feed) {
                eprintln!("Error: {:#}", e);
                failures += 1;
            }
            sources.push(path.display().to_string());
        }
        reports.push(FeedReport { sources, feed });
    } else {
        for path in &args.files {
            let mut feed = Item::new();
            match parse_file(&parser, path, &mut feed) {
                Ok(()) => reports.push(FeedReport {
                    sources: vec![path.display().to_string()],
                    feed,
                }),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    failures += 1;
                }
            }
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        let tree = render_tree(&reports, args.width).context("Failed to render output")?;
        print!("{}", tree);
    }

    if failures > 0 {
        tracing::warn!(failures, total = args.files.len(), "Some files failed to parse");
        std::process::exit(1);
    }
    Ok(())
}
