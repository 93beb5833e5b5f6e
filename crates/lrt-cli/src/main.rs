//! Command-line interface for LRT layout templates.
//!
//! Usage:
//!   lrt dump `<file>`                    - Parse and print the regenerated text
//!   lrt pages `<file>` [--json]          - List pages, elements and margins
//!   lrt sizes `<file>`                   - List book formats from a sizes file
//!   lrt tidy `<file>` [options] [-o out] - Snap, align and space every page

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::{error, info};
use lrt_core::template::book_title;
use lrt_core::{
    AccessFault, Element, Error, LayoutConfig, NamedVariant, Page, PageReport, Size, Table,
    emit_document, load_document, load_pages, load_template_sizes, tidy_document,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let matches = cli().get_matches();
    init_logger(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("dump", m)) => handle_dump(path_arg(m)),
        Some(("pages", m)) => handle_pages(path_arg(m), m.get_flag("json")),
        Some(("sizes", m)) => handle_sizes(path_arg(m)),
        Some(("tidy", m)) => handle_tidy(m),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cli() -> Command {
    let file = || {
        Arg::new("file")
            .help("Template file to read")
            .required(true)
            .index(1)
            .value_parser(value_parser!(PathBuf))
    };
    let number = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .long(name)
            .help(help)
            .value_parser(value_parser!(f64))
    };

    Command::new("lrt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and tidy photo-book layout templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("dump")
                .about("Parse a file and print the regenerated text")
                .arg(file()),
        )
        .subcommand(
            Command::new("pages")
                .about("List pages with their elements, bounding boxes and margins")
                .arg(file())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the listing as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("sizes")
                .about("List the book formats in a template-sizes file")
                .arg(file()),
        )
        .subcommand(
            Command::new("tidy")
                .about("Snap, align and space every page of a template")
                .arg(file())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("JSON layout configuration")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(number("grid", "Grid spacing for edge snapping"))
                .arg(number("margin", "Uniform page margin"))
                .arg(number("spacing", "Gap between neighbouring elements"))
                .arg(number("capture", "Largest drift that gets corrected"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the result here instead of stdout")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

/// Default filter is `warn`; each `-v` raises it one level and `RUST_LOG`
/// has the last word.
fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn path_arg(m: &ArgMatches) -> &Path {
    m.get_one::<PathBuf>("file")
        .map(PathBuf::as_path)
        .unwrap_or_else(|| Path::new(""))
}

fn root_table(doc: &NamedVariant) -> Result<&Table, Error> {
    doc.table()
        .ok_or_else(|| AccessFault::NotATable(doc.name.clone()).into())
}

// ─── dump ─────────────────────────────────────────────────────────────────

fn handle_dump(path: &Path) -> CliResult<()> {
    let doc = load_document(path)?;
    println!("{}", emit_document(&doc));
    Ok(())
}

// ─── pages ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PageSummary<'a> {
    index: usize,
    name: &'a str,
    size: Size,
    elements: Vec<&'a Element>,
    report: Option<PageReport>,
}

impl<'a> PageSummary<'a> {
    fn new(page: &'a Page) -> Self {
        Self {
            index: page.index,
            name: &page.name,
            size: page.size,
            elements: page.iter().filter(|e| !e.is_placeholder()).collect(),
            report: page.report(),
        }
    }
}

fn handle_pages(path: &Path, json: bool) -> CliResult<()> {
    let doc = load_document(path)?;
    let root = root_table(&doc)?;
    let pages = load_pages(root)?;
    info!("{}: {} pages", path.display(), pages.len());

    if json {
        let summaries: Vec<_> = pages.iter().map(PageSummary::new).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if let Some(title) = book_title(root) {
        println!("{title}");
    }
    for page in &pages {
        println!(
            "page {} `{}` ({} x {})",
            page.index, page.name, page.size.width, page.size.height
        );
        for element in page.iter().filter(|e| !e.is_placeholder()) {
            println!("  {:<10} {}", element.to_string(), element.rect);
        }
        match page.report() {
            Some(report) => {
                let m = report.margins;
                println!("  bounds  {}", report.bounding_box);
                println!(
                    "  margins left {} top {} right {} bottom {}",
                    m.left, m.top, m.right, m.bottom
                );
            }
            None => println!("  no photos"),
        }
    }
    Ok(())
}

// ─── sizes ────────────────────────────────────────────────────────────────

fn handle_sizes(path: &Path) -> CliResult<()> {
    let doc = load_document(path)?;
    let sizes = load_template_sizes(root_table(&doc)?)?;
    for size in &sizes {
        println!(
            "{:<16} {:>8} x {:<8} {}",
            size.id, size.width, size.height, size.title
        );
    }
    Ok(())
}

// ─── tidy ─────────────────────────────────────────────────────────────────

fn handle_tidy(m: &ArgMatches) -> CliResult<()> {
    let path = path_arg(m);
    let config = layout_config(m)?;
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let tidied = tidy_document(&text, &config)?;

    match m.get_one::<PathBuf>("output") {
        Some(out) => {
            std::fs::write(out, tidied).map_err(|e| Error::io(out, e))?;
            info!("wrote {}", out.display());
        }
        None => print!("{tidied}"),
    }
    Ok(())
}

/// Start from `--config` (or the defaults), then apply individual flags.
fn layout_config(m: &ArgMatches) -> CliResult<LayoutConfig> {
    let mut config = match m.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            serde_json::from_str(&text)?
        }
        None => LayoutConfig::default(),
    };

    if let Some(&grid) = m.get_one::<f64>("grid") {
        config.grid = grid;
    }
    if let Some(&margin) = m.get_one::<f64>("margin") {
        config.margin = margin;
    }
    if let Some(&spacing) = m.get_one::<f64>("spacing") {
        config.spacing = spacing;
    }
    if let Some(&capture) = m.get_one::<f64>("capture") {
        config.capture = capture;
    }
    Ok(config)
}
