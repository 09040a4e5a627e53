// cfixtures: C/C++ parser test corpus checker and browser

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cfixtures::DEFAULT_CORPUS;
use cfixtures::contract::{CorpusReport, check_corpus};
use cfixtures::corpus::{Corpus, Dialect, Fixture};
use cfixtures::scan::{Declaration, Include, scan_source};
use cfixtures::ui::App;

/// Check and browse the C/C++ parser test corpus.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Corpus root directory
    #[arg(long, global = true, env = "CFIXTURES_CORPUS", default_value = DEFAULT_CORPUS)]
    corpus: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the contract on every fixture
    ///
    /// Exits with status 1 when any fixture fails a check.
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List fixtures with dialect, line count and declaration count
    List {
        /// Only list fixtures of this dialect (c or cpp)
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,
    },
    /// Print the declaration inventory of one fixture
    Show {
        /// Fixture path relative to the corpus root
        path: String,

        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse fixtures in a terminal UI
    Browse,
}

fn parse_dialect(value: &str) -> Result<Dialect, String> {
    Dialect::from_name(value).ok_or_else(|| format!("unknown dialect '{value}', expected c or cpp"))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // The browser owns the terminal, so it gets no log output.
    if !matches!(cli.command, Commands::Browse) {
        init_logging(cli.verbose, cli.quiet);
    }

    let corpus = Corpus::load(&cli.corpus)
        .with_context(|| format!("failed to load corpus at {}", cli.corpus.display()))?;

    match cli.command {
        Commands::Check { json } => run_check(&corpus, json),
        Commands::List { dialect } => run_list(&corpus, dialect).map(|()| ExitCode::SUCCESS),
        Commands::Show { path, json } => run_show(&corpus, &path, json).map(|()| ExitCode::SUCCESS),
        Commands::Browse => run_browse(corpus).map(|()| ExitCode::SUCCESS),
    }
}

/// Structured logging to stderr so JSON on stdout stays clean for piping.
fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("cfixtures=error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cfixtures=warn")),
            1 => EnvFilter::new("cfixtures=info"),
            2 => EnvFilter::new("cfixtures=debug"),
            _ => EnvFilter::new("cfixtures=trace"),
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_check(corpus: &Corpus, json: bool) -> Result<ExitCode> {
    let report = check_corpus(corpus);
    let mut out = io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_report(&mut out, &report)?;
    }

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(out: &mut impl Write, report: &CorpusReport) -> io::Result<()> {
    for fixture in &report.fixtures {
        let verdict = if fixture.passed() { "PASS" } else { "FAIL" };
        writeln!(
            out,
            "{verdict} {} ({}, {} lines, {} declarations)",
            fixture.path, fixture.dialect, fixture.lines, fixture.declarations
        )?;
        if let Some(summary) = fixture.expectation {
            writeln!(out, "     expects {summary}")?;
        }
        for check in fixture.checks.iter().filter(|c| !c.passed) {
            match &check.detail {
                Some(detail) => writeln!(out, "  ✗ {}: {detail}", check.name)?,
                None => writeln!(out, "  ✗ {}", check.name)?,
            }
        }
        for note in &fixture.notes {
            writeln!(out, "  note: {note}")?;
        }
    }
    for note in &report.notes {
        writeln!(out, "note: {note}")?;
    }
    writeln!(
        out,
        "{} fixtures, {} passed, {} failed",
        report.fixtures.len(),
        report.passed,
        report.failed
    )
}

fn run_list(corpus: &Corpus, dialect: Option<Dialect>) -> Result<()> {
    let fixtures: Vec<&Fixture> = match dialect {
        Some(dialect) => corpus.by_dialect(dialect).collect(),
        None => corpus.iter().collect(),
    };
    let width = fixtures.iter().map(|f| f.path().len()).max().unwrap_or(0);

    let mut out = io::stdout().lock();
    for fixture in fixtures {
        let declarations = match scan_source(fixture.content()) {
            Ok(inventory) => format!("{} declarations", inventory.declarations.len()),
            Err(err) => format!("scan error at line {}", err.location.line),
        };
        writeln!(
            out,
            "{:<width$}  {:<3}  {:>4} lines  {declarations}",
            fixture.path(),
            fixture.dialect(),
            fixture.line_count(),
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    path: &'a str,
    dialect: Dialect,
    declarations: &'a [Declaration],
    includes: Vec<&'a Include>,
}

fn run_show(corpus: &Corpus, path: &str, json: bool) -> Result<()> {
    let Some(fixture) = corpus.get(path) else {
        bail!("no fixture at {path} in {}", corpus.root().display());
    };
    let inventory =
        scan_source(fixture.content()).with_context(|| format!("failed to scan {path}"))?;

    // Sorted and deduplicated for output
    let mut includes: Vec<&Include> = inventory.includes.iter().collect();
    includes.sort_by(|a, b| (a.system, &a.path).cmp(&(b.system, &b.path)));
    includes.dedup_by(|a, b| a.path == b.path && a.system == b.system);

    let mut out = io::stdout().lock();
    if json {
        let output = ShowOutput {
            path: fixture.path(),
            dialect: fixture.dialect(),
            declarations: &inventory.declarations,
            includes,
        };
        serde_json::to_writer_pretty(&mut out, &output)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({})", fixture.path(), fixture.dialect())?;
    for include in includes {
        if include.system {
            writeln!(out, "  #include <{}>", include.path)?;
        } else {
            writeln!(out, "  #include \"{}\"", include.path)?;
        }
    }
    for decl in &inventory.declarations {
        let indent = "  ".repeat(decl.scope.len() + 1);
        let specifiers: Vec<&str> = decl
            .access
            .map(|access| access.as_str())
            .into_iter()
            .chain(decl.modifiers.iter().map(|m| m.as_str()))
            .collect();
        write!(
            out,
            "{indent}{} {}  [{}-{}]",
            decl.kind,
            decl.qualified_name(),
            decl.start_line,
            decl.end_line
        )?;
        if specifiers.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, "  {}", specifiers.join(" "))?;
        }
        if let Some(doc) = &decl.doc {
            for line in doc.lines() {
                writeln!(out, "{indent}  /// {line}")?;
            }
        }
    }
    Ok(())
}

fn run_browse(corpus: Corpus) -> Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(corpus);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("terminal browser failed")
}
