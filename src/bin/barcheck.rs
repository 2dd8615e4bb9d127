//! CLI binary for barcheck.
//!
//! A thin shim over the library crate that maps subcommands to session
//! operations and prints results. State lives in a data directory
//! (`--data-dir`, default `.barcheck/`) through the [`DirStore`] backend,
//! so consecutive invocations edit the same checklist.

use anyhow::{bail, Context, Result};
use barcheck::{
    write_to_dir, CapturedFile, ChecklistTemplate, DirStore, ReportConfig,
    ReportProgressCallback, Session,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "barcheck",
    version,
    about = "Bar-opening checklist with photo evidence and PDF reports"
)]
struct Cli {
    /// Data directory holding the persisted checklist state.
    #[arg(long, global = true, env = "BARCHECK_DATA_DIR", default_value = ".barcheck")]
    data_dir: PathBuf,

    /// TTF font used for the PDF report (needs non-Latin coverage).
    #[arg(long, global = true, env = "BARCHECK_FONT")]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current checklist.
    Status,
    /// Mark an item done.
    Check { order: u32 },
    /// Mark an item not done.
    Uncheck { order: u32 },
    /// Set an item's note (empty text clears it).
    Note { order: u32, text: String },
    /// Append a custom item.
    Add { title: String },
    /// Remove an item (asks for confirmation).
    Remove {
        order: u32,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Manage an item's photos.
    Photo {
        #[command(subcommand)]
        command: PhotoCommand,
    },
    /// Archive the checklist, generate the PDF report, start fresh.
    Finalize {
        /// Directory the report PDF is written into.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Inspect or reuse archived reports.
    History {
        #[command(subcommand)]
        command: Option<HistoryCommand>,
    },
    /// Discard the current checklist and start fresh from the template.
    Reset,
    /// Show the template a fresh checklist is created from.
    Template,
}

#[derive(Subcommand)]
enum PhotoCommand {
    /// Compress image files and attach them to an item (max 4 kept).
    Add { order: u32, files: Vec<PathBuf> },
    /// Detach a photo by slot (0-based, see `status`).
    Remove { order: u32, slot: usize },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List archived reports, most recent first (default).
    List,
    /// Regenerate the PDF for an archived report.
    Pdf {
        index: usize,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Reopen an archived checklist as the current one.
    Restore { index: usize },
    /// Delete all archived reports (asks for confirmation).
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

// ── Generation progress bar ──────────────────────────────────────────────

/// Terminal callback: one bar over the checklist items, with skip lines
/// printed above it as they happen.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold} [{bar:32.green/238}] {pos}/{len} items",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ReportProgressCallback for CliProgress {
    fn on_generation_start(&self, total_items: usize) {
        self.bar.set_length(total_items as u64);
    }

    fn on_item_rendered(&self, _order: u32, _total_items: usize) {
        self.bar.inc(1);
    }

    fn on_photo_skipped(&self, order: u32, slot: usize, detail: &str) {
        self.bar
            .println(yellow(&format!("skipped item {order} photo {slot}: {detail}")));
    }

    fn on_generation_complete(&self, pages: usize, byte_len: usize) {
        self.bar
            .finish_with_message(format!("{pages} pages, {byte_len} bytes"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Declared media type from the file extension; the ingestion stage does
/// the actual filtering.
fn media_type_for(path: &Path) -> String {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("png") => "image/png".to_string(),
        Some("gif") => "image/gif".to_string(),
        Some("webp") => "image/webp".to_string(),
        Some("bmp") => "image/bmp".to_string(),
        Some(other) => format!("application/{other}"),
        None => "application/octet-stream".to_string(),
    }
}

fn print_status(session: &Session) {
    let checklist = session.current();
    let short_id: String = checklist
        .id
        .chars()
        .rev()
        .take(8)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    println!(
        "{} {}  {}",
        bold("Checklist"),
        dim(&short_id),
        format!(
            "{}/{} done",
            checklist.completed_count(),
            checklist.total_count()
        )
    );
    for item in &checklist.items {
        let mark = if item.done { green("[x]") } else { "[ ]".to_string() };
        let photos = if item.photos.is_empty() {
            String::new()
        } else {
            dim(&format!(" ({} photos)", item.photos.len()))
        };
        println!("{} {:>2}. {}{}", mark, item.order, item.title, photos);
        if !item.note.is_empty() {
            println!("       {}", dim(&item.note));
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store = DirStore::open(&cli.data_dir)
        .with_context(|| format!("cannot open data dir {}", cli.data_dir.display()))?;

    let wants_report = matches!(
        cli.command,
        Command::Finalize { .. } | Command::History { command: Some(HistoryCommand::Pdf { .. }) }
    );
    let mut config = ReportConfig::builder();
    if let Some(font) = &cli.font {
        config = config.font_path(font);
    }
    if wants_report {
        config = config.progress_callback(CliProgress::new());
    }
    let config = config.build()?;

    let mut session = Session::open(Arc::new(store), ChecklistTemplate::default(), config);

    match cli.command {
        Command::Status => print_status(&session),

        Command::Check { order } => {
            let id = session.current().id_at_order(order)?;
            session.set_done(&id, true)?;
            println!("{} item {order}", green("checked"));
        }

        Command::Uncheck { order } => {
            let id = session.current().id_at_order(order)?;
            session.set_done(&id, false)?;
            println!("unchecked item {order}");
        }

        Command::Note { order, text } => {
            let id = session.current().id_at_order(order)?;
            session.set_note(&id, text)?;
            println!("note saved on item {order}");
        }

        Command::Add { title } => {
            session.add_item(title);
            let order = session.current().total_count();
            println!("added item {order}");
        }

        Command::Remove { order, yes } => {
            let id = session.current().id_at_order(order)?;
            if !yes && !confirm(&format!("Remove item {order}?"))? {
                bail!("aborted");
            }
            session.remove_item(&id)?;
            println!("removed item {order}; remaining items renumbered");
        }

        Command::Photo { command } => match command {
            PhotoCommand::Add { order, files } => {
                let id = session.current().id_at_order(order)?;
                let mut captured = Vec::with_capacity(files.len());
                for path in &files {
                    let bytes = std::fs::read(path)
                        .with_context(|| format!("cannot read {}", path.display()))?;
                    captured.push(CapturedFile {
                        name: path.display().to_string(),
                        media_type: media_type_for(path),
                        bytes,
                    });
                }
                let outcome = session.add_photos(&id, captured).await?;
                println!(
                    "{} photo(s) attached to item {order}",
                    green(&outcome.added.to_string())
                );
                if outcome.dropped_over_cap > 0 {
                    println!(
                        "{}",
                        yellow(&format!(
                            "{} photo(s) dropped: item already holds the maximum of 4",
                            outcome.dropped_over_cap
                        ))
                    );
                }
                for skip in &outcome.skipped {
                    println!("{}", yellow(&format!("skipped {skip}")));
                }
            }
            PhotoCommand::Remove { order, slot } => {
                let id = session.current().id_at_order(order)?;
                session.remove_photo(&id, slot)?;
                println!("removed photo {slot} from item {order}");
            }
        },

        Command::Finalize { output } => {
            let outcome = session.finalize().await?;
            let path = write_to_dir(&outcome.report, &output).await?;
            println!(
                "{} {} ({}/{} done, {} pages)",
                green("report written:"),
                path.display(),
                outcome.completed,
                outcome.total,
                outcome.report.page_count
            );
            if !outcome.report.skipped_photos.is_empty() {
                println!(
                    "{}",
                    yellow(&format!(
                        "{} photo(s) could not be embedded",
                        outcome.report.skipped_photos.len()
                    ))
                );
            }
        }

        Command::History { command } => match command.unwrap_or(HistoryCommand::List) {
            HistoryCommand::List => {
                if session.history().is_empty() {
                    println!("no archived reports yet");
                }
                for (idx, entry) in session.history().iter().enumerate() {
                    println!(
                        "{idx}: {} finalized {}  {}/{} done",
                        dim(&entry.id),
                        entry.finalized_at.format("%Y-%m-%d %H:%M"),
                        entry.completed,
                        entry.total
                    );
                }
            }
            HistoryCommand::Pdf { index, output } => {
                let report = session.render_history_entry(index).await?;
                let path = write_to_dir(&report, &output).await?;
                println!("{} {}", green("report written:"), path.display());
            }
            HistoryCommand::Restore { index } => {
                session.restore(index)?;
                println!("history entry {index} reopened as the current checklist");
            }
            HistoryCommand::Clear { yes } => {
                if !yes && !confirm("Clear all archived reports?")? {
                    bail!("aborted");
                }
                session.clear_history();
                println!("history cleared");
            }
        },

        Command::Reset => {
            session.reset();
            println!("checklist reset from template");
        }

        Command::Template => {
            for (idx, line) in session.template().lines().iter().enumerate() {
                println!("{:>2}. {}", idx + 1, line);
            }
        }
    }

    Ok(())
}
