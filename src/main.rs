use std::fs::File;
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pageview::app::{App, run_app_with_event_source};
use pageview::event_source::KeyboardEventSource;
use pageview::panic_handler::{initialize_panic_handler, restore_terminal};
use pageview::settings::Settings;
use pageview::viewer::{DocumentRef, MupdfRenderer, MupdfResolver, ViewerController};

#[derive(Parser, Debug)]
#[command(name = "pageview", version, about = "A terminal paginated document viewer")]
struct Args {
    /// Documents to open; `n` and `p` switch between them
    documents: Vec<PathBuf>,

    /// Settings file (defaults to <config dir>/pageview/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "pageview.log")]
    log_file: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Worker threads for loading and rendering
    #[arg(long)]
    workers: Option<usize>,

    /// Rasterization zoom for page renders
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        settings.workers = workers.max(1);
    }
    let palette = settings.palette()?;

    let level = match args.log_level {
        Some(level) => level,
        None => LevelFilter::from_str(&settings.log_level)
            .with_context(|| format!("invalid log level {:?}", settings.log_level))?,
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("cannot create log file {:?}", args.log_file))?,
    )?;
    info!("Starting pageview with {} document(s)", args.documents.len());

    initialize_panic_handler();

    let documents: Vec<DocumentRef> = args
        .documents
        .iter()
        .map(|path| DocumentRef::new(path.to_string_lossy()))
        .collect();
    let zoom = args.zoom;
    let viewer = ViewerController::with_config(
        Arc::new(MupdfResolver),
        move || MupdfRenderer::new(zoom),
        settings.viewer_config(),
    );
    let mut app = App::new(viewer, documents, settings, palette);

    enable_raw_mode()?;
    let mut terminal = match enter_terminal() {
        Ok(terminal) => terminal,
        Err(err) => {
            restore_terminal();
            return Err(err);
        }
    };

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    restore_terminal();
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("Application error: {err:?}");
    }
    info!("Shutting down pageview");
    res
}

fn enter_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(out))?)
}
