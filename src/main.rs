use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::mpsc;

use shotput::app::App;
use shotput::clipboard::create_clipboard;
use shotput::config::{ensure_directories, ConfigStorage, JsonConfigStorage};
use shotput::focus::{create_lookup, ForegroundGuard};
use shotput::hotkey::create_dispatcher;
use shotput::input::create_injector;
use shotput::logging::init_logger;
use shotput::pipeline::{ClipboardTransaction, Timings};
use shotput::render::TextRenderer;

#[derive(Parser)]
#[command(name = "shotput")]
#[command(about = "Paste selected text into chat clients as an image", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent: listen for the hotkey, convert selections to images
    Run,

    /// Render text to a PNG file without touching the clipboard
    Render {
        /// Text to render; read from stdin when omitted
        text: Option<String>,

        /// Output file path
        #[arg(short, long, default_value = "shotput.png")]
        out: PathBuf,

        /// Maximum image width in pixels (default: from config)
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Print the active configuration and its file path
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run) | None => cmd_run(),
        Some(Commands::Render { text, out, width }) => {
            env_logger::init();
            cmd_render(text, out, width)
        }
        Some(Commands::Config) => {
            env_logger::init();
            cmd_config()
        }
    }
}

/// Run the agent until killed
fn cmd_run() -> Result<()> {
    let (data_dir, config_dir) = ensure_directories()?;

    // Load config (a default file is written on first run)
    let storage = JsonConfigStorage::new(config_dir.join("config.json"));
    let config = storage.load()?;

    // Warn-level records double as user-facing notices
    let (notice_tx, notice_rx) = mpsc::channel();
    init_logger(
        data_dir.join("shotput.log"),
        Some(notice_tx),
        &config.logging.file_level,
        &config.logging.notice_level,
    )?;

    log::info!("shotput {} starting", env!("CARGO_PKG_VERSION"));

    // Platform backends
    let clipboard = create_clipboard()?;
    let injector = create_injector()?;
    let lookup = create_lookup()?;
    let dispatcher = create_dispatcher()?;

    let renderer = TextRenderer::new(&config.render);
    let timings = Timings::from_config(&config.timings, config.send_delay_ms);
    let transaction = ClipboardTransaction::new(
        clipboard,
        injector,
        renderer,
        timings,
        config.render.max_width,
    );
    let guard = ForegroundGuard::new(&config.allow_processes, lookup);

    let mut app = App::new(
        config,
        Box::new(storage),
        dispatcher,
        guard,
        transaction,
        Some(notice_rx),
    )?;
    app.register_hotkeys();
    app.run()
}

/// Render text to a PNG on disk, useful for previewing font and wrap settings
fn cmd_render(text: Option<String>, out: PathBuf, width: Option<u32>) -> Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };

    let (_data_dir, config_dir) = ensure_directories()?;
    let storage = JsonConfigStorage::new(config_dir.join("config.json"));
    let config = storage.load()?;

    let renderer = TextRenderer::new(&config.render);
    let max_width = width.unwrap_or(config.render.max_width);
    let image = renderer.render(&text, max_width);

    fs::write(&out, image.to_png_bytes()?)
        .with_context(|| format!("Failed to write {:?}", out))?;

    println!(
        "Wrote {}x{} image to {} ({} face)",
        image.width,
        image.height,
        out.display(),
        renderer.face_name()
    );
    Ok(())
}

/// Print the active configuration
fn cmd_config() -> Result<()> {
    let (_data_dir, config_dir) = ensure_directories()?;
    let storage = JsonConfigStorage::new(config_dir.join("config.json"));
    let config = storage.load()?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();
    println!("Config file: {}", storage.path().display());
    Ok(())
}
