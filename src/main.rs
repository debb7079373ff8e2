use anyhow::{Context, Result};
use clap::Parser;

use hunkview::app::{AppOptions, DEFAULT_CONTEXT_LINES};
use hunkview::types::DiffSide;
use hunkview::window::{
    DEFAULT_BUFFER_SIZE, DEFAULT_BUFFER_THRESHOLD, DEFAULT_WINDOW_SIZE, WindowConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "hunkview",
    about = "Terminal diff viewer with hunk-level stage, unstage and discard"
)]
pub struct Cli {
    /// Start on the first staged file instead of the first unstaged one
    #[arg(long)]
    staged: bool,

    /// Only show files matching this glob pattern
    #[arg(long, value_name = "GLOB")]
    files: Option<String>,

    /// Color theme: dark, light or auto
    #[arg(long, default_value = "auto")]
    theme: String,

    /// Lines of context around each change
    #[arg(short = 'U', long, default_value_t = DEFAULT_CONTEXT_LINES)]
    context: u32,

    /// Maximum number of diff lines materialized at once
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Distance from a window edge that shifts the window
    #[arg(long, default_value_t = DEFAULT_BUFFER_THRESHOLD)]
    buffer_threshold: usize,

    /// Number of lines the window moves per shift
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,
}

fn main() -> Result<()> {
    // Silent unless RUST_LOG is set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();

    let filter = match cli.files.as_deref() {
        Some(pattern) => Some(
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern '{pattern}'"))?,
        ),
        None => None,
    };

    let repo = hunkview::git::open_repo(".")?;
    let changed = hunkview::git::list_changed_files(&repo)?;
    let files = hunkview::app::filter_files(changed, filter.as_ref());
    if files.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    log::info!("{} changed files", files.len());

    hunkview::ui::theme::init(&cli.theme);

    let options = AppOptions {
        start_side: if cli.staged {
            DiffSide::Staged
        } else {
            DiffSide::Unstaged
        },
        context_lines: cli.context,
        window: WindowConfig::new(cli.window_size, cli.buffer_threshold, cli.buffer_size),
        filter,
    };

    hunkview::app::run(&repo, files, options)
}
