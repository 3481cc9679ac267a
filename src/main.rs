//! Typewriter - a minimal editor drawn through a glyph atlas.
//!
//! # Usage
//!
//! ```bash
//! typewriter
//! typewriter --grow --capacity 4096
//! typewriter --text "hello" --snapshot hello.png
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use typewriter::app::{
    App, DEFAULT_ATLAS_SIZE, DEFAULT_CAPACITY, DEFAULT_FONT_SIZE, DEFAULT_RESERVE_MIB,
    DEFAULT_SPRITE_LIMIT,
};
use typewriter::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use typewriter::editor::CapacityPolicy;
use typewriter::font::FontSource;
use typewriter::perf;

/// A minimal gap-buffer text editor with an arena-backed glyph atlas
#[derive(Parser, Debug)]
#[command(name = "typewriter", version, about, long_about = None)]
struct Cli {
    /// Initial buffer text
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,

    /// Render the initial text to a PNG and exit
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Let the buffer grow instead of dropping input when full
    #[arg(long)]
    grow: bool,

    /// Buffer capacity in bytes
    #[arg(long, value_name = "BYTES")]
    capacity: Option<usize>,

    /// Address space to reserve for the arena, in MiB
    #[arg(long, value_name = "MIB")]
    reserve_mib: Option<usize>,

    /// Atlas side length in pixels
    #[arg(long, value_name = "PIXELS")]
    atlas_size: Option<u32>,

    /// Maximum sprites per frame
    #[arg(long, value_name = "COUNT")]
    sprite_limit: Option<usize>,

    /// TrueType/OpenType font file (default: system monospace)
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Font size in points
    #[arg(long, value_name = "POINTS")]
    font_size: Option<u32>,

    /// Bitmap pixels per point
    #[arg(long, value_name = "FACTOR")]
    scale: Option<u32>,

    /// Show the buffer as plain text instead of composited frames
    #[arg(long)]
    no_graphics: bool,

    /// Force frame display to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults in the config file
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in the config file
    #[arg(long)]
    clear: bool,
}

fn build_app(flags: &ConfigFlags) -> Result<App> {
    let capacity = flags.capacity.unwrap_or(DEFAULT_CAPACITY);
    let atlas_size = flags.atlas_size.unwrap_or(DEFAULT_ATLAS_SIZE);
    let scale = flags.scale.unwrap_or(1);
    if capacity == 0 {
        anyhow::bail!("--capacity must be at least 1 byte");
    }
    if atlas_size == 0 {
        anyhow::bail!("--atlas-size must be at least 1 pixel");
    }
    if scale == 0 {
        anyhow::bail!("--scale must be at least 1");
    }

    let policy = if flags.grow {
        CapacityPolicy::Grow
    } else {
        CapacityPolicy::Fixed
    };
    #[allow(clippy::cast_precision_loss)]
    let app = App::new()
        .with_capacity(capacity, policy)
        .with_reserve_mib(flags.reserve_mib.unwrap_or(DEFAULT_RESERVE_MIB))
        .with_atlas_size(atlas_size)
        .with_scale(scale as f32)
        .with_sprite_limit(flags.sprite_limit.unwrap_or(DEFAULT_SPRITE_LIMIT))
        .with_font(
            FontSource::from_option(flags.font.as_deref()),
            flags.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        )
        .with_graphics(!flags.no_graphics, flags.force_half_cell);
    Ok(app)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os(perf::DEBUG_LOG_ENV).map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = ?render_debug_log_path,
            %err,
            "failed to initialize render debug log"
        );
    }

    let mut app = build_app(&effective)?;
    if let Some(text) = &cli.text {
        app = app.with_initial_text(text);
    }

    if let Some(path) = &cli.snapshot {
        let written = app.snapshot(path).context("Snapshot failed")?;
        println!("{}", written.display());
        return Ok(());
    }

    app.run().context("Application error")
}
