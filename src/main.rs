mod app;
mod config;
mod core;
mod game;
mod screens;
mod ui;

use crate::game::link::{self, LinkDefaults, ResultsParams};
use crate::game::{codec, score_table::ScoreTable};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "scoreboard", version)]
#[command(about = "Animated team results scoreboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the animated results view for a results link
    Results {
        /// Results link (results.html?data=...) or its query string
        link: String,

        /// Animation length in milliseconds, overriding the link
        #[arg(long)]
        duration: Option<f64>,

        /// Finish with fireworks, overriding the link
        #[arg(long)]
        fireworks: bool,

        /// Surface width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Surface height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Open in a window even when the config asks for fullscreen
        #[arg(long)]
        windowed: bool,
    },

    /// Render the results animation headless to numbered PNG frames
    Snapshot {
        /// Results link (results.html?data=...) or its query string
        link: String,

        /// Output directory (default: snapshots/<timestamp>)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Maximum number of frames to write
        #[arg(long, default_value_t = 300)]
        frames: u32,

        /// Frames per second of the synthetic clock
        #[arg(long, default_value_t = 10.0)]
        fps: f64,

        /// Frame width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Frame height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Encode a {teams, categories, scores} JSON document into a results link
    Encode {
        /// JSON file, or - for stdin
        file: PathBuf,

        /// Animation length in milliseconds (default: suggested from the category count)
        #[arg(long)]
        duration: Option<u32>,

        /// Add fireworks to the link
        #[arg(long)]
        fireworks: bool,
    },

    /// Decode a results link and print its score table
    Decode {
        /// Results link (results.html?data=...), its query string, or a bare token
        link: String,
    },
}

fn link_defaults(config: &config::Config) -> LinkDefaults {
    LinkDefaults {
        duration_ms: config.default_duration_ms,
        fireworks: config.fireworks,
    }
}

fn results_params(
    link: &str,
    config: &config::Config,
    duration: Option<f64>,
    fireworks: bool,
) -> Result<ResultsParams, Box<dyn Error>> {
    let mut params = link::parse_results_link(link, link_defaults(config))?;
    if let Some(ms) = duration {
        if ms.is_finite() && ms > 0.0 {
            params.duration_ms = ms;
        } else {
            log::warn!("Ignoring invalid --duration {ms}, keeping {} ms", params.duration_ms);
        }
    }
    params.fireworks |= fireworks;
    Ok(params)
}

fn read_table(file: &Path) -> Result<ScoreTable, Box<dyn Error>> {
    let text = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    let table: ScoreTable = serde_json::from_str(&text)?;
    table.validate()?;
    Ok(table)
}

fn execute(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = config::get();
    match cli.command {
        Commands::Results {
            link,
            duration,
            fireworks,
            width,
            height,
            windowed,
        } => {
            let params = results_params(&link, &config, duration, fireworks)?;
            let mut display = app::DisplayOptions::from_config(&config);
            display.width = width.unwrap_or(display.width);
            display.height = height.unwrap_or(display.height);
            display.windowed |= windowed;
            app::run(params, display)
        }
        Commands::Snapshot {
            link,
            out,
            frames,
            fps,
            width,
            height,
        } => {
            let params = results_params(&link, &config, None, false)?;
            let dir = app::run_snapshots(
                params,
                app::SnapshotOptions {
                    out_dir: out,
                    frames,
                    fps,
                    width: width.unwrap_or(config.display_width),
                    height: height.unwrap_or(config.display_height),
                    software_threads: config.software_thread_hint(),
                },
            )?;
            println!("{}", dir.display());
            Ok(())
        }
        Commands::Encode {
            file,
            duration,
            fireworks,
        } => {
            let table = read_table(&file)?;
            let token = codec::encode(&table)?;
            let duration =
                duration.unwrap_or_else(|| link::suggested_duration_ms(table.categories.len()));
            println!("{token}");
            println!("{}", link::results_link(&token, duration, fireworks));
            Ok(())
        }
        Commands::Decode { link } => {
            let trimmed = link.trim();
            let table = if trimmed.contains("data=") {
                link::parse_results_link(trimmed, link_defaults(&config))?.data
            } else {
                codec::decode(trimmed)?
            };
            println!("{}", serde_json::to_string_pretty(&table)?);
            Ok(())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    log::set_max_level(config::get().log_level.as_level_filter());

    if let Err(e) = execute(cli) {
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}
