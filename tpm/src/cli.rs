//! Command line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use render::{DeviceMode, ImageFormat};
use tracing::Level;

#[derive(Parser, Debug, Clone)]
#[command(name = "tpm", version, about = "Sphere traces signed distance scenes into image files")]
pub struct Args {
    /// Scene description (JSON). The built-in demo scene is rendered when omitted.
    pub scene: Option<PathBuf>,

    /// Output path template; `{frame}`, `{frame:05}` and `{time}` expand per frame.
    #[arg(short, long, value_parser = parse_output)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Samples per pixel.
    #[arg(long)]
    pub spp: Option<u32>,

    /// Frames rendered concurrently before being written in order.
    #[arg(long, default_value_t = 1, value_parser = parse_positive)]
    pub frames_in_flight: usize,

    /// Where pixels are computed: `auto`, `cpu` or `gpu`.
    #[arg(long, default_value = "auto")]
    pub device: DeviceMode,

    /// Seed mixed into every per-pixel random stream.
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// More log output; repeat for trace level.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print the discovered compute platforms and devices, then exit.
    #[arg(long)]
    pub info: bool,

    /// Render again whenever the scene file changes.
    #[arg(long, requires = "scene")]
    pub watch: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl Args {
    #[must_use]
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn parse_output(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    ImageFormat::from_path(&path).map_err(|e| e.to_string())?;
    Ok(path)
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
