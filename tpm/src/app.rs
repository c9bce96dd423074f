//! # TPM Application Logic
//!
//! [`run`] installs the logger, brings up the compute platforms and renders
//! the requested scene once, or repeatedly under `--watch`.
//!
//! Frames are rendered on compute platforms that can dispatch the `tpm`
//! kernel when `--device` allows it, and by the native marcher otherwise.
//! A frame whose device dispatch fails is re-rendered natively, so the
//! device choice never changes whether a frame is produced.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{bail, Context, Result};
use compute::{IdGenerator, Orchestrator};
use render::{
    CancelToken, DeviceMode, DeviceRenderer, FrameDriver, RenderSettings, RenderSummary,
    KERNEL_SOURCE,
};
use scene::LoadedScene;
use tracing::{error, info, warn};

use crate::cli::{Args, ColorChoice};
use crate::watcher;

/// Output template used for the built-in demo scene.
pub const DEFAULT_OUTPUT: &str = "output/{frame:05}.png";

/// Runs the command described by `args`.
pub fn run(args: &Args) -> Result<()> {
    init_logging(args);

    let mut orchestrator = Orchestrator::with_default_hosts(IdGenerator::from_entropy());
    if args.info {
        print_platforms(&mut orchestrator);
        return Ok(());
    }
    prepare_devices(&mut orchestrator, args.device)?;

    let cancel = CancelToken::new();
    match &args.scene {
        Some(path) if args.watch => watch(args, path, &orchestrator, &cancel),
        _ => {
            let summary = render_once(args, &orchestrator, &cancel)?;
            if summary.frames_failed > 0 {
                bail!("{} frame(s) could not be written", summary.frames_failed);
            }
            Ok(())
        }
    }
}

fn init_logging(args: &Args) {
    let ansi = match args.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal(),
    };
    let installed = tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        warn!("A global logger was already installed");
    }
}

fn print_platforms(orchestrator: &mut Orchestrator) {
    let platforms = orchestrator.discover();
    if platforms.is_empty() {
        println!("No compute platforms found");
    }
    for entry in platforms {
        print!("{}", entry.info);
    }
}

/// Discovers, initializes and compiles every platform unless `mode` keeps
/// rendering on the native path.
pub fn prepare_devices(orchestrator: &mut Orchestrator, mode: DeviceMode) -> Result<()> {
    if mode == DeviceMode::Cpu {
        return Ok(());
    }
    orchestrator.discover();
    if orchestrator.initialize() {
        orchestrator.compile(KERNEL_SOURCE);
    }
    if mode == DeviceMode::Gpu && !orchestrator.can_dispatch() {
        bail!(
            "no compute platform can run the kernel; \
             build with `--features gpu` or pass `--device cpu`"
        );
    }
    Ok(())
}

/// Loads the scene named by `args` (or the demo scene) and applies the size,
/// sample and output overrides.
pub fn load(args: &Args) -> Result<LoadedScene> {
    let mut loaded = match &args.scene {
        Some(path) => {
            scene::load_scene(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            let mut demo = scene::demo_scene();
            demo.spec.image.path = PathBuf::from(DEFAULT_OUTPUT);
            demo.sequence.film.path = DEFAULT_OUTPUT.to_string();
            demo
        }
    };

    let (spec, sequence) = (&mut loaded.spec, &mut loaded.sequence);
    if let Some(output) = &args.output {
        spec.image.path.clone_from(output);
        sequence.film.path = output.to_string_lossy().into_owned();
    }
    if let Some(width) = args.width {
        spec.image.width = width;
        sequence.film.width = width;
    }
    if let Some(height) = args.height {
        spec.image.height = height;
        sequence.film.height = height;
    }
    if let Some(spp) = args.spp {
        spec.renderer.samples_per_pixel = spp;
    }
    if spec.image.width == 0 || spec.image.height == 0 {
        bail!("image size {}x{} has no pixels", spec.image.width, spec.image.height);
    }
    Ok(loaded)
}

/// Renders every frame of the scene once.
pub fn render_once(
    args: &Args,
    orchestrator: &Orchestrator,
    cancel: &CancelToken,
) -> Result<RenderSummary> {
    let loaded = load(args)?;
    let settings = RenderSettings {
        seed: args.seed,
        frames_in_flight: args.frames_in_flight,
        ..RenderSettings::default()
    };
    let mut driver = FrameDriver::new(&loaded.spec, &loaded.sequence, settings)
        .context("scene has nothing to render")?
        .with_cancel(cancel.clone());

    if args.device != DeviceMode::Cpu && orchestrator.can_dispatch() {
        let device = DeviceRenderer::new(orchestrator)?;
        info!(target: "tpm::render", "Dispatching to {} platform(s)", device.platforms().len());
        driver = driver.with_device(device);
    }

    let summary = driver.run();
    info!(
        target: "tpm::render",
        "{} frame(s) written, {} failed{}",
        summary.frames_written,
        summary.frames_failed,
        if summary.cancelled { ", cancelled" } else { "" }
    );
    Ok(summary)
}

fn watch(
    args: &Args,
    path: &Path,
    orchestrator: &Orchestrator,
    cancel: &CancelToken,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let _watcher = watcher::start(path, tx)?;

    loop {
        if let Err(e) = render_once(args, orchestrator, cancel) {
            error!("{e:#}");
        }
        if cancel.is_cancelled() {
            return Ok(());
        }
        // Block for the next change, then swallow the burst editors emit on save.
        if rx.recv().is_err() {
            info!("Scene watcher closed");
            return Ok(());
        }
        while rx.try_recv().is_ok() {}
        info!("{} changed, rendering again", path.display());
    }
}
