use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use compute::{IdGenerator, Orchestrator};
use render::CancelToken;
use tpm::app;
use tpm::cli::Args;

const SCENE: &str = r##"{
    "image": { "path": "unused.png", "width": 24, "height": 16, "tileSize": 8 },
    "renderer": { "spp": 1 },
    "animation": { "start": 0, "end": 1, "fps": 2 },
    "scene": {
        "type": "translate", "z": 4,
        "child": { "type": "sphere", "r": 1, "material": { "type": "diffuse", "color": "#00ff00" } }
    }
}"##;

fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tpm-cli-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn renders_every_frame_of_a_scene_file() {
    let dir = workdir("frames");
    let scene = dir.join("scene.json");
    fs::write(&scene, SCENE).unwrap();
    let output = dir.join("out/{frame:02}.png");

    let args = Args::try_parse_from([
        OsStr::new("tpm"),
        scene.as_os_str(),
        OsStr::new("-o"),
        output.as_os_str(),
        OsStr::new("--device"),
        OsStr::new("cpu"),
    ])
    .unwrap();
    let orchestrator = Orchestrator::new(IdGenerator::with_seed(3));
    let summary = app::render_once(&args, &orchestrator, &CancelToken::new()).unwrap();
    assert_eq!((summary.frames_written, summary.frames_failed), (3, 0));

    for frame in 0..3 {
        let path = dir.join(format!("out/{frame:02}.png"));
        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (24, 16));
        assert_eq!(image.get_pixel(12, 8).0, [0, 255, 0], "{}", path.display());
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn cancelled_runs_write_nothing() {
    let dir = workdir("cancel");
    let scene = dir.join("scene.json");
    fs::write(&scene, SCENE).unwrap();
    let output = dir.join("{frame}.bmp");
    let argv = [OsStr::new("tpm"), scene.as_os_str(), OsStr::new("-o"), output.as_os_str()];
    let args = Args::try_parse_from(argv).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let orchestrator = Orchestrator::new(IdGenerator::with_seed(3));
    let summary = app::render_once(&args, &orchestrator, &cancel).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.frames_written, 0);
    assert!(!dir.join("0.bmp").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_scene_file_is_reported() {
    let args = Args::try_parse_from(["tpm", "no/such/scene.json"]).unwrap();
    let orchestrator = Orchestrator::new(IdGenerator::with_seed(3));
    let err = app::render_once(&args, &orchestrator, &CancelToken::new()).unwrap_err();
    assert!(format!("{err:#}").contains("no/such/scene.json"), "{err:#}");
}
