use compute::{ApiHost, IdGenerator, MockApi, MockDevice, MockEvent, MockPlatform, Orchestrator};
use glam::Vec3;
use render::{DeviceError, DeviceRenderer, FrameDriver, RenderSettings, Sequence, KERNEL_SOURCE};
use sdf::{MaterialKind, SceneBuilder, TpmSpec};

fn red_ball(width: u32, height: u32) -> TpmSpec {
    let mut b = SceneBuilder::new();
    let red = b.material(MaterialKind::Diffuse, Vec3::new(1.0, 0.0, 0.0), [0.0; 2]);
    let s = b.sphere(1.0);
    let s = b.with_material(s, red);
    let root = b.translate(Vec3::new(0.0, 0.0, 5.0), s);
    let mut spec = b.build(root);
    spec.image.width = width;
    spec.image.height = height;
    spec.image.tile_size = 8;
    spec
}

fn compiled(platforms: Vec<MockPlatform>) -> (Orchestrator, std::sync::Arc<compute::MockLog>) {
    let api = MockApi::new(platforms);
    let log = api.log();
    let mut orchestrator = Orchestrator::new(IdGenerator::with_seed(11));
    orchestrator.push_host(Box::new(ApiHost::new(api)));
    orchestrator.discover();
    assert!(orchestrator.initialize());
    orchestrator.compile(KERNEL_SOURCE);
    (orchestrator, log)
}

#[test]
fn device_frames_come_from_the_dispatched_kernel() {
    // The mock runtime returns zeroed buffers, so a black frame proves the
    // device path produced it rather than the native marcher.
    let (orchestrator, log) = compiled(vec![
        MockPlatform::new("alpha").with_device(MockDevice::new("a0")),
        MockPlatform::new("beta").with_device(MockDevice::new("b0")),
    ]);
    let spec = red_ball(16, 10);
    let sequence = Sequence::still(&spec);
    let device = DeviceRenderer::new(&orchestrator).unwrap();
    assert_eq!(device.platforms().len(), 2);

    let driver =
        FrameDriver::new(&spec, &sequence, RenderSettings::default()).unwrap().with_device(device);
    let image = driver.render_frame(&sequence.instance(0));
    assert!(image.pixels().iter().all(|&p| p == Vec3::ZERO));

    let dispatches: Vec<(String, [u32; 3])> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MockEvent::Dispatch { platform, workgroups } => Some((platform, workgroups)),
            _ => None,
        })
        .collect();
    assert_eq!(dispatches.len(), 2, "one band per platform");
    for (_, workgroups) in &dispatches {
        assert_eq!(*workgroups, [2, 1, 1]);
    }
}

#[test]
fn failed_dispatch_falls_back_to_the_native_path() {
    let (orchestrator, _log) = compiled(vec![
        MockPlatform::new("flaky").with_device(MockDevice::new("f0")).failing_dispatch(),
    ]);
    let spec = red_ball(16, 16);
    let sequence = Sequence::still(&spec);
    let device = DeviceRenderer::new(&orchestrator).unwrap();
    let driver = FrameDriver::new(&spec, &sequence, RenderSettings::default()).unwrap();
    let native = driver.render_native(&sequence.instance(0));

    let driver = driver.with_device(device);
    let image = driver.render_frame(&sequence.instance(0));
    assert_eq!(image, native);
    assert_eq!(image.get(8, 8), Some(Vec3::new(1.0, 0.0, 0.0)));
}

#[test]
fn no_compiled_platform_means_no_device_renderer() {
    let (orchestrator, _log) = compiled(vec![
        MockPlatform::new("broken")
            .with_device(MockDevice::new("x0"))
            .failing_build("syntax error"),
    ]);
    assert!(!orchestrator.can_dispatch());
    assert!(matches!(DeviceRenderer::new(&orchestrator), Err(DeviceError::NoDispatchPlatforms)));
}
