// Runs the `tpm` kernel on every wgpu platform and compares the result with
// the native marcher. Machines without adapters skip the comparison.

#[cfg(feature = "gpu")]
mod wgpu_parity {
    use compute::{ApiHost, IdGenerator, Orchestrator, WgpuApi};
    use glam::Vec3;
    use render::{DeviceRenderer, FrameDriver, Image, RenderSettings, Sequence, KERNEL_SOURCE};
    use sdf::{MarchConfig, MaterialKind, SceneBuilder, TpmSpec};

    const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const GRAY: Vec3 = Vec3::new(0.5, 0.5, 0.5);

    /// Exact union tie on the left, inherited material on the right, an
    /// overridden floor material and background everywhere else.
    fn scene() -> TpmSpec {
        let mut b = SceneBuilder::new();
        let red = b.material(MaterialKind::Emission, RED, [1.0, 0.0]);
        let blue = b.material(MaterialKind::Diffuse, Vec3::new(0.0, 0.0, 1.0), [0.0; 2]);
        let green = b.material(MaterialKind::Diffuse, GREEN, [0.0; 2]);
        let white = b.material(MaterialKind::Diffuse, Vec3::ONE, [0.0; 2]);
        let gray = b.material(MaterialKind::Glossy, GRAY, [0.2, 0.0]);

        let a = b.sphere(1.0);
        let a = b.with_material(a, red);
        let twin = b.sphere(1.0);
        let twin = b.with_material(twin, blue);
        let tie = b.union(a, twin);
        let left = b.translate(Vec3::new(-1.5, 0.0, 6.0), tie);

        let plain = b.sphere(1.0);
        let right = b.translate(Vec3::new(1.5, 0.0, 6.0), plain);
        let right = b.with_material(right, green);

        let slab = b.cuboid(Vec3::new(4.0, 0.1, 4.0));
        let slab = b.with_material(slab, white);
        let floor = b.translate(Vec3::new(0.0, -1.2, 6.0), slab);
        let floor = b.with_material(floor, gray);

        let pair = b.union(left, right);
        let root = b.union(pair, floor);
        let mut spec = b.build(root);
        spec.image.width = 48;
        spec.image.height = 32;
        spec.image.tile_size = 16;
        spec.renderer.samples_per_pixel = 2;
        spec
    }

    fn platform_orchestrator(seed: u64) -> Option<Orchestrator> {
        let mut orchestrator = Orchestrator::new(IdGenerator::with_seed(seed));
        orchestrator.push_host(Box::new(ApiHost::new(WgpuApi::new())));
        orchestrator.discover();
        orchestrator.initialize().then_some(orchestrator)
    }

    fn mismatches(device: &Image, native: &Image) -> usize {
        device
            .pixels()
            .iter()
            .zip(native.pixels())
            .filter(|(d, n)| (**d - **n).abs().max_element() > 1e-3)
            .count()
    }

    #[test]
    fn kernel_matches_native_marcher_on_every_platform() {
        let Some(discovery) = platform_orchestrator(21) else {
            eprintln!("no wgpu adapters, skipping");
            return;
        };
        let platforms: Vec<_> = discovery.platforms().iter().map(|p| p.uuid()).collect();
        drop(discovery);

        let spec = scene();
        let sequence = Sequence::still(&spec);
        let frame = sequence.instance(0);
        let driver = FrameDriver::new(&spec, &sequence, RenderSettings::default()).unwrap();
        let native = driver.render_native(&frame);
        assert_eq!(native.get(12, 16), Some(RED), "union tie keeps the first child");
        assert_eq!(native.get(35, 16), Some(GREEN), "translate material reaches its child");
        assert_eq!(native.get(0, 0), Some(Vec3::ZERO), "miss shows the background");

        for platform in platforms {
            let Some(mut orchestrator) = platform_orchestrator(21) else { continue };
            if !orchestrator.compile_platforms(&[platform], KERNEL_SOURCE) {
                eprintln!("platform {platform} cannot build the kernel, skipping");
                continue;
            }
            let device = DeviceRenderer::new(&orchestrator).unwrap();
            let march = MarchConfig::default();
            let image = device
                .render(&spec, &march, &frame.camera, (48, 32), driver.frame_seed(0))
                .unwrap();

            // Silhouette pixels may land on either side of a surface.
            let differing = mismatches(&image, &native);
            assert!(
                differing * 50 <= native.pixels().len(),
                "{platform}: {differing} pixels differ"
            );
            assert_eq!(image.get(12, 16), Some(RED));
            assert_eq!(image.get(35, 16), Some(GREEN));
            assert_eq!(image.get(0, 0), Some(Vec3::ZERO));
        }
    }
}
