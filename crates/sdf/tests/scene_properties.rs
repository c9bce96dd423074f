use glam::Vec3;
use sdf::{Marcher, MaterialHandle, MaterialKind, SceneBuilder, SceneLimits, EPSILON, MAX_T};

#[test]
fn sphere_at_origin_is_minus_radius_everywhere_inside() {
    for r in [0.5f32, 1.0, 2.0, 10.0] {
        let mut b = SceneBuilder::new();
        let s = b.sphere(r);
        let spec = b.build(s);
        assert_eq!(spec.nodes.evaluate(Vec3::ZERO, s).0, -r);
        let d = 7.0;
        assert_eq!(spec.nodes.evaluate(Vec3::new(0.0, d, 0.0), s).0, d - r);
    }
}

#[test]
fn union_is_min_with_matching_material() {
    let mut b = SceneBuilder::new();
    let ma = b.material(MaterialKind::Diffuse, Vec3::X, [0.0; 2]);
    let mb = b.material(MaterialKind::Glossy, Vec3::Y, [0.3, 0.0]);
    let sa = b.sphere(1.0);
    let sa = b.with_material(sa, ma);
    let sb = b.cuboid(Vec3::new(0.5, 0.5, 0.5));
    let sb = b.with_material(sb, mb);
    let tb = b.translate(Vec3::new(2.0, 0.0, 0.0), sb);
    let u = b.union(sa, tb);
    let spec = b.build(u);

    let points = [
        Vec3::new(-3.0, 0.0, 0.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.2, -2.0, 0.7),
    ];
    for p in points {
        let (da, a) = spec.nodes.evaluate(p, sa);
        let (db, bm) = spec.nodes.evaluate(p, tb);
        let (d, m) = spec.nodes.evaluate(p, u);
        assert_eq!(d, da.min(db));
        assert_eq!(m, if db < da { bm } else { a });
    }
    assert_eq!(spec.nodes.evaluate(Vec3::new(-3.0, 0.0, 0.0), u).1, Some(MaterialHandle(0)));
    assert_eq!(spec.nodes.evaluate(Vec3::new(4.0, 0.0, 0.0), u).1, Some(MaterialHandle(1)));
}

#[test]
fn union_chains_pick_the_nearest_of_many() {
    let mut b = SceneBuilder::new();
    let mut root = None;
    for i in 0..8u8 {
        let m = b.material(MaterialKind::Emission, Vec3::splat(f32::from(i) / 8.0), [1.0, 0.0]);
        let s = b.sphere(0.5);
        let s = b.with_material(s, m);
        let t = b.translate(Vec3::new(f32::from(i) * 2.0, 0.0, 10.0), s);
        root = Some(match root {
            None => t,
            Some(r) => b.union(r, t),
        });
    }
    let spec = b.build(root.unwrap());
    assert!(spec.validate(&SceneLimits::default()).is_ok());

    let (d, m) = spec.nodes.evaluate(Vec3::new(6.0, 0.0, 10.0), spec.root().unwrap());
    assert_eq!(d, -0.5);
    assert_eq!(m, Some(MaterialHandle(3)));
}

#[test]
fn marcher_converges_on_offset_sphere_and_escapes_behind() {
    let mut b = SceneBuilder::new();
    let m = b.material(MaterialKind::Emission, Vec3::new(0.25, 0.5, 1.0), [1.0, 0.0]);
    let s = b.sphere(1.0);
    let s = b.with_material(s, m);
    let root = b.translate(Vec3::new(0.0, 0.0, 5.0), s);
    let spec = b.build(root);
    let marcher = Marcher::new(&spec).unwrap();

    let hit = marcher.trace(Vec3::ZERO, Vec3::Z);
    assert!(hit.hit && (hit.t - 4.0).abs() <= EPSILON);
    assert_eq!(marcher.march(Vec3::ZERO, Vec3::Z), Vec3::new(0.25, 0.5, 1.0));

    let miss = marcher.trace(Vec3::ZERO, Vec3::NEG_Z);
    assert!(!miss.hit);
    assert!(miss.t >= MAX_T);
    assert_eq!(marcher.march(Vec3::ZERO, Vec3::NEG_Z), Vec3::ZERO);
}
