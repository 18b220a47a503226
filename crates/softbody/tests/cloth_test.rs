//! Cloth integration tests.
//!
//! Tests cover:
//! - Ray casts against the triangle fixtures of a cloth
//! - Proxies following the cloth as it moves
//! - A cloth pinned at two corners hanging under gravity
//! - A cloth draping over a sphere

use softbody::{
    grid_mesh, Body, ClothDef, ParticleType, SphereShape, StepReport, Vec3, WorldFixtureDef,
};

const DT: f32 = 1.0 / 60.0;

fn sheet(columns: usize, rows: usize, spacing: f32) -> ClothDef {
    let (vertices, triangles) = grid_mesh(columns, rows, spacing);
    ClothDef {
        vertices,
        triangles,
        ..ClothDef::default()
    }
}

#[test]
fn test_ray_cast_hits_cloth_from_above() {
    let mut body = Body::new();
    let cloth = body.create_cloth(&sheet(4, 4, 0.25));

    let hit = body
        .ray_cast_single(Vec3::new(0.4, 1.0, 0.6), Vec3::new(0.4, -1.0, 0.6))
        .expect("ray crosses the sheet");
    assert!((hit.fraction - 0.5).abs() < 1e-4);
    assert!((hit.point - Vec3::new(0.4, 0.0, 0.6)).length() < 1e-4);
    assert!(hit.normal.y.abs() > 0.99);
    assert!(cloth.triangle_fixtures.contains(&hit.fixture));
}

#[test]
fn test_ray_cast_misses_outside_cloth() {
    let mut body = Body::new();
    body.create_cloth(&sheet(2, 2, 0.5));
    assert!(body
        .ray_cast_single(Vec3::new(3.0, 1.0, 3.0), Vec3::new(3.0, -1.0, 3.0))
        .is_none());
    // Segment that stops short of the sheet.
    assert!(body
        .ray_cast_single(Vec3::new(0.5, 1.0, 0.5), Vec3::new(0.5, 0.5, 0.5))
        .is_none());
}

#[test]
fn test_ray_cast_follows_falling_cloth() {
    let mut body = Body::new();
    body.set_gravity(Vec3::new(0.0, -10.0, 0.0));
    body.create_cloth(&sheet(2, 2, 0.5));

    for _ in 0..30 {
        body.step(DT, 2, 30);
    }
    let y = body.particles().map(|(_, p)| p.position().y).sum::<f32>() / body.particle_count() as f32;
    assert!(y < -1.0, "cloth did not fall: {y}");

    let hit = body
        .ray_cast_single(Vec3::new(0.5, 5.0, 0.5), Vec3::new(0.5, -20.0, 0.5))
        .expect("ray finds the moved cloth");
    assert!((hit.point.y - y).abs() < 0.1);
}

#[test]
fn test_pinned_cloth_hangs() {
    let mut body = Body::new();
    body.set_gravity(Vec3::new(0.0, -10.0, 0.0));
    let def = ClothDef {
        particle_damping: 2.0,
        ..sheet(4, 4, 0.25)
    };
    let cloth = body.create_cloth(&def);

    // Pin the two corners on the z = 0 edge.
    let pins = [cloth.particles[0], cloth.particles[4]];
    for p in pins {
        body.set_particle_type(p, ParticleType::Static);
    }

    let mut last = StepReport::default();
    for _ in 0..120 {
        last = body.step(DT, 2, 50);
    }
    assert_eq!(last.iterations, 2);

    for p in pins {
        assert_eq!(body.particle(p).unwrap().position().y, 0.0);
    }
    // The free far edge hangs below the pins but stays attached.
    let far = body.particle(cloth.particles[24]).unwrap().position();
    assert!(far.y < -0.5, "far corner at {far:?}");
    assert!(far.y > -2.0, "cloth tore loose: {far:?}");
    for (_, p) in body.particles() {
        assert!(p.position().is_finite());
    }
}

#[test]
fn test_cloth_drapes_over_sphere() {
    let mut body = Body::new();
    body.set_gravity(Vec3::new(0.0, -10.0, 0.0));
    let mut world = WorldFixtureDef::new(SphereShape::new(Vec3::new(0.5, -0.6, 0.5), 0.5));
    world.friction = 0.5;
    body.create_world_fixture(&world);

    let cloth = body.create_cloth(&sheet(4, 4, 0.25));
    for _ in 0..120 {
        body.step(DT, 2, 50);
    }

    // The centre vertex rests on top of the sphere.
    let centre = body.particle(cloth.particles[12]).unwrap().position();
    assert!(centre.y > -0.25, "centre fell through: {centre:?}");
    assert!(centre.y < 0.0);
    assert!(body.contact_count() > 0);
}
