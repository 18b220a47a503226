//! Drop a cloth onto a sphere resting on the floor and report how it settles.
//!
//! Run with: RUST_LOG=debug cargo run -p softbody --example cloth_drop --release

use rand::{rngs::StdRng, Rng, SeedableRng};
use softbody::{grid_mesh, Body, ClothDef, SphereShape, TestFloor, Vec3, WorldFixtureDef};

const DT: f32 = 1.0 / 60.0;
const TOTAL_TIME: f32 = 4.0;
const REPORT_EVERY: usize = 30;
const FORCE_ITERATIONS: usize = 2;
const CG_ITERATIONS: usize = 50;

fn main() {
    env_logger::init();

    let mut body = Body::new();

    let mut floor = WorldFixtureDef::new(TestFloor::new(0.0).shape());
    floor.friction = 0.6;
    body.create_world_fixture(&floor);

    let mut ball = WorldFixtureDef::new(SphereShape::new(Vec3::new(1.0, 0.5, 1.0), 0.5));
    ball.friction = 0.4;
    body.create_world_fixture(&ball);

    // Jitter the sheet slightly so it does not fold symmetrically.
    let (mut vertices, triangles) = grid_mesh(16, 16, 0.125);
    let mut rng = StdRng::seed_from_u64(7);
    for v in &mut vertices {
        v.y = 1.5 + rng.gen_range(-0.005..0.005);
    }

    let cloth = body.create_cloth(&ClothDef {
        vertices,
        triangles,
        particle_damping: 0.1,
        ..ClothDef::default()
    });
    println!(
        "Cloth: {} particles, {} triangles, {} forces",
        cloth.particles.len(),
        cloth.triangle_fixtures.len(),
        body.forces().count()
    );

    let steps = (TOTAL_TIME / DT).round() as usize;
    for step in 1..=steps {
        let report = body.step(DT, FORCE_ITERATIONS, CG_ITERATIONS);
        if step % REPORT_EVERY == 0 {
            let lowest = body
                .particles()
                .map(|(_, p)| p.position().y)
                .fold(f32::INFINITY, f32::min);
            println!(
                "t={:5.2}s  contacts={:4}  cg=[{:2}, {:2}]  lowest={:+.3}  energy={:.4}",
                step as f32 * DT,
                report.contact_count,
                report.min_sub_iterations,
                report.max_sub_iterations,
                lowest,
                body.energy()
            );
        }
    }

    let hit = body.ray_cast_single(Vec3::new(1.0, 3.0, 1.0), Vec3::new(1.0, -1.0, 1.0));
    match hit {
        Some(hit) => println!("Cloth top over the ball at y={:.3}", hit.point.y),
        None => println!("Cloth slid off the ball"),
    }
}
