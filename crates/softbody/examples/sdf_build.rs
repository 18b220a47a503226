//! Bake a signed distance field for a box, save it, reload it and probe it.
//!
//! Run with: RUST_LOG=info cargo run -p softbody --example sdf_build --release [-- out.json]

use softbody::{box_mesh, Sdf, Vec3};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("softbody_box_sdf.json"));

    let mesh = box_mesh(Vec3::new(0.5, 0.25, 1.0));
    let sdf = Sdf::build(&mesh, Vec3::splat(0.05), 0.25);
    let grid = sdf.voxel_grid();
    println!(
        "Built {}x{}x{} voxels over {:?}",
        grid.width(),
        grid.height(),
        grid.depth(),
        sdf.aabb()
    );

    sdf.save_json(&path)?;
    println!("Saved to {}", path.display());

    let loaded = Sdf::load_json(&path)?;
    for probe in [
        Vec3::ZERO,
        Vec3::new(0.4, 0.0, 0.0),
        Vec3::new(0.0, 0.4, 0.0),
        Vec3::new(0.6, 0.3, -1.1),
    ] {
        if loaded.contains(probe) {
            println!(
                "d({:?}) = {:+.4}  n = {:?}",
                probe,
                loaded.distance(probe),
                loaded.normal(probe)
            );
        } else {
            println!("{:?} is outside the field", probe);
        }
    }
    Ok(())
}
