//! Build a cloth from a triangle mesh.

use super::Body;
use crate::arena::Handle;
use crate::fixtures::{SphereFixture, SphereFixtureDef, TriangleFixture, TriangleFixtureDef};
use crate::forces::{Force, ShearForceDef, SpringForceDef, StretchForceDef};
use crate::geometry::Mesh;
use crate::particle::{Particle, ParticleDef};
use glam::Vec3;
use std::collections::{HashMap, HashSet};

/// Cloth material and rest shape.
#[derive(Clone, Debug)]
pub struct ClothDef {
    /// Rest positions, one particle each.
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    /// Mass per unit area (kg/m^2).
    pub density: f32,
    /// Radius of the collision sphere around every particle (m).
    pub thickness: f32,
    pub friction: f32,
    pub stretching_stiffness: f32,
    pub stretching_damping: f32,
    pub shearing_stiffness: f32,
    pub shearing_damping: f32,
    /// Spring stiffness across shared edges. Zero skips bending springs.
    pub bending_stiffness: f32,
    pub bending_damping: f32,
    /// Mass damping applied to every particle (1/s).
    pub particle_damping: f32,
}

impl Default for ClothDef {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
            density: 0.2,
            thickness: 0.05,
            friction: 0.3,
            stretching_stiffness: 10_000.0,
            stretching_damping: 0.0,
            shearing_stiffness: 1_000.0,
            shearing_damping: 0.0,
            bending_stiffness: 100.0,
            bending_damping: 0.0,
            particle_damping: 0.0,
        }
    }
}

/// Handles of everything [`Body::create_cloth`] created. `particles[i]`
/// belongs to `vertices[i]`; the per-triangle vectors follow `triangles`.
#[derive(Clone, Debug, Default)]
pub struct Cloth {
    pub particles: Vec<Handle<Particle>>,
    pub sphere_fixtures: Vec<Handle<SphereFixture>>,
    pub triangle_fixtures: Vec<Handle<TriangleFixture>>,
    pub stretch_forces: Vec<Handle<Force>>,
    pub shear_forces: Vec<Handle<Force>>,
    pub bending_forces: Vec<Handle<Force>>,
}

impl Body {
    /// Build the cloth in one pass: fixtures go straight into storage and
    /// mass is redistributed once at the end. A triangle listed twice shares
    /// one fixture.
    pub fn create_cloth(&mut self, def: &ClothDef) -> Cloth {
        let mut cloth = Cloth::default();
        let mut fixtures: HashMap<[u32; 3], Handle<TriangleFixture>> = HashMap::new();

        for &x in &def.vertices {
            let p = self.create_particle(&ParticleDef {
                damping: def.particle_damping,
                ..ParticleDef::dynamic(x)
            });
            let mut sphere = SphereFixtureDef::new(p, def.thickness);
            sphere.friction = def.friction;
            cloth.sphere_fixtures.push(self.insert_sphere_fixture(&sphere));
            cloth.particles.push(p);
        }

        for t in &def.triangles {
            let [i1, i2, i3] = t.map(|i| i as usize);
            let p = [cloth.particles[i1], cloth.particles[i2], cloth.particles[i3]];
            let x = [def.vertices[i1], def.vertices[i2], def.vertices[i3]];

            let mut key = *t;
            key.sort_unstable();
            let handle = *fixtures.entry(key).or_insert_with(|| {
                let mut fixture = TriangleFixtureDef::new(p, x);
                fixture.density = def.density;
                fixture.radius = def.thickness;
                fixture.friction = def.friction;
                self.insert_triangle_fixture(&fixture)
            });
            cloth.triangle_fixtures.push(handle);

            let mut stretch = StretchForceDef::new(p[0], p[1], p[2], x[0], x[1], x[2]);
            stretch.stretching_stiffness_u = def.stretching_stiffness;
            stretch.stretching_stiffness_v = def.stretching_stiffness;
            stretch.damping_stiffness_u = def.stretching_damping;
            stretch.damping_stiffness_v = def.stretching_damping;
            cloth.stretch_forces.push(self.create_force(stretch));

            let mut shear = ShearForceDef::new(p[0], p[1], p[2], x[0], x[1], x[2]);
            shear.shearing_stiffness = def.shearing_stiffness;
            shear.damping_stiffness = def.shearing_damping;
            cloth.shear_forces.push(self.create_force(shear));
        }

        if def.bending_stiffness > 0.0 || def.bending_damping > 0.0 {
            // Wing vertices of each shared edge, once per edge.
            let mesh = Mesh::new(def.vertices.clone(), &def.triangles);
            let mut seen = HashSet::new();
            for t in &mesh.triangles {
                for edge in 0..3 {
                    let Some(wing) = t.wings[edge] else {
                        continue;
                    };
                    let opposite = t.v[(edge + 2) % 3];
                    if !seen.insert((opposite.min(wing), opposite.max(wing))) {
                        continue;
                    }
                    let (a, b) = (opposite as usize, wing as usize);
                    let mut spring = SpringForceDef::new(
                        cloth.particles[a],
                        def.vertices[a],
                        cloth.particles[b],
                        def.vertices[b],
                    );
                    spring.stiffness = def.bending_stiffness;
                    spring.damping_stiffness = def.bending_damping;
                    cloth.bending_forces.push(self.create_force(spring));
                }
            }
        }

        self.reset_mass();

        log::debug!(
            "created cloth: {} particles, {} triangles, {} bending springs",
            cloth.particles.len(),
            cloth.triangle_fixtures.len(),
            cloth.bending_forces.len()
        );
        cloth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_geometry::grid_mesh;

    fn sheet(columns: usize, rows: usize) -> ClothDef {
        let (vertices, triangles) = grid_mesh(columns, rows, 1.0);
        ClothDef {
            vertices,
            triangles,
            density: 3.0,
            ..ClothDef::default()
        }
    }

    #[test]
    fn test_cloth_counts() {
        let mut body = Body::new();
        let cloth = body.create_cloth(&sheet(2, 1));
        // 3 x 2 vertices, 4 triangles, one bending spring per interior edge.
        assert_eq!(cloth.particles.len(), 6);
        assert_eq!(cloth.sphere_fixtures.len(), 6);
        assert_eq!(cloth.triangle_fixtures.len(), 4);
        assert_eq!(cloth.stretch_forces.len(), 4);
        assert_eq!(cloth.shear_forces.len(), 4);
        assert_eq!(cloth.bending_forces.len(), 3);
        assert_eq!(body.forces().count(), 11);
    }

    #[test]
    fn test_cloth_mass_equals_density_times_area() {
        let mut body = Body::new();
        body.create_cloth(&sheet(3, 2));
        let total: f32 = body.particles().map(|(_, p)| p.mass()).sum();
        assert!((total - 3.0 * 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_cloth_at_rest_without_gravity() {
        let mut body = Body::new();
        body.set_gravity(Vec3::ZERO);
        let cloth = body.create_cloth(&sheet(2, 2));
        body.step(1.0 / 60.0, 2, 30);
        for p in cloth.particles {
            assert!(body.particle(p).unwrap().velocity().length() < 1e-3);
        }
    }

    #[test]
    fn test_cloth_matches_fixture_by_fixture_build() {
        let def = sheet(3, 2);
        let mut body = Body::new();
        let cloth = body.create_cloth(&def);

        let mut reference = Body::new();
        let particles: Vec<_> = def
            .vertices
            .iter()
            .map(|&x| reference.create_particle(&ParticleDef::dynamic(x)))
            .collect();
        for t in &def.triangles {
            let [a, b, c] = t.map(|i| i as usize);
            let mut fixture = TriangleFixtureDef::new(
                [particles[a], particles[b], particles[c]],
                [def.vertices[a], def.vertices[b], def.vertices[c]],
            );
            fixture.density = def.density;
            reference.create_triangle_fixture(&fixture);
        }

        for (i, &p) in cloth.particles.iter().enumerate() {
            let mass = body.particle(p).unwrap().mass();
            let expected = reference.particle(particles[i]).unwrap().mass();
            assert!((mass - expected).abs() < 1e-6, "vertex {i}: {mass} vs {expected}");
            assert!((body.particle(p).unwrap().inv_mass() - 1.0 / expected).abs() < 1e-4);
        }
        assert_eq!(body.tree.len(), def.triangles.len());
    }

    #[test]
    fn test_repeated_cloth_triangle_shares_fixture() {
        let mut def = ClothDef {
            bending_stiffness: 0.0,
            ..sheet(1, 1)
        };
        let first = def.triangles[0];
        def.triangles.push([first[1], first[2], first[0]]);
        let mut body = Body::new();
        let cloth = body.create_cloth(&def);
        assert_eq!(cloth.triangle_fixtures.len(), 3);
        assert_eq!(cloth.triangle_fixtures[0], cloth.triangle_fixtures[2]);
        assert_eq!(body.triangle_fixtures().count(), 2);
    }
}
