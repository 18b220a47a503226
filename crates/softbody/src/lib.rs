//! Implicit Soft-Body and Cloth Dynamics
//!
//! Particles coupled by stretch, shear, spring and drag forces, integrated
//! with backward Euler. Each step assembles the force Jacobians into a sparse
//! 3x3-block matrix and solves the linear system with Jacobi-preconditioned
//! conjugate gradient. Particles collide with world shapes (spheres,
//! capsules, boxes, triangles, meshes and signed distance fields) through
//! penalty contacts with Coulomb friction.
//!
//! # Example
//!
//! ```
//! use softbody::{Body, ParticleDef, SphereFixtureDef, TestFloor, Vec3, WorldFixtureDef};
//!
//! let mut body = Body::new();
//! body.set_gravity(Vec3::new(0.0, -10.0, 0.0));
//!
//! let p = body.create_particle(&ParticleDef::dynamic(Vec3::new(0.0, 1.0, 0.0)));
//! body.create_sphere_fixture(&SphereFixtureDef::new(p, 0.1));
//! body.create_world_fixture(&WorldFixtureDef::new(TestFloor::new(0.0).shape()));
//!
//! for _ in 0..60 {
//!     body.step(1.0 / 60.0, 2, 20);
//! }
//! assert!(body.particle(p).unwrap().position().y < 1.0);
//! ```

pub mod arena;
pub mod body;
pub mod constants;
pub mod contact;
pub mod fixtures;
pub mod forces;
pub mod geometry;
pub mod math;
pub mod particle;
pub mod serde_utils;
pub mod settings;
pub mod shapes;
pub mod sparse;
pub mod test_geometry;

pub use arena::{Arena, Handle};
pub use body::{Body, BodyRayCastHit, Cloth, ClothDef, StepReport};
pub use contact::SphereShapeContact;
pub use fixtures::{
    SphereFixture, SphereFixtureDef, TetrahedronFixture, TetrahedronFixtureDef, TriangleFixture,
    TriangleFixtureDef, WorldFixture, WorldFixtureDef,
};
pub use forces::{
    Force, ForceDef, MouseForceDef, ShearForceDef, SpringForceDef, StretchForceDef,
};
pub use geometry::{Aabb, Mesh, RayCastInput, RayCastOutput, Sdf, Sphere, SphereManifold, VoxelGrid};
pub use glam::{Mat3, Quat, Vec3};
pub use math::Transform;
pub use particle::{Particle, ParticleDef, ParticleType};
pub use settings::BodySettings;
pub use shapes::{BoxShape, CapsuleShape, MeshShape, SdfShape, Shape, SphereShape, TriangleShape};
pub use test_geometry::{box_mesh, grid_mesh, TestFloor};
