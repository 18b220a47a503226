//! Serde helpers for glam vectors.
//!
//! glam is built without its `serde` feature, so persisted structs route their
//! `Vec3` fields through these with `#[serde(with = "crate::serde_utils::vec3")]`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Serde proxy for Vec3
#[derive(Serialize, Deserialize)]
pub struct Vec3Def {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Def {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3Def> for Vec3 {
    fn from(def: Vec3Def) -> Self {
        Vec3::new(def.x, def.y, def.z)
    }
}

/// `#[serde(with = ...)]` module for a single `Vec3`.
pub mod vec3 {
    use super::Vec3Def;
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(v: &Vec3, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Vec3Def::from(*v).serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec3Def::deserialize(d).map(Vec3::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "vec3")]
        v: Vec3,
    }

    #[test]
    fn test_vec3_field_uses_named_components() {
        let json = serde_json::to_string(&Holder { v: Vec3::new(1.0, -2.0, 0.5) }).unwrap();
        assert_eq!(json, r#"{"v":{"x":1.0,"y":-2.0,"z":0.5}}"#);

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.v, Vec3::new(1.0, -2.0, 0.5));
    }
}
