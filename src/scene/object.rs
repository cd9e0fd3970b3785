//! Physical entities that make up a pulley scene.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    /// A block (cube or sphere) hanging from a rope.
    Object,
    Rope,
    Pulley,
    FixedPoint,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Object => "object",
            Self::Rope => "rope",
            Self::Pulley => "pulley",
            Self::FixedPoint => "fixed point",
        };
        f.write_str(s)
    }
}

/// Whether an object is free to move in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dynamics {
    Dynamic,
    Static,
}

/// Observed motion of an object. Objects are created stationary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    #[default]
    Stationary,
    Up,
    Down,
}

/// One physical entity in a scene.
///
/// `mass` and `tension` are `None` when the annotation does not provide them
/// (ropes carry no mass, blocks carry no tension).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalObject {
    pub color: String,
    pub shape: String,
    pub mass: Option<f64>,
    pub class: ObjectClass,
    pub dynamics: Dynamics,
    pub motion: Motion,
    pub tension: Option<f64>,
    /// Unique key within the scene, assigned on insertion.
    pub name: String,
}

impl PhysicalObject {
    /// Creates a stationary, unnamed object.
    pub fn new(
        color: impl Into<String>,
        shape: impl Into<String>,
        class: ObjectClass,
        dynamics: Dynamics,
    ) -> Self {
        Self {
            color: color.into(),
            shape: shape.into(),
            mass: None,
            class,
            dynamics,
            motion: Motion::Stationary,
            tension: None,
            name: String::new(),
        }
    }

    /// A dynamic cube or sphere with the given mass.
    pub fn block(color: impl Into<String>, shape: impl Into<String>, mass: f64) -> Self {
        Self::new(color, shape, ObjectClass::Object, Dynamics::Dynamic).with_mass(mass)
    }

    /// A rope carrying the given average tension.
    pub fn rope(color: impl Into<String>, tension: f64) -> Self {
        Self::new(color, "Rope", ObjectClass::Rope, Dynamics::Dynamic).with_tension(tension)
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = Some(tension);
        self
    }

    /// Compares every descriptive attribute except the name.
    ///
    /// Two objects for which this holds are the same entity as far as the
    /// scene is concerned.
    pub fn same_attributes(&self, other: &PhysicalObject) -> bool {
        self.color == other.color
            && self.mass == other.mass
            && self.shape == other.shape
            && self.dynamics == other.dynamics
            && self.class == other.class
            && self.motion == other.motion
            && self.tension == other.tension
    }

    /// Lowercased `"{color} {shape}"`, the form used in rendered questions.
    pub fn description(&self) -> String {
        format!("{} {}", self.color.to_lowercase(), self.shape.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_attributes_ignores_name() {
        let mut a = PhysicalObject::block("Red", "Cube", 2.0);
        let mut b = PhysicalObject::block("Red", "Cube", 2.0);
        a.name = "red cube".to_string();
        b.name = "another red cube".to_string();
        assert!(a.same_attributes(&b));
    }

    #[test]
    fn test_same_attributes_detects_mass_change() {
        let a = PhysicalObject::block("Red", "Cube", 2.0);
        let b = PhysicalObject::block("Red", "Cube", 2.5);
        assert!(!a.same_attributes(&b));
    }

    #[test]
    fn test_description_is_lowercase() {
        let rope = PhysicalObject::rope("Light Blue", 9.8);
        assert_eq!(rope.description(), "light blue rope");
        assert_eq!(rope.mass, None);
        assert_eq!(rope.motion, Motion::Stationary);
    }
}
