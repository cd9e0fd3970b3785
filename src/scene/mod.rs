//! Scene model: typed physical objects, their rope/pulley relations and
//! the counterfactual outcomes recorded for them.
//!
//! A [`SceneGraph`] is built from one simulator annotation with
//! [`SceneGraph::from_annotation`] and then only queried.

pub mod annotation;
pub mod counterfactual;
pub mod graph;
pub mod object;
pub mod ordered;

pub use annotation::{MassPair, RawCounterfactual, SceneAnnotation};
pub use counterfactual::{
    CounterfactualRecord, MassChange, Outcome, ScenarioMode, CHANGE_ONE_OBJECT_MASS,
};
pub use graph::{normalize_name, ObjectId, SceneGraph};
pub use object::{Dynamics, Motion, ObjectClass, PhysicalObject};
pub use ordered::OrderedMap;
