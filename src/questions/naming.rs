//! Shortest unambiguous noun phrases for scene objects.

use crate::error::GenerationError;
use crate::scene::SceneGraph;

/// Colors the simulator paints objects with.
pub const COLORS: [&str; 12] = [
    "black", "orange", "yellow", "brown", "purple", "cyan", "gray", "red", "white", "pink", "blue",
    "green",
];

/// Coarse object types as they appear in names. `fixed` renders as `fixed point`.
const TYPES: [&str; 5] = ["cube", "sphere", "pulley", "rope", "fixed"];
const PULLEY_SHAPES: [&str; 2] = ["hollow", "solid"];
const DYNAMICS: [&str; 2] = ["dynamic", "static"];

/// Descriptive tokens parsed out of a lowercased object name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NameParts {
    color: Option<&'static str>,
    kind: Option<&'static str>,
    pulley_shape: Option<&'static str>,
    dynamics: Option<&'static str>,
}

impl NameParts {
    fn parse(name: &str) -> Self {
        let tokens: Vec<&str> = name.split_whitespace().collect();
        let pick = |vocab: &[&'static str]| vocab.iter().copied().find(|word| tokens.contains(word));
        NameParts {
            color: pick(&COLORS),
            kind: pick(&TYPES).map(|t| if t == "fixed" { "fixed point" } else { t }),
            pulley_shape: pick(&PULLEY_SHAPES),
            dynamics: pick(&DYNAMICS),
        }
    }
}

/// Resolves raw object names to the shortest phrase that identifies the
/// object among everything currently in the scene.
pub struct NamingResolver<'a> {
    scene: &'a SceneGraph,
}

impl<'a> NamingResolver<'a> {
    pub fn new(scene: &'a SceneGraph) -> Self {
        Self { scene }
    }

    /// Produces the shortest unambiguous reference for `raw_name`.
    ///
    /// Tries `"{color} {type}"`, then adds the hollow/solid qualifier, then
    /// the dynamic/static qualifier. If none of these is unique the raw name
    /// is returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::UnparseableName`] if the name carries no known
    ///   color or type.
    /// - [`GenerationError::NoMatchingObject`] if no scene object has the
    ///   same color and type.
    pub fn resolve(&self, raw_name: &str) -> Result<String, GenerationError> {
        let name = raw_name.trim().to_lowercase();
        let target = NameParts::parse(&name);
        let (Some(color), Some(kind)) = (target.color, target.kind) else {
            return Err(GenerationError::UnparseableName(raw_name.to_string()));
        };

        let candidates: Vec<NameParts> = self
            .scene
            .objects()
            .map(|(_, obj)| NameParts::parse(&obj.name))
            .filter(|parts| parts.color == Some(color) && parts.kind == Some(kind))
            .collect();

        match candidates.len() {
            0 => return Err(GenerationError::NoMatchingObject(name)),
            1 => return Ok(format!("{color} {kind}")),
            _ => {}
        }

        if let Some(shape) = target.pulley_shape {
            let same_shape = candidates
                .iter()
                .filter(|parts| parts.pulley_shape == Some(shape))
                .count();
            if same_shape == 1 {
                return Ok(format!("{color} {shape} {kind}"));
            }
        }

        if let Some(dynamics) = target.dynamics {
            let same_dynamics = candidates
                .iter()
                .filter(|parts| parts.dynamics == Some(dynamics))
                .count();
            if same_dynamics <= 1 {
                return Ok(format!("{color} {dynamics} {kind}"));
            }
        }

        Ok(name)
    }
}
