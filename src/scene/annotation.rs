//! Upstream simulator annotation format and its conversion into a [`SceneGraph`].
//!
//! The annotation is produced by the pulley simulator, one `outputs.json`
//! per video. Only the fields the question engine needs are modelled;
//! everything else is ignored during deserialization.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::counterfactual::CounterfactualRecord;
use super::graph::{normalize_name, SceneGraph};
use super::object::{Dynamics, ObjectClass, PhysicalObject};
use super::ordered::OrderedMap;
use crate::error::SceneError;

/// Parsed `outputs.json` of one simulated video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneAnnotation {
    pub validity: bool,

    /// Raw block name to simulated mass, in file order.
    #[serde(rename = "outputMass", default)]
    pub output_mass: OrderedMap<f64>,

    /// Chains of object names sharing one rope/pulley system, in physical order.
    #[serde(rename = "relatedGroups", default)]
    pub related_groups: Vec<Vec<String>>,

    /// Per rope group: rope name to the objects it is attached to.
    #[serde(rename = "relatedGroupsInRope", default)]
    pub related_groups_in_rope: Vec<OrderedMap<Vec<String>>>,

    /// `"{color} Rope"` to its tension readings. The first reading in the
    /// file is the rope's tension.
    #[serde(rename = "ResultTension", default)]
    pub result_tension: BTreeMap<String, OrderedMap<f64>>,

    /// Scenario id to its `"0"`/`"1"` halves, in file order.
    #[serde(rename = "CounterFactualAnnotations", default)]
    pub counterfactual_annotations: OrderedMap<OrderedMap<RawCounterfactual>>,
}

/// One counterfactual half as written by the simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCounterfactual {
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(rename = "TargetObj_Name", default)]
    pub target_obj_name: Option<String>,

    #[serde(rename = "TargetObj_Mass_Before_After", default)]
    pub target_obj_mass_before_after: Option<MassPair>,

    #[serde(rename = "ResultRotation", default)]
    pub result_rotation: OrderedMap<f64>,

    #[serde(rename = "ResultMotion", default)]
    pub result_motion: OrderedMap<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MassPair {
    #[serde(rename = "Item1")]
    pub item1: f64,
    #[serde(rename = "Item2")]
    pub item2: f64,
}

impl SceneAnnotation {
    /// Reads and parses an annotation file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn is_block(entry: &str) -> bool {
    entry.contains("ube") || entry.contains("phere")
}

fn is_dynamic_pulley(entry: &str) -> bool {
    entry.contains("ynamic")
}

/// Splits `"{color words} {suffix words}"` into the color and the suffix,
/// where the suffix is the last `suffix_len` tokens.
fn split_color<'a>(name: &'a str, suffix_len: usize) -> Result<(String, Vec<&'a str>), SceneError> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() <= suffix_len {
        return Err(SceneError::UnparseableName(name.to_string()));
    }
    let (color, suffix) = tokens.split_at(tokens.len() - suffix_len);
    Ok((color.join(" "), suffix.to_vec()))
}

/// Strips a parenthesised suffix but keeps the original casing.
fn display_name(raw: &str) -> &str {
    raw.split('(').next().unwrap_or(raw).trim()
}

/// Rounds a simulated mass up to the next hundredth and checks it lies on the
/// 0.05 grid the simulator samples from.
fn quantize_mass(object: &str, mass: f64) -> Result<f64, SceneError> {
    let hundredths = (mass * 100.0 - 1e-9).ceil();
    let quantized = hundredths / 100.0;
    if (hundredths as i64) % 5 != 0 {
        return Err(SceneError::UnexpectedMassPrecision {
            object: object.to_string(),
            mass: quantized,
        });
    }
    Ok(quantized)
}

impl SceneGraph {
    /// Builds the scene graph of an annotation.
    ///
    /// Returns `Ok(None)` for annotations the simulator flagged invalid.
    ///
    /// # Errors
    ///
    /// Any [`SceneError`] signals corrupted annotation data; no partial scene
    /// is returned.
    pub fn from_annotation(annotation: SceneAnnotation) -> Result<Option<Self>, SceneError> {
        if !annotation.validity {
            return Ok(None);
        }

        let mut scene = SceneGraph::new();
        scene.add_blocks(&annotation.output_mass)?;
        for group in &annotation.related_groups {
            scene.add_related_group(group)?;
        }
        for group in &annotation.related_groups_in_rope {
            scene.add_rope_group(group, &annotation.result_tension)?;
        }
        for group in &annotation.related_groups_in_rope {
            for linked in group.values() {
                for name in linked {
                    scene.add_support(name)?;
                }
            }
        }

        for (scenario, mut halves) in annotation.counterfactual_annotations {
            match (halves.remove("0"), halves.remove("1")) {
                (Some(first), Some(second)) => {
                    scene.add_counterfactual(CounterfactualRecord::from_raw(
                        format!("{scenario}_0"),
                        first,
                    )?);
                    scene.add_counterfactual(CounterfactualRecord::from_raw(
                        format!("{scenario}_1"),
                        second,
                    )?);
                }
                _ => {
                    tracing::warn!(scenario = %scenario, "Counterfactual scenario is missing a half, skipping");
                }
            }
        }

        Ok(Some(scene))
    }

    fn add_blocks(&mut self, masses: &OrderedMap<f64>) -> Result<(), SceneError> {
        for (raw_name, mass) in masses {
            let name = display_name(raw_name);
            let (color, shape) = split_color(name, 1)?;
            let shape = shape.concat();
            let mass = quantize_mass(name, *mass)?;

            // A later record for the same color and shape updates the mass in place.
            let existing = self
                .objects()
                .find(|(_, obj)| obj.color == color && obj.shape == shape)
                .map(|(id, _)| id);
            if let Some(obj) = existing.and_then(|id| self.get_mut(id)) {
                obj.mass = Some(mass);
                continue;
            }

            self.add_object(PhysicalObject::block(color, shape, mass), &normalize_name(raw_name));
        }
        Ok(())
    }

    fn add_related_group(&mut self, group: &[String]) -> Result<(), SceneError> {
        let members: Vec<_> = group
            .iter()
            .map(|raw| normalize_name(raw))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|name| self.id_of(&name))
            .collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                self.add_relation(*a, *b);
            }
        }

        for (i, entry) in group.iter().enumerate() {
            if is_dynamic_pulley(entry) {
                self.link_through_dynamic_pulley(group, i)?;
            }
            if is_block(entry) {
                self.map_block_to_rope(group, i)?;
            }
        }
        Ok(())
    }

    /// A block two positions away from a dynamic pulley hangs from it.
    /// When blocks sit on both sides the one after the pulley wins.
    fn link_through_dynamic_pulley(&mut self, group: &[String], i: usize) -> Result<(), SceneError> {
        let before = i.checked_sub(2).and_then(|j| group.get(j));
        let after = group.get(i + 2);
        let linked = after
            .filter(|e| is_block(e))
            .or(before.filter(|e| is_block(e)));

        if let Some(entry) = linked {
            let name = normalize_name(entry);
            let id = self
                .id_of(&name)
                .ok_or_else(|| SceneError::UnknownObject(name.clone()))?;
            self.link_dynamic_pulley(id);
        }
        Ok(())
    }

    fn map_block_to_rope(&mut self, group: &[String], i: usize) -> Result<(), SceneError> {
        if group.len() < 2 {
            return Ok(());
        }
        let object = normalize_name(&group[i]);
        let last = group.len() - 1;

        let rope = if i == 0 || i == last {
            let neighbour = if i == 0 { &group[1] } else { &group[i - 1] };
            if !neighbour.to_lowercase().contains("rope") {
                return Ok(());
            }
            neighbour
        } else if group.get(i + 2).is_some_and(|e| is_dynamic_pulley(e)) {
            &group[i + 1]
        } else if i >= 2 && is_dynamic_pulley(&group[i - 2]) {
            &group[i - 1]
        } else if group[i - 1].contains("ope") {
            &group[i - 1]
        } else if group[i + 1].contains("ope") {
            &group[i + 1]
        } else {
            return Err(SceneError::RopeLinkNotFound {
                object,
                group: group.to_vec(),
            });
        };

        self.add_rope_map(&object, &normalize_name(rope));
        Ok(())
    }

    fn add_rope_group(
        &mut self,
        group: &OrderedMap<Vec<String>>,
        tensions: &BTreeMap<String, OrderedMap<f64>>,
    ) -> Result<(), SceneError> {
        let mut ropes = Vec::with_capacity(group.len());
        for raw_name in group.keys() {
            let name = display_name(raw_name);
            let (color, _) = split_color(name, 1)?;
            let key = format!("{color} Rope");
            let tension = tensions
                .get(&key)
                .and_then(OrderedMap::first)
                .ok_or(SceneError::MissingTension(key))?;

            let rope_name = name.to_lowercase();
            if self.add_object(PhysicalObject::rope(color, tension.abs()), &rope_name) {
                if let Some(id) = self.id_of(&rope_name) {
                    ropes.push(id);
                }
            }
        }

        for (i, a) in ropes.iter().enumerate() {
            for b in &ropes[i + 1..] {
                self.add_relation(*a, *b);
            }
        }
        Ok(())
    }

    /// Inserts a fixed point or pulley named in a rope group. Blocks and
    /// anything else are already known or irrelevant.
    fn add_support(&mut self, raw_name: &str) -> Result<(), SceneError> {
        let name = display_name(raw_name);
        let obj = if raw_name.contains("Fixed Point") {
            let (color, _) = split_color(name, 2)?;
            PhysicalObject::new(color, "Fixed Point", ObjectClass::FixedPoint, Dynamics::Static)
        } else if raw_name.contains("Dynamic Pulley") || raw_name.contains("Static Pulley") {
            let (color, suffix) = split_color(name, 3)?;
            let dynamics = if raw_name.contains("Dynamic Pulley") {
                Dynamics::Dynamic
            } else {
                Dynamics::Static
            };
            PhysicalObject::new(color, format!("{} Pulley", suffix[0]), ObjectClass::Pulley, dynamics)
        } else {
            return Ok(());
        };

        self.add_object(obj, &normalize_name(raw_name));
        Ok(())
    }
}
