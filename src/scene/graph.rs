//! The scene graph: objects, rope/pulley relations and mechanical-advantage links.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::counterfactual::CounterfactualRecord;
use super::object::{ObjectClass, PhysicalObject};

/// Stable handle of an object inside one [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

/// Normalizes a simulator name into a scene key: drops any parenthesised
/// suffix such as `(Clone)`, trims and lowercases.
pub fn normalize_name(raw: &str) -> String {
    raw.split('(').next().unwrap_or(raw).trim().to_lowercase()
}

/// In-memory model of one annotated scene.
///
/// A scene graph is built once per annotation file and discarded after its
/// questions are generated; nothing is shared between scenes.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    objects: BTreeMap<ObjectId, PhysicalObject>,
    next_id: usize,
    names: HashMap<String, ObjectId>,
    relations: HashMap<ObjectId, BTreeSet<ObjectId>>,
    rope_map: HashMap<String, String>,
    dynamic_pulley_links: BTreeSet<ObjectId>,
    counterfactuals: BTreeMap<String, CounterfactualRecord>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `obj` under `name` unless an object with identical attributes
    /// is already present.
    ///
    /// Insertion is idempotent by value: a later duplicate is dropped, never
    /// merged. Returns whether the object was inserted.
    pub fn add_object(&mut self, mut obj: PhysicalObject, name: &str) -> bool {
        if self.objects.values().any(|existing| existing.same_attributes(&obj)) {
            return false;
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        obj.name = name.to_string();
        self.names.insert(name.to_string(), id);
        self.objects.insert(id, obj);
        true
    }

    /// Removes an object together with every relation touching it.
    ///
    /// Scene construction never deletes objects; this exists for callers
    /// that curate scenes by hand. Returns the removed object.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<PhysicalObject> {
        let obj = self.objects.remove(&id)?;
        self.names.retain(|_, v| *v != id);
        if let Some(neighbours) = self.relations.remove(&id) {
            for other in neighbours {
                if let Some(set) = self.relations.get_mut(&other) {
                    set.remove(&id);
                }
            }
        }
        self.dynamic_pulley_links.remove(&id);
        Some(obj)
    }

    /// Adds the symmetric relation `a <-> b`.
    ///
    /// Returns `false` if either endpoint is unknown; adding an existing edge
    /// is a successful no-op.
    pub fn add_relation(&mut self, a: ObjectId, b: ObjectId) -> bool {
        if !self.objects.contains_key(&a) || !self.objects.contains_key(&b) {
            return false;
        }
        self.relations.entry(a).or_default().insert(b);
        self.relations.entry(b).or_default().insert(a);
        true
    }

    /// Removes the symmetric relation `a <-> b`, returning whether it existed.
    pub fn remove_relation(&mut self, a: ObjectId, b: ObjectId) -> bool {
        let existed = self.relations.get_mut(&a).is_some_and(|set| set.remove(&b));
        if existed {
            if let Some(set) = self.relations.get_mut(&b) {
                set.remove(&a);
            }
        }
        existed
    }

    pub fn check_relation(&self, a: ObjectId, b: ObjectId) -> bool {
        self.relations.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// Objects sharing a rope/pulley group with `id`.
    pub fn related(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.relations.get(&id).into_iter().flatten().copied()
    }

    /// First block (class `object`) with the given color.
    ///
    /// When several blocks share a color the earliest inserted wins; callers
    /// must not rely on which one that is.
    pub fn find_by_color(&self, color: &str) -> Option<&PhysicalObject> {
        self.objects
            .values()
            .find(|obj| obj.color == color && obj.class == ObjectClass::Object)
    }

    /// Records which rope directly holds an object. Both names are trimmed
    /// and lowercased; a later mapping for the same object replaces the earlier one.
    pub fn add_rope_map(&mut self, object_name: &str, rope_name: &str) {
        self.rope_map.insert(
            object_name.trim().to_lowercase(),
            rope_name.trim().to_lowercase(),
        );
    }

    /// Name of the rope holding `object_name`, if known.
    pub fn rope_for(&self, object_name: &str) -> Option<&str> {
        self.rope_map
            .get(&object_name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Marks `id` as hanging from a dynamic pulley.
    pub fn link_dynamic_pulley(&mut self, id: ObjectId) {
        self.dynamic_pulley_links.insert(id);
    }

    /// Whether `id` belongs to the mechanical-advantage set.
    pub fn has_mechanical_advantage(&self, id: ObjectId) -> bool {
        self.dynamic_pulley_links.contains(&id)
    }

    pub fn add_counterfactual(&mut self, record: CounterfactualRecord) {
        self.counterfactuals
            .insert(record.scenario_id.clone(), record);
    }

    /// Counterfactual scenarios ordered by scenario id.
    pub fn counterfactuals(&self) -> impl Iterator<Item = &CounterfactualRecord> {
        self.counterfactuals.values()
    }

    pub fn id_of(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: ObjectId) -> Option<&PhysicalObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PhysicalObject> {
        self.objects.get_mut(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&PhysicalObject> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// All objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &PhysicalObject)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
