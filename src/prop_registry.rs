use crate::stage::types::PartBounds;
use glam::Vec3;

/// One renderable sub-part of a placeable prototype, in prototype-local space.
#[derive(Clone, Debug)]
pub struct PropPart {
    pub label: String,
    pub offset: Vec3,
    pub bounds: PartBounds,
}

/// Template for placed and previewed instances.
#[derive(Clone, Debug)]
pub struct PropPrototype {
    pub name: String,
    pub parts: Vec<PropPart>,
}

impl PropPrototype {
    /// Single-part unit-box prototype; the default stand-in body.
    pub fn block(name: impl Into<String>) -> Self {
        let name = name.into();
        let part =
            PropPart { label: format!("{name}.body"), offset: Vec3::ZERO, bounds: PartBounds::unit() };
        Self { name, parts: vec![part] }
    }

    pub fn with_parts(name: impl Into<String>, parts: Vec<PropPart>) -> Self {
        Self { name: name.into(), parts }
    }
}

/// Ordered set of placeable prototypes. The placement engine addresses
/// entries by index and cycles over them.
#[derive(Default)]
pub struct PropRegistry {
    prototypes: Vec<PropPrototype>,
}

impl PropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, prototype: PropPrototype) {
        self.prototypes.push(prototype);
    }

    pub fn get(&self, index: usize) -> Option<&PropPrototype> {
        self.prototypes.get(index)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prototypes.iter().map(|prototype| prototype.name.as_str())
    }
}
