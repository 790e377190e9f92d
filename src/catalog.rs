use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Opaque reference to an animation asset held by the asset source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationHandle(Arc<str>);

impl AnimationHandle {
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    pub fn uri(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationEntry {
    pub name: String,
    pub handle: AnimationHandle,
}

/// Asset-source collaborator: enumerates animation definitions by collection.
pub trait AnimationSource {
    fn list_by_collection(&self, collection: &str) -> Vec<(String, AnimationHandle)>;
}

#[derive(Debug, Deserialize)]
struct ManifestEntryFile {
    name: String,
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    collections: HashMap<String, Vec<ManifestEntryFile>>,
}

/// JSON-manifest-backed animation source: collection name to entry list.
#[derive(Debug, Default)]
pub struct ManifestSource {
    collections: HashMap<String, Vec<(String, AnimationHandle)>>,
}

impl ManifestSource {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read animation manifest {}", path.display()))?;
        let file: ManifestFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse animation manifest {}", path.display()))?;
        let collections = file
            .collections
            .into_iter()
            .map(|(name, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|entry| (entry.name, AnimationHandle::new(entry.uri)))
                    .collect();
                (name, entries)
            })
            .collect();
        Ok(Self { collections })
    }
}

impl AnimationSource for ManifestSource {
    fn list_by_collection(&self, collection: &str) -> Vec<(String, AnimationHandle)> {
        self.collections.get(collection).cloned().unwrap_or_default()
    }
}

/// All loadable animation definitions, sorted descending by name.
///
/// The descending order is a contract: filtered views must be subsequences of
/// the full listing, and consumers navigate both by positional index.
#[derive(Default)]
pub struct AnimationCatalog {
    entries: Vec<AnimationEntry>,
    by_name: HashMap<String, usize>,
}

impl AnimationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads from the preferred collection, falling back when it yields nothing.
    /// An empty result is a valid state, not an error.
    pub fn load(&mut self, source: &dyn AnimationSource, preferred: &str, fallback: &str) -> usize {
        let mut listed = source.list_by_collection(preferred);
        if listed.is_empty() {
            log::info!("catalog: collection '{preferred}' empty, falling back to '{fallback}'");
            listed = source.list_by_collection(fallback);
        }
        listed.sort_by(|a, b| b.0.cmp(&a.0));

        self.entries.clear();
        self.by_name.clear();
        for (name, handle) in listed {
            let index = self.entries.len();
            self.by_name.insert(name.clone(), index);
            self.entries.push(AnimationEntry { name, handle });
        }

        if self.entries.is_empty() {
            log::warn!("catalog: no animation definitions found in any collection");
        } else {
            log::info!("catalog: loaded {} animation definitions", self.entries.len());
        }
        self.entries.len()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounds-checked lookup. Indices are always derived from catalog state by
    /// the caller, so an out-of-range index is a programmer error.
    pub fn entry_at(&self, index: usize) -> &AnimationEntry {
        &self.entries[index]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Case-insensitive substring match; empty query returns the full catalog.
    /// Pure: repeated calls with the same query yield the same view.
    pub fn filter(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return self.entries.iter().map(|entry| entry.name.clone()).collect();
        }
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&needle))
            .map(|entry| entry.name.clone())
            .collect()
    }
}

pub const NO_SELECTION_LABEL: &str = "None";

/// Cursor over the catalog. Valid whenever the catalog is non-empty; callers
/// reset it on reload.
#[derive(Debug, Default, Clone, Copy)]
pub struct Selection {
    index: usize,
}

impl Selection {
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current<'a>(&self, catalog: &'a AnimationCatalog) -> Option<&'a AnimationEntry> {
        if catalog.is_empty() {
            None
        } else {
            Some(catalog.entry_at(self.index.min(catalog.count() - 1)))
        }
    }

    pub fn current_label<'a>(&self, catalog: &'a AnimationCatalog) -> &'a str {
        self.current(catalog).map_or(NO_SELECTION_LABEL, |entry| entry.name.as_str())
    }

    /// Advances the cursor, wrapping in either direction. No-op on an empty
    /// catalog. Returns the newly selected entry so the caller can re-apply it
    /// to a live preview.
    pub fn switch<'a>(
        &mut self,
        catalog: &'a AnimationCatalog,
        direction: i32,
    ) -> Option<&'a AnimationEntry> {
        let count = catalog.count();
        if count == 0 {
            return None;
        }
        let count_i = count as i64;
        let next = (self.index as i64 + direction as i64).rem_euclid(count_i) as usize;
        self.index = next;
        Some(catalog.entry_at(next))
    }

    /// Absolute selection by exact name. A miss leaves the selection untouched:
    /// callers may hand over a name from a stale filtered view.
    pub fn select_by_name<'a>(
        &mut self,
        catalog: &'a AnimationCatalog,
        name: &str,
    ) -> Option<&'a AnimationEntry> {
        let index = catalog.index_of(name)?;
        self.index = index;
        Some(catalog.entry_at(index))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{AnimationHandle, AnimationSource};

    pub struct FixedSource {
        pub preferred: Vec<&'static str>,
        pub fallback: Vec<&'static str>,
    }

    impl AnimationSource for FixedSource {
        fn list_by_collection(&self, collection: &str) -> Vec<(String, AnimationHandle)> {
            let names = match collection {
                "preferred" => &self.preferred,
                "fallback" => &self.fallback,
                _ => return Vec::new(),
            };
            names
                .iter()
                .map(|name| (name.to_string(), AnimationHandle::new(format!("anim://{name}"))))
                .collect()
        }
    }
}
