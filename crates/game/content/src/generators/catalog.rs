//! Named map sources offered to the `map` vote.

use std::fmt;
use std::sync::Arc;

use game_core::MapGenerator;

use super::RandomMap;

/// Registry of map generators keyed by vote value.
///
/// Insertion order is kept so clients can list maps predictably.
#[derive(Clone)]
pub struct MapCatalog {
    entries: Vec<(String, Arc<dyn MapGenerator>)>,
}

impl MapCatalog {
    pub const RANDOM: &'static str = "random";
    pub const OPEN: &'static str = "open";

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Catalog holding the built-in `random` and `open` generators.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(Self::RANDOM, Arc::new(RandomMap::default()));
        catalog.insert(Self::OPEN, Arc::new(RandomMap::open()));
        catalog
    }

    /// Registers `generator` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, generator: Arc<dyn MapGenerator>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = generator,
            None => self.entries.push((name, generator)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MapGenerator>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, generator)| Arc::clone(generator))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MapCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for MapCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
