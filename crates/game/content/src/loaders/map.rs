//! Map data loader.
//!
//! Authored maps list only the cells that differ from neutral land:
//!
//! ```ron
//! (
//!     mode: hexagon,
//!     dimensions: (12, 10),
//!     cells: [
//!         (2, 3, (type: general, color: 1, amount: 1)),
//!         (5, 5, (type: mountain)),
//!     ],
//! )
//! ```
//!
//! Cells are `(row, col, cell)` with 1-based coordinates.

use std::path::Path;

use game_core::{GridMode, LandCell, Map, MapView, Pos};
use serde::{Deserialize, Serialize};

use crate::generators::{AuthoredMap, MapCatalog};
use crate::loaders::{LoadResult, read_file};

/// Map data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapDataRon {
    #[serde(default)]
    mode: GridMode,
    dimensions: (u32, u32), // (width, height)
    #[serde(default)]
    cells: Vec<(i32, i32, LandCell)>,
}

/// Loader for authored maps in RON.
pub struct MapLoader;

impl MapLoader {
    /// File extension of authored maps.
    pub const EXTENSION: &'static str = "ron";

    /// Load and validate a map from a RON file.
    pub fn load(path: &Path) -> LoadResult<MapView> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<MapView> {
        let data: MapDataRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON: {}", e))?;

        let (width, height) = data.dimensions;
        let mut map = Map::new(width, height, data.mode)?;
        for (row, col, cell) in data.cells {
            map.set(Pos::new(row, col), cell)?;
        }
        map.validate()?;

        Ok(map.to_view())
    }

    /// Render `view` in the authored format, listing only non-default cells.
    pub fn to_ron(view: &MapView) -> LoadResult<String> {
        let map = Map::from_view(view.clone())?;
        let data = MapDataRon {
            mode: view.mode,
            dimensions: (view.width, view.height),
            cells: map
                .iter()
                .filter(|(_, cell)| **cell != LandCell::land())
                .map(|(pos, cell)| (pos.row, pos.col, *cell))
                .collect(),
        };

        ron::ser::to_string_pretty(&data, ron::ser::PrettyConfig::default())
            .map_err(|e| anyhow::anyhow!("Failed to serialize map RON: {}", e))
    }

    pub fn save(view: &MapView, path: &Path) -> LoadResult<()> {
        let content = Self::to_ron(view)?;
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write file {}: {}", path.display(), e))
    }

    /// Registers every `*.ron` map in `dir` under its file stem.
    ///
    /// Returns the names that were added, sorted.
    pub fn load_dir(dir: &Path, catalog: &mut MapCatalog) -> LoadResult<Vec<String>> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read map directory {}: {}", dir.display(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == Self::EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut names = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let authored = AuthoredMap::new(Self::load(&path)?)?;
            catalog.insert(name, std::sync::Arc::new(authored));
            names.push(name.to_owned());
        }
        Ok(names)
    }
}
