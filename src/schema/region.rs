/// Named volumes ("rooms"), button positions and the world layout file.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::core::content::ContentError;

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned box with a display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub key: String,
    pub title: String,
    pub min: BlockPos,
    pub max: BlockPos,
    /// Where the guide stands while the player is inside.
    #[serde(default)]
    pub anchor: Option<BlockPos>,
}

impl Region {
    /// Build a region from two opposite corners in any order.
    pub fn new(key: &str, title: &str, a: BlockPos, b: BlockPos) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: BlockPos) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    fn normalized(self) -> Self {
        let anchor = self.anchor;
        let mut region = Region::new(&self.key, &self.title, self.min, self.max);
        region.anchor = anchor;
        region
    }
}

/// Point containment lookup over all regions. The first region (in load
/// order) containing a point wins.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: Vec<Region>,
}

impl RegionIndex {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions: regions.into_iter().map(Region::normalized).collect(),
        }
    }

    pub fn region_at(&self, pos: BlockPos) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(pos))
    }

    pub fn by_title(&self, title: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.title == title)
    }

    pub fn by_key(&self, key: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Reverse lookup from a button's position to its id.
#[derive(Debug, Clone, Default)]
pub struct ButtonIndex {
    by_pos: FxHashMap<BlockPos, String>,
}

impl ButtonIndex {
    pub fn insert(&mut self, id: &str, pos: BlockPos) {
        self.by_pos.insert(pos, id.to_string());
    }

    pub fn button_at(&self, pos: BlockPos) -> Option<&str> {
        self.by_pos.get(&pos).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_pos.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }
}

/// Everything the front end knows about the map.
#[derive(Debug, Clone, Default)]
pub struct WorldLayout {
    pub regions: RegionIndex,
    pub buttons: ButtonIndex,
    pub destinations: HashMap<String, BlockPos>,
    pub displays: HashMap<String, BlockPos>,
}

#[derive(Debug, Deserialize)]
struct RonButton {
    id: String,
    at: BlockPos,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "World")]
struct RonWorld {
    regions: Vec<Region>,
    #[serde(default)]
    buttons: Vec<RonButton>,
    #[serde(default)]
    destinations: HashMap<String, BlockPos>,
    #[serde(default)]
    displays: HashMap<String, BlockPos>,
}

impl WorldLayout {
    /// Load a world layout from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<WorldLayout, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a world layout from a RON string.
    pub fn parse_ron(input: &str) -> Result<WorldLayout, ContentError> {
        let raw: RonWorld = ron::from_str(input)?;
        let mut buttons = ButtonIndex::default();
        for button in &raw.buttons {
            buttons.insert(&button.id, button.at);
        }
        Ok(WorldLayout {
            regions: RegionIndex::new(raw.regions),
            buttons,
            destinations: raw.destinations,
            displays: raw.displays,
        })
    }
}
