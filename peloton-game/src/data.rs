use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::space::SpaceSpec;
use crate::track::{ConfigError, PlayerBracket, TrackProvider};

/// Course layouts keyed by course name, then by bracket label (`"2-4"`).
pub type CourseLayouts = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// In-memory course and tile definitions, shaped like the JSON data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CourseCatalog {
    #[serde(default)]
    pub courses: CourseLayouts,
    #[serde(default)]
    pub tiles: BTreeMap<String, Vec<SpaceSpec>>,
}

impl CourseCatalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid catalog.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Register a course layout for one bracket.
    pub fn insert_course(
        &mut self,
        name: impl Into<String>,
        bracket: PlayerBracket,
        tiles: Vec<String>,
    ) {
        self.courses
            .entry(name.into())
            .or_default()
            .insert(bracket.label().to_string(), tiles);
    }

    pub fn insert_tile(&mut self, id: impl Into<String>, spaces: Vec<SpaceSpec>) {
        self.tiles.insert(id.into(), spaces);
    }

    /// Brackets a course has a printed layout for.
    #[must_use]
    pub fn brackets_for(&self, course: &str) -> Vec<PlayerBracket> {
        self.courses
            .get(course)
            .map(|layouts| {
                layouts
                    .keys()
                    .filter_map(|label| label.parse().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TrackProvider for CourseCatalog {
    fn course_names(&self) -> Vec<String> {
        self.courses.keys().cloned().collect()
    }

    fn course_tiles(
        &self,
        course: &str,
        bracket: PlayerBracket,
    ) -> Result<Vec<String>, ConfigError> {
        self.courses
            .get(course)
            .and_then(|layouts| layouts.get(bracket.label()))
            .cloned()
            .ok_or_else(|| ConfigError::CourseNotFound {
                course: course.to_string(),
                bracket,
            })
    }

    fn tile_spaces(&self, tile: &str) -> Result<Vec<SpaceSpec>, ConfigError> {
        self.tiles
            .get(tile)
            .cloned()
            .ok_or_else(|| ConfigError::TileNotFound(tile.to_string()))
    }
}
