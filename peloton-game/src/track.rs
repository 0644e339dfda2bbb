//! Course assembly: player brackets, the track provider seam, and the track.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::RulesConfig;
use crate::space::{Space, SpaceSpec, Tile};

/// Errors raised while resolving course data into a track.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("course '{course}' has no layout for {bracket} players")]
    CourseNotFound {
        course: String,
        bracket: PlayerBracket,
    },
    #[error("tile '{0}' is not defined")]
    TileNotFound(String),
    #[error("tile '{tile}' space {index} has {lanes} lanes (expected 1-3)")]
    InvalidLaneCount { tile: String, index: usize, lanes: u8 },
    #[error("unknown player bracket '{0}'")]
    UnknownBracket(String),
    #[error("no bracket seats {0} players")]
    UnsupportedPlayerCount(usize),
    #[error("course '{0}' resolves to an empty track")]
    EmptyTrack(String),
    #[error("invalid course data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Player-count bracket a course layout is printed for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerBracket {
    #[serde(rename = "2-4")]
    TwoToFour,
    #[serde(rename = "5-6")]
    FiveToSix,
}

impl PlayerBracket {
    pub const ALL: [Self; 2] = [Self::TwoToFour, Self::FiveToSix];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoToFour => "2-4",
            Self::FiveToSix => "5-6",
        }
    }

    #[must_use]
    pub const fn min_players(self) -> usize {
        match self {
            Self::TwoToFour => 2,
            Self::FiveToSix => 5,
        }
    }

    #[must_use]
    pub const fn max_players(self) -> usize {
        match self {
            Self::TwoToFour => 4,
            Self::FiveToSix => 6,
        }
    }

    /// Pick the bracket that seats `players`.
    ///
    /// # Errors
    ///
    /// Returns an error if no bracket covers the count.
    pub fn for_player_count(players: usize) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|bracket| (bracket.min_players()..=bracket.max_players()).contains(&players))
            .ok_or(ConfigError::UnsupportedPlayerCount(players))
    }
}

impl fmt::Display for PlayerBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayerBracket {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|bracket| bracket.label() == wanted)
            .ok_or_else(|| ConfigError::UnknownBracket(s.to_string()))
    }
}

/// Source of already-parsed course and tile definitions.
/// Platform-specific loaders implement this.
pub trait TrackProvider {
    /// Names of every course the provider knows.
    fn course_names(&self) -> Vec<String>;

    /// Tile ids making up `course` for `bracket`, start to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CourseNotFound`] if the course or its bracket
    /// layout is missing.
    fn course_tiles(&self, course: &str, bracket: PlayerBracket)
    -> Result<Vec<String>, ConfigError>;

    /// `(kind, lanes)` entries of a tile, start to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TileNotFound`] if the tile is missing.
    fn tile_spaces(&self, tile: &str) -> Result<Vec<SpaceSpec>, ConfigError>;
}

/// The full, ordered run of spaces for one race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    name: String,
    bracket: PlayerBracket,
    tile_ids: Vec<String>,
    spaces: Vec<Space>,
}

impl Track {
    /// Resolve `course` for `bracket` through `provider` and lay its tiles end to end.
    ///
    /// # Errors
    ///
    /// Returns an error if the course, bracket, or a tile is unknown, if a
    /// space has an unsupported lane count, or if the track has no spaces.
    pub fn assemble<P: TrackProvider + ?Sized>(
        provider: &P,
        course: &str,
        bracket: PlayerBracket,
        rules: &RulesConfig,
    ) -> Result<Self, ConfigError> {
        let tile_ids = provider.course_tiles(course, bracket)?;
        let mut tiles = Vec::with_capacity(tile_ids.len());
        for tile_id in &tile_ids {
            let specs = provider.tile_spaces(tile_id)?;
            if let Some((index, spec)) = specs
                .iter()
                .enumerate()
                .find(|(_, spec)| !spec.has_valid_lanes())
            {
                return Err(ConfigError::InvalidLaneCount {
                    tile: tile_id.clone(),
                    index,
                    lanes: spec.lanes(),
                });
            }
            tiles.push(Tile::from_specs(tile_id.as_str(), &specs, rules));
        }
        let track = Self::from_tiles(course, bracket, tiles);
        if track.is_empty() {
            return Err(ConfigError::EmptyTrack(course.to_string()));
        }
        Ok(track)
    }

    #[must_use]
    pub fn from_tiles(name: impl Into<String>, bracket: PlayerBracket, tiles: Vec<Tile>) -> Self {
        let tile_ids = tiles.iter().map(|tile| tile.id.clone()).collect();
        let spaces = tiles.into_iter().flat_map(|tile| tile.spaces).collect();
        Self {
            name: name.into(),
            bracket,
            tile_ids,
            spaces,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn bracket(&self) -> PlayerBracket {
        self.bracket
    }

    #[must_use]
    pub fn tile_ids(&self) -> &[String] {
        &self.tile_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Index of the furthest reachable space.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.spaces.len().saturating_sub(1)
    }

    #[must_use]
    pub fn space(&self, index: usize) -> Option<&Space> {
        self.spaces.get(index)
    }

    #[must_use]
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub(crate) fn space_mut(&mut self, index: usize) -> Option<&mut Space> {
        self.spaces.get_mut(index)
    }

    /// Spaces where riders may line up before the first turn.
    #[must_use]
    pub fn start_positions(&self) -> Vec<usize> {
        self.spaces
            .iter()
            .enumerate()
            .filter(|(_, space)| space.is_start() || space.is_breakaway())
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::SpaceKind;

    #[test]
    fn bracket_round_trips_labels() {
        assert_eq!("2-4".parse::<PlayerBracket>().unwrap(), PlayerBracket::TwoToFour);
        assert_eq!("5-6".parse::<PlayerBracket>().unwrap(), PlayerBracket::FiveToSix);
        assert!(matches!(
            "3-7".parse::<PlayerBracket>(),
            Err(ConfigError::UnknownBracket(_))
        ));
        assert_eq!(PlayerBracket::TwoToFour.max_players(), 4);
        assert_eq!(PlayerBracket::FiveToSix.max_players(), 6);
    }

    #[test]
    fn bracket_for_player_count() {
        assert_eq!(
            PlayerBracket::for_player_count(3).unwrap(),
            PlayerBracket::TwoToFour
        );
        assert_eq!(
            PlayerBracket::for_player_count(6).unwrap(),
            PlayerBracket::FiveToSix
        );
        assert!(matches!(
            PlayerBracket::for_player_count(1),
            Err(ConfigError::UnsupportedPlayerCount(1))
        ));
        assert!(PlayerBracket::for_player_count(7).is_err());
    }

    #[test]
    fn from_tiles_concatenates_in_order() {
        let rules = RulesConfig::default();
        let a = Tile::from_specs(
            "a",
            &[SpaceSpec(SpaceKind::Start, 2), SpaceSpec(SpaceKind::Breakaway, 3)],
            &rules,
        );
        let b = Tile::from_specs("b", &[SpaceSpec(SpaceKind::Finish, 2)], &rules);
        let track = Track::from_tiles("demo", PlayerBracket::TwoToFour, vec![a, b]);
        assert_eq!(track.len(), 3);
        assert_eq!(track.last_index(), 2);
        assert_eq!(track.tile_ids(), &["a".to_string(), "b".to_string()]);
        assert!(track.space(2).unwrap().is_finish());
        assert_eq!(track.start_positions(), vec![0, 1]);
        assert!(track.space(3).is_none());
    }
}
