//! Peloton Race Engine
//!
//! Platform-agnostic core logic for a lane-based cycling board race: track
//! assembly from course data, lane occupancy, card-driven movement,
//! slipstream and exhaustion. Front ends drive it one turn at a time.

pub mod constants;
pub mod data;
pub mod deck;
pub mod peloton;
pub mod race;
pub mod rider;
pub mod rules;
pub mod seed;
pub mod snapshot;
pub mod space;
pub mod track;
pub mod turn;

// Re-export commonly used types
pub use data::{CourseCatalog, CourseLayouts};
pub use deck::{Card, Deck, DeckError};
pub use peloton::{Peloton, detect_pelotons};
pub use race::{Advance, Finisher, Race, RaceError, SlipstreamReport, SlipstreamShift};
pub use rider::{Color, Location, Player, PlayerId, Position, Rider, RiderId, RiderKind};
pub use rules::{RulesConfig, RulesConfigError};
pub use seed::{rider_seed, seed_bytes};
pub use snapshot::{BoardSnapshot, OccupantSnapshot, SpaceSnapshot};
pub use space::{Space, SpaceKind, SpaceProfile, SpaceSpec, Tile};
pub use track::{ConfigError, PlayerBracket, Track, TrackProvider};
pub use turn::{RiderMove, TurnOutcome};

/// Main engine for creating races from a course source
pub struct GameEngine<P>
where
    P: TrackProvider,
{
    provider: P,
    rules: RulesConfig,
}

impl<P> GameEngine<P>
where
    P: TrackProvider,
{
    /// Create an engine with the default rules
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            rules: RulesConfig::default(),
        }
    }

    /// Create an engine with custom rules
    ///
    /// # Errors
    ///
    /// Returns an error if the rules fail validation.
    pub fn with_rules(provider: P, rules: RulesConfig) -> Result<Self, RulesConfigError> {
        rules.validate()?;
        Ok(Self { provider, rules })
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn course_names(&self) -> Vec<String> {
        self.provider.course_names()
    }

    /// Assemble the track for a course and bracket
    ///
    /// # Errors
    ///
    /// Returns an error if the course data cannot be resolved.
    pub fn load_track(&self, course: &str, bracket: PlayerBracket) -> Result<Track, ConfigError> {
        Track::assemble(&self.provider, course, bracket, &self.rules)
    }

    /// Create an empty race on the given course
    ///
    /// # Errors
    ///
    /// Returns an error if the course data cannot be resolved.
    pub fn create_race(
        &self,
        course: &str,
        bracket: PlayerBracket,
        seed: u64,
    ) -> Result<Race, ConfigError> {
        let track = self.load_track(course, bracket)?;
        Ok(Race::new(track, self.rules.clone(), seed))
    }
}
