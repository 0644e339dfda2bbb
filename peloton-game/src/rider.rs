//! Riders, their archetypes, and the players that own them.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{COPIES_PER_VALUE, ROULEUR_VALUES, SPRINTEUR_VALUES};
use crate::deck::{Card, Deck};
use crate::rules::RulesConfig;
use crate::seed::rider_seed;

/// Index of a rider within its race.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RiderId(pub usize);

impl fmt::Display for RiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a player within its race.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Green,
    Red,
    Pink,
    White,
    Black,
}

impl Color {
    pub const ALL: [Self; 6] = [
        Self::Blue,
        Self::Green,
        Self::Red,
        Self::Pink,
        Self::White,
        Self::Black,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Pink => "pink",
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub(crate) const fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.label() == wanted)
            .ok_or_else(|| format!("unknown color '{s}'"))
    }
}

/// Rider archetype; fixes the composition of the rider's deck.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiderKind {
    Sprinteur,
    Rouleur,
}

impl RiderKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sprinteur => "sprinteur",
            Self::Rouleur => "rouleur",
        }
    }

    /// Single-letter board marker.
    #[must_use]
    pub const fn initial(self) -> char {
        match self {
            Self::Sprinteur => 's',
            Self::Rouleur => 'r',
        }
    }

    #[must_use]
    pub const fn face_values(self) -> [u8; 5] {
        match self {
            Self::Sprinteur => SPRINTEUR_VALUES,
            Self::Rouleur => ROULEUR_VALUES,
        }
    }

    /// The unshuffled fifteen-card deck of this archetype.
    #[must_use]
    pub fn deck_cards(self) -> Vec<Card> {
        self.face_values()
            .into_iter()
            .flat_map(|value| std::iter::repeat_n(Card::Power(value), COPIES_PER_VALUE))
            .collect()
    }

    pub(crate) const fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RiderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A `(space, lane)` slot on the track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub space: usize,
    pub lane: usize,
}

impl Location {
    #[must_use]
    pub const fn new(space: usize, lane: usize) -> Self {
        Self { space, lane }
    }
}

/// Where a rider is in the life of a race.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Unplaced,
    OnTrack(Location),
    /// Crossed the line on `space` and left the board.
    Finished { space: usize },
}

#[derive(Debug, Clone)]
pub struct Rider {
    id: RiderId,
    player: PlayerId,
    color: Color,
    kind: RiderKind,
    position: Position,
    deck: Deck,
}

impl Rider {
    pub(crate) fn new(
        id: RiderId,
        player: PlayerId,
        color: Color,
        kind: RiderKind,
        race_seed: u64,
        rules: &RulesConfig,
    ) -> Self {
        let seed = rider_seed(race_seed, color, kind);
        Self {
            id,
            player,
            color,
            kind,
            position: Position::Unplaced,
            deck: Deck::new(kind.deck_cards(), seed, rules),
        }
    }

    #[must_use]
    pub const fn id(&self) -> RiderId {
        self.id
    }

    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub const fn kind(&self) -> RiderKind {
        self.kind
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current slot, if the rider is on the board.
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        match self.position {
            Position::OnTrack(location) => Some(location),
            Position::Unplaced | Position::Finished { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.position, Position::Finished { .. })
    }

    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    pub(crate) const fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    pub(crate) const fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Keep the cached lane in step after a lower lane was vacated.
    pub(crate) fn slide_down_one_lane(&mut self) {
        if let Position::OnTrack(location) = &mut self.position {
            debug_assert!(location.lane > 0, "rider {} already in lane 0", self.id);
            location.lane = location.lane.saturating_sub(1);
        }
    }
}

impl fmt::Display for Rider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub color: Color,
    pub sprinteur: RiderId,
    pub rouleur: RiderId,
}

impl Player {
    #[must_use]
    pub const fn riders(&self) -> [RiderId; 2] {
        [self.sprinteur, self.rouleur]
    }
}
