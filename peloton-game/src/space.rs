//! Track spaces, their kinds, and the lane slots riders occupy.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{
    DOWNHILL_MIN_ADVANCE, MAX_LANES, MIN_LANES, SUPPLY_MIN_ADVANCE, UPHILL_MAX_ADVANCE,
};
use crate::rider::RiderId;
use crate::rules::RulesConfig;

/// Lane slots of a single space; a space never holds more than three.
pub type LaneSlots = SmallVec<[Option<RiderId>; 3]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceKind {
    Normal,
    Uphill,
    Downhill,
    Cobble,
    Supply,
    Start,
    Finish,
    Breakaway,
}

impl SpaceKind {
    pub const ALL: [Self; 8] = [
        Self::Normal,
        Self::Uphill,
        Self::Downhill,
        Self::Cobble,
        Self::Supply,
        Self::Start,
        Self::Finish,
        Self::Breakaway,
    ];

    /// Movement bounds and slipstream permission for this kind under `rules`.
    #[must_use]
    pub const fn profile(self, rules: &RulesConfig) -> SpaceProfile {
        let mut profile = SpaceProfile {
            max_advance: rules.max_advance,
            min_advance: rules.min_advance,
            allows_slipstream: true,
        };
        match self {
            Self::Uphill => {
                profile.max_advance = UPHILL_MAX_ADVANCE;
                profile.allows_slipstream = false;
            }
            Self::Downhill => profile.min_advance = DOWNHILL_MIN_ADVANCE,
            Self::Cobble => profile.allows_slipstream = false,
            Self::Supply => profile.min_advance = SUPPLY_MIN_ADVANCE,
            Self::Normal | Self::Start | Self::Finish | Self::Breakaway => {}
        }
        profile
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Uphill => "uphill",
            Self::Downhill => "downhill",
            Self::Cobble => "cobble",
            Self::Supply => "supply",
            Self::Start => "start",
            Self::Finish => "finish",
            Self::Breakaway => "breakaway",
        }
    }
}

/// Derived attributes of a space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceProfile {
    pub max_advance: u8,
    pub min_advance: u8,
    pub allows_slipstream: bool,
}

impl SpaceProfile {
    /// Clamp a played power value into this space's bounds.
    #[must_use]
    pub fn clamp(&self, power: u8) -> u8 {
        power.max(self.min_advance).min(self.max_advance)
    }
}

/// One `(kind, lanes)` entry of a tile definition, e.g. `["uphill", 2]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSpec(pub SpaceKind, pub u8);

impl SpaceSpec {
    #[must_use]
    pub const fn kind(self) -> SpaceKind {
        self.0
    }

    #[must_use]
    pub const fn lanes(self) -> u8 {
        self.1
    }

    #[must_use]
    pub const fn has_valid_lanes(self) -> bool {
        self.1 >= MIN_LANES && self.1 <= MAX_LANES
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    kind: SpaceKind,
    profile: SpaceProfile,
    lanes: LaneSlots,
}

impl Space {
    /// Build an empty space. Lane counts are validated by the track loader.
    #[must_use]
    pub fn new(kind: SpaceKind, lanes: u8, rules: &RulesConfig) -> Self {
        Self {
            kind,
            profile: kind.profile(rules),
            lanes: std::iter::repeat_n(None, usize::from(lanes)).collect(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SpaceKind {
        self.kind
    }

    #[must_use]
    pub const fn profile(&self) -> SpaceProfile {
        self.profile
    }

    #[must_use]
    pub const fn max_advance(&self) -> u8 {
        self.profile.max_advance
    }

    #[must_use]
    pub const fn min_advance(&self) -> u8 {
        self.profile.min_advance
    }

    #[must_use]
    pub const fn allows_slipstream(&self) -> bool {
        self.profile.allows_slipstream
    }

    #[must_use]
    pub const fn is_start(&self) -> bool {
        matches!(self.kind, SpaceKind::Start)
    }

    #[must_use]
    pub const fn is_finish(&self) -> bool {
        matches!(self.kind, SpaceKind::Finish)
    }

    #[must_use]
    pub const fn is_breakaway(&self) -> bool {
        matches!(self.kind, SpaceKind::Breakaway)
    }

    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    #[must_use]
    pub fn lanes(&self) -> &[Option<RiderId>] {
        &self.lanes
    }

    #[must_use]
    pub fn occupant(&self, lane: usize) -> Option<RiderId> {
        self.lanes.get(lane).copied().flatten()
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.lanes.iter().any(Option::is_some)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.lanes.iter().all(Option::is_some)
    }

    #[must_use]
    pub fn first_free_lane(&self) -> Option<usize> {
        self.lanes.iter().position(Option::is_none)
    }

    /// Riders on this space in lane order.
    pub fn occupants(&self) -> impl Iterator<Item = RiderId> + '_ {
        self.lanes.iter().filter_map(|slot| *slot)
    }

    pub(crate) fn occupy(&mut self, lane: usize, rider: RiderId) {
        debug_assert!(self.lanes[lane].is_none(), "lane {lane} already taken");
        self.lanes[lane] = Some(rider);
    }

    /// Empty `lane` and slide every higher lane down one slot.
    ///
    /// Returns the riders that slid, each now one lane lower.
    pub(crate) fn vacate(&mut self, lane: usize) -> SmallVec<[RiderId; 2]> {
        let mut shifted = SmallVec::new();
        if lane >= self.lanes.len() {
            return shifted;
        }
        self.lanes[lane] = None;
        for idx in lane + 1..self.lanes.len() {
            let slid = self.lanes[idx].take();
            if let Some(rider) = slid {
                shifted.push(rider);
            }
            self.lanes[idx - 1] = slid;
        }
        shifted
    }
}

/// A printed track segment: a named, ordered run of spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: String,
    pub spaces: Vec<Space>,
}

impl Tile {
    #[must_use]
    pub fn from_specs(id: impl Into<String>, specs: &[SpaceSpec], rules: &RulesConfig) -> Self {
        Self {
            id: id.into(),
            spaces: specs
                .iter()
                .map(|spec| Space::new(spec.kind(), spec.lanes(), rules))
                .collect(),
        }
    }
}
