//! The race engine: occupancy, placement, movement, slipstream, exhaustion.
//!
//! The track owns every lane slot; riders only cache their `(space, lane)`.
//! All mutation goes through [`Race`], which keeps both sides in step and
//! re-sorts the canonical rider order after every change of position.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::SLIPSTREAM_ADVANCE;
use crate::deck::DeckError;
use crate::peloton::{Peloton, detect_pelotons};
use crate::rider::{Color, Location, Player, PlayerId, Position, Rider, RiderId, RiderKind};
use crate::rules::RulesConfig;
use crate::space::Space;
use crate::track::Track;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RaceError {
    #[error("course already seats its maximum of {max} players")]
    CapacityExceeded { max: usize },
    #[error("a {0} player is already registered")]
    DuplicateColor(Color),
    #[error("rider {0} is not part of this race")]
    UnknownRider(RiderId),
    #[error("rider {0} has not been placed on the track")]
    RiderNotPlaced(RiderId),
    #[error("rider {0} has already finished")]
    RiderFinished(RiderId),
    #[error("rider {rider} cannot move back from space {from} to space {to}")]
    BackwardMovement {
        rider: RiderId,
        from: usize,
        to: usize,
    },
    #[error("space {index} is past the last space {last}")]
    SpaceOutOfRange { index: usize, last: usize },
    #[error("no free lane for rider {rider} at or before space {target}")]
    BoardFull { rider: RiderId, target: usize },
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error("engine invariant violated: {0}")]
    InvariantViolation(&'static str),
}

/// How far a rider is asked to go.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advance {
    /// A played power value, clamped by the rider's current space.
    Power(u8),
    /// The unclamped single-space slipstream step.
    Slipstream,
}

impl Advance {
    /// Interpret a raw movement delta; `1` is the slipstream step.
    #[must_use]
    pub const fn from_delta(delta: u8) -> Self {
        if delta == SLIPSTREAM_ADVANCE {
            Self::Slipstream
        } else {
            Self::Power(delta)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finisher {
    pub rider: RiderId,
    pub turn: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipstreamShift {
    pub rider: RiderId,
    pub from: Location,
    pub to: Location,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipstreamReport {
    /// Detection passes run, including the final pass that moved nobody.
    pub passes: usize,
    pub shifts: Vec<SlipstreamShift>,
}

impl SlipstreamReport {
    #[must_use]
    pub fn moved(&self) -> bool {
        !self.shifts.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Race {
    track: Track,
    rules: RulesConfig,
    seed: u64,
    max_players: usize,
    players: Vec<Player>,
    riders: Vec<Rider>,
    order: Vec<RiderId>,
    finishers: Vec<Finisher>,
    turn: u32,
}

impl Race {
    /// Start an empty race on `track`; the track's bracket caps the players.
    #[must_use]
    pub fn new(track: Track, rules: RulesConfig, seed: u64) -> Self {
        let max_players = track.bracket().max_players();
        Self {
            track,
            rules,
            seed,
            max_players,
            players: Vec::with_capacity(max_players),
            riders: Vec::with_capacity(max_players * 2),
            order: Vec::with_capacity(max_players * 2),
            finishers: Vec::new(),
            turn: 1,
        }
    }

    #[must_use]
    pub const fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn max_players(&self) -> usize {
        self.max_players
    }

    /// Turn currently being played, starting at 1.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    pub(crate) const fn next_turn(&mut self) {
        self.turn += 1;
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    #[must_use]
    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    #[must_use]
    pub fn rider(&self, id: RiderId) -> Option<&Rider> {
        self.riders.get(id.0)
    }

    /// Riders front to back: finishers by arrival, then furthest space and
    /// lowest lane, then riders not yet placed.
    #[must_use]
    pub fn rider_order(&self) -> &[RiderId] {
        &self.order
    }

    #[must_use]
    pub fn finishers(&self) -> &[Finisher] {
        &self.finishers
    }

    #[must_use]
    pub fn start_positions(&self) -> Vec<usize> {
        self.track.start_positions()
    }

    #[must_use]
    pub fn pelotons(&self) -> Vec<Peloton> {
        detect_pelotons(&self.track)
    }

    fn rider_ref(&self, id: RiderId) -> Result<&Rider, RaceError> {
        self.riders.get(id.0).ok_or(RaceError::UnknownRider(id))
    }

    fn rider_mut(&mut self, id: RiderId) -> Result<&mut Rider, RaceError> {
        self.riders.get_mut(id.0).ok_or(RaceError::UnknownRider(id))
    }

    /// Register a player and their sprinteur and rouleur.
    ///
    /// # Errors
    ///
    /// Returns an error if the race is full or the color is taken.
    pub fn register_player(&mut self, color: Color) -> Result<PlayerId, RaceError> {
        if self.players.len() >= self.max_players {
            return Err(RaceError::CapacityExceeded {
                max: self.max_players,
            });
        }
        if self.players.iter().any(|player| player.color == color) {
            return Err(RaceError::DuplicateColor(color));
        }

        let player_id = PlayerId(self.players.len());
        let sprinteur = RiderId(self.riders.len());
        let rouleur = RiderId(self.riders.len() + 1);
        for (id, kind) in [(sprinteur, RiderKind::Sprinteur), (rouleur, RiderKind::Rouleur)] {
            self.riders.push(Rider::new(
                id,
                player_id,
                color,
                kind,
                self.seed,
                &self.rules,
            ));
            self.order.push(id);
        }
        self.players.push(Player {
            id: player_id,
            color,
            sprinteur,
            rouleur,
        });
        self.refresh_order();
        Ok(player_id)
    }

    /// Put a rider in the first free lane of `target`, falling back to
    /// earlier spaces when it is full.
    ///
    /// A rider already on `target` stays put. Falling back as far as the
    /// rider's own space also leaves it where it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the rider is unknown or finished, if `target` is
    /// off the track or behind the rider, or if an unplaced rider finds no
    /// free lane down to the first space. State is untouched on error.
    pub fn place_rider(&mut self, id: RiderId, target: usize) -> Result<Location, RaceError> {
        let origin = match self.rider_ref(id)?.position() {
            Position::Finished { .. } => return Err(RaceError::RiderFinished(id)),
            Position::OnTrack(location) => Some(location),
            Position::Unplaced => None,
        };
        if target >= self.track.len() {
            return Err(RaceError::SpaceOutOfRange {
                index: target,
                last: self.track.last_index(),
            });
        }
        if let Some(origin) = origin
            && target < origin.space
        {
            return Err(RaceError::BackwardMovement {
                rider: id,
                from: origin.space,
                to: target,
            });
        }

        let floor = origin.map_or(0, |location| location.space);
        for candidate in (floor..=target).rev() {
            if let Some(origin) = origin.filter(|location| location.space == candidate) {
                return Ok(origin);
            }
            let free_lane = self.track.space(candidate).and_then(Space::first_free_lane);
            if let Some(lane) = free_lane {
                let landing = Location::new(candidate, lane);
                self.commit_placement(id, origin, landing);
                return Ok(landing);
            }
        }
        Err(RaceError::BoardFull { rider: id, target })
    }

    fn commit_placement(&mut self, id: RiderId, origin: Option<Location>, landing: Location) {
        if let Some(space) = self.track.space_mut(landing.space) {
            space.occupy(landing.lane, id);
        }
        if let Some(origin) = origin {
            self.vacate(origin);
        }
        if let Some(rider) = self.riders.get_mut(id.0) {
            rider.set_position(Position::OnTrack(landing));
        }
        self.refresh_order();
    }

    /// Free a lane and pull the riders above it down one slot.
    fn vacate(&mut self, location: Location) {
        let shifted = self
            .track
            .space_mut(location.space)
            .map(|space| space.vacate(location.lane))
            .unwrap_or_default();
        for rider in shifted {
            if let Some(rider) = self.riders.get_mut(rider.0) {
                rider.slide_down_one_lane();
            }
        }
    }

    fn refresh_order(&mut self) {
        let riders = &self.riders;
        let finishers = &self.finishers;
        self.order.sort_by_key(|id| {
            let tiebreak = id.0;
            match riders.get(id.0).map(Rider::position) {
                Some(Position::Finished { .. }) => {
                    let rank = finishers
                        .iter()
                        .position(|finisher| finisher.rider == *id)
                        .unwrap_or(usize::MAX);
                    (0, rank, 0, tiebreak)
                }
                Some(Position::OnTrack(location)) => {
                    (1, usize::MAX - location.space, location.lane, tiebreak)
                }
                Some(Position::Unplaced) | None => (2, 0, 0, tiebreak),
            }
        });
    }

    /// Move a rider by a raw delta. `1` is the unclamped slipstream step;
    /// anything else is clamped to the current space's bounds.
    ///
    /// # Errors
    ///
    /// See [`Race::advance`].
    pub fn move_rider(&mut self, id: RiderId, delta: u8) -> Result<Location, RaceError> {
        self.advance(id, Advance::from_delta(delta))
    }

    /// Advance a placed rider and return where it actually lands.
    ///
    /// # Errors
    ///
    /// Returns an error if the rider is unknown, not yet placed, or finished.
    pub fn advance(&mut self, id: RiderId, advance: Advance) -> Result<Location, RaceError> {
        let origin = match self.rider_ref(id)?.position() {
            Position::OnTrack(location) => location,
            Position::Unplaced => return Err(RaceError::RiderNotPlaced(id)),
            Position::Finished { .. } => return Err(RaceError::RiderFinished(id)),
        };
        let space = self
            .track
            .space(origin.space)
            .ok_or(RaceError::InvariantViolation("rider cached off the track"))?;
        let delta = match advance {
            Advance::Power(power) => space.profile().clamp(power),
            Advance::Slipstream => SLIPSTREAM_ADVANCE,
        };
        let target = (origin.space + usize::from(delta)).min(self.track.last_index());
        self.place_rider(id, target)
    }

    /// Pull trailing pelotons forward until no group is one gap behind another.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::InvariantViolation`] if the passes fail to settle
    /// within `riders * spaces`, which would mean a movement bug.
    pub fn apply_slipstream(&mut self) -> Result<SlipstreamReport, RaceError> {
        let max_passes = self.riders.len() * self.track.len() + 1;
        let mut report = SlipstreamReport::default();
        loop {
            if report.passes >= max_passes {
                return Err(RaceError::InvariantViolation("slipstream did not settle"));
            }
            report.passes += 1;
            if !self.slipstream_pass(&mut report.shifts)? {
                return Ok(report);
            }
        }
    }

    /// One detection pass. Returns whether any rider moved.
    fn slipstream_pass(&mut self, shifts: &mut Vec<SlipstreamShift>) -> Result<bool, RaceError> {
        let pelotons = detect_pelotons(&self.track);
        for pair in pelotons.windows(2) {
            let (trailing, leading) = (&pair[0], &pair[1]);
            if !trailing.can_slipstream_into(leading, &self.track) {
                continue;
            }
            let mut moved = false;
            // Leading rider first so each step lands on a freshly vacated slot.
            for &rider in &trailing.riders {
                let Some(from) = self.rider_ref(rider)?.location() else {
                    continue;
                };
                let sheltered = self
                    .track
                    .space(from.space)
                    .is_some_and(Space::allows_slipstream);
                if !sheltered {
                    break;
                }
                let to = self.advance(rider, Advance::Slipstream)?;
                if to.space != from.space {
                    moved = true;
                    shifts.push(SlipstreamShift { rider, from, to });
                }
            }
            if moved {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Hand a rider an exhaustion card if the lane ahead of it is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the rider is unknown.
    pub fn apply_exhaustion(&mut self, id: RiderId) -> Result<bool, RaceError> {
        let Some(location) = self.rider_ref(id)?.location() else {
            return Ok(false);
        };
        let Some(ahead) = self.track.space(location.space + 1) else {
            return Ok(false);
        };
        let lane_ahead = location.lane.min(ahead.lane_count().saturating_sub(1));
        if ahead.occupant(lane_ahead).is_some() {
            return Ok(false);
        }
        self.rider_mut(id)?.deck_mut().draw_exhaustion();
        Ok(true)
    }

    /// Apply exhaustion to every rider front to back; returns who got a card.
    pub fn apply_exhaustion_all(&mut self) -> Vec<RiderId> {
        let mut exhausted = Vec::new();
        for id in self.order.clone() {
            if matches!(self.apply_exhaustion(id), Ok(true)) {
                exhausted.push(id);
            }
        }
        exhausted
    }

    /// Whether the rider sits on a finish space or has already finished.
    #[must_use]
    pub fn check_finish(&self, id: RiderId) -> bool {
        match self.rider(id).map(Rider::position) {
            Some(Position::Finished { .. }) => true,
            Some(Position::OnTrack(location)) => self
                .track
                .space(location.space)
                .is_some_and(Space::is_finish),
            Some(Position::Unplaced) | None => false,
        }
    }

    /// Record every rider standing on a finish space and lift it off the board.
    pub fn record_finishers(&mut self) -> Vec<RiderId> {
        let mut crossed = Vec::new();
        for id in self.order.clone() {
            let Some(location) = self.riders.get(id.0).and_then(Rider::location) else {
                continue;
            };
            if !self.track.space(location.space).is_some_and(Space::is_finish) {
                continue;
            }
            self.vacate(location);
            if let Some(rider) = self.riders.get_mut(id.0) {
                rider.set_position(Position::Finished {
                    space: location.space,
                });
            }
            self.finishers.push(Finisher {
                rider: id,
                turn: self.turn,
            });
            crossed.push(id);
        }
        if !crossed.is_empty() {
            self.refresh_order();
        }
        crossed
    }

    /// The race is over once at most one rider is still out on the course.
    #[must_use]
    pub fn check_end_game(&self) -> bool {
        self.finishers.len() >= self.riders.len().saturating_sub(1)
    }

    /// Play a card from a rider's hand and return its movement value.
    ///
    /// # Errors
    ///
    /// Returns an error if the rider is unknown or the index is not in hand.
    pub fn play_card(&mut self, id: RiderId, index: usize) -> Result<u8, RaceError> {
        Ok(self.rider_mut(id)?.deck_mut().play_card(index)?)
    }

    /// Refill one rider's hand.
    ///
    /// # Errors
    ///
    /// Returns an error if the rider is unknown.
    pub fn draw_cards(&mut self, id: RiderId) -> Result<usize, RaceError> {
        Ok(self.rider_mut(id)?.deck_mut().draw_cards())
    }

    /// Refill every rider's hand.
    pub fn draw_all_cards(&mut self) {
        for rider in &mut self.riders {
            rider.deck_mut().draw_cards();
        }
    }

    #[cfg(test)]
    pub(crate) fn rider_mut_for_test(&mut self, id: RiderId) -> &mut Rider {
        &mut self.riders[id.0]
    }
}
