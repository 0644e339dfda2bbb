//! One full game turn composed from the race operations.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::race::{Race, RaceError, SlipstreamReport};
use crate::rider::{Location, Rider, RiderId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderMove {
    pub rider: RiderId,
    pub power: u8,
    pub from: Location,
    pub to: Location,
}

/// What happened during a resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub turn: u32,
    pub moves: Vec<RiderMove>,
    pub slipstream: SlipstreamReport,
    pub finished: Vec<RiderId>,
    pub exhausted: Vec<RiderId>,
    pub race_over: bool,
}

impl Race {
    /// Resolve a turn from the power values each rider played.
    ///
    /// Riders move front to back in the order held when the turn began;
    /// riders without a played value stay put. Slipstream follows, then
    /// finishers are recorded. Unless the race just ended, exhaustion is
    /// dealt and every hand is refilled before the turn counter advances.
    ///
    /// # Errors
    ///
    /// Returns an error, before anything moves, if a played rider is unknown
    /// or not yet placed. Also fails if slipstream does not settle.
    pub fn resolve_turn(
        &mut self,
        played: &BTreeMap<RiderId, u8>,
    ) -> Result<TurnOutcome, RaceError> {
        let turn = self.turn();
        let order = self.rider_order().to_vec();

        for &id in played.keys() {
            let rider = self.rider(id).ok_or(RaceError::UnknownRider(id))?;
            if !rider.is_finished() && rider.location().is_none() {
                return Err(RaceError::RiderNotPlaced(id));
            }
        }

        let mut moves = Vec::with_capacity(played.len());
        for id in order {
            let Some(&power) = played.get(&id) else {
                continue;
            };
            let Some(from) = self.rider(id).and_then(Rider::location) else {
                continue;
            };
            let to = self.move_rider(id, power)?;
            moves.push(RiderMove {
                rider: id,
                power,
                from,
                to,
            });
        }

        let slipstream = self.apply_slipstream()?;
        let finished = self.record_finishers();
        let race_over = self.check_end_game();

        let mut exhausted = Vec::new();
        if !race_over {
            exhausted = self.apply_exhaustion_all();
            self.draw_all_cards();
            self.next_turn();
        }

        Ok(TurnOutcome {
            turn,
            moves,
            slipstream,
            finished,
            exhausted,
            race_over,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rider::Color;
    use crate::rules::RulesConfig;
    use crate::space::{SpaceKind, SpaceSpec, Tile};
    use crate::track::{PlayerBracket, Track};

    fn sprint_track() -> Track {
        let mut specs = vec![SpaceSpec(SpaceKind::Start, 2)];
        specs.extend(std::iter::repeat_n(SpaceSpec(SpaceKind::Normal, 2), 8));
        specs.push(SpaceSpec(SpaceKind::Finish, 2));
        let tile = Tile::from_specs("sprint", &specs, &RulesConfig::default());
        Track::from_tiles("sprint", PlayerBracket::TwoToFour, vec![tile])
    }

    #[test]
    fn turn_moves_slips_and_exhausts() {
        let mut race = Race::new(sprint_track(), RulesConfig::default(), 99);
        race.register_player(Color::Red).unwrap();
        race.place_rider(RiderId(0), 0).unwrap();
        race.place_rider(RiderId(1), 0).unwrap();

        let played = BTreeMap::from([(RiderId(0), 4), (RiderId(1), 2)]);
        let outcome = race.resolve_turn(&played).unwrap();

        assert_eq!(outcome.turn, 1);
        assert_eq!(outcome.moves.len(), 2);
        assert_eq!(outcome.moves[0].rider, RiderId(0));
        assert_eq!(outcome.moves[0].to, Location::new(4, 0));
        // rider 1 landed on 2, one gap behind 4, and is pulled up to 3
        assert_eq!(outcome.slipstream.shifts.len(), 1);
        assert_eq!(race.rider(RiderId(1)).unwrap().location(), Some(Location::new(3, 0)));
        assert_eq!(outcome.exhausted, vec![RiderId(0)]);
        assert!(!outcome.race_over);
        assert_eq!(race.turn(), 2);
        assert_eq!(race.rider(RiderId(0)).unwrap().deck().exhaustion_drawn(), 1);
    }

    #[test]
    fn race_ends_when_one_rider_remains() {
        let mut race = Race::new(sprint_track(), RulesConfig::default(), 3);
        race.register_player(Color::Green).unwrap();
        race.place_rider(RiderId(0), 0).unwrap();
        race.place_rider(RiderId(1), 0).unwrap();

        let played = BTreeMap::from([(RiderId(0), 9), (RiderId(1), 2)]);
        let outcome = race.resolve_turn(&played).unwrap();
        assert_eq!(outcome.finished, vec![RiderId(0)]);
        assert!(outcome.race_over);
        assert!(outcome.exhausted.is_empty());
        assert_eq!(race.turn(), 1);
        assert_eq!(race.finishers()[0].turn, 1);
    }

    #[test]
    fn finished_riders_are_skipped() {
        let mut race = Race::new(sprint_track(), RulesConfig::default(), 5);
        race.register_player(Color::Red).unwrap();
        race.register_player(Color::Blue).unwrap();
        race.place_rider(RiderId(0), 1).unwrap();
        race.place_rider(RiderId(1), 1).unwrap();
        race.place_rider(RiderId(2), 0).unwrap();
        race.place_rider(RiderId(3), 0).unwrap();

        let dash = BTreeMap::from([
            (RiderId(0), 9),
            (RiderId(1), 2),
            (RiderId(2), 2),
            (RiderId(3), 2),
        ]);
        let outcome = race.resolve_turn(&dash).unwrap();
        assert_eq!(outcome.finished, vec![RiderId(0)]);
        assert!(!outcome.race_over);

        let again = race.resolve_turn(&dash).unwrap();
        assert!(again.moves.iter().all(|step| step.rider != RiderId(0)));
    }

    #[test]
    fn unknown_rider_is_rejected() {
        let mut race = Race::new(sprint_track(), RulesConfig::default(), 5);
        race.register_player(Color::Red).unwrap();
        race.place_rider(RiderId(0), 0).unwrap();
        let played = BTreeMap::from([(RiderId(7), 3)]);
        assert_eq!(
            race.resolve_turn(&played),
            Err(RaceError::UnknownRider(RiderId(7)))
        );

        let played = BTreeMap::from([(RiderId(0), 5), (RiderId(1), 3)]);
        assert_eq!(
            race.resolve_turn(&played),
            Err(RaceError::RiderNotPlaced(RiderId(1)))
        );
        assert_eq!(race.rider(RiderId(0)).unwrap().location(), Some(Location::new(0, 0)));
        assert_eq!(race.turn(), 1);
    }
}
