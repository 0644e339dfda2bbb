//! Serializable view of the board for reports and determinism checks.
use serde::{Deserialize, Serialize};

use crate::race::{Finisher, Race};
use crate::rider::{Color, RiderId, RiderKind};
use crate::space::SpaceKind;
use crate::track::PlayerBracket;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantSnapshot {
    pub rider: RiderId,
    pub color: Color,
    pub kind: RiderKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    pub index: usize,
    pub kind: SpaceKind,
    /// One entry per lane, lane 0 first.
    pub lanes: Vec<Option<OccupantSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub course: String,
    pub bracket: PlayerBracket,
    pub turn: u32,
    pub spaces: Vec<SpaceSnapshot>,
    pub finishers: Vec<Finisher>,
}

impl BoardSnapshot {
    /// Riders currently on the board.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.spaces
            .iter()
            .flat_map(|space| space.lanes.iter())
            .filter(|lane| lane.is_some())
            .count()
    }

    /// Compact one-line-per-space rendering, e.g. `12 uphill   [r-s|.]`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for space in &self.spaces {
            let lanes: Vec<String> = space
                .lanes
                .iter()
                .map(|lane| match lane {
                    Some(occupant) => format!(
                        "{}-{}",
                        occupant.color.label().chars().next().unwrap_or('?'),
                        occupant.kind.initial()
                    ),
                    None => ".".to_string(),
                })
                .collect();
            out.push_str(&format!(
                "{:>3} {:<9} [{}]\n",
                space.index,
                space.kind.label(),
                lanes.join("|")
            ));
        }
        out
    }
}

impl Race {
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let spaces = self
            .track()
            .spaces()
            .iter()
            .enumerate()
            .map(|(index, space)| SpaceSnapshot {
                index,
                kind: space.kind(),
                lanes: space
                    .lanes()
                    .iter()
                    .map(|slot| {
                        slot.and_then(|id| self.rider(id)).map(|rider| OccupantSnapshot {
                            rider: rider.id(),
                            color: rider.color(),
                            kind: rider.kind(),
                        })
                    })
                    .collect(),
            })
            .collect();

        BoardSnapshot {
            course: self.track().name().to_string(),
            bracket: self.track().bracket(),
            turn: self.turn(),
            spaces,
            finishers: self.finishers().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::race::Race;
    use crate::rider::{Color, RiderId};
    use crate::rules::RulesConfig;
    use crate::space::{SpaceKind, SpaceSpec, Tile};
    use crate::track::{PlayerBracket, Track};

    #[test]
    fn snapshot_mirrors_lanes() {
        let rules = RulesConfig::default();
        let tile = Tile::from_specs(
            "t",
            &[
                SpaceSpec(SpaceKind::Start, 2),
                SpaceSpec(SpaceKind::Uphill, 1),
                SpaceSpec(SpaceKind::Finish, 3),
            ],
            &rules,
        );
        let track = Track::from_tiles("mini", PlayerBracket::TwoToFour, vec![tile]);
        let mut race = Race::new(track, rules, 1);
        race.register_player(Color::Red).unwrap();
        race.place_rider(RiderId(0), 0).unwrap();
        race.place_rider(RiderId(1), 1).unwrap();

        let snapshot = race.snapshot();
        assert_eq!(snapshot.course, "mini");
        assert_eq!(snapshot.spaces.len(), 3);
        assert_eq!(snapshot.spaces[2].lanes.len(), 3);
        assert_eq!(snapshot.occupied(), 2);
        let occupant = snapshot.spaces[1].lanes[0].unwrap();
        assert_eq!(occupant.rider, RiderId(1));
        assert_eq!(occupant.color, Color::Red);
        assert_eq!(
            snapshot.render().lines().next(),
            Some("  0 start     [r-s|.]")
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"uphill\""));
        assert!(json.contains("\"2-4\""));
    }
}
