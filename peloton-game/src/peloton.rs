//! Peloton grouping over the current lane occupancy.
use serde::{Deserialize, Serialize};

use crate::rider::RiderId;
use crate::track::Track;

/// A maximal run of occupied spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peloton {
    pub start: usize,
    pub end: usize,
    /// Leading rider first: furthest space first, lanes ascending within a space.
    pub riders: Vec<RiderId>,
}

impl Peloton {
    #[must_use]
    pub fn len(&self) -> usize {
        self.riders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    /// Whether exactly one empty space separates this group from `leading`.
    #[must_use]
    pub const fn one_gap_behind(&self, leading: &Self) -> bool {
        leading.start == self.end + 2
    }

    /// Whether this group is pulled forward by `leading` on `track`.
    #[must_use]
    pub fn can_slipstream_into(&self, leading: &Self, track: &Track) -> bool {
        self.one_gap_behind(leading)
            && track
                .space(leading.start)
                .is_some_and(|space| space.allows_slipstream())
    }
}

/// Group riders into pelotons, rearmost group first.
#[must_use]
pub fn detect_pelotons(track: &Track) -> Vec<Peloton> {
    let mut pelotons = Vec::new();
    let mut current: Option<Peloton> = None;
    for (index, space) in track.spaces().iter().enumerate() {
        if space.is_occupied() {
            let group = current.get_or_insert_with(|| Peloton {
                start: index,
                end: index,
                riders: Vec::new(),
            });
            group.end = index;
            group.riders.splice(0..0, space.occupants());
        } else if let Some(group) = current.take() {
            pelotons.push(group);
        }
    }
    pelotons.extend(current);
    pelotons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulesConfig;
    use crate::space::{SpaceKind, SpaceSpec, Tile};
    use crate::track::PlayerBracket;

    fn track(kinds: &[SpaceKind]) -> Track {
        let specs: Vec<_> = kinds.iter().map(|kind| SpaceSpec(*kind, 2)).collect();
        let tile = Tile::from_specs("t", &specs, &RulesConfig::default());
        Track::from_tiles("test", PlayerBracket::TwoToFour, vec![tile])
    }

    fn put(track: &mut Track, space: usize, lane: usize, rider: usize) {
        track.space_mut(space).unwrap().occupy(lane, RiderId(rider));
    }

    #[test]
    fn empty_track_has_no_pelotons() {
        let track = track(&[SpaceKind::Normal; 4]);
        assert!(detect_pelotons(&track).is_empty());
    }

    #[test]
    fn groups_split_on_empty_spaces() {
        let mut track = track(&[SpaceKind::Normal; 8]);
        put(&mut track, 0, 0, 0);
        put(&mut track, 1, 0, 1);
        put(&mut track, 1, 1, 2);
        put(&mut track, 3, 0, 3);
        put(&mut track, 7, 0, 4);

        let pelotons = detect_pelotons(&track);
        assert_eq!(pelotons.len(), 3);
        assert_eq!((pelotons[0].start, pelotons[0].end), (0, 1));
        assert_eq!(
            pelotons[0].riders,
            vec![RiderId(1), RiderId(2), RiderId(0)]
        );
        assert_eq!((pelotons[1].start, pelotons[1].end), (3, 3));
        assert_eq!((pelotons[2].start, pelotons[2].end), (7, 7));
        assert!(pelotons[0].one_gap_behind(&pelotons[1]));
        assert!(!pelotons[1].one_gap_behind(&pelotons[2]));
    }

    #[test]
    fn slipstream_needs_permissive_leading_space() {
        let mut track = track(&[
            SpaceKind::Normal,
            SpaceKind::Normal,
            SpaceKind::Uphill,
            SpaceKind::Normal,
            SpaceKind::Normal,
            SpaceKind::Normal,
        ]);
        put(&mut track, 0, 0, 0);
        put(&mut track, 2, 0, 1);
        put(&mut track, 4, 0, 2);
        let pelotons = detect_pelotons(&track);
        assert!(!pelotons[0].can_slipstream_into(&pelotons[1], &track));
        assert!(pelotons[1].can_slipstream_into(&pelotons[2], &track));
    }

    #[test]
    fn group_touching_last_space_is_closed() {
        let mut track = track(&[SpaceKind::Normal; 3]);
        put(&mut track, 2, 0, 9);
        let pelotons = detect_pelotons(&track);
        assert_eq!(pelotons.len(), 1);
        assert_eq!(pelotons[0].end, 2);
        assert_eq!(pelotons[0].len(), 1);
    }
}
