//! Per-rider card economy: draw pile, hand, discard pile.
//!
//! A played card leaves the game for good and the rest of the hand is
//! discarded, so decks thin out over a race unless exhaustion cards are
//! shuffled back in.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::RulesConfig;
use crate::seed::seed_bytes;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("card index {index} is outside a hand of {hand_len}")]
    CardIndexOutOfRange { index: usize, hand_len: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Card {
    Power(u8),
    Exhaustion,
}

impl Card {
    #[must_use]
    pub const fn is_exhaustion(self) -> bool {
        matches!(self, Self::Exhaustion)
    }

    /// Movement granted when this card is played.
    #[must_use]
    pub const fn movement(self, exhaustion_value: u8) -> u8 {
        match self {
            Self::Power(value) => value,
            Self::Exhaustion => exhaustion_value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deck {
    draw_pile: VecDeque<Card>,
    hand: Vec<Card>,
    discard_pile: Vec<Card>,
    removed: Vec<Card>,
    hand_size: usize,
    exhaustion_value: u8,
    exhaustion_drawn: usize,
    initial_size: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    /// Shuffle `cards` into a fresh draw pile and deal the opening hand.
    #[must_use]
    pub fn new(cards: Vec<Card>, seed: u64, rules: &RulesConfig) -> Self {
        let mut deck = Self {
            initial_size: cards.len(),
            draw_pile: cards.into(),
            hand: Vec::with_capacity(rules.hand_size),
            discard_pile: Vec::new(),
            removed: Vec::new(),
            hand_size: rules.hand_size,
            exhaustion_value: rules.exhaustion_value,
            exhaustion_drawn: 0,
            rng: ChaCha20Rng::from_seed(seed_bytes(seed)),
        };
        deck.shuffle_draw_pile();
        deck.draw_cards();
        deck
    }

    fn shuffle_draw_pile(&mut self) {
        self.draw_pile.make_contiguous().shuffle(&mut self.rng);
    }

    /// Move the whole discard pile under the draw pile and reshuffle.
    fn reshuffle(&mut self) {
        self.draw_pile.extend(self.discard_pile.drain(..));
        self.shuffle_draw_pile();
    }

    /// Refill the hand from the front of the draw pile.
    ///
    /// An empty draw pile is replenished from the discard pile. When both are
    /// exhausted the hand simply stays short. Returns the number of cards drawn.
    pub fn draw_cards(&mut self) -> usize {
        let mut drawn = 0;
        while self.hand.len() < self.hand_size {
            if self.draw_pile.is_empty() {
                if self.discard_pile.is_empty() {
                    break;
                }
                self.reshuffle();
            }
            let Some(card) = self.draw_pile.pop_front() else {
                break;
            };
            self.hand.push(card);
            drawn += 1;
        }
        drawn
    }

    /// Play the card at `index` and discard the rest of the hand.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` does not address a card in hand; the hand
    /// is left untouched in that case.
    pub fn play_card(&mut self, index: usize) -> Result<u8, DeckError> {
        if index >= self.hand.len() {
            return Err(DeckError::CardIndexOutOfRange {
                index,
                hand_len: self.hand.len(),
            });
        }
        let card = self.hand.remove(index);
        self.removed.push(card);
        self.discard_pile.append(&mut self.hand);
        Ok(card.movement(self.exhaustion_value))
    }

    /// Add a fatigue card to the discard pile; it surfaces after a reshuffle.
    pub fn draw_exhaustion(&mut self) {
        self.discard_pile.push(Card::Exhaustion);
        self.exhaustion_drawn += 1;
    }

    #[must_use]
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    #[must_use]
    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    #[must_use]
    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    /// Cards played this race, in play order.
    #[must_use]
    pub fn removed(&self) -> &[Card] {
        &self.removed
    }

    /// Cards still in play: hand, draw pile and discard pile.
    #[must_use]
    pub fn circulating_len(&self) -> usize {
        self.hand.len() + self.draw_pile.len() + self.discard_pile.len()
    }

    /// Exhaustion cards still in play.
    #[must_use]
    pub fn exhaustion_in_circulation(&self) -> usize {
        self.hand
            .iter()
            .chain(self.draw_pile.iter())
            .chain(self.discard_pile.iter())
            .filter(|card| card.is_exhaustion())
            .count()
    }

    #[must_use]
    pub const fn exhaustion_drawn(&self) -> usize {
        self.exhaustion_drawn
    }

    /// Every card this deck has ever held: the dealt deck plus fatigue.
    #[must_use]
    pub const fn total_issued(&self) -> usize {
        self.initial_size + self.exhaustion_drawn
    }

    #[cfg(test)]
    pub(crate) fn set_hand_for_test(&mut self, hand: Vec<Card>) {
        self.draw_pile.extend(self.hand.drain(..));
        for card in &hand {
            if let Some(pos) = self.draw_pile.iter().position(|c| c == card) {
                self.draw_pile.remove(pos);
            } else if let Some(pos) = self.discard_pile.iter().position(|c| c == card) {
                self.discard_pile.remove(pos);
            }
        }
        self.hand = hand;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn powers(values: &[u8]) -> Vec<Card> {
        values.iter().copied().map(Card::Power).collect()
    }

    fn deck_of(values: &[u8], seed: u64) -> Deck {
        Deck::new(powers(values), seed, &RulesConfig::default())
    }

    fn assert_conserved(deck: &Deck) {
        assert_eq!(
            deck.circulating_len() + deck.removed().len(),
            deck.total_issued(),
            "cards created or lost"
        );
    }

    #[test]
    fn new_deck_deals_four() {
        let deck = deck_of(&[2, 3, 4, 5, 9, 9], 7);
        assert_eq!(deck.hand().len(), 4);
        assert_eq!(deck.draw_pile_len(), 2);
        assert!(deck.discard_pile().is_empty());
        assert_conserved(&deck);
    }

    #[test]
    fn same_seed_same_shuffle() {
        let a = deck_of(&[2, 3, 4, 5, 6, 7, 8, 9], 99);
        let b = deck_of(&[2, 3, 4, 5, 6, 7, 8, 9], 99);
        assert_eq!(a.hand(), b.hand());
    }

    #[test]
    fn play_card_removes_card_and_discards_rest() {
        let mut deck = deck_of(&[2, 3, 4, 5, 6, 7], 1);
        let expected = deck.hand()[1];
        let value = deck.play_card(1).unwrap();
        assert_eq!(Card::Power(value), expected);
        assert!(deck.hand().is_empty());
        assert_eq!(deck.discard_pile().len(), 3);
        assert_eq!(deck.removed(), &[expected]);
        assert_eq!(deck.circulating_len(), 5);
        assert_conserved(&deck);
    }

    #[test]
    fn play_card_rejects_bad_index_without_change() {
        let mut deck = deck_of(&[2, 3, 4, 5, 6], 3);
        let before = deck.hand().to_vec();
        assert_eq!(
            deck.play_card(4),
            Err(DeckError::CardIndexOutOfRange {
                index: 4,
                hand_len: 4
            })
        );
        assert_eq!(deck.hand(), before.as_slice());
    }

    #[test]
    fn draw_reshuffles_discard_when_pile_runs_dry() {
        let mut deck = deck_of(&[2, 3, 4, 5, 6, 7], 5);
        deck.play_card(0).unwrap();
        assert_eq!(deck.draw_pile_len(), 2);
        let drawn = deck.draw_cards();
        assert_eq!(drawn, 4);
        assert_eq!(deck.hand().len(), 4);
        assert_eq!(deck.circulating_len(), 5);
        assert_conserved(&deck);
    }

    #[test]
    fn draw_stops_short_when_everything_is_spent() {
        let mut deck = deck_of(&[2, 3, 4, 5, 6], 11);
        deck.play_card(0).unwrap();
        deck.draw_cards();
        deck.play_card(0).unwrap();
        deck.draw_cards();
        assert_eq!(deck.hand().len(), 3);
        deck.play_card(0).unwrap();
        assert_eq!(deck.draw_cards(), 2);
        deck.play_card(0).unwrap();
        assert_eq!(deck.draw_cards(), 1);
        deck.play_card(0).unwrap();
        assert_eq!(deck.draw_cards(), 0);
        assert!(deck.hand().is_empty());
        assert_eq!(deck.removed().len(), 5);
        assert_conserved(&deck);
    }

    #[test]
    fn exhaustion_enters_through_discard() {
        let mut deck = deck_of(&[2, 3, 4, 5], 8);
        deck.draw_exhaustion();
        assert_eq!(deck.discard_pile(), &[Card::Exhaustion]);
        assert_eq!(deck.exhaustion_in_circulation(), 1);
        assert_eq!(deck.total_issued(), 5);
        assert_conserved(&deck);

        // Hand holds the whole draw pile, so the refill reshuffles the discard.
        deck.play_card(0).unwrap();
        assert_eq!(deck.draw_cards(), 4);
        assert!(deck.hand().contains(&Card::Exhaustion));
        assert!(deck.discard_pile().is_empty());
        assert_conserved(&deck);
    }

    #[test]
    fn playing_exhaustion_yields_two_and_retires_the_card() {
        let mut deck = deck_of(&[9, 9, 9, 9, 9, 9], 2);
        deck.draw_exhaustion();
        deck.set_hand_for_test(vec![
            Card::Power(9),
            Card::Exhaustion,
            Card::Power(9),
            Card::Power(9),
        ]);
        assert_conserved(&deck);
        let circulating = deck.circulating_len();
        assert_eq!(deck.play_card(1).unwrap(), 2);
        assert_eq!(deck.circulating_len(), circulating - 1);
        assert_eq!(deck.exhaustion_in_circulation(), 0);
        assert_eq!(deck.removed(), &[Card::Exhaustion]);

        for _ in 0..4 {
            deck.draw_cards();
            assert!(deck.hand().iter().all(|card| !card.is_exhaustion()));
            deck.play_card(0).unwrap();
        }
    }
}
