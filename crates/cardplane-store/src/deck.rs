use crate::shuffle::materialize;
use cardplane_schema::{Card, DeckName};
use serde::Serialize;
use std::collections::VecDeque;

/// Ordered pool of undealt cards. The front is the next card dealt.
#[derive(Debug, Clone)]
pub struct Deck {
    name: DeckName,
    cards: VecDeque<Card>,
    generation: u64,
}

/// Point-in-time summary of a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckStatus {
    pub name: DeckName,
    pub remaining: usize,
    /// Number of times the deck has been (re)shuffled from the full universe.
    pub generation: u64,
    /// Face of the next card to be dealt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
}

impl Deck {
    pub fn empty(name: DeckName) -> Self {
        Self {
            name,
            cards: VecDeque::new(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the contents with a freshly shuffled universe.
    pub fn refill(&mut self, seed: i64) {
        self.cards = materialize(seed).into();
        self.generation += 1;
    }

    pub fn deal(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn discard(&mut self, card: Card) {
        self.cards.push_back(card);
    }

    /// Remove every undealt card with the given face; returns how many went.
    pub fn purge(&mut self, face: &str) -> usize {
        let before = self.cards.len();
        self.cards.retain(|card| card.face() != face);
        before - self.cards.len()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn status(&self) -> DeckStatus {
        DeckStatus {
            name: self.name.clone(),
            remaining: self.cards.len(),
            generation: self.generation,
            top: self.cards.front().map(Card::face),
        }
    }
}
