use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cards in the universe a deck is built from.
pub const DECK_SIZE: usize = Suit::ALL.len() * Rank::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// Canonical order used when a deck is materialized.
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|suit| suit.symbol() == s)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Canonical order used when a deck is materialized.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rank| rank.label() == s)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One card of the 52-card universe. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    /// Identity key of the card: suit symbol followed by rank label, e.g. `♠A`.
    pub fn face(&self) -> String {
        format!("{}{}", self.suit.symbol(), self.rank.label())
    }

    /// All 52 cards, suits outer and ranks inner, in canonical order.
    pub fn universe() -> Vec<Card> {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(suit, rank));
            }
        }
        cards
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.suit.symbol(), self.rank.label())
    }
}

/// Observed status of a managed card resource.
///
/// All fields are empty while the resource has not been dealt a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardObservation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suit: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rank: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub face: String,
}

impl CardObservation {
    pub fn is_dealt(&self) -> bool {
        !self.face.is_empty()
    }

    /// Parse the observation back into a card. `Ok(None)` when nothing is dealt.
    pub fn card(&self) -> Result<Option<Card>, SchemaError> {
        if !self.is_dealt() {
            return Ok(None);
        }
        let suit = Suit::from_symbol(&self.suit)
            .ok_or_else(|| SchemaError::UnknownSuit(self.suit.clone()))?;
        let rank = Rank::from_label(&self.rank)
            .ok_or_else(|| SchemaError::UnknownRank(self.rank.clone()))?;
        let card = Card::new(suit, rank);
        let expected = card.face();
        if expected != self.face {
            return Err(SchemaError::FaceMismatch {
                face: self.face.clone(),
                expected,
            });
        }
        Ok(Some(card))
    }
}

impl From<Card> for CardObservation {
    fn from(card: Card) -> Self {
        Self {
            suit: card.suit.symbol().to_owned(),
            rank: card.rank.label().to_owned(),
            face: card.face(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn universe_has_52_distinct_faces() {
        let cards = Card::universe();
        assert_eq!(cards.len(), DECK_SIZE);
        let faces: HashSet<String> = cards.iter().map(Card::face).collect();
        assert_eq!(faces.len(), 52);
    }

    #[test]
    fn universe_is_suit_major() {
        let cards = Card::universe();
        assert_eq!(cards[0].face(), "♠2");
        assert_eq!(cards[12].face(), "♠A");
        assert_eq!(cards[13].face(), "♥2");
        assert_eq!(cards[51].face(), "♣A");
    }

    #[test]
    fn face_is_symbol_then_label() {
        assert_eq!(Card::new(Suit::Diamonds, Rank::Ten).face(), "♦10");
        assert_eq!(Card::new(Suit::Clubs, Rank::Queen).to_string(), "♣Q");
    }

    #[test]
    fn suit_and_rank_lookup() {
        assert_eq!(Suit::from_symbol("♥"), Some(Suit::Hearts));
        assert_eq!(Suit::from_symbol("H"), None);
        assert_eq!(Rank::from_label("10"), Some(Rank::Ten));
        assert_eq!(Rank::from_label("1"), None);
    }

    #[test]
    fn empty_observation_is_not_dealt() {
        let obs = CardObservation::default();
        assert!(!obs.is_dealt());
        assert_eq!(obs.card().unwrap(), None);
    }

    #[test]
    fn observation_from_card_parses_back() {
        let card = Card::new(Suit::Spades, Rank::King);
        let obs = CardObservation::from(card);
        assert_eq!(obs.face, "♠K");
        assert_eq!(obs.suit, "♠");
        assert_eq!(obs.rank, "K");
        assert_eq!(obs.card().unwrap(), Some(card));
    }

    #[test]
    fn observation_with_inconsistent_face_is_rejected() {
        let obs = CardObservation {
            suit: "♠".to_owned(),
            rank: "K".to_owned(),
            face: "♥K".to_owned(),
        };
        assert!(matches!(obs.card(), Err(SchemaError::FaceMismatch { .. })));
    }

    #[test]
    fn observation_with_unknown_rank_is_rejected() {
        let obs = CardObservation {
            suit: "♠".to_owned(),
            rank: "Z".to_owned(),
            face: "♠Z".to_owned(),
        };
        assert!(matches!(obs.card(), Err(SchemaError::UnknownRank(_))));
    }

    #[test]
    fn empty_observation_serializes_to_empty_object() {
        let json = serde_json::to_string(&CardObservation::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
