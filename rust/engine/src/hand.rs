use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::Card;

/// Ordered cards held by one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn has_card(&self, card: &Card) -> bool {
        self.cards.iter().any(|c| c == card)
    }

    /// Removes up to `max` cards equal to `card` (all of them when `max` is
    /// `None` or zero) and returns how many were removed.
    pub fn discard(&mut self, card: &Card, max: Option<usize>) -> usize {
        let limit = match max {
            None | Some(0) => usize::MAX,
            Some(n) => n,
        };
        let mut removed = 0;
        self.cards.retain(|c| {
            if removed < limit && c == card {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Card> {
        (index < self.cards.len()).then(|| self.cards.remove(index))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn face_up(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|c| c.is_face_up())
    }

    pub fn face_down(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|c| !c.is_face_up())
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.cards.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    #[test]
    fn capped_discard() {
        let mut h = Hand::from_cards(parse_cards("3c,3c,3c,4d").unwrap());
        let three = "3c".parse().unwrap();
        assert_eq!(h.discard(&three, Some(2)), 2);
        assert_eq!(h.len(), 2);
        assert_eq!(h.discard(&three, None), 1);
        assert!(!h.has_card(&three));
        assert_eq!(h.to_string(), "4d");
    }
}
