use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha1::{Digest, Sha1};

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// An ordered 52-card deck bound to a reproducible generator.
///
/// The deck starts in canonical order and stays that way until
/// [`Deck::shuffle`] fixes an ordering. Cards are drawn from the front.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    seed: u64,
    rng: ChaCha20Rng,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    pub fn new() -> Self {
        Self {
            cards: full_deck(),
            seed: 0,
            rng: ChaCha20Rng::seed_from_u64(0),
        }
    }

    /// A deck that deals `cards` in the given order. Used to stage hands.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            seed: 0,
            rng: ChaCha20Rng::seed_from_u64(0),
        }
    }

    /// Canonical deck shuffled with `seed`.
    pub fn new_with_seed(seed: u64) -> Self {
        let mut deck = Self::new();
        deck.shuffle(seed);
        deck
    }

    /// Rebuilds the full 52 cards, shuffles them and returns the effective seed.
    /// A zero seed is replaced with the wall clock in nanoseconds.
    pub fn shuffle(&mut self, seed: u64) -> u64 {
        let seed = if seed == 0 { wall_clock_seed() } else { seed };
        self.seed = seed;
        self.rng = ChaCha20Rng::seed_from_u64(seed);
        self.cards = full_deck();
        fisher_yates(&mut self.cards, &mut self.rng);
        seed
    }

    /// Replaces the deck with `cards`, shuffled by the current generator.
    pub fn shuffle_discards(&mut self, cards: Vec<Card>) {
        self.cards = cards.into_iter().map(|c| c.plain()).collect();
        fisher_yates(&mut self.cards, &mut self.rng);
    }

    pub fn draw(&mut self) -> Result<Card, GameError> {
        if self.cards.is_empty() {
            return Err(GameError::EndOfDeck);
        }
        Ok(self.cards.remove(0))
    }

    /// Discards the top card.
    pub fn burn(&mut self) -> Result<(), GameError> {
        self.draw().map(|_| ())
    }

    pub fn can_draw(&self, n: usize) -> bool {
        self.cards.len() >= n
    }

    pub fn cards_left(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Removes the first card equal to `card`.
    pub fn remove_card(&mut self, card: &Card) -> bool {
        match self.cards.iter().position(|c| c == card) {
            Some(i) => {
                self.cards.remove(i);
                true
            }
            None => false,
        }
    }

    /// SHA-1 hex digest over the text form of each remaining card.
    pub fn hash_code(&self) -> String {
        let mut hasher = Sha1::new();
        for c in &self.cards {
            hasher.update(c.to_string().as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

fn fisher_yates(cards: &mut [Card], rng: &mut ChaCha20Rng) {
    if cards.len() < 2 {
        return;
    }
    for j in (1..cards.len()).rev() {
        let i = rng.random_range(0..=j);
        cards.swap(i, j);
    }
}

fn wall_clock_seed() -> u64 {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    match nanos as u64 {
        0 => 1,
        n => n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    #[test]
    fn fresh_deck_is_canonical() {
        let d = Deck::new();
        assert_eq!(d.cards_left(), 52);
        assert_eq!(d.cards()[0], Card::new(Rank::Two, Suit::Clubs));
        assert_eq!(d.cards()[51], Card::new(Rank::Ace, Suit::Spades));
    }

    #[test]
    fn zero_seed_uses_clock() {
        let mut d = Deck::new();
        assert_ne!(d.shuffle(0), 0);
    }

    #[test]
    fn shuffle_rebuilds_a_partial_deck() {
        let mut d = Deck::new();
        d.draw().unwrap();
        d.shuffle(9);
        assert_eq!(d.cards_left(), 52);
    }

    #[test]
    fn draw_empty_fails() {
        let mut d = Deck::from_cards(vec![]);
        assert_eq!(d.draw(), Err(GameError::EndOfDeck));
    }
}
