//! Poker hand classification with wild cards.
//!
//! [`HandAnalyzer`] finds the best `size`-card hand (5 for stud and hold'em,
//! 3 for three-card games, 2 for two-card Guts) that can be built from any
//! number of input cards and scores it with a strength integer that totally
//! orders hands.
//!
//! Wild cards normally substitute for any card. A constrained analyzer lets
//! each wild keep either its suit (free rank) or its rank (free suit) and
//! keeps whichever assignment scores best.
//!
//! ```
//! use cardroom_engine::analyzer::{HandAnalyzer, HandCategory};
//! use cardroom_engine::cards::parse_cards;
//!
//! let mut analyzer = HandAnalyzer::new(5);
//! let hand = analyzer.analyze(&parse_cards("2c,3d,4h,5s,14c").unwrap());
//! assert_eq!(hand.category, HandCategory::Straight);
//! assert_eq!(hand.descriptor, vec![5]);
//! ```

mod category;
mod pool;

use std::collections::HashMap;

use tracing::trace;

use crate::cards::Card;

pub use category::{strength_of, HandCategory, HandResult};
use pool::{Pool, Slot};

#[derive(Debug, Clone)]
pub struct HandAnalyzer {
    size: usize,
    constrained: bool,
    multiples_only: bool,
    cache: HashMap<String, HandResult>,
}

impl HandAnalyzer {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            constrained: false,
            multiples_only: false,
            cache: HashMap::new(),
        }
    }

    /// Analyzer for partial, face-up holdings: only pairs, trips, quads
    /// and high cards are recognized.
    pub fn showing() -> Self {
        Self::new(5).multiples_only()
    }

    pub fn multiples_only(mut self) -> Self {
        self.multiples_only = true;
        self
    }

    /// Wilds substitute rank or suit, never both.
    pub fn constrained(mut self) -> Self {
        self.constrained = true;
        self
    }

    pub fn with_constrained(self, on: bool) -> Self {
        if on {
            self.constrained()
        } else {
            self
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn analyze(&mut self, cards: &[Card]) -> HandResult {
        let key = cache_key(cards);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let result = if self.constrained {
            self.best_constrained(cards)
        } else {
            let slots: Vec<Slot> = cards
                .iter()
                .map(|c| {
                    if c.is_wild {
                        Slot::joker()
                    } else {
                        Slot::natural(c.rank.value(), c.suit)
                    }
                })
                .collect();
            Pool::new(&slots, self.size, self.multiples_only).best()
        };
        trace!(
            hand = %key,
            category = ?result.category,
            strength = result.strength,
            "analyzed hand"
        );
        self.cache.insert(key, result.clone());
        result
    }

    /// Tries every rank-or-suit assignment of the wilds as a bitmask: a set
    /// bit keeps the wild's suit, a clear bit keeps its rank.
    fn best_constrained(&self, cards: &[Card]) -> HandResult {
        let naturals: Vec<Slot> = cards
            .iter()
            .filter(|c| !c.is_wild)
            .map(|c| Slot::natural(c.rank.value(), c.suit))
            .collect();
        let wilds: Vec<&Card> = cards.iter().filter(|c| c.is_wild).collect();
        let mut best: Option<HandResult> = None;
        for mask in 0u32..(1u32 << wilds.len()) {
            let mut slots = naturals.clone();
            for (i, w) in wilds.iter().enumerate() {
                slots.push(if mask & (1 << i) != 0 {
                    Slot {
                        rank: None,
                        suit: Some(w.suit),
                    }
                } else {
                    Slot {
                        rank: Some(w.rank.value()),
                        suit: None,
                    }
                });
            }
            let r = Pool::new(&slots, self.size, self.multiples_only).best();
            if best.as_ref().map_or(true, |b| r.strength > b.strength) {
                best = Some(r);
            }
        }
        best.unwrap_or_else(|| Pool::new(&naturals, self.size, self.multiples_only).best())
    }
}

/// One-shot analysis without keeping a cache.
pub fn best_hand(cards: &[Card], size: usize) -> HandResult {
    HandAnalyzer::new(size).analyze(cards)
}

fn cache_key(cards: &[Card]) -> String {
    let mut parts: Vec<String> = cards.iter().map(|c| c.to_string()).collect();
    parts.sort_unstable();
    parts.join(",")
}
