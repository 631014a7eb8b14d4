use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cards::{rank_name, rank_plural};

/// Hand categories in ascending order of value.
///
/// The three-card-poker categories only come out of a size-3 analyzer and
/// sit above five-card straights and flushes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    ThreeCardPokerStraight = 6,
    ThreeCardPokerThreeOfAKind = 7,
    FullHouse = 8,
    FourOfAKind = 9,
    StraightFlush = 10,
    RoyalFlush = 11,
}

pub(crate) const STRENGTH_BASE: u32 = 15;

/// Best hand found by [`super::HandAnalyzer`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub category: HandCategory,
    /// Total order over hands: category dominates, then the descriptor ranks.
    pub strength: u32,
    /// Ranks that decide ties, most significant first (high card, then kickers).
    pub descriptor: Vec<u8>,
}

impl HandResult {
    pub(crate) fn new(category: HandCategory, descriptor: Vec<u8>) -> Self {
        let strength = strength_of(category, &descriptor);
        Self {
            category,
            strength,
            descriptor,
        }
    }

    /// Human readable name such as "Pair of Aces" or "Straight to Five".
    pub fn describe(&self) -> String {
        let d = |i: usize| self.descriptor.get(i).copied().unwrap_or(0);
        match self.category {
            HandCategory::HighCard => format!("{} High", rank_name(d(0))),
            HandCategory::OnePair => format!("Pair of {}", rank_plural(d(0))),
            HandCategory::TwoPair => {
                format!("Two Pair, {} and {}", rank_plural(d(0)), rank_plural(d(1)))
            }
            HandCategory::ThreeOfAKind | HandCategory::ThreeCardPokerThreeOfAKind => {
                format!("Three {}", rank_plural(d(0)))
            }
            HandCategory::Straight | HandCategory::ThreeCardPokerStraight => {
                format!("Straight to {}", rank_name(d(0)))
            }
            HandCategory::Flush => format!("{}-High Flush", rank_name(d(0))),
            HandCategory::FullHouse => {
                format!("{} Full of {}", rank_plural(d(0)), rank_plural(d(1)))
            }
            HandCategory::FourOfAKind => format!("Four {}", rank_plural(d(0))),
            HandCategory::StraightFlush => format!("Straight Flush to {}", rank_name(d(0))),
            HandCategory::RoyalFlush => "Royal Flush".to_string(),
        }
    }
}

impl PartialOrd for HandResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.strength.cmp(&other.strength)
    }
}

/// `category * 15^5 + sum(rank_i * 15^(4-i))` over at most five descriptor ranks.
pub fn strength_of(category: HandCategory, descriptor: &[u8]) -> u32 {
    let mut total = category as u32 * STRENGTH_BASE.pow(5);
    for (i, &r) in descriptor.iter().take(5).enumerate() {
        total += r as u32 * STRENGTH_BASE.pow(4 - i as u32);
    }
    total
}
