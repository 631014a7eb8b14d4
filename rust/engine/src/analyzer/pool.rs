//! Card pool used by the evaluator.
//!
//! Every input card becomes a slot whose rank and suit are either pinned or
//! free. Naturals pin both, unconstrained wilds pin neither, and a constrained
//! wild pins exactly one. Category checks then ask how many free slots are
//! needed to complete a shape.

use crate::cards::Suit;

use super::category::{HandCategory, HandResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub rank: Option<u8>,
    pub suit: Option<Suit>,
}

impl Slot {
    pub fn natural(rank: u8, suit: Suit) -> Self {
        Self {
            rank: Some(rank),
            suit: Some(suit),
        }
    }

    pub fn joker() -> Self {
        Self {
            rank: None,
            suit: None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Pool {
    size: usize,
    multiples_only: bool,
    /// cards with a pinned rank, per rank
    rank_count: [u8; 15],
    /// naturals per suit and rank
    suited: [[bool; 15]; 4],
    /// ranks of wilds whose suit is free
    suit_free: Vec<u8>,
    /// wilds whose rank is free, per pinned suit
    rank_free: [u8; 4],
    jokers: u8,
}

impl Pool {
    pub fn new(slots: &[Slot], size: usize, multiples_only: bool) -> Self {
        let mut pool = Pool {
            size: size.min(slots.len()),
            multiples_only: multiples_only || slots.len() < size,
            ..Default::default()
        };
        for s in slots {
            match (s.rank, s.suit) {
                (Some(r), Some(suit)) => {
                    pool.rank_count[r as usize] += 1;
                    pool.suited[suit.index()][r as usize] = true;
                }
                (Some(r), None) => {
                    pool.rank_count[r as usize] += 1;
                    pool.suit_free.push(r);
                }
                (None, Some(suit)) => pool.rank_free[suit.index()] += 1,
                (None, None) => pool.jokers += 1,
            }
        }
        pool
    }

    fn free(&self) -> u8 {
        self.jokers + self.rank_free.iter().sum::<u8>()
    }

    fn shapes_allowed(&self) -> bool {
        !self.multiples_only && self.size >= 3
    }

    pub fn best(&self) -> HandResult {
        if self.size == 0 {
            return HandResult::new(HandCategory::HighCard, vec![]);
        }
        let n = self.size;
        if self.shapes_allowed() {
            if let Some(r) = self.straight_flush() {
                return r;
            }
        }
        if n >= 4 {
            if let Some(r) = self.four_of_a_kind() {
                return r;
            }
        }
        if n >= 5 && !self.multiples_only {
            if let Some(r) = self.full_house() {
                return r;
            }
        }
        if n == 3 && !self.multiples_only {
            if let Some(r) = self.three_of_a_kind() {
                return HandResult::new(HandCategory::ThreeCardPokerThreeOfAKind, r.descriptor);
            }
            if let Some(high) = self.straight_high(None) {
                return HandResult::new(HandCategory::ThreeCardPokerStraight, vec![high]);
            }
        }
        if self.shapes_allowed() {
            if let Some(r) = self.flush() {
                return r;
            }
            if let Some(high) = self.straight_high(None) {
                return HandResult::new(HandCategory::Straight, vec![high]);
            }
        }
        if n >= 3 {
            if let Some(r) = self.three_of_a_kind() {
                return r;
            }
        }
        if n >= 4 {
            if let Some(r) = self.two_pair() {
                return r;
            }
        }
        if n >= 2 {
            if let Some(r) = self.pair() {
                return r;
            }
        }
        HandResult::new(HandCategory::HighCard, self.kickers(&[], 0, n))
    }

    /// Highest straight, optionally restricted to one suit. Ace plays high and,
    /// for the wheel, as rank 1.
    fn straight_high(&self, suit: Option<Suit>) -> Option<u8> {
        let n = self.size as u8;
        let free = match suit {
            Some(s) => self.jokers + self.rank_free[s.index()],
            None => self.free(),
        };
        for high in (n..=14).rev() {
            let missing = (high + 1 - n..=high)
                .map(|r| if r == 1 { 14 } else { r })
                .filter(|&r| !self.has_rank_for(r, suit))
                .count() as u8;
            if missing <= free {
                return Some(high);
            }
        }
        None
    }

    fn has_rank_for(&self, rank: u8, suit: Option<Suit>) -> bool {
        match suit {
            Some(s) => self.suited[s.index()][rank as usize] || self.suit_free.contains(&rank),
            None => self.rank_count[rank as usize] > 0,
        }
    }

    fn straight_flush(&self) -> Option<HandResult> {
        let best = Suit::ALL
            .iter()
            .filter_map(|&s| self.straight_high(Some(s)))
            .max()?;
        if best == 14 && self.size == 5 {
            Some(HandResult::new(HandCategory::RoyalFlush, vec![]))
        } else {
            Some(HandResult::new(HandCategory::StraightFlush, vec![best]))
        }
    }

    fn flush(&self) -> Option<HandResult> {
        let n = self.size;
        let mut best: Option<Vec<u8>> = None;
        for s in Suit::ALL {
            let mut ranks: Vec<u8> = (2..=14u8)
                .filter(|&r| self.suited[s.index()][r as usize])
                .chain(self.suit_free.iter().copied())
                .collect();
            let mut free = (self.jokers + self.rank_free[s.index()]) as usize;
            if ranks.len() + free < n {
                continue;
            }
            let mut r = 14u8;
            while free > 0 && r >= 2 {
                if !ranks.contains(&r) {
                    ranks.push(r);
                    free -= 1;
                }
                r -= 1;
            }
            ranks.sort_unstable_by(|a, b| b.cmp(a));
            ranks.truncate(n);
            if best.as_ref().map_or(true, |b| ranks > *b) {
                best = Some(ranks);
            }
        }
        best.map(|d| HandResult::new(HandCategory::Flush, d))
    }

    /// Fixed cards of `rank` to use toward a group of `want`, and the wilds needed.
    fn group_cost(&self, rank: u8, want: u8) -> (u8, u8) {
        let have = self.rank_count[rank as usize].min(want);
        (have, want - have)
    }

    fn four_of_a_kind(&self) -> Option<HandResult> {
        self.single_group(4, HandCategory::FourOfAKind)
    }

    fn three_of_a_kind(&self) -> Option<HandResult> {
        self.single_group(3, HandCategory::ThreeOfAKind)
    }

    fn pair(&self) -> Option<HandResult> {
        self.single_group(2, HandCategory::OnePair)
    }

    fn single_group(&self, want: u8, category: HandCategory) -> Option<HandResult> {
        let free = self.free();
        for r in (2..=14u8).rev() {
            let (have, need) = self.group_cost(r, want);
            if need <= free {
                let mut d = vec![r];
                d.extend(self.kickers(&[(r, have)], need, self.size - want as usize));
                return Some(HandResult::new(category, d));
            }
        }
        None
    }

    fn full_house(&self) -> Option<HandResult> {
        self.double_group(3, HandCategory::FullHouse)
    }

    fn two_pair(&self) -> Option<HandResult> {
        self.double_group(2, HandCategory::TwoPair)
    }

    fn double_group(&self, first: u8, category: HandCategory) -> Option<HandResult> {
        let free = self.free();
        for a in (2..=14u8).rev() {
            let (have_a, need_a) = self.group_cost(a, first);
            if need_a > free {
                continue;
            }
            let b_range: Vec<u8> = if first == 2 {
                (2..a).rev().collect()
            } else {
                (2..=14u8).rev().filter(|&b| b != a).collect()
            };
            for b in b_range {
                let (have_b, need_b) = self.group_cost(b, 2);
                if need_a + need_b <= free {
                    let mut d = vec![a, b];
                    let used = first as usize + 2;
                    let groups = [(a, have_a), (b, have_b)];
                    d.extend(self.kickers(&groups, need_a + need_b, self.size - used));
                    return Some(HandResult::new(category, d));
                }
            }
        }
        None
    }

    /// The best `k` ranks left after removing `used` fixed cards and
    /// `free_used` wilds. Leftover wilds play as aces.
    fn kickers(&self, used: &[(u8, u8)], free_used: u8, k: usize) -> Vec<u8> {
        let mut counts = self.rank_count;
        for &(r, c) in used {
            counts[r as usize] -= c;
        }
        let spare = self.free().saturating_sub(free_used);
        let mut out = vec![14u8; spare as usize];
        for r in (2..=14u8).rev() {
            for _ in 0..counts[r as usize] {
                out.push(r);
            }
        }
        out.truncate(k);
        out
    }
}
