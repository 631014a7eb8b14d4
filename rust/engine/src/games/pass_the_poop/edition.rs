use std::collections::BTreeMap;

use crate::cards::{Card, Rank, GAME_BIT_BASE};
use crate::config::PoopEdition;
use crate::errors::GameError;

/// King turned face up to refuse a trade.
pub const FLIPPED: u32 = GAME_BIT_BASE;
/// Card killed by an ace passed back (Diarrhea).
pub const DEAD: u32 = GAME_BIT_BASE << 1;

/// Aces are the lowest card in this game.
pub fn poop_rank(card: &Card) -> u8 {
    if card.rank == Rank::Ace {
        0
    } else {
        card.rank.value()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifeLoss {
    One,
    All,
}

/// Seats that lose lives at the end of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoserGroup {
    pub seats: Vec<usize>,
    pub loss: LifeLoss,
}

/// What the edition sees of one live seat at round end.
#[derive(Debug, Clone, Copy)]
pub struct RoundSeat {
    pub seat: usize,
    pub card: Card,
    /// Already lost a life this round.
    pub damaged: bool,
}

impl PoopEdition {
    /// Decides who loses at the end of a round. `MutualDestruction` means the
    /// round must be replayed.
    pub fn end_round(self, seats: &[RoundSeat]) -> Result<Vec<LoserGroup>, GameError> {
        match self {
            PoopEdition::Standard => standard(seats),
            PoopEdition::Diarrhea => diarrhea(seats),
            PoopEdition::Pairs => pairs(seats),
        }
    }
}

fn lowest(seats: &[RoundSeat]) -> Vec<usize> {
    let Some(min) = seats.iter().map(|s| poop_rank(&s.card)).min() else {
        return Vec::new();
    };
    seats
        .iter()
        .filter(|s| poop_rank(&s.card) == min)
        .map(|s| s.seat)
        .collect()
}

fn standard(seats: &[RoundSeat]) -> Result<Vec<LoserGroup>, GameError> {
    let low = lowest(seats);
    if low.len() == seats.len() {
        return Err(GameError::MutualDestruction);
    }
    Ok(vec![LoserGroup {
        seats: low,
        loss: LifeLoss::One,
    }])
}

fn diarrhea(seats: &[RoundSeat]) -> Result<Vec<LoserGroup>, GameError> {
    let damaged = seats.iter().any(|s| s.damaged);
    let mut remaining: Vec<RoundSeat> = seats
        .iter()
        .filter(|s| !s.card.has_bit(DEAD))
        .copied()
        .collect();
    let mut groups = Vec::new();
    for _ in 0..52 {
        if remaining.len() <= 1 {
            break;
        }
        let low = lowest(&remaining);
        if low.len() == 1 {
            groups.push(LoserGroup {
                seats: low,
                loss: LifeLoss::One,
            });
            break;
        }
        if low.len() == remaining.len() {
            break;
        }
        remaining.retain(|s| !low.contains(&s.seat));
        groups.push(LoserGroup {
            seats: low,
            loss: LifeLoss::All,
        });
    }
    if groups.is_empty() && !damaged {
        return Err(GameError::MutualDestruction);
    }
    Ok(groups)
}

fn pairs(seats: &[RoundSeat]) -> Result<Vec<LoserGroup>, GameError> {
    let mut by_rank: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for s in seats {
        by_rank.entry(poop_rank(&s.card)).or_default().push(s.seat);
    }
    if by_rank.len() <= 1 {
        return Err(GameError::MutualDestruction);
    }
    // ascending rank, so the last maximum is the highest-ranked largest group
    let largest = by_rank.values().map(Vec::len).max().unwrap_or(0);
    let safe_rank = by_rank
        .iter()
        .filter(|(_, v)| v.len() == largest)
        .map(|(r, _)| *r)
        .next_back()
        .unwrap_or(0);
    if largest >= 3 {
        let losers: Vec<usize> = by_rank
            .iter()
            .filter(|(r, _)| **r != safe_rank)
            .flat_map(|(_, v)| v.iter().copied())
            .collect();
        return Ok(vec![LoserGroup {
            seats: losers,
            loss: LifeLoss::All,
        }]);
    }
    let smallest = by_rank.values().map(Vec::len).min().unwrap_or(0);
    let losers = by_rank
        .iter()
        .find(|(r, v)| v.len() == smallest && **r != safe_rank)
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    Ok(vec![LoserGroup {
        seats: losers,
        loss: LifeLoss::One,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(cards: &str) -> Vec<RoundSeat> {
        cards
            .split(',')
            .enumerate()
            .map(|(seat, c)| RoundSeat {
                seat,
                card: c.parse().unwrap(),
                damaged: false,
            })
            .collect()
    }

    #[test]
    fn standard_ace_is_lowest() {
        let g = PoopEdition::Standard.end_round(&seats("2c,14d,9h")).unwrap();
        assert_eq!(g[0].seats, vec![1]);
    }

    #[test]
    fn standard_all_tied_is_mutual_destruction() {
        assert_eq!(
            PoopEdition::Standard.end_round(&seats("5c,5d,5h")),
            Err(GameError::MutualDestruction)
        );
    }

    #[test]
    fn diarrhea_peels_tied_lowest() {
        let g = PoopEdition::Diarrhea.end_round(&seats("3c,3d,9h,7s")).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g[0].seats, vec![0, 1]);
        assert_eq!(g[0].loss, LifeLoss::All);
        assert_eq!(g[1].seats, vec![3]);
        assert_eq!(g[1].loss, LifeLoss::One);
    }

    #[test]
    fn diarrhea_dead_card_counts_as_damage() {
        let mut s = seats("4c,4d,9h");
        s[2].card.set_bit(DEAD);
        s[2].damaged = true;
        assert_eq!(PoopEdition::Diarrhea.end_round(&s), Ok(vec![]));
        s[2].damaged = false;
        assert_eq!(PoopEdition::Diarrhea.end_round(&s), Err(GameError::MutualDestruction));
    }

    #[test]
    fn pairs_trips_wipe_everyone_else() {
        let g = PoopEdition::Pairs.end_round(&seats("6c,6d,6h,13s,2c")).unwrap();
        assert_eq!(g[0].seats, vec![4, 3]);
        assert_eq!(g[0].loss, LifeLoss::All);
    }

    #[test]
    fn pairs_lowest_single_loses() {
        let g = PoopEdition::Pairs.end_round(&seats("6c,6d,9h,3s")).unwrap();
        assert_eq!(g[0].seats, vec![3]);
        assert_eq!(g[0].loss, LifeLoss::One);
    }
}
