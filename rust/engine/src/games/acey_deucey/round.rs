use serde::Serialize;

use crate::cards::{Card, Rank, GAME_BIT_BASE};

/// First card is an ace the player declared low.
pub const ACE_LOW: u32 = GAME_BIT_BASE;
/// First card is an ace the player declared high.
pub const ACE_HIGH: u32 = GAME_BIT_BASE << 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SingleGameState {
    Start,
    PendingAceDecision,
    FirstCardDealt,
    PendingBet,
    BetPlaced,
    GameOver,
    RoundOver,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub amount: i64,
    pub half_pot: bool,
}

/// Value used for the between test: an ace declared low counts as 1.
pub fn card_value(card: &Card) -> u8 {
    if card.rank == Rank::Ace && card.has_bit(ACE_LOW) {
        1
    } else {
        card.rank.value()
    }
}

/// Half the pot, rounded down to a multiple of 25.
pub fn half_pot(pot: i64) -> i64 {
    let half = pot / 2;
    half - half % 25
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LastCardOutcome {
    /// Same rank as the first card: the last card starts another game.
    Double,
    /// Adjacent ranks: nothing can land between.
    Free,
    /// Wait for a bet.
    Bet,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MiddleOutcome {
    Post,
    Between,
    Outside,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleGame {
    pub first_card: Option<Card>,
    pub last_card: Option<Card>,
    pub middle_card: Option<Card>,
    pub bet: Option<Bet>,
    /// Signed change to the pot: positive when the player pays in.
    pub adjustment: i64,
    pub state: SingleGameState,
}

impl SingleGame {
    pub fn new() -> Self {
        Self {
            first_card: None,
            last_card: None,
            middle_card: None,
            bet: None,
            adjustment: 0,
            state: SingleGameState::Start,
        }
    }

    pub fn starting_with(first: Card) -> Self {
        Self {
            first_card: Some(first),
            ..Self::new()
        }
    }

    pub fn needs_ace_decision(&self) -> bool {
        self.first_card.is_some_and(|c| {
            c.rank == Rank::Ace && !c.has_bit(ACE_LOW) && !c.has_bit(ACE_HIGH)
        })
    }

    /// Distance between the outer cards, honoring a low ace.
    pub fn gap(&self) -> Option<u8> {
        let first = card_value(self.first_card.as_ref()?);
        let last = card_value(self.last_card.as_ref()?);
        Some(first.abs_diff(last))
    }

    pub fn classify_last(&self) -> Option<LastCardOutcome> {
        let first = self.first_card?;
        let last = self.last_card?;
        Some(if first.rank == last.rank {
            LastCardOutcome::Double
        } else if self.gap() == Some(1) {
            LastCardOutcome::Free
        } else {
            LastCardOutcome::Bet
        })
    }

    pub fn half_pot_allowed(&self) -> bool {
        self.gap() == Some(2)
    }

    pub fn classify_middle(&self) -> Option<MiddleOutcome> {
        let first = self.first_card?;
        let last = self.last_card?;
        let middle = self.middle_card?;
        if middle.rank == first.rank || middle.rank == last.rank {
            return Some(MiddleOutcome::Post);
        }
        let a = card_value(&first);
        let b = card_value(&last);
        let (low, high) = (a.min(b), a.max(b));
        let m = middle.rank.value();
        Some(if low < m && m < high {
            MiddleOutcome::Between
        } else {
            MiddleOutcome::Outside
        })
    }

    /// Pot adjustment once the middle card is known.
    pub fn settle(&self, pot: i64) -> i64 {
        let Some(bet) = self.bet else {
            return 0;
        };
        match self.classify_middle() {
            Some(MiddleOutcome::Post) => 2 * bet.amount,
            Some(MiddleOutcome::Between) if bet.half_pot => -half_pot(pot),
            Some(MiddleOutcome::Between) => -bet.amount,
            Some(MiddleOutcome::Outside) => bet.amount,
            None => 0,
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        [self.first_card, self.last_card, self.middle_card]
            .into_iter()
            .flatten()
    }
}

impl Default for SingleGame {
    fn default() -> Self {
        Self::new()
    }
}

/// One player's turn: a game plus any double games it spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub seat: usize,
    pub games: Vec<SingleGame>,
    pub current: usize,
}

impl Round {
    pub fn new(seat: usize) -> Self {
        Self {
            seat,
            games: vec![SingleGame::new()],
            current: 0,
        }
    }

    pub fn game(&self) -> &SingleGame {
        &self.games[self.current]
    }

    pub fn game_mut(&mut self) -> &mut SingleGame {
        &mut self.games[self.current]
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.games.len()
    }

    pub fn in_play(&self) -> Vec<Card> {
        self.games.iter().flat_map(|g| g.cards()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Suit;

    fn game(first: &str, last: &str) -> SingleGame {
        SingleGame {
            first_card: Some(first.parse().unwrap()),
            last_card: Some(last.parse().unwrap()),
            ..SingleGame::new()
        }
    }

    #[test]
    fn classifies_last_card() {
        assert_eq!(game("5c", "5h").classify_last(), Some(LastCardOutcome::Double));
        assert_eq!(game("5c", "6h").classify_last(), Some(LastCardOutcome::Free));
        assert_eq!(game("5c", "9h").classify_last(), Some(LastCardOutcome::Bet));
    }

    #[test]
    fn low_ace_changes_the_gap() {
        let mut first = Card::new(Rank::Ace, Suit::Clubs);
        first.set_bit(ACE_LOW);
        let g = SingleGame {
            first_card: Some(first),
            last_card: Some("2d".parse().unwrap()),
            ..SingleGame::new()
        };
        assert_eq!(g.classify_last(), Some(LastCardOutcome::Free));
    }

    #[test]
    fn post_costs_double() {
        let mut g = game("4c", "10d");
        g.bet = Some(Bet {
            amount: 100,
            half_pot: false,
        });
        g.middle_card = Some("10s".parse().unwrap());
        assert_eq!(g.settle(1000), 200);
        g.middle_card = Some("7s".parse().unwrap());
        assert_eq!(g.settle(1000), -100);
        g.middle_card = Some("12s".parse().unwrap());
        assert_eq!(g.settle(1000), 100);
    }

    #[test]
    fn half_pot_rounds_to_units() {
        assert_eq!(half_pot(1000), 500);
        assert_eq!(half_pot(1090), 525);
    }
}
