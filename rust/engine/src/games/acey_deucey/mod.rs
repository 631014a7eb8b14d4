//! Acey-Deucey (in-between).
//!
//! Players take turns. On a turn the dealer shows two outer cards and the
//! player bets up to the pot that a third card lands strictly between them.
//! Hitting either outer rank (a post) costs double. The game ends when the
//! pot is empty.

mod round;

pub use round::{
    card_value, half_pot, Bet, LastCardOutcome, MiddleOutcome, Round, SingleGame, SingleGameState,
    ACE_HIGH, ACE_LOW,
};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::cards::{full_deck, Card, Rank};
use crate::config::{AceyDeuceyConfig, AceyDeuceyGameType};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{
    ActionOutcome, GameOverDetails, PayloadIn, Playable, Response, Scheduler, Tickable,
};
use crate::logger::{LogBus, LogMessage, LogReceiver};
use crate::player::PlayerId;

pub const NAME: &str = "acey-deucey";

const DEAL_DELAY: Duration = Duration::from_secs(1);
const ROUND_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DealerStep {
    DealFirst,
    DealLast,
    DealMiddle,
    NextGame,
    NextRound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AceyParticipant {
    pub player_id: PlayerId,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AceyDeuceySnapshot {
    pub pot: i64,
    pub ante: i64,
    pub game_type: AceyDeuceyGameType,
    pub allow_pass: bool,
    pub round_number: u32,
    pub current_player: PlayerId,
    pub round: Round,
    pub participants: Vec<AceyParticipant>,
    pub cards_left: usize,
    pub is_game_over: bool,
    pub actions: Vec<String>,
    pub future_actions: Vec<String>,
}

#[derive(Debug)]
pub struct AceyDeucey {
    config: AceyDeuceyConfig,
    deck: Deck,
    participants: Vec<AceyParticipant>,
    pot: i64,
    round: Round,
    round_number: u32,
    is_game_over: bool,
    scheduler: Scheduler<DealerStep>,
    log: LogBus,
}

impl AceyDeucey {
    pub fn new(
        players: &[PlayerId],
        config: AceyDeuceyConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        let mut deck = Deck::new();
        let seed = deck.shuffle(seed);
        debug!(seed, "acey-deucey deck shuffled");
        Self::with_deck(players, config, deck)
    }

    pub fn with_deck(
        players: &[PlayerId],
        config: AceyDeuceyConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        config.validate_players(players)?;
        let participants: Vec<AceyParticipant> = players
            .iter()
            .map(|&player_id| AceyParticipant {
                player_id,
                balance: -config.ante,
            })
            .collect();
        let pot = config.ante * participants.len() as i64;
        let mut game = Self {
            config,
            deck,
            participants,
            pot,
            round: Round::new(0),
            round_number: 1,
            is_game_over: false,
            scheduler: Scheduler::new(),
            log: LogBus::new(),
        };
        game.log.send_one(LogMessage::new(format!(
            "Everyone antes ${{{}}}, pot is ${{{}}}",
            game.config.ante, game.pot
        )));
        game.scheduler
            .schedule_in(DealerStep::DealFirst, Instant::now(), DEAL_DELAY);
        Ok(game)
    }

    fn current_player(&self) -> PlayerId {
        self.participants[self.round.seat].player_id
    }

    fn require_turn(&self, player_id: PlayerId) -> Result<(), GameError> {
        if self.is_game_over {
            return Err(GameError::turn("game is over"));
        }
        if self.current_player() != player_id {
            return Err(GameError::not_your_turn());
        }
        Ok(())
    }

    /// Next card, rebuilding the deck without the cards on the table when it
    /// runs dry.
    fn draw(&mut self) -> Result<Card, GameError> {
        if !self.deck.can_draw(1) {
            let in_play = self.round.in_play();
            let fresh: Vec<Card> = full_deck()
                .into_iter()
                .filter(|c| !in_play.contains(c))
                .collect();
            debug!(cards = fresh.len(), "acey-deucey deck reshuffled");
            self.deck.shuffle_discards(fresh);
            self.log.send_one(LogMessage::new("The deck is reshuffled"));
        }
        self.deck.draw()
    }

    fn deal_first(&mut self, now: Instant) -> Result<(), GameError> {
        let card = match self.round.game().first_card {
            Some(c) => c,
            None => {
                let c = self.draw()?;
                self.round.game_mut().first_card = Some(c);
                c
            }
        };
        let player = self.current_player();
        self.log
            .send_one(LogMessage::new("First card for {}").player(player).cards(&[card]));
        if card.rank == Rank::Ace {
            self.round.game_mut().state = SingleGameState::PendingAceDecision;
        } else {
            self.round.game_mut().state = SingleGameState::FirstCardDealt;
            self.scheduler.schedule_in(DealerStep::DealLast, now, DEAL_DELAY);
        }
        Ok(())
    }

    fn set_ace(&mut self, player_id: PlayerId, high: bool, now: Instant) -> Result<(), GameError> {
        self.require_turn(player_id)?;
        let game = self.round.game_mut();
        if game.state != SingleGameState::PendingAceDecision {
            return Err(GameError::illegal("there is no ace to decide"));
        }
        if let Some(card) = game.first_card.as_mut() {
            card.set_bit(if high { ACE_HIGH } else { ACE_LOW });
        }
        game.state = SingleGameState::FirstCardDealt;
        self.log.send_one(
            LogMessage::new(format!("{{}} plays the ace {}", if high { "high" } else { "low" }))
                .player(player_id),
        );
        self.scheduler.schedule_in(DealerStep::DealLast, now, DEAL_DELAY);
        Ok(())
    }

    fn deal_last(&mut self, now: Instant) -> Result<(), GameError> {
        if self.round.game().needs_ace_decision() {
            return Err(GameError::turn("ace has not been decided"));
        }
        let card = self.draw()?;
        self.round.game_mut().last_card = Some(card);
        let player = self.current_player();
        match self.round.game().classify_last() {
            Some(LastCardOutcome::Double) => {
                self.round.game_mut().last_card = None;
                self.round.games.push(SingleGame::starting_with(card));
                self.log.send_one(
                    LogMessage::new("Double game for {}").player(player).cards(&[card]),
                );
                self.scheduler.schedule_in(DealerStep::DealLast, now, DEAL_DELAY);
            }
            Some(LastCardOutcome::Free) if self.config.game_type == AceyDeuceyGameType::Chaos => {
                self.round.game_mut().last_card = None;
                self.log.send_one(LogMessage::new("Free card, dealing again").cards(&[card]));
                self.scheduler.schedule_in(DealerStep::DealLast, now, DEAL_DELAY);
            }
            Some(LastCardOutcome::Free) => {
                self.log
                    .send_one(LogMessage::new("Free game for {}").player(player).cards(&[card]));
                self.finalize_game(now);
            }
            _ => {
                self.round.game_mut().state = SingleGameState::PendingBet;
                self.log
                    .send_one(LogMessage::new("Last card for {}").player(player).cards(&[card]));
            }
        }
        Ok(())
    }

    fn place_bet(
        &mut self,
        player_id: PlayerId,
        amount: i64,
        half_pot: bool,
        now: Instant,
    ) -> Result<(), GameError> {
        self.require_turn(player_id)?;
        let pot = self.pot;
        let game = self.round.game_mut();
        if game.state != SingleGameState::PendingBet {
            return Err(GameError::illegal("not waiting for a bet"));
        }
        if half_pot && !game.half_pot_allowed() {
            return Err(GameError::illegal("half pot is only offered on a gap of two"));
        }
        if !(0..=pot).contains(&amount) {
            return Err(GameError::illegal(format!("bet must be between 0 and the pot of {pot}")));
        }
        // a half-pot bet stakes the half pot it can win
        let amount = if half_pot { round::half_pot(pot) } else { amount };
        game.bet = Some(Bet { amount, half_pot });
        game.state = SingleGameState::BetPlaced;
        let message = if half_pot {
            LogMessage::new("{} bets half the pot")
        } else if amount == 0 {
            LogMessage::new("{} passes")
        } else {
            LogMessage::new(format!("{{}} bets ${{{amount}}}"))
        };
        self.log.send_one(message.player(player_id));
        self.scheduler.schedule_in(DealerStep::DealMiddle, now, DEAL_DELAY);
        Ok(())
    }

    fn deal_middle(&mut self, now: Instant) -> Result<(), GameError> {
        let card = self.draw()?;
        let pot = self.pot;
        let game = self.round.game_mut();
        game.middle_card = Some(card);
        game.adjustment = game.settle(pot);
        let outcome = game.classify_middle();
        let adjustment = game.adjustment;
        let player = self.current_player();
        let text = match outcome {
            Some(MiddleOutcome::Post) => format!("{{}} hits the post and pays ${{{adjustment}}}"),
            Some(MiddleOutcome::Between) => format!("{{}} wins ${{{}}}", -adjustment),
            _ if adjustment == 0 => "{} neither wins nor loses".to_string(),
            _ => format!("{{}} misses and pays ${{{adjustment}}}"),
        };
        self.log.send_one(LogMessage::new(text).player(player).cards(&[card]));
        self.finalize_game(now);
        Ok(())
    }

    fn finalize_game(&mut self, now: Instant) {
        let adjustment = self.round.game().adjustment;
        self.pot += adjustment;
        let seat = self.round.seat;
        self.participants[seat].balance -= adjustment;
        if self.pot <= 0 {
            self.round.game_mut().state = SingleGameState::RoundOver;
            self.is_game_over = true;
            let player_id = self.participants[seat].player_id;
            info!(winner = player_id, "acey-deucey pot emptied");
            self.log
                .send_one(LogMessage::new("{} empties the pot").player(player_id));
            return;
        }
        if self.round.has_next() {
            self.round.game_mut().state = SingleGameState::GameOver;
            self.scheduler.schedule_in(DealerStep::NextGame, now, DEAL_DELAY);
        } else {
            self.round.game_mut().state = SingleGameState::RoundOver;
            self.scheduler.schedule_in(DealerStep::NextRound, now, ROUND_DELAY);
        }
        debug!(pot = self.pot, adjustment, "acey-deucey game settled");
    }

    fn next_game(&mut self, now: Instant) -> Result<(), GameError> {
        self.round.current += 1;
        self.deal_first(now)
    }

    fn next_round(&mut self, now: Instant) -> Result<(), GameError> {
        let seat = (self.round.seat + 1) % self.participants.len();
        self.round = Round::new(seat);
        self.round_number += 1;
        if self.config.game_type == AceyDeuceyGameType::Standard {
            self.deck.shuffle_discards(full_deck());
        }
        self.deal_first(now)
    }

    pub fn pot(&self) -> i64 {
        self.pot
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn balance(&self, player_id: PlayerId) -> Option<i64> {
        self.participants
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.balance)
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    fn actions_for(&self, viewer: PlayerId) -> Vec<String> {
        if self.is_game_over || viewer != self.current_player() {
            return Vec::new();
        }
        let game = self.round.game();
        match game.state {
            SingleGameState::PendingAceDecision => vec!["setAce".into()],
            SingleGameState::PendingBet => {
                let mut v = vec!["bet".to_string()];
                if game.half_pot_allowed() {
                    v.push("betHalfPot".into());
                }
                if self.config.allow_pass {
                    v.push("pass".into());
                }
                v
            }
            _ => Vec::new(),
        }
    }

    pub fn snapshot(&self, viewer: PlayerId) -> AceyDeuceySnapshot {
        let mut future_actions = vec!["setAce".to_string(), "bet".to_string()];
        if self.config.allow_pass {
            future_actions.push("pass".into());
        }
        if self.is_game_over {
            future_actions.clear();
        }
        AceyDeuceySnapshot {
            pot: self.pot,
            ante: self.config.ante,
            game_type: self.config.game_type,
            allow_pass: self.config.allow_pass,
            round_number: self.round_number,
            current_player: self.current_player(),
            round: self.round.clone(),
            participants: self.participants.clone(),
            cards_left: self.deck.cards_left(),
            is_game_over: self.is_game_over,
            actions: self.actions_for(viewer),
            future_actions,
        }
    }
}

impl Playable for AceyDeucey {
    fn name(&self) -> &'static str {
        NAME
    }

    fn action(
        &mut self,
        player_id: PlayerId,
        payload: &PayloadIn,
    ) -> Result<ActionOutcome, GameError> {
        let now = Instant::now();
        match payload.action.as_str() {
            "setAce" => {
                let high = payload.bool_field("aceHigh")?;
                self.set_ace(player_id, high, now)?;
            }
            "bet" => {
                let half = payload.opt_bool("halfPot")?.unwrap_or(false);
                let amount = if half { 0 } else { payload.amount()? };
                self.place_bet(player_id, amount, half, now)?;
            }
            "betHalfPot" => self.place_bet(player_id, 0, true, now)?,
            "pass" if self.config.allow_pass => self.place_bet(player_id, 0, false, now)?,
            other => return Err(GameError::payload(format!("unknown action {other:?}"))),
        }
        Ok(ActionOutcome::updated())
    }

    fn player_state(&self, player_id: PlayerId) -> Response {
        Response::game(NAME, &self.snapshot(player_id))
    }

    fn end_of_game_details(&self) -> Option<GameOverDetails> {
        if !self.is_game_over {
            return None;
        }
        Some(GameOverDetails {
            balance_adjustments: self
                .participants
                .iter()
                .map(|p| (p.player_id, p.balance))
                .collect::<BTreeMap<_, _>>(),
            log: serde_json::to_value(self.snapshot(0)).unwrap_or_default(),
        })
    }

    fn log_chan(&mut self) -> Option<LogReceiver> {
        self.log.take_receiver()
    }
}

impl Tickable for AceyDeucey {
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError> {
        if self.is_game_over {
            return Ok(false);
        }
        let Some(step) = self.scheduler.due(now) else {
            return Ok(false);
        };
        debug!(?step, "acey-deucey dealer step");
        match step {
            DealerStep::DealFirst => self.deal_first(now)?,
            DealerStep::DealLast => self.deal_last(now)?,
            DealerStep::DealMiddle => self.deal_middle(now)?,
            DealerStep::NextGame => self.next_game(now)?,
            DealerStep::NextRound => self.next_round(now)?,
        }
        Ok(true)
    }
}
