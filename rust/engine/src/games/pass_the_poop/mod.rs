//! Pass the Poop: one card each, lowest card loses a life.
//!
//! Action runs from the seat left of the dealer to the dealer. Each player
//! keeps their card or trades it with the next seat; a King can't be traded
//! away and is flipped to refuse a trade. The dealer may swap with the top of
//! the deck. The last player with lives left takes the antes.

pub mod edition;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::cards::{full_deck, Card, Rank};
use crate::config::{PassThePoopConfig, PoopEdition};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{
    ActionOutcome, GameOverDetails, PayloadIn, Playable, Response, Scheduler, Tickable,
};
use crate::logger::{LogBus, LogMessage, LogReceiver};
use crate::player::PlayerId;

use self::edition::{LifeLoss, RoundSeat, DEAD, FLIPPED};

pub const NAME: &str = "pass-the-poop";

const NEXT_ROUND_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PoopPhase {
    Playing,
    RoundOver,
    GameOver,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PoopStep {
    NextRound,
}

#[derive(Debug, Clone)]
struct PoopParticipant {
    player_id: PlayerId,
    lives: u32,
    card: Option<Card>,
    balance: i64,
    did_win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoopParticipantView {
    pub player_id: PlayerId,
    pub lives: u32,
    pub balance: i64,
    /// Position in the current round, `None` once eliminated.
    pub position: Option<usize>,
    pub is_dealer: bool,
    pub card: Option<Card>,
    pub is_flipped: bool,
    pub did_win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoopSnapshot {
    pub phase: PoopPhase,
    pub edition: PoopEdition,
    pub round: u32,
    pub pot: i64,
    pub current_player: Option<PlayerId>,
    pub pending_trade: bool,
    pub went_to_deck: bool,
    pub participants: Vec<PoopParticipantView>,
    pub actions: Vec<String>,
    pub future_actions: Vec<String>,
}

#[derive(Debug)]
pub struct PassThePoop {
    config: PassThePoopConfig,
    deck: Deck,
    participants: Vec<PoopParticipant>,
    /// Participant indices in acting order; the last one deals.
    seating: Vec<usize>,
    phase: PoopPhase,
    round: u32,
    pot: i64,
    turn: usize,
    /// Position of a player waiting for the next seat to accept a trade.
    pending_trade: Option<usize>,
    went_to_deck: bool,
    round_lives: Vec<u32>,
    damaged: Vec<bool>,
    replay: bool,
    scheduler: Scheduler<PoopStep>,
    log: LogBus,
}

impl PassThePoop {
    pub fn new(
        players: &[PlayerId],
        config: PassThePoopConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        let mut deck = Deck::new();
        let seed = deck.shuffle(seed);
        debug!(seed, "pass the poop deck shuffled");
        Self::with_deck(players, config, deck)
    }

    pub fn with_deck(
        players: &[PlayerId],
        config: PassThePoopConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        config.validate_players(players)?;
        let participants: Vec<PoopParticipant> = players
            .iter()
            .map(|&player_id| PoopParticipant {
                player_id,
                lives: config.lives,
                card: None,
                balance: -config.ante,
                did_win: false,
            })
            .collect();
        let mut game = Self {
            pot: config.ante * participants.len() as i64,
            seating: (0..participants.len()).collect(),
            round_lives: vec![config.lives; participants.len()],
            damaged: vec![false; participants.len()],
            config,
            deck,
            participants,
            phase: PoopPhase::Playing,
            round: 0,
            turn: 0,
            pending_trade: None,
            went_to_deck: false,
            replay: false,
            scheduler: Scheduler::new(),
            log: LogBus::new(),
        };
        game.log
            .send_one(LogMessage::new(format!("Everyone antes ${{{}}}", game.config.ante)));
        game.deal()?;
        Ok(game)
    }

    fn deal(&mut self) -> Result<(), GameError> {
        self.round += 1;
        if self.round > 1 {
            self.deck.shuffle_discards(full_deck());
        }
        for &i in &self.seating {
            let card = self
                .deck
                .draw()
                .map_err(|_| GameError::Resource("deck exhausted while dealing".into()))?;
            self.participants[i].card = Some(card);
        }
        self.round_lives = self.participants.iter().map(|p| p.lives).collect();
        self.damaged.iter_mut().for_each(|d| *d = false);
        self.turn = 0;
        self.pending_trade = None;
        self.went_to_deck = false;
        self.phase = PoopPhase::Playing;
        debug!(round = self.round, players = self.seating.len(), "poop round dealt");
        self.log
            .send_one(LogMessage::new(format!("Round {} dealt", self.round)));
        Ok(())
    }

    fn dealer_position(&self) -> usize {
        self.seating.len().saturating_sub(1)
    }

    fn at(&self, pos: usize) -> &PoopParticipant {
        &self.participants[self.seating[pos]]
    }

    fn at_mut(&mut self, pos: usize) -> &mut PoopParticipant {
        let idx = self.seating[pos];
        &mut self.participants[idx]
    }

    fn holds_king(&self, pos: usize) -> bool {
        self.at(pos).card.is_some_and(|c| c.rank == Rank::King)
    }

    fn position_of(&self, player_id: PlayerId) -> Result<usize, GameError> {
        self.seating
            .iter()
            .position(|&i| self.participants[i].player_id == player_id)
            .ok_or_else(|| GameError::turn("you are not playing this round"))
    }

    fn require_turn(&self, pos: usize) -> Result<(), GameError> {
        if self.phase != PoopPhase::Playing {
            return Err(GameError::turn("round is over"));
        }
        if pos != self.turn {
            return Err(GameError::not_your_turn());
        }
        Ok(())
    }

    fn flip(&mut self, pos: usize) {
        if let Some(card) = self.at_mut(pos).card.as_mut() {
            card.set_bit(FLIPPED);
            card.set_face_up(true);
        }
    }

    fn advance(&mut self, now: Instant) {
        if self.turn >= self.dealer_position() {
            self.end_round(now);
        } else {
            self.turn += 1;
        }
    }

    fn stay(&mut self, pos: usize, now: Instant) -> Result<ActionOutcome, GameError> {
        self.require_turn(pos)?;
        if self.pending_trade.is_some() {
            return Err(GameError::illegal("you must answer the trade first"));
        }
        if self.went_to_deck {
            return Err(GameError::illegal("you must draw from the deck"));
        }
        self.log
            .send_one(LogMessage::new("{} stays").player(self.at(pos).player_id));
        self.advance(now);
        Ok(ActionOutcome::updated())
    }

    fn trade(&mut self, pos: usize) -> Result<ActionOutcome, GameError> {
        self.require_turn(pos)?;
        if self.pending_trade.is_some() {
            return Err(GameError::illegal("you must answer the trade first"));
        }
        if pos == self.dealer_position() {
            return Err(GameError::illegal("the dealer can only trade with the deck"));
        }
        if self.holds_king(pos) {
            return Err(GameError::illegal("you cannot trade a King"));
        }
        let next = pos + 1;
        let trader = self.at(pos).player_id;
        let neighbor = self.at(next).player_id;
        if self.holds_king(next) {
            self.flip(next);
            self.turn = next;
            self.log.send_one(
                LogMessage::new("{} tries to trade but {} has a King")
                    .players(&[trader, neighbor]),
            );
        } else {
            self.pending_trade = Some(pos);
            self.turn = next;
            self.log.send_one(
                LogMessage::new("{} trades with {}").players(&[trader, neighbor]),
            );
        }
        Ok(ActionOutcome::updated())
    }

    fn accept(&mut self, pos: usize) -> Result<ActionOutcome, GameError> {
        if self.phase != PoopPhase::Playing {
            return Err(GameError::turn("round is over"));
        }
        let Some(from) = self.pending_trade.filter(|&from| from + 1 == pos) else {
            return Err(GameError::illegal("there is no trade to accept"));
        };
        if self.holds_king(pos) {
            return Err(GameError::illegal("you must flip your King"));
        }
        let given = self.at(from).card;
        let received = self.at(pos).card;
        self.at_mut(from).card = received;
        self.at_mut(pos).card = given;
        self.pending_trade = None;
        self.turn = pos;
        let trader = self.at(from).player_id;
        let mut messages = vec![
            LogMessage::new("{} accepts the trade from {}")
                .players(&[self.at(pos).player_id, trader]),
        ];
        let ace_back = received.is_some_and(|c| c.rank == Rank::Ace);
        if self.config.edition == PoopEdition::Diarrhea && ace_back {
            let idx = self.seating[from];
            if let Some(card) = self.participants[idx].card.as_mut() {
                card.set_bit(DEAD);
                card.set_face_up(true);
            }
            self.participants[idx].lives = self.participants[idx].lives.saturating_sub(1);
            self.damaged[idx] = true;
            messages.push(
                LogMessage::new("{} is passed back an Ace and loses a life").player(trader),
            );
        }
        self.log.send(messages);
        Ok(ActionOutcome::updated())
    }

    fn flip_king(&mut self, pos: usize, now: Instant) -> Result<ActionOutcome, GameError> {
        if self.phase != PoopPhase::Playing {
            return Err(GameError::turn("round is over"));
        }
        if !self.holds_king(pos) {
            return Err(GameError::illegal("you do not hold a King"));
        }
        let player_id = self.at(pos).player_id;
        match self.pending_trade {
            Some(from) if from + 1 == pos => {
                self.pending_trade = None;
                self.flip(pos);
                self.log
                    .send_one(LogMessage::new("{} flips a King and refuses").player(player_id));
            }
            _ => {
                self.require_turn(pos)?;
                if self.went_to_deck {
                    return Err(GameError::illegal("you must draw from the deck"));
                }
                self.flip(pos);
                self.log
                    .send_one(LogMessage::new("{} flips a King").player(player_id));
                self.advance(now);
            }
        }
        Ok(ActionOutcome::updated())
    }

    fn go_to_deck(&mut self, pos: usize) -> Result<ActionOutcome, GameError> {
        self.require_turn(pos)?;
        if pos != self.dealer_position() {
            return Err(GameError::illegal("only the dealer can go to the deck"));
        }
        if self.went_to_deck {
            return Err(GameError::illegal("you already went to the deck"));
        }
        self.went_to_deck = true;
        self.flip_all_cards();
        self.log
            .send_one(LogMessage::new("{} goes to the deck").player(self.at(pos).player_id));
        Ok(ActionOutcome::updated())
    }

    fn flip_all_cards(&mut self) {
        for &i in &self.seating {
            if let Some(card) = self.participants[i].card.as_mut() {
                card.set_face_up(true);
            }
        }
    }

    fn draw_from_deck(&mut self, pos: usize, now: Instant) -> Result<ActionOutcome, GameError> {
        self.require_turn(pos)?;
        if !self.went_to_deck {
            return Err(GameError::illegal("go to the deck first"));
        }
        let mut card = self
            .deck
            .draw()
            .map_err(|_| GameError::Resource("deck exhausted".into()))?;
        card.set_face_up(true);
        self.at_mut(pos).card = Some(card);
        self.log.send_one(
            LogMessage::new("{} draws from the deck")
                .player(self.at(pos).player_id)
                .cards(&[card]),
        );
        self.end_round(now);
        Ok(ActionOutcome::updated())
    }

    fn end_round(&mut self, now: Instant) {
        self.flip_all_cards();
        self.phase = PoopPhase::RoundOver;
        let seats: Vec<RoundSeat> = self
            .seating
            .iter()
            .enumerate()
            .filter_map(|(pos, &i)| {
                self.participants[i].card.map(|card| RoundSeat {
                    seat: pos,
                    card,
                    damaged: self.damaged[i],
                })
            })
            .collect();
        let mut messages = Vec::new();
        match self.config.edition.end_round(&seats) {
            Ok(groups) => {
                for group in groups {
                    for pos in group.seats {
                        let p = self.at_mut(pos);
                        p.lives = match group.loss {
                            LifeLoss::One => p.lives.saturating_sub(1),
                            LifeLoss::All => 0,
                        };
                        let text = match group.loss {
                            LifeLoss::One => "{} loses a life",
                            LifeLoss::All => "{} loses all their lives",
                        };
                        messages.push(LogMessage::new(text).player(p.player_id));
                    }
                }
                self.replay = !self.seating.iter().any(|&i| self.participants[i].lives > 0);
            }
            Err(err) => {
                debug!(%err, round = self.round, "poop round tied");
                self.replay = true;
            }
        }
        if self.replay {
            for (p, &lives) in self.participants.iter_mut().zip(&self.round_lives) {
                p.lives = lives;
            }
            messages.clear();
            messages.push(LogMessage::new("Mutual destruction! The round is replayed"));
        }
        info!(round = self.round, replay = self.replay, "poop round over");
        self.log.send(messages);
        let survivors = self
            .seating
            .iter()
            .filter(|&&i| self.participants[i].lives > 0)
            .count();
        if survivors <= 1 && !self.replay {
            self.finish();
        } else {
            self.scheduler.schedule_in(PoopStep::NextRound, now, NEXT_ROUND_DELAY);
        }
    }

    fn finish(&mut self) {
        self.phase = PoopPhase::GameOver;
        let Some(winner) = self.participants.iter_mut().find(|p| p.lives > 0) else {
            return;
        };
        winner.balance += self.pot;
        winner.did_win = true;
        let (player_id, pot) = (winner.player_id, self.pot);
        self.pot = 0;
        info!(winner = player_id, pot, "pass the poop won");
        self.log.send_one(
            LogMessage::new(format!("{{}} is the last one standing and wins ${{{pot}}}"))
                .player(player_id),
        );
    }

    fn next_round(&mut self) -> Result<(), GameError> {
        if !self.replay {
            self.seating.rotate_left(1);
            let participants = &self.participants;
            self.seating.retain(|&i| participants[i].lives > 0);
        }
        self.replay = false;
        for p in &mut self.participants {
            p.card = None;
        }
        self.deal()
    }

    pub fn phase(&self) -> PoopPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn pot(&self) -> i64 {
        self.pot
    }

    pub fn lives(&self, player_id: PlayerId) -> Option<u32> {
        self.participants
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.lives)
    }

    pub fn card_of(&self, player_id: PlayerId) -> Option<Card> {
        self.participants
            .iter()
            .find(|p| p.player_id == player_id)
            .and_then(|p| p.card)
    }

    /// Players in acting order; the last one is the dealer.
    pub fn seating(&self) -> Vec<PlayerId> {
        self.seating
            .iter()
            .map(|&i| self.participants[i].player_id)
            .collect()
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        (self.phase == PoopPhase::Playing).then(|| self.at(self.turn).player_id)
    }

    fn actions_for(&self, pos: usize, pending: bool) -> Vec<String> {
        let names: &[&str] = if pending {
            if self.holds_king(pos) {
                &["flipKing"]
            } else {
                &["accept"]
            }
        } else if pos == self.dealer_position() {
            if self.went_to_deck {
                &["drawFromDeck"]
            } else {
                &["stay", "goToDeck"]
            }
        } else if self.holds_king(pos) {
            &["stay", "flipKing"]
        } else {
            &["stay", "trade"]
        };
        names.iter().map(|s| s.to_string()).collect()
    }

    pub fn snapshot(&self, viewer: PlayerId) -> PoopSnapshot {
        let playing = self.phase == PoopPhase::Playing;
        let participants = self
            .participants
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let position = self.seating.iter().position(|&s| s == i);
                let visible = p.player_id == viewer
                    || !playing
                    || p.card.is_some_and(|c| c.is_face_up());
                PoopParticipantView {
                    player_id: p.player_id,
                    lives: p.lives,
                    balance: p.balance,
                    is_dealer: position == Some(self.dealer_position()),
                    position,
                    card: p.card.filter(|_| visible),
                    is_flipped: p.card.is_some_and(|c| c.has_bit(FLIPPED)),
                    did_win: p.did_win,
                }
            })
            .collect();
        let viewer_pos = self.position_of(viewer).ok();
        let (actions, future_actions) = match viewer_pos {
            Some(pos) if playing => {
                let pending = self.pending_trade.is_some_and(|from| from + 1 == pos);
                let now = if pos == self.turn {
                    self.actions_for(pos, pending)
                } else {
                    Vec::new()
                };
                (now, self.actions_for(pos, false))
            }
            _ => (Vec::new(), Vec::new()),
        };
        PoopSnapshot {
            phase: self.phase,
            edition: self.config.edition,
            round: self.round,
            pot: self.pot,
            current_player: self.current_player(),
            pending_trade: self.pending_trade.is_some(),
            went_to_deck: self.went_to_deck,
            participants,
            actions,
            future_actions,
        }
    }
}

impl Playable for PassThePoop {
    fn name(&self) -> &'static str {
        NAME
    }

    fn action(
        &mut self,
        player_id: PlayerId,
        payload: &PayloadIn,
    ) -> Result<ActionOutcome, GameError> {
        let now = Instant::now();
        let pos = self.position_of(player_id)?;
        match payload.action.as_str() {
            "stay" => self.stay(pos, now),
            "trade" => self.trade(pos),
            "accept" => self.accept(pos),
            "flipKing" => self.flip_king(pos, now),
            "goToDeck" => self.go_to_deck(pos),
            "drawFromDeck" => self.draw_from_deck(pos, now),
            other => Err(GameError::payload(format!("unknown action {other:?}"))),
        }
    }

    fn player_state(&self, player_id: PlayerId) -> Response {
        Response::game(NAME, &self.snapshot(player_id))
    }

    fn end_of_game_details(&self) -> Option<GameOverDetails> {
        if self.phase != PoopPhase::GameOver {
            return None;
        }
        let balance_adjustments: BTreeMap<PlayerId, i64> =
            self.participants.iter().map(|p| (p.player_id, p.balance)).collect();
        Some(GameOverDetails {
            balance_adjustments,
            log: serde_json::to_value(self.snapshot(0)).unwrap_or_default(),
        })
    }

    fn log_chan(&mut self) -> Option<LogReceiver> {
        self.log.take_receiver()
    }
}

impl Tickable for PassThePoop {
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError> {
        if self.phase == PoopPhase::GameOver {
            return Ok(false);
        }
        let Some(step) = self.scheduler.due(now) else {
            return Ok(false);
        };
        match step {
            PoopStep::NextRound => self.next_round()?,
        }
        Ok(true)
    }
}
