//! Little L: a three-card game with a trade-in and a hidden board.
//!
//! Each player is dealt a private hand and may trade some of it in, then
//! three face-down community cards are turned one per betting stage. The
//! best three-card hand from private plus community cards wins. Betting is
//! pot-limit with the ante as the minimum bet.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzer::{HandAnalyzer, HandResult};
use crate::cards::Card;
use crate::config::LittleLConfig;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{
    ActionOutcome, GameOverDetails, PayloadIn, Playable, Response, Scheduler, Tickable,
};
use crate::logger::{LogBus, LogMessage, LogReceiver};
use crate::player::{Participant, PlayerAction, PlayerId};
use crate::pot::{Pot, PotManager};
use crate::rules::{apply_action, ValidatedAction, WagerLimits};

pub const NAME: &str = "little-l";

const COMMUNITY_CARDS: usize = 3;
const STEP_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LittleLState {
    Start,
    Trade,
    FirstBetting,
    SecondBetting,
    ThirdBetting,
    Showdown,
    End,
}

impl LittleLState {
    pub fn is_betting(self) -> bool {
        matches!(
            self,
            LittleLState::FirstBetting | LittleLState::SecondBetting | LittleLState::ThirdBetting
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LittleLStep {
    Deal,
    Reveal,
    Showdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LittleLParticipantView {
    pub player_id: PlayerId,
    pub balance: i64,
    pub stack: i64,
    pub amount_in_play: i64,
    pub did_fold: bool,
    pub is_all_in: bool,
    pub did_win: bool,
    pub has_traded: bool,
    pub cards: Vec<Option<Card>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LittleLSnapshot {
    pub state: LittleLState,
    pub initial_deal: usize,
    /// Trade sizes players may choose from.
    pub trade_ins: Vec<usize>,
    pub community: Vec<Option<Card>>,
    pub pot: i64,
    pub pots: Vec<Pot>,
    pub action_amount: i64,
    pub current_player: Option<PlayerId>,
    pub participants: Vec<LittleLParticipantView>,
    pub actions: Vec<String>,
    pub future_actions: Vec<String>,
}

#[derive(Debug)]
pub struct LittleL {
    config: LittleLConfig,
    deck: Deck,
    participants: Vec<Participant>,
    traded: Vec<bool>,
    discards: Vec<Card>,
    community: Vec<Card>,
    revealed: usize,
    pm: PotManager,
    state: LittleLState,
    analyzer: HandAnalyzer,
    scheduler: Scheduler<LittleLStep>,
    log: LogBus,
}

impl LittleL {
    pub fn new(players: &[PlayerId], config: LittleLConfig, seed: u64) -> Result<Self, GameError> {
        let mut deck = Deck::new();
        let seed = deck.shuffle(seed);
        debug!(seed, "little l deck shuffled");
        Self::with_deck(players, config, deck)
    }

    pub fn with_deck(
        players: &[PlayerId],
        config: LittleLConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        config.validate_players(players)?;
        let mut pm = PotManager::new(config.ante);
        for &player_id in players {
            pm.seat_participant(player_id, config.buy_in)?;
        }
        pm.finish_seating_participants();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(LittleLStep::Deal, Instant::now());
        let mut log = LogBus::new();
        log.send_one(LogMessage::new(format!("Everyone antes ${{{}}}", config.ante)));
        Ok(Self {
            participants: players.iter().map(|&id| Participant::new(id)).collect(),
            traded: vec![false; players.len()],
            config,
            deck,
            discards: Vec::new(),
            community: Vec::new(),
            revealed: 0,
            pm,
            state: LittleLState::Start,
            analyzer: HandAnalyzer::new(3),
            scheduler,
            log,
        })
    }

    /// Draws a card, reshuffling the traded-in cards when the deck runs dry.
    fn draw(&mut self) -> Result<Card, GameError> {
        if !self.deck.can_draw(1) && !self.discards.is_empty() {
            let discards = std::mem::take(&mut self.discards);
            debug!(cards = discards.len(), "little l discards reshuffled");
            self.deck.shuffle_discards(discards);
        }
        self.deck
            .draw()
            .map_err(|_| GameError::Resource("deck exhausted".into()))
    }

    fn deal(&mut self) -> Result<(), GameError> {
        for _ in 0..self.config.initial_deal {
            for seat in 0..self.participants.len() {
                let card = self.draw()?;
                self.participants[seat].hand.add_card(card);
            }
        }
        self.state = LittleLState::Trade;
        self.log
            .send_one(LogMessage::new(format!("Dealt {} cards each", self.config.initial_deal)));
        Ok(())
    }

    fn trade(&mut self, seat: usize, indices: Vec<usize>, now: Instant) -> Result<(), GameError> {
        if self.state != LittleLState::Trade {
            return Err(GameError::turn("not in the trade round"));
        }
        if self.traded[seat] {
            return Err(GameError::illegal("you have already traded"));
        }
        let mut indices = indices;
        indices.sort_unstable();
        indices.dedup();
        if !self.config.allows_trade(indices.len()) {
            return Err(GameError::illegal(format!(
                "trading {} cards is not allowed",
                indices.len()
            )));
        }
        let hand_len = self.participants[seat].hand.len();
        if let Some(bad) = indices.iter().find(|&&i| i >= hand_len) {
            return Err(GameError::illegal(format!("no card at index {bad}")));
        }
        for &i in indices.iter().rev() {
            if let Some(card) = self.participants[seat].hand.remove_at(i) {
                self.discards.push(card.plain());
            }
        }
        for _ in 0..indices.len() {
            let card = self.draw()?;
            self.participants[seat].hand.add_card(card);
        }
        self.traded[seat] = true;
        let player_id = self.participants[seat].player_id;
        self.log.send_one(
            LogMessage::new("{} trades %d cards")
                .player(player_id)
                .arg(indices.len()),
        );
        if self.traded.iter().all(|t| *t) {
            self.deal_community(now)?;
        }
        Ok(())
    }

    fn deal_community(&mut self, now: Instant) -> Result<(), GameError> {
        for _ in 0..COMMUNITY_CARDS {
            let card = self.draw()?;
            self.community.push(card);
        }
        self.reveal_next();
        self.state = LittleLState::FirstBetting;
        self.pm.start_action_at(0);
        self.after_change(now);
        Ok(())
    }

    fn reveal_next(&mut self) {
        if let Some(card) = self.community.get_mut(self.revealed) {
            card.set_face_up(true);
            let shown = *card;
            self.revealed += 1;
            self.log
                .send_one(LogMessage::new("A community card is turned").cards(&[shown]));
        }
    }

    fn reveal(&mut self, now: Instant) {
        self.reveal_next();
        self.state = match self.state {
            LittleLState::FirstBetting => LittleLState::SecondBetting,
            _ => LittleLState::ThirdBetting,
        };
        self.pm.next_round(0);
        debug!(state = ?self.state, revealed = self.revealed, "little l stage");
        self.after_change(now);
    }

    fn after_change(&mut self, now: Instant) {
        if !self.state.is_betting() {
            return;
        }
        if self.pm.alive_count() <= 1 {
            self.win_uncontested();
            return;
        }
        if self.pm.is_round_over() || self.pm.betting_closed() {
            let step = if self.state == LittleLState::ThirdBetting {
                LittleLStep::Showdown
            } else {
                LittleLStep::Reveal
            };
            self.scheduler.schedule_in(step, now, STEP_DELAY);
        }
    }

    fn win_uncontested(&mut self) {
        let Some(seat) = (0..self.participants.len()).find(|&s| !self.pm.seats()[s].did_fold)
        else {
            return;
        };
        let won = self.pm.pay_winners(&[vec![seat]]);
        self.participants[seat].did_win = true;
        self.state = LittleLState::End;
        self.scheduler.cancel();
        let player_id = self.participants[seat].player_id;
        info!(winner = player_id, pot = won[seat], "little l won uncontested");
        self.log.send_one(
            LogMessage::new(format!("{{}} wins ${{{}}}, everyone else folded", won[seat]))
                .player(player_id),
        );
    }

    /// Best three-card hand from `seat`'s cards and the community cards.
    pub fn best_hand_for(&mut self, seat: usize) -> HandResult {
        let mut cards = self.participants[seat].hand.cards().to_vec();
        cards.extend_from_slice(&self.community);
        self.analyzer.analyze(&cards)
    }

    fn showdown(&mut self) {
        self.state = LittleLState::Showdown;
        while self.revealed < self.community.len() {
            self.reveal_next();
        }
        let alive: Vec<usize> = (0..self.participants.len())
            .filter(|&s| !self.pm.seats()[s].did_fold)
            .collect();
        let results: Vec<(usize, HandResult)> =
            alive.iter().map(|&s| (s, self.best_hand_for(s))).collect();
        let mut strengths: Vec<u32> = results.iter().map(|(_, r)| r.strength).collect();
        strengths.sort_unstable_by(|a, b| b.cmp(a));
        strengths.dedup();
        let tiers: Vec<Vec<usize>> = strengths
            .iter()
            .map(|st| {
                results
                    .iter()
                    .filter(|(_, r)| r.strength == *st)
                    .map(|(s, _)| *s)
                    .collect()
            })
            .collect();
        let won = self.pm.pay_winners(&tiers);
        let mut messages = Vec::new();
        for (seat, result) in &results {
            let p = &self.participants[*seat];
            messages.push(
                LogMessage::new("{} has %s")
                    .player(p.player_id)
                    .cards(p.hand.cards())
                    .arg(result.describe()),
            );
        }
        for (seat, amount) in won.iter().enumerate() {
            if *amount > 0 {
                let p = &mut self.participants[seat];
                p.did_win = true;
                messages.push(
                    LogMessage::new(format!("{{}} wins ${{{amount}}}")).player(p.player_id),
                );
            }
        }
        info!(players = results.len(), "little l showdown");
        self.log.send(messages);
        self.state = LittleLState::End;
    }

    fn seat_of(&self, player_id: PlayerId) -> Result<usize, GameError> {
        self.participants
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or_else(|| GameError::turn("you are not seated in this game"))
    }

    fn bet(&mut self, seat: usize, action: PlayerAction, now: Instant) -> Result<(), GameError> {
        if !self.state.is_betting() {
            return Err(GameError::turn("round is over"));
        }
        let limits = WagerLimits::pot_limit(&self.pm, seat, self.config.ante);
        let validated = apply_action(&mut self.pm, seat, &limits, action)?;
        let player_id = self.participants[seat].player_id;
        let message = match validated {
            ValidatedAction::Fold => LogMessage::new("{} folds"),
            ValidatedAction::Check => LogMessage::new("{} checks"),
            ValidatedAction::Call => LogMessage::new("{} calls"),
            ValidatedAction::Wager(total) => {
                LogMessage::new(format!("{{}} {}s to ${{{total}}}", action.name()))
            }
        };
        self.log.send_one(message.player(player_id));
        self.after_change(now);
        Ok(())
    }

    pub fn state(&self) -> LittleLState {
        self.state
    }

    pub fn pot_manager(&self) -> &PotManager {
        &self.pm
    }

    pub fn hand_of(&self, player_id: PlayerId) -> Option<&[Card]> {
        self.participants
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.hand.cards())
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        if !self.state.is_betting() {
            return None;
        }
        self.pm
            .current_seat()
            .map(|s| self.participants[s].player_id)
    }

    fn trade_sizes(&self) -> Vec<usize> {
        (0..=self.config.initial_deal)
            .filter(|&k| self.config.allows_trade(k))
            .collect()
    }

    fn betting_actions(&self, seat: usize) -> Vec<String> {
        let s = &self.pm.seats()[seat];
        if s.did_fold || s.is_all_in {
            return Vec::new();
        }
        let mut out = vec!["fold".to_string()];
        if s.amount_in_play == self.pm.action_amount() {
            out.push("check".into());
        } else {
            out.push("call".into());
        }
        if self.pm.action_amount() == 0 {
            out.push("bet".into());
        } else if s.balance > self.pm.to_call(seat) {
            out.push("raise".into());
        }
        out
    }

    pub fn snapshot(&self, viewer: PlayerId) -> LittleLSnapshot {
        let finished = self.state == LittleLState::End;
        let participants = self
            .participants
            .iter()
            .zip(self.pm.seats())
            .zip(&self.traded)
            .map(|((p, s), traded)| LittleLParticipantView {
                player_id: p.player_id,
                balance: s.balance - self.config.buy_in,
                stack: s.balance,
                amount_in_play: s.amount_in_play,
                did_fold: s.did_fold,
                is_all_in: s.is_all_in,
                did_win: p.did_win,
                has_traded: *traded,
                cards: if finished && !s.did_fold {
                    p.hand.cards().iter().map(|c| Some(*c)).collect()
                } else {
                    p.visible_cards(viewer)
                },
            })
            .collect();
        let community = self
            .community
            .iter()
            .map(|c| c.is_face_up().then_some(*c))
            .collect();
        let (actions, future_actions) = match self.seat_of(viewer) {
            Ok(seat) if self.state == LittleLState::Trade => {
                let a = if self.traded[seat] {
                    Vec::new()
                } else {
                    vec!["trade".to_string()]
                };
                (a, self.betting_actions(seat))
            }
            Ok(seat) if self.state.is_betting() => {
                let future = self.betting_actions(seat);
                let now = if self.current_player() == Some(viewer) {
                    future.clone()
                } else {
                    Vec::new()
                };
                (now, future)
            }
            _ => (Vec::new(), Vec::new()),
        };
        LittleLSnapshot {
            state: self.state,
            initial_deal: self.config.initial_deal,
            trade_ins: self.trade_sizes(),
            community,
            pot: self.pm.total(),
            pots: self.pm.pots().to_vec(),
            action_amount: self.pm.action_amount(),
            current_player: self.current_player(),
            participants,
            actions,
            future_actions,
        }
    }
}

impl Playable for LittleL {
    fn name(&self) -> &'static str {
        NAME
    }

    fn action(
        &mut self,
        player_id: PlayerId,
        payload: &PayloadIn,
    ) -> Result<ActionOutcome, GameError> {
        let now = Instant::now();
        let seat = self.seat_of(player_id)?;
        match payload.action.as_str() {
            "trade" => {
                let indices = if payload.additional_data.contains_key("cards") {
                    payload.indices("cards")?
                } else {
                    Vec::new()
                };
                self.trade(seat, indices, now)?;
            }
            _ => {
                let action = PlayerAction::from_payload(payload)?;
                self.bet(seat, action, now)?;
            }
        }
        Ok(ActionOutcome::updated())
    }

    fn player_state(&self, player_id: PlayerId) -> Response {
        Response::game(NAME, &self.snapshot(player_id))
    }

    fn end_of_game_details(&self) -> Option<GameOverDetails> {
        if self.state != LittleLState::End {
            return None;
        }
        let balance_adjustments: BTreeMap<PlayerId, i64> = self
            .participants
            .iter()
            .zip(self.pm.seats())
            .map(|(p, s)| (p.player_id, s.balance - self.config.buy_in))
            .collect();
        Some(GameOverDetails {
            balance_adjustments,
            log: serde_json::to_value(self.snapshot(0)).unwrap_or_default(),
        })
    }

    fn log_chan(&mut self) -> Option<LogReceiver> {
        self.log.take_receiver()
    }
}

impl Tickable for LittleL {
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError> {
        let Some(step) = self.scheduler.due(now) else {
            return Ok(false);
        };
        match step {
            LittleLStep::Deal => self.deal()?,
            LittleLStep::Reveal => self.reveal(now),
            LittleLStep::Showdown => self.showdown(),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_size_must_be_allowed() {
        let config = LittleLConfig {
            trade_ins: 0b101,
            ..LittleLConfig::default()
        };
        let mut g = LittleL::new(&[1, 2], config, 4).unwrap();
        g.tick_at(Instant::now() + Duration::from_secs(5)).unwrap();
        assert_eq!(g.state(), LittleLState::Trade);
        let one = PayloadIn::new("trade").with("cards", vec![0]);
        assert!(matches!(g.action(1, &one), Err(GameError::IllegalAction(_))));
        let two = PayloadIn::new("trade").with("cards", vec![0, 3]);
        g.action(1, &two).unwrap();
        assert_eq!(g.hand_of(1).map(<[Card]>::len), Some(4));
        assert!(matches!(g.action(1, &two), Err(GameError::IllegalAction(_))));
    }
}
