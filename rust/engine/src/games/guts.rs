//! Guts: everyone secretly declares in or out on a two- or three-card hand.
//!
//! The best hand among those who stayed in takes the pot; every other player
//! who stayed in matches it (capped at `maxOwed`) and those penalties seed
//! the next pot. The game ends when a round produces no penalty. In Bloody
//! Guts a lone player must beat a hand dealt from the deck.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzer::{HandAnalyzer, HandResult};
use crate::cards::{full_deck, Card};
use crate::config::GutsConfig;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{
    ActionOutcome, GameOverDetails, PayloadIn, Playable, Response, Scheduler, Tickable,
};
use crate::hand::Hand;
use crate::logger::{LogBus, LogMessage, LogReceiver};
use crate::player::PlayerId;

pub const NAME: &str = "guts";

const SHOWDOWN_DELAY: Duration = Duration::from_secs(1);
const DECK_REVEAL_DELAY: Duration = Duration::from_secs(2);
const NEXT_ROUND_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GutsPhase {
    Dealing,
    Declaration,
    Showdown,
    RoundEnd,
    GameOver,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum GutsStep {
    Showdown,
    RevealDeckCard,
    ResolveDeck,
    NextRound,
}

#[derive(Debug, Clone)]
struct GutsParticipant {
    player_id: PlayerId,
    hand: Hand,
    balance: i64,
    is_in: Option<bool>,
    did_win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GutsParticipantView {
    pub player_id: PlayerId,
    pub balance: i64,
    pub cards: Vec<Option<Card>>,
    pub has_decided: bool,
    pub is_in: Option<bool>,
    pub did_win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GutsSnapshot {
    pub phase: GutsPhase,
    pub round: u32,
    pub pot: i64,
    pub ante: i64,
    pub max_owed: i64,
    pub card_count: usize,
    pub bloody_guts: bool,
    pub participants: Vec<GutsParticipantView>,
    pub deck_hand: Vec<Option<Card>>,
    pub actions: Vec<String>,
    pub future_actions: Vec<String>,
}

#[derive(Debug)]
pub struct Guts {
    config: GutsConfig,
    card_count: usize,
    deck: Deck,
    participants: Vec<GutsParticipant>,
    phase: GutsPhase,
    round: u32,
    pot: i64,
    deck_hand: Vec<Card>,
    deck_revealed: usize,
    analyzer: HandAnalyzer,
    scheduler: Scheduler<GutsStep>,
    log: LogBus,
}

impl Guts {
    pub fn new(players: &[PlayerId], config: GutsConfig, seed: u64) -> Result<Self, GameError> {
        let mut deck = Deck::new();
        let seed = deck.shuffle(seed);
        debug!(seed, "guts deck shuffled");
        Self::with_deck(players, config, deck)
    }

    /// Starts the game dealing from `deck` as given.
    pub fn with_deck(
        players: &[PlayerId],
        config: GutsConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        config.validate_players(players)?;
        let card_count = config.effective_card_count();
        let participants = players
            .iter()
            .map(|&player_id| GutsParticipant {
                player_id,
                hand: Hand::new(),
                balance: -config.ante,
                is_in: None,
                did_win: false,
            })
            .collect::<Vec<_>>();
        let mut game = Self {
            pot: config.ante * participants.len() as i64,
            card_count,
            analyzer: HandAnalyzer::new(card_count),
            config,
            deck,
            participants,
            phase: GutsPhase::Dealing,
            round: 0,
            deck_hand: Vec::new(),
            deck_revealed: 0,
            scheduler: Scheduler::new(),
            log: LogBus::new(),
        };
        game.log
            .send_one(LogMessage::new(format!("Everyone antes ${{{}}}", game.config.ante)));
        game.deal()?;
        Ok(game)
    }

    fn deal(&mut self) -> Result<(), GameError> {
        self.phase = GutsPhase::Dealing;
        self.round += 1;
        self.deck_hand.clear();
        self.deck_revealed = 0;
        for p in &mut self.participants {
            p.hand.clear();
            p.is_in = None;
            p.did_win = false;
        }
        if self.round > 1 {
            self.deck.shuffle_discards(full_deck());
        }
        for _ in 0..self.card_count {
            for p in &mut self.participants {
                let card = self
                    .deck
                    .draw()
                    .map_err(|_| GameError::Resource("deck exhausted while dealing".into()))?;
                p.hand.add_card(card);
            }
        }
        self.phase = GutsPhase::Declaration;
        debug!(round = self.round, pot = self.pot, "guts round dealt");
        self.log.send_one(LogMessage::new(format!(
            "Round {} dealt, pot is ${{{}}}",
            self.round, self.pot
        )));
        Ok(())
    }

    fn index_of(&self, player_id: PlayerId) -> Result<usize, GameError> {
        self.participants
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or_else(|| GameError::turn("you are not seated in this game"))
    }

    fn declare(
        &mut self,
        player_id: PlayerId,
        is_in: bool,
        now: Instant,
    ) -> Result<ActionOutcome, GameError> {
        let idx = self.index_of(player_id)?;
        if self.phase != GutsPhase::Declaration {
            return Err(GameError::turn("not in declaration phase"));
        }
        if self.participants[idx].is_in.is_some() {
            return Err(GameError::illegal("you have already declared"));
        }
        self.participants[idx].is_in = Some(is_in);
        self.log.send_one(LogMessage::new("{} has decided").player(player_id));
        if self.participants.iter().all(|p| p.is_in.is_some()) {
            self.phase = GutsPhase::Showdown;
            self.scheduler.schedule_in(GutsStep::Showdown, now, SHOWDOWN_DELAY);
        }
        Ok(ActionOutcome::updated())
    }

    fn hand_of(&mut self, idx: usize) -> HandResult {
        let cards = self.participants[idx].hand.cards().to_vec();
        self.analyzer.analyze(&cards)
    }

    fn showdown(&mut self, now: Instant) -> Result<(), GameError> {
        let ins: Vec<usize> = (0..self.participants.len())
            .filter(|&i| self.participants[i].is_in == Some(true))
            .collect();
        let mut messages = Vec::new();
        for &i in &ins {
            let p = &self.participants[i];
            messages.push(LogMessage::new("{} is in").player(p.player_id).cards(p.hand.cards()));
        }
        match ins.len() {
            0 => {
                for p in &mut self.participants {
                    p.balance -= self.config.ante;
                }
                self.pot += self.config.ante * self.participants.len() as i64;
                messages.push(LogMessage::new(format!(
                    "Nobody is in, everyone antes again. Pot is ${{{}}}",
                    self.pot
                )));
                self.end_round(now);
            }
            1 if self.config.bloody_guts => {
                for _ in 0..self.card_count {
                    let card = self
                        .deck
                        .draw()
                        .map_err(|_| GameError::Resource("deck exhausted".into()))?;
                    self.deck_hand.push(card);
                }
                let alone = self.participants[ins[0]].player_id;
                messages.push(LogMessage::new("{} is alone and must beat the deck").player(alone));
                self.scheduler.schedule_in(GutsStep::RevealDeckCard, now, DECK_REVEAL_DELAY);
            }
            1 => {
                let w = ins[0];
                let pot = self.pot;
                self.participants[w].balance += pot;
                self.participants[w].did_win = true;
                self.pot = 0;
                messages.push(
                    LogMessage::new(format!("{{}} is the only one in and wins ${{{pot}}}"))
                        .player(self.participants[w].player_id),
                );
                info!(winner = self.participants[w].player_id, pot, "guts won uncontested");
                self.phase = GutsPhase::GameOver;
            }
            _ => {
                let results: Vec<(usize, HandResult)> =
                    ins.iter().map(|&i| (i, self.hand_of(i))).collect();
                let best = results.iter().map(|(_, r)| r.strength).max().unwrap_or(0);
                let (won, lost): (Vec<_>, Vec<_>) =
                    results.iter().partition(|(_, r)| r.strength == best);
                let winners: Vec<usize> = won.iter().map(|(i, _)| *i).collect();
                let losers: Vec<usize> = lost.iter().map(|(i, _)| *i).collect();
                let pot = self.pot;
                let shares = split_evenly(pot, winners.len());
                for (&w, share) in winners.iter().zip(shares) {
                    self.participants[w].balance += share;
                    self.participants[w].did_win = true;
                    let desc = results
                        .iter()
                        .find(|(i, _)| *i == w)
                        .map(|(_, r)| r.describe())
                        .unwrap_or_default();
                    messages.push(
                        LogMessage::new(format!("{{}} wins ${{{share}}} with %s"))
                            .player(self.participants[w].player_id)
                            .arg(desc),
                    );
                }
                let penalty = pot.min(self.config.max_owed);
                self.pot = 0;
                for &l in &losers {
                    self.participants[l].balance -= penalty;
                    self.pot += penalty;
                    messages.push(
                        LogMessage::new(format!("{{}} pays ${{{penalty}}}"))
                            .player(self.participants[l].player_id),
                    );
                }
                info!(
                    winners = winners.len(),
                    losers = losers.len(),
                    next_pot = self.pot,
                    "guts showdown"
                );
                if losers.is_empty() {
                    self.phase = GutsPhase::GameOver;
                } else {
                    self.end_round(now);
                }
            }
        }
        self.log.send(messages);
        Ok(())
    }

    fn reveal_deck_card(&mut self, now: Instant) {
        if self.deck_revealed < self.deck_hand.len() {
            let card = self.deck_hand[self.deck_revealed];
            self.deck_revealed += 1;
            self.log.send_one(LogMessage::new("The deck shows a card").cards(&[card]));
        }
        if self.deck_revealed < self.deck_hand.len() {
            self.scheduler.schedule_in(GutsStep::RevealDeckCard, now, DECK_REVEAL_DELAY);
        } else {
            self.scheduler.schedule_in(GutsStep::ResolveDeck, now, SHOWDOWN_DELAY);
        }
    }

    fn resolve_against_deck(&mut self, now: Instant) {
        let Some(idx) = self.participants.iter().position(|p| p.is_in == Some(true)) else {
            self.end_round(now);
            return;
        };
        let player = self.hand_of(idx);
        let deck_cards = self.deck_hand.clone();
        let deck = self.analyzer.analyze(&deck_cards);
        let player_id = self.participants[idx].player_id;
        if player.strength > deck.strength {
            let pot = self.pot;
            self.participants[idx].balance += pot;
            self.participants[idx].did_win = true;
            self.pot = 0;
            self.phase = GutsPhase::GameOver;
            info!(winner = player_id, pot, "guts player beat the deck");
            self.log.send_one(
                LogMessage::new(format!("{{}} beats the deck with %s and wins ${{{pot}}}"))
                    .player(player_id)
                    .arg(player.describe()),
            );
        } else {
            let penalty = self.pot.min(self.config.max_owed);
            self.participants[idx].balance -= penalty;
            self.pot += penalty;
            info!(loser = player_id, penalty, pot = self.pot, "guts deck wins");
            self.log.send_one(
                LogMessage::new(format!("The deck wins with %s, {{}} pays ${{{penalty}}}"))
                    .player(player_id)
                    .arg(deck.describe()),
            );
            self.end_round(now);
        }
    }

    fn end_round(&mut self, now: Instant) {
        self.phase = GutsPhase::RoundEnd;
        self.scheduler.schedule_in(GutsStep::NextRound, now, NEXT_ROUND_DELAY);
    }

    pub fn phase(&self) -> GutsPhase {
        self.phase
    }

    pub fn pot(&self) -> i64 {
        self.pot
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn balance(&self, player_id: PlayerId) -> Option<i64> {
        self.participants
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.balance)
    }

    pub fn snapshot(&self, viewer: PlayerId) -> GutsSnapshot {
        let revealed = !matches!(self.phase, GutsPhase::Dealing | GutsPhase::Declaration);
        let participants = self
            .participants
            .iter()
            .map(|p| {
                let own = p.player_id == viewer;
                let show_cards = own || (revealed && p.is_in == Some(true));
                GutsParticipantView {
                    player_id: p.player_id,
                    balance: p.balance,
                    cards: p.hand.cards().iter().map(|c| show_cards.then_some(*c)).collect(),
                    has_decided: p.is_in.is_some(),
                    is_in: if own || revealed { p.is_in } else { None },
                    did_win: p.did_win,
                }
            })
            .collect();
        let deck_hand = self
            .deck_hand
            .iter()
            .enumerate()
            .map(|(i, c)| (i < self.deck_revealed).then_some(*c))
            .collect();
        let undecided = self
            .participants
            .iter()
            .any(|p| p.player_id == viewer && p.is_in.is_none());
        let actions: Vec<String> = if self.phase == GutsPhase::Declaration && undecided {
            vec!["in".into(), "out".into()]
        } else {
            Vec::new()
        };
        GutsSnapshot {
            phase: self.phase,
            round: self.round,
            pot: self.pot,
            ante: self.config.ante,
            max_owed: self.config.max_owed,
            card_count: self.card_count,
            bloody_guts: self.config.bloody_guts,
            participants,
            deck_hand,
            future_actions: actions.clone(),
            actions,
        }
    }
}

/// Splits `amount` into `n` shares; the remainder goes one unit at a time to
/// the first seats.
pub fn split_evenly(amount: i64, n: usize) -> Vec<i64> {
    if n == 0 {
        return Vec::new();
    }
    let base = amount / n as i64;
    let rem = (amount % n as i64) as usize;
    (0..n).map(|i| base + i64::from(i < rem)).collect()
}

impl Playable for Guts {
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
            "in" => self.declare(player_id, true, now),
            "out" => self.declare(player_id, false, now),
            "declare" => {
                let is_in = payload.bool_field("in")?;
                self.declare(player_id, is_in, now)
            }
            other => Err(GameError::payload(format!("unknown action {other:?}"))),
        }
    }

    fn player_state(&self, player_id: PlayerId) -> Response {
        Response::game(NAME, &self.snapshot(player_id))
    }

    fn end_of_game_details(&self) -> Option<GameOverDetails> {
        if self.phase != GutsPhase::GameOver {
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

impl Tickable for Guts {
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError> {
        let Some(step) = self.scheduler.due(now) else {
            return Ok(false);
        };
        debug!(?step, "guts scheduled step");
        match step {
            GutsStep::Showdown => self.showdown(now)?,
            GutsStep::RevealDeckCard => self.reveal_deck_card(now),
            GutsStep::ResolveDeck => self.resolve_against_deck(now),
            GutsStep::NextRound => self.deal()?,
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_hands_out_remainder_in_seat_order() {
        assert_eq!(split_evenly(100, 3), vec![34, 33, 33]);
        assert_eq!(split_evenly(75, 1), vec![75]);
        assert_eq!(split_evenly(10, 4).iter().sum::<i64>(), 10);
    }

    #[test]
    fn declarations_are_hidden_until_showdown() {
        let mut g = Guts::new(&[1, 2, 3], GutsConfig::default(), 7).unwrap();
        g.action(1, &PayloadIn::new("in")).unwrap();
        let seen_by_two = g.snapshot(2);
        assert!(seen_by_two.participants[0].has_decided);
        assert_eq!(seen_by_two.participants[0].is_in, None);
        assert_eq!(seen_by_two.participants[0].cards, vec![None, None]);
        assert_eq!(g.snapshot(1).participants[0].is_in, Some(true));
        assert!(matches!(
            g.action(1, &PayloadIn::new("out")),
            Err(GameError::IllegalAction(_))
        ));
    }
}
