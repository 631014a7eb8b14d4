//! Texas hold'em, pot-limit, with Pineapple and Lazy Pineapple variants.
//!
//! The dealer runs as a state machine. Betting states wait for players; the
//! dealing states are reached through the scheduler a moment after a betting
//! round closes, so observers see the closed round before new cards land.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzer::{HandAnalyzer, HandResult};
use crate::cards::Card;
use crate::config::{HoldemConfig, HoldemVariant};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{
    ActionOutcome, GameOverDetails, PayloadIn, Playable, Response, Scheduler, Tickable,
};
use crate::logger::{LogBus, LogMessage, LogReceiver};
use crate::player::{Participant, PlayerAction, PlayerId};
use crate::pot::{Pot, PotManager};
use crate::rules::{apply_action, ValidatedAction, WagerLimits};

pub const NAME: &str = "holdem";

const DEAL_DELAY: Duration = Duration::from_secs(1);
const REVEAL_DELAY: Duration = Duration::from_secs(2);

/// Hole-card pairs Lazy Pineapple may combine with the board.
const LAZY_PAIRS: [[usize; 2]; 3] = [[0, 1], [0, 2], [1, 2]];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldemState {
    Start,
    DiscardRound,
    PreFlopBetting,
    DealFlop,
    FlopBetting,
    DealTurn,
    TurnBetting,
    DealRiver,
    RiverBetting,
    RevealWinner,
    End,
}

impl HoldemState {
    pub fn is_betting(self) -> bool {
        matches!(
            self,
            HoldemState::PreFlopBetting
                | HoldemState::FlopBetting
                | HoldemState::TurnBetting
                | HoldemState::RiverBetting
        )
    }

    /// The dealing state that follows a closed betting round.
    fn after_betting(self) -> Option<HoldemState> {
        match self {
            HoldemState::PreFlopBetting => Some(HoldemState::DealFlop),
            HoldemState::FlopBetting => Some(HoldemState::DealTurn),
            HoldemState::TurnBetting => Some(HoldemState::DealRiver),
            HoldemState::RiverBetting => Some(HoldemState::RevealWinner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldemParticipantView {
    pub player_id: PlayerId,
    /// Net of the buy-in.
    pub balance: i64,
    pub stack: i64,
    pub amount_in_play: i64,
    pub did_fold: bool,
    pub is_all_in: bool,
    pub did_win: bool,
    pub cards: Vec<Option<Card>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldemSnapshot {
    pub state: HoldemState,
    pub variant: HoldemVariant,
    pub community: Vec<Option<Card>>,
    pub pot: i64,
    pub pots: Vec<Pot>,
    pub action_amount: i64,
    pub min_bet: i64,
    pub max_bet: i64,
    pub current_player: Option<PlayerId>,
    pub participants: Vec<HoldemParticipantView>,
    pub actions: Vec<String>,
    pub future_actions: Vec<String>,
}

#[derive(Debug)]
pub struct Holdem {
    config: HoldemConfig,
    deck: Deck,
    participants: Vec<Participant>,
    pm: PotManager,
    community: Vec<Card>,
    state: HoldemState,
    analyzer: HandAnalyzer,
    scheduler: Scheduler<HoldemState>,
    log: LogBus,
}

impl Holdem {
    pub fn new(players: &[PlayerId], config: HoldemConfig, seed: u64) -> Result<Self, GameError> {
        let mut deck = Deck::new();
        let seed = deck.shuffle(seed);
        debug!(seed, "holdem deck shuffled");
        Self::with_deck(players, config, deck)
    }

    pub fn with_deck(
        players: &[PlayerId],
        config: HoldemConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        config.validate_players(players)?;
        let mut pm = PotManager::new(config.ante);
        for &player_id in players {
            pm.seat_participant(player_id, config.buy_in)?;
        }
        pm.finish_seating_participants();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(HoldemState::Start, Instant::now());
        Ok(Self {
            participants: players.iter().map(|&id| Participant::new(id)).collect(),
            config,
            deck,
            pm,
            community: Vec::new(),
            state: HoldemState::Start,
            analyzer: HandAnalyzer::new(5),
            scheduler,
            log: LogBus::new(),
        })
    }

    fn hole_count(&self) -> usize {
        match self.config.variant {
            HoldemVariant::Standard => 2,
            HoldemVariant::Pineapple | HoldemVariant::LazyPineapple => 3,
        }
    }

    fn draw(&mut self) -> Result<Card, GameError> {
        self.deck
            .draw()
            .map_err(|_| GameError::Resource("deck exhausted while dealing".into()))
    }

    fn start(&mut self, now: Instant) -> Result<(), GameError> {
        for _ in 0..self.hole_count() {
            for seat in 0..self.participants.len() {
                let card = self.draw()?;
                self.participants[seat].hand.add_card(card);
            }
        }
        let small = self.pm.post_blind(0, self.config.lower_limit)?;
        let big = self.pm.post_blind(1, self.config.upper_limit)?;
        let (sb, bb) = (self.participants[0].player_id, self.participants[1].player_id);
        self.log.send(vec![
            LogMessage::new(format!("{{}} posts the small blind of ${{{small}}}")).player(sb),
            LogMessage::new(format!("{{}} posts the big blind of ${{{big}}}")).player(bb),
        ]);
        if self.config.variant == HoldemVariant::Pineapple {
            self.state = HoldemState::DiscardRound;
            debug!("holdem waiting for discards");
        } else {
            self.start_pre_flop(now);
        }
        Ok(())
    }

    fn start_pre_flop(&mut self, now: Instant) {
        self.state = HoldemState::PreFlopBetting;
        let n = self.participants.len();
        let first = if n == 2 { 0 } else { 2 };
        self.pm.start_action_at(first);
        debug!(first, "holdem pre-flop betting");
        self.after_change(now);
    }

    fn discard(
        &mut self,
        seat: usize,
        payload: &PayloadIn,
        now: Instant,
    ) -> Result<(), GameError> {
        if self.state != HoldemState::DiscardRound {
            return Err(GameError::turn("not in the discard round"));
        }
        let hand = &mut self.participants[seat].hand;
        if hand.len() <= 2 {
            return Err(GameError::illegal("you have already discarded"));
        }
        let index = if payload.additional_data.contains_key("card") {
            let card = payload.card("card")?;
            hand.cards()
                .iter()
                .position(|c| *c == card)
                .ok_or_else(|| GameError::illegal(format!("you do not hold {card}")))?
        } else {
            payload.index("index")?
        };
        let card = hand
            .remove_at(index)
            .ok_or_else(|| GameError::illegal(format!("no card at index {index}")))?;
        let player_id = self.participants[seat].player_id;
        debug!(player_id, %card, "holdem discard");
        self.log.send_one(LogMessage::new("{} discards").player(player_id));
        if self.participants.iter().all(|p| p.hand.len() == 2) {
            self.start_pre_flop(now);
        }
        Ok(())
    }

    fn deal_community(
        &mut self,
        count: usize,
        next: HoldemState,
        now: Instant,
    ) -> Result<(), GameError> {
        self.deck
            .burn()
            .map_err(|_| GameError::Resource("deck exhausted while burning".into()))?;
        let mut dealt = Vec::with_capacity(count);
        for _ in 0..count {
            let card = self.draw()?.face_up();
            self.community.push(card);
            dealt.push(card);
        }
        self.state = next;
        self.pm.next_round(0);
        self.log
            .send_one(LogMessage::new(format!("Dealing {next:?}")).cards(&dealt));
        debug!(state = ?self.state, "holdem community dealt");
        self.after_change(now);
        Ok(())
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
            if let Some(next) = self.state.after_betting() {
                let delay = if next == HoldemState::RevealWinner {
                    REVEAL_DELAY
                } else {
                    DEAL_DELAY
                };
                self.scheduler.schedule_in(next, now, delay);
            }
        }
    }

    fn win_uncontested(&mut self) {
        let Some(seat) = (0..self.participants.len()).find(|&s| !self.pm.seats()[s].did_fold)
        else {
            return;
        };
        let won = self.pm.pay_winners(&[vec![seat]]);
        self.participants[seat].did_win = true;
        self.state = HoldemState::End;
        self.scheduler.cancel();
        let player_id = self.participants[seat].player_id;
        info!(winner = player_id, pot = won[seat], "holdem won uncontested");
        self.log.send_one(
            LogMessage::new(format!("{{}} wins ${{{}}}, everyone else folded", won[seat]))
                .player(player_id),
        );
    }

    /// Best five-card hand for `seat`. Lazy Pineapple plays exactly two hole
    /// cards with the board.
    pub fn best_hand_for(&mut self, seat: usize) -> HandResult {
        let hole = self.participants[seat].hand.cards().to_vec();
        if self.config.variant == HoldemVariant::LazyPineapple && hole.len() == 3 {
            let mut best: Option<HandResult> = None;
            for pair in LAZY_PAIRS {
                let mut cards: Vec<Card> = pair.iter().map(|&i| hole[i]).collect();
                cards.extend_from_slice(&self.community);
                let r = self.analyzer.analyze(&cards);
                if best.as_ref().map_or(true, |b| r.strength > b.strength) {
                    best = Some(r);
                }
            }
            if let Some(best) = best {
                return best;
            }
        }
        let mut cards = hole;
        cards.extend_from_slice(&self.community);
        self.analyzer.analyze(&cards)
    }

    fn reveal_winner(&mut self) {
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
                LogMessage::new("{} shows %s")
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
        info!(players = results.len(), "holdem showdown");
        self.log.send(messages);
        self.state = HoldemState::End;
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
        let limits = WagerLimits::pot_limit(&self.pm, seat, self.config.upper_limit);
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

    pub fn state(&self) -> HoldemState {
        self.state
    }

    pub fn community(&self) -> &[Card] {
        &self.community
    }

    pub fn pot_manager(&self) -> &PotManager {
        &self.pm
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        if !self.state.is_betting() {
            return None;
        }
        self.pm
            .current_seat()
            .map(|s| self.participants[s].player_id)
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

    pub fn snapshot(&self, viewer: PlayerId) -> HoldemSnapshot {
        let showdown = self.state == HoldemState::End;
        let participants = self
            .participants
            .iter()
            .zip(self.pm.seats())
            .map(|(p, s)| HoldemParticipantView {
                player_id: p.player_id,
                balance: s.balance - self.config.buy_in,
                stack: s.balance,
                amount_in_play: s.amount_in_play,
                did_fold: s.did_fold,
                is_all_in: s.is_all_in,
                did_win: p.did_win,
                cards: if showdown && !s.did_fold {
                    p.hand.cards().iter().map(|c| Some(*c)).collect()
                } else {
                    p.visible_cards(viewer)
                },
            })
            .collect();
        let mut community: Vec<Option<Card>> = self.community.iter().map(|c| Some(*c)).collect();
        community.resize(5, None);
        let seat = self.seat_of(viewer).ok();
        let (actions, future_actions) = match seat {
            Some(seat) if self.state == HoldemState::DiscardRound => {
                let a = if self.participants[seat].hand.len() > 2 {
                    vec!["discard".to_string()]
                } else {
                    Vec::new()
                };
                (a.clone(), a)
            }
            Some(seat) if self.state.is_betting() => {
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
        let max_bet = seat.map(|s| self.pm.pot_limit_max_bet(s)).unwrap_or(0);
        HoldemSnapshot {
            state: self.state,
            variant: self.config.variant,
            community,
            pot: self.pm.total(),
            pots: self.pm.pots().to_vec(),
            action_amount: self.pm.action_amount(),
            min_bet: self.config.upper_limit,
            max_bet,
            current_player: self.current_player(),
            participants,
            actions,
            future_actions,
        }
    }
}

impl Playable for Holdem {
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
        if payload.action == "discard" {
            self.discard(seat, payload, now)?;
        } else {
            let action = PlayerAction::from_payload(payload)?;
            self.bet(seat, action, now)?;
        }
        Ok(ActionOutcome::updated())
    }

    fn player_state(&self, player_id: PlayerId) -> Response {
        Response::game(NAME, &self.snapshot(player_id))
    }

    fn end_of_game_details(&self) -> Option<GameOverDetails> {
        if self.state != HoldemState::End {
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

impl Tickable for Holdem {
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError> {
        let Some(next) = self.scheduler.due(now) else {
            return Ok(false);
        };
        match next {
            HoldemState::Start => self.start(now)?,
            HoldemState::DealFlop => self.deal_community(3, HoldemState::FlopBetting, now)?,
            HoldemState::DealTurn => self.deal_community(1, HoldemState::TurnBetting, now)?,
            HoldemState::DealRiver => self.deal_community(1, HoldemState::RiverBetting, now)?,
            HoldemState::RevealWinner => self.reveal_winner(),
            other => debug!(state = ?other, "holdem nothing scheduled for state"),
        }
        Ok(true)
    }
}
