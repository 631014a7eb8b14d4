//! Seven-card stud with pluggable wild-card variants.
//!
//! Every player gets two cards down and one up, then one up card per street
//! and a last card down, with a betting round after each deal. The lowest up
//! card opens the first round; afterwards the best showing hand opens.

pub mod variant;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzer::{HandAnalyzer, HandResult};
use crate::cards::Card;
use crate::config::{SevenCardConfig, SevenCardVariant};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{
    ActionOutcome, GameOverDetails, PayloadIn, Playable, Response, Scheduler, Tickable,
};
use crate::hand::Hand;
use crate::logger::{LogBus, LogMessage, LogReceiver};
use crate::player::{Participant, PlayerAction, PlayerId};
use crate::pot::{Pot, PotManager};
use crate::rules::{apply_action, ValidatedAction, WagerLimits};

use self::variant::{
    DealEffect, MushroomEvent, Splash, VariantState, ANTIDOTE, LOCKED, MUSHROOM, WAS_DISCARDED,
};

pub const NAME: &str = "seven-card";

const DEAL_DELAY: Duration = Duration::from_secs(1);
const SHOWDOWN_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SevenCardRound {
    BeforeDeal,
    FirstBetting,
    SecondBetting,
    ThirdBetting,
    FourthBetting,
    FinalBetting,
    GameOver,
}

impl SevenCardRound {
    fn next(self) -> Self {
        match self {
            SevenCardRound::BeforeDeal => SevenCardRound::FirstBetting,
            SevenCardRound::FirstBetting => SevenCardRound::SecondBetting,
            SevenCardRound::SecondBetting => SevenCardRound::ThirdBetting,
            SevenCardRound::ThirdBetting => SevenCardRound::FourthBetting,
            SevenCardRound::FourthBetting => SevenCardRound::FinalBetting,
            SevenCardRound::FinalBetting | SevenCardRound::GameOver => SevenCardRound::GameOver,
        }
    }

    pub fn is_betting(self) -> bool {
        !matches!(self, SevenCardRound::BeforeDeal | SevenCardRound::GameOver)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SevenStep {
    Deal,
    Showdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SevenCardParticipantView {
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
pub struct SevenCardSnapshot {
    pub round: SevenCardRound,
    pub variant: SevenCardVariant,
    pub ante: i64,
    pub pot: i64,
    pub pots: Vec<Pot>,
    pub action_amount: i64,
    pub current_player: Option<PlayerId>,
    pub wilds: Vec<String>,
    pub splashes: Vec<Splash>,
    pub mushroom_pending: Vec<PlayerId>,
    pub participants: Vec<SevenCardParticipantView>,
    pub actions: Vec<String>,
    pub future_actions: Vec<String>,
}

#[derive(Debug)]
pub struct SevenCard {
    config: SevenCardConfig,
    deck: Deck,
    participants: Vec<Participant>,
    pm: PotManager,
    round: SevenCardRound,
    variant: VariantState,
    analyzer: HandAnalyzer,
    first_actor: usize,
    scheduler: Scheduler<SevenStep>,
    log: LogBus,
}

impl SevenCard {
    pub fn new(
        players: &[PlayerId],
        config: SevenCardConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        let mut deck = Deck::new();
        let seed = deck.shuffle(seed);
        debug!(seed, "seven-card deck shuffled");
        Self::with_deck(players, config, deck)
    }

    /// Deals from `deck` as given. Cards go round the table two down, one up,
    /// then one per street.
    pub fn with_deck(
        players: &[PlayerId],
        config: SevenCardConfig,
        deck: Deck,
    ) -> Result<Self, GameError> {
        config.validate_players(players)?;
        let mut pm = PotManager::new(config.ante);
        for &player_id in players {
            pm.seat_participant(player_id, config.buy_in)?;
        }
        pm.finish_seating_participants();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(SevenStep::Deal, Instant::now());
        let mut log = LogBus::new();
        log.send_one(LogMessage::new(format!("Everyone antes ${{{}}}", config.ante)));
        Ok(Self {
            participants: players.iter().map(|&id| Participant::new(id)).collect(),
            variant: VariantState::new(config.variant),
            analyzer: HandAnalyzer::new(5).with_constrained(config.constrained_wilds),
            config,
            deck,
            pm,
            round: SevenCardRound::BeforeDeal,
            first_actor: 0,
            scheduler,
            log,
        })
    }

    fn alive_seats(&self) -> Vec<usize> {
        (0..self.participants.len())
            .filter(|&s| !self.pm.seats()[s].did_fold)
            .collect()
    }

    fn deal_card(&mut self, seat: usize, face_up: bool) -> Result<(), GameError> {
        let mut card = self
            .deck
            .draw()
            .map_err(|_| GameError::Resource("deck exhausted while dealing".into()))?;
        self.variant.mark(&mut card);
        card.set_face_up(face_up);
        self.participants[seat].hand.add_card(card);
        if !face_up {
            return Ok(());
        }
        let player_id = self.participants[seat].player_id;
        match self
            .variant
            .on_face_up(player_id, &card, self.participants.len())
        {
            DealEffect::ExtraCard => self.deal_card(seat, false)?,
            DealEffect::Mushroom => self.start_mushroom_event(seat),
            DealEffect::Rewild | DealEffect::Nothing => {}
        }
        Ok(())
    }

    fn deal_street(&mut self, now: Instant) -> Result<(), GameError> {
        let next = self.round.next();
        self.variant.start_deal_round();
        let alive = self.alive_seats();
        match next {
            SevenCardRound::FirstBetting => {
                for face_up in [false, false, true] {
                    for &seat in &alive {
                        self.deal_card(seat, face_up)?;
                    }
                }
            }
            SevenCardRound::FinalBetting => {
                for &seat in &alive {
                    self.deal_card(seat, false)?;
                }
            }
            _ => {
                for &seat in &alive {
                    self.deal_card(seat, true)?;
                }
            }
        }
        self.round = next;
        self.rewild_all();
        let mut messages = vec![LogMessage::new(format!("Dealing for {:?}", self.round))];
        for s in &self.variant.splashes {
            messages.push(
                LogMessage::new(s.message.clone())
                    .player(s.player_id)
                    .cards(&[s.card]),
            );
        }
        self.log.send(messages);

        let first = self.choose_first_actor();
        if self.round == SevenCardRound::FirstBetting {
            self.pm.start_action_at(first);
        } else {
            self.pm.next_round(first);
        }
        debug!(round = ?self.round, first, "seven-card street dealt");
        self.after_change(now);
        Ok(())
    }

    fn rewild_all(&mut self) {
        for p in &mut self.participants {
            self.variant.rewild_hand(&mut p.hand);
        }
    }

    /// Lowest up card opens the first round; the best showing hand opens
    /// later rounds, ties going to the seat closest after the previous opener.
    fn choose_first_actor(&mut self) -> usize {
        let alive = self.alive_seats();
        let n = self.participants.len();
        let chosen = if self.round == SevenCardRound::FirstBetting {
            alive
                .iter()
                .filter_map(|&s| {
                    self.participants[s]
                        .hand
                        .face_up()
                        .map(|c| (c.rank.value(), c.suit.index()))
                        .min()
                        .map(|key| (key, s))
                })
                .min()
                .map(|(_, s)| s)
        } else {
            let mut showing = HandAnalyzer::showing();
            let strengths: Vec<(usize, u32)> = alive
                .iter()
                .map(|&s| {
                    let up: Vec<Card> = self.participants[s]
                        .hand
                        .face_up()
                        .map(Card::public_view)
                        .collect();
                    (s, showing.analyze(&up).strength)
                })
                .collect();
            let best = strengths.iter().map(|(_, st)| *st).max().unwrap_or(0);
            (0..n)
                .map(|i| (self.first_actor + i) % n)
                .find(|s| strengths.iter().any(|(seat, st)| seat == s && *st == best))
        };
        self.first_actor = chosen.unwrap_or(self.first_actor);
        self.first_actor
    }

    /// Re-checks the betting state after anything that may close it.
    fn after_change(&mut self, now: Instant) {
        if self.pm.alive_count() <= 1 {
            self.win_uncontested();
            return;
        }
        if self.variant.mushroom_event.is_some() {
            return;
        }
        if self.pm.is_round_over() || self.pm.betting_closed() {
            let step = if self.round == SevenCardRound::FinalBetting {
                SevenStep::Showdown
            } else {
                SevenStep::Deal
            };
            let delay = if step == SevenStep::Showdown { SHOWDOWN_DELAY } else { DEAL_DELAY };
            self.scheduler.schedule_in(step, now, delay);
        }
    }

    fn win_uncontested(&mut self) {
        let Some(&seat) = self.alive_seats().first() else {
            return;
        };
        let won = self.pm.pay_winners(&[vec![seat]]);
        self.participants[seat].did_win = true;
        self.round = SevenCardRound::GameOver;
        self.scheduler.cancel();
        let player_id = self.participants[seat].player_id;
        info!(winner = player_id, pot = won[seat], "seven-card won uncontested");
        self.log.send_one(
            LogMessage::new(format!("{{}} wins ${{{}}}, everyone else folded", won[seat]))
                .player(player_id),
        );
    }

    fn showdown(&mut self) {
        let alive = self.alive_seats();
        let results: Vec<(usize, HandResult)> = alive
            .iter()
            .map(|&s| {
                let cards = self.participants[s].hand.cards().to_vec();
                (s, self.analyzer.analyze(&cards))
            })
            .collect();
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
        let hands: Vec<(usize, &Hand)> = alive
            .iter()
            .map(|&s| (s, &self.participants[s].hand))
            .collect();
        let split = self.variant.split_pot_winners(&hands);
        let won = self.pm.pay_winners_split(&tiers, &split);

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
        info!(tiers = tiers.len(), split = split.len(), "seven-card showdown");
        self.log.send(messages);
        self.round = SevenCardRound::GameOver;
    }

    fn seat_of(&self, player_id: PlayerId) -> Result<usize, GameError> {
        self.participants
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or_else(|| GameError::turn("you are not seated in this game"))
    }

    fn bet(&mut self, seat: usize, action: PlayerAction, now: Instant) -> Result<(), GameError> {
        if !self.round.is_betting() {
            return Err(GameError::turn("round is over"));
        }
        if self.variant.mushroom_event.is_some() {
            return Err(GameError::turn("waiting for the Mushroom to be answered"));
        }
        let limits = WagerLimits::stud(self.config.ante, self.pm.action_amount(), self.pm.total());
        let validated = apply_action(&mut self.pm, seat, &limits, action)?;
        if matches!(validated, ValidatedAction::Wager(_)) {
            self.lock_mushrooms();
        }
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

    fn lock_mushrooms(&mut self) {
        if self.config.variant != SevenCardVariant::Chiggs {
            return;
        }
        for p in &mut self.participants {
            for c in p.hand.cards_mut() {
                if c.has_bit(MUSHROOM) && !c.is_face_up() {
                    c.set_bit(LOCKED);
                }
            }
        }
    }

    fn neighbors(&self, seat: usize) -> Vec<usize> {
        let n = self.participants.len();
        let alive = |s: &usize| !self.pm.seats()[*s].did_fold && *s != seat;
        let left = (1..n).map(|i| (seat + i) % n).find(alive);
        let right = (1..n).map(|i| (seat + n - i) % n).find(alive);
        let mut out: Vec<usize> = left.into_iter().chain(right).collect();
        out.dedup();
        out
    }

    fn has_antidote(&self, seat: usize) -> bool {
        self.participants[seat]
            .hand
            .cards()
            .iter()
            .any(|c| c.has_bit(ANTIDOTE))
    }

    fn start_mushroom_event(&mut self, owner: usize) {
        let mut pending = Vec::new();
        let mut messages = Vec::new();
        for seat in self.neighbors(owner) {
            let player_id = self.participants[seat].player_id;
            if self.has_antidote(seat) {
                pending.push(seat);
                messages
                    .push(LogMessage::new("{} must play an antidote or fold").player(player_id));
            } else if self.pm.force_fold(seat).is_ok() {
                messages.push(LogMessage::new("{} has no antidote and folds").player(player_id));
            }
        }
        self.log.send(messages);
        self.variant.mushroom_event = if pending.is_empty() {
            None
        } else {
            Some(MushroomEvent { owner, pending })
        };
    }

    fn answer_mushroom(
        &mut self,
        seat: usize,
        antidote: Option<Card>,
        play: bool,
        now: Instant,
    ) -> Result<(), GameError> {
        let Some(event) = self.variant.mushroom_event.as_ref() else {
            return Err(GameError::illegal("there is no Mushroom to answer"));
        };
        if !event.pending.contains(&seat) {
            return Err(GameError::illegal("you do not need to answer the Mushroom"));
        }
        let player_id = self.participants[seat].player_id;
        if play {
            let hand = &mut self.participants[seat].hand;
            let index = hand
                .cards()
                .iter()
                .position(|c| c.has_bit(ANTIDOTE) && antidote.map_or(true, |a| a == *c))
                .ok_or_else(|| GameError::illegal("you do not hold that antidote"))?;
            let mut card = hand.remove_at(index).ok_or_else(|| GameError::illegal("no antidote"))?;
            card.is_wild = false;
            card.set_bit(WAS_DISCARDED);
            self.log
                .send_one(LogMessage::new("{} plays an antidote").player(player_id).cards(&[card]));
        } else {
            self.pm.force_fold(seat)?;
            self.log.send_one(LogMessage::new("{} eats the Mushroom and folds").player(player_id));
        }
        if let Some(event) = self.variant.mushroom_event.as_mut() {
            event.pending.retain(|&s| s != seat);
            if event.pending.is_empty() {
                self.variant.mushroom_event = None;
            }
        }
        self.after_change(now);
        Ok(())
    }

    fn flip_mushroom(&mut self, seat: usize, now: Instant) -> Result<(), GameError> {
        if self.config.variant != SevenCardVariant::Chiggs || !self.round.is_betting() {
            return Err(GameError::illegal("there is nothing to flip"));
        }
        if self.variant.mushroom_event.is_some() {
            return Err(GameError::turn("waiting for the Mushroom to be answered"));
        }
        if self.pm.seats()[seat].did_fold {
            return Err(GameError::illegal("you have folded"));
        }
        let hand = &mut self.participants[seat].hand;
        let index = hand
            .cards()
            .iter()
            .position(|c| c.has_bit(MUSHROOM) && !c.is_face_up())
            .ok_or_else(|| GameError::illegal("you do not hold the Mushroom in the hole"))?;
        if hand.cards()[index].has_bit(LOCKED) {
            return Err(GameError::illegal("the Mushroom is locked once betting starts"));
        }
        let mut card = hand.remove_at(index).ok_or_else(|| GameError::illegal("no Mushroom"))?;
        card.set_face_up(true);
        card.set_bit(WAS_DISCARDED);
        let player_id = self.participants[seat].player_id;
        self.log
            .send_one(LogMessage::new("{} flips the Mushroom").player(player_id).cards(&[card]));
        self.start_mushroom_event(seat);
        self.after_change(now);
        Ok(())
    }

    pub fn round(&self) -> SevenCardRound {
        self.round
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
        if !self.round.is_betting() || self.variant.mushroom_event.is_some() {
            return None;
        }
        self.pm
            .current_seat()
            .map(|s| self.participants[s].player_id)
    }

    pub fn variant_state(&self) -> &VariantState {
        &self.variant
    }

    fn betting_actions(&self, seat: usize) -> Vec<String> {
        let s = &self.pm.seats()[seat];
        if s.did_fold || s.is_all_in {
            return Vec::new();
        }
        let mut out = vec!["fold".to_string()];
        if self.pm.to_call(seat) == 0 && s.amount_in_play == self.pm.action_amount() {
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

    fn can_flip_mushroom(&self, seat: usize) -> bool {
        self.config.variant == SevenCardVariant::Chiggs
            && self.round.is_betting()
            && !self.pm.seats()[seat].did_fold
            && self.participants[seat]
                .hand
                .cards()
                .iter()
                .any(|c| c.has_bit(MUSHROOM) && !c.is_face_up() && !c.has_bit(LOCKED))
    }

    pub fn snapshot(&self, viewer: PlayerId) -> SevenCardSnapshot {
        let participants = self
            .participants
            .iter()
            .zip(self.pm.seats())
            .map(|(p, s)| SevenCardParticipantView {
                player_id: p.player_id,
                balance: s.balance - self.config.buy_in,
                stack: s.balance,
                amount_in_play: s.amount_in_play,
                did_fold: s.did_fold,
                is_all_in: s.is_all_in,
                did_win: p.did_win,
                cards: if self.round == SevenCardRound::GameOver && !s.did_fold {
                    p.hand.cards().iter().map(|c| Some(c.public_view())).collect()
                } else {
                    p.visible_cards(viewer)
                },
            })
            .collect();
        let mushroom_pending: Vec<PlayerId> = self
            .variant
            .mushroom_event
            .iter()
            .flat_map(|e| e.pending.iter().map(|&s| self.participants[s].player_id))
            .collect();
        let (actions, future_actions) = match self.seat_of(viewer) {
            Ok(seat) if self.round.is_betting() => {
                let mut now = if mushroom_pending.contains(&viewer) {
                    vec!["playAntidote".to_string(), "declineAntidote".to_string()]
                } else if self.current_player() == Some(viewer) {
                    self.betting_actions(seat)
                } else {
                    Vec::new()
                };
                let mut future = self.betting_actions(seat);
                if self.can_flip_mushroom(seat) {
                    now.push("flipMushroom".into());
                    future.push("flipMushroom".into());
                }
                (now, future)
            }
            _ => (Vec::new(), Vec::new()),
        };
        SevenCardSnapshot {
            round: self.round,
            variant: self.config.variant,
            ante: self.config.ante,
            pot: self.pm.total(),
            pots: self.pm.pots().to_vec(),
            action_amount: self.pm.action_amount(),
            current_player: self.current_player(),
            wilds: self.variant.wild_summary(),
            splashes: self.variant.splashes.clone(),
            mushroom_pending,
            participants,
            actions,
            future_actions,
        }
    }
}

impl Playable for SevenCard {
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
            "playAntidote" => {
                let card = match payload.additional_data.get("card") {
                    Some(_) => Some(payload.card("card")?),
                    None => None,
                };
                self.answer_mushroom(seat, card, true, now)?;
            }
            "declineAntidote" => self.answer_mushroom(seat, None, false, now)?,
            "flipMushroom" => self.flip_mushroom(seat, now)?,
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
        if self.round != SevenCardRound::GameOver {
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

impl Tickable for SevenCard {
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError> {
        let Some(step) = self.scheduler.due(now) else {
            return Ok(false);
        };
        match step {
            SevenStep::Deal => self.deal_street(now)?,
            SevenStep::Showdown => self.showdown(),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    #[test]
    fn lowest_up_card_opens_with_suit_tiebreak() {
        // p1 down 2c 3c, p2 down 4c 5c, p3 down 6c 7c; up: 9h, 9c, 13s
        let deck = Deck::from_cards(parse_cards("2c,4c,6c,3c,5c,7c,9h,9c,13s").unwrap());
        let mut g =
            SevenCard::with_deck(&[1, 2, 3], SevenCardConfig::default(), deck).unwrap();
        g.tick_at(Instant::now() + Duration::from_secs(5)).unwrap();
        assert_eq!(g.round(), SevenCardRound::FirstBetting);
        assert_eq!(g.current_player(), Some(2));
    }

    #[test]
    fn folding_to_one_player_ends_the_game() {
        let mut g = SevenCard::new(&[1, 2], SevenCardConfig::default(), 3).unwrap();
        g.tick_at(Instant::now() + Duration::from_secs(5)).unwrap();
        let first = g.current_player().unwrap();
        let other = if first == 1 { 2 } else { 1 };
        g.action(first, &PayloadIn::new("fold")).unwrap();
        assert_eq!(g.round(), SevenCardRound::GameOver);
        let details = g.end_of_game_details().unwrap();
        assert_eq!(details.balance_adjustments[&other], 25);
        assert_eq!(details.balance_adjustments[&first], -25);
    }
}
