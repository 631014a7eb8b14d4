//! Betting bookkeeping shared by the chip-stack games.
//!
//! [`PotManager`] owns the seated stacks for one hand: it takes antes and
//! blinds, walks the action around the table, splits side pots when players
//! go all-in and pays tiers of winners at the end. Seats are addressed by
//! index; seat 0 sits left of the dealer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::GameError;
use crate::player::PlayerId;

/// Payouts are made in units of this many cents.
pub const PAYOUT_UNIT: i64 = 25;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pot {
    pub amount: i64,
    /// Seats that went all-in at exactly this pot's cap.
    pub all_in_seats: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotSeat {
    pub player_id: PlayerId,
    /// Chips still behind.
    pub balance: i64,
    /// Chips staked in the current betting round.
    pub amount_in_play: i64,
    pub did_fold: bool,
    pub is_all_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotManager {
    ante: i64,
    seats: Vec<PotSeat>,
    pots: Vec<Pot>,
    action_start_index: usize,
    action_at_index: usize,
    action_amount: i64,
    amount_in_play: i64,
    needs_pot_calculation: bool,
    is_game_over: bool,
    pending_antes: i64,
}

impl PotManager {
    pub fn new(ante: i64) -> Self {
        Self {
            ante,
            seats: Vec::new(),
            pots: Vec::new(),
            action_start_index: 0,
            action_at_index: 0,
            action_amount: 0,
            amount_in_play: 0,
            needs_pot_calculation: false,
            is_game_over: false,
            pending_antes: 0,
        }
    }

    /// Seats a player with `balance` chips behind and takes the ante.
    pub fn seat_participant(
        &mut self,
        player_id: PlayerId,
        balance: i64,
    ) -> Result<usize, GameError> {
        if balance <= 0 {
            return Err(GameError::config(format!(
                "player {player_id} cannot be seated without chips"
            )));
        }
        let ante = self.ante.min(balance);
        let seat = PotSeat {
            player_id,
            balance: balance - ante,
            amount_in_play: 0,
            did_fold: false,
            is_all_in: balance == ante && ante > 0,
        };
        self.pending_antes += ante;
        self.seats.push(seat);
        Ok(self.seats.len() - 1)
    }

    /// Moves the antes into the main pot and opens the first betting round.
    pub fn finish_seating_participants(&mut self) {
        let all_in: Vec<usize> = self
            .seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_all_in)
            .map(|(i, _)| i)
            .collect();
        self.pots = vec![Pot {
            amount: self.pending_antes,
            all_in_seats: all_in,
        }];
        self.pending_antes = 0;
        self.reset_round(0);
        debug!(seats = self.seats.len(), pot = self.pots[0].amount, "antes collected");
    }

    /// Posts a forced bet for `seat` without moving the action.
    pub fn post_blind(&mut self, seat: usize, amount: i64) -> Result<i64, GameError> {
        let s = self.seat_mut(seat)?;
        let paid = amount.min(s.balance);
        s.balance -= paid;
        s.amount_in_play += paid;
        if s.balance == 0 {
            s.is_all_in = true;
        }
        let total = s.amount_in_play;
        self.amount_in_play += paid;
        self.action_amount = self.action_amount.max(total);
        Ok(paid)
    }

    /// Restarts the action at `seat` (or the next seat that can act).
    pub fn start_action_at(&mut self, seat: usize) {
        let n = self.seats.len();
        if n == 0 {
            return;
        }
        self.action_start_index = seat % n;
        self.action_at_index = 0;
        if !self.can_act(self.action_start_index) {
            self.advance_decision();
            if self.action_at_index < n {
                self.action_start_index = (self.action_start_index + self.action_at_index) % n;
                self.action_at_index = 0;
            }
        }
    }

    fn reset_round(&mut self, first: usize) {
        for s in &mut self.seats {
            s.amount_in_play = 0;
        }
        self.action_amount = 0;
        self.amount_in_play = 0;
        self.needs_pot_calculation = false;
        self.start_action_at(first);
    }

    pub fn check(&mut self, seat: usize) -> Result<(), GameError> {
        self.require_turn(seat)?;
        if self.seats[seat].amount_in_play != self.action_amount {
            return Err(GameError::illegal("cannot check while facing a bet"));
        }
        self.advance_decision();
        Ok(())
    }

    /// Matches the live bet, capped at the seat's balance. Returns the amount paid.
    pub fn call(&mut self, seat: usize) -> Result<i64, GameError> {
        self.require_turn(seat)?;
        let action_amount = self.action_amount;
        let s = &mut self.seats[seat];
        if action_amount <= s.amount_in_play {
            return Err(GameError::illegal("there is no bet to call"));
        }
        let paid = (action_amount - s.amount_in_play).min(s.balance);
        s.balance -= paid;
        s.amount_in_play += paid;
        if s.balance == 0 {
            s.is_all_in = true;
        }
        self.amount_in_play += paid;
        self.advance_decision();
        Ok(paid)
    }

    /// Bets or raises so that the seat's stake this round becomes `new_total`.
    pub fn bet_or_raise(&mut self, seat: usize, new_total: i64) -> Result<i64, GameError> {
        self.require_turn(seat)?;
        let s = &self.seats[seat];
        if new_total <= self.action_amount {
            return Err(GameError::illegal(format!(
                "raise to {new_total} does not exceed the current bet of {}",
                self.action_amount
            )));
        }
        if new_total <= s.amount_in_play {
            return Err(GameError::illegal("raise must add chips"));
        }
        if new_total > s.amount_in_play + s.balance {
            return Err(GameError::illegal("bet exceeds balance"));
        }
        let s = &mut self.seats[seat];
        let paid = new_total - s.amount_in_play;
        s.balance -= paid;
        s.amount_in_play = new_total;
        if s.balance == 0 {
            s.is_all_in = true;
        }
        self.amount_in_play += paid;
        self.action_amount = new_total;
        self.action_start_index = seat;
        self.action_at_index = 0;
        self.advance_decision();
        Ok(paid)
    }

    pub fn fold(&mut self, seat: usize) -> Result<(), GameError> {
        self.require_turn(seat)?;
        self.seats[seat].did_fold = true;
        if self.alive_count() == 1 {
            self.is_game_over = true;
        }
        self.advance_decision();
        Ok(())
    }

    /// Marks a seat folded out of turn (forced folds, disconnections).
    pub fn force_fold(&mut self, seat: usize) -> Result<(), GameError> {
        self.seat_mut(seat)?.did_fold = true;
        if self.alive_count() <= 1 {
            self.is_game_over = true;
        }
        if self.current_seat() == Some(seat) {
            self.advance_decision();
        }
        Ok(())
    }

    /// Passes the turn to the next seat that can still act.
    pub fn advance_decision(&mut self) {
        let n = self.seats.len();
        self.action_at_index += 1;
        while self.action_at_index < n {
            let seat = (self.action_start_index + self.action_at_index) % n;
            if self.can_act(seat) {
                return;
            }
            self.action_at_index += 1;
        }
        if self.active_count() == 0 {
            self.needs_pot_calculation = true;
        }
    }

    fn can_act(&self, seat: usize) -> bool {
        let s = &self.seats[seat];
        !s.did_fold && !s.is_all_in
    }

    fn require_turn(&self, seat: usize) -> Result<(), GameError> {
        if self.is_round_over() {
            return Err(GameError::turn("round is over"));
        }
        if self.current_seat() != Some(seat) {
            return Err(GameError::not_your_turn());
        }
        Ok(())
    }

    fn seat_mut(&mut self, seat: usize) -> Result<&mut PotSeat, GameError> {
        self.seats
            .get_mut(seat)
            .ok_or_else(|| GameError::illegal(format!("no participant in seat {seat}")))
    }

    pub fn is_round_over(&self) -> bool {
        self.action_at_index >= self.seats.len()
    }

    pub fn current_seat(&self) -> Option<usize> {
        if self.seats.is_empty() || self.is_round_over() {
            None
        } else {
            Some((self.action_start_index + self.action_at_index) % self.seats.len())
        }
    }

    /// Closes the betting round: stakes move into pots, with a new side pot
    /// for every distinct all-in amount, and the next round opens at `first`.
    pub fn next_round(&mut self, first: usize) {
        self.collect_round();
        self.reset_round(first);
    }

    fn collect_round(&mut self) {
        if self.pots.is_empty() {
            self.pots.push(Pot::default());
        }
        let mut thresholds: Vec<i64> = self
            .seats
            .iter()
            .filter(|s| s.is_all_in && s.amount_in_play > 0)
            .map(|s| s.amount_in_play)
            .collect();
        thresholds.sort_unstable();
        thresholds.dedup();

        let mut prev = 0;
        for &cap in &thresholds {
            let slice: i64 = self
                .seats
                .iter()
                .map(|s| s.amount_in_play.min(cap) - s.amount_in_play.min(prev))
                .sum();
            let at_cap: Vec<usize> = self
                .seats
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_all_in && s.amount_in_play == cap)
                .map(|(i, _)| i)
                .collect();
            let pot = self.open_pot();
            pot.amount += slice;
            pot.all_in_seats = at_cap;
            prev = cap;
        }
        let rest: i64 = self
            .seats
            .iter()
            .map(|s| s.amount_in_play - s.amount_in_play.min(prev))
            .sum();
        if rest > 0 {
            self.open_pot().amount += rest;
        }
        for s in &mut self.seats {
            s.amount_in_play = 0;
        }
        self.amount_in_play = 0;
        self.needs_pot_calculation = false;
        debug!(pots = ?self.pots.iter().map(|p| p.amount).collect::<Vec<_>>(), "pots calculated");
    }

    fn open_pot(&mut self) -> &mut Pot {
        let reuse = self.pots.last().is_some_and(|p| p.all_in_seats.is_empty());
        if !reuse {
            self.pots.push(Pot::default());
        }
        let last = self.pots.len() - 1;
        &mut self.pots[last]
    }

    /// Seats that may win pot `index`: still in the hand and not capped by an
    /// earlier pot.
    fn eligible_for(&self, index: usize) -> Vec<usize> {
        (0..self.seats.len())
            .filter(|&seat| !self.seats[seat].did_fold)
            .filter(|&seat| {
                !self.pots[..index]
                    .iter()
                    .any(|p| p.all_in_seats.contains(&seat))
            })
            .collect()
    }

    /// Pays every pot to the best tier with an eligible member. Returns the
    /// amount won per seat; balances are credited.
    pub fn pay_winners(&mut self, tiers: &[Vec<usize>]) -> Vec<i64> {
        self.pay_winners_split(tiers, &[])
    }

    /// Like [`PotManager::pay_winners`], but half of every pot (rounded down to
    /// the payout unit) first goes to the eligible `split` seats.
    pub fn pay_winners_split(&mut self, tiers: &[Vec<usize>], split: &[usize]) -> Vec<i64> {
        if self.amount_in_play > 0 || self.needs_pot_calculation {
            self.collect_round();
        }
        let mut won = vec![0i64; self.seats.len()];
        for index in 0..self.pots.len() {
            let eligible = self.eligible_for(index);
            let mut amount = self.pots[index].amount;
            if amount == 0 {
                continue;
            }
            let split_here: Vec<usize> =
                split.iter().copied().filter(|s| eligible.contains(s)).collect();
            if !split_here.is_empty() {
                let half = amount / 2 / PAYOUT_UNIT * PAYOUT_UNIT;
                distribute(half, &split_here, &mut won);
                amount -= half;
            }
            let winners = tiers
                .iter()
                .map(|tier| {
                    let mut t: Vec<usize> =
                        tier.iter().copied().filter(|s| eligible.contains(s)).collect();
                    t.sort_unstable();
                    t
                })
                .find(|t| !t.is_empty());
            match winners {
                Some(w) => {
                    distribute(amount, &w, &mut won);
                    self.pots[index].amount = 0;
                }
                None => {
                    self.pots[index].amount = amount;
                }
            }
        }
        for (seat, amount) in won.iter().enumerate() {
            self.seats[seat].balance += amount;
        }
        self.is_game_over = true;
        won
    }

    /// Largest total a seat may raise to under pot-limit rules.
    pub fn pot_limit_max_bet(&self, seat: usize) -> i64 {
        let to_call = self
            .seats
            .get(seat)
            .map(|s| (self.action_amount - s.amount_in_play).max(0))
            .unwrap_or(0);
        self.action_amount + self.pots_total() + self.amount_in_play + to_call
    }

    pub fn pots_total(&self) -> i64 {
        self.pots.iter().map(|p| p.amount).sum()
    }

    /// Everything on the table: pots plus this round's stakes.
    pub fn total(&self) -> i64 {
        self.pots_total() + self.amount_in_play + self.pending_antes
    }

    pub fn alive_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.did_fold).count()
    }

    pub fn active_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.did_fold && !s.is_all_in).count()
    }

    /// No more betting is possible this hand: at most one seat can still act
    /// and it has nothing left to call.
    pub fn betting_closed(&self) -> bool {
        match self.active_count() {
            0 => true,
            1 => self
                .seats
                .iter()
                .filter(|s| !s.did_fold && !s.is_all_in)
                .all(|s| s.amount_in_play >= self.action_amount),
            _ => false,
        }
    }

    pub fn seats(&self) -> &[PotSeat] {
        &self.seats
    }

    pub fn seat(&self, seat: usize) -> Option<&PotSeat> {
        self.seats.get(seat)
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.player_id == player_id)
    }

    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    pub fn ante(&self) -> i64 {
        self.ante
    }

    pub fn action_amount(&self) -> i64 {
        self.action_amount
    }

    pub fn amount_in_play(&self) -> i64 {
        self.amount_in_play
    }

    pub fn action_start_index(&self) -> usize {
        self.action_start_index
    }

    pub fn needs_pot_calculation(&self) -> bool {
        self.needs_pot_calculation
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    pub fn to_call(&self, seat: usize) -> i64 {
        self.seats
            .get(seat)
            .map(|s| (self.action_amount - s.amount_in_play).clamp(0, s.balance))
            .unwrap_or(0)
    }
}

/// Splits `amount` among `winners` (sorted by seat) in whole payout units,
/// then hands out the remainder one unit at a time in seat order.
fn distribute(amount: i64, winners: &[usize], won: &mut [i64]) {
    if winners.is_empty() || amount <= 0 {
        return;
    }
    let n = winners.len() as i64;
    let share = amount / n / PAYOUT_UNIT * PAYOUT_UNIT;
    let mut remainder = amount - share * n;
    for &w in winners {
        won[w] += share;
    }
    for &w in winners.iter().cycle() {
        if remainder <= 0 {
            break;
        }
        let chunk = remainder.min(PAYOUT_UNIT);
        won[w] += chunk;
        remainder -= chunk;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(balances: &[i64], ante: i64) -> PotManager {
        let mut pm = PotManager::new(ante);
        for (i, &b) in balances.iter().enumerate() {
            pm.seat_participant(i as PlayerId + 1, b).unwrap();
        }
        pm.finish_seating_participants();
        pm
    }

    #[test]
    fn zero_balance_cannot_sit() {
        let mut pm = PotManager::new(25);
        assert!(matches!(pm.seat_participant(1, 0), Err(GameError::Config(_))));
    }

    #[test]
    fn out_of_turn_is_rejected() {
        let mut pm = table(&[1000, 1000], 25);
        assert_eq!(pm.check(1), Err(GameError::not_your_turn()));
        pm.check(0).unwrap();
        pm.check(1).unwrap();
        assert!(pm.is_round_over());
        assert!(matches!(pm.check(0), Err(GameError::Turn(_))));
    }

    #[test]
    fn raise_reopens_action() {
        let mut pm = table(&[1000, 1000, 1000], 0);
        pm.check(0).unwrap();
        pm.bet_or_raise(1, 100).unwrap();
        pm.call(2).unwrap();
        assert_eq!(pm.current_seat(), Some(0));
        assert!(matches!(pm.check(0), Err(GameError::IllegalAction(_))));
        pm.call(0).unwrap();
        assert!(pm.is_round_over());
    }

    #[test]
    fn remainder_goes_in_units_from_seat_zero() {
        let mut won = vec![0; 3];
        distribute(110, &[0, 1, 2], &mut won);
        assert_eq!(won, vec![50, 35, 25]);
    }

    #[test]
    fn fold_to_one_ends_the_hand() {
        let mut pm = table(&[500, 500], 25);
        pm.bet_or_raise(0, 50).unwrap();
        pm.fold(1).unwrap();
        assert!(pm.is_game_over());
        let won = pm.pay_winners(&[vec![0]]);
        assert_eq!(won[0], 100);
    }
}
