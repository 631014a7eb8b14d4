use crate::errors::GameError;
use crate::player::PlayerAction as A;
use crate::pot::PotManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    Fold,
    Check,
    Call,
    /// New total stake for the round.
    Wager(i64),
}

/// Bounds on an opening bet or a raise, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WagerLimits {
    pub min_bet: i64,
    pub min_raise: i64,
    pub max: i64,
    /// Every wager must be a multiple of this (1 for no restriction).
    pub step: i64,
}

impl WagerLimits {
    /// Stud limits: bets start at the ante, raises at least double the live
    /// bet, and nothing may exceed pot plus the live bet.
    pub fn stud(ante: i64, current_bet: i64, pot: i64) -> Self {
        Self {
            min_bet: ante,
            min_raise: current_bet * 2,
            max: pot + current_bet,
            step: ante.max(1),
        }
    }

    /// Pot-limit betting for seat `seat` of `pm` with a `min_bet` floor.
    pub fn pot_limit(pm: &PotManager, seat: usize, min_bet: i64) -> Self {
        Self {
            min_bet,
            min_raise: (pm.action_amount() * 2).max(min_bet),
            max: pm.pot_limit_max_bet(seat),
            step: 1,
        }
    }
}

/// Validates a player action against the live bet and wager limits.
///
/// `in_play` is what the player has already staked this round, `live_bet`
/// the amount everyone must match and `balance` the chips behind.
///
/// # Errors
///
/// Returns [`GameError::IllegalAction`] when:
/// - checking while facing a bet, or calling when nothing is owed
/// - betting into a live bet, or raising when nothing has been bet
/// - a wager is off-step, below the minimum, above the limit or above the balance
///
/// # Examples
///
/// ```
/// use cardroom_engine::rules::{validate_action, ValidatedAction, WagerLimits};
/// use cardroom_engine::player::PlayerAction;
///
/// let limits = WagerLimits::stud(25, 50, 300);
/// let r = validate_action(0, 50, 1000, &limits, PlayerAction::Raise(100));
/// assert_eq!(r, Ok(ValidatedAction::Wager(100)));
/// assert!(validate_action(0, 50, 1000, &limits, PlayerAction::Raise(75)).is_err());
/// ```
pub fn validate_action(
    in_play: i64,
    live_bet: i64,
    balance: i64,
    limits: &WagerLimits,
    action: A,
) -> Result<ValidatedAction, GameError> {
    match action {
        A::Fold => Ok(ValidatedAction::Fold),
        A::Check => {
            if in_play == live_bet {
                Ok(ValidatedAction::Check)
            } else {
                Err(GameError::illegal("cannot check while facing a bet"))
            }
        }
        A::Call => {
            if live_bet > in_play {
                Ok(ValidatedAction::Call)
            } else {
                Err(GameError::illegal("there is no bet to call"))
            }
        }
        A::Bet(amount) => {
            if live_bet > 0 {
                return Err(GameError::illegal("cannot bet into a live bet, raise instead"));
            }
            check_wager(amount, limits.min_bet, in_play, balance, limits)
        }
        A::Raise(amount) => {
            if live_bet == 0 {
                return Err(GameError::illegal("nothing to raise, bet instead"));
            }
            check_wager(amount, limits.min_raise, in_play, balance, limits)
        }
    }
}

/// Validates `action` for `seat` and applies it to `pm`.
pub fn apply_action(
    pm: &mut PotManager,
    seat: usize,
    limits: &WagerLimits,
    action: A,
) -> Result<ValidatedAction, GameError> {
    if pm.is_round_over() {
        return Err(GameError::turn("round is over"));
    }
    if pm.current_seat() != Some(seat) {
        return Err(GameError::not_your_turn());
    }
    let s = pm
        .seat(seat)
        .ok_or_else(|| GameError::illegal(format!("no participant in seat {seat}")))?;
    let validated =
        validate_action(s.amount_in_play, pm.action_amount(), s.balance, limits, action)?;
    match validated {
        ValidatedAction::Fold => pm.fold(seat)?,
        ValidatedAction::Check => pm.check(seat)?,
        ValidatedAction::Call => {
            pm.call(seat)?;
        }
        ValidatedAction::Wager(total) => {
            pm.bet_or_raise(seat, total)?;
        }
    }
    Ok(validated)
}

fn check_wager(
    amount: i64,
    minimum: i64,
    in_play: i64,
    balance: i64,
    limits: &WagerLimits,
) -> Result<ValidatedAction, GameError> {
    let all_in = in_play + balance;
    if amount > all_in {
        return Err(GameError::illegal(format!(
            "bet of {amount} exceeds balance of {all_in}"
        )));
    }
    if limits.step > 1 && amount % limits.step != 0 && amount != all_in {
        return Err(GameError::illegal(format!(
            "bet must be a multiple of {}",
            limits.step
        )));
    }
    if amount < minimum && amount != all_in {
        return Err(GameError::illegal(format!(
            "bet of {amount} is below the minimum of {minimum}"
        )));
    }
    if amount > limits.max {
        return Err(GameError::illegal(format!(
            "bet of {amount} exceeds the limit of {}",
            limits.max
        )));
    }
    Ok(ValidatedAction::Wager(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stud_limits() {
        let l = WagerLimits::stud(25, 0, 100);
        assert!(validate_action(0, 0, 1000, &l, A::Bet(25)).is_ok());
        assert!(validate_action(0, 0, 1000, &l, A::Bet(30)).is_err());
        assert!(validate_action(0, 0, 1000, &l, A::Bet(125)).is_err());
        assert!(validate_action(0, 0, 1000, &l, A::Raise(50)).is_err());
    }

    #[test]
    fn apply_action_moves_the_turn() {
        let mut pm = PotManager::new(0);
        pm.seat_participant(1, 500).unwrap();
        pm.seat_participant(2, 500).unwrap();
        pm.finish_seating_participants();
        let l = WagerLimits::pot_limit(&pm, 0, 25);
        assert_eq!(
            apply_action(&mut pm, 1, &l, A::Check),
            Err(GameError::not_your_turn())
        );
        apply_action(&mut pm, 0, &l, A::Check).unwrap();
        assert_eq!(pm.current_seat(), Some(1));
    }

    #[test]
    fn short_stack_may_go_all_in_below_minimum() {
        let l = WagerLimits::stud(25, 50, 400);
        assert_eq!(
            validate_action(0, 50, 60, &l, A::Raise(60)),
            Ok(ValidatedAction::Wager(60))
        );
    }
}
