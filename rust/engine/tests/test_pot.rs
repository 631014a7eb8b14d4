use cardroom_engine::errors::GameError;
use cardroom_engine::player::{PlayerAction, PlayerId};
use cardroom_engine::pot::PotManager;
use cardroom_engine::rules::{apply_action, ValidatedAction, WagerLimits};

fn table(balances: &[i64], ante: i64) -> PotManager {
    let mut pm = PotManager::new(ante);
    for (i, &b) in balances.iter().enumerate() {
        pm.seat_participant(i as PlayerId + 1, b).unwrap();
    }
    pm.finish_seating_participants();
    pm
}

fn chips(pm: &PotManager) -> i64 {
    pm.seats().iter().map(|s| s.balance).sum::<i64>() + pm.total()
}

#[test]
fn short_stack_all_in_opens_a_side_pot() {
    let mut pm = table(&[10, 10, 5, 10], 0);
    pm.bet_or_raise(0, 10).unwrap();
    pm.call(1).unwrap();
    pm.call(2).unwrap();
    pm.call(3).unwrap();
    assert!(pm.is_round_over());
    pm.next_round(0);

    let pots = pm.pots();
    assert_eq!(pots.len(), 2);
    assert_eq!(pots[0].amount, 20);
    assert_eq!(pots[0].all_in_seats, vec![2]);
    assert_eq!(pots[1].amount, 15);
    assert_eq!(pots[1].all_in_seats, vec![0, 1, 3]);
}

#[test]
fn side_pot_goes_to_the_best_eligible_hand() {
    let mut pm = table(&[10, 10, 5, 10], 0);
    pm.bet_or_raise(0, 10).unwrap();
    pm.call(1).unwrap();
    pm.call(2).unwrap();
    pm.call(3).unwrap();
    let won = pm.pay_winners(&[vec![2], vec![3], vec![0, 1]]);
    assert_eq!(won, vec![0, 0, 20, 15]);
    assert_eq!(pm.pots_total(), 0);
    assert!(pm.is_game_over());
}

#[test]
fn chips_are_conserved_through_a_hand() {
    let mut pm = table(&[1000, 600, 1000], 25);
    let start = chips(&pm);
    assert_eq!(pm.total(), 75);
    pm.bet_or_raise(0, 100).unwrap();
    pm.bet_or_raise(1, 575).unwrap();
    pm.call(2).unwrap();
    pm.call(0).unwrap();
    assert_eq!(chips(&pm), start);
    pm.next_round(0);
    assert_eq!(chips(&pm), start);
    pm.pay_winners(&[vec![0, 2], vec![1]]);
    assert_eq!(chips(&pm), start);
    assert_eq!(pm.total(), 0);
}

#[test]
fn split_pots_pay_whole_units_first() {
    let mut pm = table(&[1000, 1000, 1000], 25);
    let won = pm.pay_winners(&[vec![0, 1]]);
    assert_eq!(won, vec![50, 25, 0]);
}

#[test]
fn pot_limit_caps_a_raise() {
    let mut pm = table(&[10_000, 10_000, 10_000], 25);
    pm.bet_or_raise(0, 100).unwrap();
    // 100 live bet + 75 antes + 100 in play + 100 to call
    assert_eq!(pm.pot_limit_max_bet(1), 375);
    let limits = WagerLimits::pot_limit(&pm, 1, 50);
    let too_big = apply_action(&mut pm, 1, &limits, PlayerAction::Raise(400));
    assert!(matches!(too_big, Err(GameError::IllegalAction(_))));
    let ok = apply_action(&mut pm, 1, &limits, PlayerAction::Raise(375));
    assert_eq!(ok, Ok(ValidatedAction::Wager(375)));
    assert_eq!(pm.current_seat(), Some(2));
}

#[test]
fn folding_to_one_player_ends_the_hand() {
    let mut pm = table(&[500, 500, 500], 25);
    pm.fold(0).unwrap();
    assert!(!pm.is_game_over());
    pm.fold(1).unwrap();
    assert!(pm.is_game_over());
    assert_eq!(pm.alive_count(), 1);
}

#[test]
fn betting_closes_when_everyone_else_is_all_in() {
    let mut pm = table(&[1000, 200], 0);
    pm.bet_or_raise(0, 500).unwrap();
    pm.call(1).unwrap();
    assert!(pm.seats()[1].is_all_in);
    assert!(pm.betting_closed());
}
