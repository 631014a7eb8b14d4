use std::time::{Duration, Instant};

use cardroom_engine::cards::{parse_cards, Rank, PRIVATE_WILD};
use cardroom_engine::config::{SevenCardConfig, SevenCardVariant};
use cardroom_engine::deck::Deck;
use cardroom_engine::errors::GameError;
use cardroom_engine::game::{PayloadIn, Playable, Tickable};
use cardroom_engine::games::seven_card::{SevenCard, SevenCardRound};

// p1 holds a pair of aces, p2 queen high; p2's only hole spade is the 8s
const ACES_OVER_QUEEN: &str = "14c,2d,14d,3h,5s,7c,9c,10d,11h,12s,13d,4c,6h,8s";

// p1 holds the Mushroom in the hole; nobody has an antidote
const HIDDEN_MUSHROOM: &str = "4c,5d,6h,7c,8d,9h,10c,11d,12h";

struct Clock(Instant);

impl Clock {
    fn new() -> Self {
        Clock(Instant::now())
    }

    fn step(&mut self) -> Instant {
        self.0 += Duration::from_secs(10);
        self.0
    }
}

fn stacked(players: &[u64], cards: &str, variant: SevenCardVariant) -> SevenCard {
    let config = SevenCardConfig {
        variant,
        ..SevenCardConfig::default()
    };
    let deck = Deck::from_cards(parse_cards(cards).unwrap());
    SevenCard::with_deck(players, config, deck).unwrap()
}

fn check_around(g: &mut SevenCard) {
    while let Some(p) = g.current_player() {
        g.action(p, &PayloadIn::new("check")).unwrap();
    }
}

fn play_to_showdown(g: &mut SevenCard) {
    let mut clock = Clock::new();
    loop {
        check_around(g);
        if g.round() == SevenCardRound::GameOver {
            break;
        }
        assert!(g.tick_at(clock.step()).unwrap());
    }
}

#[test]
fn checked_down_hand_goes_to_the_best_seven() {
    let mut g = stacked(&[1, 2], ACES_OVER_QUEEN, SevenCardVariant::Stud);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round(), SevenCardRound::FirstBetting);
    assert_eq!(g.current_player(), Some(1));
    check_around(&mut g);

    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round(), SevenCardRound::SecondBetting);
    // 10d 7c showing beats 9c 5s
    assert_eq!(g.current_player(), Some(2));

    play_to_showdown(&mut g);
    assert_eq!(g.hand_of(1).map(<[_]>::len), Some(7));
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 25);
    assert_eq!(details.balance_adjustments[&2], -25);
}

#[test]
fn stud_wagers_follow_the_ante() {
    let mut g = stacked(&[1, 2], ACES_OVER_QUEEN, SevenCardVariant::Stud);
    g.tick_at(Clock::new().step()).unwrap();
    assert!(matches!(
        g.action(1, &PayloadIn::with_amount("bet", 30)),
        Err(GameError::IllegalAction(_))
    ));
    g.action(1, &PayloadIn::with_amount("bet", 25)).unwrap();
    assert!(matches!(
        g.action(2, &PayloadIn::with_amount("raise", 25)),
        Err(GameError::IllegalAction(_))
    ));
    assert!(matches!(
        g.action(2, &PayloadIn::with_amount("raise", 125)),
        Err(GameError::IllegalAction(_))
    ));
    g.action(2, &PayloadIn::with_amount("raise", 75)).unwrap();
    g.action(1, &PayloadIn::new("call")).unwrap();
    assert_eq!(g.pot_manager().total(), 200);
    assert_eq!(g.current_player(), None);
}

#[test]
fn high_chicago_splits_with_the_best_hole_spade() {
    let mut g = stacked(&[1, 2], ACES_OVER_QUEEN, SevenCardVariant::HighChicago);
    play_to_showdown(&mut g);
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 0);
    assert_eq!(details.balance_adjustments[&2], 0);
}

#[test]
fn follow_the_queen_makes_the_next_rank_wild() {
    let mut g = stacked(&[1, 2], "2c,3d,5c,6d,12h,7c", SevenCardVariant::FollowTheQueen);
    g.tick_at(Clock::new().step()).unwrap();
    assert_eq!(g.variant_state().follow_rank, Some(Rank::Seven));
    assert_eq!(g.variant_state().splashes.len(), 2);
    let p2 = g.hand_of(2).unwrap();
    assert!(p2[2].is_wild);
    assert!(!p2[0].is_wild);
    assert!(g.hand_of(1).unwrap()[2].is_wild);
    assert_eq!(g.snapshot(1).wilds, vec!["Queens", "Sevens"]);
}

#[test]
fn baseball_four_earns_an_extra_hole_card() {
    let mut g = stacked(&[1, 2], "2c,3d,5c,6d,4h,8c,7s", SevenCardVariant::Baseball);
    g.tick_at(Clock::new().step()).unwrap();
    let p1 = g.hand_of(1).unwrap();
    assert_eq!(p1.len(), 4);
    assert!(!p1[3].is_face_up());
    let p2 = g.hand_of(2).unwrap();
    assert_eq!(p2.len(), 3);
    assert!(p2[0].is_wild);
}

#[test]
fn mushroom_folds_neighbors_without_an_antidote() {
    let mut g = stacked(&[1, 2, 3], "2c,5d,6h,7c,8d,9h,4c,10d,11h", SevenCardVariant::Chiggs);
    g.tick_at(Clock::new().step()).unwrap();
    assert_eq!(g.round(), SevenCardRound::GameOver);
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 50);
    assert_eq!(details.balance_adjustments[&2], -25);
}

#[test]
fn antidote_saves_a_neighbor() {
    let mut g = stacked(&[1, 2, 3], "2c,4d,5c,6c,7d,8c,4c,9d,10c", SevenCardVariant::Chiggs);
    g.tick_at(Clock::new().step()).unwrap();
    assert_eq!(g.current_player(), None);
    assert_eq!(g.snapshot(1).mushroom_pending, vec![2]);
    assert!(g.snapshot(2).actions.contains(&"playAntidote".to_string()));
    assert!(g.snapshot(3).participants[2].did_fold);
    assert!(matches!(
        g.action(1, &PayloadIn::new("check")),
        Err(GameError::Turn(_))
    ));

    g.action(2, &PayloadIn::new("playAntidote")).unwrap();
    assert_eq!(g.hand_of(2).map(<[_]>::len), Some(2));
    assert_eq!(g.current_player(), Some(1));
    assert!(g.snapshot(1).mushroom_pending.is_empty());
}

#[test]
fn declining_the_antidote_folds() {
    let mut g = stacked(&[1, 2, 3], "2c,4d,5c,6c,7d,8c,4c,9d,10c", SevenCardVariant::Chiggs);
    g.tick_at(Clock::new().step()).unwrap();
    g.action(2, &PayloadIn::new("declineAntidote")).unwrap();
    assert_eq!(g.round(), SevenCardRound::GameOver);
    assert_eq!(g.end_of_game_details().unwrap().balance_adjustments[&1], 50);
}

#[test]
fn flipping_the_mushroom_before_any_bet_starts_the_event() {
    let mut g = stacked(&[1, 2, 3], HIDDEN_MUSHROOM, SevenCardVariant::Chiggs);
    g.tick_at(Clock::new().step()).unwrap();
    assert_eq!(g.round(), SevenCardRound::FirstBetting);
    assert!(g.snapshot(1).actions.contains(&"flipMushroom".to_string()));
    assert!(!g.snapshot(2).actions.contains(&"flipMushroom".to_string()));

    g.action(1, &PayloadIn::new("flipMushroom")).unwrap();
    assert_eq!(g.hand_of(1).map(<[_]>::len), Some(2));
    assert_eq!(g.round(), SevenCardRound::GameOver);
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 50);
    assert_eq!(details.balance_adjustments[&2], -25);
    assert_eq!(details.balance_adjustments[&3], -25);
}

#[test]
fn mushroom_locks_once_anyone_bets() {
    let mut g = stacked(&[1, 2, 3], HIDDEN_MUSHROOM, SevenCardVariant::Chiggs);
    g.tick_at(Clock::new().step()).unwrap();
    assert_eq!(g.current_player(), Some(1));
    g.action(1, &PayloadIn::new("check")).unwrap();
    g.action(2, &PayloadIn::with_amount("bet", 25)).unwrap();

    assert!(!g.snapshot(1).actions.contains(&"flipMushroom".to_string()));
    assert_eq!(
        g.action(1, &PayloadIn::new("flipMushroom")),
        Err(GameError::illegal("the Mushroom is locked once betting starts"))
    );
    assert_eq!(g.hand_of(1).map(<[_]>::len), Some(3));
    assert_eq!(g.round(), SevenCardRound::FirstBetting);
}

#[test]
fn low_card_wild_is_hidden_from_other_viewers() {
    // p1 holds 5c 9d down with 5h up; p2 holds 2d 3s down with 13c up
    let mut g = stacked(&[1, 2], "5c,2d,9d,3s,5h,13c", SevenCardVariant::LowCardWild);
    g.tick_at(Clock::new().step()).unwrap();
    let p1 = g.hand_of(1).unwrap();
    assert!(p1[0].is_wild);
    assert!(p1[2].is_wild);
    assert!(p1[2].has_bit(PRIVATE_WILD));
    assert!(!p1[1].is_wild);

    let own = g.snapshot(1).participants[0].cards[2].unwrap();
    assert!(own.is_wild);
    let seen = g.snapshot(2).participants[0].cards.clone();
    assert_eq!(seen[0], None);
    let up = seen[2].unwrap();
    assert_eq!(up, "5h".parse().unwrap());
    assert!(!up.is_wild);
    assert!(!up.has_bit(PRIVATE_WILD));
    assert_eq!(g.snapshot(2).wilds, vec!["Lowest hole card"]);
}

#[test]
fn coupons_tens_rewild_cards_already_dealt() {
    // p1 3c 4d down, 7h up then 10s; p2 2c 6d down, 8s up then 10d
    let mut g = stacked(
        &[1, 2],
        "3c,2c,4d,6d,7h,8s,10s,10d",
        SevenCardVariant::CouponsAndClippings,
    );
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    assert!(g.hand_of(1).unwrap()[0].is_wild);
    assert!(!g.hand_of(2).unwrap()[0].is_wild);
    assert_eq!(g.snapshot(1).wilds, vec!["Threes"]);

    check_around(&mut g);
    assert!(g.tick_at(clock.step()).unwrap());
    assert_eq!(g.round(), SevenCardRound::SecondBetting);
    assert!(!g.hand_of(1).unwrap()[0].is_wild);
    assert!(g.hand_of(2).unwrap()[0].is_wild);
    assert_eq!(g.snapshot(1).wilds, vec!["Twos"]);
    assert_eq!(g.variant_state().splashes.len(), 2);
}
