use std::time::{Duration, Instant};

use cardroom_engine::analyzer::HandCategory;
use cardroom_engine::cards::parse_cards;
use cardroom_engine::config::LittleLConfig;
use cardroom_engine::deck::Deck;
use cardroom_engine::errors::GameError;
use cardroom_engine::game::{PayloadIn, Playable, Tickable};
use cardroom_engine::games::little_l::{LittleL, LittleLState};

// p1 14s 14h 2c 7d, p2 3c 5d 9h 11s; community 14d 8c 4h
const TRIPS_VS_STRAIGHT: &str = "14s,3c,14h,5d,2c,9h,7d,11s,14d,8c,4h";

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

fn dealt(cards: &str, clock: &mut Clock) -> LittleL {
    let deck = Deck::from_cards(parse_cards(cards).unwrap());
    let mut g = LittleL::with_deck(&[1, 2], LittleLConfig::default(), deck).unwrap();
    assert!(g.tick_at(clock.step()).unwrap());
    assert_eq!(g.state(), LittleLState::Trade);
    g
}

fn keep(g: &mut LittleL, player: u64) {
    g.action(player, &PayloadIn::new("trade")).unwrap();
}

fn trade(cards: Vec<u64>) -> PayloadIn {
    PayloadIn::new("trade").with("cards", cards)
}

fn check_around(g: &mut LittleL) {
    while let Some(p) = g.current_player() {
        g.action(p, &PayloadIn::new("check")).unwrap();
    }
}

#[test]
fn traded_cards_are_replaced_from_the_deck() {
    let mut clock = Clock::new();
    let mut g = dealt("2c,3c,4c,5c,6c,7c,8c,9c,13h,10d,11d,12d,14d", &mut clock);
    assert_eq!(g.snapshot(1).trade_ins, vec![0, 1, 2]);

    g.action(1, &trade(vec![0, 1])).unwrap();
    assert_eq!(
        g.hand_of(1).unwrap(),
        parse_cards("6c,8c,13h,10d").unwrap().as_slice()
    );
    let view = g.snapshot(1);
    assert!(view.participants[0].has_traded);
    assert!(view.actions.is_empty());
    assert_eq!(g.snapshot(2).actions, vec!["trade"]);
    assert_eq!(g.state(), LittleLState::Trade);
}

#[test]
fn trades_outside_the_rules_are_rejected() {
    let mut clock = Clock::new();
    let mut g = dealt(TRIPS_VS_STRAIGHT, &mut clock);
    assert!(matches!(
        g.action(1, &trade(vec![0, 1, 2])),
        Err(GameError::IllegalAction(_))
    ));
    assert!(matches!(
        g.action(1, &trade(vec![0, 7])),
        Err(GameError::IllegalAction(_))
    ));
    assert!(matches!(
        g.action(1, &PayloadIn::new("check")),
        Err(GameError::Turn(_))
    ));
    keep(&mut g, 1);
    assert!(matches!(
        g.action(1, &trade(vec![0])),
        Err(GameError::IllegalAction(_))
    ));
}

#[test]
fn community_cards_turn_one_per_stage() {
    let mut clock = Clock::new();
    let mut g = dealt(TRIPS_VS_STRAIGHT, &mut clock);
    keep(&mut g, 1);
    keep(&mut g, 2);
    assert_eq!(g.state(), LittleLState::FirstBetting);
    assert_eq!(g.current_player(), Some(1));
    let community = g.snapshot(2).community;
    assert_eq!(community[0], Some("14d".parse().unwrap()));
    assert_eq!(&community[1..], &[None, None]);

    check_around(&mut g);
    assert!(g.tick_at(clock.step()).unwrap());
    assert_eq!(g.state(), LittleLState::SecondBetting);
    assert_eq!(g.snapshot(1).community[1], Some("8c".parse().unwrap()));

    check_around(&mut g);
    assert!(g.tick_at(clock.step()).unwrap());
    assert_eq!(g.state(), LittleLState::ThirdBetting);
    assert!(g.snapshot(1).community.iter().all(Option::is_some));

    check_around(&mut g);
    assert!(g.tick_at(clock.step()).unwrap());
    assert_eq!(g.state(), LittleLState::End);
}

#[test]
fn best_three_cards_win_at_showdown() {
    let mut clock = Clock::new();
    let mut g = dealt(TRIPS_VS_STRAIGHT, &mut clock);
    keep(&mut g, 1);
    keep(&mut g, 2);
    while g.state() != LittleLState::End {
        check_around(&mut g);
        assert!(g.tick_at(clock.step()).unwrap());
    }
    assert_eq!(
        g.best_hand_for(0).category,
        HandCategory::ThreeCardPokerThreeOfAKind
    );
    assert_eq!(g.best_hand_for(1).category, HandCategory::ThreeCardPokerStraight);

    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 25);
    assert_eq!(details.balance_adjustments[&2], -25);
    assert!(g.snapshot(1).participants[1].cards.iter().all(Option::is_some));
}

#[test]
fn betting_is_pot_limit_from_the_ante() {
    let mut clock = Clock::new();
    let mut g = dealt(TRIPS_VS_STRAIGHT, &mut clock);
    keep(&mut g, 1);
    keep(&mut g, 2);
    assert!(matches!(
        g.action(1, &PayloadIn::with_amount("bet", 75)),
        Err(GameError::IllegalAction(_))
    ));
    assert!(matches!(
        g.action(1, &PayloadIn::with_amount("bet", 10)),
        Err(GameError::IllegalAction(_))
    ));
    g.action(1, &PayloadIn::with_amount("bet", 50)).unwrap();
    g.action(2, &PayloadIn::new("fold")).unwrap();

    assert_eq!(g.state(), LittleLState::End);
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 25);
    assert_eq!(details.balance_adjustments[&2], -25);
    assert!(!g.tick_at(clock.step()).unwrap());
}
