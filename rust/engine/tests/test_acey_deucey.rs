use std::time::{Duration, Instant};

use cardroom_engine::cards::parse_cards;
use cardroom_engine::config::{AceyDeuceyConfig, AceyDeuceyGameType};
use cardroom_engine::deck::Deck;
use cardroom_engine::errors::GameError;
use cardroom_engine::game::{PayloadIn, Playable, Tickable};
use cardroom_engine::games::acey_deucey::{AceyDeucey, SingleGameState};

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

fn stacked(cards: &str, ante: i64, game_type: AceyDeuceyGameType) -> AceyDeucey {
    let config = AceyDeuceyConfig {
        ante,
        game_type,
        ..AceyDeuceyConfig::default()
    };
    let deck = Deck::from_cards(parse_cards(cards).unwrap());
    AceyDeucey::with_deck(&[1, 2], config, deck).unwrap()
}

fn state(g: &AceyDeucey) -> SingleGameState {
    g.round().game().state
}

#[test]
fn half_pot_on_a_gap_of_two() {
    let mut g = stacked("5c,7s,6d", 500, AceyDeuceyGameType::Standard);
    assert_eq!(g.pot(), 1000);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::PendingBet);
    assert!(g.snapshot(1).actions.contains(&"betHalfPot".to_string()));

    g.action(1, &PayloadIn::new("bet").with("halfPot", true)).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round().game().adjustment, -500);
    assert_eq!(g.pot(), 500);
    assert_eq!(g.balance(1), Some(0));
    assert_eq!(g.balance(2), Some(-500));
}

#[test]
fn half_pot_miss_costs_the_half_pot() {
    let mut g = stacked("5c,7s,14d", 500, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    g.action(1, &PayloadIn::new("bet").with("halfPot", true)).unwrap();
    assert_eq!(g.round().game().bet.map(|b| b.amount), Some(500));
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round().game().adjustment, 500);
    assert_eq!(g.pot(), 1500);
    assert_eq!(g.balance(1), Some(-1000));
}

#[test]
fn half_pot_on_the_post_pays_double() {
    let mut g = stacked("5c,7s,7d", 500, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    g.action(1, &PayloadIn::new("betHalfPot")).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round().game().adjustment, 1000);
    assert_eq!(g.pot(), 2000);
    assert_eq!(g.balance(1), Some(-1500));
    assert_eq!(state(&g), SingleGameState::RoundOver);
}

#[test]
fn half_pot_needs_a_gap_of_two() {
    let mut g = stacked("3c,9s,6d", 100, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert!(matches!(
        g.action(1, &PayloadIn::new("betHalfPot")),
        Err(GameError::IllegalAction(_))
    ));
    assert!(matches!(
        g.action(1, &PayloadIn::with_amount("bet", 250)),
        Err(GameError::IllegalAction(_))
    ));
    assert_eq!(
        g.action(2, &PayloadIn::with_amount("bet", 50)),
        Err(GameError::not_your_turn())
    );
}

#[test]
fn hitting_the_post_pays_double() {
    let mut g = stacked("3c,9d,9s", 100, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    g.action(1, &PayloadIn::with_amount("bet", 50)).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.pot(), 300);
    assert_eq!(g.balance(1), Some(-200));
    assert_eq!(state(&g), SingleGameState::RoundOver);
}

#[test]
fn low_ace_widens_the_gap() {
    let mut g = stacked("14c,9d,5h", 100, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::PendingAceDecision);
    assert!(!g.tick_at(clock.step()).unwrap());

    g.action(1, &PayloadIn::new("setAce").with("aceHigh", false)).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round().game().gap(), Some(8));
    g.action(1, &PayloadIn::with_amount("bet", 100)).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.pot(), 100);
    assert_eq!(g.balance(1), Some(0));
}

#[test]
fn matching_outer_cards_start_a_double_game() {
    let mut g = stacked("5c,5d,10h,7s", 100, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.round().games.len(), 2);
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::PendingBet);
    assert_eq!(g.round().game().last_card, Some("10h".parse().unwrap()));
    g.action(1, &PayloadIn::with_amount("bet", 100)).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::GameOver);
    assert!(g.round().has_next());
}

#[test]
fn chaos_deals_again_on_a_free_card() {
    let mut g = stacked("5c,6d,9h", 100, AceyDeuceyGameType::Chaos);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::FirstCardDealt);
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::PendingBet);
    assert_eq!(g.round().game().last_card, Some("9h".parse().unwrap()));
}

#[test]
fn free_card_ends_the_turn_in_a_standard_game() {
    let mut g = stacked("5c,6d", 100, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(state(&g), SingleGameState::RoundOver);
    assert_eq!(g.pot(), 200);
}

#[test]
fn emptying_the_pot_ends_the_game() {
    let mut g = stacked("3c,9d,5h", 100, AceyDeuceyGameType::Standard);
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    g.action(1, &PayloadIn::with_amount("bet", 200)).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert!(g.is_game_over());
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&1], 100);
    assert_eq!(details.balance_adjustments[&2], -100);
    assert!(!g.tick_at(clock.step()).unwrap());
}

#[test]
fn pass_is_a_zero_bet_when_allowed() {
    let config = AceyDeuceyConfig {
        allow_pass: true,
        ..AceyDeuceyConfig::default()
    };
    let deck = Deck::from_cards(parse_cards("3c,9d,5h").unwrap());
    let mut g = AceyDeucey::with_deck(&[1, 2], config, deck).unwrap();
    let mut clock = Clock::new();
    g.tick_at(clock.step()).unwrap();
    g.tick_at(clock.step()).unwrap();
    g.action(1, &PayloadIn::new("pass")).unwrap();
    g.tick_at(clock.step()).unwrap();
    assert_eq!(g.pot(), 200);
    assert_eq!(g.balance(1), Some(-100));
}
