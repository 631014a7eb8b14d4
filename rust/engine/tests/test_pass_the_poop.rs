use std::time::{Duration, Instant};

use cardroom_engine::cards::parse_cards;
use cardroom_engine::config::{PassThePoopConfig, PoopEdition};
use cardroom_engine::deck::Deck;
use cardroom_engine::errors::GameError;
use cardroom_engine::game::{PayloadIn, Playable, Tickable};
use cardroom_engine::games::pass_the_poop::edition::FLIPPED;
use cardroom_engine::games::pass_the_poop::{PassThePoop, PoopPhase};

fn stacked(players: &[u64], cards: &str, lives: u32, edition: PoopEdition) -> PassThePoop {
    let config = PassThePoopConfig {
        lives,
        edition,
        ..PassThePoopConfig::default()
    };
    let deck = Deck::from_cards(parse_cards(cards).unwrap());
    PassThePoop::with_deck(players, config, deck).unwrap()
}

fn act(g: &mut PassThePoop, player: u64, action: &str) {
    g.action(player, &PayloadIn::new(action)).unwrap();
}

fn later() -> Instant {
    Instant::now() + Duration::from_secs(60)
}

#[test]
fn king_blocks_a_trade_and_dealer_draws_from_the_deck() {
    let mut g = stacked(&[1, 2, 3], "10c,2c,13c,13h", 3, PoopEdition::Standard);
    act(&mut g, 1, "stay");
    act(&mut g, 2, "trade");

    let king = g.card_of(3).unwrap();
    assert!(king.has_bit(FLIPPED));
    assert!(king.is_face_up());
    assert_eq!(g.card_of(2), Some("2c".parse().unwrap()));
    assert_eq!(g.current_player(), Some(3));
    assert!(g.snapshot(1).participants[2].is_flipped);

    act(&mut g, 3, "goToDeck");
    act(&mut g, 3, "drawFromDeck");
    assert_eq!(g.card_of(3), Some("13h".parse().unwrap()));
    assert_eq!(g.phase(), PoopPhase::RoundOver);
    assert_eq!(g.lives(1), Some(3));
    assert_eq!(g.lives(2), Some(2));
    assert_eq!(g.lives(3), Some(3));
}

#[test]
fn a_king_cannot_be_traded_away() {
    let mut g = stacked(&[1, 2, 3], "13d,2c,5c", 3, PoopEdition::Standard);
    assert!(matches!(
        g.action(1, &PayloadIn::new("trade")),
        Err(GameError::IllegalAction(_))
    ));
    act(&mut g, 1, "flipKing");
    assert_eq!(g.current_player(), Some(2));
}

#[test]
fn draw_requires_going_to_the_deck() {
    let mut g = stacked(&[1, 2], "9c,4d,6h", 3, PoopEdition::Standard);
    act(&mut g, 1, "stay");
    assert!(matches!(
        g.action(2, &PayloadIn::new("drawFromDeck")),
        Err(GameError::IllegalAction(_))
    ));
    assert_eq!(
        g.action(1, &PayloadIn::new("stay")),
        Err(GameError::not_your_turn())
    );
}

#[test]
fn last_player_standing_wins_the_antes() {
    let mut g = stacked(&[1, 2], "5c,9d", 1, PoopEdition::Standard);
    act(&mut g, 1, "stay");
    act(&mut g, 2, "stay");
    assert_eq!(g.phase(), PoopPhase::GameOver);
    assert_eq!(g.pot(), 0);
    let details = g.end_of_game_details().unwrap();
    assert_eq!(details.balance_adjustments[&2], 25);
    assert_eq!(details.balance_adjustments[&1], -25);
    assert!(!g.tick_at(later()).unwrap());
}

#[test]
fn eliminated_players_leave_and_the_deal_rotates() {
    let mut g = stacked(&[1, 2, 3], "9c,2d,6h", 1, PoopEdition::Standard);
    for p in 1..=3 {
        act(&mut g, p, "stay");
    }
    assert_eq!(g.lives(2), Some(0));
    assert_eq!(g.phase(), PoopPhase::RoundOver);
    assert!(g.tick_at(later()).unwrap());
    assert_eq!(g.round(), 2);
    assert_eq!(g.phase(), PoopPhase::Playing);
    assert_eq!(g.seating(), vec![3, 1]);
    assert_eq!(g.current_player(), Some(3));
    assert!(g.card_of(2).is_none());
}

#[test]
fn all_cards_tied_replays_the_round() {
    let mut g = stacked(&[1, 2, 3], "5c,5d,5h", 2, PoopEdition::Standard);
    for p in 1..=3 {
        act(&mut g, p, "stay");
    }
    assert_eq!(g.phase(), PoopPhase::RoundOver);
    for p in 1..=3 {
        assert_eq!(g.lives(p), Some(2));
    }
    g.tick_at(later()).unwrap();
    assert_eq!(g.seating(), vec![1, 2, 3]);
}

#[test]
fn pairs_edition_keeps_the_pair_safe() {
    let mut g = stacked(&[1, 2, 3], "7c,7d,3h", 3, PoopEdition::Pairs);
    for p in 1..=3 {
        act(&mut g, p, "stay");
    }
    assert_eq!(g.lives(1), Some(3));
    assert_eq!(g.lives(2), Some(3));
    assert_eq!(g.lives(3), Some(2));
}

#[test]
fn diarrhea_ace_passed_back_costs_a_life() {
    let mut g = stacked(&[1, 2, 3], "6c,14d,9h", 3, PoopEdition::Diarrhea);
    act(&mut g, 1, "trade");
    act(&mut g, 2, "accept");
    assert_eq!(g.lives(1), Some(2));
    assert_eq!(g.card_of(1), Some("14d".parse().unwrap()));
}
