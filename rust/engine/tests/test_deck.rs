use std::collections::HashSet;

use cardroom_engine::cards::{full_deck, parse_cards, Card, Rank, Suit};
use cardroom_engine::deck::Deck;
use cardroom_engine::errors::GameError;

#[test]
fn new_deck_is_in_canonical_order() {
    let d = Deck::new();
    assert_eq!(d.cards_left(), 52);
    assert_eq!(d.cards()[0], Card::new(Rank::Two, Suit::Clubs));
    assert_eq!(d.cards()[51], Card::new(Rank::Ace, Suit::Spades));
    // SHA-1 over "2c3c4c5c6c..." (`<rank><suit>` text, no separators)
    assert_eq!(d.hash_code(), "baa521a1f4a79c0db2e22975a095be89cfa6c58b");
}

#[test]
fn same_seed_same_order() {
    let a = Deck::new_with_seed(1);
    let b = Deck::new_with_seed(1);
    assert_eq!(a.cards(), b.cards());
    assert_eq!(a.hash_code(), b.hash_code());
    assert_eq!(a.seed(), 1);
    assert_ne!(a.hash_code(), Deck::new().hash_code());
    assert_ne!(a.cards(), Deck::new_with_seed(2).cards());
}

#[test]
fn shuffle_keeps_every_card_once() {
    let d = Deck::new_with_seed(77);
    let seen: HashSet<Card> = d.cards().iter().copied().collect();
    assert_eq!(seen.len(), 52);
    let all: HashSet<Card> = full_deck().into_iter().collect();
    assert_eq!(seen, all);
}

#[test]
fn reshuffling_a_dealt_deck_restores_all_cards() {
    let mut d = Deck::new_with_seed(5);
    for _ in 0..10 {
        d.draw().unwrap();
    }
    assert_eq!(d.cards_left(), 42);
    d.shuffle(5);
    assert_eq!(d.cards_left(), 52);
    assert_eq!(d.cards(), Deck::new_with_seed(5).cards());
}

#[test]
fn shuffling_a_shuffled_deck_starts_from_canonical_order() {
    let mut d = Deck::new_with_seed(1);
    d.shuffle(1);
    assert_eq!(d.cards(), Deck::new_with_seed(1).cards());
    d.shuffle(9);
    assert_eq!(d.hash_code(), Deck::new_with_seed(9).hash_code());
}

#[test]
fn zero_seed_is_replaced() {
    let mut d = Deck::new();
    let seed = d.shuffle(0);
    assert_ne!(seed, 0);
    assert_eq!(d.seed(), seed);
}

#[test]
fn stacked_deck_draws_from_the_front() {
    let mut d = Deck::from_cards(parse_cards("14s,2c,9h").unwrap());
    assert_eq!(d.draw().unwrap(), "14s".parse().unwrap());
    d.burn().unwrap();
    assert_eq!(d.draw().unwrap(), "9h".parse().unwrap());
    assert!(!d.can_draw(1));
    assert_eq!(d.draw(), Err(GameError::EndOfDeck));
}

#[test]
fn shuffle_discards_strips_table_state() {
    let mut cards = parse_cards("!3c,5d").unwrap();
    cards[1].set_face_up(true);
    let mut d = Deck::from_cards(Vec::new());
    d.shuffle_discards(cards);
    assert_eq!(d.cards_left(), 2);
    assert!(d.cards().iter().all(|c| !c.is_wild && !c.is_face_up()));
}

#[test]
fn remove_card_takes_it_out_of_play() {
    let mut d = Deck::new_with_seed(3);
    let ace = Card::new(Rank::Ace, Suit::Hearts);
    assert!(d.remove_card(&ace));
    assert!(!d.remove_card(&ace));
    assert_eq!(d.cards_left(), 51);
    assert!(!d.cards().contains(&ace));
}
