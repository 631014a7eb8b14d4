//! # cardroom-engine: Card Room Rules Engines
//!
//! Rules engines for a multi-game card room. Each game is a deterministic
//! state machine driven by player commands and a cooperative dealer tick;
//! transport, persistence and lobbies live outside this crate.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card, rank and suit types with the `[!]<rank><suit>` text form
//! - [`deck`] - Seeded ChaCha20 deck with discard reshuffles and a SHA-1 fingerprint
//! - [`hand`] - Ordered card holdings
//! - [`analyzer`] - Poker hand classification with wild and constrained wild cards
//! - [`pot`] - Antes, blinds, action order, side pots and tiered payouts
//! - [`rules`] - Bet and raise validation for stud and pot-limit structures
//! - [`game`] - The `Playable`/`Tickable` contracts and the dealer scheduler
//! - [`games`] - Seven-card, hold'em, Guts, Acey-Deucey, Pass the Poop, Little L
//! - [`config`] - Per-engine configuration loaded from TOML or JSON
//! - [`logger`] - Game log messages and the non-blocking log bus
//! - [`logging`] - `tracing` setup and a capture layer for tests
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use cardroom_engine::analyzer::{best_hand, HandCategory};
//! use cardroom_engine::cards::parse_cards;
//!
//! let cards = parse_cards("14h,13h,12h,11h,10h,2c,3d").unwrap();
//! assert_eq!(best_hand(&cards, 5).category, HandCategory::RoyalFlush);
//! ```
//!
//! ## Deterministic Dealing
//!
//! The same seed always produces the same deck:
//!
//! ```rust
//! use cardroom_engine::deck::Deck;
//!
//! let deck1 = Deck::new_with_seed(42);
//! let deck2 = Deck::new_with_seed(42);
//! assert_eq!(deck1.cards(), deck2.cards());
//! ```
//!
//! ## Running a Game
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use cardroom_engine::config::GutsConfig;
//! use cardroom_engine::game::{PayloadIn, Playable, Tickable};
//! use cardroom_engine::games::guts::Guts;
//!
//! let mut guts = Guts::new(&[1, 2], GutsConfig::default(), 7).unwrap();
//! guts.action(1, &PayloadIn::new("out")).unwrap();
//! guts.action(2, &PayloadIn::new("in")).unwrap();
//! guts.tick_at(Instant::now() + Duration::from_secs(2)).unwrap();
//! assert!(guts.end_of_game_details().is_some());
//! ```

pub mod analyzer;
pub mod cards;
pub mod config;
pub mod deck;
pub mod errors;
pub mod game;
pub mod games;
pub mod hand;
pub mod logger;
pub mod logging;
pub mod player;
pub mod pot;
pub mod rules;
