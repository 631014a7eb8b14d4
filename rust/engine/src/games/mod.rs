//! One module per card game. Every engine implements
//! [`Playable`](crate::game::Playable) and [`Tickable`](crate::game::Tickable).

pub mod acey_deucey;
pub mod guts;
pub mod holdem;
pub mod little_l;
pub mod pass_the_poop;
pub mod seven_card;
