use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;
use crate::game::PayloadIn;
use crate::hand::Hand;

/// Identifier of a seated player, assigned by the table layer.
pub type PlayerId = u64;

/// Default starting stack for chip-stack games, in cents ($100.00).
pub const DEFAULT_BUY_IN: i64 = 10_000;

/// A wagering decision during a betting round.
/// Bet and raise amounts are the player's new total stake for the round.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerAction {
    /// Fold and forfeit the hand
    Fold,
    /// Check (only valid when nothing is owed)
    Check,
    /// Match the live bet
    Call,
    /// Open the betting to the given total
    Bet(i64),
    /// Raise the live bet to the given total
    Raise(i64),
}

impl PlayerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::Fold => "fold",
            PlayerAction::Check => "check",
            PlayerAction::Call => "call",
            PlayerAction::Bet(_) => "bet",
            PlayerAction::Raise(_) => "raise",
        }
    }

    /// Reads a betting command; `bet` and `raise` need `additionalData.amount`.
    pub fn from_payload(payload: &PayloadIn) -> Result<Self, GameError> {
        Ok(match payload.action.as_str() {
            "fold" => PlayerAction::Fold,
            "check" => PlayerAction::Check,
            "call" => PlayerAction::Call,
            "bet" => PlayerAction::Bet(payload.amount()?),
            "raise" => PlayerAction::Raise(payload.amount()?),
            other => return Err(GameError::payload(format!("unknown action {other:?}"))),
        })
    }
}

/// A seat in a chip-stack game: who sits there and what they hold.
/// Chip accounting lives in the [`crate::pot::PotManager`] seat of the same index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub player_id: PlayerId,
    pub hand: Hand,
    pub did_win: bool,
}

impl Participant {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            hand: Hand::new(),
            did_win: false,
        }
    }

    /// The hand as `viewer` is allowed to see it: face-down cards are hidden
    /// from everyone but the owner.
    pub fn visible_cards(&self, viewer: PlayerId) -> Vec<Option<Card>> {
        self.hand
            .cards()
            .iter()
            .map(|c| {
                if viewer == self.player_id {
                    Some(*c)
                } else if c.is_face_up() {
                    Some(c.public_view())
                } else {
                    None
                }
            })
            .collect()
    }
}
