//! Seven-card variant rules.
//!
//! A [`VariantState`] decides which cards are wild, reacts to face-up cards
//! as they are dealt and picks the High Chicago split. Rule changes made by a
//! dealt card are applied to every hand through [`VariantState::rewild_hand`].

use serde::Serialize;

use crate::cards::{Card, Rank, Suit, GAME_BIT_BASE, PRIVATE_WILD};
use crate::config::SevenCardVariant;
use crate::hand::Hand;
use crate::player::PlayerId;

pub const MUSHROOM: u32 = GAME_BIT_BASE;
pub const ANTIDOTE: u32 = GAME_BIT_BASE << 1;
pub const WAS_DISCARDED: u32 = GAME_BIT_BASE << 2;
pub const LOCKED: u32 = GAME_BIT_BASE << 3;

/// Baseball extras allowed in total once the table is this full.
const BASEBALL_FULL_TABLE: usize = 7;
const BASEBALL_EXTRA_CAP: usize = 3;

/// A player who just received a card that changes the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Splash {
    pub player_id: PlayerId,
    pub card: Card,
    pub message: String,
}

/// What the engine must do after a face-up card lands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DealEffect {
    Nothing,
    /// Wild ranks changed; every hand must be re-evaluated.
    Rewild,
    /// Deal the holder one more card.
    ExtraCard,
    /// A Mushroom is showing; neighbors must answer it.
    Mushroom,
}

/// Neighbors that still owe an answer to a face-up Mushroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MushroomEvent {
    pub owner: usize,
    pub pending: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantState {
    pub kind: SevenCardVariant,
    /// Follow the Queen: the rank following the last face-up queen.
    pub follow_rank: Option<Rank>,
    pub queen_flipped: bool,
    pub extra_cards: usize,
    pub threes_wild: bool,
    pub twos_wild: bool,
    pub splashes: Vec<Splash>,
    pub mushroom_event: Option<MushroomEvent>,
}

impl VariantState {
    pub fn new(kind: SevenCardVariant) -> Self {
        Self {
            kind,
            follow_rank: None,
            queen_flipped: false,
            extra_cards: 0,
            threes_wild: true,
            twos_wild: false,
            splashes: Vec::new(),
            mushroom_event: None,
        }
    }

    /// Called before each street is dealt.
    pub fn start_deal_round(&mut self) {
        self.splashes.clear();
    }

    /// Wildness that does not depend on the holder's other cards.
    pub fn is_wild(&self, card: &Card) -> bool {
        match self.kind {
            SevenCardVariant::Stud
            | SevenCardVariant::HighChicago
            | SevenCardVariant::LowCardWild => false,
            SevenCardVariant::Baseball => matches!(card.rank, Rank::Three | Rank::Nine),
            SevenCardVariant::FollowTheQueen => {
                card.rank == Rank::Queen || self.follow_rank == Some(card.rank)
            }
            SevenCardVariant::CouponsAndClippings => match card.rank {
                Rank::Three => self.threes_wild,
                Rank::Two => self.twos_wild,
                _ => false,
            },
            SevenCardVariant::Chiggs => card.rank == Rank::Four,
        }
    }

    /// Tags a card with variant bits as it comes off the deck.
    pub fn mark(&self, card: &mut Card) {
        if self.kind == SevenCardVariant::Chiggs && card.rank == Rank::Four {
            if card.suit == Suit::Clubs {
                card.set_bit(MUSHROOM);
            } else {
                card.set_bit(ANTIDOTE);
            }
        }
    }

    /// Reacts to a card dealt face up to `player_id`.
    pub fn on_face_up(&mut self, player_id: PlayerId, card: &Card, players: usize) -> DealEffect {
        match self.kind {
            SevenCardVariant::Baseball if card.rank == Rank::Four => {
                if players >= BASEBALL_FULL_TABLE && self.extra_cards >= BASEBALL_EXTRA_CAP {
                    return DealEffect::Nothing;
                }
                self.extra_cards += 1;
                self.splash(player_id, card, "{} gets an extra card for a Four");
                DealEffect::ExtraCard
            }
            SevenCardVariant::FollowTheQueen => {
                if card.rank == Rank::Queen {
                    self.queen_flipped = true;
                    self.follow_rank = None;
                    self.splash(player_id, card, "{} shows a Queen, the next card is wild");
                    DealEffect::Rewild
                } else if self.queen_flipped {
                    self.queen_flipped = false;
                    self.follow_rank = Some(card.rank);
                    let text = format!("{{}} makes {} wild", card.rank.plural());
                    self.splash(player_id, card, &text);
                    DealEffect::Rewild
                } else {
                    DealEffect::Nothing
                }
            }
            SevenCardVariant::CouponsAndClippings => match (card.rank, card.suit) {
                (Rank::Ten, Suit::Spades) if self.threes_wild => {
                    self.threes_wild = false;
                    self.splash(player_id, card, "{} clips the Threes");
                    DealEffect::Rewild
                }
                (Rank::Ten, Suit::Diamonds) if !self.twos_wild => {
                    self.twos_wild = true;
                    self.splash(player_id, card, "{} makes Twos wild");
                    DealEffect::Rewild
                }
                _ => DealEffect::Nothing,
            },
            SevenCardVariant::Chiggs if card.has_bit(MUSHROOM) => {
                self.splash(player_id, card, "{} shows the Mushroom");
                DealEffect::Mushroom
            }
            _ => DealEffect::Nothing,
        }
    }

    fn splash(&mut self, player_id: PlayerId, card: &Card, message: &str) {
        self.splashes.push(Splash {
            player_id,
            card: *card,
            message: message.to_string(),
        });
    }

    /// Recomputes `is_wild` on every card of `hand`.
    pub fn rewild_hand(&self, hand: &mut Hand) {
        if self.kind == SevenCardVariant::LowCardWild {
            let low = hand.face_down().map(|c| c.rank).min();
            for card in hand.cards_mut() {
                let wild = Some(card.rank) == low;
                card.is_wild = wild;
                if wild && card.is_face_up() {
                    card.set_bit(PRIVATE_WILD);
                } else {
                    card.clear_bit(PRIVATE_WILD);
                }
            }
            return;
        }
        for card in hand.cards_mut() {
            card.is_wild = self.is_wild(card);
        }
    }

    /// High Chicago: seats holding the highest spade in the hole.
    pub fn split_pot_winners(&self, hands: &[(usize, &Hand)]) -> Vec<usize> {
        if self.kind != SevenCardVariant::HighChicago {
            return Vec::new();
        }
        let best = hands
            .iter()
            .flat_map(|(_, h)| h.face_down())
            .filter(|c| c.suit == Suit::Spades)
            .map(|c| c.rank)
            .max();
        let Some(best) = best else {
            return Vec::new();
        };
        hands
            .iter()
            .filter(|(_, h)| {
                h.face_down()
                    .any(|c| c.suit == Suit::Spades && c.rank == best)
            })
            .map(|(seat, _)| *seat)
            .collect()
    }

    /// Short description of the current wild cards for snapshots.
    pub fn wild_summary(&self) -> Vec<String> {
        let ranks: Vec<Rank> = match self.kind {
            SevenCardVariant::Baseball => vec![Rank::Three, Rank::Nine],
            SevenCardVariant::FollowTheQueen => {
                let mut r = vec![Rank::Queen];
                r.extend(self.follow_rank);
                r
            }
            SevenCardVariant::CouponsAndClippings => {
                let mut r = Vec::new();
                if self.twos_wild {
                    r.push(Rank::Two);
                }
                if self.threes_wild {
                    r.push(Rank::Three);
                }
                r
            }
            SevenCardVariant::Chiggs => vec![Rank::Four],
            SevenCardVariant::LowCardWild => return vec!["Lowest hole card".to_string()],
            SevenCardVariant::Stud | SevenCardVariant::HighChicago => Vec::new(),
        };
        ranks.into_iter().map(|r| r.plural().to_string()).collect()
    }
}
