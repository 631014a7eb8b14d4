use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents one of the four suits in a standard 52-card deck.
/// Declaration order doubles as the tiebreak order: clubs < diamonds < hearts < spades.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    /// Clubs suit (♣)
    Clubs,
    /// Diamonds suit (♦)
    Diamonds,
    /// Hearts suit (♡)
    Hearts,
    /// Spades suit (♠)
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn letter(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
            Suit::Hearts => '♡',
            Suit::Spades => '♠',
        }
    }

    pub fn from_letter(c: char) -> Option<Suit> {
        match c {
            'c' => Some(Suit::Clubs),
            'd' => Some(Suit::Diamonds),
            'h' => Some(Suit::Hearts),
            's' => Some(Suit::Spades),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Represents the rank (face value) of a playing card from Two through Ace.
/// Numeric values 2..=14 are used for comparison and hand evaluation; aces are
/// stored high and only read as 1 when a straight evaluation asks for it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Rank {
    /// Rank 2
    Two = 2,
    /// Rank 3
    Three,
    /// Rank 4
    Four,
    /// Rank 5
    Five,
    /// Rank 6
    Six,
    /// Rank 7
    Seven,
    /// Rank 8
    Eight,
    /// Rank 9
    Nine,
    /// Rank 10
    Ten,
    /// Jack (11)
    Jack,
    /// Queen (12)
    Queen,
    /// King (13)
    King,
    /// Ace (14)
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Rank> {
        match v {
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            14 => Some(Rank::Ace),
            _ => None,
        }
    }

    /// Short glyph used by the render form: `2`..`10`, `J`, `Q`, `K`, `A`.
    pub fn glyph(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }

    pub fn name(self) -> &'static str {
        rank_name(self.value())
    }

    pub fn plural(self) -> &'static str {
        rank_plural(self.value())
    }
}

/// Names a numeric rank, accepting the straight-only low ace (1).
pub(crate) fn rank_name(v: u8) -> &'static str {
    match v {
        1 | 14 => "Ace",
        2 => "Two",
        3 => "Three",
        4 => "Four",
        5 => "Five",
        6 => "Six",
        7 => "Seven",
        8 => "Eight",
        9 => "Nine",
        10 => "Ten",
        11 => "Jack",
        12 => "Queen",
        13 => "King",
        _ => "?",
    }
}

pub(crate) fn rank_plural(v: u8) -> &'static str {
    match v {
        1 | 14 => "Aces",
        2 => "Twos",
        3 => "Threes",
        4 => "Fours",
        5 => "Fives",
        6 => "Sixes",
        7 => "Sevens",
        8 => "Eights",
        9 => "Nines",
        10 => "Tens",
        11 => "Jacks",
        12 => "Queens",
        13 => "Kings",
        _ => "?",
    }
}

impl From<Rank> for u8 {
    fn from(r: Rank) -> u8 {
        r.value()
    }
}

impl TryFrom<u8> for Rank {
    type Error = CardParseError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Rank::from_u8(v).ok_or(CardParseError::InvalidRank(v.to_string()))
    }
}

/// Card is visible to every viewer.
pub const FACE_UP: u32 = 1;
/// Card is wild only for its holder; other viewers see `is_wild == false`.
pub const PRIVATE_WILD: u32 = 1 << 1;
/// First bit available to individual games. Each game defines its own flags
/// from here upward inside its module.
pub const GAME_BIT_BASE: u32 = 1 << 8;

/// A single playing card.
///
/// Equality and hashing only look at `(rank, suit)`; `is_wild` and `bits`
/// describe table state, not card identity.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// The rank of the card (Two through Ace)
    pub rank: Rank,
    /// The suit of the card
    pub suit: Suit,
    /// Whether the card currently substitutes for other cards
    pub is_wild: bool,
    /// Multipurpose flag mask, see [`FACE_UP`], [`PRIVATE_WILD`], [`GAME_BIT_BASE`]
    pub bits: u32,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self {
            rank,
            suit,
            is_wild: false,
            bits: 0,
        }
    }

    pub fn wild(mut self) -> Self {
        self.is_wild = true;
        self
    }

    pub fn face_up(mut self) -> Self {
        self.bits |= FACE_UP;
        self
    }

    pub fn has_bit(&self, bit: u32) -> bool {
        self.bits & bit != 0
    }

    pub fn set_bit(&mut self, bit: u32) {
        self.bits |= bit;
    }

    pub fn clear_bit(&mut self, bit: u32) {
        self.bits &= !bit;
    }

    pub fn is_face_up(&self) -> bool {
        self.has_bit(FACE_UP)
    }

    pub fn set_face_up(&mut self, up: bool) {
        if up {
            self.set_bit(FACE_UP);
        } else {
            self.clear_bit(FACE_UP);
        }
    }

    /// Same card with all table state removed.
    pub fn plain(&self) -> Card {
        Card::new(self.rank, self.suit)
    }

    /// Render form: rank glyph followed by suit glyph, e.g. `A♠` or `10♡`.
    pub fn render(&self) -> String {
        format!("{}{}", self.rank.glyph(), self.suit.glyph())
    }

    /// The card as another viewer sees it: private wildness is hidden.
    pub fn public_view(&self) -> Card {
        let mut c = *self;
        if c.has_bit(PRIVATE_WILD) {
            c.is_wild = false;
            c.clear_bit(PRIVATE_WILD);
        }
        c
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.suit == other.suit
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
        self.suit.hash(state);
    }
}

impl fmt::Display for Card {
    /// Text form `[!]<rank-int><suit-letter>`, e.g. `3c`, `14s`, `!5c`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wild {
            write!(f, "!")?;
        }
        write!(f, "{}{}", self.rank.value(), self.suit.letter())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CardParseError {
    #[error("card text is empty")]
    Empty,
    #[error("invalid rank: {0}")]
    InvalidRank(String),
    #[error("invalid suit in {0:?}")]
    InvalidSuit(String),
}

impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (wild, body) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let suit_ch = body.chars().last().ok_or(CardParseError::Empty)?;
        let suit = Suit::from_letter(suit_ch.to_ascii_lowercase())
            .ok_or_else(|| CardParseError::InvalidSuit(s.to_string()))?;
        let rank_text = &body[..body.len() - suit_ch.len_utf8()];
        let value: u8 = rank_text
            .parse()
            .map_err(|_| CardParseError::InvalidRank(rank_text.to_string()))?;
        let rank = Rank::try_from(value)?;
        let mut card = Card::new(rank, suit);
        card.is_wild = wild;
        Ok(card)
    }
}

/// Parses a comma-separated card list. Empty entries come back as `None`, so
/// positional slots such as undealt community cards survive a round trip.
pub fn cards_from_str(s: &str) -> Result<Vec<Option<Card>>, CardParseError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|part| {
            if part.trim().is_empty() {
                Ok(None)
            } else {
                part.parse().map(Some)
            }
        })
        .collect()
}

/// Like [`cards_from_str`] but drops empty slots.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, CardParseError> {
    Ok(cards_from_str(s)?.into_iter().flatten().collect())
}

/// Inverse of [`cards_from_str`].
pub fn cards_to_string(cards: &[Option<Card>]) -> String {
    cards
        .iter()
        .map(|c| c.map(|c| c.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

/// Canonical unshuffled order: clubs 2..A, diamonds 2..A, hearts 2..A, spades 2..A.
pub fn full_deck() -> Vec<Card> {
    let mut v = Vec::with_capacity(52);
    for &s in &Suit::ALL {
        for &r in &Rank::ALL {
            v.push(Card::new(r, s));
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_round_trips_modulo_bits() {
        for card in full_deck() {
            let mut c = card;
            c.set_face_up(true);
            let back: Card = c.to_string().parse().unwrap();
            assert_eq!(back, c);
            assert!(!back.is_face_up());
        }
        let wild: Card = "!5c".parse().unwrap();
        assert!(wild.is_wild);
        assert_eq!(wild.to_string(), "!5c");
    }

    #[test]
    fn rejects_bad_text() {
        assert!(matches!("1c".parse::<Card>(), Err(CardParseError::InvalidRank(_))));
        assert!(matches!("15h".parse::<Card>(), Err(CardParseError::InvalidRank(_))));
        assert!(matches!("10x".parse::<Card>(), Err(CardParseError::InvalidSuit(_))));
        assert!(matches!("".parse::<Card>(), Err(CardParseError::Empty)));
    }

    #[test]
    fn list_keeps_empty_slots() {
        let slots = cards_from_str("3c,,14s").unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots[1].is_none());
        assert_eq!(cards_to_string(&slots), "3c,,14s");
    }

    #[test]
    fn equality_ignores_table_state() {
        let a = Card::new(Rank::Queen, Suit::Hearts);
        let b = a.wild().face_up();
        assert_eq!(a, b);
        assert_eq!(b.render(), "Q♡");
    }

    #[test]
    fn private_wild_is_hidden_from_others() {
        let mut c = Card::new(Rank::Two, Suit::Spades).wild();
        c.set_bit(PRIVATE_WILD);
        assert!(!c.public_view().is_wild);
        assert!(c.is_wild);
    }
}
