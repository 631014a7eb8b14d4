//! Engine configuration.
//!
//! Each engine takes a serde config with defaults and a `validate` check.
//! [`GameConfig`] wraps them behind a `game` tag so a table definition can be
//! loaded from TOML or JSON and turned into a running engine:
//!
//! ```
//! use cardroom_engine::config::GameConfig;
//! use cardroom_engine::game::Playable;
//!
//! let cfg = GameConfig::from_toml_str(r#"
//!     game = "guts"
//!     ante = 25
//!     maxOwed = 1000
//!     cardCount = 3
//! "#).unwrap();
//! let game = cfg.build(&[1, 2, 3], 42).unwrap();
//! assert_eq!(game.name(), "guts");
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, GameError};
use crate::game::Game;
use crate::games::acey_deucey::AceyDeucey;
use crate::games::guts::Guts;
use crate::games::holdem::Holdem;
use crate::games::little_l::LittleL;
use crate::games::pass_the_poop::PassThePoop;
use crate::games::seven_card::SevenCard;
use crate::player::{PlayerId, DEFAULT_BUY_IN};
use crate::pot::PAYOUT_UNIT;

fn check_players(players: &[PlayerId], min: usize, max: usize) -> Result<(), GameError> {
    if players.len() < min || players.len() > max {
        return Err(GameError::config(format!(
            "between {min} and {max} players required, got {}",
            players.len()
        )));
    }
    let mut seen = players.to_vec();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != players.len() {
        return Err(GameError::config("duplicate player id"));
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SevenCardVariant {
    #[default]
    Stud,
    Baseball,
    FollowTheQueen,
    HighChicago,
    LowCardWild,
    CouponsAndClippings,
    Chiggs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SevenCardConfig {
    pub ante: i64,
    pub variant: SevenCardVariant,
    pub buy_in: i64,
    /// Wilds substitute rank or suit, not both, at showdown.
    pub constrained_wilds: bool,
}

impl Default for SevenCardConfig {
    fn default() -> Self {
        Self {
            ante: 25,
            variant: SevenCardVariant::Stud,
            buy_in: DEFAULT_BUY_IN,
            constrained_wilds: false,
        }
    }
}

impl SevenCardConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 7;

    pub fn validate(&self) -> Result<(), GameError> {
        if self.ante < PAYOUT_UNIT || self.ante % PAYOUT_UNIT != 0 {
            return Err(GameError::config("ante must be at least 25 and divisible by 25"));
        }
        if self.buy_in <= self.ante {
            return Err(GameError::config("buyIn must exceed the ante"));
        }
        Ok(())
    }

    pub fn validate_players(&self, players: &[PlayerId]) -> Result<(), GameError> {
        self.validate()?;
        check_players(players, Self::MIN_PLAYERS, Self::MAX_PLAYERS)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldemVariant {
    #[default]
    Standard,
    Pineapple,
    LazyPineapple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoldemConfig {
    pub variant: HoldemVariant,
    pub ante: i64,
    pub lower_limit: i64,
    pub upper_limit: i64,
    pub buy_in: i64,
}

impl Default for HoldemConfig {
    fn default() -> Self {
        Self {
            variant: HoldemVariant::Standard,
            ante: 0,
            lower_limit: 25,
            upper_limit: 50,
            buy_in: DEFAULT_BUY_IN,
        }
    }
}

impl HoldemConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 10;

    pub fn validate(&self) -> Result<(), GameError> {
        if self.ante < 0 || self.ante % PAYOUT_UNIT != 0 {
            return Err(GameError::config("ante must be non-negative and divisible by 25"));
        }
        if self.lower_limit <= 0 || self.lower_limit % PAYOUT_UNIT != 0 {
            return Err(GameError::config("lowerLimit must be positive and divisible by 25"));
        }
        if self.upper_limit != 2 * self.lower_limit {
            return Err(GameError::config("upperLimit must be twice lowerLimit"));
        }
        if self.buy_in <= self.ante + self.upper_limit {
            return Err(GameError::config("buyIn must cover the ante and big blind"));
        }
        Ok(())
    }

    pub fn validate_players(&self, players: &[PlayerId]) -> Result<(), GameError> {
        self.validate()?;
        check_players(players, Self::MIN_PLAYERS, Self::MAX_PLAYERS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GutsConfig {
    pub ante: i64,
    pub max_owed: i64,
    pub card_count: usize,
    pub bloody_guts: bool,
}

impl Default for GutsConfig {
    fn default() -> Self {
        Self {
            ante: 25,
            max_owed: 1000,
            card_count: 2,
            bloody_guts: false,
        }
    }
}

impl GutsConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 10;

    /// Card counts other than 2 or 3 fall back to 2.
    pub fn effective_card_count(&self) -> usize {
        match self.card_count {
            2 | 3 => self.card_count,
            _ => 2,
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.ante <= 0 {
            return Err(GameError::config("ante must be positive"));
        }
        if self.max_owed <= 0 {
            return Err(GameError::config("maxOwed must be positive"));
        }
        Ok(())
    }

    pub fn validate_players(&self, players: &[PlayerId]) -> Result<(), GameError> {
        self.validate()?;
        check_players(players, Self::MIN_PLAYERS, Self::MAX_PLAYERS)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AceyDeuceyGameType {
    /// A fresh shuffled deck every round.
    #[default]
    Standard,
    /// One deck carries across rounds until it runs out.
    ContinuousShoe,
    /// Continuous shoe where a free game re-deals the last card instead of ending.
    Chaos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AceyDeuceyConfig {
    pub ante: i64,
    pub allow_pass: bool,
    pub game_type: AceyDeuceyGameType,
}

impl Default for AceyDeuceyConfig {
    fn default() -> Self {
        Self {
            ante: 100,
            allow_pass: false,
            game_type: AceyDeuceyGameType::Standard,
        }
    }
}

impl AceyDeuceyConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 10;

    pub fn validate(&self) -> Result<(), GameError> {
        if self.ante <= 0 {
            return Err(GameError::config("ante must be positive"));
        }
        Ok(())
    }

    pub fn validate_players(&self, players: &[PlayerId]) -> Result<(), GameError> {
        self.validate()?;
        check_players(players, Self::MIN_PLAYERS, Self::MAX_PLAYERS)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoopEdition {
    #[default]
    Standard,
    Diarrhea,
    Pairs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassThePoopConfig {
    pub ante: i64,
    pub lives: u32,
    pub edition: PoopEdition,
}

impl Default for PassThePoopConfig {
    fn default() -> Self {
        Self {
            ante: 25,
            lives: 3,
            edition: PoopEdition::Standard,
        }
    }
}

impl PassThePoopConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 10;

    pub fn validate(&self) -> Result<(), GameError> {
        if self.ante <= 0 {
            return Err(GameError::config("ante must be positive"));
        }
        if self.lives == 0 {
            return Err(GameError::config("lives must be positive"));
        }
        Ok(())
    }

    pub fn validate_players(&self, players: &[PlayerId]) -> Result<(), GameError> {
        self.validate()?;
        check_players(players, Self::MIN_PLAYERS, Self::MAX_PLAYERS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LittleLConfig {
    pub ante: i64,
    pub initial_deal: usize,
    /// Bit `k` set means a player may trade exactly `k` cards.
    pub trade_ins: u32,
    pub buy_in: i64,
}

impl Default for LittleLConfig {
    fn default() -> Self {
        Self {
            ante: 25,
            initial_deal: 4,
            trade_ins: 0b111,
            buy_in: DEFAULT_BUY_IN,
        }
    }
}

impl LittleLConfig {
    pub const MIN_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 7;

    pub fn allows_trade(&self, count: usize) -> bool {
        count <= self.initial_deal && self.trade_ins & (1 << count) != 0
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.ante <= 0 {
            return Err(GameError::config("ante must be positive"));
        }
        if !(3..=5).contains(&self.initial_deal) {
            return Err(GameError::config("initialDeal must be 3, 4 or 5"));
        }
        if self.trade_ins == 0 || self.trade_ins >> (self.initial_deal + 1) != 0 {
            return Err(GameError::config(format!(
                "tradeIns must be a non-empty subset of 0..={}",
                self.initial_deal
            )));
        }
        if self.buy_in <= self.ante {
            return Err(GameError::config("buyIn must exceed the ante"));
        }
        Ok(())
    }

    pub fn validate_players(&self, players: &[PlayerId]) -> Result<(), GameError> {
        self.validate()?;
        check_players(players, Self::MIN_PLAYERS, Self::MAX_PLAYERS)
    }
}

/// Any engine's configuration, tagged by `game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "camelCase")]
pub enum GameConfig {
    SevenCard(SevenCardConfig),
    Holdem(HoldemConfig),
    Guts(GutsConfig),
    AceyDeucey(AceyDeuceyConfig),
    PassThePoop(PassThePoopConfig),
    LittleL(LittleLConfig),
}

impl GameConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ConfigError::Format(other.unwrap_or("").to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        match self {
            GameConfig::SevenCard(c) => c.validate(),
            GameConfig::Holdem(c) => c.validate(),
            GameConfig::Guts(c) => c.validate(),
            GameConfig::AceyDeucey(c) => c.validate(),
            GameConfig::PassThePoop(c) => c.validate(),
            GameConfig::LittleL(c) => c.validate(),
        }
    }

    /// Builds the engine for `players` (seat order) with a deck shuffled by
    /// `seed`; zero seeds from the clock.
    pub fn build(&self, players: &[PlayerId], seed: u64) -> Result<Box<dyn Game>, GameError> {
        Ok(match self {
            GameConfig::SevenCard(c) => Box::new(SevenCard::new(players, c.clone(), seed)?),
            GameConfig::Holdem(c) => Box::new(Holdem::new(players, c.clone(), seed)?),
            GameConfig::Guts(c) => Box::new(Guts::new(players, c.clone(), seed)?),
            GameConfig::AceyDeucey(c) => Box::new(AceyDeucey::new(players, c.clone(), seed)?),
            GameConfig::PassThePoop(c) => Box::new(PassThePoop::new(players, c.clone(), seed)?),
            GameConfig::LittleL(c) => Box::new(LittleL::new(players, c.clone(), seed)?),
        })
    }
}
