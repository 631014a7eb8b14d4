//! Contracts between engines and the table layer.
//!
//! Every engine is [`Playable`]: it accepts [`PayloadIn`] commands from
//! players, answers state queries with [`Response`] snapshots and reports the
//! final [`GameOverDetails`]. Engines that run timed dealer steps are also
//! [`Tickable`]; the table layer calls [`Tickable::tick`] at the engine's
//! interval and pushes fresh snapshots when it returns `true`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cards::Card;
use crate::errors::GameError;
use crate::logger::LogReceiver;
use crate::player::PlayerId;

/// A command sent by a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadIn {
    pub action: String,
    #[serde(default)]
    pub additional_data: Map<String, Value>,
}

impl PayloadIn {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            additional_data: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.additional_data.insert(key.to_string(), value.into());
        self
    }

    /// Shorthand for a command carrying `amount`.
    pub fn with_amount(action: impl Into<String>, amount: i64) -> Self {
        Self::new(action).with("amount", amount)
    }

    fn field(&self, key: &str) -> Result<&Value, GameError> {
        self.additional_data
            .get(key)
            .ok_or_else(|| GameError::payload(format!("missing {key}")))
    }

    /// `additionalData.amount` as a non-negative integer.
    pub fn amount(&self) -> Result<i64, GameError> {
        self.field("amount")?
            .as_i64()
            .filter(|a| *a >= 0)
            .ok_or_else(|| GameError::payload("amount must be a non-negative integer"))
    }

    pub fn bool_field(&self, key: &str) -> Result<bool, GameError> {
        self.field(key)?
            .as_bool()
            .ok_or_else(|| GameError::payload(format!("{key} must be a boolean")))
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, GameError> {
        match self.additional_data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.bool_field(key).map(Some),
        }
    }

    pub fn str_field(&self, key: &str) -> Result<&str, GameError> {
        self.field(key)?
            .as_str()
            .ok_or_else(|| GameError::payload(format!("{key} must be a string")))
    }

    pub fn index(&self, key: &str) -> Result<usize, GameError> {
        self.field(key)?
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| GameError::payload(format!("{key} must be a non-negative integer")))
    }

    /// A list of card positions, e.g. `[0, 2]`.
    pub fn indices(&self, key: &str) -> Result<Vec<usize>, GameError> {
        let bad = || GameError::payload(format!("{key} must be a list of card positions"));
        self.field(key)?
            .as_array()
            .ok_or_else(bad)?
            .iter()
            .map(|v| v.as_u64().map(|i| i as usize).ok_or_else(bad))
            .collect()
    }

    /// A card in text form, e.g. `"14s"`.
    pub fn card(&self, key: &str) -> Result<Card, GameError> {
        Ok(self.str_field(key)?.parse()?)
    }
}

/// Snapshot returned to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub key: String,
    pub value: String,
    pub data: Value,
}

impl Response {
    pub fn game<T: Serialize>(engine: &str, data: &T) -> Self {
        Self {
            key: "game".to_string(),
            value: engine.to_string(),
            data: serde_json::to_value(data).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverDetails {
    /// Net chips won (positive) or lost (negative) per player.
    pub balance_adjustments: BTreeMap<PlayerId, i64>,
    pub log: Value,
}

/// What an accepted action produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    /// Direct reply to the acting player, if any.
    pub response: Option<Response>,
    /// Observers should be sent new snapshots.
    pub update_state: bool,
}

impl ActionOutcome {
    pub fn updated() -> Self {
        Self {
            response: None,
            update_state: true,
        }
    }

    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn reply(response: Response) -> Self {
        Self {
            response: Some(response),
            update_state: false,
        }
    }
}

pub trait Playable {
    /// Engine identifier, also used as [`Response::value`].
    fn name(&self) -> &'static str;

    fn action(
        &mut self,
        player_id: PlayerId,
        payload: &PayloadIn,
    ) -> Result<ActionOutcome, GameError>;

    fn player_state(&self, player_id: PlayerId) -> Response;

    /// `Some` once the game is over.
    fn end_of_game_details(&self) -> Option<GameOverDetails>;

    /// Consumer side of the game log; only the first call returns it.
    fn log_chan(&mut self) -> Option<LogReceiver>;
}

pub trait Tickable {
    fn interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// Runs a pending scheduled transition whose deadline is at or before `now`.
    fn tick_at(&mut self, now: Instant) -> Result<bool, GameError>;

    fn tick(&mut self) -> Result<bool, GameError> {
        self.tick_at(Instant::now())
    }
}

/// A complete engine as handed to the table layer.
pub trait Game: Playable + Tickable + Send {}

impl<T: Playable + Tickable + Send> Game for T {}

/// One pending timed transition.
///
/// [`Scheduler::due`] clears the pending entry before returning it, so the
/// handler that runs the transition is free to schedule the next one.
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    pending: Option<(A, Instant)>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, action: A, at: Instant) {
        self.pending = Some((action, at));
    }

    pub fn schedule_in(&mut self, action: A, now: Instant, delay: Duration) {
        self.schedule(action, now + delay);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<&A> {
        self.pending.as_ref().map(|(a, _)| a)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn due(&mut self, now: Instant) -> Option<A> {
        match &self.pending {
            Some((_, at)) if *at <= now => self.pending.take().map(|(a, _)| a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_clears_before_returning() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_in("deal", t0, Duration::from_secs(1));
        assert_eq!(s.due(t0), None);
        assert_eq!(s.due(t0 + Duration::from_secs(1)), Some("deal"));
        assert!(s.pending().is_none());
    }

    #[test]
    fn payload_amount_must_be_non_negative() {
        assert_eq!(PayloadIn::with_amount("bet", 50).amount(), Ok(50));
        assert!(PayloadIn::with_amount("bet", -5).amount().is_err());
        assert!(PayloadIn::new("bet").amount().is_err());
    }
}
