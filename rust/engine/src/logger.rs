//! Participant-facing game log.
//!
//! Engines describe what happened at the table as [`LogMessage`] batches and
//! push them onto a [`LogBus`]. The table layer drains the matching
//! [`LogReceiver`]. Sending never blocks: when the observer falls behind and
//! the queue is full the newest batch is dropped and counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::cards::Card;
use crate::player::PlayerId;

pub const LOG_CHANNEL_CAPACITY: usize = 256;

pub type LogSender = mpsc::Sender<Vec<LogMessage>>;
pub type LogReceiver = mpsc::Receiver<Vec<LogMessage>>;

/// One line of the game log.
///
/// `message` may contain `{}` (replaced by the next entry of `player_ids`,
/// rendered as a name), `${N}` (N cents, rendered as currency) and
/// `%s`/`%d` (replaced by the next entry of `args`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    pub uuid: String,
    pub player_ids: Vec<PlayerId>,
    pub cards: Vec<Card>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    pub time: DateTime<Utc>,
}

impl LogMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            player_ids: Vec::new(),
            cards: Vec::new(),
            message: message.into(),
            args: Vec::new(),
            time: Utc::now(),
        }
    }

    pub fn player(mut self, id: PlayerId) -> Self {
        self.player_ids.push(id);
        self
    }

    pub fn players(mut self, ids: &[PlayerId]) -> Self {
        self.player_ids.extend_from_slice(ids);
        self
    }

    pub fn cards(mut self, cards: &[Card]) -> Self {
        self.cards.extend_from_slice(cards);
        self
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Expands the message tokens. `name` maps a player id to a display name.
    pub fn render<F>(&self, name: F) -> String
    where
        F: Fn(PlayerId) -> String,
    {
        let mut out = String::with_capacity(self.message.len() + 16);
        let mut players = self.player_ids.iter();
        let mut args = self.args.iter();
        let mut rest = self.message.as_str();
        while let Some(pos) = rest.find(['{', '$', '%']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("{}") {
                match players.next() {
                    Some(id) => out.push_str(&name(*id)),
                    None => out.push_str("{}"),
                }
                rest = after;
            } else if let Some(amount) = tail.strip_prefix("${") {
                let parsed = amount
                    .find('}')
                    .and_then(|end| Some((end, amount[..end].parse::<i64>().ok()?)));
                match parsed {
                    Some((end, cents)) => {
                        out.push_str(&format_currency(cents));
                        rest = &amount[end + 1..];
                    }
                    None => {
                        out.push('$');
                        rest = &tail[1..];
                    }
                }
            } else if tail.starts_with("%s") || tail.starts_with("%d") {
                match args.next() {
                    Some(a) => out.push_str(a),
                    None => out.push_str(&tail[..2]),
                }
                rest = &tail[2..];
            } else {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Formats cents as dollars: `150` -> `$1.50`, `-2500` -> `-$25.00`.
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Bounded, non-blocking producer side of the game log.
#[derive(Debug)]
pub struct LogBus {
    tx: LogSender,
    rx: Option<LogReceiver>,
    dropped: u64,
}

impl Default for LogBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBus {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Some(rx),
            dropped: 0,
        }
    }

    /// Queues a batch. Empty batches are ignored.
    pub fn send(&mut self, batch: Vec<LogMessage>) {
        if batch.is_empty() {
            return;
        }
        match self.tx.try_send(batch) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(batch)) => {
                self.dropped += 1;
                tracing::warn!(
                    dropped = self.dropped,
                    batch_len = batch.len(),
                    "game log observer is behind, dropping log batch"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::trace!("game log receiver closed");
            }
        }
    }

    pub fn send_one(&mut self, message: LogMessage) {
        self.send(vec![message]);
    }

    /// Hands out the consumer side; only the first call returns it.
    pub fn take_receiver(&mut self) -> Option<LogReceiver> {
        self.rx.take()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_names_currency_and_args() {
        let m = LogMessage::new("{} won ${150} from {} with %s")
            .players(&[7, 9])
            .arg("Pair of Aces");
        let text = m.render(|id| format!("player{id}"));
        assert_eq!(text, "player7 won $1.50 from player9 with Pair of Aces");
    }

    #[test]
    fn currency() {
        assert_eq!(format_currency(0), "$0.00");
        assert_eq!(format_currency(10_000), "$100.00");
        assert_eq!(format_currency(-2525), "-$25.25");
    }

    #[test]
    fn full_queue_drops_newest() {
        let mut bus = LogBus::with_capacity(2);
        let mut rx = bus.take_receiver().unwrap();
        for i in 0..3 {
            bus.send_one(LogMessage::new(format!("m{i}")));
        }
        assert_eq!(bus.dropped(), 1);
        assert_eq!(rx.try_recv().unwrap()[0].message, "m0");
        assert_eq!(rx.try_recv().unwrap()[0].message, "m1");
        assert!(rx.try_recv().is_err());
        assert!(bus.take_receiver().is_none());
    }
}
