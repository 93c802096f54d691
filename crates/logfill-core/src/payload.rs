//! Payload Synthesizer
//!
//! Maps an instant to a randomized log event and its JSON wire form.
//! Every random choice is a uniform draw over a closed, named set so the
//! branch probabilities are exact:
//!
//! - template: 1/4 each (`Info`, `Debug`, `Error`, `HtmlInfo`)
//! - service: 1/5 each
//! - `charge`: present 1/2, `power`: present 1/2, `dexterity`: present 1/3

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SynthesisError;

/// `2006-01-02T15:04:05-0700` style, numeric offset without colon.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Exclusive upper bound for the large numeric fillers (non-negative i64).
const FILLER_SIDES: u64 = i64::MAX as u64;

const HTML_MESSAGE: &str = "<!DOCTYPE html><html><head><title>Error: 404</title><style type=\"text/css\">body{background-color:#fff;color:#666;text-align:center;font-family:arial,sans-serif}div.dialog{width:25em;padding:0 4em;margin:4em auto 0 auto;border:1px solid #ccc;border-right-color:#999;border-bottom-color:#999}h1{font-size:100%;color:#f00;line-height:1.5em}</style></head><body><div class=\"dialog\"><h1>Test HTML Escaping</h1><p>This is a test for if HTML gets logged</p></div></body></html>";

// ============================================================================
// Random source
// ============================================================================

/// Source of uniform draws.
///
/// Tests script exact outcomes through this; the emitting loops each own a
/// `StdRng`.
pub trait Dice {
    /// Uniform draw from `0..sides`. `sides` must be non-zero.
    fn roll(&mut self, sides: u64) -> u64;
}

impl Dice for StdRng {
    fn roll(&mut self, sides: u64) -> u64 {
        self.random_range(0..sides)
    }
}

// ============================================================================
// Closed sets
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Shredder,
    Flipper,
    Tainter,
    Mover,
    Crusher,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::Shredder,
        Service::Flipper,
        Service::Tainter,
        Service::Mover,
        Service::Crusher,
    ];

    pub fn roll(dice: &mut impl Dice) -> Self {
        Self::ALL[dice.roll(Self::ALL.len() as u64) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Shredder => "shredder",
            Service::Flipper => "flipper",
            Service::Tainter => "tainter",
            Service::Mover => "mover",
            Service::Crusher => "crusher",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Debug,
    Error,
}

/// Message shape. Each template maps to exactly one level; `HtmlInfo`
/// shares `INFO` with `Info` but is drawn as its own outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Info,
    Debug,
    Error,
    HtmlInfo,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Info,
        Template::Debug,
        Template::Error,
        Template::HtmlInfo,
    ];

    pub fn roll(dice: &mut impl Dice) -> Self {
        Self::ALL[dice.roll(Self::ALL.len() as u64) as usize]
    }

    pub fn level(&self) -> Level {
        match self {
            Template::Info | Template::HtmlInfo => Level::Info,
            Template::Debug => Level::Debug,
            Template::Error => Level::Error,
        }
    }

    /// Render the message, drawing this template's numeric fillers.
    pub fn render(&self, dice: &mut impl Dice) -> String {
        match self {
            Template::Info => {
                format!("A descriptive info message {}", dice.roll(FILLER_SIDES))
            }
            Template::Debug => {
                let who = dice.roll(5);
                let a = dice.roll(10_000);
                let b = dice.roll(10_000);
                format!("{who} is debugging {a} and {b}")
            }
            Template::Error => {
                let pid = dice.roll(32_767);
                let command = dice.roll(FILLER_SIDES);
                format!("error running process {pid} with command {command}")
            }
            Template::HtmlInfo => HTML_MESSAGE.to_string(),
        }
    }
}

// ============================================================================
// Event
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Charge {
    pub attack: u8,
    pub strength: u8,
}

/// One synthesized log record, in its wire shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Event {
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub service: Service,
    pub level: Level,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<Charge>,
}

impl Event {
    /// Draw a random event stamped with `when` (rendered in UTC).
    ///
    /// Draw order is fixed: template, its fillers, service, charge, power,
    /// dexterity.
    pub fn synthesize(dice: &mut impl Dice, when: DateTime<Utc>) -> Self {
        let timestamp = when.format(TIMESTAMP_FORMAT).to_string();

        let template = Template::roll(dice);
        let message = template.render(dice);
        let service = Service::roll(dice);

        let charge = (dice.roll(2) == 0).then(|| Charge {
            attack: dice.roll(100) as u8,
            strength: dice.roll(100) as u8,
        });
        let power = (dice.roll(2) == 0).then(|| dice.roll(10) as u8);
        let dexterity = (dice.roll(3) == 0).then(|| dice.roll(10) as u8);

        Self {
            timestamp,
            service,
            level: template.level(),
            message,
            power,
            dexterity,
            charge,
        }
    }

    pub fn encode(&self) -> Result<Bytes, SynthesisError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// Synthesize and serialize in one step.
pub fn synthesize_payload(
    dice: &mut impl Dice,
    when: DateTime<Utc>,
) -> Result<Bytes, SynthesisError> {
    let event = Event::synthesize(dice, when);
    debug!(
        timestamp = %event.timestamp,
        service = event.service.as_str(),
        severity = ?event.level,
        power = ?event.power,
        dexterity = ?event.dexterity,
        charge = ?event.charge,
        "Synthesized event"
    );
    event.encode()
}
