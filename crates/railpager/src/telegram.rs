//! Telegrams and `[MSG]` output lines
//!
//! Each telegram recovered by the demodulator is delivered to
//! the consumer as one text line:
//!
//! ```txt
//! [MSG] 0001234000 ABC123 80 4521
//! ```
//!
//! The text after `[MSG] ` is the *payload*: the telegram
//! address, zero-padded to ten digits, a space, and the raw
//! telegram body. Consumers recover telegrams from polled text
//! with [`MessageLine`].

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::message::{self, ParsedMessage, TelegramDecodeErr};

/// Prefix of every telegram line
pub const MSG_PREFIX: &str = "[MSG] ";

/// A telegram, as recovered by the demodulator
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawTelegram {
    address: u32,
    body: String,
}

impl RawTelegram {
    /// Telegram with the given `address` and `body`
    pub fn new<S>(address: u32, body: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            address,
            body: body.into(),
        }
    }

    /// Receiver address
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Telegram body, verbatim
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Payload text: ten-digit address, space, body
    pub fn payload(&self) -> String {
        format!("{:010} {}", self.address, self.body)
    }

    /// Format as a `[MSG]` line
    ///
    /// ```
    /// use railpager::RawTelegram;
    ///
    /// let tg = RawTelegram::new(1234000, "ABC123 80 4521");
    /// assert_eq!("[MSG] 0001234000 ABC123 80 4521", tg.to_line());
    /// ```
    pub fn to_line(&self) -> String {
        format!("{}{}", MSG_PREFIX, self.payload())
    }

    /// Decode the telegram
    ///
    /// Classifies the [payload](RawTelegram::payload), so the
    /// address takes part in classification.
    pub fn decode(&self) -> Result<ParsedMessage, TelegramDecodeErr> {
        message::decode(&self.payload())
    }
}

impl fmt::Display for RawTelegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:010} {}", MSG_PREFIX, self.address, self.body)
    }
}

/// A `[MSG]` line recovered from polled text
///
/// Status lines like `Connected to …` are not message lines.
///
/// ```
/// use railpager::MessageLine;
///
/// let line = MessageLine::parse("[MSG] 0001234000 ABC123 80 4521").unwrap();
/// assert_eq!(Some(1234000), line.address());
/// assert_eq!("ABC123 80 4521", line.body());
/// assert_eq!("status", line.decode().unwrap().kind_str());
///
/// assert!(MessageLine::parse("Connection closed").is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageLine {
    payload: String,
}

impl MessageLine {
    /// Find a telegram in one line of text
    ///
    /// Returns `None` if `line` is not a `[MSG]` line or if its
    /// payload is no longer than the ten-digit address.
    pub fn parse(line: &str) -> Option<Self> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"\[MSG\]\s*(.+)").expect("bad MSG regexp");
        }

        let payload = RE.captures(line)?.get(1)?.as_str();
        if payload.len() <= ADDRESS_DIGITS {
            return None;
        }

        Some(Self {
            payload: payload.to_owned(),
        })
    }

    /// Payload text: address, space, body
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Receiver address
    ///
    /// Returns `None` if the payload does not begin with a
    /// ten-digit address that fits in a `u32`.
    pub fn address(&self) -> Option<u32> {
        let digits = self.payload.get(..ADDRESS_DIGITS)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Telegram body
    ///
    /// The payload without its address. If the payload has no
    /// address, the entire payload is returned.
    pub fn body(&self) -> &str {
        match self.address() {
            Some(_) => {
                let rest = &self.payload[ADDRESS_DIGITS..];
                rest.strip_prefix(' ').unwrap_or(rest)
            }
            None => &self.payload,
        }
    }

    /// Decode the telegram payload
    pub fn decode(&self) -> Result<ParsedMessage, TelegramDecodeErr> {
        message::decode(&self.payload)
    }
}

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MSG_PREFIX, self.payload)
    }
}

/// Iterate over the telegram lines in a polled batch
///
/// Status lines and lines too short to carry a telegram are
/// skipped.
pub fn message_lines(batch: &str) -> impl Iterator<Item = MessageLine> + '_ {
    batch.lines().filter_map(MessageLine::parse)
}

const ADDRESS_DIGITS: usize = 10;
