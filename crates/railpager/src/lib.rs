//! # railpager: Railway Pager Telegram Decoding
//!
//! This crate ingests baseband I/Q samples from a network sample
//! server, drives a pager demodulator, and decodes the telegrams
//! it recovers. Two kinds of telegram are understood:
//!
//! * **Geolocation** telegrams carry a vehicle id, a latitude and
//!   longitude, and the name of the route. The route name is
//!   double-byte text whose bit and nibble order is not known, so
//!   a small set of candidate byte strings is returned.
//! * **Status** telegrams carry a train number, speed, and
//!   mileage post.
//!
//! The demodulator itself is not part of this crate. Implement
//! [`Demodulator`] for yours.
//!
//! ## Offline decoding
//!
//! Telegram text which was captured earlier can be decoded
//! directly:
//!
//! ```
//! use railpager::{MessageLine, ParsedMessage};
//!
//! let line = MessageLine::parse("[MSG] 0001234000 ABC123 80 4521").unwrap();
//! match line.decode() {
//!     Ok(ParsedMessage::Status(st)) => {
//!         assert_eq!("ABC123", st.train_no());
//!         assert_eq!("80", st.speed());
//!         assert_eq!("4521", st.mileage());
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## Live ingestion
//!
//! A [`Session`] connects to a sample server which streams
//! interleaved signed 8-bit I/Q bytes, decimates the stream,
//! and feeds your demodulator on a background thread. The host
//! [polls](Session::poll) for output lines:
//!
//! ```no_run
//! use std::time::Duration;
//! use railpager::{message_lines, Demodulator, RawTelegram, SessionBuilder};
//!
//! # struct MyDemod;
//! # impl Demodulator for MyDemod {
//! #     fn process(&mut self, _i: i8, _q: i8) {}
//! #     fn take_telegram(&mut self) -> Option<RawTelegram> { None }
//! # }
//! let mut session = SessionBuilder::new()
//!     .with_read_timeout(Some(Duration::from_millis(500)))
//!     .build();
//! session.start("127.0.0.1", 14423, MyDemod);
//!
//! while session.is_running() {
//!     let batch = session.poll();
//!     for line in message_lines(&batch) {
//!         match line.decode() {
//!             Ok(msg) => println!("{}", msg),
//!             Err(err) => eprintln!("{}: {}", line, err),
//!         }
//!     }
//!     std::thread::sleep(Duration::from_millis(200));
//! }
//! session.join();
//! ```

pub mod alphabet;
mod buffer;
mod builder;
mod decimate;
mod demod;
mod message;
pub mod route;
mod session;
mod telegram;

pub use buffer::MessageBuffer;
pub use builder::SessionBuilder;
pub use decimate::Decimator;
pub use demod::Demodulator;
pub use message::{decode, GeoReport, ParsedMessage, TelegramDecodeErr, TrainStatus};
pub use session::{
    Session, STATUS_CONNECTION_CLOSED, STATUS_CONNECT_FAILED, STATUS_READ_ERROR,
    STATUS_SOCKET_FAILED,
};
pub use telegram::{message_lines, MessageLine, RawTelegram, MSG_PREFIX};
