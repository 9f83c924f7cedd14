//! Demodulator boundary
//!
//! The demodulator and bit/word synchronizer which turn
//! baseband I/Q samples into telegrams live outside this
//! crate. The ingestion loop drives any implementation of
//! [`Demodulator`].

use crate::telegram::RawTelegram;

/// A pager demodulator
///
/// Samples are fed one at a time with
/// [`process()`](#tymethod.process). Once a complete telegram
/// has been recovered, [`take_telegram()`](#tymethod.take_telegram)
/// returns it exactly once. The demodulator is moved onto the
/// ingestion thread, so it must be `Send`.
pub trait Demodulator: Send {
    /// Process one decimated I/Q sample
    fn process(&mut self, i: i8, q: i8);

    /// Take the most recently completed telegram
    ///
    /// Returns `Some` once per recovered telegram and clears
    /// the demodulator's ready state. Returns `None` if no
    /// telegram has completed since the last call.
    fn take_telegram(&mut self) -> Option<RawTelegram>;
}

impl<D> Demodulator for Box<D>
where
    D: Demodulator + ?Sized,
{
    #[inline]
    fn process(&mut self, i: i8, q: i8) {
        (**self).process(i, q)
    }

    #[inline]
    fn take_telegram(&mut self) -> Option<RawTelegram> {
        (**self).take_telegram()
    }
}
