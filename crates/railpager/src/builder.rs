use std::time::Duration;

use crate::decimate::Decimator;
use crate::session::Session;

/// Builds an ingestion session
///
/// The builder comes with a sensible set of default options
/// which match the usual `rtl_tcp`-style I/Q server feeding a
/// pager demodulator. All you need to provide at
/// [`start()`](crate::Session::start) time is the host, port,
/// and demodulator.
///
/// ```
/// use std::time::Duration;
/// use railpager::SessionBuilder;
///
/// let session = SessionBuilder::new()
///     .with_decimation(5)
///     .with_read_timeout(Some(Duration::from_millis(250)))
///     .build();
/// assert!(!session.is_running());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionBuilder {
    decimation: u32,
    read_buffer_size: usize,
    read_timeout: Option<Duration>,
}

impl SessionBuilder {
    /// New session configuration with default options
    pub fn new() -> Self {
        Self {
            decimation: 5,
            read_buffer_size: 4096,
            read_timeout: None,
        }
    }

    /// Build a session
    ///
    /// The session is idle until it is started.
    pub fn build(&self) -> Session {
        Session::from(self)
    }

    /// Decimation factor
    ///
    /// Every `factor` consecutive I/Q pairs read from the
    /// socket are averaged into one sample for the demodulator.
    /// Clamped to `[1, Decimator::MAX_FACTOR]`.
    pub fn with_decimation(&mut self, factor: u32) -> &mut Self {
        self.decimation = u32::clamp(factor, 1, Decimator::MAX_FACTOR);
        self
    }

    /// Socket read buffer size (bytes)
    ///
    /// The demodulator's ready state is checked once per
    /// read, so smaller buffers deliver telegrams with less
    /// delay. At least two bytes.
    pub fn with_read_buffer_size(&mut self, size: usize) -> &mut Self {
        self.read_buffer_size = usize::max(size, 2);
        self
    }

    /// Socket read timeout
    ///
    /// The ingestion thread only notices
    /// [`stop()`](crate::Session::stop) between reads. With no
    /// timeout, a silent peer can delay shutdown indefinitely.
    /// With a timeout, an idle read is retried after checking
    /// for a stop request. It is not an error.
    ///
    /// A zero duration means no timeout.
    pub fn with_read_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.read_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Decimation factor
    pub fn decimation(&self) -> u32 {
        self.decimation
    }

    /// Socket read buffer size (bytes)
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    /// Socket read timeout
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }
}

impl std::default::Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SessionBuilder::default();
        assert_eq!(cfg.decimation(), 5);
        assert_eq!(cfg.read_buffer_size(), 4096);
        assert_eq!(cfg.read_timeout(), None);
    }

    #[test]
    fn test_clamping() {
        let mut cfg = SessionBuilder::new();
        cfg.with_decimation(0)
            .with_read_buffer_size(1)
            .with_read_timeout(Some(Duration::ZERO));
        assert_eq!(cfg.decimation(), 1);
        assert_eq!(cfg.read_buffer_size(), 2);
        assert_eq!(cfg.read_timeout(), None);

        cfg.with_decimation(u32::MAX)
            .with_read_timeout(Some(Duration::from_millis(10)));
        assert_eq!(cfg.decimation(), Decimator::MAX_FACTOR);
        assert_eq!(cfg.read_timeout(), Some(Duration::from_millis(10)));
    }
}
