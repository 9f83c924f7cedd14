//! I/Q decimation

/// Boxcar decimator for interleaved I/Q bytes
///
/// Sums `factor` consecutive I/Q pairs and emits their mean,
/// reducing the sample rate by `factor`. The mean is computed
/// with integer division, which truncates toward zero.
///
/// The input is a raw stream of interleaved signed 8-bit
/// samples: `I Q I Q …`. Socket reads may end anywhere in
/// this stream, so all state, including a dangling in-phase
/// byte, is carried over to the next call to
/// [`process_bytes()`](#method.process_bytes).
///
/// ```
/// use railpager::Decimator;
///
/// let mut decim = Decimator::new(2);
/// let mut out = vec![];
/// decim.process_bytes(&[10, 20, 30], |i, q| out.push((i, q)));
/// assert!(out.is_empty());
/// decim.process_bytes(&[40], |i, q| out.push((i, q)));
/// assert_eq!(out, vec![(20, 30)]);
/// ```
#[derive(Clone, Debug)]
pub struct Decimator {
    // samples per output
    factor: u32,

    // running sums for the current window
    acc_i: i32,
    acc_q: i32,

    // pairs summed so far
    count: u32,

    // in-phase byte whose quadrature byte has not arrived
    pending_i: Option<i8>,
}

impl Decimator {
    /// Largest supported decimation factor
    pub const MAX_FACTOR: u32 = 1 << 16;

    /// Create decimator
    ///
    /// `factor` is clamped to `[1, MAX_FACTOR]`. A factor of
    /// one passes every sample through.
    pub fn new(factor: u32) -> Self {
        Self {
            factor: u32::clamp(factor, 1, Self::MAX_FACTOR),
            acc_i: 0,
            acc_q: 0,
            count: 0,
            pending_i: None,
        }
    }

    /// Reset to zero initial conditions
    pub fn reset(&mut self) {
        self.acc_i = 0;
        self.acc_q = 0;
        self.count = 0;
        self.pending_i = None;
    }

    /// Decimation factor
    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Accumulate one I/Q pair
    ///
    /// Returns the averaged pair when the window is full.
    #[inline]
    pub fn input(&mut self, i: i8, q: i8) -> Option<(i8, i8)> {
        self.acc_i += i as i32;
        self.acc_q += q as i32;
        self.count += 1;

        if self.count < self.factor {
            return None;
        }

        let factor = self.factor as i32;
        let out = ((self.acc_i / factor) as i8, (self.acc_q / factor) as i8);
        self.acc_i = 0;
        self.acc_q = 0;
        self.count = 0;
        Some(out)
    }

    /// Decimate a buffer of interleaved I/Q bytes
    ///
    /// Every averaged pair is passed to `out`. Returns the
    /// number of pairs emitted.
    pub fn process_bytes<F>(&mut self, bytes: &[u8], mut out: F) -> usize
    where
        F: FnMut(i8, i8),
    {
        let mut emitted = 0;
        for &byte in bytes {
            let sa = byte as i8;
            match self.pending_i.take() {
                None => self.pending_i = Some(sa),
                Some(i) => {
                    if let Some((di, dq)) = self.input(i, sa) {
                        out(di, dq);
                        emitted += 1;
                    }
                }
            }
        }
        emitted
    }
}

impl Default for Decimator {
    fn default() -> Self {
        Self::new(5)
    }
}
