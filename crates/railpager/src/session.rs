//! Ingestion session
//!
//! A [`Session`] owns at most one ingestion thread. The thread
//! connects to an I/Q sample server, decimates the sample
//! stream, feeds the [`Demodulator`], and pushes one line per
//! recovered telegram into the session's [`MessageBuffer`].
//! The host polls the buffer from its own thread.
//!
//! ```txt
//!   socket ==> Decimator ==> Demodulator ==> [MSG] line ==> MessageBuffer
//!                                                                ||
//!                                                   poll() <=====||
//! ```

#[cfg(not(test))]
use log::{debug, error, info, trace, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as error;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as trace;
#[cfg(test)]
use std::println as warn;

use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::buffer::MessageBuffer;
use crate::builder::SessionBuilder;
use crate::decimate::Decimator;
use crate::demod::Demodulator;
use crate::telegram::RawTelegram;

/// Status line: the server address could not be resolved
pub const STATUS_SOCKET_FAILED: &str = "socket() failed";

/// Status line: the connection was refused or failed
pub const STATUS_CONNECT_FAILED: &str = "connect() failed";

/// Status line: a socket read failed
pub const STATUS_READ_ERROR: &str = "read() error";

/// Status line: the ingestion loop has ended
pub const STATUS_CONNECTION_CLOSED: &str = "Connection closed";

/// A live-ingestion session
///
/// Create a session with a [`SessionBuilder`], then
/// [`start()`](Session::start) it with a server address and a
/// demodulator. Output lines accumulate until they are
/// [polled](Session::poll):
///
/// * `Connected to <host>:<port>`
/// * `[MSG] <address> <body>`, one per telegram
/// * `socket() failed`, `connect() failed`, `read() error`
/// * `Connection closed`
///
/// Only one ingestion thread runs at a time. Starting a
/// session that is already running does nothing. Connection
/// errors end the ingestion thread, but not the session: it
/// may be started again.
///
/// [`stop()`](Session::stop) asks the thread to exit. The
/// thread notices between socket reads, so unless a
/// [read timeout](SessionBuilder::with_read_timeout) is
/// configured, a silent peer can keep it alive. Until it
/// exits, the session is not running but cannot be started
/// either. Use [`join()`](Session::join) to wait for it.
/// Dropping the session stops it without waiting.
#[derive(Debug)]
pub struct Session {
    config: SessionBuilder,
    buffer: MessageBuffer,
    worker: Option<Worker>,
    retired: Vec<Worker>,
}

// one ingestion thread, its cancellation flag, and a flag
// which stays set until the thread is done with the buffer
#[derive(Debug)]
struct Worker {
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

impl Session {
    /// Start ingesting from `host:port`
    ///
    /// Spawns an ingestion thread which connects to the I/Q
    /// server at `host:port` and drives `demod`. Returns `true`
    /// if a thread was started, or `false` if the session is
    /// already running or a stopped thread has yet to exit.
    /// In that case, `demod` is dropped.
    pub fn start<D>(&mut self, host: &str, port: u16, demod: D) -> bool
    where
        D: Demodulator + 'static,
    {
        if self.is_running() {
            debug!("session already running; ignoring start");
            return false;
        }

        // a stopped thread may still be blocked in a read
        self.retire();
        if self.retired.iter().any(Worker::is_alive) {
            debug!("stopped ingestion thread has not exited; ignoring start");
            return false;
        }

        let running = Arc::new(AtomicBool::new(true));
        let alive = Arc::new(AtomicBool::new(true));
        let ingest = Ingest {
            config: self.config,
            host: host.to_owned(),
            port,
            running: running.clone(),
            alive: alive.clone(),
            buffer: self.buffer.clone(),
        };

        let spawned = thread::Builder::new()
            .name("railpager-ingest".to_owned())
            .spawn(move || ingest.run(demod));

        match spawned {
            Ok(handle) => {
                info!("session started for {}:{}", host, port);
                self.worker = Some(Worker {
                    running,
                    alive,
                    handle,
                });
                true
            }
            Err(err) => {
                error!("unable to spawn ingestion thread: {}", err);
                false
            }
        }
    }

    /// Ask the ingestion thread to exit
    ///
    /// Returns immediately. The thread exits after its current
    /// socket read completes.
    pub fn stop(&self) {
        if let Some(worker) = &self.worker {
            if worker.running.swap(false, Ordering::AcqRel) {
                info!("session stop requested");
            }
        }
    }

    /// Wait for all ingestion threads to exit
    ///
    /// Blocks until the current thread, and any thread left
    /// over from a previous start, has finished. Call
    /// [`stop()`](Session::stop) first unless the peer is
    /// expected to close the connection.
    pub fn join(&mut self) {
        self.retire();
        for worker in self.retired.drain(..) {
            if worker.handle.join().is_err() {
                error!("ingestion thread panicked");
            }
        }
    }

    /// Stop and wait for the ingestion thread
    pub fn shutdown(&mut self) {
        self.stop();
        self.join();
    }

    /// True if an ingestion thread is running
    ///
    /// Becomes `false` as soon as [`stop()`](Session::stop) is
    /// called or the connection ends.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |w| w.running.load(Ordering::Acquire))
    }

    /// Take all buffered output lines
    ///
    /// Returns every line produced since the last poll,
    /// joined by newlines, or the empty string. Never waits
    /// for the ingestion thread.
    pub fn poll(&self) -> String {
        self.buffer.drain()
    }

    /// Shared handle to the output buffer
    pub fn buffer(&self) -> MessageBuffer {
        self.buffer.clone()
    }

    /// Session configuration
    pub fn config(&self) -> &SessionBuilder {
        &self.config
    }

    // move the current worker, if any, to the retired list
    fn retire(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.running.store(false, Ordering::Release);
            self.retired.push(worker);
        }

        // reap the ones which are done
        let (done, live): (Vec<_>, Vec<_>) = self
            .retired
            .drain(..)
            .partition(|w| w.handle.is_finished());
        self.retired = live;
        for worker in done {
            if worker.handle.join().is_err() {
                error!("ingestion thread panicked");
            }
        }
    }
}

impl From<&SessionBuilder> for Session {
    fn from(cfg: &SessionBuilder) -> Self {
        Self {
            config: *cfg,
            buffer: MessageBuffer::new(),
            worker: None,
            retired: Vec::new(),
        }
    }
}

impl std::default::Default for Session {
    fn default() -> Self {
        SessionBuilder::default().build()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

// Everything the ingestion thread needs
struct Ingest {
    config: SessionBuilder,
    host: String,
    port: u16,
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    buffer: MessageBuffer,
}

impl Ingest {
    // Thread body
    //
    // Always clears both flags on exit so the session can be
    // started again.
    fn run<D>(self, mut demod: D)
    where
        D: Demodulator,
    {
        if let Some(stream) = self.connect() {
            self.serve(stream, &mut demod);
        }
        self.finish();
    }

    // Ingest from a connected source until it ends
    fn serve<R, D>(&self, source: R, demod: &mut D)
    where
        R: Read,
        D: Demodulator,
    {
        self.read_loop(source, demod);
        self.buffer.push(STATUS_CONNECTION_CLOSED);
    }

    // Nothing is pushed to the buffer after this
    fn finish(&self) {
        self.running.store(false, Ordering::Release);
        info!("ingestion from {}:{} ended", self.host, self.port);
        self.alive.store(false, Ordering::Release);
    }

    fn connect(&self) -> Option<TcpStream> {
        let addrs: Vec<SocketAddr> = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(err) => {
                warn!("unable to resolve {}:{}: {}", self.host, self.port, err);
                self.buffer.push(STATUS_SOCKET_FAILED);
                return None;
            }
        };
        if addrs.is_empty() {
            warn!("no addresses for {}:{}", self.host, self.port);
            self.buffer.push(STATUS_SOCKET_FAILED);
            return None;
        }

        let stream = match TcpStream::connect(addrs.as_slice()) {
            Ok(stream) => stream,
            Err(err) => {
                warn!("unable to connect to {}:{}: {}", self.host, self.port, err);
                self.buffer.push(STATUS_CONNECT_FAILED);
                return None;
            }
        };

        if let Err(err) = stream.set_read_timeout(self.config.read_timeout()) {
            warn!("unable to set read timeout: {}", err);
        }

        info!("connected to {}:{}", self.host, self.port);
        self.buffer
            .push(format!("Connected to {}:{}", self.host, self.port));
        Some(stream)
    }

    fn read_loop<R, D>(&self, mut source: R, demod: &mut D)
    where
        R: Read,
        D: Demodulator,
    {
        let mut decim = Decimator::new(self.config.decimation());
        let mut inbuf = vec![0u8; self.config.read_buffer_size()];

        while self.running.load(Ordering::Acquire) {
            let len = match source.read(&mut inbuf) {
                Ok(0) => {
                    info!("connection closed by peer");
                    break;
                }
                Ok(len) => len,
                Err(err) if is_retryable(&err) => continue,
                Err(err) => {
                    error!("socket read failed: {}", err);
                    self.buffer.push(STATUS_READ_ERROR);
                    break;
                }
            };

            // stopped while blocked in the read
            if !self.running.load(Ordering::Acquire) {
                debug!("discarding {} bytes read after stop", len);
                break;
            }

            let emitted = decim.process_bytes(&inbuf[..len], |i, q| demod.process(i, q));
            trace!("read {} bytes, {} samples to demodulator", len, emitted);

            if let Some(telegram) = demod.take_telegram() {
                self.deliver(telegram);
            }
        }
    }

    fn deliver(&self, telegram: RawTelegram) {
        match telegram.decode() {
            Ok(msg) => debug!(
                "telegram {:010} ({}): {}",
                telegram.address(),
                msg.kind_str(),
                msg
            ),
            Err(err) => debug!("telegram {:010}: {}", telegram.address(), err),
        }
        self.buffer.push(telegram.to_line());
    }
}

// timed-out and interrupted reads only mean "check the flag"
fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
