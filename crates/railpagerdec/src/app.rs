//! Replay decoding
//!
//! Reads telegram text line by line, decodes each telegram,
//! and prints the result. Malformed telegrams are logged and
//! skipped; they never stop the program.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use log::{debug, trace, warn};
use railpager::{MessageLine, ParsedMessage, TelegramDecodeErr};

use crate::cli::Args;

/// Decoding totals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Telegrams found in the input
    pub telegrams: usize,

    /// Telegrams of a recognized kind
    pub decoded: usize,

    /// Telegrams of an unrecognized kind
    pub unknown: usize,

    /// Telegrams which failed to decode
    pub malformed: usize,
}

/// Run the application
///
/// Decodes every telegram in `input` according to the
/// command-line `args` and writes one line per telegram to
/// `output`. Returns totals once `input` is exhausted.
pub fn run<R, W>(args: &Args, mut input: R, output: &mut W) -> anyhow::Result<Summary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = Summary::default();
    let mut raw_line = Vec::new();

    loop {
        raw_line.clear();
        let len = input
            .read_until(b'\n', &mut raw_line)
            .context("unable to read input")?;
        if len == 0 {
            break;
        }

        // telegram bodies are not guaranteed to be UTF-8
        let text = String::from_utf8_lossy(&raw_line);
        let text = text.trim_end_matches(['\r', '\n']);

        let (label, result) = if args.raw {
            if text.is_empty() {
                continue;
            }
            (None, railpager::decode(text))
        } else {
            match MessageLine::parse(text) {
                Some(line) => (line.address(), line.decode()),
                None => {
                    trace!("not a telegram: {}", text);
                    continue;
                }
            }
        };

        summary.telegrams += 1;
        match result {
            Ok(ParsedMessage::Unknown(raw)) => {
                summary.unknown += 1;
                debug!("unrecognized telegram: {}", raw.escape_debug());
                if args.unknown && !args.quiet {
                    print_message(output, label, &ParsedMessage::Unknown(raw))?;
                }
            }
            Ok(msg) => {
                summary.decoded += 1;
                if !args.quiet {
                    print_message(output, label, &msg)?;
                }
            }
            Err(err) => {
                summary.malformed += 1;
                report_malformed(text, &err);
            }
        }
    }

    output.flush().context("unable to write output")?;
    Ok(summary)
}

fn print_message<W>(output: &mut W, address: Option<u32>, msg: &ParsedMessage) -> io::Result<()>
where
    W: Write,
{
    match address {
        Some(addr) => writeln!(output, "{:010}: {}", addr, msg),
        None => writeln!(output, "{}", msg),
    }
}

fn report_malformed(text: &str, err: &TelegramDecodeErr) {
    warn!("{}: \"{}\"", err, text.escape_debug());
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    fn run_str(args: &[&str], input: &str) -> (Summary, String) {
        let mut argv = vec!["railpagerdec"];
        argv.extend_from_slice(args);
        let args = Args::try_parse_from(argv).expect("parse");

        let mut out = Vec::new();
        let summary = run(&args, input.as_bytes(), &mut out).expect("run");
        (summary, String::from_utf8(out).expect("utf-8"))
    }

    const SESSION_LOG: &str = "Connected to 127.0.0.1:14423\n\
        [MSG] 0001234000 ABC123 80 4521\r\n\
        [MSG] 0001234000 ABC123\n\
        [MSG] 0000000077 something else\n\
        [MSG] 0001234002 00001234567820000000000000000011430567812345678\n\
        Connection closed\n";

    #[test]
    fn test_session_log() {
        let (summary, out) = run_str(&[], SESSION_LOG);
        assert_eq!(
            summary,
            Summary {
                telegrams: 4,
                decoded: 2,
                unknown: 1,
                malformed: 1,
            }
        );

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "0001234000: train ABC123 speed 80 km/h mileage 4521 km",
                "0001234002: vehicle 12345678 at 12.345678, 114.305678 route -",
            ]
        );
    }

    #[test]
    fn test_unknown_and_quiet() {
        let (_, out) = run_str(&["--unknown"], SESSION_LOG);
        assert!(out
            .lines()
            .any(|l| l == "0000000077: unknown: 0000000077 something else"));

        let (summary, out) = run_str(&["--quiet", "--unknown"], SESSION_LOG);
        assert_eq!(summary.telegrams, 4);
        assert!(out.is_empty());
    }

    #[test]
    fn test_route_name() {
        let input = "[MSG] 0001234002 00001234567820U).9UU.6 (-(200011430567812345678\n";
        let (summary, out) = run_str(&[], input);
        assert_eq!(summary.decoded, 1);
        assert_eq!(
            out,
            "0001234002: vehicle 12345678 at 12.345678, 114.305678 route 京沪线\n"
        );
    }

    #[test]
    fn test_raw() {
        let input = "1234000 K77 60 12\n\n1234000\n";
        let (summary, out) = run_str(&["--raw"], input);
        assert_eq!(summary.telegrams, 2);
        assert_eq!(summary.decoded, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(out, "train K77 speed 60 km/h mileage 12 km\n");
    }

    #[test]
    fn test_invalid_utf8() {
        let args = Args::try_parse_from(["railpagerdec", "--raw"]).expect("parse");
        let input: &[u8] = b"1234000 \xff 1 2\n";
        let mut out = Vec::new();
        let summary = run(&args, input, &mut out).expect("run");
        assert_eq!(summary.decoded, 1);
        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            "train \u{fffd} speed 1 km/h mileage 2 km\n"
        );
    }
}
