//! Line-oriented stand-in for the IPMI transport.
//!
//! Each non-empty stdin line is one OEM request payload in hex. Whitespace
//! between bytes is ignored and `#` starts a comment:
//!
//! ```text
//! # reset  domain bus dev fn vendor device class    rev
//!   01     0000   00  1f  00 8086   a1b2   00060100 03
//! ```
//!
//! Lines are read on a plain OS thread and handed over through a channel.
//! That thread is never joined: a read blocked on an open terminal or pipe
//! must not hold up exit after a shutdown signal.

use std::collections::HashMap;
use std::io::BufRead;
use std::thread;

use pciinv_sync::{CompletionCode, OemCommand, OemHandler, OemRouter};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const LINE_BUFFER: usize = 64;

/// Dispatches payloads by (NetFn, command, IANA).
#[derive(Default)]
pub struct LineRouter {
    routes: HashMap<(u8, u8, u32), OemHandler>,
}

impl LineRouter {
    pub fn dispatch(&self, command: &OemCommand, payload: &[u8]) -> Option<CompletionCode> {
        self.routes
            .get(&(command.netfn, command.cmd, command.iana))
            .map(|handler| handler(payload))
    }
}

impl OemRouter for LineRouter {
    fn register_oem(&mut self, command: OemCommand, handler: OemHandler) {
        debug!(
            netfn = command.netfn,
            cmd = command.cmd,
            iana = command.iana,
            privilege = ?command.privilege,
            "OEM command registered"
        );
        self.routes
            .insert((command.netfn, command.cmd, command.iana), handler);
    }
}

/// Parses one hex line. Returns `Ok(None)` for blank or comment lines.
pub fn parse_hex_line(line: &str) -> Result<Option<Vec<u8>>, String> {
    let content = line.split('#').next().unwrap_or_default();
    let digits: String = content.chars().filter(|c| !c.is_whitespace()).collect();

    if digits.is_empty() {
        return Ok(None);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex digit '{bad}'"));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }

    // All ASCII from here on, so byte offsets are char boundaries.
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| format!("invalid hex byte '{}': {e}", &digits[i..i + 2]))
        })
        .collect::<Result<Vec<u8>, String>>()
        .map(Some)
}

/// Starts a reader thread forwarding every line of `reader` until EOF, a
/// read error, or the receiver going away.
pub fn spawn_reader<R>(reader: R) -> std::io::Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    thread::Builder::new()
        .name("pciinvd-stdin".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(?e, "Failed to read input");
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

/// Feeds every received line to the PCI inventory command until the reader
/// thread finishes. Returns the number of accepted requests.
pub async fn serve(mut lines: mpsc::Receiver<String>, router: &LineRouter) -> u64 {
    let mut accepted = 0u64;
    let mut line_no = 0u64;

    while let Some(line) = lines.recv().await {
        line_no += 1;

        let payload = match parse_hex_line(&line) {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed input line");
                continue;
            }
        };

        match router.dispatch(&OemCommand::PCI_INVENTORY, &payload) {
            Some(code) if code.is_success() => accepted += 1,
            Some(code) => warn!(line = line_no, %code, "Request rejected"),
            None => warn!(line = line_no, "No handler registered for PCI inventory command"),
        }
    }

    info!(lines = line_no, accepted, "End of input");
    accepted
}
