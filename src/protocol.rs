//! AT command framing and the command/response exchange.
//!
//! Every command follows the same cycle: the framed command is written with a
//! trailing carriage return, then the line stream is polled until the echoed
//! command is seen, the response body accumulates, and a literal `OK` or
//! `ERROR` line terminates the exchange. Response attribution relies purely
//! on this ordering, so at most one command may be outstanding per transport;
//! `&mut self` on [`Connection`] enforces that structurally.

use std::time::{Duration, Instant};

use log::{debug, error};

use crate::transport::{RfidTransport, SerialSettings};
use crate::types::RfidError;

/// Default deadline for a command/response cycle.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Frame a command verb with its parameters.
///
/// Absent parameters are omitted from the comma-joined list while the order
/// of the present ones is preserved. Parameter values are sent as given, the
/// caller is responsible for formatting them.
pub(crate) fn build_command(command: &str, parameters: &[Option<String>]) -> String {
    if parameters.is_empty() {
        return command.to_string();
    }
    let joined: Vec<&str> = parameters
        .iter()
        .filter_map(|p| p.as_deref())
        .collect();
    format!("{command}={}", joined.join(","))
}

/// Extract the error detail between the last `<` and the last `>` of the
/// accumulated body, falling back to the whole body.
fn error_detail(body: &str) -> &str {
    match (body.rfind('<'), body.rfind('>')) {
        (Some(start), Some(end)) if start < end => &body[start + 1..end],
        (Some(_), Some(_)) => "",
        _ => body,
    }
}

/// The command/response engine owning the transport.
pub(crate) struct Connection<T: RfidTransport> {
    transport: T,
    poll_timeout: Duration,
}

impl<T: RfidTransport> Connection<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self {
            transport,
            poll_timeout: SerialSettings::default().timeout,
        }
    }

    /// Configure the serial link and enable command echo on the device.
    ///
    /// `ATE1` is issued without waiting for an echo since the echo mode is
    /// unknown until the command took effect.
    pub(crate) fn initialise(&mut self, settings: &SerialSettings) -> Result<(), RfidError> {
        self.transport
            .configure(settings)
            .map_err(transport_error)?;
        self.poll_timeout = settings.timeout;
        self.execute("ATE1", &[], DEFAULT_TIMEOUT, false)?;
        Ok(())
    }

    /// Send a command and collect its response body lines.
    pub(crate) fn command(
        &mut self,
        command: &str,
        parameters: &[Option<String>],
    ) -> Result<Vec<String>, RfidError> {
        self.execute(command, parameters, DEFAULT_TIMEOUT, true)
    }

    /// Send a command with a non-default deadline, for operations whose
    /// response time is bounded by a device-side duration.
    pub(crate) fn command_with_timeout(
        &mut self,
        command: &str,
        parameters: &[Option<String>],
        timeout: Duration,
    ) -> Result<Vec<String>, RfidError> {
        self.execute(command, parameters, timeout, true)
    }

    fn execute(
        &mut self,
        command: &str,
        parameters: &[Option<String>],
        timeout: Duration,
        expect_echo: bool,
    ) -> Result<Vec<String>, RfidError> {
        let sent = build_command(command, parameters);
        debug!("send: {sent}");
        self.transport
            .write(format!("{sent}\r").as_bytes())
            .map_err(transport_error)?;

        let deadline = Instant::now() + timeout;
        let mut body = String::new();
        let mut echo_seen = !expect_echo;
        loop {
            let raw = match self.transport.read_line(self.poll_timeout) {
                Ok(raw) => raw,
                Err(err) => {
                    error!("read error: {err:?}");
                    return Err(transport_error(err));
                }
            };
            let Some(raw) = raw else {
                if Instant::now() >= deadline {
                    break;
                }
                continue;
            };
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            debug!("recv: {line}");
            if echo_seen {
                if line == "OK" {
                    if body.is_empty() {
                        return Ok(vec![String::new()]);
                    }
                    return Ok(body.split('\r').map(str::to_string).collect());
                }
                if line == "ERROR" {
                    return Err(RfidError::Reader(error_detail(&body).to_string()));
                }
                // a later block supersedes the previous one, only the block
                // directly before the terminal marker is the response body
                body = line.to_string();
            } else if line.contains(&sent) {
                echo_seen = true;
            }
        }
        if body.is_empty() {
            Err(RfidError::NoResponse(sent))
        } else {
            Err(RfidError::UnexpectedResponse(format!(
                "wrong response for command {sent} - {body}"
            )))
        }
    }
}

fn transport_error<E: std::fmt::Debug>(err: E) -> RfidError {
    RfidError::Transport(format!("{err:?}"))
}
