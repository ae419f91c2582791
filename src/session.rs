//! # Command Session
//!
//! Provides [`Session`], the single place where command strings go out and
//! replies come back in, and [`TempOffset`], the one-shot addressing
//! modifier that appends ` @ <expr>` to the next command.
//!
//! Everything above this layer builds command strings and interprets reply
//! shapes; everything below it is wire plumbing. The session trims the reply
//! framing (surrounding newlines) but never touches interior whitespace, so
//! hexdumps and disassembly listings come through intact.

use serde_json::Value;
use tracing::trace;

use crate::addr::Location;
use crate::errors::{R2Error, Result};
use crate::pipe::Transport;

/// Owns a [`Transport`] and executes commands over it
///
/// One session exists per radare2 instance. The JSON variants parse the
/// reply with [`serde_json`]; which one to use depends on what an empty
/// reply means for the command at hand: [`Session::cmdj`] treats it as a
/// protocol violation, [`Session::cmdj_opt`] treats it as "nothing there".
pub struct Session<T: Transport> {
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Sends a command verbatim and returns the reply with framing trimmed
    ///
    /// # Errors
    ///
    /// Propagates transport failures unmodified.
    pub fn cmd(&mut self, cmd: &str) -> Result<String> {
        trace!("-> {cmd}");
        let reply = self.transport.request(cmd)?;
        let trimmed = reply.trim();
        trace!("<- {} bytes", trimmed.len());
        Ok(trimmed.to_string())
    }

    /// Sends a command and parses the reply as JSON
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::MalformedResponse`] when the reply is not valid
    /// JSON, including when it is empty.
    pub fn cmdj(&mut self, cmd: &str) -> Result<Value> {
        let raw = self.cmd(cmd)?;
        serde_json::from_str(&raw).map_err(|source| R2Error::MalformedResponse {
            cmd: cmd.to_string(),
            source,
        })
    }

    /// Sends a command and parses the reply as JSON, mapping an empty reply
    /// to `None`
    ///
    /// Listing commands answer with nothing at all when the queried state
    /// does not exist (no debug session, no analysis yet). That absence is
    /// legitimate and distinct from a malformed reply.
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::MalformedResponse`] when the reply is non-empty
    /// and not valid JSON.
    pub fn cmdj_opt(&mut self, cmd: &str) -> Result<Option<Value>> {
        let raw = self.cmd(cmd)?;
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| R2Error::MalformedResponse {
                cmd: cmd.to_string(),
                source,
            })
    }

    /// Closes the underlying transport
    ///
    /// # Errors
    ///
    /// Propagates the transport's teardown failure.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// One-shot addressing modifier
///
/// Holds at most one pending [`Location`]. Setting a new one overwrites the
/// old, there is no queue. Consuming returns the pending location and resets
/// the state, so a modifier applies to exactly one command.
#[derive(Debug, Default)]
pub struct TempOffset(Option<Location>);

impl TempOffset {
    #[must_use]
    pub fn new() -> Self {
        Self(None)
    }

    /// Sets the pending location, replacing any previous one
    pub fn set(&mut self, loc: impl Into<Location>) {
        self.0 = Some(loc.into());
    }

    /// Takes the pending location, leaving the modifier unset
    pub fn consume(&mut self) -> Option<Location> {
        self.0.take()
    }

    /// Consumes the pending location into a command suffix
    ///
    /// Returns ` @ <expr>` when a location is pending and an empty string
    /// otherwise, ready to be appended to a command verbatim.
    pub fn suffix(&mut self) -> String {
        match self.consume() {
            Some(loc) => format!(" @ {loc}"),
            None => String::new(),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_cmd_trims_framing_only() {
        let mut s = Session::new(Scripted::new().reply("pd 1", "\n  0x1000  nop\n"));
        assert_eq!(s.cmd("pd 1").unwrap(), "0x1000  nop");
    }

    #[test]
    fn test_cmdj_rejects_empty_reply() {
        let mut s = Session::new(Scripted::new());
        assert!(matches!(
            s.cmdj("ij"),
            Err(R2Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_cmdj_rejects_garbage() {
        let mut s = Session::new(Scripted::new().reply("ij", "Cannot open file"));
        assert!(matches!(
            s.cmdj("ij"),
            Err(R2Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_cmdj_opt_maps_empty_to_none() {
        let mut s = Session::new(Scripted::new().reply("aflj", ""));
        assert!(s.cmdj_opt("aflj").unwrap().is_none());

        let mut s = Session::new(Scripted::new().reply("aflj", "[]"));
        let v = s.cmdj_opt("aflj").unwrap().unwrap();
        assert!(v.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_temp_offset_overwrites() {
        let mut tmp = TempOffset::new();
        tmp.set("main");
        tmp.set(0x1000u64);
        assert_eq!(tmp.consume(), Some(Location::from(0x1000u64)));
        assert_eq!(tmp.consume(), None);
    }

    #[test]
    fn test_temp_offset_suffix_consumes() {
        let mut tmp = TempOffset::new();
        assert_eq!(tmp.suffix(), "");
        tmp.set("main");
        assert!(tmp.is_pending());
        assert_eq!(tmp.suffix(), " @ main");
        assert!(!tmp.is_pending());
        assert_eq!(tmp.suffix(), "");
    }
}
