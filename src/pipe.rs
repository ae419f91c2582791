//! # Pipe Transports
//!
//! Provides the command channel to radare2.
//!
//! This module contains the [`Transport`] trait, which abstracts the
//! request/response exchange, and two implementations: [`R2Process`], which
//! spawns a real radare2 process and speaks its stdio protocol, and
//! [`Scripted`], a canned transport for tests and offline use.
//!
//! The wire protocol is line oriented: each command is a single line
//! terminated by `\n`, and each reply is arbitrary text terminated by a NUL
//! byte (`\0`). On startup radare2 emits one NUL as a ready handshake.

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::errors::{R2Error, Result};

/// A request/response channel speaking the radare2 command protocol
///
/// Implementors take one command at a time and return the raw reply text with
/// the protocol framing (the trailing NUL) already removed. Whitespace inside
/// and around the reply is preserved; trimming is the caller's business.
pub trait Transport {
    /// Sends a single command and reads the complete reply
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::BadCommand`] if `cmd` contains the line
    /// terminator, and with a transport error if the channel is gone.
    fn request(&mut self, cmd: &str) -> Result<String>;

    /// Shuts the channel down
    ///
    /// Closing twice is allowed and does nothing the second time.
    ///
    /// # Errors
    ///
    /// Fails if the underlying channel could not be torn down cleanly.
    fn close(&mut self) -> Result<()>;
}

/// A radare2 process driven over its stdio pipes
///
/// Spawns `radare2 -q0 <target>` with stdin/stdout piped and stderr passed
/// through, performs the initial NUL handshake, and then exchanges
/// newline-terminated commands for NUL-terminated replies.
///
/// Dropping an [`R2Process`] that was not closed sends `q!` and reaps the
/// child, so the external process does not outlive the handle on any exit
/// path.
pub struct R2Process {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    closed: bool,
}

impl R2Process {
    /// Spawns radare2 on the given target file
    ///
    /// The binary is located on `PATH`, trying `radare2` first and `r2` as a
    /// fallback.
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::ToolNotFound`] if no radare2 binary is on
    /// `PATH`, or with an I/O error if the process could not be spawned or
    /// the handshake did not arrive.
    pub fn spawn(target: impl AsRef<Path>) -> Result<Self> {
        Self::spawn_with_flags(target, &[])
    }

    /// Spawns radare2 on the given target with extra command-line flags
    ///
    /// Flags are inserted between `-q0` and the target path, so things like
    /// `-d` (debug mode), `-w` (writeable) or `-2` (close stderr) end up
    /// where radare2 expects them.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`R2Process::spawn`].
    pub fn spawn_with_flags(target: impl AsRef<Path>, flags: &[String]) -> Result<Self> {
        let binary = Self::locate_binary()?;
        Self::spawn_binary(binary, target, flags)
    }

    /// Spawns a specific radare2 binary, bypassing the `PATH` lookup
    ///
    /// # Errors
    ///
    /// Fails with an I/O error if the process could not be spawned or the
    /// handshake did not arrive.
    pub fn spawn_binary(
        binary: impl AsRef<Path>,
        target: impl AsRef<Path>,
        flags: &[String],
    ) -> Result<Self> {
        let binary = binary.as_ref();
        let target = target.as_ref();

        let mut cmd = Command::new(binary);
        cmd.arg("-q0");
        for flag in flags {
            cmd.arg(flag);
        }
        cmd.arg(target);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn()?;
        debug!(
            "spawned {} (pid {}) on {}",
            binary.display(),
            child.id(),
            target.display()
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("no stdin handle on child"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("no stdout handle on child"))?;

        let mut this = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            closed: false,
        };

        // -q0 announces readiness with a single NUL before the first command.
        this.read_reply()?;
        Ok(this)
    }

    fn locate_binary() -> Result<PathBuf> {
        Ok(which::which("radare2").or_else(|_| which::which("r2"))?)
    }

    /// Reads one NUL-terminated reply, without the terminator
    fn read_reply(&mut self) -> Result<String> {
        let mut buf: Vec<u8> = Vec::new();
        let n = self.stdout.read_until(0x00, &mut buf)?;
        if n == 0 {
            return Err(R2Error::PipeClosed);
        }
        if buf.last() == Some(&0x00) {
            buf.pop();
        }
        // radare2 output is not guaranteed to be valid UTF-8 (raw bytes can
        // leak into disassembly text), so decode lossily.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Transport for R2Process {
    fn request(&mut self, cmd: &str) -> Result<String> {
        if self.closed {
            return Err(R2Error::PipeClosed);
        }
        if cmd.contains('\n') {
            return Err(R2Error::BadCommand(cmd.to_string()));
        }
        self.stdin.write_all(cmd.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        self.read_reply()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("closing radare2 (pid {})", self.child.id());
        // Best effort: the process may already be gone, in which case the
        // write fails with a broken pipe and wait() reaps immediately.
        let _ = self.stdin.write_all(b"q!\n");
        let _ = self.stdin.flush();
        self.child.wait()?;
        Ok(())
    }
}

impl Drop for R2Process {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.close() {
            warn!("radare2 did not shut down cleanly: {e}");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// A transport that answers from a canned command-to-reply table
///
/// Commands with no table entry get an empty reply, which is also what
/// radare2 sends for commands that produce no output. A command can carry a
/// queue of replies; the queue is drained front to back and the last reply
/// sticks for all further requests of that command. Every request is recorded
/// in order, so tests can assert the exact command traffic.
///
/// ```
/// use r2kit::pipe::{Scripted, Transport};
///
/// let mut t = Scripted::new().reply("ij", r#"{"core":{"file":"/bin/ls"}}"#);
/// assert_eq!(t.request("ij").unwrap(), r#"{"core":{"file":"/bin/ls"}}"#);
/// assert_eq!(t.request("s 0x1000").unwrap(), "");
/// assert_eq!(t.sent(), ["ij", "s 0x1000"]);
/// ```
#[derive(Debug, Default)]
pub struct Scripted {
    replies: HashMap<String, VecDeque<String>>,
    sent: Vec<String>,
    closed: bool,
}

impl Scripted {
    /// Creates an empty scripted transport
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reply for a command, builder style
    ///
    /// Calling this repeatedly for the same command queues the replies in
    /// order.
    #[must_use]
    pub fn reply(mut self, cmd: impl Into<String>, reply: impl Into<String>) -> Self {
        self.queue_reply(cmd, reply);
        self
    }

    /// Replaces all replies for a command with a single one
    pub fn set_reply(&mut self, cmd: impl Into<String>, reply: impl Into<String>) {
        let mut queue = VecDeque::new();
        queue.push_back(reply.into());
        self.replies.insert(cmd.into(), queue);
    }

    /// Appends a reply to the queue for a command
    pub fn queue_reply(&mut self, cmd: impl Into<String>, reply: impl Into<String>) {
        self.replies.entry(cmd.into()).or_default().push_back(reply.into());
    }

    /// All commands requested so far, in order
    #[must_use]
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// The most recent command, if any
    #[must_use]
    pub fn last_sent(&self) -> Option<&str> {
        self.sent.last().map(String::as_str)
    }

    /// Whether a command was requested at least once
    #[must_use]
    pub fn was_sent(&self, cmd: &str) -> bool {
        self.sent.iter().any(|c| c == cmd)
    }
}

impl Transport for Scripted {
    fn request(&mut self, cmd: &str) -> Result<String> {
        if self.closed {
            return Err(R2Error::PipeClosed);
        }
        if cmd.contains('\n') {
            return Err(R2Error::BadCommand(cmd.to_string()));
        }
        self.sent.push(cmd.to_string());
        let reply = match self.replies.get_mut(cmd) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => String::new(),
        };
        Ok(reply)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scripted_unknown_command_is_empty() {
        let mut t = Scripted::new();
        assert_eq!(t.request("dr eax=20").unwrap(), "");
    }

    #[test]
    fn test_scripted_last_reply_sticks() {
        let mut t = Scripted::new()
            .reply("drj", r#"{"eax":10}"#)
            .reply("drj", r#"{"eax":20}"#);
        assert_eq!(t.request("drj").unwrap(), r#"{"eax":10}"#);
        assert_eq!(t.request("drj").unwrap(), r#"{"eax":20}"#);
        assert_eq!(t.request("drj").unwrap(), r#"{"eax":20}"#);
    }

    #[test]
    fn test_scripted_records_traffic() {
        let mut t = Scripted::new();
        t.request("aaa").unwrap();
        t.request("aflj").unwrap();
        assert_eq!(t.sent(), ["aaa", "aflj"]);
        assert_eq!(t.last_sent(), Some("aflj"));
        assert!(t.was_sent("aaa"));
        assert!(!t.was_sent("dc"));
    }

    #[test]
    fn test_scripted_rejects_multiline_commands() {
        let mut t = Scripted::new();
        assert!(matches!(
            t.request("s 0x1000\nq!"),
            Err(R2Error::BadCommand(_))
        ));
    }

    #[test]
    fn test_scripted_closed_channel_fails() {
        let mut t = Scripted::new();
        t.close().unwrap();
        t.close().unwrap();
        assert!(matches!(t.request("ij"), Err(R2Error::PipeClosed)));
    }
}
