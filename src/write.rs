//! # Writing Memory
//!
//! Provides [`Write`], the view over radare2's write commands: raw bytes
//! (`wx`), strings (`w`) and assembled instructions (`wa`).

use crate::addr::Location;
use crate::errors::Result;
use crate::pipe::Transport;
use crate::session::{Session, TempOffset};

/// Encodes bytes as the bare lowercase hex string `wx` expects
pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Write view obtained from [`R2::write`](crate::R2::write)
pub struct Write<'r, T: Transport> {
    session: &'r mut Session<T>,
    tmp: TempOffset,
}

impl<'r, T: Transport> Write<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>) -> Self {
        Self {
            session,
            tmp: TempOffset::new(),
        }
    }

    /// Sets the one-shot addressing modifier for the next command
    pub fn at(&mut self, loc: impl Into<Location>) -> &mut Self {
        self.tmp.set(loc);
        self
    }

    /// Writes raw bytes at the current seek or the pending modifier (`wx`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn bytes(&mut self, data: &[u8]) -> Result<()> {
        let suffix = self.tmp.suffix();
        let hex = encode_hex(data);
        self.session.cmd(&format!("wx {hex}{suffix}"))?;
        Ok(())
    }

    /// Writes a string (`w`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn string(&mut self, text: &str) -> Result<()> {
        let suffix = self.tmp.suffix();
        self.session.cmd(&format!("w {text}{suffix}"))?;
        Ok(())
    }

    /// Assembles an instruction and writes its encoding (`wa`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn assemble(&mut self, asm: &str) -> Result<()> {
        let suffix = self.tmp.suffix();
        self.session.cmd(&format!("wa {asm}{suffix}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_encode_hex() {
        assert_eq!(encode_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
        assert_eq!(encode_hex(&[]), "");
        assert_eq!(encode_hex(&[0x00, 0x0f]), "000f");
    }

    #[test]
    fn test_write_commands() {
        let mut s = Session::new(Scripted::new());
        let mut write = Write::new(&mut s);
        write.bytes(&[0x90, 0x90]).unwrap();
        write.at(0x400000u64).bytes(&[0xc3]).unwrap();
        write.string("hello").unwrap();
        write.at("main").assemble("ret").unwrap();
        assert_eq!(
            s.transport().sent(),
            ["wx 9090", "wx c3 @ 0x400000", "w hello", "wa ret @ main"]
        );
    }
}
