//! # Reading Memory
//!
//! Provides [`Print`], the view over radare2's output commands: raw bytes
//! (`p8`), disassembly listings (`pd`) and hexdumps (`px`).
//!
//! `p8` answers with a bare hex string; [`Print::bytes`] decodes it to raw
//! bytes so callers never see the wire spelling. The listing commands pass
//! the tool's text through untouched.

use crate::addr::Location;
use crate::errors::{R2Error, Result};
use crate::pipe::Transport;
use crate::session::{Session, TempOffset};

/// Decodes a bare hex string as `p8` prints it
pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return Err(R2Error::BadHex(s.to_string()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| R2Error::BadHex(s.to_string()))
        })
        .collect()
}

/// Output view obtained from [`R2::print`](crate::R2::print)
pub struct Print<'r, T: Transport> {
    session: &'r mut Session<T>,
    tmp: TempOffset,
}

impl<'r, T: Transport> Print<'r, T> {
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

    /// Reads `len` bytes at the current seek or the pending modifier (`p8`)
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::BadHex`] when the reply is not a hex string of
    /// whole bytes.
    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let suffix = self.tmp.suffix();
        let raw = self.session.cmd(&format!("p8 {len}{suffix}"))?;
        decode_hex(&raw)
    }

    /// Disassembles `n` instructions (`pd`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn disasm(&mut self, n: usize) -> Result<String> {
        let suffix = self.tmp.suffix();
        self.session.cmd(&format!("pd {n}{suffix}"))
    }

    /// Hexdumps `n` bytes (`px`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn hexdump(&mut self, n: usize) -> Result<String> {
        let suffix = self.tmp.suffix();
        self.session.cmd(&format!("px {n}{suffix}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("deadbeef").unwrap(), [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert!(matches!(decode_hex("abc"), Err(R2Error::BadHex(_))));
        assert!(matches!(decode_hex("zz"), Err(R2Error::BadHex(_))));
    }

    #[test]
    fn test_bytes_decodes_reply() {
        let mut s = Session::new(
            Scripted::new()
                .reply("p8 4", "90909090")
                .reply("p8 2 @ 0x400000", "55c3"),
        );
        let mut print = Print::new(&mut s);
        assert_eq!(print.bytes(4).unwrap(), [0x90; 4]);
        assert_eq!(print.at(0x400000u64).bytes(2).unwrap(), [0x55, 0xc3]);
    }

    #[test]
    fn test_modifier_applies_once() {
        let mut s = Session::new(Scripted::new());
        let mut print = Print::new(&mut s);
        print.at("main").disasm(5).unwrap();
        print.disasm(5).unwrap();
        print.hexdump(32).unwrap();
        assert_eq!(s.transport().sent(), ["pd 5 @ main", "pd 5", "px 32"]);
    }
}
