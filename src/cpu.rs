//! # CPU Register Access
//!
//! Provides [`Cpu`], the register proxy of a live debug session.
//!
//! There is no local register cache: every read and the membership check
//! before every write go through a fresh `drj` round trip, so the proxy
//! always reflects what the target reports right now. Outside a debug
//! session the register set is empty, reads come back absent and writes are
//! rejected.

use crate::errors::{R2Error, Result};
use crate::pipe::Transport;
use crate::record::Record;
use crate::session::Session;

/// Register proxy over the live register set
///
/// Obtained from [`R2::cpu`](crate::R2::cpu) or
/// [`Debugger::cpu`](crate::debugger::Debugger::cpu); borrows the session
/// for its lifetime.
pub struct Cpu<'r, T: Transport> {
    session: &'r mut Session<T>,
}

impl<'r, T: Transport> Cpu<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>) -> Self {
        Self { session }
    }

    /// Snapshot of the full register file as reported by `drj`
    ///
    /// Empty when no debug session is active.
    ///
    /// # Errors
    ///
    /// Fails when the reply is non-empty and not a JSON object.
    pub fn all(&mut self) -> Result<Record> {
        match self.session.cmdj_opt("drj")? {
            Some(v) => Record::from_value(v),
            None => Ok(Record::default()),
        }
    }

    /// The register names the target knows
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Cpu::all`].
    pub fn names(&mut self) -> Result<Vec<String>> {
        Ok(self.all()?.fields().map(str::to_string).collect())
    }

    /// Reads one register, absent when the name is not in the live set
    ///
    /// # Errors
    ///
    /// Fails only on transport or reply-shape problems, never on an unknown
    /// register name.
    pub fn get(&mut self, name: &str) -> Result<Option<u64>> {
        Ok(self.all()?.get_u64(name))
    }

    /// Writes one register
    ///
    /// The name is checked against the live register set before anything is
    /// sent, so a typo never reaches the tool as a command. The write value
    /// goes out in decimal (`dr eax=20`); an empty reply means the tool
    /// rejected the write.
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::InvalidRegister`] when the name is unknown or
    /// the write is rejected.
    pub fn set(&mut self, name: &str, value: u64) -> Result<()> {
        if !self.all()?.has(name) {
            return Err(R2Error::InvalidRegister(name.to_string()));
        }
        let reply = self.session.cmd(&format!("dr {name}={value}"))?;
        if reply.is_empty() {
            return Err(R2Error::InvalidRegister(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    fn session(t: Scripted) -> Session<Scripted> {
        Session::new(t)
    }

    #[test]
    fn test_register_round_trip() {
        let mut s = session(
            Scripted::new()
                .reply("drj", r#"{"eax":10,"ebx":0}"#)
                .reply("dr eax=20", "0x00000014"),
        );
        let mut cpu = Cpu::new(&mut s);

        assert_eq!(cpu.get("eax").unwrap(), Some(10));
        cpu.set("eax", 20).unwrap();
        s.transport_mut().set_reply("drj", r#"{"eax":20,"ebx":0}"#);

        let mut cpu = Cpu::new(&mut s);
        assert_eq!(cpu.get("eax").unwrap(), Some(20));
        assert!(s.transport().was_sent("dr eax=20"));
    }

    #[test]
    fn test_unknown_register_read_is_absent() {
        let mut s = session(Scripted::new().reply("drj", r#"{"eax":10}"#));
        let mut cpu = Cpu::new(&mut s);
        assert_eq!(cpu.get("xyz").unwrap(), None);
    }

    #[test]
    fn test_read_outside_debug_session_is_absent() {
        let mut s = session(Scripted::new());
        let mut cpu = Cpu::new(&mut s);
        assert_eq!(cpu.get("eax").unwrap(), None);
        assert!(cpu.names().unwrap().is_empty());
    }

    #[test]
    fn test_write_unknown_register_sends_nothing() {
        let mut s = session(Scripted::new().reply("drj", r#"{"eax":10}"#));
        let mut cpu = Cpu::new(&mut s);
        assert!(matches!(
            cpu.set("xyz", 1),
            Err(R2Error::InvalidRegister(name)) if name == "xyz"
        ));
        assert_eq!(s.transport().sent(), ["drj"]);
    }

    #[test]
    fn test_write_rejected_by_tool() {
        // Name present in drj but the tool answers the write with nothing.
        let mut s = session(Scripted::new().reply("drj", r#"{"eax":10}"#));
        let mut cpu = Cpu::new(&mut s);
        assert!(matches!(
            cpu.set("eax", 20),
            Err(R2Error::InvalidRegister(_))
        ));
        assert!(s.transport().was_sent("dr eax=20"));
    }

    #[test]
    fn test_names_lists_drj_fields() {
        let mut s = session(Scripted::new().reply("drj", r#"{"eax":1,"ebx":2,"rip":3}"#));
        let mut cpu = Cpu::new(&mut s);
        let names = cpu.names().unwrap();
        assert_eq!(names.len(), 3);
        assert!(names.iter().any(|n| n == "rip"));
    }
}
