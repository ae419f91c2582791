//! # Debugger Control
//!
//! Provides [`Debugger`], the view over radare2's debug commands: starting
//! and stepping the target, the continue variants, breakpoints, memory maps
//! and backtraces.
//!
//! The until-continue modes are flags consumed by the next [`Debugger::cont`]
//! call. When several are set at once, the precedence is fixed: call, then
//! unknown call, then return, then plain continue. Every `cont` resets all
//! of them, whichever one fired.

use crate::addr::Location;
use crate::cpu::Cpu;
use crate::errors::Result;
use crate::pipe::Transport;
use crate::record::RecordList;
use crate::session::{Session, TempOffset};

/// Debug-session view obtained from [`R2::debugger`](crate::R2::debugger)
pub struct Debugger<'r, T: Transport> {
    session: &'r mut Session<T>,
    tmp: TempOffset,
    until_call: bool,
    until_unknown_call: bool,
    until_ret: bool,
}

impl<'r, T: Transport> Debugger<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>) -> Self {
        Self {
            session,
            tmp: TempOffset::new(),
            until_call: false,
            until_unknown_call: false,
            until_ret: false,
        }
    }

    /// Register proxy for the running target
    pub fn cpu(&mut self) -> Cpu<'_, T> {
        Cpu::new(self.session)
    }

    /// Sets the one-shot addressing modifier for the next breakpoint call
    ///
    /// A pending modifier takes precedence over the explicit argument of
    /// [`Debugger::set_breakpoint`] / [`Debugger::delete_breakpoint`] and is
    /// cleared once used.
    pub fn at(&mut self, loc: impl Into<Location>) -> &mut Self {
        self.tmp.set(loc);
        self
    }

    /// Reopens the file in debug mode (`doo`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn start(&mut self) -> Result<String> {
        self.session.cmd("doo")
    }

    /// Single instruction step (`ds`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn step(&mut self) -> Result<String> {
        self.session.cmd("ds")
    }

    /// Continues execution
    ///
    /// Issues `dcc`, `dccu`, `dcr` or `dc` depending on which until-mode is
    /// armed, then disarms all of them. Returns whatever status text the
    /// tool printed while the target ran.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn cont(&mut self) -> Result<String> {
        let cmd = if self.until_call {
            "dcc"
        } else if self.until_unknown_call {
            "dccu"
        } else if self.until_ret {
            "dcr"
        } else {
            "dc"
        };
        self.until_call = false;
        self.until_unknown_call = false;
        self.until_ret = false;
        self.session.cmd(cmd)
    }

    /// Arms continue-until-call for the next [`Debugger::cont`]
    pub fn until_call(&mut self) -> &mut Self {
        self.until_call = true;
        self
    }

    /// Arms continue-until-unknown-call for the next [`Debugger::cont`]
    pub fn until_unknown_call(&mut self) -> &mut Self {
        self.until_unknown_call = true;
        self
    }

    /// Arms continue-until-return for the next [`Debugger::cont`]
    pub fn until_ret(&mut self) -> &mut Self {
        self.until_ret = true;
        self
    }

    /// Sets a breakpoint (`db`)
    ///
    /// A pending [`Debugger::at`] modifier overrides `loc`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn set_breakpoint(&mut self, loc: impl Into<Location>) -> Result<()> {
        let loc = self.tmp.consume().unwrap_or_else(|| loc.into());
        self.session.cmd(&format!("db {loc}"))?;
        Ok(())
    }

    /// Deletes a breakpoint (`db-`)
    ///
    /// A pending [`Debugger::at`] modifier overrides `loc`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn delete_breakpoint(&mut self, loc: impl Into<Location>) -> Result<()> {
        let loc = self.tmp.consume().unwrap_or_else(|| loc.into());
        self.session.cmd(&format!("db- {loc}"))?;
        Ok(())
    }

    /// Lists breakpoints (`dbj`), empty outside a debug session
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn breakpoints(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("dbj")?;
        RecordList::from_opt(v)
    }

    /// Lists memory maps of the target (`dmj`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn memory_maps(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("dmj")?;
        RecordList::from_opt(v)
    }

    /// Backtrace of the current thread (`dbtj`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn backtrace(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("dbtj")?;
        RecordList::from_opt(v)
    }
}
