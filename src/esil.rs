//! ESIL emulation: init, stepping and expression evaluation (`ae` family).

use crate::addr::Location;
use crate::errors::Result;
use crate::pipe::Transport;
use crate::session::{Session, TempOffset};

/// ESIL view obtained from [`R2::esil`](crate::R2::esil)
pub struct Esil<'r, T: Transport> {
    session: &'r mut Session<T>,
    tmp: TempOffset,
}

impl<'r, T: Transport> Esil<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>) -> Self {
        Self {
            session,
            tmp: TempOffset::new(),
        }
    }

    /// Sets the one-shot addressing modifier for the next
    /// [`Esil::init_pc`]
    pub fn at(&mut self, loc: impl Into<Location>) -> &mut Self {
        self.tmp.set(loc);
        self
    }

    /// Initializes the ESIL VM state (`aei`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn init(&mut self) -> Result<()> {
        self.session.cmd("aei")?;
        Ok(())
    }

    /// Initializes the ESIL VM stack memory (`aeim`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn init_memory(&mut self) -> Result<()> {
        self.session.cmd("aeim")?;
        Ok(())
    }

    /// Points the ESIL program counter at the current seek or the pending
    /// modifier (`aeip`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn init_pc(&mut self) -> Result<()> {
        let suffix = self.tmp.suffix();
        self.session.cmd(&format!("aeip{suffix}"))?;
        Ok(())
    }

    /// Emulates one instruction (`aes`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn step(&mut self) -> Result<()> {
        self.session.cmd("aes")?;
        Ok(())
    }

    /// Emulates until the program counter reaches `loc` (`aesu`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn step_until(&mut self, loc: impl Into<Location>) -> Result<()> {
        self.session.cmd(&format!("aesu {}", loc.into()))?;
        Ok(())
    }

    /// Evaluates an ESIL expression (`ae`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn eval(&mut self, expr: &str) -> Result<String> {
        self.session.cmd(&format!("ae {expr}"))
    }
}
