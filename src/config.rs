//! Configuration variables (`e`).

use crate::errors::Result;
use crate::pipe::Transport;
use crate::session::Session;

/// Config view obtained from [`R2::config`](crate::R2::config)
pub struct Config<'r, T: Transport> {
    session: &'r mut Session<T>,
}

impl<'r, T: Transport> Config<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>) -> Self {
        Self { session }
    }

    /// Reads a configuration variable
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn get(&mut self, key: &str) -> Result<String> {
        self.session.cmd(&format!("e {key}"))
    }

    /// Sets a configuration variable
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.session.cmd(&format!("e {key}={value}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_get_and_set() {
        let mut s = Session::new(Scripted::new().reply("e asm.arch", "x86"));
        let mut cfg = Config::new(&mut s);
        assert_eq!(cfg.get("asm.arch").unwrap(), "x86");
        cfg.set("asm.bits", "64").unwrap();
        cfg.set("search.in", "dbg.maps").unwrap();
        assert_eq!(
            s.transport().sent(),
            ["e asm.arch", "e asm.bits=64", "e search.in=dbg.maps"]
        );
    }
}
