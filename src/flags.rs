//! Flag management: named labels on addresses (`f`, `fj`, `fs`).

use crate::addr::Location;
use crate::errors::Result;
use crate::pipe::Transport;
use crate::record::RecordList;
use crate::session::{Session, TempOffset};

/// Flag view obtained from [`R2::flags`](crate::R2::flags)
pub struct Flags<'r, T: Transport> {
    session: &'r mut Session<T>,
    tmp: TempOffset,
}

impl<'r, T: Transport> Flags<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>) -> Self {
        Self {
            session,
            tmp: TempOffset::new(),
        }
    }

    /// Sets the one-shot addressing modifier for the next [`Flags::set`]
    pub fn at(&mut self, loc: impl Into<Location>) -> &mut Self {
        self.tmp.set(loc);
        self
    }

    /// Places a flag at the current seek, or at the pending modifier
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn set(&mut self, name: &str) -> Result<()> {
        let suffix = self.tmp.suffix();
        self.session.cmd(&format!("f {name}{suffix}"))?;
        Ok(())
    }

    /// Removes a flag by name
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn unset(&mut self, name: &str) -> Result<()> {
        self.session.cmd(&format!("f-{name}"))?;
        Ok(())
    }

    /// Lists all flags in the selected flag space (`fj`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn list(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("fj")?;
        RecordList::from_opt(v)
    }

    /// Selects a flag space (`fs`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn space(&mut self, name: &str) -> Result<()> {
        self.session.cmd(&format!("fs {name}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_flag_commands() {
        let mut s = Session::new(Scripted::new());
        let mut flags = Flags::new(&mut s);
        flags.set("entrypoint").unwrap();
        flags.at(0x400000u64).set("checkpoint").unwrap();
        flags.set("after").unwrap();
        flags.unset("checkpoint").unwrap();
        flags.space("symbols").unwrap();
        assert_eq!(
            s.transport().sent(),
            [
                "f entrypoint",
                "f checkpoint @ 0x400000",
                "f after",
                "f-checkpoint",
                "fs symbols"
            ]
        );
    }

    #[test]
    fn test_flag_listing() {
        let mut s = Session::new(
            Scripted::new().reply("fj", r#"[{"name":"entry0","offset":4194304,"size":1}]"#),
        );
        let list = Flags::new(&mut s).list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.first().unwrap().get_str("name"), Some("entry0"));
    }
}
