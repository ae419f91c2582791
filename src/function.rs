//! # Function Handles
//!
//! Provides [`Function`], a handle identifying a function by its entry
//! address, and [`FunctionView`], the borrow-scoped view that runs commands
//! against it.
//!
//! A handle carries nothing but the address. Name, size and everything else
//! are re-fetched from the tool on every call, so a handle never goes stale
//! when analysis reruns or a rename happens behind its back.

use serde::Serialize;

use crate::addr::Addr;
use crate::errors::{R2Error, Result};
use crate::pipe::Transport;
use crate::record::{Record, RecordList};
use crate::session::Session;

/// A function in the loaded binary, identified by its entry address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Function {
    /// Entry address of the function
    pub offset: Addr,
}

impl Function {
    #[must_use]
    pub fn new(offset: impl Into<Addr>) -> Self {
        Self {
            offset: offset.into(),
        }
    }
}

/// Operating view over one [`Function`], obtained from
/// [`R2::function`](crate::R2::function)
pub struct FunctionView<'r, T: Transport> {
    session: &'r mut Session<T>,
    func: Function,
}

impl<'r, T: Transport> FunctionView<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>, func: Function) -> Self {
        Self { session, func }
    }

    /// The handle this view operates on
    #[must_use]
    pub fn handle(&self) -> Function {
        self.func
    }

    /// Runs function analysis at the entry address (`af`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn analyze(&mut self) -> Result<()> {
        self.session.cmd(&format!("af {}", self.func.offset))?;
        Ok(())
    }

    /// Fetches the function's metadata (`afij`)
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::NoSuchFunction`] when the tool reports no
    /// function at the handle's address.
    pub fn info(&mut self) -> Result<Record> {
        let v = self
            .session
            .cmdj_opt(&format!("afij @ {}", self.func.offset))?;
        RecordList::from_opt(v)?
            .into_iter()
            .next()
            .ok_or(R2Error::NoSuchFunction(self.func.offset))
    }

    /// The function's current name, absent when the tool reports none
    ///
    /// # Errors
    ///
    /// Same failure modes as [`FunctionView::info`].
    pub fn name(&mut self) -> Result<Option<String>> {
        Ok(self.info()?.get_str("name").map(str::to_string))
    }

    /// Renames the function (`afn`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.session
            .cmd(&format!("afn {name} {}", self.func.offset))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    fn view(s: &mut Session<Scripted>, offset: u64) -> FunctionView<'_, Scripted> {
        FunctionView::new(s, Function::new(offset))
    }

    #[test]
    fn test_info_takes_first_element() {
        let mut s = Session::new(Scripted::new().reply(
            "afij @ 0x400000",
            r#"[{"name":"main","offset":4194304,"size":64}]"#,
        ));
        let info = view(&mut s, 0x400000).info().unwrap();
        assert_eq!(info.get_str("name"), Some("main"));
        assert_eq!(info.get_u64("size"), Some(64));
    }

    #[test]
    fn test_info_on_empty_listing_is_no_such_function() {
        let mut s = Session::new(Scripted::new().reply("afij @ 0x400000", "[]"));
        assert!(matches!(
            view(&mut s, 0x400000).info(),
            Err(R2Error::NoSuchFunction(a)) if a == Addr::from(0x400000u64)
        ));

        // An entirely empty reply means the same thing.
        let mut s = Session::new(Scripted::new());
        assert!(matches!(
            view(&mut s, 0x400000).info(),
            Err(R2Error::NoSuchFunction(_))
        ));
    }

    #[test]
    fn test_name_reads_info() {
        let mut s = Session::new(
            Scripted::new().reply("afij @ 0x1000", r#"[{"name":"sym.check","offset":4096}]"#),
        );
        assert_eq!(view(&mut s, 0x1000).name().unwrap().as_deref(), Some("sym.check"));

        let mut s = Session::new(Scripted::new().reply("afij @ 0x1000", r#"[{"offset":4096}]"#));
        assert_eq!(view(&mut s, 0x1000).name().unwrap(), None);
    }

    #[test]
    fn test_rename_and_analyze_commands() {
        let mut s = Session::new(Scripted::new());
        let mut v = view(&mut s, 0x400000);
        v.analyze().unwrap();
        v.set_name("checksum").unwrap();
        assert_eq!(s.transport().sent(), ["af 0x400000", "afn checksum 0x400000"]);
    }
}
