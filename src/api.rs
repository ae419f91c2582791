//! # Top-Level Facade
//!
//! Provides [`R2`], the owner of a radare2 session, and [`At`], the scoped
//! request builder for address-taking operations.
//!
//! The facade hands out short-lived views for each command family
//! ([`Cpu`], [`Debugger`], [`Print`], [`Write`], [`Flags`], [`Config`],
//! [`Esil`]) and operating views for [`Function`] and [`File`] handles.
//! All of them borrow the session, so exactly one of them is live at a
//! time and every command goes through the same channel.
//!
//! [`R2::quit`] takes the facade by value. Whatever still holds a handle
//! after that cannot issue commands anymore; there is no runtime "session
//! is gone" state to check for.

use std::path::Path;

use crate::addr::{Addr, Location};
use crate::config::Config;
use crate::cpu::Cpu;
use crate::debugger::Debugger;
use crate::errors::{R2Error, Result};
use crate::esil::Esil;
use crate::file::{File, FileView};
use crate::flags::Flags;
use crate::function::{Function, FunctionView};
use crate::pipe::{R2Process, Transport};
use crate::print::Print;
use crate::record::{Record, RecordList};
use crate::session::Session;
use crate::write::Write;

/// A radare2 session
///
/// Generic over the [`Transport`]; [`R2::open`] spawns a real process,
/// [`R2::new`] accepts any transport, which is how tests and doctests run
/// against a [`Scripted`](crate::pipe::Scripted) one:
///
/// ```
/// use r2kit::{R2, Scripted};
///
/// let transport = Scripted::new()
///     .reply("aflj", r#"[{"name":"main","offset":4194304}]"#);
/// let mut r2 = R2::new(transport);
///
/// let funcs = r2.functions()?;
/// assert_eq!(funcs.len(), 1);
/// assert_eq!(funcs[0].offset.u64(), 0x400000);
/// # Ok::<(), r2kit::R2Error>(())
/// ```
pub struct R2<T: Transport> {
    session: Session<T>,
}

impl R2<R2Process> {
    /// Spawns radare2 on a target file and connects to it
    ///
    /// # Errors
    ///
    /// Fails when the binary is not on `PATH` or the process could not be
    /// started.
    pub fn open(target: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(R2Process::spawn(target)?))
    }

    /// Spawns radare2 with extra command-line flags (`-d`, `-w`, ...)
    ///
    /// # Errors
    ///
    /// Same failure modes as [`R2::open`].
    pub fn open_with_flags(target: impl AsRef<Path>, flags: &[String]) -> Result<Self> {
        Ok(Self::new(R2Process::spawn_with_flags(target, flags)?))
    }
}

impl<T: Transport> R2<T> {
    /// Wraps an already-connected transport
    pub fn new(transport: T) -> Self {
        Self {
            session: Session::new(transport),
        }
    }

    /// Sends a raw command and returns the trimmed reply
    ///
    /// Escape hatch for everything this crate has no method for.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn cmd(&mut self, cmd: &str) -> Result<String> {
        self.session.cmd(cmd)
    }

    /// Target and session metadata (`ij`)
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::MalformedResponse`] when the reply is not a
    /// JSON object.
    pub fn info(&mut self) -> Result<Record> {
        Record::from_value(self.session.cmdj("ij")?)
    }

    /// Runs full analysis (`aaa`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn analyze_all(&mut self) -> Result<()> {
        self.session.cmd("aaa")?;
        Ok(())
    }

    /// Analyzes function calls (`aac`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn analyze_calls(&mut self) -> Result<()> {
        self.session.cmd("aac")?;
        Ok(())
    }

    /// Basic blocks of the function at the current seek (`afbj`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn basic_blocks(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("afbj")?;
        RecordList::from_opt(v)
    }

    /// Restricts where search commands look (`e search.in=`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn search_in(&mut self, scope: &str) -> Result<()> {
        self.config().set("search.in", scope)
    }

    /// Moves the current seek (`s`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn seek(&mut self, loc: impl Into<Location>) -> Result<()> {
        self.session.cmd(&format!("s {}", loc.into()))?;
        Ok(())
    }

    /// Opens an additional file in the session (`o`)
    ///
    /// `at` maps the file at a fixed address; `perms` only means anything
    /// together with `at`, matching the tool's positional grammar.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn open_file(
        &mut self,
        path: &str,
        at: Option<Addr>,
        perms: Option<&str>,
    ) -> Result<()> {
        let mut cmd = format!("o {path}");
        if let Some(at) = at {
            cmd.push_str(&format!(" {at}"));
        }
        if let Some(perms) = perms {
            cmd.push_str(&format!(" {perms}"));
        }
        self.session.cmd(&cmd)?;
        Ok(())
    }

    /// Handles for all open file descriptors (`oj`)
    ///
    /// Entries the tool reports without a descriptor number are skipped.
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn files(&mut self) -> Result<Vec<File>> {
        let list = RecordList::from_opt(self.session.cmdj_opt("oj")?)?;
        Ok(list
            .iter()
            .filter_map(|r| r.get_u64("fd"))
            .map(File::new)
            .collect())
    }

    /// Handles for all known functions (`aflj`)
    ///
    /// An empty or absent listing yields an empty Vec, never an error.
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn functions(&mut self) -> Result<Vec<Function>> {
        let list = RecordList::from_opt(self.session.cmdj_opt("aflj")?)?;
        Ok(list
            .iter()
            .filter_map(|r| r.get_addr("offset"))
            .map(Function::new)
            .collect())
    }

    /// Finds the first function currently carrying `name`
    ///
    /// Functions that vanish between the listing and the name lookup do not
    /// match; analysis can rewrite the function table at any time.
    ///
    /// # Errors
    ///
    /// Propagates transport and reply-shape failures.
    pub fn function_by_name(&mut self, name: &str) -> Result<Option<Function>> {
        for f in self.functions()? {
            match self.function(f).name() {
                Ok(Some(n)) if n == name => return Ok(Some(f)),
                Ok(_) | Err(R2Error::NoSuchFunction(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// The function containing `loc`, absent when there is none (`afo`)
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::BadAddress`] when the tool's reply is not an
    /// address.
    pub fn function_at(&mut self, loc: impl Into<Location>) -> Result<Option<Function>> {
        self.at(loc).containing_function()
    }

    /// The function containing the current seek, absent when there is none
    ///
    /// # Errors
    ///
    /// Same failure modes as [`R2::function_at`].
    pub fn current_function(&mut self) -> Result<Option<Function>> {
        self.at("$$").containing_function()
    }

    /// Cross references to the current seek (`axtj`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn xrefs(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("axtj")?;
        RecordList::from_opt(v)
    }

    /// References going out of the function at the current seek (`axfj`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn refs_from(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt("axfj")?;
        RecordList::from_opt(v)
    }

    /// Decodes the instruction at the current seek (`aoj`), absent when the
    /// tool reports nothing
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn op_info(&mut self) -> Result<Option<Record>> {
        let list = RecordList::from_opt(self.session.cmdj_opt("aoj")?)?;
        Ok(list.into_iter().next())
    }

    /// Reads `len` bytes at the current seek
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Print::bytes`].
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        self.print().bytes(len)
    }

    /// Reads the single byte at `loc`, absent when the tool returns nothing
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Print::bytes`].
    pub fn byte_at(&mut self, loc: impl Into<Location>) -> Result<Option<u8>> {
        Ok(self.at(loc).read(1)?.first().copied())
    }

    /// Reads the byte range `[start, end)`
    ///
    /// Endpoints can be addresses or symbol expressions; symbols are
    /// resolved through [`R2::resolve`] first.
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::BadRange`] when `end` is below `start`, and
    /// with [`R2Error::BadAddress`] when an endpoint does not resolve.
    pub fn read_range(
        &mut self,
        start: impl Into<Location>,
        end: impl Into<Location>,
    ) -> Result<Vec<u8>> {
        let start = self.resolve_endpoint(start.into())?;
        let end = self.resolve_endpoint(end.into())?;
        if end < start {
            return Err(R2Error::BadRange { start, end });
        }
        let len = (end - start).usize();
        self.at(start).read(len)
    }

    /// Evaluates an address expression to a concrete address (`?v`)
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::BadAddress`] when the tool cannot resolve the
    /// expression.
    pub fn resolve(&mut self, expr: &str) -> Result<Addr> {
        let raw = self.session.cmd(&format!("?v {expr}"))?;
        raw.parse()
            .map_err(|_| R2Error::BadAddress(expr.to_string()))
    }

    fn resolve_endpoint(&mut self, loc: Location) -> Result<Addr> {
        match loc {
            Location::Addr(a) => Ok(a),
            Location::Expr(e) => self.resolve(&e),
        }
    }

    /// Scoped request builder for address-taking operations
    pub fn at(&mut self, loc: impl Into<Location>) -> At<'_, T> {
        At {
            session: &mut self.session,
            loc: loc.into(),
        }
    }

    /// Register proxy
    pub fn cpu(&mut self) -> Cpu<'_, T> {
        Cpu::new(&mut self.session)
    }

    /// Debug-session view
    pub fn debugger(&mut self) -> Debugger<'_, T> {
        Debugger::new(&mut self.session)
    }

    /// Output view (`p8`, `pd`, `px`)
    pub fn print(&mut self) -> Print<'_, T> {
        Print::new(&mut self.session)
    }

    /// Write view (`wx`, `w`, `wa`)
    pub fn write(&mut self) -> Write<'_, T> {
        Write::new(&mut self.session)
    }

    /// Config view (`e`)
    pub fn config(&mut self) -> Config<'_, T> {
        Config::new(&mut self.session)
    }

    /// Flag view (`f`, `fj`, `fs`)
    pub fn flags(&mut self) -> Flags<'_, T> {
        Flags::new(&mut self.session)
    }

    /// ESIL emulation view (`ae` family)
    pub fn esil(&mut self) -> Esil<'_, T> {
        Esil::new(&mut self.session)
    }

    /// Operating view for a [`Function`] handle
    pub fn function(&mut self, func: Function) -> FunctionView<'_, T> {
        FunctionView::new(&mut self.session, func)
    }

    /// Operating view for a [`File`] handle
    pub fn file(&mut self, file: File) -> FileView<'_, T> {
        FileView::new(&mut self.session, file)
    }

    /// Read access to the transport, mainly for inspecting a
    /// [`Scripted`](crate::pipe::Scripted) transcript in tests
    pub fn transport(&self) -> &T {
        self.session.transport()
    }

    /// Mutable access to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.session.transport_mut()
    }

    /// Ends the session and releases the external process
    ///
    /// Consumes the facade: no command can be issued afterwards.
    ///
    /// # Errors
    ///
    /// Propagates the transport's teardown failure; the process is released
    /// regardless.
    pub fn quit(mut self) -> Result<()> {
        self.session.close()
    }
}

/// One-shot request builder binding a [`Location`] to the operations that
/// take an address
///
/// Created by [`R2::at`]; lives for a single call chain, so a pending
/// address never leaks into an unrelated later command.
pub struct At<'r, T: Transport> {
    session: &'r mut Session<T>,
    loc: Location,
}

impl<'r, T: Transport> At<'r, T> {
    /// Reads `len` bytes at the location (`p8 … @`)
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Print::bytes`].
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        Print::new(self.session).at(self.loc.clone()).bytes(len)
    }

    /// Writes raw bytes at the location (`wx … @`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        Write::new(self.session).at(self.loc.clone()).bytes(data)
    }

    /// Cross references to the location (`axtj @`)
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn xrefs(&mut self) -> Result<RecordList> {
        let v = self.session.cmdj_opt(&format!("axtj @ {}", self.loc))?;
        RecordList::from_opt(v)
    }

    /// Decodes the instruction at the location (`aoj @`), absent when the
    /// tool reports nothing
    ///
    /// # Errors
    ///
    /// Fails when a non-empty reply is not an array of objects.
    pub fn op_info(&mut self) -> Result<Option<Record>> {
        let v = self.session.cmdj_opt(&format!("aoj @ {}", self.loc))?;
        Ok(RecordList::from_opt(v)?.into_iter().next())
    }

    /// Analyzes a function starting at the location (`af @`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn analyze_function(&mut self) -> Result<String> {
        self.session.cmd(&format!("af @ {}", self.loc))
    }

    /// Recursive disassembly of the function at the location (`pdr @`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn disasm_function(&mut self) -> Result<String> {
        self.session.cmd(&format!("pdr @ {}", self.loc))
    }

    /// The function containing the location, absent when there is none
    /// (`afo`)
    ///
    /// # Errors
    ///
    /// Fails with [`R2Error::BadAddress`] when the tool's reply is not an
    /// address.
    pub fn containing_function(&mut self) -> Result<Option<Function>> {
        let raw = self.session.cmd(&format!("afo {}", self.loc))?;
        if raw.is_empty() {
            return Ok(None);
        }
        let addr: Addr = raw.parse()?;
        Ok(Some(Function::new(addr)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_functions_empty_listing() {
        let mut r2 = R2::new(Scripted::new().reply("aflj", "[]"));
        assert!(r2.functions().unwrap().is_empty());

        let mut r2 = R2::new(Scripted::new());
        assert!(r2.functions().unwrap().is_empty());
    }

    #[test]
    fn test_functions_become_handles() {
        let mut r2 = R2::new(Scripted::new().reply(
            "aflj",
            r#"[{"name":"main","offset":4194304},{"name":"sym.check","offset":4194404}]"#,
        ));
        let funcs = r2.functions().unwrap();
        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs[0].offset, Addr::from(0x400000u64));
        assert_eq!(funcs[1].offset, Addr::from(0x400064u64));
    }

    #[test]
    fn test_function_by_name() {
        let mut r2 = R2::new(
            Scripted::new()
                .reply(
                    "aflj",
                    r#"[{"offset":4194304},{"offset":4194404}]"#,
                )
                .reply("afij @ 0x400000", r#"[{"name":"entry0","offset":4194304}]"#)
                .reply("afij @ 0x400064", r#"[{"name":"main","offset":4194404}]"#),
        );
        let found = r2.function_by_name("main").unwrap();
        assert_eq!(found, Some(Function::new(0x400064u64)));
        assert_eq!(r2.function_by_name("nope").unwrap(), None);
    }

    #[test]
    fn test_function_at_absent_and_present() {
        let mut r2 = R2::new(Scripted::new().reply("afo 0x400123", "0x400000"));
        let f = r2.function_at(0x400123u64).unwrap();
        assert_eq!(f, Some(Function::new(0x400000u64)));

        let mut r2 = R2::new(Scripted::new());
        assert_eq!(r2.function_at(0x400123u64).unwrap(), None);
    }

    #[test]
    fn test_current_function_uses_seek_expression() {
        let mut r2 = R2::new(Scripted::new().reply("afo $$", "0x400000"));
        let f = r2.current_function().unwrap();
        assert_eq!(f, Some(Function::new(0x400000u64)));
        assert_eq!(r2.transport().sent(), ["afo $$"]);
    }

    #[test]
    fn test_info_parses_object() {
        let mut r2 = R2::new(
            Scripted::new().reply("ij", r#"{"core":{"file":"/bin/ls"},"bin":{"arch":"x86"}}"#),
        );
        let info = r2.info().unwrap();
        assert_eq!(
            info.get_record("bin").unwrap().get_str("arch"),
            Some("x86")
        );
    }

    #[test]
    fn test_read_range_resolves_symbol_endpoints() {
        let mut r2 = R2::new(
            Scripted::new()
                .reply("?v main", "0x400000")
                .reply("?v main+4", "0x400004")
                .reply("p8 4 @ 0x400000", "5548c3c3"),
        );
        let bytes = r2.read_range("main", "main+4").unwrap();
        assert_eq!(bytes, [0x55, 0x48, 0xc3, 0xc3]);
        assert_eq!(
            r2.transport().sent(),
            ["?v main", "?v main+4", "p8 4 @ 0x400000"]
        );
    }

    #[test]
    fn test_read_range_rejects_reversed_endpoints() {
        let mut r2 = R2::new(Scripted::new());
        assert!(matches!(
            r2.read_range(0x2000u64, 0x1000u64),
            Err(R2Error::BadRange { .. })
        ));
    }

    #[test]
    fn test_resolve_failure_names_the_expression() {
        let mut r2 = R2::new(Scripted::new());
        assert!(matches!(
            r2.resolve("sym.missing"),
            Err(R2Error::BadAddress(e)) if e == "sym.missing"
        ));
    }

    #[test]
    fn test_byte_at() {
        let mut r2 = R2::new(Scripted::new().reply("p8 1 @ 0x400000", "c3"));
        assert_eq!(r2.byte_at(0x400000u64).unwrap(), Some(0xc3));
        assert_eq!(r2.byte_at(0x400001u64).unwrap(), None);
    }

    #[test]
    fn test_at_builder_commands() {
        let mut r2 = R2::new(Scripted::new());
        r2.at("main").analyze_function().unwrap();
        r2.at(0x400000u64).disasm_function().unwrap();
        r2.at(0x400000u64).write_bytes(&[0x90]).unwrap();
        r2.at("main").xrefs().unwrap();
        assert_eq!(
            r2.transport().sent(),
            [
                "af @ main",
                "pdr @ 0x400000",
                "wx 90 @ 0x400000",
                "axtj @ main"
            ]
        );
    }

    #[test]
    fn test_op_info_first_element_or_absent() {
        let mut r2 = R2::new(Scripted::new().reply(
            "aoj",
            r#"[{"mnemonic":"push","size":1},{"mnemonic":"mov","size":3}]"#,
        ));
        let op = r2.op_info().unwrap().unwrap();
        assert_eq!(op.get_str("mnemonic"), Some("push"));

        let mut r2 = R2::new(Scripted::new());
        assert!(r2.op_info().unwrap().is_none());

        let mut r2 = R2::new(Scripted::new().reply("aoj @ main", r#"[{"size":3}]"#));
        assert_eq!(r2.at("main").op_info().unwrap().unwrap().get_u64("size"), Some(3));
    }

    #[test]
    fn test_files_listing() {
        let mut r2 = R2::new(
            Scripted::new().reply("oj", r#"[{"fd":3,"uri":"/bin/ls"},{"fd":4,"uri":"malloc://512"}]"#),
        );
        let files = r2.files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1], File::new(4));
        r2.file(files[0]).close().unwrap();
        assert_eq!(r2.transport().last_sent(), Some("o-3"));
    }

    #[test]
    fn test_open_file_argument_forms() {
        let mut r2 = R2::new(Scripted::new());
        r2.open_file("/bin/ls", None, None).unwrap();
        r2.open_file("loader.bin", Some(Addr::from(0x8000u64)), None)
            .unwrap();
        r2.open_file("patch.bin", Some(Addr::from(0x8000u64)), Some("rwx"))
            .unwrap();
        assert_eq!(
            r2.transport().sent(),
            [
                "o /bin/ls",
                "o loader.bin 0x8000",
                "o patch.bin 0x8000 rwx"
            ]
        );
    }

    #[test]
    fn test_analysis_and_seek_commands() {
        let mut r2 = R2::new(Scripted::new());
        r2.analyze_all().unwrap();
        r2.analyze_calls().unwrap();
        r2.seek("main").unwrap();
        r2.seek(0x400000u64).unwrap();
        r2.search_in("dbg.maps").unwrap();
        assert_eq!(
            r2.transport().sent(),
            ["aaa", "aac", "s main", "s 0x400000", "e search.in=dbg.maps"]
        );
    }

    #[test]
    fn test_quit_consumes_the_session() {
        let r2 = R2::new(Scripted::new());
        r2.quit().unwrap();
    }
}
