//! Open-file descriptors of the radare2 session (`o` family).

use serde::Serialize;

use crate::errors::Result;
use crate::pipe::Transport;
use crate::session::Session;

/// An open file inside the session, identified by its descriptor
///
/// Handles come from [`R2::files`](crate::R2::files) and carry nothing but
/// the descriptor number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct File {
    /// Descriptor as reported by `oj`
    pub fd: u64,
}

impl File {
    #[must_use]
    pub fn new(fd: u64) -> Self {
        Self { fd }
    }
}

/// Operating view over one [`File`], obtained from
/// [`R2::file`](crate::R2::file)
pub struct FileView<'r, T: Transport> {
    session: &'r mut Session<T>,
    file: File,
}

impl<'r, T: Transport> FileView<'r, T> {
    pub(crate) fn new(session: &'r mut Session<T>, file: File) -> Self {
        Self { session, file }
    }

    /// The handle this view operates on
    #[must_use]
    pub fn handle(&self) -> File {
        self.file
    }

    /// Closes the descriptor (`o-`)
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn close(&mut self) -> Result<()> {
        self.session.cmd(&format!("o-{}", self.file.fd))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipe::Scripted;

    #[test]
    fn test_close_command() {
        let mut s = Session::new(Scripted::new());
        FileView::new(&mut s, File::new(3)).close().unwrap();
        assert_eq!(s.transport().sent(), ["o-3"]);
    }
}
