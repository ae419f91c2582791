pub mod addr;
pub mod api;
pub mod config;
pub mod cpu;
pub mod debugger;
pub mod errors;
pub mod esil;
pub mod file;
pub mod flags;
pub mod function;
pub mod pipe;
pub mod print;
pub mod record;
pub mod session;
pub mod write;

pub use crate::addr::{Addr, Location};
pub use crate::api::{At, R2};
pub use crate::errors::{R2Error, Result};
pub use crate::file::File;
pub use crate::function::Function;
pub use crate::pipe::{R2Process, Scripted, Transport};
pub use crate::record::{Record, RecordList};
