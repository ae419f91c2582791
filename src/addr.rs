//! # Addresses and Address Expressions
//!
//! [`Addr`] is a thin wrapper over a 64-bit virtual address as radare2
//! reports them. It formats as `0x…`, which is exactly the spelling embedded
//! into command strings, so an `Addr` can be interpolated into a command
//! without further ceremony.
//!
//! [`Location`] widens that to the address *expressions* radare2 accepts
//! wherever a command takes a position: a literal address, or any seek
//! expression the tool evaluates itself (`main`, `sym.imp.puts`, `$$`, ...).

use std::fmt::Display;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use serde::Serialize;

use crate::errors::R2Error;

/// A virtual address inside the session's target
#[derive(Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Addr(u64);

impl Addr {
    /// Gets the address as [u64]
    #[must_use]
    pub fn u64(&self) -> u64 {
        self.0
    }

    /// Gets the address as [usize]
    #[must_use]
    pub fn usize(&self) -> usize {
        self.0 as usize
    }
}

impl Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::fmt::Debug for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Add for Addr {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add<u64> for Addr {
    type Output = Self;
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign for Addr {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl AddAssign<u64> for Addr {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs
    }
}

impl Sub for Addr {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub<u64> for Addr {
    type Output = Self;
    fn sub(self, rhs: u64) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl SubAssign for Addr {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl SubAssign<u64> for Addr {
    fn sub_assign(&mut self, rhs: u64) {
        self.0 -= rhs
    }
}

impl From<u64> for Addr {
    fn from(value: u64) -> Self {
        Addr(value)
    }
}

impl From<usize> for Addr {
    fn from(value: usize) -> Self {
        Addr(value as u64)
    }
}

impl From<Addr> for u64 {
    fn from(value: Addr) -> Self {
        value.0
    }
}

impl From<Addr> for usize {
    fn from(value: Addr) -> Self {
        value.0 as usize
    }
}

impl FromStr for Addr {
    type Err = R2Error;

    /// Parses `0x…` hex (the form radare2 prints) or plain decimal
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let parsed = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else {
            t.parse::<u64>()
        };
        parsed
            .map(Addr)
            .map_err(|_| R2Error::BadAddress(s.to_string()))
    }
}

/// Where a command should apply: a literal address or a seek expression
///
/// radare2 resolves expressions such as flag names (`main`), symbol names
/// (`sym.imp.puts`) or the current seek (`$$`) by itself; this type keeps
/// both spellings without forcing an early resolution round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// A literal address, formatted as `0x…`
    Addr(Addr),
    /// A seek expression evaluated by radare2
    Expr(String),
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Addr(a) => write!(f, "{a}"),
            Location::Expr(e) => write!(f, "{e}"),
        }
    }
}

impl From<Addr> for Location {
    fn from(value: Addr) -> Self {
        Location::Addr(value)
    }
}

impl From<u64> for Location {
    fn from(value: u64) -> Self {
        Location::Addr(Addr::from(value))
    }
}

impl From<usize> for Location {
    fn from(value: usize) -> Self {
        Location::Addr(Addr::from(value))
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Location::Expr(value.to_string())
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Location::Expr(value)
    }
}
