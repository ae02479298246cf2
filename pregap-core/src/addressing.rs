use std::fmt;

use derive_more::{Add, AddAssign, Div, DivAssign, Into, Mul, MulAssign, Neg, Sub, SubAssign};
use thiserror::Error;

use crate::constants::{FRAMES_PER_MINUTE, FRAMES_PER_SECOND, PREGAP_OFFSET};

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("Block address out of range")]
    OutOfRange,
}

/// Newtype representing a Logical Block Address (LBA).
///
/// An LBA is a block index that includes the disc pregap lead-in: LBA 0 corresponds to the
/// (potentially unreadable) block at 00:00:00.
#[repr(transparent)]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Into,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Mul,
    MulAssign,
    Div,
    DivAssign,
    Neg,
)]
pub struct Lba(i32);

impl Lba {
    pub const MAX: Lba = Lba(450_000);
    pub const MIN: Lba = Lba(-450_000);
    pub const ZERO: Lba = Lba(0);

    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Lba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Lba {
    type Error = AddressError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let lba = Self(value);
        if !(Self::MIN..=Self::MAX).contains(&lba) {
            return Err(AddressError::OutOfRange);
        }
        Ok(lba)
    }
}

impl From<Lsn> for Lba {
    fn from(value: Lsn) -> Self {
        Self(value.raw() + i32::from(PREGAP_OFFSET))
    }
}

/// Newtype representing a Logical Sector Number (LSN).
///
/// An LSN excludes the disc pregap lead-in: LSN 0 is the first playable frame of audio,
/// at 00:02:00.
#[repr(transparent)]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Into,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Mul,
    MulAssign,
    Div,
    DivAssign,
    Neg,
)]
pub struct Lsn(i32);

impl Lsn {
    pub const MAX: Lsn = Lsn(Lba::MAX.0 - PREGAP_OFFSET as i32);
    pub const MIN: Lsn = Lsn(Lba::MIN.0 - PREGAP_OFFSET as i32);
    pub const ZERO: Lsn = Lsn(0);

    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Lsn {
    type Error = AddressError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let lsn = Self(value);
        if !(Self::MIN..=Self::MAX).contains(&lsn) {
            return Err(AddressError::OutOfRange);
        }
        Ok(lsn)
    }
}

impl From<Lba> for Lsn {
    fn from(value: Lba) -> Self {
        Self(value.raw() - i32::from(PREGAP_OFFSET))
    }
}

/// Minute, Second, Frame format: 75 frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Msf(pub u8, pub u8, pub u8);

impl fmt::Display for Msf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.0, self.1, self.2)
    }
}

impl From<Lba> for Msf {
    /* Adapted from libcdio, itself adapted from cdparanoia, which claims to be straight from the
     * MMC3 spec. */
    fn from(value: Lba) -> Self {
        let mut value = if value >= Lba::ZERO {
            value.raw()
        } else {
            (value + Lba::MAX).raw()
        };

        let m = value / i32::from(FRAMES_PER_MINUTE);
        value -= m * i32::from(FRAMES_PER_MINUTE);
        let s = value / i32::from(FRAMES_PER_SECOND);
        value -= s * i32::from(FRAMES_PER_SECOND);
        let f = value;

        Msf(m as u8, s as u8, f as u8)
    }
}

impl From<Lsn> for Msf {
    fn from(value: Lsn) -> Self {
        Msf::from(Lba::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lba_lsn_round_trip() {
        let lba = Lba::try_from(12_345).unwrap();
        let lsn = Lsn::from(lba);
        assert_eq!(Lba::from(lsn), lba);
    }

    #[test]
    fn lsn_zero_is_two_seconds_into_lba() {
        assert_eq!(Lba::from(Lsn::ZERO), Lba::try_from(150).unwrap());
    }

    #[test]
    fn msf_of_lsn_zero() {
        let msf = Msf::from(Lsn::ZERO);
        assert_eq!(msf, Msf(0, 2, 0));
    }
}
