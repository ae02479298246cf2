use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use super::{Command, Control};
use crate::addressing::Lba;

const TOC_HEADER_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum TocError {
    #[error("Encountered invalid ADR {0:04b}")]
    InvalidAdr(u8),
    #[error("Received {0} bytes of READ TOC response, expected at least {min}", min = TOC_HEADER_LEN)]
    IncompleteHeader(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Adr {
    Mode1Q = 0b0001,
    Mode2Q = 0b0010,
    Mode3Q = 0b0011,
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TrackControl: u8 {
        const FOUR_CHANNELS = 1 << 3;
        const IS_DATA = 1 << 2;
        const COPY_PERMITTED = 1 << 1;
        const PREEMPHASIS_OR_INCREMENTAL = 1 << 0;
    }
}

/// 10-byte READ TOC/PMA/ATIP (0x43) CDB requesting the Formatted TOC (format 0000b) in LBA
/// addressing, the only format/addressing pair this repository consumes.
#[derive(Debug, Clone, Copy)]
pub struct FormattedTOC {
    track: u8,
    allocation_len: u16,
    control: Control,
}

impl FormattedTOC {
    pub fn new(track: u8, allocation_len: u16, control: Control) -> Self {
        Self {
            track,
            allocation_len,
            control,
        }
    }
}

impl Command<10> for FormattedTOC {
    const OP_CODE: u8 = 0x43;

    type Response = Toc;

    fn as_cdb(&self) -> [u8; 10] {
        let mut bytes = [0u8; 10];

        bytes[0] = Self::OP_CODE;
        // MSF flag left clear: addresses are returned as LBA, not MSF.
        bytes[2] = 0b0000; // format = Formatted TOC
        bytes[6] = self.track;
        bytes[7..=8].copy_from_slice(&self.allocation_len.to_be_bytes());
        bytes[9] = self.control.into();

        bytes
    }

    fn allocation_len(&self) -> usize {
        self.allocation_len.into()
    }
}

#[derive(Debug)]
pub struct TrackDescriptor {
    pub adr: Adr,
    pub control: TrackControl,
    pub number: u8,
    pub start_addr: Lba,
}

#[derive(Debug)]
pub struct Toc {
    pub first_track_num: u8,
    pub last_track_num: u8,
    pub track_descriptors: Vec<TrackDescriptor>,
}

impl TryFrom<Vec<u8>> for Toc {
    type Error = TocError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        if value.len() < TOC_HEADER_LEN {
            return Err(TocError::IncompleteHeader(value.len()));
        }

        let first_track_num = value[2];
        let last_track_num = value[3];

        let mut track_descriptors = Vec::new();
        for descriptor in value[TOC_HEADER_LEN..].chunks_exact(8) {
            let adr_bits = (descriptor[1] & 0xF0) >> 4;
            let adr =
                Adr::try_from_primitive(adr_bits).map_err(|_| TocError::InvalidAdr(adr_bits))?;
            let control = TrackControl::from_bits_truncate(descriptor[1] & 0x0F);
            let number = descriptor[2];
            let start_addr = Lba::try_from(i32::from_be_bytes(
                descriptor[4..=7].try_into().unwrap(),
            ))
            .unwrap_or(Lba::ZERO);

            track_descriptors.push(TrackDescriptor {
                adr,
                control,
                number,
                start_addr,
            });
        }

        Ok(Toc {
            first_track_num,
            last_track_num,
            track_descriptors,
        })
    }
}
