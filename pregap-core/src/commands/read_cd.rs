use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use super::{Command, Control};
use crate::addressing::Lba;

#[derive(Debug, Error)]
pub enum ReadCDError {
    #[error("Invalid sector type: {0:03b}")]
    InvalidSectorType(u8),
    #[error("Invalid C2 error code: {0:02b}")]
    InvalidC2ErrorCode(u8),
    #[error("Invalid sub-channel selection: {0:03b}")]
    InvalidSubChannelSelection(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[num_enum(error_type(name = ReadCDError, constructor = ReadCDError::InvalidSectorType))]
#[repr(u8)]
pub enum SectorType {
    AllTypes = 0b000,
    CdDa = 0b001,
    Mode1 = 0b010,
    Mode2Formless = 0b011,
    Mode2Form1 = 0b100,
    Mode2Form2 = 0b101,
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MainChannelFlags: u8 {
        const SYNC = 1 << 7;
        const SUBHEADER = 1 << 6;
        const HEADER = 1 << 5;
        const USER_DATA = 1 << 4;
        const EDC_ECC = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[num_enum(error_type(name = ReadCDError, constructor = ReadCDError::InvalidC2ErrorCode))]
#[repr(u8)]
pub enum C2ErrorCode {
    None = 0b00,
    ErrorBits = 0b01,
    BlockErrorByte = 0b10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[num_enum(error_type(name = ReadCDError, constructor = ReadCDError::InvalidSubChannelSelection))]
#[repr(u8)]
pub enum SubChannelSelection {
    None = 0b000,
    QSubChannel = 0b010,
    RWSubChannel = 0b100,
}

/// 12-byte READ CD (0xBE) CDB, configured to return raw CD-DA audio with the formatted Q
/// sub-channel appended — the one raw frame shape the pregap finder ever asks for.
#[derive(Debug, Clone, Copy)]
pub struct ReadCD {
    pub sector_type: SectorType,
    pub start_lba: Lba,
    pub transfer_length: u32,
    pub main_channel: MainChannelFlags,
    pub sub_channel: SubChannelSelection,
    pub control: Control,
}

impl ReadCD {
    /// A READ CD command already configured per §4.1: CD-DA sector type, user data + Q
    /// sub-channel, for `sectors` sectors starting at `start_lba`.
    pub fn audio_with_subq(start_lba: Lba, sectors: u32) -> Self {
        Self {
            sector_type: SectorType::CdDa,
            start_lba,
            transfer_length: sectors,
            main_channel: MainChannelFlags::USER_DATA,
            sub_channel: SubChannelSelection::QSubChannel,
            control: Control::from(0),
        }
    }
}

impl Command<12> for ReadCD {
    const OP_CODE: u8 = 0xBE;

    type Response = Vec<u8>;

    fn as_cdb(&self) -> [u8; 12] {
        let mut bytes = [0u8; 12];

        bytes[0] = Self::OP_CODE;
        bytes[1] |= u8::from(self.sector_type) << 2;

        bytes[2..=5].copy_from_slice(&self.start_lba.raw().to_be_bytes());

        bytes[6..=8].copy_from_slice(&self.transfer_length.to_be_bytes()[1..4]);

        bytes[9] |= self.main_channel.bits();
        bytes[10] |= u8::from(self.sub_channel);
        bytes[11] = self.control.into();

        bytes
    }

    fn allocation_len(&self) -> usize {
        const FRAME_SIZE: usize = crate::constants::RAW_AND_SUBQ_FRAME_SIZE;
        self.transfer_length as usize * FRAME_SIZE
    }
}
