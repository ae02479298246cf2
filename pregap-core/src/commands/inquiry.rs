use std::str::Utf8Error;

use thiserror::Error;

use super::{Command, Control};

const MIN_RESPONSE_LENGTH: usize = 36;

#[derive(Debug, Error)]
pub enum InquiryError {
    #[error("INQUIRY response must be at least {size} bytes long, received {0}", size = MIN_RESPONSE_LENGTH)]
    IncompleteResponse(usize),
    #[error(transparent)]
    InvalidAsciiSequence(#[from] Utf8Error),
}

/// 6-byte STANDARD INQUIRY (0x12) CDB. Used only to print a drive identification banner; the
/// pregap finder itself never issues it.
#[derive(Debug, Clone, Copy)]
pub struct Inquiry {
    control: Control,
}

impl Inquiry {
    pub fn new(control: Control) -> Self {
        Self { control }
    }
}

impl Command<6> for Inquiry {
    const OP_CODE: u8 = 0x12;

    type Response = InquiryResponse;

    fn as_cdb(&self) -> [u8; 6] {
        let mut bytes = [0u8; 6];

        bytes[0] = Self::OP_CODE;
        bytes[3] = (MIN_RESPONSE_LENGTH as u16 >> 8) as u8;
        bytes[4] = MIN_RESPONSE_LENGTH as u8;
        bytes[5] = self.control.into();

        bytes
    }

    fn allocation_len(&self) -> usize {
        MIN_RESPONSE_LENGTH
    }
}

#[derive(Debug)]
pub struct InquiryResponse {
    pub t10_vendor_identification: String,
    pub product_identification: String,
    pub product_revision_level: String,
}

impl TryFrom<Vec<u8>> for InquiryResponse {
    type Error = InquiryError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        if value.len() < MIN_RESPONSE_LENGTH {
            return Err(InquiryError::IncompleteResponse(value.len()));
        }

        let t10_vendor_identification = std::str::from_utf8(&value[8..16])?.trim().to_owned();
        let product_identification = std::str::from_utf8(&value[16..32])?.trim().to_owned();
        let product_revision_level = std::str::from_utf8(&value[32..36])?.trim().to_owned();

        Ok(Self {
            t10_vendor_identification,
            product_identification,
            product_revision_level,
        })
    }
}
