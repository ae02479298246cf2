//! macOS raw sector transport via the `IOKit` CD media BSD client ioctl `DKIOCCDREAD`.
//!
//! Issued directly against the block device file descriptor; unlike the original C source this
//! does not reach into any CD-I/O library's private driver handle to obtain that descriptor
//! (§9) — the file descriptor is simply the one the caller already opened.

use std::fs::File;
use std::os::fd::AsRawFd;

use libc::{c_ulong, ioctl};

use super::{SectorTransport, TransportError};
use crate::addressing::Lsn;
use crate::constants::RAW_AND_SUBQ_FRAME_SIZE;

// bsd/sys/cdio.h / IOKit/storage/IOCDMediaBSDClient.h
const K_CD_SECTOR_AREA_USER: u32 = 1 << 0;
const K_CD_SECTOR_AREA_SUB_CHANNEL_Q: u32 = 1 << 6;
const K_CD_SECTOR_TYPE_CDDA: u8 = 1;

// _IOWR('c', 100, dk_cd_read_t), computed the way <sys/ioccom.h> does.
const DKIOCCDREAD: c_ulong = 0xC0185A64;

#[repr(C)]
struct DkCdRead {
    offset: u64,
    buffer: *mut libc::c_void,
    buffer_length: u32,
    sector_area: u32,
    sector_type: u8,
    _pad: [u8; 3],
}

/// [`SectorTransport`] issuing `DKIOCCDREAD` directly against an already-open device file.
pub struct MacosTransport {
    file: File,
}

impl MacosTransport {
    pub fn open(file: File) -> Self {
        Self { file }
    }
}

impl SectorTransport for MacosTransport {
    fn read(&mut self, lsn: Lsn, blocks: u32, out: &mut [u8]) -> Result<(), TransportError> {
        let expected = blocks as usize * RAW_AND_SUBQ_FRAME_SIZE;
        if out.len() != expected {
            return Err(TransportError::ShortRead {
                expected,
                received: out.len(),
            });
        }

        let mut cd_read = DkCdRead {
            offset: RAW_AND_SUBQ_FRAME_SIZE as u64 * lsn.raw() as u64,
            buffer: out.as_mut_ptr() as *mut libc::c_void,
            buffer_length: expected as u32,
            sector_area: K_CD_SECTOR_AREA_USER | K_CD_SECTOR_AREA_SUB_CHANNEL_Q,
            sector_type: K_CD_SECTOR_TYPE_CDDA,
            _pad: [0; 3],
        };

        // SAFETY: `cd_read` is fully initialized and `out` is a valid buffer of `expected`
        // bytes for the ioctl to fill.
        let rc = unsafe { ioctl(self.file.as_raw_fd(), DKIOCCDREAD, &mut cd_read) };
        if rc != 0 {
            return Err(TransportError::Io(std::io::Error::last_os_error()));
        }

        Ok(())
    }
}
