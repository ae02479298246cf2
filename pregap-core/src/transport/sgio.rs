//! Linux SCSI generic (`SG_IO`) pass-through, used to issue the MMC `READ CD` command.

use std::ffi::{c_uchar, c_void};
use std::fs::File;
use std::os::fd::AsRawFd;

use nix::ioctl_read_bad;

use super::{SectorTransport, TransportError};
use crate::addressing::{Lba, Lsn};
use crate::commands::Command;
use crate::commands::read_cd::ReadCD;
use crate::constants::RAW_AND_SUBQ_FRAME_SIZE;
use crate::error::MMCError;

// Most of the constants/layout below are straight from linux/include/scsi/sg.h.
const SG_IO: u64 = 0x2285;
const SENSE_BUF_LEN: usize = 32;

#[repr(i32)]
#[allow(dead_code)]
enum DxferDirection {
    None = -1,
    ToDev = -2,
    FromDev = -3,
    ToFromDev = -4,
}

#[repr(C)]
struct SgIoHeader {
    interface_id: i32,         /* [i] 'S' for SCSI generic (required) */
    dxfer_direction: i32,      /* [i] data transfer direction */
    cmd_len: u8,               /* [i] SCSI command length */
    mx_sb_len: u8,             /* [i] max length to write to sbp */
    iovec_count: u16,          /* [i] 0 implies no scatter gather */
    dxfer_len: u32,            /* [i] byte count of data transfer */
    dxferp: *mut c_void,       /* [i], [*io] data transfer memory or scatter gather list */
    cmdp: *mut c_uchar,        /* [i], [*i] command to perform */
    sbp: *mut c_uchar,         /* [i], [*o] sense_buffer memory */
    timeout: u32,              /* [i] MAX_UINT -> no timeout (unit: millisec) */
    flags: u32,                /* [i] 0 -> default */
    pack_id: i32,              /* [i->o] unused internally (normally) */
    usr_ptr: *mut c_void,      /* [i->o] unused internally */
    status: u8,                /* [o] scsi status */
    masked_status: u8,         /* [o] shifted, masked scsi status */
    msg_status: u8,            /* [o] messaging level data (optional) */
    sb_len_wr: u8,             /* [o] byte count actually written to sbp */
    host_status: u16,          /* [o] errors from host adapter */
    driver_status: u16,        /* [o] errors from software driver */
    resid: i32,                /* [o] dxfer_len - actual_transferred */
    duration: u32,             /* [o] time taken by cmd (unit: millisec) */
    info: u32,                 /* [o] auxiliary information */
}

const SG_INFO_OK_MASK: u32 = 0x1;
const SG_INFO_CHECK: u32 = 0x1;

ioctl_read_bad!(ioctl_sg_io, SG_IO, SgIoHeader);

/// Run one MMC command through `SG_IO` and return its raw response bytes, truncated to the
/// amount of data the drive actually transferred.
pub fn run_sgio<Cmd, const N: usize>(file: &File, cmd: Cmd) -> Result<Vec<u8>, TransportError>
where
    Cmd: Command<N>,
{
    let mut cdb_bytes = cmd.as_cdb();
    let mut data = vec![0u8; cmd.allocation_len()];
    let mut sense = [0u8; SENSE_BUF_LEN];

    let mut hdr = SgIoHeader {
        interface_id: 'S' as i32,
        dxfer_direction: DxferDirection::FromDev as i32,
        cmd_len: cdb_bytes.len() as u8,
        mx_sb_len: sense.len() as u8,
        iovec_count: 0,
        dxfer_len: data.len() as u32,
        dxferp: data.as_mut_ptr() as *mut c_void,
        cmdp: cdb_bytes.as_mut_ptr(),
        sbp: sense.as_mut_ptr(),
        timeout: 10_000,
        flags: 0,
        pack_id: 0,
        usr_ptr: std::ptr::null_mut(),
        status: 0,
        masked_status: 0,
        msg_status: 0,
        sb_len_wr: 0,
        host_status: 0,
        driver_status: 0,
        resid: 0,
        duration: 0,
        info: 0,
    };

    // SAFETY: `hdr` is a valid, fully-initialized SgIoHeader whose dxferp/cmdp/sbp point at
    // buffers that outlive the ioctl call.
    unsafe { ioctl_sg_io(file.as_raw_fd(), &mut hdr) }.map_err(std::io::Error::other)?;

    if hdr.info & SG_INFO_OK_MASK == SG_INFO_CHECK && hdr.sb_len_wr >= 3 {
        let sk = sense[2] & 0x0F;
        let asc = if hdr.sb_len_wr > 12 { sense[12] } else { 0 };
        let ascq = if hdr.sb_len_wr > 13 { sense[13] } else { 0 };
        if let Some(err) = MMCError::from_codes(sk, asc, ascq) {
            return Err(TransportError::Sense(err));
        }
    }

    let received = (data.len() as i32 - hdr.resid).max(0) as usize;
    data.truncate(received);
    Ok(data)
}

/// [`SectorTransport`] issuing MMC `READ CD` over Linux `SG_IO` generic SCSI pass-through.
pub struct LinuxSgioTransport {
    file: File,
}

impl LinuxSgioTransport {
    pub fn open(file: File) -> Self {
        Self { file }
    }
}

impl SectorTransport for LinuxSgioTransport {
    fn read(&mut self, lsn: Lsn, blocks: u32, out: &mut [u8]) -> Result<(), TransportError> {
        let expected = blocks as usize * RAW_AND_SUBQ_FRAME_SIZE;
        if out.len() != expected {
            return Err(TransportError::ShortRead {
                expected,
                received: out.len(),
            });
        }

        let cmd = ReadCD::audio_with_subq(Lba::from(lsn), blocks);
        let data = run_sgio(&self.file, cmd)?;

        if data.len() != expected {
            return Err(TransportError::ShortRead {
                expected,
                received: data.len(),
            });
        }
        out.copy_from_slice(&data);
        Ok(())
    }
}
