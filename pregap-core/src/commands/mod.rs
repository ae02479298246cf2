//! MMC command descriptor blocks (CDBs) and the SCSI generic pass-through glue used to issue
//! them on Linux. CDBs are built the same way regardless of OS; only the transport that carries
//! them to the drive differs (see [`crate::transport`]).

pub mod inquiry;
pub mod read_cd;
pub mod toc;

use derive_more::{Debug, From, Into};
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ExecuteError<Cmd: Command<N>, const N: usize> {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to parse the response from the command")]
    Parse(#[source] <Cmd::Response as TryFrom<Vec<u8>>>::Error),
}

/// A single MMC command: its CDB encoding and the shape of its response.
pub trait Command<const CDB_LEN: usize>: Sized {
    /// OPERATION CODE for this command.
    /// ```text
    ///   7   6   5   4   3   2   1   0
    /// +---+---+---+---+---+---+---+---+
    /// | GROUPCODE |    COMMAND CODE   |
    /// +---+---+---+---+---+---+---+---+
    /// ```
    const OP_CODE: u8;

    /// Parsed response type. Commands that just want the raw bytes use `Vec<u8>`.
    type Response: TryFrom<Vec<u8>>;

    fn as_cdb(&self) -> [u8; CDB_LEN];

    /// Number of bytes of response data to allocate for the transfer.
    fn allocation_len(&self) -> usize;
}

/// Issue `cmd` over `SG_IO` and parse its response. The one entry point a caller needs; the
/// split between CDB encoding ([`Command`]) and transport ([`crate::transport::sgio::run_sgio`])
/// stays internal.
#[cfg(not(target_os = "macos"))]
pub fn execute<Cmd: Command<N>, const N: usize>(
    file: &std::fs::File,
    cmd: Cmd,
) -> Result<Cmd::Response, ExecuteError<Cmd, N>> {
    let bytes = crate::transport::sgio::run_sgio(file, cmd)?;
    <Cmd::Response as TryFrom<Vec<u8>>>::try_from(bytes).map_err(ExecuteError::Parse)
}

/// CONTROL byte newtype.
/// ```text
///   7   6   5   4   3   2   1   0
/// +---+---+---+---+---+---+---+---+
/// |   VS  |  Reserved | N | O | L |
/// +---+---+---+---+---+---+---+---+
/// ```
/// * **VS** - Vendor Specific
/// * **N**  - NACA (Normal Auto Contingent Allegiance)
/// * **O**  - Obsolete
/// * **L**  - Link
#[repr(transparent)]
#[derive(Debug, Clone, Copy, From, Into)]
pub struct Control(u8);
