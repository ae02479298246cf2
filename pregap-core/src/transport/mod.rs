//! Platform-specific raw sector transports (§4.1). The pregap finder depends only on the
//! [`SectorTransport`] trait; it never reaches into OS or library internals to get there.

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(not(target_os = "macos"))]
pub mod sgio;

use thiserror::Error;

use crate::addressing::Lsn;
use crate::constants::RAW_AND_SUBQ_FRAME_SIZE;
use crate::error::MMCError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sense(#[from] MMCError),
    #[error("transport returned {received} bytes, expected {expected}")]
    ShortRead { expected: usize, received: usize },
}

/// Read `N` consecutive raw audio+Q-subchannel sectors at a given LSN from the drive. No retry
/// logic of its own: the transport reports the first failure (§4.1).
pub trait SectorTransport {
    /// Fill `out` with `blocks` consecutive raw frames starting at `lsn`. `out.len()` must equal
    /// `blocks as usize * RAW_AND_SUBQ_FRAME_SIZE`.
    fn read(&mut self, lsn: Lsn, blocks: u32, out: &mut [u8]) -> Result<(), TransportError>;

    /// Convenience wrapper reading exactly one frame.
    fn read_one(&mut self, lsn: Lsn) -> Result<[u8; RAW_AND_SUBQ_FRAME_SIZE], TransportError> {
        let mut frame = [0u8; RAW_AND_SUBQ_FRAME_SIZE];
        self.read(lsn, 1, &mut frame)?;
        Ok(frame)
    }
}
