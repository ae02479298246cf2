//! §4.3: read one sector, retrying while its Q sub-channel CRC fails to verify, while letting a
//! transport error through unchanged.

use log::trace;

use crate::addressing::Lsn;
use crate::constants::RAW_AND_SUBQ_FRAME_SIZE;
use crate::subq::{SUBQ_LEN, SubqRecord};
use crate::transport::{SectorTransport, TransportError};

/// One raw audio+Q-subchannel frame read at a known LSN, decoded, with its CRC-verification
/// outcome recorded so callers can treat a CRC-failing read as ambiguous rather than fatal.
pub struct ReadResult {
    pub lsn: Lsn,
    pub record: SubqRecord,
    pub crc_ok: bool,
}

/// Wraps a [`SectorTransport`] with the two-tier retry policy described in §4.3 / §9: cheap
/// attempts for sectors the pregap algorithm can route around, and an escalated ceiling for
/// sectors it cannot.
pub struct RetryingReader<'t, T: SectorTransport> {
    transport: &'t mut T,
}

impl<'t, T: SectorTransport> RetryingReader<'t, T> {
    pub fn new(transport: &'t mut T) -> Self {
        Self { transport }
    }

    /// Read and decode the sector at `lsn`, retrying up to `max_retries` additional attempts
    /// while the decoded CRC does not verify. A transport error, on the first attempt or any
    /// retry, is returned immediately and is never retried.
    pub fn read_with_retry(
        &mut self,
        lsn: Lsn,
        max_retries: u32,
    ) -> Result<ReadResult, TransportError> {
        let mut frame = self.transport.read_one(lsn)?;
        let mut record = decode(&frame);
        let mut crc_ok = record.crc_ok(&subq_tail(&frame));

        let mut attempts = 0;
        while attempts < max_retries && !crc_ok {
            attempts += 1;
            trace!("lsn {lsn}: CRC retry {attempts}/{max_retries}");
            frame = self.transport.read_one(lsn)?;
            record = decode(&frame);
            crc_ok = record.crc_ok(&subq_tail(&frame));
        }

        Ok(ReadResult {
            lsn,
            record,
            crc_ok,
        })
    }
}

fn subq_tail(frame: &[u8; RAW_AND_SUBQ_FRAME_SIZE]) -> [u8; SUBQ_LEN] {
    frame[RAW_AND_SUBQ_FRAME_SIZE - SUBQ_LEN..].try_into().unwrap()
}

fn decode(frame: &[u8; RAW_AND_SUBQ_FRAME_SIZE]) -> SubqRecord {
    SubqRecord::decode(&subq_tail(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FlakyTransport {
        frames: HashMap<i32, [u8; RAW_AND_SUBQ_FRAME_SIZE]>,
        fail_until_attempt: HashMap<i32, u32>,
        attempts: HashMap<i32, u32>,
    }

    impl SectorTransport for FlakyTransport {
        fn read(
            &mut self,
            lsn: Lsn,
            _blocks: u32,
            out: &mut [u8],
        ) -> Result<(), TransportError> {
            let key = lsn.raw();
            let attempt = self.attempts.entry(key).or_insert(0);
            *attempt += 1;

            let mut frame = *self.frames.get(&key).expect("unfixtured lsn");
            if let Some(&needed) = self.fail_until_attempt.get(&key) {
                if *attempt < needed {
                    // Corrupt the stored CRC so it fails to verify.
                    let tail_start = RAW_AND_SUBQ_FRAME_SIZE - SUBQ_LEN;
                    frame[tail_start + 10] ^= 0xFF;
                }
            }
            out.copy_from_slice(&frame);
            Ok(())
        }
    }

    fn fixture(record: SubqRecord) -> [u8; RAW_AND_SUBQ_FRAME_SIZE] {
        let mut frame = [0u8; RAW_AND_SUBQ_FRAME_SIZE];
        let tail_start = RAW_AND_SUBQ_FRAME_SIZE - SUBQ_LEN;
        frame[tail_start..].copy_from_slice(&record.encode());
        frame
    }

    #[test]
    fn succeeds_immediately_when_crc_is_good() {
        let record = SubqRecord {
            control: 0,
            adr: 1,
            track_number: 2,
            index_number: 1,
            min: 0,
            sec: 0,
            frame: 0,
            amin: 0,
            asec: 2,
            aframe: 0,
            stored_crc: 0,
        };
        let mut transport = FlakyTransport {
            frames: HashMap::from([(5, fixture(record))]),
            fail_until_attempt: HashMap::new(),
            attempts: HashMap::new(),
        };
        let mut reader = RetryingReader::new(&mut transport);
        let result = reader.read_with_retry(Lsn::new(5), 5).unwrap();
        assert!(result.crc_ok);
        assert_eq!(*transport_attempts(&transport, 5), 1);
    }

    fn transport_attempts(t: &FlakyTransport, lsn: i32) -> &u32 {
        t.attempts.get(&lsn).unwrap()
    }

    #[test]
    fn retries_until_crc_verifies() {
        let record = SubqRecord {
            control: 0,
            adr: 1,
            track_number: 2,
            index_number: 0,
            min: 0,
            sec: 0,
            frame: 0,
            amin: 0,
            asec: 2,
            aframe: 0,
            stored_crc: 0,
        };
        let mut transport = FlakyTransport {
            frames: HashMap::from([(7, fixture(record))]),
            fail_until_attempt: HashMap::from([(7, 3)]),
            attempts: HashMap::new(),
        };
        let mut reader = RetryingReader::new(&mut transport);
        let result = reader.read_with_retry(Lsn::new(7), 5).unwrap();
        assert!(result.crc_ok);
        assert_eq!(*transport_attempts(&transport, 7), 3);
    }

    #[test]
    fn gives_up_quietly_after_exhausting_retries() {
        let record = SubqRecord {
            control: 0,
            adr: 1,
            track_number: 2,
            index_number: 0,
            min: 0,
            sec: 0,
            frame: 0,
            amin: 0,
            asec: 2,
            aframe: 0,
            stored_crc: 0,
        };
        let mut transport = FlakyTransport {
            frames: HashMap::from([(9, fixture(record))]),
            fail_until_attempt: HashMap::from([(9, 100)]),
            attempts: HashMap::new(),
        };
        let mut reader = RetryingReader::new(&mut transport);
        let result = reader.read_with_retry(Lsn::new(9), 3).unwrap();
        assert!(!result.crc_ok);
        assert_eq!(*transport_attempts(&transport, 9), 4);
    }
}
