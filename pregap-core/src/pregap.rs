//! §4.4: the bound-tightening pregap-finding algorithm.

use log::{debug, error, warn};

use crate::addressing::Lsn;
use crate::constants::{COARSE_BACKTRACK_STEP, DEFAULT_HARD_RETRIES, DEFAULT_NORMAL_RETRIES};
use crate::retry::RetryingReader;
use crate::transport::{SectorTransport, TransportError};

pub type TrackNumber = u8;

/// §4.5: TOC lookups the pregap finder depends on.
pub trait TocQueries {
    fn first_track_number(&self) -> TrackNumber;

    fn track_start_lsn(&self, track: TrackNumber) -> Lsn;

    /// A driver-reported pregap LSN for `track`, if the transport exposes one. `None` means
    /// "no hint"; most MMC drives never provide one.
    fn driver_pregap_lsn(&self, _track: TrackNumber) -> Option<Lsn> {
        None
    }
}

/// §9: the two-tier retry ceiling, the one configurable knob the algorithm permits.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub normal_retries: u32,
    pub hard_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            normal_retries: DEFAULT_NORMAL_RETRIES,
            hard_retries: DEFAULT_HARD_RETRIES,
        }
    }
}

pub struct PregapFinder<'t, T: SectorTransport> {
    reader: RetryingReader<'t, T>,
    policy: RetryPolicy,
}

impl<'t, T: SectorTransport> PregapFinder<'t, T> {
    pub fn new(transport: &'t mut T, policy: RetryPolicy) -> Self {
        Self {
            reader: RetryingReader::new(transport),
            policy,
        }
    }

    /// §4.4: find the first LSN of `track`'s pregap, or `track_start_lsn` if it has none, or
    /// `None` (`INVALID_LSN`) if the bounds cannot be tightened to a single sector.
    pub fn find_pregap_lsn(
        &mut self,
        toc: &impl TocQueries,
        track: TrackNumber,
    ) -> Result<Option<Lsn>, TransportError> {
        // 4.4.1: fast paths.
        if let Some(driver_lsn) = toc.driver_pregap_lsn(track) {
            debug!("track {track}: driver-reported pregap lsn {driver_lsn}");
            return Ok(Some(driver_lsn));
        }

        if track == toc.first_track_number() {
            return Ok(Some(Lsn::ZERO));
        }

        let track_start_lsn = toc.track_start_lsn(track);
        let prev_track_number = track - 1;
        let prev_track_start_lsn = toc.track_start_lsn(prev_track_number);

        if prev_track_start_lsn + Lsn::new(1) == track_start_lsn {
            return Ok(Some(track_start_lsn));
        }

        let mut right_bound = track_start_lsn;
        let mut retry_max = self.policy.normal_retries;

        // 4.4.2: preamble, one sector before track start.
        let mut lsn = track_start_lsn - Lsn::new(1);
        let preamble = self.reader.read_with_retry(lsn, retry_max)?;
        if preamble.crc_ok && preamble.record.is_current_position() {
            if preamble.record.track_number == prev_track_number {
                return Ok(Some(track_start_lsn));
            }
            if preamble.record.track_number == track {
                right_bound = lsn;
            }
        }

        // 4.4.3: coarse backtrack in 2-second steps.
        loop {
            let stepped = lsn.raw() - COARSE_BACKTRACK_STEP as i32;
            lsn = if stepped >= prev_track_start_lsn.raw() {
                Lsn::new(stepped)
            } else {
                prev_track_start_lsn
            };

            if lsn == prev_track_start_lsn {
                break;
            }

            let read = self.reader.read_with_retry(lsn, retry_max)?;
            if !read.crc_ok || !read.record.is_current_position() {
                continue;
            }

            if read.record.track_number == track {
                right_bound = lsn;
            } else {
                debug_assert_eq!(read.record.track_number, prev_track_number);
                break;
            }
        }
        let mut left_bound = lsn;
        debug!("track {track}: coarse backtrack settled left={left_bound} right={right_bound}");

        // 4.4.4 / 4.4.5: fine contraction, with hard-retry escalation.
        debug_assert!(left_bound >= prev_track_start_lsn);
        debug_assert!(right_bound <= track_start_lsn);
        debug_assert_eq!(lsn, left_bound);

        while left_bound + Lsn::new(1) != right_bound {
            lsn = lsn + Lsn::new(1);

            if lsn == right_bound {
                if retry_max == self.policy.hard_retries {
                    break;
                }
                debug!("track {track}: escalating to hard retry ceiling ({})", self.policy.hard_retries);
                retry_max = self.policy.hard_retries;
                lsn = left_bound;
                continue;
            }

            let read = self.reader.read_with_retry(lsn, retry_max)?;
            if !read.crc_ok {
                warn!("lsn {lsn}: CRC never verified, routing around");
                continue;
            }

            if !read.record.is_current_position() {
                if lsn - Lsn::new(1) == left_bound {
                    left_bound = lsn;
                }
            } else if read.record.track_number == prev_track_number {
                left_bound = lsn;
            } else if read.record.track_number == track {
                right_bound = lsn;
                lsn = left_bound;
            }
        }

        if left_bound + Lsn::new(1) == right_bound {
            Ok(Some(right_bound))
        } else {
            error!("track {track}: failed to converge bounds (left={left_bound} right={right_bound})");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subq::SubqRecord;
    use crate::transport::TransportError;
    use std::collections::HashMap;

    struct FakeToc {
        first_track: TrackNumber,
        starts: HashMap<TrackNumber, Lsn>,
        driver_hint: Option<Lsn>,
    }

    impl TocQueries for FakeToc {
        fn first_track_number(&self) -> TrackNumber {
            self.first_track
        }

        fn track_start_lsn(&self, track: TrackNumber) -> Lsn {
            self.starts[&track]
        }

        fn driver_pregap_lsn(&self, _track: TrackNumber) -> Option<Lsn> {
            self.driver_hint
        }
    }

    /// A fake transport built from a closure mapping LSN -> (track_number, index_number, is_position).
    /// Non-position sectors (mode 2/3) get `adr = 2`.
    struct FakeTransport {
        sectors: HashMap<i32, SubqRecord>,
        bad_crc: std::collections::HashSet<i32>,
        flaky_until_attempt: HashMap<i32, u32>,
        attempts: HashMap<i32, u32>,
        reads: u32,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                sectors: HashMap::new(),
                bad_crc: std::collections::HashSet::new(),
                flaky_until_attempt: HashMap::new(),
                attempts: HashMap::new(),
                reads: 0,
            }
        }

        fn with_position(mut self, lsn: i32, track: u8) -> Self {
            self.sectors.insert(
                lsn,
                SubqRecord {
                    control: 0,
                    adr: 1,
                    track_number: track,
                    index_number: 0,
                    min: 0,
                    sec: 0,
                    frame: 0,
                    amin: 0,
                    asec: 0,
                    aframe: 0,
                    stored_crc: 0,
                },
            );
            self
        }

        fn with_range(mut self, range: std::ops::Range<i32>, track: u8) -> Self {
            for lsn in range {
                self = self.with_position(lsn, track);
            }
            self
        }

        fn always_bad_crc(mut self, range: std::ops::Range<i32>) -> Self {
            self.bad_crc.extend(range);
            self
        }

        fn flaky(mut self, range: std::ops::Range<i32>, succeed_on_attempt: u32) -> Self {
            for lsn in range {
                self.flaky_until_attempt.insert(lsn, succeed_on_attempt);
            }
            self
        }
    }

    impl SectorTransport for FakeTransport {
        fn read(
            &mut self,
            lsn: Lsn,
            _blocks: u32,
            out: &mut [u8],
        ) -> Result<(), TransportError> {
            self.reads += 1;
            let key = lsn.raw();
            let record = *self
                .sectors
                .get(&key)
                .unwrap_or_else(|| panic!("unfixtured lsn {key}"));

            let mut raw = record.encode();

            let attempt = self.attempts.entry(key).or_insert(0);
            *attempt += 1;

            let force_bad = self.bad_crc.contains(&key)
                || self
                    .flaky_until_attempt
                    .get(&key)
                    .is_some_and(|&needed| *attempt < needed);

            if force_bad {
                raw[10] ^= 0xFF;
            }

            out.copy_from_slice(&raw);
            Ok(())
        }
    }

    fn toc(prev_start: i32, track_start: i32) -> FakeToc {
        FakeToc {
            first_track: 1,
            starts: HashMap::from([(1, Lsn::new(prev_start)), (2, Lsn::new(track_start))]),
            driver_hint: None,
        }
    }

    #[test]
    fn s1_no_pregap() {
        let mut transport = FakeTransport::new()
            .with_range(10_000..20_000, 1)
            .with_position(19_999, 1);
        let toc = toc(10_000, 20_000);
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap();
        assert_eq!(result, Some(Lsn::new(20_000)));
    }

    #[test]
    fn s2_exact_two_second_pregap() {
        let mut transport = FakeTransport::new()
            .with_range(10_000..19_850, 1)
            .with_range(19_850..20_000, 2);
        let toc = toc(10_000, 20_000);
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap();
        assert_eq!(result, Some(Lsn::new(19_850)));
    }

    #[test]
    fn s3_single_sector_previous_track() {
        let mut transport = FakeTransport::new();
        let toc = toc(20_000, 20_001);
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap();
        assert_eq!(result, Some(Lsn::new(20_001)));
        assert_eq!(transport.reads, 0);
    }

    #[test]
    fn s4_bad_crcs_inside_pregap_are_routed_around() {
        let mut transport = FakeTransport::new()
            .with_range(10_000..19_850, 1)
            .with_range(19_850..20_000, 2)
            .always_bad_crc(19_900..19_906);
        let toc = toc(10_000, 20_000);
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap();
        assert_eq!(result, Some(Lsn::new(19_850)));
    }

    #[test]
    fn s5_bad_crcs_straddling_boundary_need_escalation() {
        let mut transport = FakeTransport::new()
            .with_range(10_000..19_850, 1)
            .with_range(19_850..20_000, 2)
            .flaky(19_849..19_852, 50);
        let toc = toc(10_000, 20_000);
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap();
        assert_eq!(result, Some(Lsn::new(19_850)));
    }

    #[test]
    fn s6_driver_reports_pregap_directly() {
        let mut transport = FakeTransport::new();
        let mut toc = toc(10_000, 20_000);
        toc.driver_hint = Some(Lsn::new(19_850));
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap();
        assert_eq!(result, Some(Lsn::new(19_850)));
        assert_eq!(transport.reads, 0);
    }

    #[test]
    fn invariant_returned_lsn_within_bounds() {
        let mut transport = FakeTransport::new()
            .with_range(10_000..19_900, 1)
            .with_range(19_900..20_000, 2);
        let toc = toc(10_000, 20_000);
        let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());
        let result = finder.find_pregap_lsn(&toc, 2).unwrap().unwrap();
        assert!(result >= Lsn::ZERO);
        assert!(result <= toc.track_start_lsn(2));
    }
}
