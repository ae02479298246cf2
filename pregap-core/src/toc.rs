//! §4.5: the concrete [`TocQueries`] implementation backed by a real TOC read from the drive.

use std::collections::HashMap;

use crate::addressing::Lsn;
use crate::commands::toc::Toc;
use crate::pregap::{TocQueries, TrackNumber};

/// TOC lookups backed by a decoded READ TOC/PMA/ATIP response. Carries no driver-reported
/// pregap hint; [`TocQueries::driver_pregap_lsn`] always returns `None` here, so the finder
/// always falls back to reading Q sub-channel data itself.
pub struct MmcToc {
    first_track: TrackNumber,
    last_track: TrackNumber,
    starts: HashMap<TrackNumber, Lsn>,
}

impl MmcToc {
    pub fn from_toc(toc: &Toc) -> Self {
        let starts = toc
            .track_descriptors
            .iter()
            .map(|d| (d.number, Lsn::from(d.start_addr)))
            .collect();

        Self {
            first_track: toc.first_track_num,
            last_track: toc.last_track_num,
            starts,
        }
    }

    pub fn last_track_number(&self) -> TrackNumber {
        self.last_track
    }
}

impl TocQueries for MmcToc {
    fn first_track_number(&self) -> TrackNumber {
        self.first_track
    }

    fn track_start_lsn(&self, track: TrackNumber) -> Lsn {
        self.starts[&track]
    }
}

#[cfg(not(target_os = "macos"))]
pub use linux::read_toc;

#[cfg(not(target_os = "macos"))]
mod linux {
    use std::fs::File;

    use super::{MmcToc, Toc};
    use crate::commands::toc::FormattedTOC;
    use crate::commands::{Control, ExecuteError, execute};

    const TOC_ALLOCATION_LEN: u16 = 4 + 100 * 8;

    /// Read and decode the drive's full TOC, then wrap it as [`MmcToc`].
    pub fn read_toc(file: &File) -> Result<MmcToc, ExecuteError<FormattedTOC, 10>> {
        let cmd = FormattedTOC::new(0, TOC_ALLOCATION_LEN, Control::from(0));
        let toc: Toc = execute(file, cmd)?;
        Ok(MmcToc::from_toc(&toc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::toc::{Adr, TrackControl, TrackDescriptor};
    use crate::addressing::Lba;

    #[test]
    fn builds_lookup_table_from_decoded_toc() {
        let toc = Toc {
            first_track_num: 1,
            last_track_num: 2,
            track_descriptors: vec![
                TrackDescriptor {
                    adr: Adr::Mode1Q,
                    control: TrackControl::empty(),
                    number: 1,
                    start_addr: Lba::try_from(0).unwrap(),
                },
                TrackDescriptor {
                    adr: Adr::Mode1Q,
                    control: TrackControl::empty(),
                    number: 2,
                    start_addr: Lba::try_from(20_000).unwrap(),
                },
            ],
        };

        let mmc_toc = MmcToc::from_toc(&toc);
        assert_eq!(mmc_toc.first_track_number(), 1);
        assert_eq!(mmc_toc.track_start_lsn(1), Lsn::from(Lba::try_from(0).unwrap()));
        assert_eq!(
            mmc_toc.track_start_lsn(2),
            Lsn::from(Lba::try_from(20_000).unwrap())
        );
        assert_eq!(mmc_toc.driver_pregap_lsn(2), None);
    }
}
