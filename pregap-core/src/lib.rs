//! Finds the start of a CD audio track's pregap by reading raw Q sub-channel data directly from
//! the drive (§1-4), independent of whatever (usually wrong) TOC-derived pregap a driver reports.

pub mod addressing;
pub mod commands;
pub mod constants;
pub mod error;
pub mod pregap;
pub mod retry;
pub mod subq;
pub mod toc;
pub mod transport;

pub use pregap::{PregapFinder, RetryPolicy, TocQueries, TrackNumber};
pub use transport::SectorTransport;
