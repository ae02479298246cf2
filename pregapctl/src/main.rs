use std::fs::File;
use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use log::{error, info};

use pregap_core::addressing::{Lba, Msf};
use pregap_core::{PregapFinder, RetryPolicy, TocQueries};

/// Report the pregap start of one or all tracks on a CD, found by reading raw Q sub-channel
/// data directly rather than trusting the drive's TOC.
#[derive(Parser)]
struct Args {
    /// Block device to open, e.g. /dev/sr0.
    device: PathBuf,

    /// Track number to report. Omit to report every track after the first.
    track: Option<u8>,
}

#[cfg(not(target_os = "macos"))]
fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    use pregap_core::commands::execute;
    use pregap_core::commands::inquiry::Inquiry;
    use pregap_core::toc::read_toc;
    use pregap_core::transport::sgio::LinuxSgioTransport;

    let file = File::open(&args.device)?;
    info!("opened {}", args.device.display());

    let inquiry = execute(&file, Inquiry::new(0.into()))?;
    println!(
        "drive: {} {} (revision {})",
        inquiry.t10_vendor_identification,
        inquiry.product_identification,
        inquiry.product_revision_level
    );

    let toc = read_toc(&file)?;

    let tracks = match args.track {
        Some(track) => vec![track],
        None => ((toc.first_track_number() + 1)..=toc.last_track_number()).collect(),
    };

    let mut transport = LinuxSgioTransport::open(File::open(&args.device)?);
    let mut finder = PregapFinder::new(&mut transport, RetryPolicy::default());

    for track in tracks {
        match finder.find_pregap_lsn(&toc, track) {
            Ok(Some(lsn)) => {
                let msf = Msf::from(Lba::from(lsn));
                println!("track {track:2}: pregap starts at LSN {lsn} ({msf})");
            }
            Ok(None) => {
                println!("track {track:2}: could not converge on a pregap start");
            }
            Err(err) => {
                error!("track {track}: {err}");
            }
        }
    }

    Ok(())
}

#[cfg(target_os = "macos")]
fn run(_args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    Err("TOC reading is not wired up for macOS yet; only the MMC READ CD sector transport is".into())
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let timestamp = Local::now();
    println!("pregapctl run at {timestamp}");

    if let Err(err) = run(&args) {
        error!("{err}");
        std::process::exit(1);
    }
}
