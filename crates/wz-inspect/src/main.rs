//! WZ archive inspector
//!
//! Opens an archive, recovers its version hash and prints the header, the
//! detected version and optionally the root directory listing.

mod args;
mod report;

use anyhow::Result;
use args::InspectArgs;
use report::Report;
use wz_formats::WzArchive;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = InspectArgs::from_args();
    let config = args.archive_config()?;

    tracing::debug!(
        path = %args.path.display(),
        variant = %config.variant,
        encrypted = config.encrypted,
        "Opening archive"
    );

    let mut archive = WzArchive::open_path_with(&args.path, config)?;
    let report = Report::collect(&mut archive, args.list)?;
    archive.close();

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }

    Ok(())
}
