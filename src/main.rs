use anyhow::Context as _;
use clap::Parser;
use focus_bracket::{
  gphoto::{self, GPhotoCamera},
  sequence::{ThreadSleep, DEFAULT_FOCUS_STEP, DEFAULT_IMAGE_COUNT, DEFAULT_STABILIZATION_DELAY},
  BracketingJob, BracketingParams, Runner,
};
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Focus bracketing with gphoto2 cameras.
///
/// Drives the focus motor by a fixed number of steps between images and
/// downloads the images once the sequence is complete.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
  /// Existing directory the images are downloaded to
  #[arg(short, long, required_unless_present = "list_config")]
  out_dir: Option<PathBuf>,

  /// Number of images
  #[arg(long = "images", default_value_t = DEFAULT_IMAGE_COUNT)]
  images: usize,

  /// Focus motor steps between two images, negative values focus the other way
  #[arg(long, default_value_t = DEFAULT_FOCUS_STEP, allow_negative_numbers = true)]
  focus_drive_step: i32,

  /// Seconds to wait for vibrations to settle before the first image
  #[arg(long, default_value_t = DEFAULT_STABILIZATION_DELAY.as_secs())]
  stabilization_delay: u64,

  /// Print the camera configuration and exit
  #[arg(long)]
  list_config: bool,
}

fn setup_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).with(filter).init();
}

fn main() -> ExitCode {
  setup_logging();

  match try_main(Args::parse()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{err:#}");
      ExitCode::FAILURE
    }
  }
}

fn try_main(args: Args) -> anyhow::Result<()> {
  info!("Using libgphoto2 {}", gphoto::library_version().unwrap_or("(unknown version)"));

  if args.list_config {
    let mut runner = Runner::connect(GPhotoCamera::autodetect)?;
    print!("{}", runner.read_config()?);
    return Ok(runner.close()?);
  }

  let out_dir = args.out_dir.context("--out-dir is required")?;
  let params = BracketingParams::new(
    out_dir,
    args.images,
    args.focus_drive_step,
    Duration::from_secs(args.stabilization_delay),
  )?;
  let mut job = BracketingJob::new(params);

  let summary = Runner::run(GPhotoCamera::autodetect, &mut job, &mut ThreadSleep)?;

  info!(
    variant = %summary.variant,
    captured = summary.run.succeeded(),
    failed = summary.run.failed(),
    downloaded = summary.download.written().len(),
    "Focus bracketing done"
  );

  for failure in summary.run.failures() {
    warn!("Image {} was not captured: {}", failure.index(), failure.error());
  }

  let missing = summary.download.failures();
  if !missing.is_empty() {
    for failure in missing {
      warn!("{} is still on the camera: {}", failure.record().path(), failure.error());
    }
    anyhow::bail!("{} of {} images could not be downloaded", missing.len(), summary.run.succeeded());
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let args = Args::try_parse_from(["focus-bracket", "-o", "/tmp"]).unwrap();

    assert_eq!(args.out_dir, Some(PathBuf::from("/tmp")));
    assert_eq!(args.images, 100);
    assert_eq!(args.focus_drive_step, 10);
    assert_eq!(args.stabilization_delay, 300);
    assert!(!args.list_config);
  }

  #[test]
  fn test_negative_step() {
    let args =
      Args::try_parse_from(["focus-bracket", "--out-dir", "/tmp", "--focus-drive-step", "-25", "--images", "3"])
        .unwrap();

    assert_eq!(args.focus_drive_step, -25);
    assert_eq!(args.images, 3);
  }

  #[test]
  fn test_out_dir_required() {
    assert!(Args::try_parse_from(["focus-bracket"]).is_err());
    assert!(Args::try_parse_from(["focus-bracket", "--list-config"]).is_ok());
  }
}
