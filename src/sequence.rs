//! Focus bracketing
//!
//! A [`BracketingJob`] owns the list of images captured during its latest run.
//! The images stay on the camera until [`BracketingJob::download`] copies them
//! to the output directory.

use crate::{
  device::{CameraFilePath, Device},
  download::{download_images, DownloadReport},
  error::{DeviceError, Error, Result},
  focus::step_focus,
  variant::CameraVariant,
};
use std::{
  fs,
  path::{Path, PathBuf},
  thread,
  time::Duration,
};
use tracing::{info, warn};

/// Number of images taken when not specified otherwise
pub const DEFAULT_IMAGE_COUNT: usize = 100;
/// Focus motor steps between two images when not specified otherwise
pub const DEFAULT_FOCUS_STEP: i32 = 10;
/// Time given to vibrations to settle when not specified otherwise
pub const DEFAULT_STABILIZATION_DELAY: Duration = Duration::from_secs(5 * 60);

/// Blocks the bracketing run while the setup settles
pub trait Pause {
  /// Wait for `duration`
  fn pause(&mut self, duration: Duration);
}

/// [`Pause`] that puts the current thread to sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
  fn pause(&mut self, duration: Duration) {
    thread::sleep(duration);
  }
}

/// Parameters of a bracketing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketingParams {
  out_dir: PathBuf,
  image_count: usize,
  focus_step: i32,
  stabilization_delay: Duration,
}

impl BracketingParams {
  /// Create run parameters.
  ///
  /// `out_dir` has to be an existing, writable directory.
  pub fn new(
    out_dir: impl Into<PathBuf>,
    image_count: usize,
    focus_step: i32,
    stabilization_delay: Duration,
  ) -> Result<Self> {
    let out_dir = out_dir.into();
    check_out_dir(&out_dir)?;

    Ok(Self { out_dir, image_count, focus_step, stabilization_delay })
  }

  /// Directory the images are downloaded to
  pub fn out_dir(&self) -> &Path {
    &self.out_dir
  }

  /// Number of captures attempted per run
  pub fn image_count(&self) -> usize {
    self.image_count
  }

  /// Focus motor steps applied before each capture
  pub fn focus_step(&self) -> i32 {
    self.focus_step
  }

  /// Wait before the first capture
  pub fn stabilization_delay(&self) -> Duration {
    self.stabilization_delay
  }
}

fn check_out_dir(path: &Path) -> Result<()> {
  let invalid = |reason: String| Error::OutputDirectory { path: path.to_owned(), reason };

  let metadata = fs::metadata(path).map_err(|err| invalid(err.to_string()))?;
  if !metadata.is_dir() {
    return Err(invalid("not a directory".into()));
  }

  // Mode bits miss ownership and ACLs
  tempfile::Builder::new()
    .prefix(".focus-bracket-")
    .tempfile_in(path)
    .and_then(|file| file.close())
    .map_err(|err| invalid(format!("not writable: {err}")))
}

/// Image captured during a run, still stored on the camera
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CaptureRecord {
  index: usize,
  path: CameraFilePath,
}

impl CaptureRecord {
  pub(crate) fn new(index: usize, path: CameraFilePath) -> Self {
    Self { index, path }
  }

  /// Position of the shot within its run, starting at 0
  pub fn index(&self) -> usize {
    self.index
  }

  /// Location of the image on the camera
  pub fn path(&self) -> &CameraFilePath {
    &self.path
  }
}

/// A shot whose capture failed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CaptureFailure {
  index: usize,
  #[cfg_attr(feature = "serde", serde(serialize_with = "crate::sequence::serialize_display"))]
  error: DeviceError,
}

impl CaptureFailure {
  /// Position of the shot within its run
  pub fn index(&self) -> usize {
    self.index
  }

  /// Why the camera did not capture
  pub fn error(&self) -> &DeviceError {
    &self.error
  }
}

#[cfg(feature = "serde")]
pub(crate) fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(
  value: &T,
  serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
  serializer.collect_str(value)
}

/// Outcome of one iteration of the bracketing loop
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ShotOutcome {
  /// The image was captured
  Captured(CaptureRecord),
  /// The capture failed, the run went on
  Failed(CaptureFailure),
}

/// Summary of a bracketing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunReport {
  outcomes: Vec<ShotOutcome>,
}

impl RunReport {
  /// Every attempted shot in order
  pub fn outcomes(&self) -> &[ShotOutcome] {
    &self.outcomes
  }

  /// Number of attempted captures
  pub fn attempted(&self) -> usize {
    self.outcomes.len()
  }

  /// Number of captured images
  pub fn succeeded(&self) -> usize {
    self.outcomes.iter().filter(|outcome| matches!(outcome, ShotOutcome::Captured(_))).count()
  }

  /// Number of failed captures
  pub fn failed(&self) -> usize {
    self.attempted() - self.succeeded()
  }

  /// The failed captures
  pub fn failures(&self) -> impl Iterator<Item = &CaptureFailure> {
    self.outcomes.iter().filter_map(|outcome| match outcome {
      ShotOutcome::Failed(failure) => Some(failure),
      ShotOutcome::Captured(_) => None,
    })
  }
}

/// A focus bracketing job and the images of its latest run
#[derive(Debug)]
pub struct BracketingJob {
  params: BracketingParams,
  records: Vec<CaptureRecord>,
}

impl BracketingJob {
  /// Creates a job without any captured images
  pub fn new(params: BracketingParams) -> Self {
    Self { params, records: Vec::new() }
  }

  /// Parameters of the job
  pub fn params(&self) -> &BracketingParams {
    &self.params
  }

  /// Images captured and not yet downloaded, in capture order
  pub fn records(&self) -> &[CaptureRecord] {
    &self.records
  }

  /// Run the bracketing sequence.
  ///
  /// Waits once for the stabilization delay, then steps the focus and
  /// triggers a capture `image_count` times. A failed capture is reported and
  /// skipped. A failed focus step aborts the run, the images captured up to
  /// that point stay in [`records`](Self::records).
  pub fn run<D, P>(&mut self, device: &D, variant: CameraVariant, pause: &mut P) -> Result<RunReport>
  where
    D: Device + ?Sized,
    P: Pause + ?Sized,
  {
    info!("Performing focus bracketing");
    self.records.clear();

    let count = self.params.image_count;
    let delay = self.params.stabilization_delay;

    info!("Waiting {delay:?} to reduce vibration");
    pause.pause(delay);

    let mut report = RunReport::default();

    for index in 0..count {
      step_focus(device, variant, self.params.focus_step)?;

      let outcome = match device.capture_image() {
        Ok(path) => {
          info!("[{}/{count}] captured {path}", index + 1);
          let record = CaptureRecord::new(index, path);
          self.records.push(record.clone());
          ShotOutcome::Captured(record)
        }
        Err(error) => {
          warn!("[{}/{count}] capture failed: {error}", index + 1);
          ShotOutcome::Failed(CaptureFailure { index, error })
        }
      };

      report.outcomes.push(outcome);
    }

    info!(
      attempted = report.attempted(),
      succeeded = report.succeeded(),
      failed = report.failed(),
      "Bracketing finished"
    );

    Ok(report)
  }

  /// Copy the captured images into the output directory.
  ///
  /// Downloaded images are removed from [`records`](Self::records), images
  /// that could not be downloaded stay there so the download can be retried.
  pub fn download<D: Device + ?Sized>(&mut self, device: &D) -> DownloadReport {
    download_images(device, &mut self.records, &self.params.out_dir)
  }
}
