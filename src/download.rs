//! Transfer of captured images to the host

use crate::{
  device::Device,
  error::DeviceError,
  sequence::CaptureRecord,
};
use std::{
  fs,
  io::{self, Write},
  path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

/// Why a single image could not be downloaded
#[derive(Debug, Error)]
pub enum DownloadError {
  /// The camera did not hand out the file
  #[error("could not fetch file from camera: {0}")]
  Fetch(#[source] DeviceError),
  /// The camera reported a name that is not a plain file name
  #[error("refusing to write camera file name {0:?}")]
  InvalidName(String),
  /// A file with the same name already exists locally
  #[error("{} already exists", .0.display())]
  Exists(PathBuf),
  /// Writing the local file failed
  #[error("could not write {}: {source}", .path.display())]
  Write {
    /// Target path
    path: PathBuf,
    /// Underlying error
    source: io::Error,
  },
}

/// An image that is still on the camera after a download pass
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DownloadFailure {
  record: CaptureRecord,
  #[cfg_attr(feature = "serde", serde(serialize_with = "crate::sequence::serialize_display"))]
  error: DownloadError,
}

impl DownloadFailure {
  /// The image that was not downloaded
  pub fn record(&self) -> &CaptureRecord {
    &self.record
  }

  /// What went wrong
  pub fn error(&self) -> &DownloadError {
    &self.error
  }
}

/// Summary of a download pass
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DownloadReport {
  written: Vec<PathBuf>,
  failures: Vec<DownloadFailure>,
}

impl DownloadReport {
  /// Files written, in capture order
  pub fn written(&self) -> &[PathBuf] {
    &self.written
  }

  /// Images that could not be downloaded
  pub fn failures(&self) -> &[DownloadFailure] {
    &self.failures
  }
}

/// Download every record into `out_dir`, named as on the camera.
///
/// Records are processed in order, so files are created in capture order.
/// Downloaded records are removed from `records`, failed ones are kept.
pub fn download_images<D: Device + ?Sized>(
  device: &D,
  records: &mut Vec<CaptureRecord>,
  out_dir: &Path,
) -> DownloadReport {
  let mut report = DownloadReport::default();

  for record in std::mem::take(records) {
    match save(device, &record, out_dir) {
      Ok(target) => {
        info!("Copied {} to {}", record.path(), target.display());
        report.written.push(target);
      }
      Err(error) => {
        warn!("Could not download {}: {error}", record.path());
        records.push(record.clone());
        report.failures.push(DownloadFailure { record, error });
      }
    }
  }

  report
}

fn save<D: Device + ?Sized>(
  device: &D,
  record: &CaptureRecord,
  out_dir: &Path,
) -> Result<PathBuf, DownloadError> {
  let name = record.path().name();
  let file_name = Path::new(name)
    .file_name()
    .filter(|file_name| *file_name == name)
    .ok_or_else(|| DownloadError::InvalidName(name.to_owned()))?;
  let target = out_dir.join(file_name);

  if target.exists() {
    return Err(DownloadError::Exists(target));
  }

  let data = device.fetch_file(record.path()).map_err(DownloadError::Fetch)?;

  let write = |target: &Path| -> io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(target)?;
    file.write_all(&data)?;
    file.sync_all()
  };

  match write(&target) {
    Ok(()) => Ok(target),
    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(DownloadError::Exists(target)),
    Err(source) => Err(DownloadError::Write { path: target, source }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    device::CameraFilePath,
    sequence::{BracketingJob, BracketingParams},
    testing::{self, Event, MockCamera, RecordingPause},
    variant::CameraVariant,
  };
  use std::time::Duration;

  fn captured_job(camera: &MockCamera, dir: &Path, outcomes: &[bool]) -> BracketingJob {
    let params = BracketingParams::new(dir, outcomes.len(), 5, Duration::ZERO).unwrap();
    let mut job = BracketingJob::new(params);
    job.run(camera, CameraVariant::Dslr, &mut RecordingPause(camera.event_log())).unwrap();
    job
  }

  fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> =
      fs::read_dir(dir).unwrap().map(|entry| entry.unwrap().file_name().into_string().unwrap()).collect();
    names.sort();
    names
  }

  #[test]
  fn test_download_after_partial_run() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::new(testing::dslr_tree()).with_captures([true, false, true]);
    let mut job = captured_job(&camera, dir.path(), &[true, false, true]);

    let report = job.download(&camera);

    assert_eq!(report.written(), [dir.path().join("DSC_0001.JPG"), dir.path().join("DSC_0002.JPG")]);
    assert!(report.failures().is_empty());
    assert!(job.records().is_empty());
    assert_eq!(dir_listing(dir.path()), ["DSC_0001.JPG", "DSC_0002.JPG"]);
    assert_eq!(fs::read(dir.path().join("DSC_0002.JPG")).unwrap(), b"image 2");
  }

  #[test]
  fn test_second_download_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::new(testing::dslr_tree());
    let mut job = captured_job(&camera, dir.path(), &[true, true]);

    assert_eq!(job.download(&camera).written().len(), 2);
    let fetches = camera.events().len();

    let report = job.download(&camera);
    assert!(report.written().is_empty());
    assert!(report.failures().is_empty());
    assert_eq!(camera.events().len(), fetches);
    assert_eq!(dir_listing(dir.path()).len(), 2);
  }

  #[test]
  fn test_failed_download_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::new(testing::dslr_tree()).with_broken_file("DSC_0002.JPG");
    let mut job = captured_job(&camera, dir.path(), &[true, true, true]);

    let report = job.download(&camera);

    assert_eq!(report.written().len(), 2);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].record().index(), 1);
    insta::assert_snapshot!(report.failures()[0].error().to_string(), @"could not fetch file from camera: I/O problem");
    assert_eq!(job.records().len(), 1);
    assert_eq!(job.records()[0].path().name(), "DSC_0002.JPG");

    let fetched: Vec<_> =
      camera.events().into_iter().filter(|event| matches!(event, Event::Fetch(_))).collect();
    assert_eq!(
      fetched,
      vec![
        Event::Fetch("DSC_0001.JPG".into()),
        Event::Fetch("DSC_0002.JPG".into()),
        Event::Fetch("DSC_0003.JPG".into()),
      ]
    );
  }

  #[test]
  fn test_existing_file_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::new(testing::dslr_tree());
    let mut job = captured_job(&camera, dir.path(), &[true]);
    fs::write(dir.path().join("DSC_0001.JPG"), b"older image").unwrap();

    let report = job.download(&camera);

    assert!(matches!(report.failures()[0].error(), DownloadError::Exists(_)));
    assert_eq!(fs::read(dir.path().join("DSC_0001.JPG")).unwrap(), b"older image");
    assert_eq!(job.records().len(), 1);
  }

  #[cfg(feature = "serde")]
  #[test]
  fn test_reports_are_serializable() {
    fn serializable<T: serde::Serialize>(_: &T) {}

    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::new(testing::dslr_tree()).with_broken_file("DSC_0001.JPG");
    let mut job = captured_job(&camera, dir.path(), &[true, true]);
    let report = job.download(&camera);

    serializable(&report);
    serializable(&report.failures()[0]);
  }

  #[test]
  fn test_rejects_path_in_name() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::new(testing::dslr_tree());
    let record_path = CameraFilePath::new("/DCIM", "../escape.jpg");

    let err = save(&camera, &CaptureRecord::new(0, record_path), dir.path()).unwrap_err();
    assert!(matches!(err, DownloadError::InvalidName(ref name) if name == "../escape.jpg"));
  }
}
