//! Bracketing session
//!
//! The [`Runner`] owns the camera session and walks it through
//! connect → configure → bracket → download. The session is released exactly
//! once: explicitly through [`Runner::close`], or when the runner is dropped.

use crate::{
  config::ConfigTree,
  device::Device,
  download::DownloadReport,
  error::{DeviceError, Error, Result},
  sequence::{BracketingJob, Pause, RunReport},
  variant::{self, CameraVariant},
};
use std::fmt;
use tracing::{info, warn};

/// Lifecycle of a [`Runner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
  /// No session yet
  Disconnected,
  /// Session open, camera not configured
  Connected,
  /// Camera classified and set up for manual focus
  Configured,
  /// A bracketing run was started
  Bracketing,
  /// Images were downloaded
  Downloading,
  /// Session released
  Closed,
}

impl fmt::Display for State {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Disconnected => "disconnected",
      Self::Connected => "connected",
      Self::Configured => "configured",
      Self::Bracketing => "bracketing",
      Self::Downloading => "downloading",
      Self::Closed => "closed",
    })
  }
}

/// Everything a complete bracketing session produced
#[derive(Debug)]
pub struct Summary {
  /// Detected camera family
  pub variant: CameraVariant,
  /// Outcome of the captures
  pub run: RunReport,
  /// Outcome of the downloads
  pub download: DownloadReport,
}

/// Owner of a camera session
pub struct Runner<D: Device> {
  device: Option<D>,
  state: State,
  variant: Option<CameraVariant>,
}

impl<D: Device> Runner<D> {
  /// Open a session with the device returned by `open`
  pub fn connect<F>(open: F) -> Result<Self>
  where
    F: FnOnce() -> std::result::Result<D, DeviceError>,
  {
    info!("Connecting to camera");
    let device = open().map_err(Error::Connection)?;

    Ok(Self { device: Some(device), state: State::Connected, variant: None })
  }

  /// Connect, configure, bracket and download, releasing the session on every path
  pub fn run<F, P>(open: F, job: &mut BracketingJob, pause: &mut P) -> Result<Summary>
  where
    F: FnOnce() -> std::result::Result<D, DeviceError>,
    P: Pause + ?Sized,
  {
    let mut runner = Self::connect(open)?;
    let result = runner.execute(job, pause);
    let closed = runner.close();

    match (result, closed) {
      (Ok(summary), Ok(())) => Ok(summary),
      (Ok(_), Err(err)) => Err(err),
      (Err(err), Ok(())) => Err(err),
      (Err(err), Err(close_err)) => {
        warn!("{close_err}");
        Err(err)
      }
    }
  }

  fn execute<P: Pause + ?Sized>(&mut self, job: &mut BracketingJob, pause: &mut P) -> Result<Summary> {
    let variant = self.configure()?;

    let run = match self.bracket(job, pause) {
      Ok(run) => run,
      Err(err) => {
        if !job.records().is_empty() {
          let paths: Vec<String> = job.records().iter().map(|record| record.path().to_string()).collect();
          warn!("Images left on the camera: {}", paths.join(", "));
        }
        return Err(err);
      }
    };

    let download = self.download(job)?;

    Ok(Summary { variant, run, download })
  }

  /// Current state
  pub fn state(&self) -> State {
    self.state
  }

  /// Variant detected by [`configure`](Self::configure)
  pub fn variant(&self) -> Option<CameraVariant> {
    self.variant
  }

  fn device(&self) -> Result<&D> {
    self.device.as_ref().ok_or(Error::SessionClosed)
  }

  fn expect_state(&self, operation: &'static str, allowed: &[State]) -> Result<()> {
    if allowed.contains(&self.state) {
      Ok(())
    } else {
      Err(Error::UnexpectedState { operation, state: self.state })
    }
  }

  /// Read a configuration snapshot from the camera
  pub fn read_config(&self) -> Result<ConfigTree> {
    self.device()?.read_config().map_err(Error::ConfigRead)
  }

  /// Classify the camera and switch it to manual focus
  pub fn configure(&mut self) -> Result<CameraVariant> {
    self.expect_state("configure the camera", &[State::Connected])?;

    let device = self.device()?;
    let model = device.model().map_err(Error::ConfigRead)?;
    let variant = variant::configure(device, &model)?;

    self.variant = Some(variant);
    self.state = State::Configured;
    Ok(variant)
  }

  /// Run the bracketing sequence of `job`
  pub fn bracket<P: Pause + ?Sized>(&mut self, job: &mut BracketingJob, pause: &mut P) -> Result<RunReport> {
    self.expect_state("start bracketing", &[State::Configured, State::Downloading])?;

    let variant = self.variant.ok_or(Error::UnexpectedState {
      operation: "start bracketing",
      state: self.state,
    })?;
    self.state = State::Bracketing;

    job.run(self.device()?, variant, pause)
  }

  /// Download the images captured by `job`
  pub fn download(&mut self, job: &mut BracketingJob) -> Result<DownloadReport> {
    self.expect_state("download images", &[State::Bracketing, State::Downloading])?;
    self.state = State::Downloading;

    Ok(job.download(self.device()?))
  }

  /// Release the session. Further calls do nothing.
  pub fn close(&mut self) -> Result<()> {
    self.state = State::Closed;

    match self.device.take() {
      Some(mut device) => {
        info!("Closing camera");
        device.close().map_err(Error::Close)
      }
      None => Ok(()),
    }
  }
}

impl<D: Device> Drop for Runner<D> {
  fn drop(&mut self) {
    if let Err(err) = self.close() {
      warn!("{err}");
    }
  }
}
