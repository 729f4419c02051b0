//! Device control
//!
//! Everything the bracketing logic needs from a camera goes through [`Device`].
//! All calls are blocking and a device is never used from two places at once.

use crate::{config::ConfigTree, error::DeviceError};
use std::fmt;

/// Location of a file stored on the camera
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CameraFilePath {
  folder: String,
  name: String,
}

impl CameraFilePath {
  /// Creates a new path from a folder and a file name
  pub fn new(folder: impl Into<String>, name: impl Into<String>) -> Self {
    Self { folder: folder.into(), name: name.into() }
  }

  /// Get the name of the file's folder
  pub fn folder(&self) -> &str {
    &self.folder
  }

  /// Get the basename of the file (without the folder)
  pub fn name(&self) -> &str {
    &self.name
  }
}

impl fmt::Display for CameraFilePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.folder.trim_end_matches('/'), self.name)
  }
}

/// An open, exclusive session with a camera
pub trait Device {
  /// Read the full configuration snapshot
  fn read_config(&self) -> Result<ConfigTree, DeviceError>;

  /// Write every changed node of `config` back to the camera
  fn commit_config(&self, config: &ConfigTree) -> Result<(), DeviceError>;

  /// Trigger a capture, the image stays on the camera
  fn capture_image(&self) -> Result<CameraFilePath, DeviceError>;

  /// Download the contents of a file stored on the camera
  fn fetch_file(&self, path: &CameraFilePath) -> Result<Vec<u8>, DeviceError>;

  /// Human readable model name.
  ///
  /// Defaults to the `cameramodel` (or `model`) configuration entry.
  fn model(&self) -> Result<String, DeviceError> {
    Ok(self.read_config()?.camera_model().unwrap_or_default())
  }

  /// End the session. Called exactly once by the owner of the device.
  fn close(&mut self) -> Result<(), DeviceError>;
}
