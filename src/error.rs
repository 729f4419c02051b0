//! Error handling
//!
//! Fatal failures are reported through [`Error`]. Failures a bracketing run
//! survives (a single capture or a single download) never show up here, they
//! are collected in [`RunReport`](crate::sequence::RunReport) and
//! [`DownloadReport`](crate::download::DownloadReport) instead.

use crate::runner::State;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used in this library
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure reported by a [`Device`](crate::device::Device)
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum DeviceErrorKind {
  /// Anything not covered by the other kinds
  Other,
  /// Bad parameters were used
  BadParameters,
  /// The camera is busy
  CameraBusy,
  /// The camera returned an error
  CameraError,
  /// Corrupted data
  CorruptedData,
  /// The file already exists
  FileExists,
  /// The file was not found
  FileNotFound,
  /// No camera matching the request was found
  ModelNotFound,
  /// Action not supported
  NotSupported,
  /// Not enough space
  NoSpace,
  /// Io error
  Io,
  /// Timeout
  Timeout,
  /// Port is not known
  UnknownPort,
}

/// Failure reported by the device control layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeviceError {
  kind: DeviceErrorKind,
  message: String,
}

impl DeviceError {
  /// Creates a new device error
  pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into() }
  }

  /// Kind of the failure
  pub fn kind(&self) -> DeviceErrorKind {
    self.kind
  }

  /// Human readable description
  pub fn message(&self) -> &str {
    &self.message
  }
}

impl From<&str> for DeviceError {
  fn from(message: &str) -> Self {
    Self::new(DeviceErrorKind::Other, message)
  }
}

/// Errors raised while reading or editing a [`ConfigTree`](crate::config::ConfigTree)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// No node exists at the given path
  #[error("configuration node `{0}` not found")]
  NotFound(String),
  /// The node exists but cannot hold the given value
  #[error("configuration node `{path}` is a {node} node and cannot take {value}")]
  TypeMismatch {
    /// Path of the node
    path: String,
    /// Kind of the node
    node: &'static str,
    /// Kind of the rejected value
    value: &'static str,
  },
}

/// Fatal errors of a bracketing session
#[derive(Debug, Error)]
pub enum Error {
  /// Opening the device session failed
  #[error("could not connect to camera: {0}")]
  Connection(#[source] DeviceError),
  /// The device session was already released
  #[error("camera session is not open")]
  SessionClosed,
  /// Releasing the device session failed
  #[error("could not release camera: {0}")]
  Close(#[source] DeviceError),
  /// Reading the configuration snapshot failed
  #[error("could not read camera configuration: {0}")]
  ConfigRead(#[source] DeviceError),
  /// The device rejected a configuration commit
  #[error("camera rejected configuration: {0}")]
  ConfigWrite(#[source] DeviceError),
  /// The in-memory snapshot could not be edited
  #[error(transparent)]
  Config(#[from] ConfigError),
  /// The attached camera matches no known variant
  #[error("unsupported camera {model:?}: no known focus configuration")]
  UnsupportedVariant {
    /// Model string reported by the camera
    model: String,
  },
  /// The output directory is missing or not writable
  #[error("invalid output directory {}: {reason}", .path.display())]
  OutputDirectory {
    /// Offending path
    path: PathBuf,
    /// Why it was rejected
    reason: String,
  },
  /// An operation was requested in the wrong session state
  #[error("cannot {operation} while {state}")]
  UnexpectedState {
    /// The requested operation
    operation: &'static str,
    /// State the runner was in
    state: State,
  },
}
