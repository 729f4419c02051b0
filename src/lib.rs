#![doc = include_str!("../README.md")]
#![deny(unused_must_use)]
#![deny(missing_docs)] // Force documentation on all public API's
#![deny(clippy::as_conversions)]

pub mod config;
pub mod device;
pub mod download;
pub mod error;
pub mod focus;
#[cfg(feature = "gphoto2")]
pub mod gphoto;
pub mod runner;
pub mod sequence;
#[cfg(test)]
pub(crate) mod testing;
pub mod variant;

#[doc(inline)]
pub use crate::{
  config::ConfigTree,
  device::Device,
  error::{Error, Result},
  runner::Runner,
  sequence::{BracketingJob, BracketingParams},
  variant::CameraVariant,
};

/// Raw bindings to libgphoto2.
///
/// Use this at your own risk
#[cfg(feature = "gphoto2")]
pub use libgphoto2_sys;
