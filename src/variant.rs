//! Camera variants
//!
//! Camera families expose their focus and storage controls under different
//! configuration paths. The attached camera is classified once, right after
//! connecting, and everything afterwards works with the resulting
//! [`CameraVariant`] instead of raw paths.

use crate::{
  config::ConfigTree,
  device::Device,
  error::{ConfigError, Error, Result},
};
use std::fmt;
use tracing::{debug, info, warn};

/// Node only DSLR-style bodies have: the manual/auto focus selector
const DSLR_FOCUS_SELECTOR: &str = "focusmode2";
/// Group holding focus mode and capture target on E-mount bodies
const CAPTURE_SETTINGS: &str = "capturesettings";
/// Model substring of Nikon's mirrorless line
const NIKON_MIRRORLESS_MARKER: &str = "Nikon Z";

/// Family of the attached camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CameraVariant {
  /// Mirror based body with a separate focus mode selector
  Dslr,
  /// Sony E-mount body
  SonyEMount,
  /// Nikon mirrorless body sharing the E-mount style capture settings
  NikonEMount,
}

/// How a variant addresses one of its configuration nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
  /// Fixed path below the root
  Path(&'static str),
  /// First node with this name, searched depth-first like `gp_widget_get_child_by_name`
  Name(&'static str),
}

impl NodeRef {
  /// Path of the referenced node in `config`
  pub fn resolve(self, config: &ConfigTree) -> std::result::Result<String, ConfigError> {
    match self {
      Self::Path(path) => config.get(path).map(|_| path.to_owned()),
      Self::Name(name) => config.find(name).ok_or_else(|| ConfigError::NotFound(name.to_owned())),
    }
  }
}

impl fmt::Display for NodeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Path(path) => f.write_str(path),
      Self::Name(name) => write!(f, "<{name}>"),
    }
  }
}

/// Nodes and values a variant needs to shoot with manual focus onto the card
struct Profile {
  /// Preview toggle that flips the mirror up, switched on best-effort
  viewfinder: Option<NodeRef>,
  /// Settings committed while configuring, in order
  settings: &'static [(NodeRef, &'static str)],
  /// Node that moves the focus motor by a number of steps
  focus_drive: NodeRef,
}

const DSLR: Profile = Profile {
  viewfinder: Some(NodeRef::Path("actions/viewfinder")),
  settings: &[
    (NodeRef::Path("capturesettings/liveviewaffocus"), "Single-servo AF"),
    (NodeRef::Path("settings/capturetarget"), "Memory card"),
  ],
  focus_drive: NodeRef::Path("actions/manualfocusdrive"),
};

const SONY_E_MOUNT: Profile = Profile {
  viewfinder: None,
  settings: &[
    (NodeRef::Path("capturesettings/focusmode"), "Manual"),
    (NodeRef::Path("capturesettings/capturetarget"), "card"),
  ],
  focus_drive: NodeRef::Path("actions/manualfocus"),
};

const NIKON_E_MOUNT: Profile = Profile {
  viewfinder: None,
  settings: &[
    (NodeRef::Path("capturesettings/focusmode"), "Manual"),
    (NodeRef::Path("capturesettings/capturetarget"), "card"),
    (NodeRef::Name("liveviewaffocus"), "Single-servo AF"),
    (NodeRef::Name("capturetarget"), "Memory card"),
  ],
  focus_drive: NodeRef::Name("manualfocusdrive"),
};

impl CameraVariant {
  fn profile(self) -> &'static Profile {
    match self {
      Self::Dslr => &DSLR,
      Self::SonyEMount => &SONY_E_MOUNT,
      Self::NikonEMount => &NIKON_E_MOUNT,
    }
  }

  /// Node driving the focus motor
  pub fn focus_drive(self) -> NodeRef {
    self.profile().focus_drive
  }
}

impl fmt::Display for CameraVariant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Dslr => "DSLR",
      Self::SonyEMount => "Sony E-mount",
      Self::NikonEMount => "Nikon E-mount",
    })
  }
}

/// Determine the camera family from its configuration tree and model name.
///
/// Returns `None` for cameras this crate does not know how to drive.
pub fn classify(config: &ConfigTree, model: &str) -> Option<CameraVariant> {
  if config.find(DSLR_FOCUS_SELECTOR).is_some() {
    return Some(CameraVariant::Dslr);
  }

  let has_capture_settings = config
    .find(CAPTURE_SETTINGS)
    .and_then(|path| config.get(&path).ok())
    .is_some_and(|node| node.is_group());

  if has_capture_settings {
    if model.contains(NIKON_MIRRORLESS_MARKER) {
      return Some(CameraVariant::NikonEMount);
    }
    return Some(CameraVariant::SonyEMount);
  }

  None
}

/// Classify the attached camera and prepare it for manual focus bracketing.
///
/// The camera is switched to manual focus and told to store images on the
/// memory card. Fails with [`Error::UnsupportedVariant`] before touching any
/// setting if the camera is not recognized.
pub fn configure<D: Device + ?Sized>(device: &D, model: &str) -> Result<CameraVariant> {
  info!("Configuring camera");
  let config = device.read_config().map_err(Error::ConfigRead)?;

  let variant =
    classify(&config, model).ok_or_else(|| Error::UnsupportedVariant { model: model.to_owned() })?;
  info!(%variant, model, "Detected camera variant");

  let profile = variant.profile();

  let mut config = match profile.viewfinder {
    Some(node) => {
      enable_viewfinder(device, config, node);
      device.read_config().map_err(Error::ConfigRead)?
    }
    None => config,
  };

  for (node, value) in profile.settings {
    let path = node.resolve(&config)?;
    debug!(%path, value, "Setting");
    config.set(&path, *value)?;
  }

  device.commit_config(&config).map_err(Error::ConfigWrite)?;
  Ok(variant)
}

/// Not every body has a viewfinder toggle, a refusal is only logged.
fn enable_viewfinder<D: Device + ?Sized>(device: &D, mut config: ConfigTree, node: NodeRef) {
  if let Err(err) = node.resolve(&config).and_then(|path| config.set(&path, true)) {
    warn!("Viewfinder not available: {err}");
    return;
  }

  if let Err(err) = device.commit_config(&config) {
    warn!("Camera refused to enable the viewfinder: {err}");
  }
}
