//! In-memory camera used by the unit tests

use crate::{
  config::{ConfigNode, ConfigTree, ConfigValue},
  device::{CameraFilePath, Device},
  error::{DeviceError, DeviceErrorKind},
  sequence::Pause,
};
use std::{
  cell::{Cell, RefCell},
  collections::{HashMap, HashSet, VecDeque},
  rc::Rc,
  time::Duration,
};

pub(crate) const FOLDER: &str = "/store_00010001/DCIM/100NIKON";

/// Something that happened to the mock camera, in order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
  ReadConfig,
  /// Successful commit with the changed paths and values
  Commit(Vec<(String, ConfigValue)>),
  Capture { ok: bool },
  Fetch(String),
  Pause(Duration),
  Close,
}

pub(crate) type EventLog = Rc<RefCell<Vec<Event>>>;

pub(crate) struct MockCamera {
  config: RefCell<ConfigTree>,
  captures: RefCell<VecDeque<bool>>,
  files: RefCell<HashMap<CameraFilePath, Vec<u8>>>,
  next_file: Cell<usize>,
  rejected: HashSet<String>,
  broken_files: HashSet<String>,
  fail_close: bool,
  events: EventLog,
}

impl MockCamera {
  pub(crate) fn new(config: ConfigTree) -> Self {
    Self {
      config: RefCell::new(config),
      captures: RefCell::new(VecDeque::new()),
      files: RefCell::new(HashMap::new()),
      next_file: Cell::new(1),
      rejected: HashSet::new(),
      broken_files: HashSet::new(),
      fail_close: false,
      events: EventLog::default(),
    }
  }

  /// Outcome of each upcoming capture, captures beyond the script succeed
  pub(crate) fn with_captures(self, outcomes: impl IntoIterator<Item = bool>) -> Self {
    self.captures.borrow_mut().extend(outcomes);
    self
  }

  /// Commits touching `path` are refused
  pub(crate) fn rejecting(mut self, path: &str) -> Self {
    self.rejected.insert(path.to_owned());
    self
  }

  /// Fetching the file called `name` fails
  pub(crate) fn with_broken_file(mut self, name: &str) -> Self {
    self.broken_files.insert(name.to_owned());
    self
  }

  pub(crate) fn failing_close(mut self) -> Self {
    self.fail_close = true;
    self
  }

  pub(crate) fn event_log(&self) -> EventLog {
    self.events.clone()
  }

  pub(crate) fn events(&self) -> Vec<Event> {
    self.events.borrow().clone()
  }

  pub(crate) fn config(&self) -> ConfigTree {
    self.config.borrow().clone()
  }

  pub(crate) fn commits(&self) -> usize {
    self.events().iter().filter(|event| matches!(event, Event::Commit(_))).count()
  }

  pub(crate) fn captures_attempted(&self) -> usize {
    self.events().iter().filter(|event| matches!(event, Event::Capture { .. })).count()
  }

  fn push(&self, event: Event) {
    self.events.borrow_mut().push(event);
  }

  fn validate(&self, path: &str, node: &ConfigNode) -> Result<(), DeviceError> {
    if self.rejected.contains(path) {
      return Err(DeviceError::new(DeviceErrorKind::NotSupported, format!("{path} not supported")));
    }
    if node.is_readonly() {
      return Err(DeviceError::new(DeviceErrorKind::BadParameters, format!("{path} is read only")));
    }
    match node.value() {
      ConfigValue::Choice { current, choices } if !choices.contains(current) => {
        Err(DeviceError::new(DeviceErrorKind::BadParameters, format!("{current:?} is not a choice of {path}")))
      }
      ConfigValue::Range { value, min, max, .. } if value < min || value > max => {
        Err(DeviceError::new(DeviceErrorKind::BadParameters, format!("{value} is out of range for {path}")))
      }
      _ => Ok(()),
    }
  }
}

impl Device for MockCamera {
  fn read_config(&self) -> Result<ConfigTree, DeviceError> {
    self.push(Event::ReadConfig);
    Ok(self.config())
  }

  fn commit_config(&self, config: &ConfigTree) -> Result<(), DeviceError> {
    let changes = config.changes();
    for (path, node) in &changes {
      self.validate(path, node)?;
    }

    let mut stored = self.config.borrow_mut();
    let mut committed = Vec::new();
    for (path, node) in changes {
      stored.replace_value(&path, node.value().clone());
      committed.push((path, node.value().clone()));
    }
    drop(stored);

    self.push(Event::Commit(committed));
    Ok(())
  }

  fn capture_image(&self) -> Result<CameraFilePath, DeviceError> {
    let ok = self.captures.borrow_mut().pop_front().unwrap_or(true);
    self.push(Event::Capture { ok });

    if !ok {
      return Err(DeviceError::new(DeviceErrorKind::CameraBusy, "Camera busy"));
    }

    let number = self.next_file.get();
    self.next_file.set(number + 1);

    let path = CameraFilePath::new(FOLDER, format!("DSC_{number:04}.JPG"));
    self.files.borrow_mut().insert(path.clone(), format!("image {number}").into_bytes());
    Ok(path)
  }

  fn fetch_file(&self, path: &CameraFilePath) -> Result<Vec<u8>, DeviceError> {
    self.push(Event::Fetch(path.name().to_owned()));

    if self.broken_files.contains(path.name()) {
      return Err(DeviceError::new(DeviceErrorKind::Io, "I/O problem"));
    }

    self
      .files
      .borrow()
      .get(path)
      .cloned()
      .ok_or_else(|| DeviceError::new(DeviceErrorKind::FileNotFound, "File not found"))
  }

  fn close(&mut self) -> Result<(), DeviceError> {
    self.push(Event::Close);
    if self.fail_close {
      Err(DeviceError::new(DeviceErrorKind::Io, "I/O problem"))
    } else {
      Ok(())
    }
  }
}

/// Records stabilization waits into a camera's event log
pub(crate) struct RecordingPause(pub(crate) EventLog);

impl Pause for RecordingPause {
  fn pause(&mut self, duration: Duration) {
    self.0.borrow_mut().push(Event::Pause(duration));
  }
}

pub(crate) fn choice(current: &str, choices: &[&str]) -> ConfigValue {
  ConfigValue::Choice {
    current: current.to_owned(),
    choices: choices.iter().map(|choice| (*choice).to_owned()).collect(),
  }
}

fn focus_range(name: &str, limit: f32) -> ConfigNode {
  ConfigNode::new(name, ConfigValue::Range { value: 0.0, min: -limit, max: limit, step: 1.0 })
}

fn status(model: &str) -> ConfigNode {
  ConfigNode::group(
    "status",
    vec![
      ConfigNode::new("cameramodel", ConfigValue::Text(model.to_owned())).readonly(true),
      ConfigNode::new("batterylevel", ConfigValue::Text("100%".into())).readonly(true),
    ],
  )
}

fn live_view_af() -> ConfigNode {
  ConfigNode::new("liveviewaffocus", choice("Full-time-servo AF", &["Single-servo AF", "Full-time-servo AF"]))
}

fn capture_target() -> ConfigNode {
  ConfigNode::new("capturetarget", choice("Internal RAM", &["Internal RAM", "Memory card"]))
}

fn e_mount_capture_settings() -> ConfigNode {
  ConfigNode::group(
    "capturesettings",
    vec![
      ConfigNode::new("focusmode", choice("Automatic", &["Automatic", "Manual"])),
      ConfigNode::new("capturetarget", choice("sdram", &["sdram", "card"])),
    ],
  )
}

pub(crate) fn dslr_tree() -> ConfigTree {
  ConfigTree::new(ConfigNode::group(
    "main",
    vec![
      ConfigNode::group(
        "actions",
        vec![
          ConfigNode::new("viewfinder", ConfigValue::Toggle(Some(false))),
          focus_range("manualfocusdrive", 32767.0),
        ],
      ),
      ConfigNode::group("settings", vec![capture_target()]),
      status("D750"),
      ConfigNode::group(
        "capturesettings",
        vec![ConfigNode::new("focusmode2", choice("AF-S", &["AF-S", "AF-C", "MF"])), live_view_af()],
      ),
    ],
  ))
}

pub(crate) fn sony_tree() -> ConfigTree {
  ConfigTree::new(ConfigNode::group(
    "main",
    vec![
      ConfigNode::group("actions", vec![focus_range("manualfocus", 7.0)]),
      status("ILCE-7M3"),
      e_mount_capture_settings(),
    ],
  ))
}

/// Laid out the way libgphoto2 reports a Nikon Z body: the capture target
/// exists both under `settings` and `capturesettings`
pub(crate) fn nikon_z_tree() -> ConfigTree {
  ConfigTree::new(ConfigNode::group(
    "main",
    vec![
      ConfigNode::group("actions", vec![focus_range("manualfocusdrive", 32767.0)]),
      ConfigNode::group("settings", vec![capture_target()]),
      status("Nikon Z 6"),
      ConfigNode::group(
        "capturesettings",
        vec![
          ConfigNode::new("focusmode", choice("Automatic", &["Automatic", "Manual"])),
          ConfigNode::new("capturetarget", choice("sdram", &["sdram", "card"])),
          live_view_af(),
        ],
      ),
    ],
  ))
}

pub(crate) fn unsupported_tree() -> ConfigTree {
  ConfigTree::new(ConfigNode::group(
    "main",
    vec![
      ConfigNode::group("settings", vec![ConfigNode::new("datetime", ConfigValue::Date(0))]),
      status("Canon PowerShot G7 X"),
    ],
  ))
}
