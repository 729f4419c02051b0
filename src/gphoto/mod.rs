//! libgphoto2 backend
//!
//! ## Listing the configuration of the attached camera
//! ```no_run
//! use focus_bracket::{device::Device, gphoto::GPhotoCamera};
//!
//! # fn main() -> Result<(), focus_bracket::error::DeviceError> {
//! let camera = GPhotoCamera::autodetect()?;
//! println!("{}", camera.read_config()?);
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod helper;
mod widget;

use self::{
  context::Context,
  error::try_gp_internal,
  helper::{char_slice_to_string, to_c_string},
  widget::Widget,
};
use crate::{
  config::ConfigTree,
  device::{CameraFilePath, Device},
  error::{DeviceError, DeviceErrorKind},
};
use std::{ffi::CStr, mem::MaybeUninit, os::raw::c_ulong, ptr, slice};
use tracing::debug;

/// Get the short version of the libgphoto2 library used
pub fn library_version() -> Option<&'static str> {
  unsafe {
    CStr::from_ptr(*libgphoto2_sys::gp_library_version(
      libgphoto2_sys::GPVersionVerbosity::GP_VERSION_SHORT,
    ))
    .to_str()
    .ok()
  }
}

/// Camera attached through libgphoto2
pub struct GPhotoCamera {
  camera: *mut libgphoto2_sys::Camera,
  context: Context,
}

impl Drop for GPhotoCamera {
  fn drop(&mut self) {
    unsafe {
      libgphoto2_sys::gp_camera_unref(self.camera);
    }
  }
}

impl GPhotoCamera {
  /// Connect to the first camera libgphoto2 detects
  pub fn autodetect() -> Result<Self, DeviceError> {
    let context = Context::new()?;
    let mut camera_ptr = ptr::null_mut();

    try_gp_internal!(libgphoto2_sys::gp_camera_new(&mut camera_ptr))?;
    let camera = Self { camera: camera_ptr, context };

    try_gp_internal!(libgphoto2_sys::gp_camera_init(camera.camera, camera.context.inner))?;
    debug!("Camera initialized");

    Ok(camera)
  }

  fn root_widget(&self) -> Result<Widget, DeviceError> {
    let mut root = ptr::null_mut();

    try_gp_internal!(libgphoto2_sys::gp_camera_get_config(
      self.camera,
      &mut root,
      self.context.inner
    ))?;

    Ok(Widget::new_owned(root))
  }
}

impl Device for GPhotoCamera {
  fn read_config(&self) -> Result<ConfigTree, DeviceError> {
    Ok(ConfigTree::new(self.root_widget()?.to_node()?))
  }

  fn commit_config(&self, config: &ConfigTree) -> Result<(), DeviceError> {
    let changes = config.changes();
    if changes.is_empty() {
      return Ok(());
    }

    let root = self.root_widget()?;
    for (path, node) in changes {
      debug!(%path, value = %node.value(), "Applying");
      root.descendant(&path)?.apply(node.value())?;
    }

    try_gp_internal!(libgphoto2_sys::gp_camera_set_config(
      self.camera,
      root.as_ptr(),
      self.context.inner
    ))?;

    Ok(())
  }

  fn capture_image(&self) -> Result<CameraFilePath, DeviceError> {
    let mut file_path = MaybeUninit::<libgphoto2_sys::CameraFilePath>::zeroed();

    try_gp_internal!(libgphoto2_sys::gp_camera_capture(
      self.camera,
      libgphoto2_sys::CameraCaptureType::GP_CAPTURE_IMAGE,
      file_path.as_mut_ptr(),
      self.context.inner
    ))?;

    let file_path = unsafe { file_path.assume_init() };
    Ok(CameraFilePath::new(char_slice_to_string(&file_path.folder), char_slice_to_string(&file_path.name)))
  }

  fn fetch_file(&self, path: &CameraFilePath) -> Result<Vec<u8>, DeviceError> {
    let folder = to_c_string(path.folder())?;
    let name = to_c_string(path.name())?;
    let file = CameraFile::new()?;

    try_gp_internal!(libgphoto2_sys::gp_camera_file_get(
      self.camera,
      folder.as_ptr(),
      name.as_ptr(),
      libgphoto2_sys::CameraFileType::GP_FILE_TYPE_NORMAL,
      file.inner,
      self.context.inner
    ))?;

    file.data()
  }

  fn close(&mut self) -> Result<(), DeviceError> {
    try_gp_internal!(libgphoto2_sys::gp_camera_exit(self.camera, self.context.inner))?;
    Ok(())
  }
}

/// In-memory file downloaded from the camera
struct CameraFile {
  inner: *mut libgphoto2_sys::CameraFile,
}

impl Drop for CameraFile {
  fn drop(&mut self) {
    unsafe {
      libgphoto2_sys::gp_file_unref(self.inner);
    }
  }
}

impl CameraFile {
  fn new() -> Result<Self, DeviceError> {
    let mut camera_file_ptr = ptr::null_mut();

    try_gp_internal!(libgphoto2_sys::gp_file_new(&mut camera_file_ptr))?;

    Ok(Self { inner: camera_file_ptr })
  }

  fn data(&self) -> Result<Vec<u8>, DeviceError> {
    let mut data = ptr::null();
    let mut size: c_ulong = 0;

    try_gp_internal!(libgphoto2_sys::gp_file_get_data_and_size(self.inner, &mut data, &mut size))?;

    if data.is_null() {
      return Ok(Vec::new());
    }

    let len = usize::try_from(size).map_err(|_| {
      DeviceError::new(DeviceErrorKind::Other, format!("File of {size} bytes does not fit into memory"))
    })?;

    Ok(unsafe { slice::from_raw_parts(data.cast::<u8>(), len) }.to_vec())
  }
}
