//! libgphoto2 context and log forwarding

use super::helper::chars_to_string;
use crate::error::{DeviceError, DeviceErrorKind};
use std::{
  os::raw::{c_char, c_void},
  ptr,
};

/// Context used for every call into libgphoto2.
///
/// Error and status messages reported through the context are forwarded to
/// `tracing` under the `gphoto2` target.
pub(crate) struct Context {
  pub(crate) inner: *mut libgphoto2_sys::GPContext,
}

impl Drop for Context {
  fn drop(&mut self) {
    unsafe { libgphoto2_sys::gp_context_unref(self.inner) }
  }
}

impl Context {
  pub(crate) fn new() -> Result<Self, DeviceError> {
    let context_ptr = unsafe { libgphoto2_sys::gp_context_new() };

    if context_ptr.is_null() {
      return Err(DeviceError::new(DeviceErrorKind::Other, "Could not allocate gphoto2 context"));
    }

    unsafe {
      libgphoto2_sys::gp_context_set_error_func(context_ptr, Some(error_func), ptr::null_mut());
      libgphoto2_sys::gp_context_set_status_func(context_ptr, Some(status_func), ptr::null_mut());
    }

    #[cfg(feature = "extended_logs")]
    hook_library_log();

    Ok(Self { inner: context_ptr })
  }
}

unsafe extern "C" fn error_func(
  _context: *mut libgphoto2_sys::GPContext,
  text: *const c_char,
  _data: *mut c_void,
) {
  tracing::error!(target: "gphoto2", "{}", chars_to_string(text));
}

unsafe extern "C" fn status_func(
  _context: *mut libgphoto2_sys::GPContext,
  text: *const c_char,
  _data: *mut c_void,
) {
  tracing::info!(target: "gphoto2", "{}", chars_to_string(text));
}

#[cfg(feature = "extended_logs")]
fn hook_library_log() {
  use libgphoto2_sys::GPLogLevel;
  use std::sync::Once;

  unsafe extern "C" fn log_func(
    level: GPLogLevel,
    domain: *const c_char,
    text: *const c_char,
    _data: *mut c_void,
  ) {
    let domain = chars_to_string(domain);
    let text = chars_to_string(text);

    match level {
      GPLogLevel::GP_LOG_ERROR => tracing::error!(target: "gphoto2", "{domain}: {text}"),
      GPLogLevel::GP_LOG_VERBOSE => tracing::debug!(target: "gphoto2", "{domain}: {text}"),
      GPLogLevel::GP_LOG_DEBUG | GPLogLevel::GP_LOG_DATA => {
        tracing::trace!(target: "gphoto2", "{domain}: {text}")
      }
    }
  }

  static HOOK: Once = Once::new();
  HOOK.call_once(|| unsafe {
    libgphoto2_sys::gp_log_add_func(GPLogLevel::GP_LOG_DEBUG, Some(log_func), ptr::null_mut());
  });
}
