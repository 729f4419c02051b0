//! libgphoto2 result codes

use super::helper::chars_to_string;
use crate::error::{DeviceError, DeviceErrorKind};
use std::os::raw::c_int;

/// Map a libgphoto2 result code to a [`DeviceErrorKind`]
pub(crate) fn error_kind(code: c_int) -> DeviceErrorKind {
  match code {
    libgphoto2_sys::GP_ERROR_BAD_PARAMETERS => DeviceErrorKind::BadParameters,
    libgphoto2_sys::GP_ERROR_CAMERA_BUSY => DeviceErrorKind::CameraBusy,
    libgphoto2_sys::GP_ERROR_CAMERA_ERROR => DeviceErrorKind::CameraError,
    libgphoto2_sys::GP_ERROR_CORRUPTED_DATA => DeviceErrorKind::CorruptedData,
    libgphoto2_sys::GP_ERROR_FILE_EXISTS => DeviceErrorKind::FileExists,
    libgphoto2_sys::GP_ERROR_FILE_NOT_FOUND => DeviceErrorKind::FileNotFound,
    libgphoto2_sys::GP_ERROR_MODEL_NOT_FOUND => DeviceErrorKind::ModelNotFound,
    libgphoto2_sys::GP_ERROR_NOT_SUPPORTED => DeviceErrorKind::NotSupported,
    libgphoto2_sys::GP_ERROR_NO_SPACE => DeviceErrorKind::NoSpace,
    libgphoto2_sys::GP_ERROR_IO => DeviceErrorKind::Io,
    libgphoto2_sys::GP_ERROR_TIMEOUT => DeviceErrorKind::Timeout,
    libgphoto2_sys::GP_ERROR_UNKNOWN_PORT => DeviceErrorKind::UnknownPort,

    _ => DeviceErrorKind::Other,
  }
}

/// Creates a [`DeviceError`] from a libgphoto2 result code
pub(crate) fn device_error(code: c_int) -> DeviceError {
  let message = chars_to_string(unsafe { libgphoto2_sys::gp_result_as_string(code) });
  DeviceError::new(error_kind(code), message)
}

/// Check the result of an internal libgphoto2 function.
///
/// If the return type is less than 0, an error is returned,
/// otherwise the result of the function
macro_rules! try_gp_internal {
  ($x:expr) => {{
    let v = unsafe { $x };

    if v >= 0 {
      Ok(v)
    } else {
      Err($crate::gphoto::error::device_error(v))
    }
  }};
}

pub(crate) use try_gp_internal;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_kind() {
    assert_eq!(error_kind(libgphoto2_sys::GP_ERROR_CAMERA_BUSY), DeviceErrorKind::CameraBusy);
    assert_eq!(error_kind(libgphoto2_sys::GP_ERROR_BAD_PARAMETERS), DeviceErrorKind::BadParameters);
    assert_eq!(error_kind(libgphoto2_sys::GP_ERROR), DeviceErrorKind::Other);
  }

  #[test]
  fn test_device_error_message() {
    let err = device_error(libgphoto2_sys::GP_ERROR_NOT_SUPPORTED);
    assert_eq!(err.kind(), DeviceErrorKind::NotSupported);
    insta::assert_snapshot!(err.message(), @"Unsupported operation");
  }
}
