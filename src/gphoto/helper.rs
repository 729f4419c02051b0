use crate::error::{DeviceError, DeviceErrorKind};
use std::{ffi, os::raw::c_char};

pub(crate) fn chars_to_string(chars: *const c_char) -> String {
  if chars.is_null() {
    return String::new();
  }

  unsafe { String::from_utf8_lossy(ffi::CStr::from_ptr(chars).to_bytes()) }.into_owned()
}

pub(crate) fn char_slice_to_string(chars: &[c_char]) -> String {
  let bytes: Vec<u8> = chars.iter().take_while(|&&c| c != 0).map(|&c| c.to_ne_bytes()[0]).collect();
  String::from_utf8_lossy(&bytes).into_owned()
}

pub(crate) fn to_c_string(value: &str) -> Result<ffi::CString, DeviceError> {
  ffi::CString::new(value)
    .map_err(|_| DeviceError::new(DeviceErrorKind::BadParameters, format!("FFI: NulError in {value:?}")))
}
