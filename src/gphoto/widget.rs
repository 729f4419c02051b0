//! Conversion between libgphoto2 widgets and [`ConfigTree`](crate::config::ConfigTree) nodes

use super::{
  error::try_gp_internal,
  helper::{chars_to_string, to_c_string},
};
use crate::{
  config::{ConfigNode, ConfigValue},
  error::{DeviceError, DeviceErrorKind},
};
use libgphoto2_sys::CameraWidgetType;
use std::{
  mem::MaybeUninit,
  os::raw::{c_char, c_int, c_void},
  ptr,
};

/// Reference counted handle to a libgphoto2 widget
pub(crate) struct Widget {
  inner: *mut libgphoto2_sys::CameraWidget,
}

impl Drop for Widget {
  fn drop(&mut self) {
    unsafe {
      libgphoto2_sys::gp_widget_unref(self.inner);
    }
  }
}

impl Widget {
  /// Takes over a widget the caller already holds a reference to
  pub(crate) fn new_owned(widget: *mut libgphoto2_sys::CameraWidget) -> Self {
    Self { inner: widget }
  }

  /// Wraps a widget borrowed from its parent
  fn new_shared(widget: *mut libgphoto2_sys::CameraWidget) -> Self {
    unsafe {
      libgphoto2_sys::gp_widget_ref(widget);
    }

    Self { inner: widget }
  }

  pub(crate) fn as_ptr(&self) -> *mut libgphoto2_sys::CameraWidget {
    self.inner
  }

  fn ty(&self) -> Result<CameraWidgetType, DeviceError> {
    let mut widget_type = MaybeUninit::uninit();
    try_gp_internal!(libgphoto2_sys::gp_widget_get_type(self.inner, widget_type.as_mut_ptr()))?;
    Ok(unsafe { widget_type.assume_init() })
  }

  fn name(&self) -> Result<String, DeviceError> {
    let mut name = ptr::null();
    try_gp_internal!(libgphoto2_sys::gp_widget_get_name(self.inner, &mut name))?;
    Ok(chars_to_string(name))
  }

  fn label(&self) -> Result<String, DeviceError> {
    let mut label = ptr::null();
    try_gp_internal!(libgphoto2_sys::gp_widget_get_label(self.inner, &mut label))?;
    Ok(chars_to_string(label))
  }

  fn readonly(&self) -> Result<bool, DeviceError> {
    let mut readonly: c_int = 0;
    try_gp_internal!(libgphoto2_sys::gp_widget_get_readonly(self.inner, &mut readonly))?;
    Ok(readonly == 1)
  }

  fn children(&self) -> Result<Vec<Widget>, DeviceError> {
    let count = try_gp_internal!(libgphoto2_sys::gp_widget_count_children(self.inner))?;

    (0..count)
      .map(|i| {
        let mut child = ptr::null_mut();
        try_gp_internal!(libgphoto2_sys::gp_widget_get_child(self.inner, i, &mut child))?;
        Ok(Widget::new_shared(child))
      })
      .collect()
  }

  /// Direct child called `name`, unlike `gp_widget_get_child_by_name` this never descends further
  fn child(&self, name: &str) -> Result<Widget, DeviceError> {
    for child in self.children()? {
      if child.name()? == name {
        return Ok(child);
      }
    }

    Err(DeviceError::new(DeviceErrorKind::BadParameters, format!("No widget named {name:?}")))
  }

  /// Walk down `path` (as produced by [`ConfigTree::changes`](crate::config::ConfigTree::changes))
  /// one direct child per segment, the same way [`ConfigTree::get`](crate::config::ConfigTree::get) does
  pub(crate) fn descendant(&self, path: &str) -> Result<Widget, DeviceError> {
    path.split('/').try_fold(self.new_ref(), |widget, segment| widget.child(segment))
  }

  fn new_ref(&self) -> Widget {
    Widget::new_shared(self.inner)
  }

  unsafe fn raw_value<T>(&self) -> Result<T, DeviceError> {
    let mut value = MaybeUninit::<T>::uninit();
    try_gp_internal!(libgphoto2_sys::gp_widget_get_value(self.inner, value.as_mut_ptr().cast::<c_void>()))?;
    Ok(value.assume_init())
  }

  unsafe fn set_raw_value<T>(&self, value: *const T) -> Result<(), DeviceError> {
    try_gp_internal!(libgphoto2_sys::gp_widget_set_value(self.inner, value.cast::<c_void>()))?;
    Ok(())
  }

  fn text_value(&self) -> Result<String, DeviceError> {
    Ok(chars_to_string(unsafe { self.raw_value::<*const c_char>()? }))
  }

  fn set_text_value(&self, value: &str) -> Result<(), DeviceError> {
    let value = to_c_string(value)?;
    unsafe { self.set_raw_value::<c_char>(value.as_ptr()) }
  }

  fn choices(&self) -> Result<Vec<String>, DeviceError> {
    let count = try_gp_internal!(libgphoto2_sys::gp_widget_count_choices(self.inner))?;

    (0..count)
      .map(|i| {
        let mut choice = ptr::null();
        try_gp_internal!(libgphoto2_sys::gp_widget_get_choice(self.inner, i, &mut choice))?;
        Ok(chars_to_string(choice))
      })
      .collect()
  }

  fn range(&self) -> Result<(f32, f32, f32), DeviceError> {
    let (mut min, mut max, mut step) = (0.0, 0.0, 0.0);
    try_gp_internal!(libgphoto2_sys::gp_widget_get_range(self.inner, &mut min, &mut max, &mut step))?;
    Ok((min, max, step))
  }

  /// Snapshot of this widget and everything below it
  pub(crate) fn to_node(&self) -> Result<ConfigNode, DeviceError> {
    let name = self.name()?;

    let node = match self.ty()? {
      CameraWidgetType::GP_WIDGET_WINDOW | CameraWidgetType::GP_WIDGET_SECTION => {
        let children =
          self.children()?.iter().map(Widget::to_node).collect::<Result<Vec<_>, _>>()?;
        ConfigNode::group(name, children)
      }
      CameraWidgetType::GP_WIDGET_TEXT => ConfigNode::new(name, ConfigValue::Text(self.text_value()?)),
      CameraWidgetType::GP_WIDGET_RANGE => {
        let (min, max, step) = self.range()?;
        let value = unsafe { self.raw_value::<f32>()? };
        ConfigNode::new(name, ConfigValue::Range { value, min, max, step })
      }
      CameraWidgetType::GP_WIDGET_TOGGLE => {
        let toggled = match unsafe { self.raw_value::<c_int>()? } {
          0 => Some(false),
          1 => Some(true),
          _ => None,
        };
        ConfigNode::new(name, ConfigValue::Toggle(toggled))
      }
      CameraWidgetType::GP_WIDGET_RADIO | CameraWidgetType::GP_WIDGET_MENU => {
        let value = ConfigValue::Choice { current: self.text_value()?, choices: self.choices()? };
        ConfigNode::new(name, value)
      }
      CameraWidgetType::GP_WIDGET_BUTTON => ConfigNode::new(name, ConfigValue::Button),
      CameraWidgetType::GP_WIDGET_DATE => {
        ConfigNode::new(name, ConfigValue::Date(unsafe { self.raw_value::<c_int>()? }))
      }
    };

    Ok(node.with_label(self.label()?).readonly(self.readonly()?))
  }

  /// Store `value` in the widget, the camera only sees it once the tree is set
  pub(crate) fn apply(&self, value: &ConfigValue) -> Result<(), DeviceError> {
    match value {
      ConfigValue::Text(text) => self.set_text_value(text),
      ConfigValue::Choice { current, .. } => self.set_text_value(current),
      ConfigValue::Range { value, .. } => unsafe { self.set_raw_value::<f32>(value) },
      ConfigValue::Toggle(Some(toggled)) => {
        let toggled = c_int::from(*toggled);
        unsafe { self.set_raw_value::<c_int>(&toggled) }
      }
      ConfigValue::Date(timestamp) => unsafe { self.set_raw_value::<c_int>(timestamp) },
      ConfigValue::Toggle(None) | ConfigValue::Group | ConfigValue::Button => {
        Err(DeviceError::new(DeviceErrorKind::BadParameters, "Widget has no value to set"))
      }
    }
  }
}
