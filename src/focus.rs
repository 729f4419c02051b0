//! Manual focus drive

use crate::{
  device::Device,
  error::{Error, Result},
  variant::CameraVariant,
};
use tracing::debug;

/// Move the focus motor by `step` units, the sign selects the direction.
///
/// Commits exactly once and never retries, a rejected step is returned as
/// [`Error::ConfigWrite`].
pub fn step_focus<D: Device + ?Sized>(device: &D, variant: CameraVariant, step: i32) -> Result<()> {
  let mut config = device.read_config().map_err(Error::ConfigRead)?;
  let path = variant.focus_drive().resolve(&config)?;
  debug!(%path, step, "Driving focus");

  config.set(&path, step)?;
  device.commit_config(&config).map_err(Error::ConfigWrite)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::ConfigValue,
    testing::{self, Event, MockCamera},
  };

  #[test]
  fn test_step_dslr() {
    let camera = MockCamera::new(testing::dslr_tree());

    step_focus(&camera, CameraVariant::Dslr, -40).unwrap();

    assert_eq!(
      camera.events(),
      vec![
        Event::ReadConfig,
        Event::Commit(vec![(
          "actions/manualfocusdrive".into(),
          ConfigValue::Range { value: -40.0, min: -32767.0, max: 32767.0, step: 1.0 }
        )]),
      ]
    );
  }

  #[test]
  fn test_step_nikon_z() {
    let camera = MockCamera::new(testing::nikon_z_tree());

    step_focus(&camera, CameraVariant::NikonEMount, 5).unwrap();

    assert_eq!(
      camera.config().get("actions/manualfocusdrive").unwrap().value(),
      &ConfigValue::Range { value: 5.0, min: -32767.0, max: 32767.0, step: 1.0 }
    );
    assert_eq!(camera.commits(), 1);
  }

  #[test]
  fn test_rejected_step() {
    let camera = MockCamera::new(testing::sony_tree());

    let err = step_focus(&camera, CameraVariant::SonyEMount, 10).unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"camera rejected configuration: 10 is out of range for actions/manualfocus");
    assert_eq!(camera.commits(), 0);
  }

  #[test]
  fn test_wrong_variant() {
    let camera = MockCamera::new(testing::sony_tree());

    let err = step_focus(&camera, CameraVariant::Dslr, 1).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err:?}");
  }
}
