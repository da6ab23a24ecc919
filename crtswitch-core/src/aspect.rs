//! Aspect ratio publishing to the video driver.

use crate::modes::Geometry;
use log::{debug, trace};

/// The parts of the video driver the switcher talks to.
pub trait VideoDriver {
    /// Inform the video subsystem of the target refresh rate.
    fn set_monitor_refresh_rate(&mut self, hz: f32);

    /// Set the aspect ratio used for the viewport.
    fn set_aspect_ratio_value(&mut self, aspect: f32);

    /// The aspect ratio currently in effect.
    fn aspect_ratio(&self) -> f32;

    /// Commit queued driver-level state changes (viewport, aspect).
    fn apply_pending_state_changes(&mut self);
}

/// Pushes aspect ratios to a [`VideoDriver`] while a mode is being set up.
///
/// Every [`notify`](Self::notify) is forwarded, even when the value repeats.
pub struct AspectPublisher<'a, D: VideoDriver + ?Sized> {
    driver: &'a mut D,
    last: Option<f32>,
}

impl<'a, D: VideoDriver + ?Sized> AspectPublisher<'a, D> {
    /// Create a publisher writing to the given driver.
    pub fn new(driver: &'a mut D) -> Self {
        Self { driver, last: None }
    }

    /// Compute the aspect of `geometry` and push it to the driver.
    pub fn notify(&mut self, geometry: Geometry) -> f32 {
        let aspect = geometry.aspect();
        trace!(
            "aspect {}x{} -> {aspect}",
            geometry.width, geometry.height
        );
        self.driver.set_aspect_ratio_value(aspect);
        self.last = Some(aspect);
        aspect
    }

    /// The most recently published aspect, if any.
    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

/// Re-push `aspect` if the driver drifted from it.
///
/// Returns whether the driver was updated.
pub fn sync_aspect<D: VideoDriver + ?Sized>(driver: &mut D, aspect: f32) -> bool {
    let current = driver.aspect_ratio();
    if current == aspect {
        return false;
    }

    debug!("aspect out of sync: driver={current}, computed={aspect}");
    driver.set_aspect_ratio_value(aspect);
    driver.apply_pending_state_changes();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockVideoDriver;

    #[test]
    fn test_notify_forwards_every_call() {
        let mut driver = MockVideoDriver::new();
        let mut publisher = AspectPublisher::new(&mut driver);
        assert_eq!(publisher.last(), None);

        publisher.notify(Geometry::new(320, 240));
        publisher.notify(Geometry::new(320, 240));
        assert_eq!(publisher.last(), Some(320.0 / 240.0));

        assert_eq!(driver.aspect_updates(), &[320.0 / 240.0, 320.0 / 240.0]);
        assert_eq!(driver.applied(), 0);
    }

    #[test]
    fn test_sync_skips_matching_aspect() {
        let mut driver = MockVideoDriver::with_aspect(4.0 / 3.0);
        assert!(!sync_aspect(&mut driver, 4.0 / 3.0));
        assert_eq!(driver.applied(), 0);
        assert!(driver.aspect_updates().is_empty());
    }

    #[test]
    fn test_sync_pushes_changed_aspect() {
        let mut driver = MockVideoDriver::with_aspect(4.0 / 3.0);
        assert!(sync_aspect(&mut driver, 256.0 / 224.0));
        assert_eq!(driver.aspect_ratio(), 256.0 / 224.0);
        assert_eq!(driver.applied(), 1);
    }
}
