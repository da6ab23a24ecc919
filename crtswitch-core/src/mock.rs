//! Mock backend and video driver for testing.

use crate::aspect::VideoDriver;
use crate::backend::DisplayBackend;
use crate::error::SwitchError;
use crate::modes::ModeSetting;
use std::sync::Mutex;

/// A mock display backend for testing.
///
/// This records every mode it is asked to set, so code that depends on
/// [`DisplayBackend`] can be tested without display hardware.
///
/// # Example
///
/// ```
/// use crtswitch_core::{CrtSwitcher, MockBackend, MockVideoDriver, ModeRequest};
///
/// let mut switcher = CrtSwitcher::new(MockBackend::new(), MockVideoDriver::new());
/// switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));
/// switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));
/// assert_eq!(switcher.backend().dispatched().len(), 1);
/// ```
pub struct MockBackend {
    dispatched: Mutex<Vec<ModeSetting>>,
    timing_control: bool,
    fail: bool,
}

impl MockBackend {
    /// Create a new mock backend without timing control.
    pub fn new() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
            timing_control: false,
            fail: false,
        }
    }

    /// Create a mock backend that claims direct timing control.
    pub fn with_timing_control() -> Self {
        Self {
            timing_control: true,
            ..Self::new()
        }
    }

    /// Create a mock backend that records modes but reports every switch as rejected.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Every mode dispatched so far, oldest first.
    pub fn dispatched(&self) -> Vec<ModeSetting> {
        self.dispatched.lock().unwrap().clone()
    }

    /// The most recently dispatched mode.
    pub fn last(&self) -> Option<ModeSetting> {
        self.dispatched.lock().unwrap().last().copied()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn set_resolution(&self, setting: &ModeSetting) -> Result<(), SwitchError> {
        self.dispatched.lock().unwrap().push(*setting);
        if self.fail {
            return Err(SwitchError::DisplayChangeFailed(-1));
        }
        Ok(())
    }

    fn has_timing_control(&self) -> bool {
        self.timing_control
    }
}

/// A mock video driver for testing.
///
/// Tracks the active aspect ratio like a real driver and records refresh
/// rate updates, aspect pushes and state applications.
#[derive(Debug, Clone, Default)]
pub struct MockVideoDriver {
    aspect: f32,
    refresh_rates: Vec<f32>,
    aspect_updates: Vec<f32>,
    applied: usize,
}

impl MockVideoDriver {
    /// Create a new mock driver with no aspect set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock driver whose active aspect is already `aspect`.
    pub fn with_aspect(aspect: f32) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }

    /// Refresh rates reported through [`VideoDriver::set_monitor_refresh_rate`].
    pub fn refresh_rates(&self) -> &[f32] {
        &self.refresh_rates
    }

    /// Every aspect pushed through [`VideoDriver::set_aspect_ratio_value`].
    pub fn aspect_updates(&self) -> &[f32] {
        &self.aspect_updates
    }

    /// Number of [`VideoDriver::apply_pending_state_changes`] calls.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Change the active aspect without recording it, as another subsystem would.
    pub fn override_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

impl VideoDriver for MockVideoDriver {
    fn set_monitor_refresh_rate(&mut self, hz: f32) {
        self.refresh_rates.push(hz);
    }

    fn set_aspect_ratio_value(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.aspect_updates.push(aspect);
    }

    fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    fn apply_pending_state_changes(&mut self) {
        self.applied += 1;
    }
}
