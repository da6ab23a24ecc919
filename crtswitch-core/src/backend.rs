//! Mode-setting backends.

use crate::error::SwitchError;
use crate::modes::ModeSetting;

use log::info;

// =============================================================================
// Display Backend Trait
// =============================================================================

/// Trait for the platform layer that actually changes the display mode.
///
/// This allows the switcher to run against hardware, a display server, or a
/// mock in tests.
pub trait DisplayBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Apply the given mode to the display.
    ///
    /// May block while the hardware is reprogrammed.
    fn set_resolution(&self, setting: &ModeSetting) -> Result<(), SwitchError>;

    /// Whether this backend programs display timings directly.
    ///
    /// Backends with timing control get the larger pixel clock budget for
    /// dynamic width.
    fn has_timing_control(&self) -> bool {
        false
    }
}

impl<B: DisplayBackend + ?Sized> DisplayBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn set_resolution(&self, setting: &ModeSetting) -> Result<(), SwitchError> {
        (**self).set_resolution(setting)
    }

    fn has_timing_control(&self) -> bool {
        (**self).has_timing_control()
    }
}

// =============================================================================
// GenericBackend
// =============================================================================

/// A backend that only reports the modes it is asked for.
///
/// Used where no mode-setting support is available, and for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericBackend;

impl GenericBackend {
    /// Create a new generic backend.
    pub fn new() -> Self {
        Self
    }
}

impl DisplayBackend for GenericBackend {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn set_resolution(&self, setting: &ModeSetting) -> Result<(), SwitchError> {
        info!(
            "mode {}x{}@{} (content {:.3} Hz, center {}, monitor {})",
            setting.width,
            setting.height,
            setting.refresh,
            setting.hz,
            setting.center_adjust,
            setting.monitor_index
        );
        Ok(())
    }
}
