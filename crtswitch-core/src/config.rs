//! Switcher configuration.

use crate::backend::{DisplayBackend, GenericBackend};
use crate::error::SwitchError;
use crate::modes::{CrtMode, ModeRequest};
use crate::videocore::VideoCoreBackend;
use crate::width::PixelClockBudget;

/// Which mode-setting backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendKind {
    /// Log modes without touching the display.
    #[default]
    Generic,
    /// Program HDMI timings through the VideoCore firmware.
    VideoCore,
    /// Change modes through the Windows display settings API.
    Win32,
}

impl BackendKind {
    /// Open the backend.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot be initialized or does not exist on this platform.
    pub fn open(self) -> Result<Box<dyn DisplayBackend>, SwitchError> {
        match self {
            Self::Generic => Ok(Box::new(GenericBackend::new())),
            Self::VideoCore => Ok(Box::new(VideoCoreBackend::new()?)),
            #[cfg(windows)]
            Self::Win32 => Ok(Box::new(crate::win32::Win32Backend::new())),
            #[cfg(not(windows))]
            Self::Win32 => Err(SwitchError::BackendUnavailable("win32")),
        }
    }
}

/// User-facing switch settings.
///
/// Fields missing from a serialized config take their defaults.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SwitchConfig {
    /// CRT switching mode.
    pub crt_mode: CrtMode,
    /// Centering offset.
    pub center_adjust: i32,
    /// Monitor to switch.
    pub monitor_index: u32,
    /// Derive widths from the pixel clock budget.
    pub dynamic_width: bool,
    /// Backend to open.
    pub backend: BackendKind,
    /// Override for the backend's pixel clock budget.
    pub pixel_clock_budget: Option<PixelClockBudget>,
}

impl SwitchConfig {
    /// Build a request for the given content geometry using these settings.
    pub fn request(&self, width: u32, height: u32, hz: f32) -> ModeRequest {
        ModeRequest::new(width, height, hz)
            .with_crt_mode(self.crt_mode)
            .with_center_adjust(self.center_adjust)
            .with_monitor_index(self.monitor_index)
            .with_dynamic_width(self.dynamic_width)
    }

    /// The budget to use with `backend`.
    pub fn budget_for(&self, backend: &dyn DisplayBackend) -> PixelClockBudget {
        self.pixel_clock_budget
            .unwrap_or_else(|| PixelClockBudget::for_timing_control(backend.has_timing_control()))
    }
}
