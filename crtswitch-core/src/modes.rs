//! Mode request and mode setting definitions.

use crate::error::SwitchError;

/// CRT switching mode selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrtMode {
    /// Resolution switching without refresh adjustment.
    #[default]
    Off,
    /// 15 kHz output: content refresh is used as-is.
    Khz15,
    /// 31 kHz output: the display only syncs at doubled vertical rates.
    Khz31,
}

impl TryFrom<u8> for CrtMode {
    type Error = SwitchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Khz15),
            2 => Ok(Self::Khz31),
            _ => Err(SwitchError::InvalidCrtMode(value)),
        }
    }
}

impl From<CrtMode> for u8 {
    fn from(mode: CrtMode) -> Self {
        match mode {
            CrtMode::Off => 0,
            CrtMode::Khz15 => 1,
            CrtMode::Khz31 => 2,
        }
    }
}

/// A content-resolution or refresh change reported by the emulator core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeRequest {
    /// Framebuffer width. A width of 4 marks the menu.
    pub width: u32,
    /// Framebuffer height. A height of 4 marks the menu.
    pub height: u32,
    /// Content refresh rate in Hz.
    pub hz: f32,
    /// CRT switching mode.
    pub crt_mode: CrtMode,
    /// Centering offset passed through to the backend.
    pub center_adjust: i32,
    /// Index of the monitor to switch.
    pub monitor_index: u32,
    /// Whether the width should be derived from the pixel clock budget.
    pub dynamic: bool,
}

impl ModeRequest {
    /// Create a request for the given geometry with every adjustment at its default.
    pub fn new(width: u32, height: u32, hz: f32) -> Self {
        Self {
            width,
            height,
            hz,
            crt_mode: CrtMode::Off,
            center_adjust: 0,
            monitor_index: 0,
            dynamic: false,
        }
    }

    /// Set the CRT switching mode.
    pub fn with_crt_mode(mut self, crt_mode: CrtMode) -> Self {
        self.crt_mode = crt_mode;
        self
    }

    /// Set the centering offset.
    pub fn with_center_adjust(mut self, center_adjust: i32) -> Self {
        self.center_adjust = center_adjust;
        self
    }

    /// Set the target monitor.
    pub fn with_monitor_index(mut self, monitor_index: u32) -> Self {
        self.monitor_index = monitor_index;
        self
    }

    /// Mark the width as derived from the pixel clock budget.
    pub fn with_dynamic_width(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Horizontal resolution.
    pub width: u32,
    /// Vertical resolution in scanlines.
    pub height: u32,
}

impl Geometry {
    /// Create a new geometry.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    ///
    /// A zero height yields an infinite or NaN aspect.
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// The finalized mode handed to a [`DisplayBackend`](crate::DisplayBackend).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeSetting {
    /// Horizontal resolution.
    pub width: u32,
    /// Vertical resolution after snapping.
    pub height: u32,
    /// Integer refresh rate the display should run at.
    pub refresh: u32,
    /// Content refresh rate after CRT doubling.
    pub hz: f32,
    /// Centering offset.
    pub center_adjust: i32,
    /// Index of the monitor to switch.
    pub monitor_index: u32,
}

impl ModeSetting {
    /// The geometry part of this setting.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }
}
