//! Mode state tracking.

/// The switcher's record of what it last applied.
///
/// A fresh state (and the state after [`CrtSwitcher::restore`](crate::CrtSwitcher::restore))
/// is zeroed with `is_first_activation` set, so the next request always runs a
/// full mode setup. Use [`CrtSwitcher::state`](crate::CrtSwitcher::state) to
/// obtain a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeState {
    /// Width of the most recent request (after the menu override and dynamic width).
    pub last_width: u32,
    /// Height of the most recent request.
    pub last_height: u32,
    /// Center adjustment of the most recent request.
    pub last_center_adjust: i32,
    /// Refresh rate of the most recent request, after CRT doubling.
    pub hz: f32,
    /// Refresh rate the last normalization was computed from, if any.
    pub last_hz: Option<f32>,
    /// Integer refresh rate handed to the display.
    pub normalized_hz: u32,
    /// Aspect ratio computed during the last mode setup.
    pub aspect: f32,
    /// Set until the first request after creation or restore has been processed.
    pub is_first_activation: bool,
}

impl ModeState {
    /// Whether the tracker has an established geometry.
    pub fn is_active(&self) -> bool {
        !self.is_first_activation
    }

    /// Whether the given pending geometry differs from what was last tracked.
    pub(crate) fn differs(&self, width: u32, height: u32, center_adjust: i32) -> bool {
        self.is_first_activation
            || height != self.last_height
            || width != self.last_width
            || center_adjust != self.last_center_adjust
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            last_width: 0,
            last_height: 0,
            last_center_adjust: 0,
            hz: 0.0,
            last_hz: None,
            normalized_hz: 0,
            aspect: 0.0,
            is_first_activation: true,
        }
    }
}
