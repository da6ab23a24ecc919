//! Refresh rate normalization.

use crate::modes::CrtMode;

/// Lowest integer rate a CRT is driven at.
pub const MIN_REFRESH: u32 = 50;

/// Rates above this are assumed to be doubled rather than clamped.
const MAX_NATIVE_REFRESH: f32 = 63.0;

/// Rate used for doubled/interlace-capable modes.
pub const DOUBLED_REFRESH: u32 = 120;

/// Below this, 31 kHz doubling gives up and forces 120 Hz.
const DOUBLING_THRESHOLD: f32 = 53.0;

/// Convert a content refresh rate into an integer rate the display accepts.
///
/// ```
/// use crtswitch_core::normalize_refresh;
///
/// assert_eq!(normalize_refresh(49.0), 50);
/// assert_eq!(normalize_refresh(59.7), 60);
/// assert_eq!(normalize_refresh(64.0), 120);
/// ```
pub fn normalize_refresh(hz: f32) -> u32 {
    let hz = hz.max(MIN_REFRESH as f32);
    if hz > MAX_NATIVE_REFRESH {
        return DOUBLED_REFRESH;
    }
    hz.round() as u32
}

/// Apply the refresh doubling required by 31 kHz output.
pub fn apply_crt_doubling(hz: f32, crt_mode: CrtMode) -> f32 {
    if crt_mode != CrtMode::Khz31 {
        return hz;
    }
    if hz > DOUBLING_THRESHOLD {
        hz * 2.0
    } else {
        DOUBLED_REFRESH as f32
    }
}
