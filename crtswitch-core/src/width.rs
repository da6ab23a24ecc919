//! Pixel-clock-bounded dynamic width.

/// Total scanlines per frame, blanking included, assumed for the pixel clock estimate.
pub const MIN_HEIGHT: u32 = 261;

const WIDTH_STEP: f64 = 1.5;
const MAX_MULTIPLIER: u32 = 9;

/// Maximum pixel throughput the output can sustain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelClockBudget {
    /// Generic outputs (display server mode lists).
    #[default]
    Generic,
    /// Outputs whose timings are programmed directly.
    TimingControl,
}

impl PixelClockBudget {
    /// Budget in pixels per second.
    pub fn pixels_per_second(self) -> f64 {
        match self {
            Self::Generic => 15_000_000.0,
            Self::TimingControl => 32_000_000.0,
        }
    }

    /// Budget matching a backend's capabilities.
    pub fn for_timing_control(has_timing_control: bool) -> Self {
        if has_timing_control {
            Self::TimingControl
        } else {
            Self::Generic
        }
    }
}

/// Derive a width from the pixel clock budget.
///
/// Walks multiples of `width * 1.5` and returns the first one whose pixel clock
/// exceeds the budget, or the ninth multiple if none does.
pub fn dynamic_width(width: u32, hz: f32, budget: PixelClockBudget) -> u32 {
    let limit = budget.pixels_per_second();
    let mut candidate = 0.0;

    for i in 0..=MAX_MULTIPLIER {
        candidate = f64::from(width) * WIDTH_STEP * f64::from(i);
        if candidate * f64::from(MIN_HEIGHT) * f64::from(hz) > limit {
            break;
        }
    }

    candidate as u32
}
