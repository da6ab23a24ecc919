//! CRT display timing negotiation.
//!
//! Given the framebuffer geometry and refresh rate an emulated system asks for,
//! this crate decides which physical mode a CRT-class display should be driven
//! at, and only asks the platform to switch when that mode actually changes.
//!
//! The pipeline for one request:
//!
//! 1. Refresh doubling for 31 kHz output, then normalization to an integer rate
//!    ([`normalize_refresh`]).
//! 2. Optional width derivation from a pixel clock budget ([`dynamic_width`]).
//! 3. Change detection against the tracked [`ModeState`].
//! 4. Snapping onto CRT-safe scanline counts ([`quantize`]), publishing aspect
//!    ratios to the [`VideoDriver`] along the way.
//! 5. Dispatch of the resulting [`ModeSetting`] to a [`DisplayBackend`].
//!
//! # Example
//!
//! ```no_run
//! use crtswitch_core::{CrtMode, CrtSwitcher, MockVideoDriver, ModeRequest, VideoCoreBackend};
//!
//! fn main() -> Result<(), crtswitch_core::SwitchError> {
//!     let backend = VideoCoreBackend::new()?;
//!     let mut switcher = CrtSwitcher::new(backend, MockVideoDriver::new());
//!
//!     // Genesis H32 NTSC on a 15 kHz monitor
//!     let request = ModeRequest::new(256, 224, 59.92).with_crt_mode(CrtMode::Khz15);
//!     switcher.switch_res_core(request);
//!
//!     // Repeating the request does not touch the hardware
//!     switcher.switch_res_core(request);
//!
//!     // Content unloaded
//!     switcher.restore();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! Use [`MockBackend`] and [`MockVideoDriver`] to test code without hardware:
//!
//! ```
//! use crtswitch_core::{CrtSwitcher, MockBackend, MockVideoDriver, ModeRequest};
//!
//! let mut switcher = CrtSwitcher::new(MockBackend::new(), MockVideoDriver::new());
//! switcher.switch_res_core(ModeRequest::new(320, 4, 50.0));
//! let mode = switcher.backend().last().unwrap();
//! assert_eq!((mode.width, mode.height), (320, 240));
//! ```

#![warn(missing_docs)]

mod aspect;
mod backend;
mod config;
mod error;
mod mock;
mod modes;
mod quantize;
mod refresh;
mod state;
mod switcher;
mod videocore;
mod width;

#[cfg(windows)]
mod win32;

// Re-export public API
pub use aspect::{AspectPublisher, VideoDriver, sync_aspect};
pub use backend::{DisplayBackend, GenericBackend};
pub use config::{BackendKind, SwitchConfig};
pub use error::SwitchError;
pub use mock::{MockBackend, MockVideoDriver};
pub use modes::{CrtMode, Geometry, ModeRequest, ModeSetting};
pub use quantize::{MENU_SENTINEL, quantize, quantize_geometry};
pub use refresh::{DOUBLED_REFRESH, MIN_REFRESH, apply_crt_doubling, normalize_refresh};
pub use state::ModeState;
pub use switcher::{CrtSwitcher, SwitchOutcome};
pub use videocore::{VideoCoreBackend, fbset_args, hdmi_cvt_command, tvservice_args};
#[cfg(windows)]
pub use win32::Win32Backend;
pub use width::{MIN_HEIGHT, PixelClockBudget, dynamic_width};
