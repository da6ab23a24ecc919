//! The mode switch dispatcher.

use crate::aspect::{AspectPublisher, VideoDriver, sync_aspect};
use crate::backend::DisplayBackend;
use crate::modes::{Geometry, ModeRequest, ModeSetting};
use crate::quantize::{MENU_SENTINEL, quantize};
use crate::refresh::{apply_crt_doubling, normalize_refresh};
use crate::state::ModeState;
use crate::width::{PixelClockBudget, dynamic_width};

use log::{debug, info, warn};

/// What a call to [`CrtSwitcher::switch_res_core`] decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwitchOutcome {
    /// The geometry changed and this mode was sent to the backend.
    Switched(ModeSetting),
    /// The geometry matched the tracked state; the backend was not called.
    Unchanged,
}

impl SwitchOutcome {
    /// Whether a mode was dispatched.
    pub fn is_switched(&self) -> bool {
        matches!(self, Self::Switched(_))
    }
}

/// Decides display modes for incoming content geometries and applies them.
///
/// The switcher owns the tracked [`ModeState`] and only calls the backend when
/// the requested geometry or centering differs from the previous request, so it
/// is safe to call on every frame.
///
/// # Example
///
/// ```
/// use crtswitch_core::{CrtSwitcher, MockBackend, MockVideoDriver, ModeRequest};
///
/// let mut switcher = CrtSwitcher::new(MockBackend::new(), MockVideoDriver::new());
/// let outcome = switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));
/// assert!(outcome.is_switched());
/// assert_eq!(switcher.state().normalized_hz, 60);
/// ```
pub struct CrtSwitcher<B: DisplayBackend, D: VideoDriver> {
    backend: B,
    driver: D,
    state: ModeState,
    budget: PixelClockBudget,
    monitor_index: u32,
}

impl<B: DisplayBackend, D: VideoDriver> CrtSwitcher<B, D> {
    /// Create a switcher in the idle state.
    ///
    /// The pixel clock budget follows the backend's timing control capability.
    pub fn new(backend: B, driver: D) -> Self {
        let budget = PixelClockBudget::for_timing_control(backend.has_timing_control());
        Self::with_budget(backend, driver, budget)
    }

    /// Create a switcher with an explicit pixel clock budget.
    pub fn with_budget(backend: B, driver: D, budget: PixelClockBudget) -> Self {
        debug!("switcher using {} backend, {budget:?} budget", backend.name());
        Self {
            backend,
            driver,
            state: ModeState::default(),
            budget,
            monitor_index: 0,
        }
    }

    /// Handle a content geometry or refresh change.
    ///
    /// Backend failures are logged and otherwise ignored; the tracked state
    /// still follows the request.
    pub fn switch_res_core(&mut self, request: ModeRequest) -> SwitchOutcome {
        let (width, height) = if request.width == MENU_SENTINEL {
            (320, 240)
        } else {
            (request.width, request.height)
        };

        let hz = apply_crt_doubling(request.hz, request.crt_mode);
        self.state.hz = hz;
        let width = if request.dynamic {
            dynamic_width(width, hz, self.budget)
        } else {
            width
        };
        let center_adjust = request.center_adjust;
        self.monitor_index = request.monitor_index;

        let outcome = if self.state.differs(width, height, center_adjust) {
            self.state.is_first_activation = false;
            let setting = self.setup(Geometry::new(width, height), hz, center_adjust);
            SwitchOutcome::Switched(setting)
        } else {
            debug!("{width}x{height} center {center_adjust} unchanged, skipping switch");
            SwitchOutcome::Unchanged
        };

        self.state.last_width = width;
        self.state.last_height = height;
        self.state.last_center_adjust = center_adjust;

        sync_aspect(&mut self.driver, self.state.aspect);

        outcome
    }

    /// Normalize, quantize and dispatch one mode.
    fn setup(&mut self, geometry: Geometry, hz: f32, center_adjust: i32) -> ModeSetting {
        if self.state.last_hz != Some(hz) {
            self.state.normalized_hz = normalize_refresh(hz);
            self.driver
                .set_monitor_refresh_rate(self.state.normalized_hz as f32);
            self.state.last_hz = Some(hz);
        }
        let refresh = self.state.normalized_hz;

        let mut publisher = AspectPublisher::new(&mut self.driver);
        let snapped = quantize(geometry, refresh, |g| {
            publisher.notify(g);
        });
        self.state.aspect = publisher.last().unwrap_or_else(|| snapped.aspect());

        let setting = ModeSetting {
            width: snapped.width,
            height: snapped.height,
            refresh,
            hz,
            center_adjust,
            monitor_index: self.monitor_index,
        };

        info!(
            "switching {}x{} -> {}x{}@{} via {}",
            geometry.width,
            geometry.height,
            setting.width,
            setting.height,
            setting.refresh,
            self.backend.name()
        );
        if let Err(e) = self.backend.set_resolution(&setting) {
            warn!("{} backend failed to set mode: {e}", self.backend.name());
        }
        self.driver.apply_pending_state_changes();

        setting
    }

    /// Forget the tracked geometry, e.g. when content is unloaded.
    ///
    /// The next request always runs a full mode setup. No backend call is made.
    pub fn restore(&mut self) {
        if self.state.is_first_activation {
            return;
        }
        debug!("restoring switcher to idle");
        self.state = ModeState::default();
    }

    /// Dynamic width for `width` at the refresh rate of the most recent request.
    pub fn dynamic_width(&self, width: u32) -> u32 {
        dynamic_width(width, self.state.hz, self.budget)
    }

    /// A snapshot of the tracked state.
    pub fn state(&self) -> ModeState {
        self.state.clone()
    }

    /// The pixel clock budget in use.
    pub fn budget(&self) -> PixelClockBudget {
        self.budget
    }

    /// The mode-setting backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The video driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the video driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockVideoDriver};
    use crate::modes::CrtMode;
    use test_log::test;

    fn switcher() -> CrtSwitcher<MockBackend, MockVideoDriver> {
        CrtSwitcher::new(MockBackend::new(), MockVideoDriver::new())
    }

    #[test]
    fn test_first_request_switches_and_activates() {
        let mut switcher = switcher();
        assert!(!switcher.state().is_active());

        let outcome = switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));

        let SwitchOutcome::Switched(setting) = outcome else {
            panic!("expected a switch, got {outcome:?}");
        };
        assert_eq!(setting.height, 224);
        assert_eq!(setting.refresh, 60);
        assert_eq!(switcher.backend().dispatched(), vec![setting]);
        assert!(switcher.state().is_active());
        assert_eq!(switcher.driver().refresh_rates(), &[60.0]);
        assert_eq!(switcher.driver().applied(), 1);
    }

    #[test]
    fn test_identical_requests_dispatch_once() {
        let mut switcher = switcher();
        let request = ModeRequest::new(256, 224, 60.0);

        assert!(switcher.switch_res_core(request).is_switched());
        assert_eq!(switcher.switch_res_core(request), SwitchOutcome::Unchanged);
        assert_eq!(switcher.switch_res_core(request), SwitchOutcome::Unchanged);

        assert_eq!(switcher.backend().dispatched().len(), 1);
        assert_eq!(switcher.driver().applied(), 1);
    }

    #[test]
    fn test_changes_in_geometry_or_centering_switch_again() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));
        switcher.switch_res_core(ModeRequest::new(320, 224, 60.0));
        switcher.switch_res_core(ModeRequest::new(320, 240, 60.0));
        switcher.switch_res_core(ModeRequest::new(320, 240, 60.0).with_center_adjust(4));

        let dispatched = switcher.backend().dispatched();
        assert_eq!(dispatched.len(), 4);
        assert_eq!(dispatched[3].center_adjust, 4);
    }

    #[test]
    fn test_refresh_change_alone_does_not_switch() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));
        let outcome = switcher.switch_res_core(ModeRequest::new(256, 224, 50.0));

        assert_eq!(outcome, SwitchOutcome::Unchanged);
        assert_eq!(switcher.state().normalized_hz, 60);
    }

    #[test]
    fn test_menu_width_sentinel() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(4, 4, 60.0));

        let last = switcher.backend().last().unwrap();
        assert_eq!((last.width, last.height), (320, 240));
        assert_eq!(switcher.state().last_height, 240);
    }

    #[test]
    fn test_menu_height_sentinel() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(320, 4, 50.0));

        let last = switcher.backend().last().unwrap();
        assert_eq!((last.width, last.height), (320, 240));
        assert_eq!(last.refresh, 50);
        // tracked height is the request's, not the snapped one
        assert_eq!(switcher.state().last_height, 4);
    }

    #[test]
    fn test_khz31_doubles_refresh() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(256, 224, 59.94).with_crt_mode(CrtMode::Khz31));

        let last = switcher.backend().last().unwrap();
        assert_eq!(last.refresh, 120);
        assert_eq!(last.hz, 59.94 * 2.0);
    }

    #[test]
    fn test_dynamic_width_uses_backend_budget() {
        let request = ModeRequest::new(320, 240, 60.0).with_dynamic_width(true);

        let mut generic = switcher();
        generic.switch_res_core(request);
        assert_eq!(generic.backend().last().unwrap().width, 960);

        let mut native =
            CrtSwitcher::new(MockBackend::with_timing_control(), MockVideoDriver::new());
        assert_eq!(native.budget(), PixelClockBudget::TimingControl);
        native.switch_res_core(request);
        assert_eq!(native.backend().last().unwrap().width, 2400);
        assert_eq!(native.dynamic_width(320), 2400);
    }

    #[test]
    fn test_restore_forces_next_switch() {
        let mut switcher = switcher();
        let request = ModeRequest::new(256, 224, 60.0);
        switcher.switch_res_core(request);

        switcher.restore();
        assert!(!switcher.state().is_active());
        assert_eq!(switcher.state().last_width, 0);
        assert_eq!(switcher.backend().dispatched().len(), 1);

        assert!(switcher.switch_res_core(request).is_switched());
        assert_eq!(switcher.backend().dispatched().len(), 2);
    }

    #[test]
    fn test_aspect_resynced_without_switch() {
        let mut switcher = switcher();
        let request = ModeRequest::new(256, 224, 60.0);
        switcher.switch_res_core(request);
        let applied = switcher.driver().applied();

        switcher.switch_res_core(request);
        assert_eq!(switcher.driver().applied(), applied);

        switcher.driver_mut().override_aspect(16.0 / 9.0);
        assert_eq!(switcher.switch_res_core(request), SwitchOutcome::Unchanged);
        assert_eq!(switcher.driver().applied(), applied + 1);
        assert_eq!(switcher.driver().aspect_ratio(), 256.0 / 224.0);
        assert_eq!(switcher.backend().dispatched().len(), 1);
    }

    #[test]
    fn test_aspect_falls_back_to_final_geometry() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(256, 200, 60.0));

        assert_eq!(switcher.state().aspect, 256.0 / 200.0);
        assert_eq!(switcher.driver().aspect_ratio(), 256.0 / 200.0);
    }

    #[test]
    fn test_backend_failure_is_not_propagated() {
        let mut switcher = CrtSwitcher::new(MockBackend::failing(), MockVideoDriver::new());
        let request = ModeRequest::new(256, 224, 60.0);

        assert!(switcher.switch_res_core(request).is_switched());
        assert_eq!(switcher.switch_res_core(request), SwitchOutcome::Unchanged);
        assert_eq!(switcher.backend().dispatched().len(), 1);
    }

    #[test]
    fn test_dynamic_width_follows_refresh_only_change() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(256, 224, 60.0));
        assert_eq!(switcher.dynamic_width(320), 960);

        let outcome = switcher.switch_res_core(ModeRequest::new(256, 224, 50.0));
        assert_eq!(outcome, SwitchOutcome::Unchanged);
        assert_eq!(switcher.state().hz, 50.0);
        assert_eq!(switcher.dynamic_width(320), 1440);
    }

    #[test]
    fn test_zero_refresh_is_clamped_on_first_request() {
        let mut switcher = switcher();
        switcher.switch_res_core(ModeRequest::new(256, 224, 0.0));

        assert_eq!(switcher.backend().last().unwrap().refresh, 50);
        assert_eq!(switcher.driver().refresh_rates(), &[50.0]);

        switcher.restore();
        switcher.switch_res_core(ModeRequest::new(256, 224, 0.0));
        assert_eq!(switcher.backend().last().unwrap().refresh, 50);
    }
}
