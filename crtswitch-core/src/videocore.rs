//! VideoCore backend for boards with directly programmable HDMI timings.

use crate::backend::DisplayBackend;
use crate::error::SwitchError;
use crate::modes::ModeSetting;

use libloading::{Library, Symbol};
use log::{debug, info, trace};
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

const VIDEOCORE_LIBRARY: &str = "libbcm_host.so";

/// DMT mode number the firmware assigns to the custom CVT timing.
const CUSTOM_DMT_MODE: &str = "DMT 87";

const FRAMEBUFFER_DEPTH: u32 = 24;

const GENCMD_RESPONSE_LEN: usize = 1024;

type VcosInitFn = unsafe extern "C" fn() -> c_int;
type VchiInitialiseFn = unsafe extern "C" fn(*mut *mut c_void) -> i32;
type VchiConnectFn = unsafe extern "C" fn(*mut *mut c_void, u32, *mut c_void) -> i32;
type GencmdInitFn = unsafe extern "C" fn(*mut c_void, *mut *mut c_void, u32);
type GencmdFn = unsafe extern "C" fn(*mut c_char, c_int, *const c_char, ...) -> c_int;
type GencmdStopFn = unsafe extern "C" fn();
type VchiDisconnectFn = unsafe extern "C" fn(*mut c_void) -> i32;

// =============================================================================
// Command Builders
// =============================================================================

/// The general command that programs a custom CVT timing for `setting`.
pub fn hdmi_cvt_command(setting: &ModeSetting) -> String {
    format!(
        "hdmi_cvt {} {} {} 0 0 0 1",
        setting.width, setting.height, setting.refresh
    )
}

/// Arguments for `tvservice` switching HDMI to the custom timing.
pub fn tvservice_args() -> [&'static str; 2] {
    ["-e", CUSTOM_DMT_MODE]
}

/// Arguments for `fbset` resizing the framebuffer to `setting`.
pub fn fbset_args(setting: &ModeSetting) -> Vec<String> {
    let (w, h) = (setting.width.to_string(), setting.height.to_string());
    vec![
        "-g".into(),
        w.clone(),
        h.clone(),
        w,
        h,
        FRAMEBUFFER_DEPTH.to_string(),
    ]
}

fn run_utility<I, S>(program: &'static str, args: I) -> Result<(), SwitchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let status = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(SwitchError::CommandFailed { program, status })
    }
}

/// Initialise and connect a VCHI instance, releasing it again if the connect fails.
///
/// # Safety
///
/// The function pointers must be the VCHI entry points of one loaded library.
unsafe fn open_instance(
    initialise: VchiInitialiseFn,
    connect: VchiConnectFn,
    disconnect: VchiDisconnectFn,
) -> Result<*mut c_void, SwitchError> {
    let mut instance: *mut c_void = std::ptr::null_mut();
    let result = unsafe { initialise(&mut instance) };
    if result != 0 || instance.is_null() {
        return Err(SwitchError::VideoCoreInitFailed(result));
    }

    let result = unsafe { connect(std::ptr::null_mut(), 0, instance) };
    if result != 0 {
        unsafe { disconnect(instance) };
        return Err(SwitchError::VideoCoreInitFailed(result));
    }

    Ok(instance)
}

// =============================================================================
// VideoCoreBackend
// =============================================================================

/// Guard to ensure only one VideoCore connection exists at a time.
static INSTANCE_EXISTS: AtomicBool = AtomicBool::new(false);

/// Mode switching through the VideoCore firmware.
///
/// Each switch sends an `hdmi_cvt` general command, moves the HDMI output to the
/// resulting custom mode with `tvservice`, then resizes the framebuffer with
/// `fbset`. Both utilities must be on `PATH`.
///
/// The framebuffer is resized underneath the video driver, so after a switch
/// through this backend the integrator should re-announce the refresh rate
/// and reinitialize its video driver (viewport, swap chain) before drawing.
///
/// # Limitations
///
/// Only one instance can exist at a time since the general command service
/// holds a single connection.
pub struct VideoCoreBackend {
    lib: Library,
    instance: *mut c_void,
}

// Safety: the instance handle is only passed back to the library that created it,
// and the Library stays loaded for the lifetime of VideoCoreBackend
unsafe impl Send for VideoCoreBackend {}
unsafe impl Sync for VideoCoreBackend {}

impl VideoCoreBackend {
    /// Load the VideoCore host library and open the general command service.
    ///
    /// # Errors
    ///
    /// - [`SwitchError::AlreadyInitialized`] if another instance already exists
    /// - [`SwitchError::LibraryLoad`] if the host library or a symbol is missing
    /// - [`SwitchError::VideoCoreInitFailed`] if the firmware connection fails
    pub fn new() -> Result<Self, SwitchError> {
        if INSTANCE_EXISTS.swap(true, Ordering::SeqCst) {
            return Err(SwitchError::AlreadyInitialized);
        }

        match Self::init_internal() {
            Ok(backend) => Ok(backend),
            Err(e) => {
                INSTANCE_EXISTS.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn init_internal() -> Result<Self, SwitchError> {
        unsafe {
            let lib = Library::new(VIDEOCORE_LIBRARY)?;

            let vcos_init: Symbol<VcosInitFn> = lib.get(b"vcos_init")?;
            vcos_init();

            // Resolve everything up front so a missing symbol cannot strand an instance.
            let initialise: Symbol<VchiInitialiseFn> = lib.get(b"vchi_initialise")?;
            let connect: Symbol<VchiConnectFn> = lib.get(b"vchi_connect")?;
            let disconnect: Symbol<VchiDisconnectFn> = lib.get(b"vchi_disconnect")?;
            let gencmd_init: Symbol<GencmdInitFn> = lib.get(b"vc_vchi_gencmd_init")?;

            let instance = open_instance(*initialise, *connect, *disconnect)?;

            let mut connection: *mut c_void = std::ptr::null_mut();
            gencmd_init(instance, &mut connection, 1);

            debug!("VideoCore general command service connected");
            Ok(Self { lib, instance })
        }
    }

    /// Send one general command to the firmware and return its response.
    pub fn gencmd(&self, command: &str) -> Result<String, SwitchError> {
        let c_command = CString::new(command).map_err(std::io::Error::from)?;
        let mut response = [0 as c_char; GENCMD_RESPONSE_LEN];

        let code = unsafe {
            let gencmd: Symbol<GencmdFn> = self.lib.get(b"vc_gencmd")?;
            gencmd(
                response.as_mut_ptr(),
                GENCMD_RESPONSE_LEN as c_int,
                c"%s".as_ptr(),
                c_command.as_ptr(),
            )
        };

        if code != 0 {
            return Err(SwitchError::GencmdFailed {
                command: command.to_owned(),
                code,
            });
        }

        let response = unsafe { CStr::from_ptr(response.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        trace!("gencmd '{command}' -> '{response}'");
        Ok(response)
    }
}

impl DisplayBackend for VideoCoreBackend {
    fn name(&self) -> &'static str {
        "videocore"
    }

    fn set_resolution(&self, setting: &ModeSetting) -> Result<(), SwitchError> {
        let command = hdmi_cvt_command(setting);
        info!("programming HDMI timing: {command}");
        self.gencmd(&command)?;

        run_utility("tvservice", tvservice_args())?;
        run_utility("fbset", fbset_args(setting))?;
        Ok(())
    }

    fn has_timing_control(&self) -> bool {
        true
    }
}

impl Drop for VideoCoreBackend {
    fn drop(&mut self) {
        unsafe {
            if let Ok(stop) = self.lib.get::<GencmdStopFn>(b"vc_gencmd_stop") {
                stop();
            }
            if let Ok(disconnect) = self.lib.get::<VchiDisconnectFn>(b"vchi_disconnect") {
                disconnect(self.instance);
            }
        }
        INSTANCE_EXISTS.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(width: u32, height: u32, refresh: u32) -> ModeSetting {
        ModeSetting {
            width,
            height,
            refresh,
            hz: refresh as f32,
            center_adjust: 0,
            monitor_index: 0,
        }
    }

    #[test]
    fn test_hdmi_cvt_command() {
        assert_eq!(
            hdmi_cvt_command(&setting(320, 240, 60)),
            "hdmi_cvt 320 240 60 0 0 0 1"
        );
        assert_eq!(
            hdmi_cvt_command(&setting(1920, 288, 50)),
            "hdmi_cvt 1920 288 50 0 0 0 1"
        );
    }

    #[test]
    fn test_utility_args() {
        assert_eq!(tvservice_args(), ["-e", "DMT 87"]);
        assert_eq!(
            fbset_args(&setting(320, 240, 60)),
            ["-g", "320", "240", "320", "240", "24"]
        );
    }

    static FAKE_INSTANCE: u8 = 0;
    static DISCONNECTED: AtomicBool = AtomicBool::new(false);

    fn fake_instance() -> *mut c_void {
        std::ptr::from_ref(&FAKE_INSTANCE).cast_mut().cast()
    }

    unsafe extern "C" fn fake_initialise(instance: *mut *mut c_void) -> i32 {
        unsafe { *instance = fake_instance() };
        0
    }

    unsafe extern "C" fn fake_connect_ok(_: *mut *mut c_void, _: u32, _: *mut c_void) -> i32 {
        0
    }

    unsafe extern "C" fn fake_connect_fails(_: *mut *mut c_void, _: u32, _: *mut c_void) -> i32 {
        -1
    }

    unsafe extern "C" fn fake_disconnect(instance: *mut c_void) -> i32 {
        DISCONNECTED.store(instance == fake_instance(), Ordering::SeqCst);
        0
    }

    #[test]
    fn test_open_instance_releases_on_connect_failure() {
        DISCONNECTED.store(false, Ordering::SeqCst);
        let result = unsafe { open_instance(fake_initialise, fake_connect_fails, fake_disconnect) };

        assert!(matches!(result, Err(SwitchError::VideoCoreInitFailed(-1))));
        assert!(DISCONNECTED.load(Ordering::SeqCst));
    }

    #[test]
    fn test_open_instance_keeps_connected_instance() {
        let result = unsafe { open_instance(fake_initialise, fake_connect_ok, fake_disconnect) };
        assert_eq!(result.unwrap(), fake_instance());
    }

    #[test]
    fn test_failed_init_releases_guard() {
        // Without the VideoCore library both attempts fail on loading rather
        // than the second one tripping the instance guard.
        if let Err(SwitchError::LibraryLoad(_)) = VideoCoreBackend::new() {
            assert!(matches!(
                VideoCoreBackend::new(),
                Err(SwitchError::LibraryLoad(_))
            ));
        }
    }
}
