//! Display-server backend for Windows.

use crate::backend::DisplayBackend;
use crate::error::SwitchError;
use crate::modes::ModeSetting;

use log::{debug, info};
use windows_sys::Win32::Graphics::Gdi::{
    CDS_FULLSCREEN, ChangeDisplaySettingsExW, DEVMODEW, DISP_CHANGE_SUCCESSFUL,
    DISPLAY_DEVICE_ATTACHED_TO_DESKTOP, DISPLAY_DEVICEW, DM_DISPLAYFREQUENCY, DM_PELSHEIGHT,
    DM_PELSWIDTH, ENUM_CURRENT_SETTINGS, EnumDisplayDevicesW, EnumDisplaySettingsW,
};

/// Mode switching through `ChangeDisplaySettingsExW`.
///
/// The monitor index counts display devices attached to the desktop. Only
/// modes the driver already lists can be selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Backend;

impl Win32Backend {
    /// Create a new Win32 backend.
    pub fn new() -> Self {
        Self
    }
}

fn attached_device_name(monitor_index: u32) -> Result<[u16; 32], SwitchError> {
    let mut attached = 0;
    let mut device_index = 0;

    loop {
        let mut device: DISPLAY_DEVICEW = unsafe { std::mem::zeroed() };
        device.cb = std::mem::size_of::<DISPLAY_DEVICEW>() as u32;

        let found =
            unsafe { EnumDisplayDevicesW(std::ptr::null(), device_index, &mut device, 0) };
        if found == 0 {
            return Err(SwitchError::MonitorNotFound(monitor_index));
        }

        if device.StateFlags & DISPLAY_DEVICE_ATTACHED_TO_DESKTOP != 0 {
            if attached == monitor_index {
                return Ok(device.DeviceName);
            }
            attached += 1;
        }
        device_index += 1;
    }
}

impl DisplayBackend for Win32Backend {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn set_resolution(&self, setting: &ModeSetting) -> Result<(), SwitchError> {
        let device_name = attached_device_name(setting.monitor_index)?;
        let len = device_name.iter().take_while(|&&c| c != 0).count();
        debug!(
            "monitor {} is {}",
            setting.monitor_index,
            String::from_utf16_lossy(&device_name[..len])
        );

        let mut mode: DEVMODEW = unsafe { std::mem::zeroed() };
        mode.dmSize = std::mem::size_of::<DEVMODEW>() as u16;
        unsafe {
            EnumDisplaySettingsW(device_name.as_ptr(), ENUM_CURRENT_SETTINGS, &mut mode);
        }

        mode.dmPelsWidth = setting.width;
        mode.dmPelsHeight = setting.height;
        mode.dmDisplayFrequency = setting.refresh;
        mode.dmFields = DM_PELSWIDTH | DM_PELSHEIGHT | DM_DISPLAYFREQUENCY;

        let result = unsafe {
            ChangeDisplaySettingsExW(
                device_name.as_ptr(),
                &mode,
                std::ptr::null_mut(),
                CDS_FULLSCREEN,
                std::ptr::null(),
            )
        };

        if result != DISP_CHANGE_SUCCESSFUL {
            return Err(SwitchError::DisplayChangeFailed(result));
        }

        info!(
            "display mode set to {}x{}@{}",
            setting.width, setting.height, setting.refresh
        );
        Ok(())
    }
}
