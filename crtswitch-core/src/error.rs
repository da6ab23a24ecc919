//! Error types for CRT mode switching.

/// Errors that can occur while configuring or driving a display backend.
///
/// The switch dispatcher itself never returns these: backend failures are
/// logged and the engine carries on. They surface from backend constructors,
/// from [`DisplayBackend::set_resolution`](crate::DisplayBackend::set_resolution)
/// when called directly, and from configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    /// Failed to load the VideoCore host library.
    #[error("Failed to load VideoCore library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// The VideoCore host interface could not be initialized.
    #[error("VideoCore initialization failed (error code: {0})")]
    VideoCoreInitFailed(i32),

    /// A VideoCore general command was rejected.
    #[error("VideoCore command '{command}' failed (error code: {code})")]
    GencmdFailed {
        /// The command string sent to the firmware.
        command: String,
        /// The code returned by the firmware.
        code: i32,
    },

    /// An external utility exited unsuccessfully.
    #[error("{program} exited with {status}")]
    CommandFailed {
        /// The utility that was run.
        program: &'static str,
        /// Its exit status.
        status: std::process::ExitStatus,
    },

    /// Attempted to create a second hardware backend instance.
    #[error("Backend already initialized - only one instance allowed")]
    AlreadyInitialized,

    /// The display server refused the requested mode.
    #[error("Display mode change failed (error code: {0})")]
    DisplayChangeFailed(i32),

    /// No monitor exists at the requested index.
    #[error("Monitor {0} not found")]
    MonitorNotFound(u32),

    /// The selected backend is not available on this platform.
    #[error("The {0} backend is not available on this platform")]
    BackendUnavailable(&'static str),

    /// A CRT mode integer outside 0-2.
    #[error("Invalid CRT mode {0} (expected 0-2)")]
    InvalidCrtMode(u8),

    /// An I/O error occurred (e.g., spawning an external utility).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
