//! Example: Walk a switcher through a short content session.
//!
//! Run with: `RUST_LOG=debug cargo run --example switch_once`

use crtswitch_core::{CrtMode, CrtSwitcher, GenericBackend, MockVideoDriver, ModeRequest};

fn main() {
    // Initialize logging (optional)
    env_logger::init();

    // The generic backend only logs what it would set
    let mut switcher = CrtSwitcher::new(GenericBackend::new(), MockVideoDriver::new());

    let requests = [
        // Menu
        ModeRequest::new(4, 4, 60.0),
        // SNES game at 224 lines, reported twice
        ModeRequest::new(256, 224, 60.0988),
        ModeRequest::new(256, 224, 60.0988),
        // Refresh-only change keeps the current mode
        ModeRequest::new(256, 224, 60.0988).with_crt_mode(CrtMode::Khz31),
    ];

    for request in requests {
        let outcome = switcher.switch_res_core(request);
        println!(
            "{}x{}@{} -> {:?}",
            request.width, request.height, request.hz, outcome
        );
    }

    let state = switcher.state();
    println!(
        "Tracked: {}x{}, {} Hz, aspect {:.3}",
        state.last_width, state.last_height, state.normalized_hz, state.aspect
    );

    switcher.restore();
}
