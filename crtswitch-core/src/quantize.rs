//! Resolution snapping onto CRT-safe scanline counts.
//!
//! Rules run in a fixed order over one working geometry. A rule sees the
//! rewrites of every rule before it, and its aspect notification uses the
//! geometry as it stands at that point in the ladder.

use crate::modes::Geometry;
use log::trace;

/// Height reported while the menu is shown.
pub const MENU_SENTINEL: u32 = 4;

/// Menus narrower than this are shown at 320 pixels.
const MENU_WIDE_THRESHOLD: u32 = 700;

/// When a rule reports the aspect relative to its rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notify {
    Before,
    After,
    Only,
}

struct Rule {
    name: &'static str,
    applies: fn(Geometry, u32) -> bool,
    rewrite: fn(&mut Geometry),
    notify: Notify,
}

const RULES: [Rule; 9] = [
    Rule {
        name: "menu",
        applies: |g, _| g.height == MENU_SENTINEL,
        rewrite: |g| {
            if g.width < MENU_WIDE_THRESHOLD {
                g.width = 320;
            }
            g.height = 240;
        },
        notify: Notify::After,
    },
    Rule {
        name: "short",
        applies: |g, _| g.height < 200 && g.height != 144,
        rewrite: |g| g.height = 200,
        notify: Notify::Before,
    },
    Rule {
        name: "tall",
        applies: |g, _| g.height > 200,
        rewrite: |_| {},
        notify: Notify::Only,
    },
    Rule {
        name: "pal-144-doubling",
        applies: |g, hz| g.height == 144 && hz == 50,
        rewrite: |g| g.height = 288,
        notify: Notify::After,
    },
    Rule {
        name: "snap-224",
        applies: |g, _| g.height > 200 && g.height < 224,
        rewrite: |g| g.height = 224,
        notify: Notify::Before,
    },
    Rule {
        name: "snap-240",
        applies: |g, _| g.height > 224 && g.height < 240,
        rewrite: |g| g.height = 240,
        notify: Notify::Before,
    },
    Rule {
        name: "snap-254",
        applies: |g, _| g.height > 240 && g.height < 255,
        rewrite: |g| g.height = 254,
        notify: Notify::Before,
    },
    Rule {
        name: "ntsc-528-halving",
        applies: |g, hz| g.height == 528 && hz == 60,
        rewrite: |g| g.height = 480,
        notify: Notify::Before,
    },
    Rule {
        name: "snap-254-55hz",
        applies: |g, hz| g.height >= 240 && g.height < 255 && hz == 55,
        rewrite: |g| g.height = 254,
        notify: Notify::Before,
    },
];

/// Snap `geometry` onto a CRT-safe mode, reporting intermediate geometries.
///
/// `notify` is called once per aspect notification in the ladder, with the
/// geometry active at that point. Several calls per quantization are normal.
pub fn quantize<F>(geometry: Geometry, normalized_hz: u32, mut notify: F) -> Geometry
where
    F: FnMut(Geometry),
{
    let mut working = geometry;

    for rule in &RULES {
        if !(rule.applies)(working, normalized_hz) {
            continue;
        }

        trace!(
            "rule {} matched {}x{}@{normalized_hz}",
            rule.name, working.width, working.height
        );

        match rule.notify {
            Notify::Before => {
                notify(working);
                (rule.rewrite)(&mut working);
            }
            Notify::After => {
                (rule.rewrite)(&mut working);
                notify(working);
            }
            Notify::Only => notify(working),
        }
    }

    working
}

/// Snap `geometry` onto a CRT-safe mode without aspect notifications.
///
/// ```
/// use crtswitch_core::{quantize_geometry, Geometry};
///
/// assert_eq!(quantize_geometry(Geometry::new(256, 150), 60), Geometry::new(256, 200));
/// ```
pub fn quantize_geometry(geometry: Geometry, normalized_hz: u32) -> Geometry {
    quantize(geometry, normalized_hz, |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(width: u32, height: u32, hz: u32) -> (u32, u32) {
        let g = quantize_geometry(Geometry::new(width, height), hz);
        (g.width, g.height)
    }

    fn notifications(width: u32, height: u32, hz: u32) -> Vec<(u32, u32)> {
        let mut seen = Vec::new();
        quantize(Geometry::new(width, height), hz, |g| {
            seen.push((g.width, g.height))
        });
        seen
    }

    #[test]
    fn test_canonical_heights_unchanged() {
        for width in [256, 320, 640] {
            assert_eq!(snap(width, 240, 60), (width, 240));
            assert_eq!(snap(width, 224, 60), (width, 224));
            assert_eq!(snap(width, 480, 60), (width, 480));
            assert_eq!(snap(width, 200, 60), (width, 200));
        }
    }

    #[test]
    fn test_menu_sentinel() {
        assert_eq!(snap(256, 4, 60), (320, 240));
        assert_eq!(snap(699, 4, 60), (320, 240));
        assert_eq!(snap(700, 4, 60), (700, 240));
        assert_eq!(snap(1024, 4, 50), (1024, 240));
    }

    #[test]
    fn test_short_heights_raised() {
        assert_eq!(snap(256, 150, 60), (256, 200));
        assert_eq!(snap(256, 192, 50), (256, 200));
        // 144 only doubles at 50 Hz; otherwise it is left alone.
        assert_eq!(snap(160, 144, 60), (160, 144));
    }

    #[test]
    fn test_interlace_special_cases() {
        assert_eq!(snap(160, 144, 50), (160, 288));
        assert_eq!(snap(640, 528, 60), (640, 480));
        assert_eq!(snap(640, 528, 50), (640, 528));
    }

    #[test]
    fn test_snapping_bands() {
        assert_eq!(snap(256, 201, 60), (256, 224));
        assert_eq!(snap(256, 223, 60), (256, 224));
        assert_eq!(snap(256, 225, 60), (256, 240));
        assert_eq!(snap(256, 239, 60), (256, 240));
        assert_eq!(snap(256, 241, 60), (256, 254));
        assert_eq!(snap(256, 254, 60), (256, 254));
        assert_eq!(snap(256, 255, 60), (256, 255));
        assert_eq!(snap(256, 241, 55), (256, 254));
        assert_eq!(snap(256, 240, 55), (256, 254));
    }

    #[test]
    fn test_notifications_follow_rewrites() {
        // menu: rewritten first, then the tall rule sees the new height
        assert_eq!(notifications(256, 4, 60), vec![(320, 240), (320, 240)]);
        // short: notified before raising to 200, nothing after
        assert_eq!(notifications(256, 150, 60), vec![(256, 150)]);
        // tall, then snap-224 notifies before its rewrite
        assert_eq!(notifications(256, 210, 60), vec![(256, 210), (256, 210)]);
        // pal doubling notifies with the doubled height
        assert_eq!(notifications(160, 144, 50), vec![(160, 288)]);
        // 55 Hz band: tall, snap-254, then snap-254-55hz on the rewritten height
        assert_eq!(
            notifications(256, 241, 55),
            vec![(256, 241), (256, 241), (256, 254)]
        );
        assert!(notifications(256, 200, 60).is_empty());
    }
}
