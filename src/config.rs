/// Milliseconds that have to pass before a press is trusted as a user
/// action rather than electrical noise.
pub const DEFAULT_DEBOUNCE_TICKS_MS: u64 = 50;

/// Milliseconds of inactivity after a release before a click is confirmed;
/// also the window in which a second press still counts toward a
/// double-click.
pub const DEFAULT_CLICK_TICKS_MS: u64 = 250;

/// Milliseconds a press has to be held before it counts as a long press.
pub const DEFAULT_LONG_PRESS_TICKS_MS: u64 = 500;

/// Timing thresholds for gesture detection.
///
/// Values are not validated. The recommended ordering is
/// `debounce_ms < click_ms < long_press_ms`; violating it degrades
/// detection (a click can be suppressed, a long press delayed) but every
/// tick still produces a defined next state. Changes take effect on the
/// next tick, including mid-gesture.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GestureConfig {
    pub debounce_ms: u64,
    pub click_ms: u64,
    pub long_press_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_TICKS_MS,
            click_ms: DEFAULT_CLICK_TICKS_MS,
            long_press_ms: DEFAULT_LONG_PRESS_TICKS_MS,
        }
    }
}
