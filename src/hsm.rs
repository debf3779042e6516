use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::config::GestureConfig;
use crate::types::{EventBuffer, GestureEvent};

#[derive(Clone, Copy, Debug)]
enum GestureHsmEvent {
    Sample { now_ms: u64, active: bool },
}

/// Carries the active thresholds into the state handlers and the emitted
/// events back out of them, one instance per tick.
struct DispatchContext {
    config: GestureConfig,
    events: EventBuffer,
}

impl DispatchContext {
    fn new(config: GestureConfig) -> Self {
        Self {
            config,
            events: EventBuffer::new(),
        }
    }
}

/// Debounce and gesture state machine for one monitored input.
///
/// The engine owns no clock and no signal: the caller samples both and feeds
/// them in through [`tick`](GestureEngine::tick), at a rate well above the
/// shortest configured threshold (typically every few milliseconds).
pub struct GestureEngine {
    machine: statig::blocking::StateMachine<GestureHsm>,
    config: GestureConfig,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureEngine {
    pub fn new() -> Self {
        Self {
            machine: GestureHsm::new().state_machine(),
            config: GestureConfig::default(),
        }
    }

    /// Advance the machine by one sample and return the events it emitted.
    ///
    /// `now_ms` is a monotonic millisecond counter. Elapsed times use
    /// wrapping subtraction, so a press straddling the counter wrap yields
    /// one spurious short-duration artifact rather than a stall.
    pub fn tick(&mut self, now_ms: u64, active: bool) -> EventBuffer {
        let mut context = DispatchContext::new(self.config);
        self.machine
            .handle_with_context(&GestureHsmEvent::Sample { now_ms, active }, &mut context);
        context.events
    }

    /// Force Idle, clear timing state and flags, restore default thresholds.
    pub fn reset(&mut self) {
        self.machine = GestureHsm::new().state_machine();
        self.config = GestureConfig::default();
    }

    /// True while the machine is in its pressed state, independent of the
    /// long-press flag. Holds from the (not yet debounced) press edge until
    /// release.
    pub fn is_pressed(&self) -> bool {
        matches!(self.machine.inner().state_id, GestureStateId::Pressed)
    }

    /// True once the current press has been held past the long-press
    /// threshold, until release.
    pub fn is_long_pressed(&self) -> bool {
        self.is_pressed() && self.machine.inner().long_press_active
    }

    pub fn config(&self) -> GestureConfig {
        self.config
    }

    pub fn set_debounce_ticks(&mut self, ms: u64) {
        self.config.debounce_ms = ms;
    }

    pub fn set_click_ticks(&mut self, ms: u64) {
        self.config.click_ms = ms;
    }

    pub fn set_long_press_ticks(&mut self, ms: u64) {
        self.config.long_press_ms = ms;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GestureStateId {
    Idle,
    Pressed,
    Released,
    DoublePending,
}

struct GestureHsm {
    /// Mirror of the active state, kept in shared storage so the engine can
    /// answer queries without consuming an event.
    state_id: GestureStateId,
    pressed_at_ms: u64,
    released_at_ms: u64,
    long_press_active: bool,
    press_notified: bool,
}

impl GestureHsm {
    fn new() -> Self {
        Self {
            state_id: GestureStateId::Idle,
            pressed_at_ms: 0,
            released_at_ms: 0,
            long_press_active: false,
            press_notified: false,
        }
    }

    fn since_press(&self, now_ms: u64) -> u64 {
        now_ms.wrapping_sub(self.pressed_at_ms)
    }

    fn since_release(&self, now_ms: u64) -> u64 {
        now_ms.wrapping_sub(self.released_at_ms)
    }

    fn begin_press(&mut self, now_ms: u64) {
        self.pressed_at_ms = now_ms;
        // A new episode starts with a clean long-press flag; a prior episode
        // can leave it set when its long-press-end notification was skipped
        // by an immediate re-press.
        self.long_press_active = false;
        self.state_id = GestureStateId::Pressed;
    }

    fn emit(context: &mut DispatchContext, event: GestureEvent) {
        context.events.push(event);
    }
}

#[state_machine(initial = "State::idle()")]
impl GestureHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &GestureHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            GestureHsmEvent::Sample { now_ms, active } => {
                if *active {
                    self.begin_press(*now_ms);
                    return Transition(State::pressed());
                }
                Handled
            }
        }
    }

    #[state]
    fn pressed(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Sample { now_ms, active } => {
                let elapsed = self.since_press(*now_ms);
                if *active {
                    if elapsed > context.config.debounce_ms && !self.press_notified {
                        self.press_notified = true;
                        Self::emit(context, GestureEvent::Press);
                    }
                    if elapsed > context.config.long_press_ms && !self.long_press_active {
                        self.long_press_active = true;
                        Self::emit(context, GestureEvent::LongPressStart);
                    }
                    return Handled;
                }

                self.released_at_ms = *now_ms;
                if elapsed <= context.config.debounce_ms {
                    log::trace!("press shorter than debounce window, discarded as noise");
                    self.state_id = GestureStateId::Idle;
                    return Transition(State::idle());
                }

                self.press_notified = false;
                Self::emit(context, GestureEvent::Release);
                self.state_id = GestureStateId::Released;
                Transition(State::released())
            }
        }
    }

    /// Holding state that defers the click/double-click decision: a release
    /// alone is ambiguous until either a second press arrives or enough
    /// inactive time rules one out.
    #[state]
    fn released(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Sample { now_ms, active } => {
                if *active {
                    // Debounce applies to the release-to-second-press gap as
                    // well; chatter right after release stays in this state.
                    if self.since_release(*now_ms) > context.config.debounce_ms {
                        self.pressed_at_ms = *now_ms;
                        self.long_press_active = false;
                        self.state_id = GestureStateId::DoublePending;
                        return Transition(State::double_pending());
                    }
                    return Handled;
                }

                let elapsed = self.since_press(*now_ms);
                if elapsed > context.config.long_press_ms {
                    self.long_press_active = false;
                    Self::emit(context, GestureEvent::LongPressEnd);
                    self.state_id = GestureStateId::Idle;
                    return Transition(State::idle());
                }
                if elapsed > context.config.click_ms {
                    Self::emit(context, GestureEvent::Click);
                    self.state_id = GestureStateId::Idle;
                    return Transition(State::idle());
                }
                Handled
            }
        }
    }

    #[state]
    fn double_pending(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Sample { now_ms, active } => {
                if !*active && self.since_press(*now_ms) > context.config.debounce_ms {
                    Self::emit(context, GestureEvent::DoubleClick);
                    self.state_id = GestureStateId::Idle;
                    return Transition(State::idle());
                }
                Handled
            }
        }
    }
}
