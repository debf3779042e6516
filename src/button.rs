use crate::hsm::GestureEngine;
use crate::listener::{ButtonStatus, OnClickListener, OnDoubleClickListener, OnPressListener};
use crate::source::{AnalogSource, DigitalSource, SignalSource};
use crate::types::{ButtonId, GestureEvent};

/// One monitored input: a signal source plus the gesture engine plus at most
/// one listener per event category.
///
/// Not `Clone`: copying mid-gesture would duplicate timestamps and
/// desynchronize the per-episode notification flags.
pub struct Button<'l, S> {
    id: ButtonId,
    source: S,
    engine: GestureEngine,
    on_click: Option<&'l dyn OnClickListener>,
    on_double_click: Option<&'l dyn OnDoubleClickListener>,
    on_press: Option<&'l dyn OnPressListener>,
}

/// Button on a digital input pin.
pub type DigitalButton<'l, P> = Button<'l, DigitalSource<P>>;

/// Button matched against an analog reading, e.g. one rung of a resistor
/// ladder.
pub type AnalogButton<'l, R> = Button<'l, AnalogSource<R>>;

/// Sensors behave identically to their button counterparts; the distinction
/// is naming only.
pub type DigitalSensor<'l, P> = DigitalButton<'l, P>;
pub type AnalogSensor<'l, R> = AnalogButton<'l, R>;

impl<'l, S> Button<'l, S>
where
    S: SignalSource,
{
    pub fn new(id: ButtonId, source: S) -> Self {
        Self {
            id,
            source,
            engine: GestureEngine::new(),
            on_click: None,
            on_double_click: None,
            on_press: None,
        }
    }

    /// Advance the gesture machine by one sample and dispatch any resulting
    /// events. Call this from the owner's polling loop at a rate well above
    /// the shortest configured threshold (every few milliseconds).
    ///
    /// Listeners run synchronously before this returns and must not call
    /// `tick` on the same button re-entrantly.
    pub fn tick(&mut self, now_ms: u64) {
        let active = self.source.is_active();
        let events = self.engine.tick(now_ms, active);
        for event in events.iter() {
            log::debug!("button {}: {:?}", self.id, event);
            self.dispatch(event);
        }
    }

    fn dispatch(&self, event: GestureEvent) {
        match event {
            GestureEvent::Press => {
                if let Some(listener) = self.on_press {
                    listener.on_press(self);
                }
            }
            GestureEvent::Release => {
                if let Some(listener) = self.on_press {
                    listener.on_release(self);
                }
            }
            GestureEvent::LongPressStart => {
                if let Some(listener) = self.on_press {
                    listener.on_long_press_start(self);
                }
            }
            GestureEvent::LongPressEnd => {
                if let Some(listener) = self.on_press {
                    listener.on_long_press_end(self);
                }
            }
            GestureEvent::Click => {
                if let Some(listener) = self.on_click {
                    listener.on_click(self);
                }
            }
            GestureEvent::DoubleClick => {
                if let Some(listener) = self.on_double_click {
                    listener.on_double_click(self);
                }
            }
        }
    }

    /// Force Idle, clear timing state, restore default thresholds.
    /// Registered listeners are kept.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn is_pressed(&self) -> bool {
        self.engine.is_pressed()
    }

    pub fn is_long_pressed(&self) -> bool {
        self.engine.is_long_pressed()
    }

    pub fn set_debounce_ticks(&mut self, ms: u64) {
        self.engine.set_debounce_ticks(ms);
    }

    pub fn set_click_ticks(&mut self, ms: u64) {
        self.engine.set_click_ticks(ms);
    }

    pub fn set_long_press_ticks(&mut self, ms: u64) {
        self.engine.set_long_press_ticks(ms);
    }

    /// Register the click listener; replaces any previous one, `None`
    /// unregisters. An event with no listener is silently dropped.
    pub fn set_on_click_listener(&mut self, listener: Option<&'l dyn OnClickListener>) {
        self.on_click = listener;
    }

    pub fn set_on_double_click_listener(
        &mut self,
        listener: Option<&'l dyn OnDoubleClickListener>,
    ) {
        self.on_double_click = listener;
    }

    pub fn set_on_press_listener(&mut self, listener: Option<&'l dyn OnPressListener>) {
        self.on_press = listener;
    }

    /// Access to variant-specific knobs: logic inversion on digital sources,
    /// voltage margin on analog ones.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<'l, S> ButtonStatus for Button<'l, S>
where
    S: SignalSource,
{
    fn id(&self) -> ButtonId {
        self.id
    }

    fn is_pressed(&self) -> bool {
        self.engine.is_pressed()
    }

    fn is_long_pressed(&self) -> bool {
        self.engine.is_long_pressed()
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[derive(Default)]
    struct CountingListener {
        clicks: Cell<u32>,
        double_clicks: Cell<u32>,
        presses: Cell<u32>,
        releases: Cell<u32>,
        long_press_starts: Cell<u32>,
        long_press_ends: Cell<u32>,
        last_id: Cell<Option<ButtonId>>,
    }

    impl OnClickListener for CountingListener {
        fn on_click(&self, button: &dyn ButtonStatus) {
            self.clicks.set(self.clicks.get() + 1);
            self.last_id.set(Some(button.id()));
        }
    }

    impl OnDoubleClickListener for CountingListener {
        fn on_double_click(&self, button: &dyn ButtonStatus) {
            self.double_clicks.set(self.double_clicks.get() + 1);
            self.last_id.set(Some(button.id()));
        }
    }

    impl OnPressListener for CountingListener {
        fn on_press(&self, button: &dyn ButtonStatus) {
            self.presses.set(self.presses.get() + 1);
            self.last_id.set(Some(button.id()));
        }

        fn on_release(&self, button: &dyn ButtonStatus) {
            self.releases.set(self.releases.get() + 1);
            self.last_id.set(Some(button.id()));
        }

        fn on_long_press_start(&self, button: &dyn ButtonStatus) {
            self.long_press_starts.set(self.long_press_starts.get() + 1);
            // The long-press flag is observable from inside the callback.
            assert!(button.is_long_pressed());
        }

        fn on_long_press_end(&self, button: &dyn ButtonStatus) {
            self.long_press_ends.set(self.long_press_ends.get() + 1);
            assert!(!button.is_pressed());
        }
    }

    #[test]
    fn click_notifies_each_registered_listener_once() {
        let mock = CountingListener::default();
        let level = Cell::new(false);
        let mut button = Button::new(7, || level.get());
        button.set_on_click_listener(Some(&mock));
        button.set_on_double_click_listener(Some(&mock));
        button.set_on_press_listener(Some(&mock));

        level.set(true);
        button.tick(0);
        button.tick(51);
        level.set(false);
        button.tick(60);
        button.tick(320);
        button.tick(400);

        assert_eq!(mock.presses.get(), 1);
        assert_eq!(mock.releases.get(), 1);
        assert_eq!(mock.clicks.get(), 1);
        assert_eq!(mock.double_clicks.get(), 0);
        assert_eq!(mock.long_press_starts.get(), 0);
        assert_eq!(mock.long_press_ends.get(), 0);
    }

    #[test]
    fn double_click_notifies_double_click_listener_only() {
        let mock = CountingListener::default();
        let level = Cell::new(false);
        let mut button = Button::new(7, || level.get());
        button.set_on_click_listener(Some(&mock));
        button.set_on_double_click_listener(Some(&mock));
        button.set_on_press_listener(Some(&mock));

        level.set(true);
        button.tick(0);
        button.tick(51);
        level.set(false);
        button.tick(100);
        level.set(true);
        button.tick(151);
        level.set(false);
        button.tick(210);
        button.tick(300);

        assert_eq!(mock.presses.get(), 1);
        assert_eq!(mock.releases.get(), 1);
        assert_eq!(mock.clicks.get(), 0);
        assert_eq!(mock.double_clicks.get(), 1);
    }

    #[test]
    fn long_press_notifies_start_and_end_without_click() {
        let mock = CountingListener::default();
        let level = Cell::new(false);
        let mut button = Button::new(7, || level.get());
        button.set_on_click_listener(Some(&mock));
        button.set_on_double_click_listener(Some(&mock));
        button.set_on_press_listener(Some(&mock));

        level.set(true);
        button.tick(0);
        button.tick(600);
        assert!(button.is_long_pressed());
        level.set(false);
        button.tick(650);
        button.tick(651);

        assert_eq!(mock.presses.get(), 1);
        assert_eq!(mock.releases.get(), 1);
        assert_eq!(mock.long_press_starts.get(), 1);
        assert_eq!(mock.long_press_ends.get(), 1);
        assert_eq!(mock.clicks.get(), 0);
        assert_eq!(mock.double_clicks.get(), 0);
    }

    #[test]
    fn events_without_a_listener_are_silently_dropped() {
        let level = Cell::new(false);
        let mut button = Button::new(7, || level.get());

        level.set(true);
        button.tick(0);
        button.tick(51);
        level.set(false);
        button.tick(60);
        button.tick(320);
        // No listener registered for any category; nothing to observe, no
        // panic either.
        assert!(!button.is_pressed());
    }

    #[test]
    fn unregistering_a_listener_stops_notifications() {
        let mock = CountingListener::default();
        let level = Cell::new(false);
        let mut button = Button::new(7, || level.get());
        button.set_on_click_listener(Some(&mock));
        button.set_on_click_listener(None);

        level.set(true);
        button.tick(0);
        button.tick(51);
        level.set(false);
        button.tick(60);
        button.tick(320);

        assert_eq!(mock.clicks.get(), 0);
    }

    #[test]
    fn one_listener_serves_two_buttons_by_id() {
        let mock = CountingListener::default();

        let level_a = Cell::new(false);
        let mut button_a = Button::new(3, || level_a.get());
        button_a.set_on_click_listener(Some(&mock));

        let level_b = Cell::new(false);
        let mut button_b = Button::new(9, || level_b.get());
        button_b.set_on_click_listener(Some(&mock));

        level_b.set(true);
        button_b.tick(0);
        button_b.tick(51);
        level_b.set(false);
        button_b.tick(60);
        button_b.tick(320);

        assert_eq!(mock.clicks.get(), 1);
        assert_eq!(mock.last_id.get(), Some(9));

        level_a.set(true);
        button_a.tick(1_000);
        button_a.tick(1_051);
        level_a.set(false);
        button_a.tick(1_060);
        button_a.tick(1_320);

        assert_eq!(mock.clicks.get(), 2);
        assert_eq!(mock.last_id.get(), Some(3));
    }

    #[test]
    fn reset_rearms_the_machine_and_keeps_listeners() {
        let mock = CountingListener::default();
        let level = Cell::new(false);
        let mut button = Button::new(7, || level.get());
        button.set_on_click_listener(Some(&mock));
        button.set_on_press_listener(Some(&mock));

        level.set(true);
        button.tick(0);
        assert!(button.is_pressed());
        button.reset();
        assert!(!button.is_pressed());
        level.set(false);

        // A fresh gesture after reset still reaches the listeners.
        level.set(true);
        button.tick(1_000);
        button.tick(1_051);
        level.set(false);
        button.tick(1_060);
        button.tick(1_320);

        assert_eq!(mock.presses.get(), 1);
        assert_eq!(mock.clicks.get(), 1);
    }
}
