use embedded_hal::digital::InputPin;

/// Default tolerance around the analog target reading, in ADC counts.
pub const DEFAULT_VOLTAGE_MARGIN: u16 = 50;

/// The one capability every signal variant exposes: is the monitored input
/// currently in its active condition? Evaluated fresh on every tick.
pub trait SignalSource {
    fn is_active(&mut self) -> bool;
}

/// Closures stand in for a source directly, for test doubles and ad-hoc
/// reads that do not go through a HAL pin type.
impl<F> SignalSource for F
where
    F: FnMut() -> bool,
{
    fn is_active(&mut self) -> bool {
        self()
    }
}

/// Digital input compared against a fixed active level.
///
/// With pull-up wiring the pressed level is low, with pull-down wiring it is
/// high. The caller keeps responsibility for configuring the pin (input
/// mode, pull resistor) before wrapping it.
pub struct DigitalSource<P> {
    pin: P,
    active_low: bool,
}

impl<P> DigitalSource<P>
where
    P: InputPin,
{
    pub fn new(pin: P, pull_up: bool) -> Self {
        Self {
            pin,
            active_low: pull_up,
        }
    }

    /// Flip the active level at runtime, e.g. for a normally-closed switch.
    pub fn invert_input_logic(&mut self) {
        self.active_low = !self.active_low;
    }

    /// True while the active level is low. Pull-up wiring starts inverted.
    pub fn is_input_logic_inverted(&self) -> bool {
        self.active_low
    }
}

impl<P> SignalSource for DigitalSource<P>
where
    P: InputPin,
{
    fn is_active(&mut self) -> bool {
        // A failed pin read counts as inactive; the core has no error channel.
        if self.active_low {
            self.pin.is_low().unwrap_or(false)
        } else {
            self.pin.is_high().unwrap_or(false)
        }
    }
}

/// Analog input compared against a target reading with a tolerance margin.
///
/// Several buttons on a resistor ladder can share one ADC pin; each instance
/// matches its own target value. The reader is a plain closure since
/// blocking ADC access has no common trait across HALs.
pub struct AnalogSource<R> {
    read: R,
    target: u16,
    margin: u16,
}

impl<R> AnalogSource<R>
where
    R: FnMut() -> u16,
{
    pub fn new(read: R, target: u16) -> Self {
        Self {
            read,
            target,
            margin: DEFAULT_VOLTAGE_MARGIN,
        }
    }

    pub fn set_voltage_margin(&mut self, margin: u16) {
        self.margin = margin;
    }
}

impl<R> SignalSource for AnalogSource<R>
where
    R: FnMut() -> u16,
{
    fn is_active(&mut self) -> bool {
        (self.read)().abs_diff(self.target) < self.margin
    }
}
