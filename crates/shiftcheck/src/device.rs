use crate::{
    RuntimeErrorCode,
    signal::{PortDecl, SignalRef, SignalTable},
};

mod shift_register;

pub use shift_register::{ShiftRegisterDevice, ShiftTrigger};

/// A unit under test that can be driven by a [`Simulation`](crate::Simulation).
///
/// The kernel owns the port values. A device declares its ports once,
/// resolves the handles it needs in [`Device::bind`], and is re-evaluated
/// every time any port value changes.
pub trait Device {
    fn ports(&self) -> Vec<PortDecl>;

    fn bind(&mut self, signals: &SignalTable) -> Result<(), RuntimeErrorCode>;

    /// Reacts to the difference between the previous settled values and the
    /// current ones. Edge-sensitive logic should use [`DeviceContext::rose`]
    /// and friends.
    fn evaluate(&mut self, ctx: &mut DeviceContext<'_>) -> Result<(), RuntimeErrorCode>;

    /// Elaboration-time parameter lookup (e.g. `SR_LEN`).
    fn parameter(&self, _name: &str) -> Option<u64> {
        None
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn ports(&self) -> Vec<PortDecl> {
        (**self).ports()
    }

    fn bind(&mut self, signals: &SignalTable) -> Result<(), RuntimeErrorCode> {
        (**self).bind(signals)
    }

    fn evaluate(&mut self, ctx: &mut DeviceContext<'_>) -> Result<(), RuntimeErrorCode> {
        (**self).evaluate(ctx)
    }

    fn parameter(&self, name: &str) -> Option<u64> {
        (**self).parameter(name)
    }
}

/// View of the port values handed to [`Device::evaluate`].
pub struct DeviceContext<'a> {
    pub(crate) signals: &'a mut SignalTable,
    pub(crate) previous: &'a [u64],
}

impl DeviceContext<'_> {
    pub fn get(&self, signal: SignalRef) -> u64 {
        self.signals.get(signal)
    }

    pub fn bit(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        self.signals.get_bit(signal, bit)
    }

    pub fn previous_bit(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        // Range check against the declared width.
        self.signals.get_bit(signal, bit)?;
        Ok((self.previous[signal.id] >> bit) & 1 == 1)
    }

    pub fn rose(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        Ok(!self.previous_bit(signal, bit)? && self.bit(signal, bit)?)
    }

    pub fn fell(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        Ok(self.previous_bit(signal, bit)? && !self.bit(signal, bit)?)
    }

    pub fn toggled(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        Ok(self.previous_bit(signal, bit)? != self.bit(signal, bit)?)
    }

    pub fn drive(&mut self, signal: SignalRef, value: u64) -> Result<(), RuntimeErrorCode> {
        self.signals.set(signal, value)
    }

    pub fn drive_bit(
        &mut self,
        signal: SignalRef,
        bit: usize,
        value: bool,
    ) -> Result<(), RuntimeErrorCode> {
        self.signals.set_bit(signal, bit, value)
    }
}
