use super::{Device, DeviceContext};
use crate::{
    RuntimeErrorCode,
    harness::{ConfigError, PortNames, ResetPolarity},
    signal::{PortDecl, SignalRef, SignalTable},
};
use serde::{Deserialize, Serialize};

const BUS_WIDTH: usize = 8;

/// What advances the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftTrigger {
    /// Rising edge of `clk`.
    Clock,
    /// Any transition of the given `ui_in` bit.
    Strobe { bit: usize },
}

#[derive(Debug, Clone, Copy)]
struct BoundPorts {
    clk: SignalRef,
    rst: SignalRef,
    ui_in: SignalRef,
    uo_out: SignalRef,
}

/// Behavioural model of the `SR_LEN`-stage serial shift register design.
///
/// Ports follow the Tiny Tapeout convention: `clk`, `rst_n`, an 8-bit
/// `ui_in` (bit 0 = serial data) and an 8-bit `uo_out` (bit 0 = serial
/// output). The output is registered behind the last stage, so data
/// presented at shift `k` appears on `uo_out[0]` after shift `k + SR_LEN`.
#[derive(Debug, Clone)]
pub struct ShiftRegisterDevice {
    stages: Vec<bool>,
    out: bool,
    trigger: ShiftTrigger,
    polarity: ResetPolarity,
    data_bit: usize,
    output_bit: usize,
    names: PortNames,
    ports: Option<BoundPorts>,
}

impl ShiftRegisterDevice {
    pub fn new(sr_len: usize) -> Result<Self, ConfigError> {
        if sr_len == 0 {
            return Err(ConfigError::new(
                "SR_LEN",
                "a shift register needs at least one stage",
            ));
        }
        Ok(Self {
            stages: vec![false; sr_len],
            out: false,
            trigger: ShiftTrigger::Clock,
            polarity: ResetPolarity::ActiveLow,
            data_bit: 0,
            output_bit: 0,
            names: PortNames::default(),
            ports: None,
        })
    }

    pub fn with_trigger(mut self, trigger: ShiftTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_reset_polarity(mut self, polarity: ResetPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Moves serial data and serial output off bit 0 of their buses.
    pub fn with_bits(mut self, data_bit: usize, output_bit: usize) -> Self {
        self.data_bit = data_bit;
        self.output_bit = output_bit;
        self
    }

    pub fn with_port_names(mut self, names: PortNames) -> Self {
        self.names = names;
        self
    }

    pub fn sr_len(&self) -> usize {
        self.stages.len()
    }

    fn shift(&mut self, din: bool) {
        let last = self.stages.len() - 1;
        self.out = self.stages[last];
        self.stages.copy_within(0..last, 1);
        self.stages[0] = din;
    }
}

impl Device for ShiftRegisterDevice {
    fn ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::input(&self.names.clock, 1),
            PortDecl::input(&self.names.reset, 1),
            PortDecl::input(&self.names.input, BUS_WIDTH),
            PortDecl::output(&self.names.output, BUS_WIDTH),
        ]
    }

    fn bind(&mut self, signals: &SignalTable) -> Result<(), RuntimeErrorCode> {
        let ports = BoundPorts {
            clk: signals.resolve(&self.names.clock)?,
            rst: signals.resolve(&self.names.reset)?,
            ui_in: signals.resolve(&self.names.input)?,
            uo_out: signals.resolve(&self.names.output)?,
        };
        // Range checks against the bus widths.
        if let ShiftTrigger::Strobe { bit } = self.trigger {
            signals.get_bit(ports.ui_in, bit)?;
        }
        signals.get_bit(ports.ui_in, self.data_bit)?;
        signals.get_bit(ports.uo_out, self.output_bit)?;
        self.ports = Some(ports);
        Ok(())
    }

    fn evaluate(&mut self, ctx: &mut DeviceContext<'_>) -> Result<(), RuntimeErrorCode> {
        let p = self
            .ports
            .ok_or_else(|| RuntimeErrorCode::Unbound("shift_register".to_string()))?;

        if ctx.bit(p.rst, 0)? == self.polarity.active_level() {
            self.stages.iter_mut().for_each(|s| *s = false);
            self.out = false;
        } else {
            let fire = match self.trigger {
                ShiftTrigger::Clock => ctx.rose(p.clk, 0)?,
                ShiftTrigger::Strobe { bit } => ctx.toggled(p.ui_in, bit)?,
            };
            if fire {
                let din = ctx.bit(p.ui_in, self.data_bit)?;
                self.shift(din);
            }
        }
        ctx.drive(p.uo_out, u64::from(self.out) << self.output_bit)
    }

    fn parameter(&self, name: &str) -> Option<u64> {
        match name {
            "SR_LEN" => Some(self.stages.len() as u64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lags_input_by_sr_len_shifts() {
        let mut dev = ShiftRegisterDevice::new(3).unwrap();
        let outs: Vec<bool> = [true, false, false, false, false]
            .into_iter()
            .map(|din| {
                dev.shift(din);
                dev.out
            })
            .collect();
        assert_eq!(outs, vec![false, false, false, true, false]);
    }

    #[test]
    fn reports_sr_len_parameter() {
        let dev = ShiftRegisterDevice::new(448).unwrap();
        assert_eq!(dev.parameter("SR_LEN"), Some(448));
        assert_eq!(dev.parameter("WIDTH"), None);
        assert!(ShiftRegisterDevice::new(0).is_err());
    }
}
