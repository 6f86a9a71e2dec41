use crate::{HashMap, RuntimeErrorCode};
use serde::{Deserialize, Serialize};

/// Maximum width of a single bus. Values are stored as `u64`.
pub const MAX_WIDTH: usize = 64;

/// A resolved handle to a named bus of the simulated device.
///
/// Handles are cheap to copy and stay valid for the lifetime of the
/// [`Simulation`](crate::Simulation) that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalRef {
    pub(crate) id: usize,
}

impl SignalRef {
    pub fn id(&self) -> usize {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

/// Declaration of a device port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    pub name: String,
    pub width: usize,
    pub direction: PortDirection,
}

impl PortDecl {
    pub fn input(name: &str, width: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
            direction: PortDirection::Input,
        }
    }

    pub fn output(name: &str, width: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
            direction: PortDirection::Output,
        }
    }
}

pub(crate) fn mask(width: usize) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Current values of every port, indexed by [`SignalRef`].
///
/// Handles are plain indices. Accessors that take a [`SignalRef`] expect one
/// issued by this table; a handle from another simulation may name a
/// different port or fall outside the table.
#[derive(Debug, Clone)]
pub struct SignalTable {
    names: HashMap<String, usize>,
    decls: Vec<PortDecl>,
    values: Vec<u64>,
}

impl SignalTable {
    pub(crate) fn new(ports: Vec<PortDecl>) -> Result<Self, RuntimeErrorCode> {
        let mut names = HashMap::default();
        for (id, decl) in ports.iter().enumerate() {
            if decl.width == 0 || decl.width > MAX_WIDTH {
                return Err(RuntimeErrorCode::InvalidWidth {
                    signal: decl.name.clone(),
                    width: decl.width,
                });
            }
            if names.insert(decl.name.clone(), id).is_some() {
                return Err(RuntimeErrorCode::DuplicatePort(decl.name.clone()));
            }
        }
        let values = vec![0; ports.len()];
        Ok(Self {
            names,
            decls: ports,
            values,
        })
    }

    /// Resolves a port name into a [`SignalRef`].
    pub fn resolve(&self, name: &str) -> Result<SignalRef, RuntimeErrorCode> {
        self.names
            .get(name)
            .map(|&id| SignalRef { id })
            .ok_or_else(|| RuntimeErrorCode::UnknownSignal(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Declaration of the port behind `signal`.
    ///
    /// # Panics
    ///
    /// Panics if `signal` was not issued by this table and lies past its end.
    pub fn decl(&self, signal: SignalRef) -> &PortDecl {
        &self.decls[signal.id]
    }

    /// # Panics
    ///
    /// Same as [`SignalTable::decl`].
    pub fn name(&self, signal: SignalRef) -> &str {
        &self.decls[signal.id].name
    }

    /// # Panics
    ///
    /// Same as [`SignalTable::decl`].
    pub fn width(&self, signal: SignalRef) -> usize {
        self.decls[signal.id].width
    }

    /// Current value of the whole bus.
    ///
    /// # Panics
    ///
    /// Panics if `signal` was not issued by this table and lies past its end.
    pub fn get(&self, signal: SignalRef) -> u64 {
        self.values[signal.id]
    }

    pub fn get_bit(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        self.check_bit(signal, bit)?;
        Ok((self.values[signal.id] >> bit) & 1 == 1)
    }

    /// Drives the whole bus. Fails if `value` does not fit in the bus width.
    pub fn set(&mut self, signal: SignalRef, value: u64) -> Result<(), RuntimeErrorCode> {
        let width = self.width(signal);
        if value & !mask(width) != 0 {
            return Err(RuntimeErrorCode::ValueTooWide {
                signal: self.name(signal).to_string(),
                width,
                value,
            });
        }
        self.values[signal.id] = value;
        Ok(())
    }

    /// Read-modify-write of a single bit; the other bits keep their value.
    pub fn set_bit(
        &mut self,
        signal: SignalRef,
        bit: usize,
        value: bool,
    ) -> Result<(), RuntimeErrorCode> {
        self.check_bit(signal, bit)?;
        let current = self.values[signal.id];
        self.values[signal.id] = if value {
            current | (1 << bit)
        } else {
            current & !(1 << bit)
        };
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Vec<u64> {
        self.values.clone()
    }

    pub(crate) fn values(&self) -> &[u64] {
        &self.values
    }

    fn check_bit(&self, signal: SignalRef, bit: usize) -> Result<(), RuntimeErrorCode> {
        let width = self.width(signal);
        if bit >= width {
            return Err(RuntimeErrorCode::BitOutOfRange {
                signal: self.name(signal).to_string(),
                bit,
                width,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SignalTable {
        SignalTable::new(vec![
            PortDecl::input("clk", 1),
            PortDecl::input("ui_in", 8),
            PortDecl::output("uo_out", 8),
        ])
        .unwrap()
    }

    #[test]
    fn set_bit_preserves_other_bits() {
        let mut t = table();
        let ui = t.resolve("ui_in").unwrap();
        t.set(ui, 0b1010_0101).unwrap();
        t.set_bit(ui, 1, true).unwrap();
        assert_eq!(t.get(ui), 0b1010_0111);
        t.set_bit(ui, 7, false).unwrap();
        assert_eq!(t.get(ui), 0b0010_0111);
        assert!(t.get_bit(ui, 0).unwrap());
        assert!(!t.get_bit(ui, 3).unwrap());
    }

    #[test]
    fn rejects_values_wider_than_bus() {
        let mut t = table();
        let clk = t.resolve("clk").unwrap();
        assert!(matches!(
            t.set(clk, 2),
            Err(RuntimeErrorCode::ValueTooWide { width: 1, value: 2, .. })
        ));
        assert!(matches!(
            t.set_bit(clk, 1, true),
            Err(RuntimeErrorCode::BitOutOfRange { bit: 1, width: 1, .. })
        ));
    }

    #[test]
    fn rejects_bad_declarations() {
        assert!(matches!(
            SignalTable::new(vec![PortDecl::input("a", 0)]),
            Err(RuntimeErrorCode::InvalidWidth { width: 0, .. })
        ));
        assert!(matches!(
            SignalTable::new(vec![PortDecl::input("a", 1), PortDecl::output("a", 1)]),
            Err(RuntimeErrorCode::DuplicatePort(_))
        ));
        assert!(matches!(
            table().resolve("nope"),
            Err(RuntimeErrorCode::UnknownSignal(_))
        ));
    }

    #[test]
    #[should_panic]
    fn foreign_handle_past_the_table_panics() {
        let t = table();
        t.width(SignalRef { id: 99 });
    }

    #[test]
    fn full_width_bus_accepts_all_ones() {
        let mut t = SignalTable::new(vec![PortDecl::input("wide", 64)]).unwrap();
        let wide = t.resolve("wide").unwrap();
        t.set(wide, u64::MAX).unwrap();
        assert!(t.get_bit(wide, 63).unwrap());
    }
}
