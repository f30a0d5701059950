//! The pieces that make up the address space: the [`Component`] contract every memory-mapped
//! device implements, the [`Bus`] that dispatches between them, and the simple storage devices.

mod boot;
pub mod io;
pub mod map;
pub mod mbc;
mod ram;

pub use boot::*;
pub use ram::*;

/// Returned by a read that no component answers.
pub const OPEN_BUS: u8 = 0xFF;

/// A device that owns part of the 16-bit address space.
///
/// Reads return `None` for addresses the device does not map. Writes are broadcast to everyone on
/// the bus, so implementors must silently ignore addresses they do not map.
pub trait Component {
    fn read(&self, address: u16) -> Option<u8>;

    fn write(&mut self, address: u16, data: u8);
}

/// A device that is advanced by the master clock. `bus` is a view of every *other* component, so a
/// device only goes through it for addresses it does not own.
pub trait Clocked {
    fn cycle<M: MemoryLike + ?Sized>(&mut self, cycle: u64, bus: &mut M);
}

/// A view of the full address space. Unlike a [`Component`], every read produces a byte.
pub trait MemoryLike {
    fn read_byte(&self, address: u16) -> u8;

    fn write_byte(&mut self, address: u16, data: u8);
}

/// Any ordered set of components is itself a full view of memory: the first component to answer
/// a read wins, and writes go to all of them.
impl<'a, 'b> MemoryLike for [&'a mut (dyn Component + 'b)] {
    fn read_byte(&self, address: u16) -> u8 {
        self.iter()
            .find_map(|c| c.read(address))
            .unwrap_or(OPEN_BUS)
    }

    fn write_byte(&mut self, address: u16, data: u8) {
        self.iter_mut().for_each(|c| c.write(address, data));
    }
}

/// The shared bus: an ordered list of components, queried in attachment order.
#[derive(Default)]
pub struct Bus {
    components: Vec<Box<dyn Component>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, component: impl Component + 'static) {
        self.components.push(Box::new(component));
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Component for Bus {
    fn read(&self, address: u16) -> Option<u8> {
        self.components.iter().find_map(|c| c.read(address))
    }

    fn write(&mut self, address: u16, data: u8) {
        self.components
            .iter_mut()
            .for_each(|c| c.write(address, data));
    }
}

impl MemoryLike for Bus {
    fn read_byte(&self, address: u16) -> u8 {
        self.read(address).unwrap_or(OPEN_BUS)
    }

    fn write_byte(&mut self, address: u16, data: u8) {
        self.write(address, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers a single address with a fixed byte and records writes to it.
    struct Probe {
        address: u16,
        value: u8,
    }

    impl Component for Probe {
        fn read(&self, address: u16) -> Option<u8> {
            (address == self.address).then_some(self.value)
        }

        fn write(&mut self, address: u16, data: u8) {
            if address == self.address {
                self.value = data;
            }
        }
    }

    #[test]
    fn first_component_wins_and_writes_broadcast() {
        let mut bus = Bus::new();
        bus.attach(Probe {
            address: 0x10,
            value: 1,
        });
        bus.attach(Probe {
            address: 0x10,
            value: 2,
        });
        assert_eq!(bus.len(), 2);
        assert_eq!(bus.read_byte(0x10), 1);
        assert_eq!(bus.read_byte(0x11), OPEN_BUS);
        bus.write_byte(0x10, 7);
        assert_eq!(bus.read_byte(0x10), 7);
        assert!(bus.components.iter().all(|c| c.read(0x10) == Some(7)));
    }

    #[test]
    fn slices_of_components_are_memory() {
        let mut first = Probe {
            address: 0x20,
            value: 0xAA,
        };
        let mut bus = Bus::new();
        bus.attach(RamController::new(Ram::new(0x10), 0x20));
        let view: &mut [&mut dyn Component] = &mut [&mut first, &mut bus];
        assert_eq!(view.read_byte(0x20), 0xAA);
        assert_eq!(view.read_byte(0x21), 0);
        assert_eq!(view.read_byte(0x40), OPEN_BUS);
        view.write_byte(0x20, 0x55);
        assert_eq!(view.read_byte(0x20), 0x55);
        assert_eq!(bus.read(0x20), Some(0x55));
    }
}
