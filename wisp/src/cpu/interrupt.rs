use std::cell::Cell;
use std::rc::Rc;

use crate::bits::Bit;

/// The five interrupt sources, in priority order. The discriminant is both the bit in IE/IF and
/// the index used to compute the handler address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Bit for Interrupt {
    fn index(self) -> u8 {
        self as u8
    }
}

impl Interrupt {
    pub const ALL: [Self; 5] = [
        Self::VBlank,
        Self::LcdStat,
        Self::Timer,
        Self::Serial,
        Self::Joypad,
    ];

    /// The highest priority interrupt flagged in `bits`, if any.
    pub fn highest(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|i| bits & i.mask() != 0)
    }

    /// Where the CPU jumps to when servicing this interrupt.
    pub fn handler(self) -> u16 {
        0x40 + 8 * self as u16
    }
}

/// A handle onto the IF register. The CPU owns the register; the timer, LCD controller, and joypad
/// each hold a clone so they can raise requests without needing a reference to the CPU.
#[derive(Debug, Clone, Default)]
pub struct InterruptSink {
    pending: Rc<Cell<u8>>,
}

impl InterruptSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, interrupt: Interrupt) {
        self.pending.set(self.pending.get() | interrupt.mask());
    }

    pub(crate) fn clear(&self, interrupt: Interrupt) {
        self.pending.set(self.pending.get() & !interrupt.mask());
    }

    pub fn pending(&self) -> u8 {
        self.pending.get()
    }

    pub(crate) fn set_pending(&self, value: u8) {
        self.pending.set(value & 0x1F);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_register() {
        let sink = InterruptSink::new();
        let timer = sink.clone();
        timer.request(Interrupt::Timer);
        assert_eq!(sink.pending(), 0b100);
        sink.clear(Interrupt::Timer);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn priority_and_handlers() {
        assert_eq!(Interrupt::highest(0b00101), Some(Interrupt::VBlank));
        assert_eq!(Interrupt::highest(0b11000), Some(Interrupt::Serial));
        assert_eq!(Interrupt::highest(0), None);
        assert_eq!(Interrupt::Joypad.handler(), 0x60);
    }
}
