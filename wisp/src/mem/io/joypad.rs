use crate::bits;
use crate::cpu::Interrupt;
use crate::cpu::InterruptSink;
use crate::mem::map;
use crate::mem::Component;

/// The eight buttons. The first four share one line of the key matrix, the last four the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Key {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Key {
    fn line(self) -> usize {
        self as usize / 4
    }

    fn column(self) -> u8 {
        self as u8 % 4
    }
}

/// The P1 register and the key matrix behind it.
///
/// Internally everything is active-high: a pressed key is a 1 and a selected line is a 1. Only the
/// bus sees the inverted, active-low register the hardware exposes.
#[derive(Debug, Clone)]
pub struct Joypad {
    p1: u8,
    lines: [u8; 2],
    interrupts: InterruptSink,
}

/// P1 bits 4 and 5 select the direction and button lines.
const LINE_SELECT: [u8; 2] = [4, 5];

impl Joypad {
    pub fn new(interrupts: InterruptSink) -> Self {
        Self {
            p1: 0,
            lines: [0; 2],
            interrupts,
        }
    }

    pub fn key_pressed(&mut self, key: Key) {
        self.set_key(key, true);
    }

    pub fn key_released(&mut self, key: Key) {
        self.set_key(key, false);
    }

    fn set_key(&mut self, key: Key, pressed: bool) {
        let line = &mut self.lines[key.line()];
        *line = bits::set_bit(*line, key.column(), pressed);
        self.refresh();
    }

    /// Recomputes the column bits of P1 from the selected lines. A newly pressed key on a selected
    /// line raises the joypad interrupt.
    fn refresh(&mut self) {
        let previous = self.p1;
        let columns = LINE_SELECT
            .into_iter()
            .zip(self.lines)
            .filter(|&(select, _)| bits::test_bit(self.p1, select))
            .fold(0, |acc, (_, line)| acc | line);
        self.p1 = (self.p1 & 0xF0) | columns;
        if self.p1 & !previous & 0x0F != 0 {
            self.interrupts.request(Interrupt::Joypad);
        }
    }
}

impl Component for Joypad {
    fn read(&self, address: u16) -> Option<u8> {
        (address == map::REG_P1).then(|| bits::complement8(self.p1))
    }

    fn write(&mut self, address: u16, data: u8) {
        if address == map::REG_P1 {
            self.p1 = (self.p1 & 0b1100_1111) | (bits::complement8(data) & 0b0011_0000);
            self.refresh();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_active_low() {
        let sink = InterruptSink::new();
        let mut pad = Joypad::new(sink.clone());
        assert_eq!(pad.read(map::REG_P1), Some(0xFF));

        // Select the directions
        pad.write(map::REG_P1, 0b1110_1111);
        pad.key_pressed(Key::Left);
        assert_eq!(pad.read(map::REG_P1), Some(0b1110_1101));
        assert_eq!(sink.pending(), 0b1_0000);

        // Buttons are not selected, so A does not show up
        pad.key_pressed(Key::A);
        assert_eq!(pad.read(map::REG_P1), Some(0b1110_1101));

        pad.write(map::REG_P1, 0b1101_1111);
        assert_eq!(pad.read(map::REG_P1), Some(0b1101_1110));

        pad.key_released(Key::A);
        assert_eq!(pad.read(map::REG_P1), Some(0b1101_1111));
        assert_eq!(pad.read(0xFF01), None);
    }

    #[test]
    fn unselected_presses_do_not_interrupt() {
        let sink = InterruptSink::new();
        let mut pad = Joypad::new(sink.clone());
        pad.key_pressed(Key::Start);
        assert_eq!(sink.pending(), 0);
    }
}
