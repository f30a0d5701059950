use std::fmt::Display;

use crate::bits;
use crate::cpu::Interrupt;
use crate::cpu::InterruptSink;
use crate::mem::map;
use crate::mem::Clocked;
use crate::mem::Component;
use crate::mem::MemoryLike;

/// The divider and the programmable timer.
///
/// The divider is modelled as the 16-bit counter the hardware actually has; DIV is its upper byte.
/// TIMA is incremented whenever the AND of the enable bit (TAC bit 2) and the divider bit chosen by
/// TAC bits 0-1 goes from high to low, which also covers the increments caused by writing to DIV or
/// TAC.
#[derive(Debug, Clone)]
pub struct Timer {
    /// The internal counter. Advanced by 4 every machine cycle.
    divider: u16,
    /// ADDR FF05
    tima: u8,
    /// ADDR FF06
    /// When TIMA overflows, it resets to the value in this register.
    tma: u8,
    /// ADDR FF07
    tac: u8,
    interrupts: InterruptSink,
}

impl Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Timers {{")?;
        writeln!(f, "  DIV: 0x{:0>2X}", self.div())?;
        writeln!(f, "  DIV counter: 0x{:0>4X}", self.divider)?;
        writeln!(f, "  TIMA: 0x{:0>2X}", self.tima)?;
        writeln!(f, "  TMA: 0x{:0>2X}", self.tma)?;
        writeln!(f, "  TAC: 0b{:0>3b}", self.tac & 0b111)?;
        write!(f, "}}")
    }
}

impl Timer {
    pub fn new(interrupts: InterruptSink) -> Self {
        Self {
            divider: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            interrupts,
        }
    }

    pub fn div(&self) -> u8 {
        self.divider.to_be_bytes()[0]
    }

    /// The divider bit that clocks TIMA for the selected frequency.
    fn selected_bit(&self) -> u16 {
        match self.tac & 0b11 {
            0b00 => 9,
            0b01 => 3,
            0b10 => 5,
            _ => 7,
        }
    }

    fn state(&self) -> bool {
        bits::test_bit(self.tac, 2) && self.divider & (1 << self.selected_bit()) != 0
    }

    fn increment_if_fell(&mut self, before: bool) {
        if before && !self.state() {
            match self.tima.checked_add(1) {
                Some(tima) => self.tima = tima,
                None => {
                    self.tima = self.tma;
                    self.interrupts.request(Interrupt::Timer);
                }
            }
        }
    }
}

impl Clocked for Timer {
    fn cycle<M: MemoryLike + ?Sized>(&mut self, _cycle: u64, _bus: &mut M) {
        let before = self.state();
        self.divider = self.divider.wrapping_add(4);
        self.increment_if_fell(before);
    }
}

impl Component for Timer {
    fn read(&self, address: u16) -> Option<u8> {
        match address {
            map::REG_DIV => Some(self.div()),
            map::REG_TIMA => Some(self.tima),
            map::REG_TMA => Some(self.tma),
            map::REG_TAC => Some(self.tac),
            _ => None,
        }
    }

    fn write(&mut self, address: u16, data: u8) {
        let before = self.state();
        match address {
            map::REG_DIV => {
                self.divider = 0;
                self.increment_if_fell(before);
            }
            map::REG_TIMA => self.tima = data,
            map::REG_TMA => self.tma = data,
            map::REG_TAC => {
                self.tac = data;
                self.increment_if_fell(before);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Bit;
    use crate::mem::Bus;

    fn run(timer: &mut Timer, cycles: u64) {
        let mut bus = Bus::new();
        (0..cycles).for_each(|c| timer.cycle(c, &mut bus));
    }

    #[test]
    fn div_counts_every_64_cycles() {
        let mut timer = Timer::new(InterruptSink::new());
        run(&mut timer, 63);
        assert_eq!(timer.read(map::REG_DIV), Some(0));
        run(&mut timer, 1);
        assert_eq!(timer.read(map::REG_DIV), Some(1));
        timer.write(map::REG_DIV, 0x55);
        assert_eq!(timer.read(map::REG_DIV), Some(0));
    }

    #[test]
    fn tima_frequencies() {
        // Machine cycles per TIMA increment for each TAC frequency.
        for (tac, period) in [(0b100, 256), (0b101, 4), (0b110, 16), (0b111, 64)] {
            let mut timer = Timer::new(InterruptSink::new());
            timer.write(map::REG_TAC, tac);
            run(&mut timer, period * 3);
            assert_eq!(timer.read(map::REG_TIMA), Some(3), "TAC = 0b{tac:b}");
        }
    }

    #[test]
    fn disabled_timer_does_not_count() {
        let mut timer = Timer::new(InterruptSink::new());
        timer.write(map::REG_TAC, 0b001);
        run(&mut timer, 1000);
        assert_eq!(timer.read(map::REG_TIMA), Some(0));
    }

    #[test]
    fn overflow_reloads_and_requests() {
        let sink = InterruptSink::new();
        let mut timer = Timer::new(sink.clone());
        timer.write(map::REG_TMA, 0xF0);
        timer.write(map::REG_TIMA, 0xFF);
        timer.write(map::REG_TAC, 0b101);
        run(&mut timer, 4);
        assert_eq!(timer.read(map::REG_TIMA), Some(0xF0));
        assert_eq!(sink.pending(), Interrupt::Timer.mask());
    }

    #[test]
    fn resetting_div_can_tick_tima() {
        let mut timer = Timer::new(InterruptSink::new());
        timer.write(map::REG_TAC, 0b101);
        // Bit 3 of the divider is set after two cycles
        run(&mut timer, 2);
        assert_eq!(timer.read(map::REG_TIMA), Some(0));
        timer.write(map::REG_DIV, 0);
        assert_eq!(timer.read(map::REG_TIMA), Some(1));
    }
}
