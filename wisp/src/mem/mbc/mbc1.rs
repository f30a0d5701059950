use std::fmt::Display;

use tracing::info;

use super::RAM_BANK_SIZE;
use super::ROM_BANK_SIZE;
use crate::mem::map;
use crate::mem::Component;
use crate::mem::Ram;
use crate::mem::Rom;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mbc1 {
    rom: Rom,
    ram: Ram,
    /// Selects the bank in 0x4000-0x7FFF. Five bits wide and never zero.
    bank_index_one: u8,
    /// Two bits that extend the ROM bank index, or select the RAM bank in advanced mode.
    bank_index_two: u8,
    /// Determines if RAM can be read from and written to. The actual hardware uses an 8-bit
    /// register, so RAM is enabled when the lower 4 bits are `0xA`.
    ///
    /// Initially set to `false`, any writes to the memory addresses 0x0000 through 0x1FFF write to
    /// this register.
    ram_enabled: bool,
    /// Writes to 0x6000 through 0x7FFF select the mode.
    banking_mode: BankingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::IsVariant)]
pub enum BankingMode {
    Simple = 0,
    Advanced = 1,
}

impl BankingMode {
    fn from_byte(value: u8) -> Self {
        if (value & 0x1) == 0 {
            Self::Simple
        } else {
            Self::Advanced
        }
    }
}

impl Display for Mbc1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC1 {{")?;
        writeln!(f, "  MODE:  {}", self.banking_mode)?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  BANK1: 0b{:0>8b}", self.bank_index_one)?;
        writeln!(f, "  BANK2: 0b{:0>8b}", self.bank_index_two)?;
        writeln!(f, "  rom_bank: 0x{:0>2X}", self.rom_bank())?;
        writeln!(f, "}}")
    }
}

impl Mbc1 {
    pub fn new(rom: Rom, ram_size: usize) -> Self {
        info!(
            "MBC1 with {} ROM bank(s) and {ram_size} bytes of RAM",
            rom.size().div_ceil(ROM_BANK_SIZE),
        );
        Self {
            rom,
            ram: Ram::new(ram_size),
            bank_index_one: 1,
            bank_index_two: 0,
            ram_enabled: false,
            banking_mode: BankingMode::Simple,
        }
    }

    #[inline]
    fn first_rom_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => usize::from(self.bank_index_two << 5),
        }
    }

    #[inline]
    fn rom_bank(&self) -> usize {
        usize::from(self.bank_index_two << 5 | self.bank_index_one)
    }

    /// NOTE: This does *not* take RAM enablement into consideration.
    #[inline]
    fn ram_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => usize::from(self.bank_index_two),
        }
    }

    /// Banks past the end of the ROM wrap around, like the unconnected address lines on a real
    /// cartridge.
    fn rom_byte(&self, bank: usize, offset: u16) -> u8 {
        let index = bank * ROM_BANK_SIZE + usize::from(offset);
        self.rom.read(index % self.rom.size())
    }

    fn ram_index(&self, address: u16) -> Option<usize> {
        if !self.ram_enabled || self.ram.size() == 0 {
            return None;
        }
        let offset = usize::from(address - map::EXTERNAL_RAM_START);
        Some((self.ram_bank() * RAM_BANK_SIZE + offset) % self.ram.size())
    }
}

impl Component for Mbc1 {
    fn read(&self, address: u16) -> Option<u8> {
        match address {
            0x0000..0x4000 => Some(self.rom_byte(self.first_rom_bank(), address)),
            0x4000..0x8000 => Some(self.rom_byte(self.rom_bank(), address - 0x4000)),
            map::EXTERNAL_RAM_START..map::EXTERNAL_RAM_END => Some(
                self.ram_index(address)
                    .map_or(0xFF, |index| self.ram.read(index)),
            ),
            _ => None,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            0x0000..0x2000 => self.ram_enabled = (value & 0x0F) == 0b1010,
            0x2000..0x4000 => self.bank_index_one = std::cmp::max(0x1F & value, 1),
            0x4000..0x6000 => self.bank_index_two = 0x3 & value,
            0x6000..0x8000 => self.banking_mode = BankingMode::from_byte(value),
            map::EXTERNAL_RAM_START..map::EXTERNAL_RAM_END => {
                if let Some(index) = self.ram_index(address) {
                    self.ram.write(index, value);
                }
            }
            _ => {}
        }
    }
}
