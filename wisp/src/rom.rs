use crate::mem::map;
use crate::Error;

/// The parts of the cartridge header the emulator cares about. The header occupies the region
/// between `0x100` and `0x14F` of the ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// The memory region between `0x134` and `0x142`. If the title is shorter than 15
    /// characters, the rest of the array is zero-padded.
    title: [u8; 15],
    /// The byte at `0x147`. Selects the memory bank controller.
    cartridge_type: u8,
    /// The byte at `0x148`. The ROM is `32 KiB << rom_size` long.
    rom_size: u8,
    /// The byte at `0x149`. An index into the table of external RAM sizes.
    ram_size: u8,
    /// The byte at `0x14D`. A checksum over `0x134..0x14D`. The boot ROM refuses to start a
    /// cartridge whose checksum does not match.
    header_checksum: u8,
    /// The checksum computed from the header bytes.
    computed_checksum: u8,
}

impl CartridgeHeader {
    pub fn extract_from_rom(rom: &[u8]) -> Result<Self, Error> {
        if rom.len() < map::CARTRIDGE_HEADER_END {
            return Err(Error::HeaderTooShort { len: rom.len() });
        }
        let mut title = [0; 15];
        title.copy_from_slice(&rom[0x134..=0x142]);
        let computed_checksum = rom[0x134..0x14D]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
        Ok(Self {
            title,
            cartridge_type: rom[map::CARTRIDGE_TYPE],
            rom_size: rom[0x148],
            ram_size: rom[map::CARTRIDGE_RAM_SIZE],
            header_checksum: rom[0x14D],
            computed_checksum,
        })
    }

    /// The title with its zero padding removed.
    pub fn title(&self) -> String {
        self.title
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    pub fn cartridge_type(&self) -> u8 {
        self.cartridge_type
    }

    pub fn rom_size(&self) -> u8 {
        self.rom_size
    }

    pub fn ram_size(&self) -> u8 {
        self.ram_size
    }

    pub fn checksum_matches(&self) -> bool {
        self.header_checksum == self.computed_checksum
    }
}
