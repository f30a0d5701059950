use std::path::Path;

use tracing::debug;

use super::map;
use super::mbc::Cartridge;
use super::Component;
use crate::Error;

/// The 256-byte program the console runs before handing control to the cartridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BootRom(Box<[u8; map::BOOT_ROM_SIZE]>);

impl BootRom {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::try_from(std::fs::read(path)?)
    }

    pub fn read(&self, address: u16) -> u8 {
        self.0[usize::from(address)]
    }
}

impl TryFrom<Vec<u8>> for BootRom {
    type Error = Error;

    fn try_from(data: Vec<u8>) -> Result<Self, Error> {
        let actual = data.len();
        let data: Box<[u8; map::BOOT_ROM_SIZE]> = data
            .into_boxed_slice()
            .try_into()
            .map_err(|_| Error::InvalidBootRomSize { actual })?;
        Ok(Self(data))
    }
}

/// Sits in front of the cartridge and answers for the first 256 addresses with the boot ROM
/// until the program writes to the disable register.
#[derive(Debug)]
pub struct BootRomController {
    cartridge: Cartridge,
    boot_rom: Option<BootRom>,
}

impl BootRomController {
    /// Without a boot ROM the overlay starts out disabled.
    pub fn new(cartridge: Cartridge, boot_rom: Option<BootRom>) -> Self {
        Self {
            cartridge,
            boot_rom,
        }
    }

    pub fn is_overlay_active(&self) -> bool {
        self.boot_rom.is_some()
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }
}

impl Component for BootRomController {
    fn read(&self, address: u16) -> Option<u8> {
        match &self.boot_rom {
            Some(boot) if (map::BOOT_ROM_START..map::BOOT_ROM_END).contains(&address) => {
                Some(boot.read(address))
            }
            _ => self.cartridge.read(address),
        }
    }

    fn write(&mut self, address: u16, data: u8) {
        if address == map::REG_BOOT_ROM_DISABLE && self.boot_rom.take().is_some() {
            debug!("Boot ROM disabled, cartridge now mapped at 0x0000");
        }
        self.cartridge.write(address, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::mbc::tests::blank_rom;

    #[test]
    fn overlay_until_disabled() {
        let mut rom = blank_rom(0x00, 0x8000);
        rom[0x00] = 0x11;
        rom[0x100] = 0x22;
        let cart = Cartridge::from_bytes(rom).unwrap();
        let boot = BootRom::try_from(vec![0xAB; 0x100]).unwrap();
        let mut controller = BootRomController::new(cart, Some(boot));
        assert_eq!(controller.read(0x0000), Some(0xAB));
        assert_eq!(controller.read(0x00FF), Some(0xAB));
        assert_eq!(controller.read(0x0100), Some(0x22));
        controller.write(map::REG_BOOT_ROM_DISABLE, 1);
        assert!(!controller.is_overlay_active());
        assert_eq!(controller.read(0x0000), Some(0x11));
    }

    #[test]
    fn boot_rom_must_be_256_bytes() {
        let err = BootRom::try_from(vec![0; 0x80]).unwrap_err();
        assert!(matches!(err, Error::InvalidBootRomSize { actual: 0x80 }));
    }
}
