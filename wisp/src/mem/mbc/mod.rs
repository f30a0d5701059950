use std::path::Path;

use tracing::info;
use tracing::warn;

mod mbc0;
mod mbc1;

pub use mbc0::*;
pub use mbc1::*;

use super::Component;
use super::Rom;
use crate::rom::CartridgeHeader;
use crate::Error;

/// The size of a ROM bank, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The size of a RAM bank, 8 KiB.
pub const RAM_BANK_SIZE: usize = 8 * 1024;

/// External RAM sizes, indexed by header byte `0x149`.
pub const RAM_SIZES: [usize; 4] = [0, 2048, 8192, 32768];

/// A cartridge is its ROM image wired to one of the supported memory bank controllers.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum Cartridge {
    /// There is no external MBC. The game ROM is mapped into the 32 KiB that starts at 0x0000 and
    /// extends to 0x7FFF.
    ///
    /// See the [Pan Docs](https://gbdev.io/pandocs/nombc.html).
    Mbc0(Mbc0),
    /// The first MBC chip. Switches 16 KiB ROM banks into 0x4000-0x7FFF and up to four 8 KiB RAM
    /// banks into 0xA000-0xBFFF.
    ///
    /// See the [Pan Docs](https://gbdev.io/pandocs/MBC1.html).
    Mbc1(Mbc1),
}

impl Cartridge {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Picks a controller from the cartridge type byte of the header.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        let header = CartridgeHeader::extract_from_rom(&data)?;
        info!(
            "Loading \"{}\" ({} bytes, cartridge type 0x{:0>2X})",
            header.title(),
            data.len(),
            header.cartridge_type()
        );
        if !header.checksum_matches() {
            warn!("Cartridge header checksum does not match");
        }
        match header.cartridge_type() {
            0x00 => Ok(Mbc0::new(Rom::new(data))?.into()),
            0x01..=0x03 => {
                let code = header.ram_size();
                let ram_size = *RAM_SIZES
                    .get(usize::from(code))
                    .ok_or(Error::InvalidRamSize { code })?;
                Ok(Mbc1::new(Rom::new(data), ram_size).into())
            }
            kind => Err(Error::UnsupportedCartridge { kind }),
        }
    }
}

impl Component for Cartridge {
    fn read(&self, address: u16) -> Option<u8> {
        match self {
            Self::Mbc0(mbc) => mbc.read(address),
            Self::Mbc1(mbc) => mbc.read(address),
        }
    }

    fn write(&mut self, address: u16, data: u8) {
        match self {
            Self::Mbc0(mbc) => mbc.write(address, data),
            Self::Mbc1(mbc) => mbc.write(address, data),
        }
    }
}
