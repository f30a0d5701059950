use crate::mem::map;
use crate::mem::Component;
use crate::mem::Rom;
use crate::Error;

/// A bare 32 KiB ROM. Writes are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbc0 {
    rom: Rom,
}

impl Mbc0 {
    pub const ROM_SIZE: usize = map::ROM_END as usize;

    pub fn new(rom: Rom) -> Result<Self, Error> {
        if rom.size() != Self::ROM_SIZE {
            return Err(Error::InvalidRomSize {
                expected: Self::ROM_SIZE,
                actual: rom.size(),
            });
        }
        Ok(Self { rom })
    }
}

impl Component for Mbc0 {
    fn read(&self, address: u16) -> Option<u8> {
        (address < map::ROM_END).then(|| self.rom.read(usize::from(address)))
    }

    fn write(&mut self, _address: u16, _data: u8) {}
}
