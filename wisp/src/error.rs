/// Failures a caller can act on: bad input files and misuse of the scheduler. Broken invariants
/// inside the emulator (out-of-range register indices, the STOP instruction, and the like) are
/// bugs and panic instead.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
    #[display("cartridge image is {len} bytes, too short to contain a header")]
    HeaderTooShort { len: usize },
    #[display("cartridge image is {actual} bytes, but its controller expects {expected}")]
    InvalidRomSize { expected: usize, actual: usize },
    #[display("unsupported cartridge type 0x{kind:0>2X}")]
    UnsupportedCartridge { kind: u8 },
    #[display("unknown cartridge RAM size code 0x{code:0>2X}")]
    InvalidRamSize { code: u8 },
    #[display("boot ROM is {actual} bytes, expected 256")]
    InvalidBootRomSize { actual: usize },
    #[display("can not run until cycle {requested}, {elapsed} cycles have already elapsed")]
    CycleInPast { requested: u64, elapsed: u64 },
}
