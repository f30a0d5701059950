use super::Component;

/// Fixed-size read/write storage. Indices are relative to the start of the memory and must be in
/// range; an out-of-range access is a bug in the caller and panics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ram {
    data: Box<[u8]>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size].into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[track_caller]
    pub fn read(&self, index: usize) -> u8 {
        assert!(
            index < self.data.len(),
            "index {index} is past the end of a {} byte RAM",
            self.data.len()
        );
        self.data[index]
    }

    #[track_caller]
    pub fn write(&mut self, index: usize, value: u8) {
        assert!(
            index < self.data.len(),
            "index {index} is past the end of a {} byte RAM",
            self.data.len()
        );
        self.data[index] = value;
    }
}

/// Fixed read-only storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rom {
    data: Box<[u8]>,
}

impl Rom {
    pub fn new(data: impl Into<Box<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[track_caller]
    pub fn read(&self, index: usize) -> u8 {
        assert!(
            index < self.data.len(),
            "index {index} is past the end of a {} byte ROM",
            self.data.len()
        );
        self.data[index]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Maps a [`Ram`] into the address space starting at `start`, optionally repeated a second time
/// at a mirror window. Work RAM and echo RAM are one controller with a mirror.
#[derive(Debug, Clone)]
pub struct RamController {
    ram: Ram,
    start: u16,
    mirror: Option<(u16, u16)>,
}

impl RamController {
    #[track_caller]
    pub fn new(ram: Ram, start: u16) -> Self {
        assert!(
            usize::from(start) + ram.size() <= 0x1_0000,
            "a {} byte RAM does not fit at 0x{start:0>4X}",
            ram.size()
        );
        Self {
            ram,
            start,
            mirror: None,
        }
    }

    /// Also answers for `[start, end)`, reading the RAM from its beginning. The window may be
    /// shorter than the RAM but not longer.
    #[track_caller]
    pub fn mirrored_at(mut self, start: u16, end: u16) -> Self {
        assert!(
            start <= end && usize::from(end - start) <= self.ram.size(),
            "mirror window 0x{start:0>4X}..0x{end:0>4X} is larger than the RAM"
        );
        self.mirror = Some((start, end));
        self
    }

    fn index(&self, address: u16) -> Option<usize> {
        let offset = usize::from(address.wrapping_sub(self.start));
        if address >= self.start && offset < self.ram.size() {
            return Some(offset);
        }
        match self.mirror {
            Some((start, end)) if (start..end).contains(&address) => {
                Some(usize::from(address - start))
            }
            _ => None,
        }
    }
}

impl Component for RamController {
    fn read(&self, address: u16) -> Option<u8> {
        self.index(address).map(|i| self.ram.read(i))
    }

    fn write(&mut self, address: u16, data: u8) {
        if let Some(i) = self.index(address) {
            self.ram.write(i, data);
        }
    }
}
