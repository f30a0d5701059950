use crate::bits::BitVector;
use crate::bits::BitVectorBuilder;

/// The palette that maps every color index to itself.
pub const IDENTITY_PALETTE: u8 = 0b11_10_01_00;

/// One row of 2-bit pixels, stored as three planes. Pixel `x` is bit `x` of each plane: the high
/// and low bits of its color index, and whether it is opaque. Opacity is decided by the raw tile
/// data (color index 0 is transparent) and survives palette mapping.
///
/// Layering and palette mapping work on a whole plane at a time, which is why the line is not
/// simply a byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LcdImageLine {
    msb: BitVector,
    lsb: BitVector,
    opacity: BitVector,
}

impl LcdImageLine {
    #[track_caller]
    pub fn new(msb: BitVector, lsb: BitVector, opacity: BitVector) -> Self {
        assert!(
            msb.size() == lsb.size() && lsb.size() == opacity.size(),
            "planes of an image line must be the same size"
        );
        Self { msb, lsb, opacity }
    }

    /// A fully transparent line of color 0.
    #[track_caller]
    pub fn blank(size: usize) -> Self {
        let plane = BitVector::new(size);
        Self::new(plane.clone(), plane.clone(), plane)
    }

    pub fn size(&self) -> usize {
        self.msb.size()
    }

    pub fn msb(&self) -> &BitVector {
        &self.msb
    }

    pub fn lsb(&self) -> &BitVector {
        &self.lsb
    }

    pub fn opacity(&self) -> &BitVector {
        &self.opacity
    }

    /// The color index of pixel `x`, between 0 and 3.
    #[track_caller]
    pub fn get(&self, x: usize) -> u8 {
        u8::from(self.msb.test_bit(x)) << 1 | u8::from(self.lsb.test_bit(x))
    }

    fn map_planes(&self, f: impl Fn(&BitVector) -> BitVector) -> Self {
        Self {
            msb: f(&self.msb),
            lsb: f(&self.lsb),
            opacity: f(&self.opacity),
        }
    }

    /// Moves every pixel `distance` places to the right. Pixels pushed off the end are lost and
    /// the gap is transparent.
    pub fn shift(&self, distance: i32) -> Self {
        self.map_planes(|plane| plane.shift(distance))
    }

    #[track_caller]
    pub fn extract_wrapped(&self, start: i32, size: usize) -> Self {
        self.map_planes(|plane| plane.extract_wrapped(start, size))
    }

    /// Runs every color index through a palette. Bits `2i` and `2i + 1` of `palette` hold the
    /// color that index `i` becomes.
    pub fn map_colors(&self, palette: u8) -> Self {
        if palette == IDENTITY_PALETTE {
            return self.clone();
        }
        let (msb, lsb) = (&self.msb, &self.lsb);
        let masks = [!(msb | lsb), lsb & &!msb, msb & &!lsb, msb & lsb];
        let mut mapped_msb = BitVector::new(self.size());
        let mut mapped_lsb = BitVector::new(self.size());
        for (index, mask) in masks.iter().enumerate() {
            let color = (palette >> (2 * index)) & 0b11;
            if color & 0b10 != 0 {
                mapped_msb = &mapped_msb | mask;
            }
            if color & 0b01 != 0 {
                mapped_lsb = &mapped_lsb | mask;
            }
        }
        Self {
            msb: mapped_msb,
            lsb: mapped_lsb,
            opacity: self.opacity.clone(),
        }
    }

    /// Draws `top` over this line wherever `top` is opaque.
    #[track_caller]
    pub fn below(&self, top: &Self) -> Self {
        self.below_with_opacity(top, &top.opacity)
    }

    /// Draws `top` over this line wherever `opacity` is set, regardless of `top`'s own opacity.
    /// The result is opaque wherever either input was.
    #[track_caller]
    pub fn below_with_opacity(&self, top: &Self, opacity: &BitVector) -> Self {
        let under = !opacity;
        let blend = |bottom: &BitVector, top: &BitVector| &(top & opacity) | &(bottom & &under);
        Self {
            msb: blend(&self.msb, &top.msb),
            lsb: blend(&self.lsb, &top.lsb),
            opacity: &self.opacity | opacity,
        }
    }

    /// Pixels before `index` come from this line and the rest from `other`. The result is opaque
    /// wherever either input was.
    #[track_caller]
    pub fn join(&self, other: &Self, index: usize) -> Self {
        assert!(
            index < self.size(),
            "join index {index} is out of range for a line of {} pixels",
            self.size()
        );
        let from_other = BitVector::filled(self.size(), true).shift(index as i32);
        let from_self = !&from_other;
        let splice = |left: &BitVector, right: &BitVector| {
            &(left & &from_self) | &(right & &from_other)
        };
        Self {
            msb: splice(&self.msb, &other.msb),
            lsb: splice(&self.lsb, &other.lsb),
            opacity: &self.opacity | &other.opacity,
        }
    }
}

/// Builds a line from tile data, one 8-pixel byte pair at a time.
#[derive(Debug, Clone)]
pub struct LcdImageLineBuilder {
    msb: BitVectorBuilder,
    lsb: BitVectorBuilder,
}

impl LcdImageLineBuilder {
    #[track_caller]
    pub fn new(size: usize) -> Self {
        Self {
            msb: BitVectorBuilder::new(size),
            lsb: BitVectorBuilder::new(size),
        }
    }

    /// Sets pixels `8 * index` through `8 * index + 7`. Bit 0 of each byte is the leftmost pixel.
    #[track_caller]
    pub fn set_bytes(&mut self, index: usize, msb: u8, lsb: u8) -> &mut Self {
        self.msb.set_byte(index, msb);
        self.lsb.set_byte(index, lsb);
        self
    }

    /// Color index 0 is transparent, everything else is opaque.
    pub fn build(self) -> LcdImageLine {
        let msb = self.msb.build();
        let lsb = self.lsb.build();
        let opacity = &msb | &lsb;
        LcdImageLine::new(msb, lsb, opacity)
    }
}
