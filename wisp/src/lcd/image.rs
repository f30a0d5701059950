use super::LcdImageLine;

/// A finished frame: `height` lines of `width` 2-bit color indices, 0 being the lightest shade.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LcdImage {
    width: usize,
    height: usize,
    lines: Vec<LcdImageLine>,
}

impl LcdImage {
    #[track_caller]
    pub fn new(width: usize, height: usize, lines: Vec<LcdImageLine>) -> Self {
        assert_eq!(lines.len(), height, "an image needs exactly one line per row");
        assert!(
            lines.iter().all(|line| line.size() == width),
            "every line of an image must be {width} pixels wide"
        );
        Self {
            width,
            height,
            lines,
        }
    }

    /// An image where every pixel is color 0.
    pub fn blank(width: usize, height: usize) -> Self {
        Self::new(width, height, vec![LcdImageLine::blank(width); height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The color index at column `x` of row `y`.
    #[track_caller]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.line(y).get(x)
    }

    #[track_caller]
    pub fn line(&self, y: usize) -> &LcdImageLine {
        &self.lines[y]
    }

    /// Every row as a list of color indices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.lines
            .iter()
            .map(|line| (0..self.width).map(|x| line.get(x)).collect())
    }
}

/// Collects lines as they are drawn. Rows that are never set stay blank.
#[derive(Debug, Clone)]
pub struct LcdImageBuilder {
    width: usize,
    height: usize,
    lines: Vec<LcdImageLine>,
}

impl LcdImageBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            lines: vec![LcdImageLine::blank(width); height],
        }
    }

    #[track_caller]
    pub fn set_line(&mut self, y: usize, line: LcdImageLine) -> &mut Self {
        assert_eq!(line.size(), self.width, "line does not match the image width");
        self.lines[y] = line;
        self
    }

    pub fn build(self) -> LcdImage {
        LcdImage::new(self.width, self.height, self.lines)
    }
}
