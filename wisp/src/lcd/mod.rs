//! The LCD controller: scanline timing, the STAT/LY state machine, OAM DMA, and the scanline
//! renderer that composites background, window, and sprites into an [`LcdImage`].

use tracing::debug;
use tracing::trace;

mod image;
mod line;

pub use image::*;
pub use line::*;

use crate::bits;
use crate::bits::Bit;
use crate::cpu::Interrupt;
use crate::cpu::InterruptSink;
use crate::cpu::Register;
use crate::cpu::RegisterFile;
use crate::mem::map;
use crate::mem::Clocked;
use crate::mem::Component;
use crate::mem::MemoryLike;
use crate::mem::Ram;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const CYCLES_PER_LINE: u64 = 114;
pub const LINES_PER_FRAME: u64 = 154;
pub const CYCLES_PER_FRAME: u64 = CYCLES_PER_LINE * LINES_PER_FRAME;

const OAM_SCAN_CYCLES: u64 = 20;
const DRAWING_CYCLES: u64 = 43;
const HBLANK_CYCLES: u64 = CYCLES_PER_LINE - OAM_SCAN_CYCLES - DRAWING_CYCLES;

/// Tile maps and the background are 32 tiles of 8 pixels in each direction.
const BACKGROUND_SIZE: usize = 256;
const TILE_MAP_WIDTH: u16 = 32;
const TILE_BYTES: u16 = 16;

const OAM_ENTRIES: usize = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;

/// Bytes copied by one OAM DMA transfer, one per cycle.
const DMA_LENGTH: usize = map::OAM_RAM_SIZE;

/// Marks a switched off display. The timing state machine does not run until LCDC bit 7 is set.
const OFF: u64 = u64::MAX;

/// The LCD registers, in address order from 0xFF40.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum LcdReg {
    Lcdc,
    Stat,
    Scy,
    Scx,
    Ly,
    Lyc,
    Dma,
    Bgp,
    Obp0,
    Obp1,
    Wy,
    Wx,
}

impl Register for LcdReg {
    fn index(self) -> usize {
        self as usize
    }
}

impl LcdReg {
    const ALL: [Self; 12] = [
        Self::Lcdc,
        Self::Stat,
        Self::Scy,
        Self::Scx,
        Self::Ly,
        Self::Lyc,
        Self::Dma,
        Self::Bgp,
        Self::Obp0,
        Self::Obp1,
        Self::Wy,
        Self::Wx,
    ];

    pub fn from_address(address: u16) -> Option<Self> {
        let index = address.checked_sub(map::REGS_LCDC_START)?;
        Self::ALL.get(usize::from(index)).copied()
    }
}

/// LCDC bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lcdc {
    BackgroundEnable = 0,
    SpriteEnable = 1,
    TallSprites = 2,
    BackgroundMap = 3,
    TileData = 4,
    WindowEnable = 5,
    WindowMap = 6,
    DisplayEnable = 7,
}

impl Bit for Lcdc {
    fn index(self) -> u8 {
        self as u8
    }
}

/// STAT bits above the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stat {
    Coincidence = 2,
    HBlankInterrupt = 3,
    VBlankInterrupt = 4,
    OamScanInterrupt = 5,
    CoincidenceInterrupt = 6,
}

impl Bit for Stat {
    fn index(self) -> u8 {
        self as u8
    }
}

/// OAM attribute bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attr {
    Palette = 4,
    FlipX = 5,
    FlipY = 6,
    BehindBackground = 7,
}

impl Bit for Attr {
    fn index(self) -> u8 {
        self as u8
    }
}

/// The mode reported in STAT bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::IsVariant)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

impl Mode {
    fn from_stat(stat: u8) -> Self {
        match stat & 0b11 {
            0 => Self::HBlank,
            1 => Self::VBlank,
            2 => Self::OamScan,
            _ => Self::Drawing,
        }
    }

    /// The STAT bit that enables an interrupt when this mode is entered.
    fn interrupt(self) -> Option<Stat> {
        match self {
            Self::HBlank => Some(Stat::HBlankInterrupt),
            Self::VBlank => Some(Stat::VBlankInterrupt),
            Self::OamScan => Some(Stat::OamScanInterrupt),
            Self::Drawing => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OamDma {
    source: u16,
    copied: usize,
}

/// Owns VRAM, OAM, and the LCD registers, and turns them into frames.
#[derive(Debug, Clone)]
pub struct LcdController {
    video_ram: Ram,
    oam: Ram,
    regs: RegisterFile<LcdReg, 12>,
    interrupts: InterruptSink,
    /// Relative to `lcd_on_cycle`.
    next_non_idle_cycle: u64,
    /// The cycle at which the display was last switched on.
    lcd_on_cycle: u64,
    /// The row of the window drawn next. Only advances on lines that draw the window.
    window_line: u8,
    next_image: LcdImageBuilder,
    current_image: LcdImage,
    dma: Option<OamDma>,
}

impl LcdController {
    pub fn new(interrupts: InterruptSink) -> Self {
        Self {
            video_ram: Ram::new(map::VIDEO_RAM_SIZE),
            oam: Ram::new(map::OAM_RAM_SIZE),
            regs: RegisterFile::new(),
            interrupts,
            next_non_idle_cycle: OFF,
            lcd_on_cycle: 0,
            window_line: 0,
            next_image: LcdImageBuilder::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            current_image: LcdImage::blank(SCREEN_WIDTH, SCREEN_HEIGHT),
            dma: None,
        }
    }

    /// The last completed frame. Blank until the first frame is finished.
    pub fn current_image(&self) -> &LcdImage {
        &self.current_image
    }

    pub fn reg(&self, reg: LcdReg) -> u8 {
        self.regs.get(reg)
    }

    pub fn mode(&self) -> Mode {
        Mode::from_stat(self.regs.get(LcdReg::Stat))
    }

    pub fn is_on(&self) -> bool {
        self.next_non_idle_cycle != OFF
    }

    fn lcdc(&self, bit: Lcdc) -> bool {
        self.regs.test_bit(LcdReg::Lcdc, bit)
    }

    fn vram(&self, address: u16) -> u8 {
        self.video_ram
            .read(usize::from(address - map::VIDEO_RAM_START))
    }

    fn oam_entry(&self, index: usize) -> [u8; 4] {
        std::array::from_fn(|i| self.oam.read(4 * index + i))
    }

    fn sprite_height(&self) -> u8 {
        if self.lcdc(Lcdc::TallSprites) {
            16
        } else {
            8
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        let stat = self.regs.get(LcdReg::Stat);
        self.regs.set(LcdReg::Stat, (stat & !0b11) | mode as u8);
        if mode
            .interrupt()
            .is_some_and(|bit| self.regs.test_bit(LcdReg::Stat, bit))
        {
            self.interrupts.request(Interrupt::LcdStat);
        }
    }

    fn set_ly(&mut self, ly: u8) {
        self.regs.set(LcdReg::Ly, ly);
        self.check_coincidence();
    }

    fn check_coincidence(&mut self) {
        let equal = self.regs.get(LcdReg::Ly) == self.regs.get(LcdReg::Lyc);
        self.regs.set_bit(LcdReg::Stat, Stat::Coincidence, equal);
        if equal && self.regs.test_bit(LcdReg::Stat, Stat::CoincidenceInterrupt) {
            self.interrupts.request(Interrupt::LcdStat);
        }
    }

    fn switch_off(&mut self) {
        debug!("LCD switched off");
        self.set_mode(Mode::HBlank);
        self.set_ly(0);
        self.next_non_idle_cycle = OFF;
    }

    /// Copies the next byte of a running OAM DMA transfer.
    fn copy_dma_byte<M: MemoryLike + ?Sized>(&mut self, bus: &M) {
        let Some(mut dma) = self.dma else {
            return;
        };
        let address = dma.source + dma.copied as u16;
        let byte = self.read(address).unwrap_or_else(|| bus.read_byte(address));
        self.oam.write(dma.copied, byte);
        dma.copied += 1;
        self.dma = (dma.copied < DMA_LENGTH).then_some(dma);
    }

    /// Runs the timing state machine at `elapsed` cycles since the display was switched on.
    fn step(&mut self, elapsed: u64) {
        let frame_cycle = elapsed % CYCLES_PER_FRAME;
        let line = (frame_cycle / CYCLES_PER_LINE) as u8;
        let line_cycle = frame_cycle % CYCLES_PER_LINE;
        if usize::from(line) >= SCREEN_HEIGHT {
            if usize::from(line) == SCREEN_HEIGHT {
                self.publish_frame();
                self.set_mode(Mode::VBlank);
                self.interrupts.request(Interrupt::VBlank);
            }
            self.set_ly(line);
            self.next_non_idle_cycle += CYCLES_PER_LINE;
            return;
        }
        match line_cycle {
            0 => {
                if line == 0 {
                    self.window_line = 0;
                }
                self.set_ly(line);
                self.set_mode(Mode::OamScan);
                self.next_non_idle_cycle += OAM_SCAN_CYCLES;
            }
            OAM_SCAN_CYCLES => {
                let pixels = self.compute_line(line);
                self.next_image.set_line(usize::from(line), pixels);
                self.set_mode(Mode::Drawing);
                self.next_non_idle_cycle += DRAWING_CYCLES;
            }
            _ => {
                self.set_mode(Mode::HBlank);
                self.next_non_idle_cycle += HBLANK_CYCLES;
            }
        }
    }

    fn publish_frame(&mut self) {
        let finished = std::mem::replace(
            &mut self.next_image,
            LcdImageBuilder::new(SCREEN_WIDTH, SCREEN_HEIGHT),
        );
        self.current_image = finished.build();
        debug!("Frame published");
    }

    /// Where the 16 bytes of tile `index` start, for the tile data area chosen by LCDC bit 4. The
    /// 0x8800 area treats the index as signed, centred on 0x9000.
    fn tile_address(&self, index: u8) -> u16 {
        if self.lcdc(Lcdc::TileData) {
            map::TILE_SOURCE[1] + u16::from(index) * TILE_BYTES
        } else {
            map::TILE_SOURCE[0] + u16::from(index ^ 0x80) * TILE_BYTES
        }
    }

    /// Row `row` of the full 256 pixel wide plane described by the tile map at `map_base`.
    fn tile_line(&self, map_base: u16, row: u8) -> LcdImageLine {
        let mut builder = LcdImageLineBuilder::new(BACKGROUND_SIZE);
        let map_row = map_base + u16::from(row / 8) * TILE_MAP_WIDTH;
        for column in 0..TILE_MAP_WIDTH {
            let tile = self.vram(map_row + column);
            let address = self.tile_address(tile) + u16::from(row % 8) * 2;
            let lsb = self.vram(address);
            let msb = self.vram(address + 1);
            // Tile data has the leftmost pixel in bit 7
            builder.set_bytes(
                usize::from(column),
                bits::reverse8(msb),
                bits::reverse8(lsb),
            );
        }
        builder.build()
    }

    /// The OAM indices of the sprites on line `ly`, at most ten, ordered by X and then by index.
    /// That is the order of priority, highest first.
    pub fn sprites_intersecting_line(&self, ly: u8) -> heapless::Vec<u8, MAX_SPRITES_PER_LINE> {
        let height = i16::from(self.sprite_height());
        let ly = i16::from(ly);
        let mut keys: heapless::Vec<u16, MAX_SPRITES_PER_LINE> = (0..OAM_ENTRIES)
            .map(|index| (index, self.oam_entry(index)))
            .filter(|(_, [y, ..])| {
                let top = i16::from(*y) - 16;
                (top..top + height).contains(&ly)
            })
            .take(MAX_SPRITES_PER_LINE)
            .map(|(index, [_, x, ..])| u16::from(x) << 8 | index as u16)
            .collect();
        keys.sort_unstable();
        keys.into_iter().map(|key| key as u8).collect()
    }

    /// Row `ly` of sprite `index`, positioned on a screen-wide line and run through its palette.
    fn sprite_line(&self, index: u8, ly: u8) -> LcdImageLine {
        let [y, x, tile, attrs] = self.oam_entry(usize::from(index));
        let height = self.sprite_height();
        let mut row = ly.wrapping_add(16).wrapping_sub(y) & (height - 1);
        if bits::test_bit(attrs, Attr::FlipY.index()) {
            row = height - 1 - row;
        }
        // Tall sprites ignore the low bit of the tile index
        let tile = if height == 16 { tile & 0xFE } else { tile };
        let address =
            map::TILE_SOURCE[1] + u16::from(tile) * TILE_BYTES + u16::from(row) * 2;
        let (mut lsb, mut msb) = (self.vram(address), self.vram(address + 1));
        if !bits::test_bit(attrs, Attr::FlipX.index()) {
            (lsb, msb) = (bits::reverse8(lsb), bits::reverse8(msb));
        }
        let palette = if bits::test_bit(attrs, Attr::Palette.index()) {
            self.regs.get(LcdReg::Obp1)
        } else {
            self.regs.get(LcdReg::Obp0)
        };
        let mut builder = LcdImageLineBuilder::new(SCREEN_WIDTH);
        builder.set_bytes(0, msb, lsb);
        builder
            .build()
            .map_colors(palette)
            .shift(i32::from(x) - 8)
    }

    /// Composites line `ly` of the screen.
    ///
    /// Sprites flagged as behind the background are drawn first. The background goes over them
    /// where it is opaque and wherever no such sprite was drawn. The window replaces everything to
    /// the right of its left edge, and the remaining sprites go on top.
    pub fn compute_line(&mut self, ly: u8) -> LcdImageLine {
        let mut behind = LcdImageLine::blank(SCREEN_WIDTH);
        let mut front = LcdImageLine::blank(SCREEN_WIDTH);
        if self.lcdc(Lcdc::SpriteEnable) {
            // Lowest priority first so that the highest priority sprite ends up on top
            for &index in self.sprites_intersecting_line(ly).iter().rev() {
                let sprite = self.sprite_line(index, ly);
                let attrs = self.oam.read(4 * usize::from(index) + 3);
                if bits::test_bit(attrs, Attr::BehindBackground.index()) {
                    behind = behind.below(&sprite);
                } else {
                    front = front.below(&sprite);
                }
            }
        }

        let mut line = LcdImageLine::blank(SCREEN_WIDTH).below(&behind);
        let bgp = self.regs.get(LcdReg::Bgp);

        if self.lcdc(Lcdc::BackgroundEnable) {
            let map_base = map::BG_DISPLAY_DATA[usize::from(self.lcdc(Lcdc::BackgroundMap))];
            let row = ly.wrapping_add(self.regs.get(LcdReg::Scy));
            let scx = i32::from(self.regs.get(LcdReg::Scx));
            let background = self
                .tile_line(map_base, row)
                .extract_wrapped(scx, SCREEN_WIDTH)
                .map_colors(bgp);
            let shown = background.opacity() | &!behind.opacity();
            line = line.below_with_opacity(&background, &shown);
        }

        let wx = usize::from(self.regs.get(LcdReg::Wx).saturating_sub(7));
        if ly >= self.regs.get(LcdReg::Wy) && self.lcdc(Lcdc::WindowEnable) && wx < SCREEN_WIDTH {
            let map_base = map::BG_DISPLAY_DATA[usize::from(self.lcdc(Lcdc::WindowMap))];
            let window = self
                .tile_line(map_base, self.window_line)
                .shift(wx as i32)
                .extract_wrapped(0, SCREEN_WIDTH)
                .map_colors(bgp);
            self.window_line = self.window_line.wrapping_add(1);
            line = line.join(&window, wx);
        }

        line.below(&front)
    }
}

impl Clocked for LcdController {
    fn cycle<M: MemoryLike + ?Sized>(&mut self, cycle: u64, bus: &mut M) {
        self.copy_dma_byte(bus);
        if self.next_non_idle_cycle == OFF {
            if !self.lcdc(Lcdc::DisplayEnable) {
                return;
            }
            debug!("LCD switched on at cycle {cycle}");
            self.lcd_on_cycle = cycle;
            self.next_non_idle_cycle = 0;
        }
        let elapsed = cycle - self.lcd_on_cycle;
        if elapsed == self.next_non_idle_cycle {
            self.step(elapsed);
        }
    }
}

impl Component for LcdController {
    fn read(&self, address: u16) -> Option<u8> {
        match address {
            map::VIDEO_RAM_START..map::VIDEO_RAM_END => Some(self.vram(address)),
            map::OAM_START..map::OAM_END => {
                Some(self.oam.read(usize::from(address - map::OAM_START)))
            }
            _ => LcdReg::from_address(address).map(|reg| self.regs.get(reg)),
        }
    }

    fn write(&mut self, address: u16, data: u8) {
        match address {
            map::VIDEO_RAM_START..map::VIDEO_RAM_END => self
                .video_ram
                .write(usize::from(address - map::VIDEO_RAM_START), data),
            map::OAM_START..map::OAM_END => self
                .oam
                .write(usize::from(address - map::OAM_START), data),
            _ => match LcdReg::from_address(address) {
                Some(LcdReg::Lcdc) => {
                    self.regs.set(LcdReg::Lcdc, data);
                    if !self.lcdc(Lcdc::DisplayEnable) && self.is_on() {
                        self.switch_off();
                    }
                }
                Some(LcdReg::Stat) => {
                    let stat = self.regs.get(LcdReg::Stat);
                    self.regs.set(LcdReg::Stat, (data & 0xF8) | (stat & 0x07));
                }
                Some(LcdReg::Ly) => {}
                Some(LcdReg::Lyc) => {
                    self.regs.set(LcdReg::Lyc, data);
                    self.check_coincidence();
                }
                Some(LcdReg::Dma) => {
                    trace!("OAM DMA from 0x{data:0>2X}00");
                    self.regs.set(LcdReg::Dma, data);
                    self.dma = Some(OamDma {
                        source: u16::from(data) << 8,
                        copied: 0,
                    });
                }
                Some(reg) => self.regs.set(reg, data),
                None => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::Bus;
    use crate::mem::RamController;

    fn lcd() -> (LcdController, InterruptSink) {
        let sink = InterruptSink::new();
        (LcdController::new(sink.clone()), sink)
    }

    fn run(lcd: &mut LcdController, cycles: std::ops::Range<u64>) {
        let mut bus = Bus::new();
        cycles.for_each(|c| lcd.cycle(c, &mut bus));
    }

    fn write_tile(lcd: &mut LcdController, address: u16, rows: [(u8, u8); 8]) {
        for (i, (lsb, msb)) in rows.into_iter().enumerate() {
            lcd.write(address + 2 * i as u16, lsb);
            lcd.write(address + 2 * i as u16 + 1, msb);
        }
    }

    fn set_sprite(lcd: &mut LcdController, index: u16, y: u8, x: u8, tile: u8, attrs: u8) {
        let base = map::OAM_START + 4 * index;
        [y, x, tile, attrs]
            .into_iter()
            .enumerate()
            .for_each(|(i, b)| lcd.write(base + i as u16, b));
    }

    #[test]
    fn first_frame_after_144_lines() {
        let (mut lcd, sink) = lcd();
        lcd.write(0xFF40, 0x80);
        run(&mut lcd, 0..16_416);
        assert!(lcd.mode().is_h_blank());
        assert_eq!(lcd.reg(LcdReg::Ly), 143);
        assert_eq!(sink.pending() & Interrupt::VBlank.mask(), 0);

        run(&mut lcd, 16_416..16_417);
        assert!(lcd.mode().is_v_blank());
        assert_eq!(lcd.reg(LcdReg::Ly), 144);
        assert_eq!(sink.pending(), Interrupt::VBlank.mask());
    }

    #[test]
    fn mode_timing_within_a_line() {
        let (mut lcd, _) = lcd();
        lcd.write(0xFF40, 0x80);
        let mut start = 0;
        let modes: Vec<Mode> = [0, 19, 20, 62, 63, 113, 114]
            .into_iter()
            .map(|end| {
                run(&mut lcd, start..end + 1);
                start = end + 1;
                lcd.mode()
            })
            .collect();
        assert_eq!(
            modes,
            [
                Mode::OamScan,
                Mode::OamScan,
                Mode::Drawing,
                Mode::Drawing,
                Mode::HBlank,
                Mode::HBlank,
                Mode::OamScan
            ]
        );
        assert_eq!(lcd.reg(LcdReg::Ly), 1);
    }

    #[test]
    fn frames_repeat() {
        let (mut lcd, _) = lcd();
        lcd.write(0xFF40, 0x80);
        run(&mut lcd, 0..CYCLES_PER_FRAME - 1);
        assert_eq!(lcd.reg(LcdReg::Ly), 153);
        run(&mut lcd, CYCLES_PER_FRAME - 1..CYCLES_PER_FRAME + 1);
        assert_eq!(lcd.reg(LcdReg::Ly), 0);
        assert!(lcd.mode().is_oam_scan());
    }

    #[test]
    fn stat_interrupts_follow_enable_bits() {
        let (mut lcd, sink) = lcd();
        lcd.write(0xFF41, 0b0010_0000);
        lcd.write(0xFF40, 0x80);
        run(&mut lcd, 0..1);
        assert_eq!(sink.pending(), Interrupt::LcdStat.mask());

        sink.set_pending(0);
        lcd.write(0xFF41, 0b0100_0000);
        lcd.write(0xFF45, 2);
        run(&mut lcd, 1..228);
        assert_eq!(sink.pending(), 0);
        run(&mut lcd, 228..229);
        assert_eq!(sink.pending(), Interrupt::LcdStat.mask());
        assert!(lcd.regs.test_bit(LcdReg::Stat, Stat::Coincidence));
    }

    #[test]
    fn register_write_rules() {
        let (mut lcd, _) = lcd();
        lcd.write(0xFF40, 0x80);
        run(&mut lcd, 0..1);
        lcd.write(0xFF44, 0x55);
        assert_eq!(lcd.read(0xFF44), Some(0));
        lcd.write(0xFF41, 0xFF);
        assert_eq!(lcd.read(0xFF41), Some(0xF8 | 0b110));
        assert_eq!(lcd.read(0xFF4B), Some(0));
        assert_eq!(lcd.read(0xFF4C), None);
    }

    #[test]
    fn switching_off_resets_timing() {
        let (mut lcd, _) = lcd();
        lcd.write(0xFF40, 0x80);
        run(&mut lcd, 0..500);
        assert_eq!(lcd.reg(LcdReg::Ly), 4);
        lcd.write(0xFF40, 0x00);
        assert!(!lcd.is_on());
        assert!(lcd.mode().is_h_blank());
        assert_eq!(lcd.reg(LcdReg::Ly), 0);
        run(&mut lcd, 500..1000);
        assert_eq!(lcd.reg(LcdReg::Ly), 0);

        // Back on, starting a fresh frame at the current cycle
        lcd.write(0xFF40, 0x80);
        run(&mut lcd, 1000..1115);
        assert_eq!(lcd.reg(LcdReg::Ly), 1);
    }

    #[test]
    fn switching_off_raises_enabled_stat_interrupts() {
        // (STAT enable bits, interrupt expected)
        let cases = [
            (0b0000_0000, false),
            (0b0000_1000, true),
            (0b0100_0000, true),
            (0b0011_0000, false),
        ];
        for (enables, expected) in cases {
            let (mut display, sink) = lcd();
            display.write(0xFF40, 0x80);
            run(&mut display, 0..500);
            assert!(display.mode().is_oam_scan() || display.mode().is_drawing());
            display.write(0xFF41, enables);
            sink.set_pending(0);

            // LY goes from 4 to 0, which matches LYC
            display.write(0xFF40, 0x00);
            assert!(display.mode().is_h_blank());
            let raised = sink.pending() & Interrupt::LcdStat.mask() != 0;
            assert_eq!(raised, expected, "STAT enables 0b{enables:0>8b}");
            assert_eq!(sink.pending() & Interrupt::VBlank.mask(), 0);
        }
    }

    #[test]
    fn dma_copies_a_byte_per_cycle() {
        let (mut lcd, _) = lcd();
        let mut work = RamController::new(Ram::new(map::WORK_RAM_SIZE), map::WORK_RAM_START);
        (0..160u16).for_each(|i| work.write(0xC100 + i, i as u8 + 1));
        let mut bus = Bus::new();
        bus.attach(work);

        lcd.write(0xFF46, 0xC1);
        (0..80).for_each(|c| lcd.cycle(c, &mut bus));
        assert_eq!(lcd.read(0xFE4F), Some(80));
        assert_eq!(lcd.read(0xFE50), Some(0));
        (80..200).for_each(|c| lcd.cycle(c, &mut bus));
        assert_eq!(lcd.read(0xFE9F), Some(160));
        assert!(lcd.dma.is_none());
    }

    #[test]
    fn sprite_cap_and_order() {
        let (mut lcd, _) = lcd();
        // Fifteen sprites on line 0, X decreasing with the index
        (0..15).for_each(|i| set_sprite(&mut lcd, i, 16, 100 - i as u8, 0, 0));
        // Ties on X fall back to the index
        set_sprite(&mut lcd, 3, 16, 50, 0, 0);
        set_sprite(&mut lcd, 1, 16, 50, 0, 0);
        let sprites = lcd.sprites_intersecting_line(0);
        assert_eq!(sprites.as_slice(), &[1, 3, 9, 8, 7, 6, 5, 4, 2, 0]);

        // Off the line
        assert!(lcd.sprites_intersecting_line(8).is_empty());
        lcd.write(0xFF40, 0b100);
        assert_eq!(lcd.sprites_intersecting_line(15).len(), 10);
    }

    #[test]
    fn background_scrolls_and_wraps() {
        let (mut lcd, _) = lcd();
        // Tile 1 is solid color 3 on its first row, and sits in the last map column
        write_tile(&mut lcd, 0x8010, [(0xFF, 0xFF); 8]);
        lcd.write(0x9800 + 31, 1);
        lcd.write(0xFF47, IDENTITY_PALETTE);
        lcd.write(0xFF40, 0b1001_0001);

        let line = lcd.compute_line(0);
        assert_eq!(line.get(0), 0);
        assert_eq!(line.get(159), 0);

        // Scrolling right by 248 pulls the last column in at the left edge
        lcd.write(0xFF43, 248);
        let line = lcd.compute_line(0);
        assert_eq!((0..8).map(|x| line.get(x)).collect::<Vec<_>>(), [3; 8]);
        assert_eq!(line.get(8), 0);
    }

    #[test]
    fn signed_tile_data() {
        let (mut lcd, _) = lcd();
        // Index 0 in the signed area is the tile at 0x9000
        let mut rows = [(0, 0); 8];
        rows[0] = (0b1000_0000, 0);
        write_tile(&mut lcd, 0x9000, rows);
        lcd.write(0xFF47, IDENTITY_PALETTE);
        lcd.write(0xFF40, 0b1000_0001);
        let line = lcd.compute_line(0);
        assert_eq!(line.get(0), 1);
        assert_eq!(line.get(1), 0);
        assert_eq!(line.get(8), 1);
    }

    #[test]
    fn window_replaces_the_background() {
        let (mut lcd, _) = lcd();
        write_tile(&mut lcd, 0x8010, [(0xFF, 0); 8]);
        // The whole background is tile 1, the window map is left as tile 0
        (0..32).for_each(|i| lcd.write(0x9800 + i, 1));
        lcd.write(0xFF47, IDENTITY_PALETTE);
        lcd.write(0xFF4A, 2);
        lcd.write(0xFF4B, 7 + 20);
        lcd.write(0xFF40, 0b1111_0001);

        let line = lcd.compute_line(0);
        assert_eq!(line.get(30), 1);
        assert_eq!(lcd.window_line, 0);

        let line = lcd.compute_line(2);
        assert_eq!(line.get(19), 1);
        assert_eq!(line.get(20), 0);
        assert_eq!(line.get(159), 0);
        assert_eq!(lcd.window_line, 1);
    }

    #[test]
    fn window_left_edge() {
        let (mut lcd, _) = lcd();
        write_tile(&mut lcd, 0x8010, [(0xFF, 0); 8]);
        (0..32).for_each(|i| lcd.write(0x9800 + i, 1));
        lcd.write(0xFF47, IDENTITY_PALETTE);
        lcd.write(0xFF40, 0b1111_0001);

        // WX is offset by 7, anything at or below 7 starts the window at column 0
        let cases = [
            (0, Some(0)),
            (7, Some(0)),
            (8, Some(1)),
            (166, Some(SCREEN_WIDTH - 1)),
            (167, None),
        ];
        for (wx, first_column) in cases {
            lcd.write(0xFF4B, wx);
            let window_line = lcd.window_line;
            let line = lcd.compute_line(0);
            let window = (0..SCREEN_WIDTH).find(|&x| line.get(x) == 0);
            assert_eq!(window, first_column, "WX={wx}");
            if let Some(first) = first_column {
                assert!((first..SCREEN_WIDTH).all(|x| line.get(x) == 0), "WX={wx}");
                assert!((0..first).all(|x| line.get(x) == 1), "WX={wx}");
            }
            let drawn = u8::from(first_column.is_some());
            assert_eq!(lcd.window_line, window_line + drawn, "WX={wx}");
        }
    }

    #[test]
    fn sprites_layer_by_priority() {
        let (mut lcd, _) = lcd();
        // Tile 1: leftmost pixel color 1. Tile 2: leftmost two pixels color 2.
        let mut rows = [(0, 0); 8];
        rows[0] = (0b1000_0000, 0);
        write_tile(&mut lcd, 0x8010, rows);
        rows[0] = (0, 0b1100_0000);
        write_tile(&mut lcd, 0x8020, rows);
        lcd.write(0xFF48, IDENTITY_PALETTE);
        lcd.write(0xFF49, 0b11_11_11_00);

        // Sprite 0 at x = 10 wins over sprite 1 at x = 10 (same X, lower index)
        set_sprite(&mut lcd, 0, 16, 18, 1, 0);
        set_sprite(&mut lcd, 1, 16, 18, 2, 0);
        // Sprite 2 is mirrored and uses OBP1
        set_sprite(&mut lcd, 2, 16, 40, 2, 0b0011_0000);
        lcd.write(0xFF40, 0b1000_0010);

        let line = lcd.compute_line(0);
        assert_eq!(line.get(10), 1);
        assert_eq!(line.get(11), 2);
        assert_eq!(line.get(12), 0);
        // Mirrored, so the two opaque pixels are the rightmost ones
        let mirrored: Vec<_> = (32..40).map(|x| line.get(x)).collect();
        assert_eq!(mirrored, [0, 0, 0, 0, 0, 0, 3, 3]);
    }

    #[test]
    fn background_hides_sprites_behind_it() {
        let (mut lcd, _) = lcd();
        // Background: tile 0 with its first pixel color 1, everything else transparent
        let mut rows = [(0, 0); 8];
        rows[0] = (0b1000_0000, 0);
        write_tile(&mut lcd, 0x8000, rows);
        // Sprite tile 1: the first two pixels are color 2
        rows[0] = (0, 0b1100_0000);
        write_tile(&mut lcd, 0x8010, rows);
        lcd.write(0xFF47, IDENTITY_PALETTE);
        lcd.write(0xFF48, IDENTITY_PALETTE);
        set_sprite(&mut lcd, 0, 16, 8, 1, 0b1000_0000);
        lcd.write(0xFF40, 0b1001_0011);

        let line = lcd.compute_line(0);
        // Opaque background covers the sprite, transparent background shows it
        assert_eq!(line.get(0), 1);
        assert_eq!(line.get(1), 2);
        assert_eq!(line.get(2), 0);
    }

    #[test]
    fn frames_are_published_at_vblank() {
        let (mut lcd, _) = lcd();
        write_tile(&mut lcd, 0x8000, [(0xFF, 0xFF); 8]);
        lcd.write(0xFF47, IDENTITY_PALETTE);
        lcd.write(0xFF40, 0b1001_0001);
        assert_eq!(lcd.current_image().get(0, 0), 0);
        run(&mut lcd, 0..16_416);
        assert_eq!(lcd.current_image().get(0, 0), 0);
        run(&mut lcd, 16_416..16_417);
        let image = lcd.current_image();
        assert_eq!((image.width(), image.height()), (SCREEN_WIDTH, SCREEN_HEIGHT));
        assert_eq!(image.get(0, 0), 3);
        assert_eq!(image.get(159, 143), 3);
    }
}
