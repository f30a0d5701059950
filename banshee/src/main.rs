use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use wisp::lcd::LcdImage;
use wisp::mem::mbc::Cartridge;
use wisp::mem::BootRom;
use wisp::GameBoy;

mod config;

use config::Config;

/// Runs a cartridge without a window and optionally saves the last frame it drew.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The cartridge image to run.
    rom: PathBuf,
    /// Run this 256-byte boot ROM first.
    #[arg(long)]
    boot_rom: Option<PathBuf>,
    /// How many frames to run [default: 60].
    #[arg(long)]
    frames: Option<u64>,
    /// Save the last frame to this PNG file.
    #[arg(long)]
    screenshot: Option<PathBuf>,
    /// Read settings from this file instead of ./banshee.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// The most verbose log level to print (error, warn, info, debug, or trace).
    #[arg(long)]
    log: Option<String>,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    #[display("{_0}")]
    Emulator(wisp::Error),
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
    #[display("invalid config: {_0}")]
    Config(toml::de::Error),
    #[display("could not encode the screenshot: {_0}")]
    Png(png::EncodingError),
    #[display("unknown log level \"{_0}\"")]
    #[error(ignore)]
    #[from(ignore)]
    UnknownLogLevel(String),
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("banshee: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let Args {
        rom,
        boot_rom,
        frames,
        screenshot,
        config,
        log,
    } = args;
    let config = Config::load(config.as_deref())?.overridden_by(Config {
        boot_rom,
        frames,
        screenshot,
        log,
    });
    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .with_writer(std::io::stderr)
        .init();

    let cartridge = Cartridge::from_file(&rom)?;
    let boot_rom = config.boot_rom.as_ref().map(BootRom::from_file).transpose()?;
    let mut gb = GameBoy::new(cartridge, boot_rom);

    let frames = config.frames();
    info!("Running {} for {frames} frame(s)", rom.display());
    (0..frames).for_each(|_| {
        gb.step_frame();
    });
    info!("Stopped after {} cycles", gb.cycles());
    println!("{}", gb.cpu());

    if let Some(path) = &config.screenshot {
        save_screenshot(gb.current_image(), path)?;
        info!("Saved the last frame to {}", path.display());
    }
    Ok(())
}

/// Color index 0 is the lightest shade.
fn shade(color: u8) -> u8 {
    255 - 85 * color
}

fn save_screenshot(image: &LcdImage, path: &Path) -> Result<(), Error> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, image.width() as u32, image.height() as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    let pixels: Vec<u8> = image.rows().flatten().map(shade).collect();
    writer.write_image_data(&pixels)?;
    Ok(())
}
