//! The optional `banshee.toml` file. Every field can also be given on the command line, which
//! takes precedence.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::Level;

use crate::Error;

/// Looked for in the working directory when no config path is given.
pub const DEFAULT_CONFIG_PATH: &str = "banshee.toml";

pub const DEFAULT_FRAMES: u64 = 60;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Run this boot ROM before the cartridge instead of starting from the post-boot state.
    pub boot_rom: Option<PathBuf>,
    /// How many frames to run.
    pub frames: Option<u64>,
    /// Where to write the last frame as a PNG.
    pub screenshot: Option<PathBuf>,
    /// The most verbose log level to print.
    pub log: Option<String>,
}

impl Config {
    /// Reads the config at `path`. Without a path, the default file is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let data = match path {
            Some(path) => std::fs::read_to_string(path)?,
            None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(data) => data,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
                Err(err) => return Err(err.into()),
            },
        };
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, Error> {
        Ok(toml::from_str(data)?)
    }

    /// Fields set in `other` replace the ones in `self`.
    pub fn overridden_by(self, other: Self) -> Self {
        Self {
            boot_rom: other.boot_rom.or(self.boot_rom),
            frames: other.frames.or(self.frames),
            screenshot: other.screenshot.or(self.screenshot),
            log: other.log.or(self.log),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames.unwrap_or(DEFAULT_FRAMES)
    }

    pub fn log_level(&self) -> Result<Level, Error> {
        match &self.log {
            Some(level) => level
                .parse()
                .map_err(|_| Error::UnknownLogLevel(level.clone())),
            None => Ok(Level::INFO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config = Config::parse(
            r#"
            boot-rom = "dmg_boot.bin"
            frames = 120
            log = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.boot_rom, Some(PathBuf::from("dmg_boot.bin")));
        assert_eq!(config.frames(), 120);
        assert_eq!(config.screenshot, None);
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.frames(), DEFAULT_FRAMES);
        assert_eq!(config.log_level().unwrap(), Level::INFO);
    }

    #[test]
    fn unknown_fields_and_levels_are_errors() {
        assert!(matches!(Config::parse("speed = 2"), Err(Error::Config(_))));
        let config = Config {
            log: Some("loud".to_owned()),
            ..Config::default()
        };
        assert!(matches!(config.log_level(), Err(Error::UnknownLogLevel(_))));
    }

    #[test]
    fn command_line_wins() {
        let file = Config {
            frames: Some(10),
            screenshot: Some("file.png".into()),
            ..Config::default()
        };
        let cli = Config {
            frames: Some(3),
            ..Config::default()
        };
        let merged = file.overridden_by(cli);
        assert_eq!(merged.frames(), 3);
        assert_eq!(merged.screenshot, Some(PathBuf::from("file.png")));
    }
}
