use crate::error::LoadError;
use crate::timer::CHIP8_TIMER_HZ;
use std::path::{Path, PathBuf};

/// default instruction rate; fast enough for most games, slow enough that
/// they stay playable
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 700;

/// Behaviour that differs between interpreters and that ROMs may rely on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// EX9E clears the key after skipping, and EXA1 clears it when it finds
    /// it held, so each press is seen once
    pub key_skip_consumes: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            key_skip_consumes: true,
        }
    }
}

/// Everything a run needs besides the program image itself.
#[derive(Clone, Debug)]
pub struct Config {
    pub instructions_per_second: u32,
    pub timer_hz: u32,
    pub quirks: Quirks,
    /// extra places to look for a ROM, after the built-in ones
    pub rom_dirs: Vec<PathBuf>,
    pub mute: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: DEFAULT_INSTRUCTIONS_PER_SECOND,
            timer_hz: CHIP8_TIMER_HZ,
            quirks: Quirks::default(),
            rom_dirs: Vec::new(),
            mute: false,
        }
    }
}

impl Config {
    /// directories searched for a ROM name, in order
    pub fn rom_search_path(&self) -> Vec<PathBuf> {
        // an empty dir means "as given", which covers absolute paths and ./
        let mut dirs = vec![PathBuf::new(), PathBuf::from("roms")];
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join(".chip8").join("roms"));
        }
        dirs.extend(self.rom_dirs.iter().cloned());
        dirs
    }

    /// find `name` on the search path; the first existing file wins
    pub fn locate_rom(&self, name: &Path) -> Result<PathBuf, LoadError> {
        let searched = self.rom_search_path();
        for dir in &searched {
            let candidate = dir.join(name);
            if candidate.is_file() {
                log::debug!("found {} at {}", name.display(), candidate.display());
                return Ok(candidate);
            }
        }
        Err(LoadError::NotFound {
            name: name.to_path_buf(),
            searched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.instructions_per_second, 700);
        assert_eq!(c.timer_hz, 60);
        assert!(c.quirks.key_skip_consumes);
    }

    #[test]
    fn test_locate_rom_in_extra_dir() -> Result<(), Box<dyn std::error::Error>> {
        let dir = std::env::temp_dir().join(format!("chip8-rom-dir-{}", std::process::id()));
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("PONG"), [0x00, 0xe0])?;
        let config = Config {
            rom_dirs: vec![dir.clone()],
            ..Config::default()
        };
        let found = config.locate_rom(Path::new("PONG"));
        fs::remove_dir_all(&dir)?;
        assert_eq!(found?, dir.join("PONG"));
        Ok(())
    }

    #[test]
    fn test_locate_rom_missing() {
        let config = Config::default();
        match config.locate_rom(Path::new("no-such-rom.ch8")) {
            Err(LoadError::NotFound { name, searched }) => {
                assert_eq!(name, PathBuf::from("no-such-rom.ch8"));
                assert_eq!(searched, config.rom_search_path());
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
