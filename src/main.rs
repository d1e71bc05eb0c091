use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use chip8::config::{Config, Quirks, DEFAULT_INSTRUCTIONS_PER_SECOND};
use chip8::display::MonoTermDisplay;
use chip8::input::{KeyMap, StdinInput};
use chip8::interpreter::Chip8Interpreter;
use chip8::machine::Machine;
use chip8::sound::{Mute, SimpleBeep, Sound};

/// Run a CHIP-8 program in the terminal. Esc quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// program image to run; bare names are also looked for in ./roms and
    /// ~/.chip8/roms
    rom: PathBuf,

    /// instructions per second
    #[arg(short, long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    ips: u32,

    /// no beeping
    #[arg(short, long)]
    mute: bool,

    /// where log output goes; RUST_LOG sets the level
    #[arg(long, default_value = "chip8.log")]
    log_file: PathBuf,

    /// leave keys held after EX9E/EXA1 see them
    #[arg(long)]
    no_key_consume: bool,

    /// more directories to look for the program in
    #[arg(long = "rom-dir")]
    rom_dirs: Vec<PathBuf>,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            instructions_per_second: args.ips,
            quirks: Quirks {
                key_skip_consumes: !args.no_key_consume,
            },
            rom_dirs: args.rom_dirs.clone(),
            mute: args.mute,
            ..Config::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // the terminal belongs to the display, so logs go to a file
    let log = File::create(&args.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log)))
        .init();

    // load before touching the terminal so load errors print cleanly
    let config = Config::from(&args);
    let path = config.locate_rom(&args.rom)?;
    let mut machine = Machine::new(config.quirks);
    machine.load_program(&mut File::open(&path)?)?;
    log::info!("loaded {}", path.display());

    // initialise
    let mut input = StdinInput::new(KeyMap::conventional())?;
    let mut display = MonoTermDisplay::new()?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };
    let mut interpreter =
        Chip8Interpreter::new(machine, &config, &mut display, &mut input, sound.as_mut());

    // the display parks the cursor below the last frame when it drops,
    // whichever way the loop ends
    interpreter.main_loop(None)?;
    Ok(())
}
