//! # chip8
//!
//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * the core is a state machine that executes exactly one instruction per
//!   call and hands control back; it knows nothing about terminals, time or
//!   sound
//! * timers count down at 60 Hz of wall-clock time, independent of how fast
//!   instructions run
//! * display, input and sound are traits, so a variety of kinds of screen,
//!   keyboard and speaker would work; terminal implementations are provided
//! * behaviour that differs between interpreters lives in [`config::Quirks`]
//!
//! Model
//!
//! ```text
//! main
//!  |-- config(cli args)
//!  |-- machine: memory(font, program) + registers, stack, timers, screen, keys
//!  |-- display, input(keymap), sound
//!  `-- interpreter(machine, display, input, sound, config)
//!       `-- main loop
//!            |-- input events -> keypad
//!            |-- machine.step()      // fetch, decode, execute one instruction
//!            |     `-- FX0A parks here until a key goes down or we quit
//!            |-- timers.advance(elapsed) -> tone on/off
//!            |-- redraw if the screen changed
//!            `-- sleep off the rest of the cycle
//! ```
pub mod config;
pub mod cpu;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod sound;
pub mod timer;
