//! PID units and actuator control loops for no-std targets.
//!
//! For a runnable host, see the `pid-app/sim-host` binary.
#![no_std]

pub mod utils;
