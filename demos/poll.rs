//! Continuously prints readings from a TFMini-Plus.
//!
//! Usage: `cargo run --example poll --features serial -- [PORT] [BAUD]`

use std::env;
use std::process::ExitCode;

use tfmini_plus::{serial, Command, Config, StdClock, TfMiniPlus};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let baud = match args.next().map(|b| b.parse::<u32>()) {
        None => 115_200,
        Some(Ok(baud)) => baud,
        Some(Err(e)) => {
            eprintln!("invalid baud rate: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let port = match serial::open(&path, baud) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("failed to open {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut lidar = TfMiniPlus::new(port, StdClock::new(), Config::default());
    let started = lidar.begin();
    println!("Status: {}", lidar.status());
    if !started {
        return ExitCode::FAILURE;
    }

    if lidar.send_command(Command::GetFirmwareVersion).is_ready() {
        if let Some(version) = lidar.version() {
            println!("Firmware version: {}", version);
        }
    } else {
        println!("Status: {} Reply: {}", lidar.status(), lidar.reply());
    }

    loop {
        let outcome = lidar.get_data();
        match outcome.into_result() {
            Ok(m) => println!("{} {} {}", m.distance, m.flux, m.temperature),
            Err(status) => println!("Status: {} Data: {}", status, lidar.frame()),
        }
    }
}
