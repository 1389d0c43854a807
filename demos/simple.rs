use std::error::Error;

use netum::printer::{Printer, DEFAULT_BAUD_RATE};

/// Prints a short test receipt on the first discovered printer,
/// preferring the known-good port when present.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut printer = Printer::new(None, None, None, DEFAULT_BAUD_RATE, true);
    let mut session = printer.session();
    if !session.is_connected() {
        eprintln!("Failed to connect to printer");
        return Ok(());
    }

    session
        .chain_println("=== Connection Test ===")?
        .chain_println("Printer: Netum Bluetooth")?
        .chain_println("Status: Connected successfully!")?
        .chain_feed(3)?;

    println!("Test print sent successfully");
    Ok(())
}
