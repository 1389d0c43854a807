/// Lists the Bluetooth serial ports a paired Netum printer could be
/// behind, with the paired device address where the OS exposes one.
///
/// Run with `RUST_LOG=info` to also see the discovery notices.
fn main() {
    env_logger::init();

    let printers = match netum::discover_printers() {
        Ok(printers) => printers,
        Err(e) => {
            eprintln!("Port enumeration failed: {}", e);
            std::process::exit(1);
        }
    };

    if printers.is_empty() {
        println!("No Bluetooth printers found.");
        println!();
        println!("Troubleshooting:");
        println!("1. Make sure your Netum printer is powered on");
        println!("2. Pair the printer in the system Bluetooth settings");
        println!("3. Ensure the printer is connected (not just paired)");
        return;
    }

    println!("=== Available Netum Printers ===");
    for (i, printer) in printers.iter().enumerate() {
        println!("{}. Port: {}", i + 1, printer.port_id);
        println!("   Description: {}", printer.description);
        if let Some(address) = &printer.bluetooth_address {
            println!("   Bluetooth Address: {}", address);
        }
        println!();
    }
}
