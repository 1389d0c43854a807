use netum::printer::{Error, Printer, DEFAULT_BAUD_RATE};

#[test]
fn unresolved_port_surfaces_at_connect() {
    let mut printer = Printer::new(None, None, None, DEFAULT_BAUD_RATE, false);
    assert!(matches!(printer.connect(), Err(Error::NoPort)));
    assert!(!printer.is_connected());
}

#[test]
fn explicit_port_wins_but_printing_still_needs_connect() {
    let mut printer = Printer::new(None, None, Some("COM8"), DEFAULT_BAUD_RATE, true);
    assert!(matches!(
        printer.println("not yet connected"),
        Err(Error::NotConnected)
    ));
}

#[cfg(unix)]
mod pty {
    use super::*;
    use serialport::{SerialPort, TTYPort};
    use std::io::Read;
    use std::time::Duration;

    #[test]
    fn receipt_round_trip() {
        let (mut master, slave) = TTYPort::pair().unwrap();
        let mut printer = Printer::from_connection("pty", Box::new(slave));

        printer
            .chain_println("=== Connection Test ===")
            .unwrap()
            .chain_println("Printer: Netum Bluetooth")
            .unwrap()
            .chain_println("Status: Connected successfully!")
            .unwrap()
            .chain_feed(3)
            .unwrap();

        let expected: &[u8] =
            b"=== Connection Test ===\nPrinter: Netum Bluetooth\nStatus: Connected successfully!\n\n\n\n";
        let mut buf = vec![0u8; expected.len()];
        master.set_timeout(Duration::from_secs(1)).unwrap();
        master.read_exact(&mut buf).unwrap();
        assert_eq!(buf, expected);
    }

    #[test]
    fn session_scope_releases_the_port() {
        let (_master, slave) = TTYPort::pair().unwrap();
        let mut printer = Printer::from_connection("pty", Box::new(slave));
        {
            let mut session = printer.session();
            assert!(session.is_connected());
            session.println("inside the scope").unwrap();
        }
        assert!(!printer.is_connected());

        // A second disconnect stays a no-op
        printer.disconnect();
        assert!(!printer.is_connected());
    }
}
