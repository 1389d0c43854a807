use std::io;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use encoding::all::UTF_8;
use encoding::types::{EncoderTrap, EncodingRef};
use serialport::{DataBits, Parity, SerialPort, StopBits};

use crate::discovery;

/// Read/write timeout for the serial connection, in seconds
pub const TIMEOUT: u64 = 3;

/// Default connection speed for Netum printers
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Known-good port id preferred during auto-discovery
pub const PREFERRED_PORT: &str = "COM8";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Serial port error: {0}")]
    Serial(serialport::Error),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("No printer port specified")]
    NoPort,

    #[error("Not connected to printer")]
    NotConnected,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error::Serial(e)
    }
}

/// Interface for Netum Bluetooth thermal printers.
///
/// A `Printer` owns at most one serial connection. The lifecycle is
/// construct (resolving the target port), [`connect`](Printer::connect),
/// zero or more print operations, [`disconnect`](Printer::disconnect).
/// Dropping the printer closes any open connection; reconnecting after a
/// disconnect is not a supported pattern.
pub struct Printer {
    codec: EncodingRef,
    trap: EncoderTrap,
    port_id: Option<String>,
    baud_rate: u32,
    timeout: Duration,
    connection: Option<Box<dyn SerialPort>>,
}

impl Printer {
    /// Set up connection parameters without touching the port yet.
    ///
    /// When `port` is given it is used verbatim. Otherwise, if
    /// `auto_discover` is set, the first discovered Bluetooth port is
    /// selected, preferring [`PREFERRED_PORT`] when present. Construction
    /// never fails; an unresolved port only surfaces later as
    /// [`Error::NoPort`] from [`connect`](Printer::connect).
    ///
    /// `codec` and `trap` control how text is encoded for the printer and
    /// default to UTF-8 with replacement.
    pub fn new(
        codec: Option<EncodingRef>,
        trap: Option<EncoderTrap>,
        port: Option<&str>,
        baud_rate: u32,
        auto_discover: bool,
    ) -> Self {
        let port_id = match port {
            Some(port) => Some(port.to_string()),
            None if auto_discover => auto_select(PREFERRED_PORT),
            None => {
                log::info!("No printer port specified. Please configure one manually.");
                None
            }
        };

        Printer {
            codec: codec.unwrap_or(UTF_8 as EncodingRef),
            trap: trap.unwrap_or(EncoderTrap::Replace),
            port_id,
            baud_rate,
            timeout: Duration::from_secs(TIMEOUT),
            connection: None,
        }
    }

    /// Wrap an already-open serial connection.
    ///
    /// Useful when the port needs non-default settings, and for driving a
    /// printer through a pseudo-terminal in tests.
    pub fn from_connection(port_id: impl Into<String>, connection: Box<dyn SerialPort>) -> Self {
        Printer {
            codec: UTF_8 as EncodingRef,
            trap: EncoderTrap::Replace,
            port_id: Some(port_id.into()),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_secs(TIMEOUT),
            connection: Some(connection),
        }
    }

    /// Open the serial connection to the resolved port.
    ///
    /// The port is opened with 8 data bits, no parity, 1 stop bit and a
    /// 3 second timeout. Returns [`Error::NoPort`] without any OS call
    /// when no port was resolved at construction time.
    pub fn connect(&mut self) -> Result<(), Error> {
        let port_id = match &self.port_id {
            Some(port_id) => port_id.clone(),
            None => {
                log::warn!(
                    "No printer port specified. Use auto-discovery or provide a port manually."
                );
                return Err(Error::NoPort);
            }
        };

        match serialport::new(port_id.as_str(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(self.timeout)
            .open()
        {
            Ok(connection) => {
                self.connection = Some(connection);
                log::info!("Connected to Netum printer on {}", port_id);
                Ok(())
            }
            Err(e) => {
                self.connection = None;
                log::error!("Connection failed: {}", e);
                log::warn!("Make sure the printer is:");
                log::warn!("  - Powered on");
                log::warn!("  - Bluetooth paired and connected");
                log::warn!("  - Not being used by another application");
                Err(Error::Serial(e))
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Close the connection. Calling this when already disconnected is a
    /// no-op.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            log::info!("Disconnected from printer");
        }
    }

    /// Connect (if not already connected) and return a guard that
    /// disconnects when it goes out of scope, on every exit path
    /// including panics.
    ///
    /// A failed connect is logged rather than returned, so check
    /// [`is_connected`](Printer::is_connected) inside the scope before
    /// printing.
    pub fn session(&mut self) -> Session<'_> {
        if !self.is_connected() {
            let _ = self.connect();
        }
        Session { printer: self }
    }

    // --------------------------------------------------

    fn encode(&self, content: &str) -> io::Result<Vec<u8>> {
        self.codec
            .encode(content, self.trap)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
    }

    /// Send raw bytes to the printer, then flush so everything is handed
    /// to the driver before returning. Returns the number of bytes sent.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let connection = match self.connection.as_mut() {
            Some(connection) => connection,
            None => {
                log::warn!("Not connected to printer");
                return Err(Error::NotConnected);
            }
        };

        if let Err(e) = connection.write_all(buf).and_then(|_| connection.flush()) {
            log::error!("Print failed: {}", e);
            return Err(e.into());
        }

        log::debug!("Sent {} bytes to printer", buf.len());
        Ok(buf.len())
    }
    pub fn chain_write(&mut self, buf: &[u8]) -> Result<&mut Self, Error> {
        self.write(buf).map(|_| self)
    }

    /// Print text without a trailing newline.
    pub fn print(&mut self, content: &str) -> Result<usize, Error> {
        let data = self.encode(content)?;
        self.write(data.as_slice())
    }
    pub fn chain_print(&mut self, content: &str) -> Result<&mut Self, Error> {
        self.print(content).map(|_| self)
    }

    /// Print a line of text. An empty string prints a blank line.
    pub fn println(&mut self, content: &str) -> Result<usize, Error> {
        self.print(format!("{}{}", content, "\n").as_ref())
    }
    pub fn chain_println(&mut self, content: &str) -> Result<&mut Self, Error> {
        self.println(content).map(|_| self)
    }

    /// Feed `n` blank lines, useful for separating printouts.
    pub fn feed(&mut self, n: usize) -> Result<usize, Error> {
        self.write("\n".repeat(n).as_ref())
    }
    pub fn chain_feed(&mut self, n: usize) -> Result<&mut Self, Error> {
        self.feed(n).map(|_| self)
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Scope guard returned by [`Printer::session`].
///
/// Dereferences to the underlying [`Printer`]; dropping it disconnects.
pub struct Session<'a> {
    printer: &'a mut Printer,
}

impl Deref for Session<'_> {
    type Target = Printer;

    fn deref(&self) -> &Printer {
        self.printer
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Printer {
        self.printer
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.printer.disconnect();
    }
}

// Resolve a target port through discovery. Any enumeration failure is
// reported and treated as "nothing found" so construction cannot fail.
fn auto_select(preferred: &str) -> Option<String> {
    let ports = match discovery::discover_printers() {
        Ok(ports) => ports,
        Err(e) => {
            log::warn!("Port enumeration failed: {}", e);
            Vec::new()
        }
    };

    match discovery::select_port(&ports, preferred) {
        Some(port) => {
            if port.port_id == preferred {
                log::info!(
                    "Auto-discovered Netum printer on {} (preferred)",
                    port.port_id
                );
            } else {
                log::info!("Auto-discovered Netum printer on {}", port.port_id);
            }
            if let Some(address) = &port.bluetooth_address {
                log::info!("Bluetooth address: {}", address);
            }
            Some(port.port_id.clone())
        }
        None => {
            log::info!("No Bluetooth printers found. Please specify port manually.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_without_port_fails_before_any_io() {
        let mut printer = Printer::new(None, None, None, DEFAULT_BAUD_RATE, false);
        assert!(!printer.is_connected());
        assert!(matches!(printer.connect(), Err(Error::NoPort)));
        assert!(!printer.is_connected());
    }

    #[test]
    fn write_requires_connection() {
        let mut printer = Printer::new(None, None, Some("COM8"), DEFAULT_BAUD_RATE, false);
        assert!(matches!(printer.write(b"hello"), Err(Error::NotConnected)));
        assert!(matches!(printer.println("hello"), Err(Error::NotConnected)));
        assert!(matches!(printer.feed(3), Err(Error::NotConnected)));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut printer = Printer::new(None, None, None, DEFAULT_BAUD_RATE, false);
        printer.disconnect();
        printer.disconnect();
        assert!(!printer.is_connected());
    }

    #[cfg(unix)]
    mod pty {
        use super::super::*;
        use serialport::TTYPort;
        use std::io::Read;

        fn pty_printer() -> (TTYPort, Printer) {
            let (master, slave) = TTYPort::pair().expect("failed to open pty pair");
            (master, Printer::from_connection("pty", Box::new(slave)))
        }

        fn read_back(master: &mut TTYPort, len: usize) -> Vec<u8> {
            let mut buf = vec![0u8; len];
            master
                .set_timeout(Duration::from_secs(1))
                .expect("set_timeout");
            master.read_exact(&mut buf).expect("read_exact");
            buf
        }

        #[test]
        fn println_sends_text_with_newline() {
            let (mut master, mut printer) = pty_printer();
            assert_eq!(printer.println("Hello").unwrap(), 6);
            assert_eq!(read_back(&mut master, 6), b"Hello\n");
        }

        #[test]
        fn feed_sends_exactly_n_newlines() {
            let (mut master, mut printer) = pty_printer();
            assert_eq!(printer.feed(2).unwrap(), 2);
            assert_eq!(read_back(&mut master, 2), b"\n\n");
        }

        #[test]
        fn print_does_not_append_newline() {
            let (mut master, mut printer) = pty_printer();
            assert_eq!(printer.print("receipt").unwrap(), 7);
            assert_eq!(read_back(&mut master, 7), b"receipt");
        }

        #[test]
        fn session_reuses_open_connection_and_disconnects_on_exit() {
            let (_master, mut printer) = pty_printer();
            {
                let mut session = printer.session();
                assert!(session.is_connected());
                session.println("scoped").unwrap();
            }
            assert!(!printer.is_connected());
        }

        #[test]
        fn session_disconnects_when_scope_panics() {
            use std::panic::{catch_unwind, AssertUnwindSafe};

            let (_master, mut printer) = pty_printer();
            let caught = catch_unwind(AssertUnwindSafe(|| {
                let mut session = printer.session();
                session.println("about to fail").unwrap();
                panic!("printer jam");
            }));
            assert!(caught.is_err());
            assert!(!printer.is_connected());
        }
    }
}
