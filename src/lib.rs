//! # Netum - Bluetooth Thermal Printer Driver
//!
//! Netum is a Rust library for printing on Netum NT-1809D and compatible
//! thermal receipt printers paired over the Bluetooth Serial Port
//! Profile. Once paired, the OS exposes the printer as an ordinary
//! serial port; this crate finds that port, opens it and writes text.
//!
//! - **Discovery**: enumerate Bluetooth-backed serial ports and extract
//!   the paired device's address when the OS exposes it
//! - **Printing**: plain UTF-8 text with newline and feed conventions
//!   (no ESC/POS command set; these printers take raw text)
//! - **Sessions**: a scope guard that guarantees the port is released
//!
//! ## Quick Start
//!
//! ```no_run
//! use netum::printer::{Printer, DEFAULT_BAUD_RATE};
//!
//! let mut printer = Printer::new(None, None, None, DEFAULT_BAUD_RATE, true);
//! let mut session = printer.session();
//! if session.is_connected() {
//!     session
//!         .chain_println("Hello from Netum printer!")?
//!         .chain_feed(2)?;
//! }
//! # Ok::<(), netum::printer::Error>(())
//! ```
//!
//! Operator-facing notices (chosen port, connect failures with a
//! troubleshooting checklist, byte counts) go through the [`log`] facade;
//! install any logger implementation to see them.

pub mod discovery;
pub mod printer;

// Re-exports for convenience
pub use discovery::{discover_printers, DiscoveredPort};
pub use printer::{Error, Printer, Session};
