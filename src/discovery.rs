use serialport::{SerialPortInfo, SerialPortType};

use crate::printer::Error;

/// A serial port whose OS enumeration entry marks it as Bluetooth-backed.
///
/// Produced fresh on every [`discover_printers`] call; nothing is cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredPort {
    /// Platform port identifier used to open a connection,
    /// e.g. `COM8` or `/dev/rfcomm0`
    pub port_id: String,
    /// Human-readable description from the OS port enumeration
    pub description: String,
    /// Paired device address formatted as `XX:XX:XX:XX:XX:XX`, when the
    /// port's hardware id exposes it
    pub bluetooth_address: Option<String>,
}

/// Discover printers connected via Bluetooth.
///
/// Enumerates all serial ports visible to the OS and keeps those whose
/// description identifies them as Bluetooth-backed, in enumeration order.
/// Finding nothing is a valid result (`Ok` with an empty vec); only a
/// platform-level enumeration failure is an error.
pub fn discover_printers() -> Result<Vec<DiscoveredPort>, Error> {
    let ports = serialport::available_ports()?;
    Ok(bluetooth_ports(ports))
}

/// Filter an enumeration result down to Bluetooth-backed ports.
///
/// The relative order of the input is preserved.
pub fn bluetooth_ports(ports: Vec<SerialPortInfo>) -> Vec<DiscoveredPort> {
    ports
        .into_iter()
        .filter_map(|port| {
            let description = describe(&port.port_type);
            if !description.to_lowercase().contains("bluetooth") {
                return None;
            }
            let bluetooth_address = hardware_id(&port.port_type)
                .as_deref()
                .and_then(extract_bt_address);
            Some(DiscoveredPort {
                port_id: port.port_name,
                description,
                bluetooth_address,
            })
        })
        .collect()
}

/// Pull a Bluetooth address out of a hardware id string.
///
/// Windows encodes the paired device's address in the port's hardware id
/// as a bare run of 12 hex digits (e.g. `6622FA2B78F1`). This takes the
/// first such run and reformats it as `66:22:FA:2B:78:F1`, uppercase.
pub fn extract_bt_address(hwid: &str) -> Option<String> {
    let upper = hwid.to_uppercase();
    let bytes = upper.as_bytes();
    let start = bytes
        .windows(12)
        .position(|window| window.iter().all(u8::is_ascii_hexdigit))?;
    let digits = &bytes[start..start + 12];

    let mut groups = Vec::with_capacity(6);
    for pair in digits.chunks(2) {
        groups.push(format!("{}{}", pair[0] as char, pair[1] as char));
    }
    Some(groups.join(":"))
}

/// Pick a target among discovered ports: `preferred` if it is present
/// anywhere in the list, else the first entry.
pub fn select_port<'a>(
    ports: &'a [DiscoveredPort],
    preferred: &str,
) -> Option<&'a DiscoveredPort> {
    ports
        .iter()
        .find(|port| port.port_id == preferred)
        .or_else(|| ports.first())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        SerialPortType::UsbPort(info) => match (&info.product, &info.manufacturer) {
            (Some(product), _) => product.clone(),
            (None, Some(manufacturer)) => manufacturer.clone(),
            (None, None) => "USB serial device".to_string(),
        },
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::Unknown => "Serial port".to_string(),
    }
}

// Only USB-enumerated ports carry a hardware id string worth scanning;
// the serial number field is where Windows surfaces the paired address.
fn hardware_id(port_type: &SerialPortType) -> Option<String> {
    match port_type {
        SerialPortType::UsbPort(info) => info.serial_number.clone(),
        _ => None,
    }
}
