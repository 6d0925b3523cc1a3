//! Port number and transport protocol domain models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// PortNumber
// ============================================================================

/// A validated network port in `1..=65535`.
///
/// Port 0 means "any port" to the OS and can never be freed, so it is
/// rejected up front together with anything that does not fit in 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u16")]
pub struct PortNumber(u16);

impl PortNumber {
    /// Lowest valid port.
    pub const MIN: u16 = 1;

    /// Validate a raw port number.
    pub fn new(port: u16) -> Result<Self, Error> {
        if port < Self::MIN {
            return Err(Error::InvalidPort(u32::from(port)));
        }
        Ok(Self(port))
    }

    /// The raw port value.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for PortNumber {
    type Error = Error;

    fn try_from(port: u16) -> Result<Self, Self::Error> {
        Self::new(port)
    }
}

impl TryFrom<u32> for PortNumber {
    type Error = Error;

    fn try_from(port: u32) -> Result<Self, Self::Error> {
        let narrow = u16::try_from(port).map_err(|_| Error::InvalidPort(port))?;
        Self::new(narrow)
    }
}

impl From<PortNumber> for u16 {
    fn from(port: PortNumber) -> Self {
        port.0
    }
}

impl PartialEq<u16> for PortNumber {
    fn eq(&self, other: &u16) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for PortNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a bound socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Both protocols, in reporting order.
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }

    /// Whether this protocol passes an optional restriction.
    pub fn allowed_by(self, restriction: Option<Protocol>) -> bool {
        restriction.map_or(true, |only| only == self)
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // ss reports tcp6/udp6 only with -A, lsof and netstat use upper case
            "tcp" | "tcp6" => Ok(Protocol::Tcp),
            "udp" | "udp6" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol '{}', expected tcp or udp", other)),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_number_bounds() {
        assert!(matches!(PortNumber::new(0), Err(Error::InvalidPort(0))));
        assert_eq!(PortNumber::new(1).unwrap().get(), 1);
        assert_eq!(PortNumber::new(65535).unwrap().get(), 65535);
    }

    #[test]
    fn test_port_number_from_wide_value() {
        assert!(matches!(
            PortNumber::try_from(70000u32),
            Err(Error::InvalidPort(70000))
        ));
        assert_eq!(PortNumber::try_from(8080u32).unwrap(), 8080);
    }

    #[test]
    fn test_port_number_serde_rejects_zero() {
        let port: PortNumber = serde_json::from_str("3000").unwrap();
        assert_eq!(port.get(), 3000);
        assert!(serde_json::from_str::<PortNumber>("0").is_err());
        assert_eq!(serde_json::to_string(&port).unwrap(), "3000");
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_protocol_restriction() {
        assert!(Protocol::Tcp.allowed_by(None));
        assert!(Protocol::Tcp.allowed_by(Some(Protocol::Tcp)));
        assert!(!Protocol::Udp.allowed_by(Some(Protocol::Tcp)));
    }
}
