//! Raw scan observations and identifier hashing
//!
//! Hardware addresses never reach the log in clear: they are replaced by a
//! truncated SHA-256 digest.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One device or network seen by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observation {
    /// BLE advertisement
    Ble {
        address: String,
        rssi: i32,
        manufacturer_data: Option<Vec<u8>>,
    },
    /// Wi-Fi access point
    Wifi {
        ssid: String,
        bssid: String,
        rssi: i32,
    },
}

impl Observation {
    pub fn ble<T: Into<String>>(address: T, rssi: i32, manufacturer_data: Option<Vec<u8>>) -> Self {
        Observation::Ble {
            address: address.into(),
            rssi,
            manufacturer_data,
        }
    }

    pub fn wifi<S: Into<String>, B: Into<String>>(ssid: S, bssid: B, rssi: i32) -> Self {
        Observation::Wifi {
            ssid: ssid.into(),
            bssid: bssid.into(),
            rssi,
        }
    }

    pub fn rssi(&self) -> i32 {
        match self {
            Observation::Ble { rssi, .. } | Observation::Wifi { rssi, .. } => *rssi,
        }
    }
}

/// Lowercase hex SHA-256 of `identifier`, cut to `len` characters
pub fn hash_identifier(identifier: &str, len: usize) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(len);
    encoded
}

/// Company identifier from BLE manufacturer data (little-endian first two bytes)
pub fn manufacturer_id(data: &[u8]) -> Option<u16> {
    match data {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}
