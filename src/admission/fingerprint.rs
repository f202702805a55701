// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node fingerprinting (spec §4.6 "Fingerprint = SHA-256 over the node's
//! sorted physical-interface MAC addresses").

use sha2::{Digest, Sha256};

/// One physical network interface's MAC address, preferring its permanent
/// address over the currently-assigned hardware one (spec §4.6).
#[derive(Debug, Clone)]
pub struct InterfaceMac {
    pub permanent: Option<String>,
    pub hardware: String,
}

impl InterfaceMac {
    #[must_use]
    pub fn effective(&self) -> &str {
        self.permanent.as_deref().unwrap_or(&self.hardware)
    }
}

/// Computes the node fingerprint: SHA-256 over the sorted, newline-joined
/// effective MAC addresses, hex-encoded.
#[must_use]
pub fn compute_fingerprint(interfaces: &[InterfaceMac]) -> String {
    let mut macs: Vec<&str> = interfaces.iter().map(InterfaceMac::effective).collect();
    macs.sort_unstable();
    let mut hasher = Sha256::new();
    for (i, mac) in macs.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(mac.as_bytes());
    }
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_order_independent() {
        let a = vec![
            InterfaceMac { permanent: None, hardware: "aa:bb:cc".into() },
            InterfaceMac { permanent: None, hardware: "11:22:33".into() },
        ];
        let b = vec![
            InterfaceMac { permanent: None, hardware: "11:22:33".into() },
            InterfaceMac { permanent: None, hardware: "aa:bb:cc".into() },
        ];
        assert_eq!(compute_fingerprint(&a), compute_fingerprint(&b));
    }

    #[test]
    fn permanent_mac_preferred_over_hardware() {
        let with_permanent = vec![InterfaceMac {
            permanent: Some("perm:addr".into()),
            hardware: "hw:addr".into(),
        }];
        let direct = vec![InterfaceMac { permanent: None, hardware: "perm:addr".into() }];
        assert_eq!(compute_fingerprint(&with_permanent), compute_fingerprint(&direct));
    }

    #[test]
    fn different_macs_yield_different_fingerprints() {
        let a = vec![InterfaceMac { permanent: None, hardware: "aa:aa:aa".into() }];
        let b = vec![InterfaceMac { permanent: None, hardware: "bb:bb:bb".into() }];
        assert_ne!(compute_fingerprint(&a), compute_fingerprint(&b));
    }
}
