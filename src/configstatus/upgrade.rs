// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upgrade install-image selection and the staged-upgrade workaround
//! (spec §4.8 "Upgrades").

use crate::config::CoreConfig;

const SECUREBOOT_INSTALLER: &str = "ghcr.io/siderolabs/installer-secureboot";
const DEFAULT_INSTALLER: &str = "ghcr.io/siderolabs/installer";

/// `true` when the `Upgrade` API call must set `Stage=true` — a workaround
/// needed only below the configured Talos version (spec §9's recorded open
/// question: the exact cutoff is a policy, not a constant).
#[must_use]
pub fn needs_staged_upgrade(talos_version: &str, config: &CoreConfig) -> bool {
    version_less_than(talos_version, &config.staged_upgrade_below_version)
}

/// Picks the installer image for a machine (spec §4.8): the secureboot path
/// when the machine reports `SecurityState.SecureBoot=true`, otherwise the
/// default installer unless a valid non-empty schematic id names one.
#[must_use]
pub fn select_install_image(secure_boot: bool, schematic_id: Option<&str>) -> String {
    if secure_boot {
        return SECUREBOOT_INSTALLER.to_string();
    }
    match schematic_id {
        Some(id) if !id.is_empty() => format!("{DEFAULT_INSTALLER}:{id}"),
        _ => DEFAULT_INSTALLER.to_string(),
    }
}

/// Minimal `major.minor.patch` comparison; non-numeric components sort as
/// greater than numeric ones so a malformed version never blocks an upgrade.
fn version_less_than(version: &str, bound: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.trim_start_matches('v')
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(u64::MAX))
            .collect()
    };
    parse(version) < parse(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_upgrade_below_configured_bound() {
        let config = CoreConfig::builder().staged_upgrade_below_version("1.10.0").build();
        assert!(needs_staged_upgrade("1.9.4", &config));
        assert!(!needs_staged_upgrade("1.10.0", &config));
        assert!(!needs_staged_upgrade("1.11.0", &config));
    }

    #[test]
    fn secureboot_takes_precedence_over_schematic() {
        assert_eq!(select_install_image(true, Some("abc123")), SECUREBOOT_INSTALLER);
    }

    #[test]
    fn schematic_id_selects_default_installer_variant() {
        assert_eq!(select_install_image(false, Some("abc123")), "ghcr.io/siderolabs/installer:abc123");
    }

    #[test]
    fn empty_schematic_falls_back_to_bare_default_installer() {
        assert_eq!(select_install_image(false, None), DEFAULT_INSTALLER);
        assert_eq!(select_install_image(false, Some("")), DEFAULT_INSTALLER);
    }
}
