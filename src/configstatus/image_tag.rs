// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image reference tag extraction (spec §8 scenario 1), grounded in
//! [`crate::resources::images::ImageInfo::tag`]'s digest/port-number-aware
//! parsing but returning a `CoreResult` the way install-image selection
//! (spec §4.8 "Upgrades") needs.

use crate::error::{CoreError, CoreResult};

/// Returns the tag of an image reference, or a `CoreError::InvalidArgument`
/// with the exact text the source produces for a tagless/digest reference.
pub fn get_tag(reference: &str) -> CoreResult<String> {
    if reference.contains('@') {
        return Err(no_tag_error(reference));
    }
    if let Some(pos) = reference.rfind(':') {
        let before_colon = &reference[..pos];
        if before_colon.contains('/') || !before_colon.contains('.') {
            return Ok(reference[pos + 1..].to_string());
        }
    }
    Err(no_tag_error(reference))
}

fn no_tag_error(reference: &str) -> CoreError {
    CoreError::InvalidArgument(format!("image reference \"{reference}\" doesn't have a tag"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_reference_extracts_the_tag() {
        assert_eq!(
            get_tag("registry.k8s.io/kube-apiserver:v1.26.1").unwrap(),
            "v1.26.1"
        );
    }

    #[test]
    fn tagless_reference_errors_with_exact_text() {
        let err = get_tag("docker.io/autonomy/installer").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument: image reference \"docker.io/autonomy/installer\" doesn't have a tag"
        );
    }

    #[test]
    fn digest_reference_has_no_tag() {
        assert!(get_tag("ghcr.io/siderolabs/kubelet@sha256:abc123").is_err());
    }

    #[test]
    fn port_number_is_not_mistaken_for_a_tag_colon() {
        // before_colon = "registry.example.com:5000/kubelet" contains '/', so
        // this one *is* a real tag; a bare "host:port" with no path has no tag.
        assert_eq!(
            get_tag("registry.example.com:5000/kubelet:v1").unwrap(),
            "v1"
        );
        assert!(get_tag("registry.example.com:5000").is_err());
    }
}
