//! Android manifest placeholder handling

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Variable holding the owning application id
pub const APPLICATION_ID_VARIABLE: &str = "applicationId";

/// Manifest placeholder replaced with the owning application id
pub const APPLICATION_ID_PLACEHOLDER: &str = "${applicationId}";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("static regex is valid"));

/// Whether the manifest still needs the application id substituted
pub fn has_application_id_placeholder(manifest: &str) -> bool {
    manifest.contains(APPLICATION_ID_PLACEHOLDER)
}

/// Replace `${name}` placeholders with values from `variables`.
///
/// Unknown placeholders are left untouched for the downstream build.
pub fn substitute(manifest: &str, variables: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(manifest, |caps: &Captures<'_>| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
