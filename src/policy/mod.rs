//! License policy evaluation and enforcement resolution (spec §4.7).

pub mod exit_code;

use serde::{Deserialize, Serialize};

use crate::core::GitVendorError;
use crate::manifest::{ComplianceConfig, ComplianceMode, Enforcement, Manifest, VendorSpec};

/// The outcome of evaluating a detected license against a [`LicensePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseDecision {
    /// Hard block; no user override.
    Deny,
    /// Prompts the confirmation collaborator; a refusal is a compliance failure.
    Warn,
    /// Passes silently.
    Allow,
}

/// Optional license policy loaded from `.git-vendor-policy.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// The nested `license_policy` key, per the on-disk format.
    pub license_policy: LicensePolicy,
}

/// `deny` / `warn` / `allow` lists of SPDX identifiers plus the decision
/// for anything unrecognized. Invariant: no identifier appears in more
/// than one list (not enforced here; a misconfigured policy simply
/// resolves to whichever list is checked first, see [`evaluate`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicensePolicy {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub warn: Vec<String>,
    pub unknown: LicenseDecision,
}

impl Serialize for LicenseDecision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Deny => "deny",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for LicenseDecision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "warn" => Ok(Self::Warn),
            "deny" => Ok(Self::Deny),
            other => Err(serde::de::Error::custom(format!("unknown license decision '{other}'"))),
        }
    }
}

/// Evaluates `detected_license` against `policy` (spec §4.7 steps 1-5).
///
/// Empty, `NONE`, and `UNKNOWN` labels all fall through to the `unknown`
/// field, as does anything matching none of the three lists. `deny` is
/// checked before `allow` so a license listed in both resolves to `deny`.
pub fn evaluate(policy: &LicensePolicy, detected_license: &str) -> LicenseDecision {
    let normalized = detected_license.trim();
    if normalized.is_empty() || normalized.eq_ignore_ascii_case("none") || normalized.eq_ignore_ascii_case("unknown") {
        return policy.unknown;
    }
    if contains_case_insensitive(&policy.deny, normalized) {
        return LicenseDecision::Deny;
    }
    if contains_case_insensitive(&policy.allow, normalized) {
        return LicenseDecision::Allow;
    }
    if contains_case_insensitive(&policy.warn, normalized) {
        return LicenseDecision::Warn;
    }
    policy.unknown
}

fn contains_case_insensitive(list: &[String], needle: &str) -> bool {
    list.iter().any(|candidate| candidate.eq_ignore_ascii_case(needle))
}

/// Resolves the effective [`Enforcement`] for `vendor_name` given the
/// manifest's optional [`ComplianceConfig`] (spec §4.7).
pub fn resolve_enforcement(manifest: &Manifest, vendor: &VendorSpec) -> Enforcement {
    let Some(compliance) = &manifest.compliance else {
        return Enforcement::Lenient;
    };
    match compliance.mode {
        ComplianceMode::Override => compliance.default,
        ComplianceMode::Default => vendor.enforcement.unwrap_or(compliance.default),
    }
}

/// Loads a [`PolicyDocument`] from YAML text.
pub fn parse_policy(yaml: &str) -> Result<PolicyDocument, GitVendorError> {
    serde_yaml::from_str(yaml).map_err(|e| GitVendorError::InvalidConfig {
        reason: format!("malformed policy document: {e}"),
    })
}
