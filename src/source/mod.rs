//! Remote URL provider registry (spec §6).
//!
//! Concrete provider implementations for specific git hosts (GitHub,
//! GitLab, …) are explicitly out of scope (spec §1); this module owns the
//! trait contract, the safe-scheme gate every URL must pass at manifest
//! load time (spec §7), and a generic fallback provider that never fails.

use crate::core::GitVendorError;

/// Parsed shape of a vendor URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// The base fetch URL, with any embedded ref/path stripped.
    pub base_url: String,
    /// A ref embedded in the URL, if the provider recognized one.
    pub git_ref: Option<String>,
    /// A path embedded in the URL, if the provider recognized one.
    pub path: Option<String>,
}

/// A git-host URL provider: parses a URL into its components and names
/// itself for diagnostics.
pub trait UrlProvider: Send + Sync {
    /// Attempts to parse `url`. A provider MUST NOT fail on input outside
    /// its own host convention; the generic provider always succeeds.
    fn parse(&self, url: &str) -> ParsedUrl;

    /// Short identifier for diagnostics, e.g. `"github"`, `"generic"`.
    fn name(&self) -> &'static str;
}

/// The only provider implemented in this core: treats the entire URL as
/// `base_url` with no recognized embedded ref or path. Concrete per-host
/// providers are an external collaborator per spec §1/§6.
#[derive(Debug, Default)]
pub struct GenericProvider;

impl UrlProvider for GenericProvider {
    fn parse(&self, url: &str) -> ParsedUrl {
        ParsedUrl {
            base_url: url.to_string(),
            git_ref: None,
            path: None,
        }
    }

    fn name(&self) -> &'static str {
        "generic"
    }
}

/// A registry of providers, consulted in order; falls back to
/// [`GenericProvider`] if none claim the URL more specifically. Since no
/// concrete host provider is implemented here, `detect_provider` always
/// returns `"generic"` — the registry exists so a future CLI layer can
/// register real providers without this module changing shape.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn UrlProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self {
            providers: vec![Box::new(GenericProvider)],
        }
    }
}

impl ProviderRegistry {
    /// Creates a registry with only the generic provider registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an additional provider, consulted before the generic
    /// fallback in registration order.
    pub fn register(&mut self, provider: Box<dyn UrlProvider>) {
        self.providers.insert(self.providers.len() - 1, provider);
    }

    /// Parses `url` using the first provider in the registry (the generic
    /// provider never refuses, so this always succeeds).
    pub fn parse(&self, url: &str) -> ParsedUrl {
        self.providers[0].parse(url)
    }

    /// Names the provider that would handle `url`.
    pub fn detect_provider(&self, url: &str) -> &'static str {
        self.providers[0].name()
    }
}

/// Schemes accepted for a vendor `url`/`mirrors` entry (spec §7).
const SAFE_SCHEME_PREFIXES: &[&str] = &["https://", "http://", "git://", "ssh://"];

/// Validates a URL's scheme against the safe-scheme gate.
///
/// Accepts `https://`, `http://`, `git://`, `ssh://`, and SCP-style
/// `user@host:path` references. Rejects `file://`, `ftp://`, and anything
/// else.
pub fn validate_url_scheme(url: &str) -> Result<(), GitVendorError> {
    if SAFE_SCHEME_PREFIXES.iter().any(|prefix| url.starts_with(prefix)) {
        return Ok(());
    }
    if is_scp_style(url) {
        return Ok(());
    }
    Err(GitVendorError::UnsafeUrl {
        url: url.to_string(),
    })
}

/// `user@host:path` with no scheme — the SCP-style git remote shorthand.
fn is_scp_style(url: &str) -> bool {
    if url.contains("://") {
        return false;
    }
    let Some(at_idx) = url.find('@') else {
        return false;
    };
    let after_at = &url[at_idx + 1..];
    after_at.contains(':') && !after_at.starts_with(':')
}
