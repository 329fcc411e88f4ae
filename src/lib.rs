//! git-vendor core — a source-vendoring engine.
//!
//! Given a declarative manifest of upstream code dependencies, this crate
//! materializes selected files from remote git repositories into a
//! consuming project, records exact provenance in a lockfile, and detects
//! when the on-disk copy, the lockfile, or the upstream has diverged.
//!
//! # Core Modules
//!
//! - [`manifest`] - `vendor.yml` parsing, validation and persistence
//! - [`lockfile`] - `vendor.lock` parsing, persistence, and three-way merge
//! - [`mapping`] - path/position parsing, auto-paths, conflict and cycle detection
//! - [`vcs`] - the abstract version-control client and its system-git implementation
//! - [`source`] - remote URL provider registry
//! - [`cache`] - content-addressed cache for sync artifacts
//! - [`license`] - license discovery/classification
//! - [`policy`] - license policy evaluation, enforcement resolution, exit codes
//! - [`hooks`] - post-copy hook execution
//! - [`confirm`] - the interactive-confirmation collaborator seam
//! - [`sync`] - the synchronization pipeline that ties the above together
//! - [`verify`] - offline integrity verification against the lockfile
//! - [`drift`] - three-point drift analysis (locked / local / upstream)
//! - [`compliance`] - bidirectional propagation for internal vendors
//! - [`fs`] - the rooted filesystem abstraction
//! - [`core`] - shared error types and cancellation primitives
//!
//! # Example
//!
//! ```toml
//! # .git-vendor/vendor.yml
//! schema_version: "1.2"
//! vendors:
//!   - name: lib-a
//!     source: external
//!     url: https://github.com/org/lib-a
//!     license: MIT
//!     specs:
//!       - ref: main
//!         mapping:
//!           - from: src/util.go
//!             to: pkg/util.go
//! ```

pub mod cache;
pub mod compliance;
pub mod confirm;
pub mod constants;
pub mod core;
pub mod drift;
pub mod fs;
pub mod hooks;
pub mod license;
pub mod lockfile;
pub mod manifest;
pub mod mapping;
pub mod policy;
pub mod source;
pub mod sync;
pub mod vcs;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
