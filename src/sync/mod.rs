//! Synchronization pipeline (spec §4.3) — the largest subsystem. Drives
//! an injected [`VcsClient`] through clone/fetch/checkout, license
//! discovery and policy enforcement, content-addressed mapping execution,
//! and post hooks, producing one [`LockDetails`] per `(vendor, ref)` pair.
//!
//! Collaborators are injected generically, following [`crate::vcs`]'s
//! design note: a `SyncEngine<V, C, H, L>` over the four trait
//! parameters rather than boxed trait objects, so every call remains a
//! plain (non-boxed-future) `async fn`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::cache::{CacheKey, ContentCache};
use crate::confirm::Confirm;
use crate::constants::INTERNAL_REF_SENTINEL;
use crate::core::{CancellationToken, GitVendorError};
use crate::fs::{validate_dest_path, RootedFs, ScopedTempWorkspace};
use crate::hooks::HookRunner;
use crate::license::LicenseClassifier;
use crate::lockfile::{Lock, LockDetails};
use crate::manifest::{BranchSpec, Manifest, PathMapping, SourceKind, VendorSpec};
use crate::mapping::{self, Position};
use crate::policy::{self, LicenseDecision, LicensePolicy};
use crate::source::validate_url_scheme;
use crate::vcs::VcsClient;

/// Options controlling one `sync_all` invocation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Clone/fetch depth; `None` fetches full history.
    pub depth: Option<u32>,
    /// Abort the whole run on the first vendor failure instead of
    /// continuing with the remaining vendors.
    pub strict: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            depth: Some(1),
            strict: false,
        }
    }
}

/// One vendor×ref's sync result.
pub struct VendorSyncReport {
    pub name: String,
    pub git_ref: String,
    pub outcome: Result<LockDetails, GitVendorError>,
}

/// The aggregate result of a `sync_all` run.
pub struct SyncReport {
    pub vendor_reports: Vec<VendorSyncReport>,
}

impl SyncReport {
    /// Whether every vendor synced without error.
    pub fn all_succeeded(&self) -> bool {
        self.vendor_reports.iter().all(|r| r.outcome.is_ok())
    }
}

/// Drives the full synchronization pipeline for a manifest.
pub struct SyncEngine<'a, V, C, H, L>
where
    V: VcsClient,
    C: Confirm,
    H: HookRunner,
    L: LicenseClassifier,
{
    project_root: PathBuf,
    vcs: &'a V,
    confirm: &'a C,
    hooks: &'a H,
    classifier: &'a L,
    cache: ContentCache,
    policy: Option<LicensePolicy>,
    cancellation: CancellationToken,
}

impl<'a, V, C, H, L> SyncEngine<'a, V, C, H, L>
where
    V: VcsClient,
    C: Confirm,
    H: HookRunner,
    L: LicenseClassifier,
{
    /// Builds a new engine rooted at `project_root`.
    pub fn new(
        project_root: impl Into<PathBuf>,
        vcs: &'a V,
        confirm: &'a C,
        hooks: &'a H,
        classifier: &'a L,
        policy: Option<LicensePolicy>,
        cancellation: CancellationToken,
    ) -> Self {
        let project_root = project_root.into();
        Self {
            cache: ContentCache::new(&project_root),
            project_root,
            vcs,
            confirm,
            hooks,
            classifier,
            policy,
            cancellation,
        }
    }

    /// Syncs every `(vendor, ref)` pair in manifest order (spec §4.3,
    /// §5's manifest-order requirement). A single vendor failure is
    /// reported but does not halt the others unless `options.strict`.
    #[instrument(skip(self, manifest, lock, options))]
    pub async fn sync_all(&self, manifest: &Manifest, lock: &mut Lock, options: &SyncOptions) -> SyncReport {
        let mut reports = Vec::new();

        'outer: for vendor in &manifest.vendors {
            for spec in &vendor.specs {
                if let Err(e) = self.cancellation.check() {
                    reports.push(VendorSyncReport {
                        name: vendor.name.clone(),
                        git_ref: spec.git_ref.clone(),
                        outcome: Err(e),
                    });
                    break 'outer;
                }

                let outcome = self.sync_vendor(vendor, spec, lock, options).await;
                if let Ok(details) = &outcome {
                    lock.upsert(details.clone());
                }
                let failed = outcome.is_err();
                reports.push(VendorSyncReport {
                    name: vendor.name.clone(),
                    git_ref: spec.git_ref.clone(),
                    outcome,
                });
                if failed && options.strict {
                    break 'outer;
                }
            }
        }

        SyncReport {
            vendor_reports: reports,
        }
    }

    async fn sync_vendor(
        &self,
        vendor: &VendorSpec,
        spec: &BranchSpec,
        lock: &Lock,
        options: &SyncOptions,
    ) -> Result<LockDetails, GitVendorError> {
        if vendor.is_internal() {
            self.sync_internal(vendor, spec)
        } else {
            self.sync_external(vendor, spec, lock, options).await
        }
    }

    #[instrument(skip(self, vendor, spec, lock, options), fields(vendor = %vendor.name))]
    async fn sync_external(
        &self,
        vendor: &VendorSpec,
        spec: &BranchSpec,
        lock: &Lock,
        options: &SyncOptions,
    ) -> Result<LockDetails, GitVendorError> {
        // Step 1: resolve URL list (primary, then mirrors).
        let mut urls = Vec::new();
        urls.extend(vendor.url.clone());
        urls.extend(vendor.mirrors.iter().cloned());
        if urls.is_empty() {
            return Err(GitVendorError::InvalidConfig {
                reason: format!("external vendor '{}' declares no url", vendor.name),
            });
        }
        for url in &urls {
            validate_url_scheme(url)?;
        }

        // Step 2: scoped temp workspace, guaranteed removal on every exit path.
        let workspace = ScopedTempWorkspace::acquire(&vendor.name)?;
        let repo_path = workspace.path();

        // Step 3: init, add remote, fetch with mirror fallback.
        self.vcs.init(repo_path).await?;
        let mut fetch_reasons = Vec::new();
        let mut fetched = false;
        for (idx, url) in urls.iter().enumerate() {
            self.cancellation.check()?;
            let remote_result = if idx == 0 {
                self.vcs.add_remote(repo_path, "origin", url).await
            } else {
                self.vcs.set_remote_url(repo_path, "origin", url).await
            };
            if let Err(e) = remote_result {
                fetch_reasons.push((url.clone(), e.to_string()));
                continue;
            }
            match self.vcs.fetch(repo_path, &spec.git_ref, options.depth, &self.cancellation).await {
                Ok(()) => {
                    fetched = true;
                    break;
                }
                Err(e) => fetch_reasons.push((url.clone(), e.to_string())),
            }
        }
        if !fetched {
            return Err(GitVendorError::FetchExhausted {
                vendor: vendor.name.clone(),
                attempted: urls.len(),
                reasons: fetch_reasons,
            });
        }

        self.cancellation.check()?;

        // Step 4: resolve target commit.
        let existing_commit = lock.get_hash(&vendor.name, &spec.git_ref);
        let checkout_target = if existing_commit.is_empty() {
            "FETCH_HEAD".to_string()
        } else {
            existing_commit
        };
        self.vcs.checkout(repo_path, &checkout_target).await.map_err(|e| match e {
            GitVendorError::StaleCommit {
                commit, ..
            } => GitVendorError::StaleCommit {
                vendor: vendor.name.clone(),
                commit,
            },
            other => other,
        })?;
        let commit_hash = self.vcs.get_head_hash(repo_path).await?;

        // Step 5: license discovery and policy check.
        let license_spdx = self.classifier.classify(repo_path)?;
        if let Some(policy) = &self.policy {
            match policy::evaluate(&policy.license_policy, &license_spdx) {
                LicenseDecision::Deny => {
                    return Err(GitVendorError::ComplianceFailed {
                        vendor: vendor.name.clone(),
                        reason: format!("license '{license_spdx}' is denied by policy"),
                    });
                }
                LicenseDecision::Warn => {
                    let accepted = self
                        .confirm
                        .ask(
                            &format!("Accept {license_spdx} license for '{}'?", vendor.name),
                            &format!("vendor '{}' detected license '{license_spdx}', which requires confirmation", vendor.name),
                            &self.cancellation,
                        )
                        .await?;
                    if !accepted {
                        return Err(GitVendorError::ComplianceFailed {
                            vendor: vendor.name.clone(),
                            reason: "user refused a warn-class license".to_string(),
                        });
                    }
                }
                LicenseDecision::Allow => {}
            }
        }

        // Step 6: copy license.
        let fs = RootedFs::new(&self.project_root)?;
        let license_path = match crate::license::discover_license_file(repo_path) {
            Some(source_file) => Some(crate::license::copy_license(&fs, &vendor.name, &source_file)?),
            None => None,
        };

        self.cancellation.check()?;

        // Steps 7-8: content-addressed cache lookup and mapping execution.
        let (file_hashes, position_hashes) = execute_mappings(
            repo_path,
            &fs,
            &self.cache,
            &commit_hash,
            spec,
            &vendor.name,
        )?;

        // Step 9: assemble the lock entry.
        let details = LockDetails {
            name: vendor.name.clone(),
            git_ref: spec.git_ref.clone(),
            source: SourceKind::External,
            commit_hash,
            updated: chrono::Utc::now().to_rfc3339(),
            license_spdx,
            license_path,
            file_hashes,
            source_file_hashes: BTreeMap::new(),
            position_hashes,
        };

        // Step 10: post hook (external vendors only).
        if let Some(hooks) = &vendor.hooks {
            if let Some(post) = &hooks.post {
                self.hooks.run(post, &self.project_root, &self.cancellation).await?;
            }
        }

        info!(vendor = %vendor.name, commit = %details.commit_hash, "synced vendor");
        Ok(details)
    }

    /// Internal vendors read directly from the project tree: no clone, no
    /// license step, no hooks (spec §3, §4.3).
    fn sync_internal(&self, vendor: &VendorSpec, spec: &BranchSpec) -> Result<LockDetails, GitVendorError> {
        if spec.git_ref != INTERNAL_REF_SENTINEL {
            return Err(GitVendorError::InvalidConfig {
                reason: format!("internal vendor '{}' must use ref '{INTERNAL_REF_SENTINEL}'", vendor.name),
            });
        }

        let fs = RootedFs::new(&self.project_root)?;
        let (file_hashes, position_hashes) =
            execute_mappings(&self.project_root, &fs, &self.cache, INTERNAL_REF_SENTINEL, spec, &vendor.name)?;

        let mut source_file_hashes = BTreeMap::new();
        for entry in &spec.mapping {
            let mapping = entry.clone().into_mapping();
            let (from_path, _, _) = mapping::parse_position_path(&mapping.from);
            let full_source = self.project_root.join(&from_path);
            if full_source.is_file() {
                source_file_hashes.insert(mapping.from.clone(), hash_file(&full_source)?);
            }
        }

        Ok(LockDetails {
            name: vendor.name.clone(),
            git_ref: spec.git_ref.clone(),
            source: SourceKind::Internal,
            commit_hash: INTERNAL_REF_SENTINEL.to_string(),
            updated: chrono::Utc::now().to_rfc3339(),
            license_spdx: "UNKNOWN".to_string(),
            license_path: None,
            file_hashes,
            source_file_hashes,
            position_hashes,
        })
    }
}

/// Executes every mapping in `spec` against `source_root`, writing results
/// through `fs`. Returns `(file_hashes, position_hashes)` (spec §4.3 steps
/// 7-9).
fn execute_mappings(
    source_root: &Path,
    fs: &RootedFs,
    cache: &ContentCache,
    commit_hash: &str,
    spec: &BranchSpec,
    vendor_name: &str,
) -> Result<(BTreeMap<String, String>, BTreeMap<String, String>), GitVendorError> {
    let mut file_hashes = BTreeMap::new();
    let mut position_hashes = BTreeMap::new();

    for entry in &spec.mapping {
        let mapping = entry.clone().into_mapping();
        let destination = mapping::resolve_destination(&mapping.from, &mapping.to, spec.default_target.as_deref(), vendor_name);
        validate_dest_path(&destination)?;

        let (from_path, from_position, from_error) = mapping::parse_position_path(&mapping.from);
        if let Some(e) = from_error {
            return Err(e);
        }
        let (to_path, to_position, to_error) = mapping::parse_position_path(&destination);
        if let Some(e) = to_error {
            return Err(e);
        }

        let source_full = source_root.join(&from_path);

        match from_position {
            None => {
                if source_full.is_dir() {
                    copy_directory(&source_full, fs, &mapping.exclude, cache, commit_hash, &mapping.from, &destination, &mut file_hashes)?;
                } else {
                    copy_whole_file(&source_full, fs, &to_path, cache, commit_hash, &mapping.from, &destination, &mut file_hashes)?;
                }
            }
            Some(position) => {
                let content = std::fs::read_to_string(&source_full)
                    .map_err(|e| GitVendorError::io("read", source_full.display().to_string(), e))?;
                let extracted = mapping::extract_by_position(&content, &position)?;
                write_position_extract(&extracted, fs, &to_path, to_position.as_ref())?;
                let key = format!("{}→{}", mapping.from, destination);
                position_hashes.insert(key, hash_bytes(extracted.as_bytes()));
            }
        }
    }

    Ok((file_hashes, position_hashes))
}

fn copy_whole_file(
    source: &Path,
    fs: &RootedFs,
    destination: &str,
    cache: &ContentCache,
    commit_hash: &str,
    from: &str,
    to: &str,
    file_hashes: &mut BTreeMap<String, String>,
) -> Result<(), GitVendorError> {
    let content = std::fs::read(source).map_err(|e| GitVendorError::io("read", source.display().to_string(), e))?;
    let content_hash = hash_bytes(&content);

    let fingerprint = CacheKey {
        commit_hash,
        from,
        to,
        exclude_patterns: &[],
    }
    .fingerprint();

    // Freshness is judged against the destination's current on-disk hash,
    // not the source's (spec §4.3 step 7) — a hand-edited destination must
    // never be mistaken for an up-to-date copy just because the source at
    // this commit hasn't changed.
    let dest_current_hash = fs.read(destination).map(|bytes| hash_bytes(&bytes)).unwrap_or_default();

    if !cache.is_fresh(&fingerprint, &dest_current_hash)? {
        fs.write(destination, &content)?;
        cache.store(&fingerprint, &content)?;
    }

    file_hashes.insert(destination.to_string(), content_hash);
    Ok(())
}

fn copy_directory(
    source_dir: &Path,
    fs: &RootedFs,
    exclude: &[String],
    cache: &ContentCache,
    commit_hash: &str,
    from: &str,
    to: &str,
    file_hashes: &mut BTreeMap<String, String>,
) -> Result<(), GitVendorError> {
    for entry in walkdir::WalkDir::new(source_dir).into_iter().filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| GitVendorError::Other {
                message: "walked entry outside its own source directory".to_string(),
            })?;
        let relative_str = mapping::normalize_separators(&relative.to_string_lossy());
        if mapping::is_excluded(&relative_str, exclude) {
            continue;
        }
        let destination = format!("{}/{relative_str}", to.trim_end_matches('/'));
        let mapping_from = format!("{from}/{relative_str}");
        copy_whole_file(entry.path(), fs, &destination, cache, commit_hash, &mapping_from, &destination, file_hashes)?;
    }
    Ok(())
}

fn write_position_extract(content: &str, fs: &RootedFs, destination: &str, to_position: Option<&Position>) -> Result<(), GitVendorError> {
    match to_position {
        None => fs.write(destination, content.as_bytes()),
        Some(position) => {
            let existing = fs.read(destination).ok();
            let existing_text = existing.map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
            let overlaid = overlay_at_position(&existing_text, content, position)?;
            fs.write(destination, overlaid.as_bytes())
        }
    }
}

/// Overlays `replacement` at `position` within `base`, growing the line
/// count as needed when `base` is shorter than the requested range.
fn overlay_at_position(base: &str, replacement: &str, position: &Position) -> Result<String, GitVendorError> {
    let mut lines: Vec<String> = if base.is_empty() {
        Vec::new()
    } else {
        base.split('\n').map(str::to_string).collect()
    };

    let (start, end) = match position {
        Position::Line(n) => (*n, *n),
        Position::LineRange {
            start,
            end,
        } => (*start, *end),
        Position::LineToEof {
            start,
        } => (*start, lines.len().max(*start)),
        Position::ColumnRange {
            ..
        } => {
            return Err(GitVendorError::Other {
                message: "column-range destination overlay is not supported".to_string(),
            });
        }
    };

    while lines.len() < end {
        lines.push(String::new());
    }

    let replacement_lines: Vec<String> = replacement.split('\n').map(str::to_string).collect();
    lines.splice(start - 1..end, replacement_lines);
    Ok(lines.join("\n"))
}

fn hash_file(path: &Path) -> Result<String, GitVendorError> {
    let content = std::fs::read(path).map_err(|e| GitVendorError::io("read", path.display().to_string(), e))?;
    Ok(hash_bytes(&content))
}

fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AlwaysAccept;
    use crate::hooks::NoopHookRunner;
    use crate::license::HeuristicClassifier;
    use crate::manifest::{Direction, MappingEntry};
    use crate::vcs::fake::FakeVcsClient;

    fn internal_manifest_spec(mapping: Vec<MappingEntry>) -> (VendorSpec, BranchSpec) {
        let vendor = VendorSpec {
            name: "internal-a".to_string(),
            source: SourceKind::Internal,
            url: None,
            mirrors: Vec::new(),
            license: "UNKNOWN".to_string(),
            enforcement: None,
            direction: Direction::SourceCanonical,
            specs: Vec::new(),
            hooks: None,
        };
        let spec = BranchSpec {
            git_ref: INTERNAL_REF_SENTINEL.to_string(),
            default_target: None,
            mapping,
        };
        (vendor, spec)
    }

    #[tokio::test]
    async fn internal_vendor_copies_without_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/util.go"), b"package util").unwrap();

        let (vendor, spec) = internal_manifest_spec(vec![MappingEntry::Detailed(PathMapping {
            from: "src/util.go".to_string(),
            to: "vendor/util.go".to_string(),
            exclude: Vec::new(),
        })]);

        let vcs = FakeVcsClient::default();
        let confirm = AlwaysAccept;
        let hooks = NoopHookRunner;
        let classifier = HeuristicClassifier;
        let engine = SyncEngine::new(dir.path(), &vcs, &confirm, &hooks, &classifier, None, CancellationToken::new());

        let details = engine.sync_internal(&vendor, &spec).unwrap();
        assert!(dir.path().join("vendor/util.go").exists());
        assert_eq!(details.source, SourceKind::Internal);
        assert!(details.source_file_hashes.contains_key("src/util.go"));
    }

    #[tokio::test]
    async fn external_vendor_with_no_url_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let vendor = VendorSpec {
            name: "lib-a".to_string(),
            source: SourceKind::External,
            url: None,
            mirrors: Vec::new(),
            license: "UNKNOWN".to_string(),
            enforcement: None,
            direction: Direction::SourceCanonical,
            specs: Vec::new(),
            hooks: None,
        };
        let spec = BranchSpec {
            git_ref: "main".to_string(),
            default_target: None,
            mapping: Vec::new(),
        };

        let vcs = FakeVcsClient::default();
        let confirm = AlwaysAccept;
        let hooks = NoopHookRunner;
        let classifier = HeuristicClassifier;
        let engine = SyncEngine::new(dir.path(), &vcs, &confirm, &hooks, &classifier, None, CancellationToken::new());

        let lock = Lock::default();
        let result = engine.sync_external(&vendor, &spec, &lock, &SyncOptions::default()).await;
        assert!(matches!(result, Err(GitVendorError::InvalidConfig { .. })));
    }

    #[test]
    fn position_overlay_replaces_requested_range() {
        let base = "a\nb\nc\nd";
        let pos = Position::LineRange {
            start: 2,
            end: 3,
        };
        let overlaid = overlay_at_position(base, "x\ny\nz", &pos).unwrap();
        assert_eq!(overlaid, "a\nx\ny\nz\nd");
    }

    #[test]
    fn position_overlay_grows_short_destination() {
        let pos = Position::LineRange {
            start: 3,
            end: 4,
        };
        let overlaid = overlay_at_position("a", "x\ny", &pos).unwrap();
        assert_eq!(overlaid, "a\n\nx\ny");
    }
}
