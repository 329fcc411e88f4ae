//! Three-point drift analysis (spec §4.5).
//!
//! Drift is computed by diffing the locked, local, and upstream content of
//! each mapping read from a single temp workspace. [`compute_mapping_drift`]
//! and friends are the pure comparison logic; [`DriftEngine`] is the
//! orchestration that acquires a [`ScopedTempWorkspace`], drives an
//! injected [`VcsClient`] through the locked/upstream checkouts, reads the
//! project's local destination files, and feeds all three into the
//! comparison logic — the same collaborator-injection shape as
//! [`crate::sync::SyncEngine`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::core::{CancellationToken, GitVendorError};
use crate::fs::{RootedFs, ScopedTempWorkspace};
use crate::lockfile::Lock;
use crate::manifest::{BranchSpec, Manifest, VendorSpec};
use crate::mapping;
use crate::vcs::VcsClient;

/// Whether a mapping's content changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Unchanged,
    Modified,
    Added,
    Deleted,
}

/// Line-level diff statistics between two versions of a file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDiffStats {
    pub added: usize,
    pub removed: usize,
    pub drift_pct: f64,
}

/// Splits `content` into lines on `\n`. Preserves the documented open
/// question: `countLines("")` is 0, not 1 — an empty string has zero
/// lines, not one empty line, for every call site in this module.
fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').collect()
    }
}

/// Line count under the same zero-for-empty convention as [`split_lines`].
pub fn count_lines(content: &str) -> usize {
    split_lines(content).len()
}

/// A second, deliberately different line-counting convention used only by
/// the compliance propagator's position auto-adjust (spec §9): counts
/// `\n` occurrences plus one, with no empty-string special case, so a
/// trailing newline counts an extra (empty) line. Do not use this for
/// drift-percent math; use [`count_lines`] there.
pub fn count_lines_bytes(content: &str) -> usize {
    content.matches('\n').count() + 1
}

/// Longest common subsequence length between two line arrays, computed by
/// O(n·m) dynamic programming with O(min(n, m)) space (two rolling rows).
fn lcs_length(a: &[&str], b: &[&str]) -> usize {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut previous = vec![0usize; shorter.len() + 1];
    let mut current = vec![0usize; shorter.len() + 1];

    for &long_line in longer {
        for (j, &short_line) in shorter.iter().enumerate() {
            current[j + 1] = if long_line == short_line {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[shorter.len()]
}

/// Computes line-diff statistics between `original` and `current`
/// (spec §4.5): `removed = |a| - lcs`, `added = |b| - lcs`, and drift
/// percent `(added + removed) / max(|a|, |b|) × 100`, capped at 100. An
/// empty original with any additions is 100%.
pub fn line_diff(original: &str, current: &str) -> LineDiffStats {
    let a = split_lines(original);
    let b = split_lines(current);
    let lcs = lcs_length(&a, &b);
    let removed = a.len() - lcs;
    let added = b.len() - lcs;
    let denominator = a.len().max(b.len());
    let drift_pct = if denominator == 0 {
        0.0
    } else {
        (((added + removed) as f64 / denominator as f64) * 100.0).min(100.0)
    };
    LineDiffStats {
        added,
        removed,
        drift_pct,
    }
}

/// Emits a simple unified-style diff: `---`/`+++` headers followed by a
/// line-by-line tagged body. Not a minimal diff (no hunk consolidation);
/// deliberately simple per spec §4.5.
pub fn unified_diff(original: &str, current: &str, from_label: &str, to_label: &str) -> String {
    let a = split_lines(original);
    let b = split_lines(current);
    let ops = diff_ops(&a, &b);

    let mut out = format!("--- {from_label}\n+++ {to_label}\n");
    for op in ops {
        match op {
            DiffOp::Equal(line) => out.push_str(&format!(" {line}\n")),
            DiffOp::Remove(line) => out.push_str(&format!("-{line}\n")),
            DiffOp::Add(line) => out.push_str(&format!("+{line}\n")),
        }
    }
    out
}

enum DiffOp<'a> {
    Equal(&'a str),
    Remove(&'a str),
    Add(&'a str),
}

/// Full LCS table backtrace, used only for unified-diff emission. Diff
/// stats use [`lcs_length`]'s rolling-row variant instead; this table is
/// O(n·m) space, acceptable for the optional emission path only.
fn diff_ops<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<DiffOp<'a>> {
    let n = a.len();
    let m = b.len();
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in 0..n {
        for j in 0..m {
            table[i + 1][j + 1] = if a[i] == b[j] {
                table[i][j] + 1
            } else {
                table[i][j + 1].max(table[i + 1][j])
            };
        }
    }

    let mut ops = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            ops.push(DiffOp::Equal(a[i - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i][j - 1] >= table[i - 1][j]) {
            ops.push(DiffOp::Add(b[j - 1]));
            j -= 1;
        } else {
            ops.push(DiffOp::Remove(a[i - 1]));
            i -= 1;
        }
    }
    ops.reverse();
    ops
}

/// A single mapping's drift, local and upstream, relative to the locked
/// snapshot.
#[derive(Debug, Clone)]
pub struct MappingDrift {
    pub path: String,
    pub local_status: FileStatus,
    pub upstream_status: FileStatus,
    pub local_diff: Option<LineDiffStats>,
    pub upstream_diff: Option<LineDiffStats>,
}

impl MappingDrift {
    /// A mapping is conflict-risk when both sides changed independently.
    pub fn conflict_risk(&self) -> bool {
        self.local_status != FileStatus::Unchanged && self.upstream_status != FileStatus::Unchanged
    }
}

/// Computes one mapping's drift from its locked/local/upstream content.
/// `None` means the file is absent at that snapshot.
pub fn compute_mapping_drift(path: &str, locked: Option<&str>, local: Option<&str>, upstream: Option<&str>) -> MappingDrift {
    let local_status = file_status(locked, local);
    let upstream_status = file_status(locked, upstream);

    let local_diff = match (locked, local, local_status) {
        (Some(l), Some(c), FileStatus::Modified) => Some(line_diff(l, c)),
        (None, Some(c), FileStatus::Added) => Some(line_diff("", c)),
        _ => None,
    };
    let upstream_diff = match (locked, upstream, upstream_status) {
        (Some(l), Some(c), FileStatus::Modified) => Some(line_diff(l, c)),
        (None, Some(c), FileStatus::Added) => Some(line_diff("", c)),
        _ => None,
    };

    MappingDrift {
        path: path.to_string(),
        local_status,
        upstream_status,
        local_diff,
        upstream_diff,
    }
}

fn file_status(locked: Option<&str>, other: Option<&str>) -> FileStatus {
    match (locked, other) {
        (None, None) => FileStatus::Unchanged,
        (None, Some(_)) => FileStatus::Added,
        (Some(_), None) => FileStatus::Deleted,
        (Some(l), Some(o)) => {
            if l == o {
                FileStatus::Unchanged
            } else {
                FileStatus::Modified
            }
        }
    }
}

/// A dependency's aggregate drift across all its mappings.
#[derive(Debug, Clone)]
pub struct DependencyDrift {
    pub name: String,
    pub mappings: Vec<MappingDrift>,
    /// The upstream ref's resolved commit hash, recorded per spec §4.5 step
    /// 2. `None` when the run was offline and upstream was never checked.
    pub upstream_commit: Option<String>,
}

impl DependencyDrift {
    /// Line-weighted average drift percent across mappings that have a
    /// diff (unchanged/added/deleted-without-diff mappings contribute a
    /// weight-zero 0% and do not dilute the average beyond their absence).
    pub fn drift_percent(&self) -> f64 {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for mapping in &self.mappings {
            for diff in [mapping.local_diff, mapping.upstream_diff].into_iter().flatten() {
                let weight = (diff.added + diff.removed).max(1) as f64;
                weighted_sum += diff.drift_pct * weight;
                total_weight += weight;
            }
        }
        if total_weight == 0.0 {
            0.0
        } else {
            weighted_sum / total_weight
        }
    }

    /// Any per-mapping conflict risk makes the whole dependency conflict-risk.
    pub fn conflict_risk(&self) -> bool {
        self.mappings.iter().any(MappingDrift::conflict_risk)
    }
}

/// The overall run classification (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// No local or upstream changes anywhere.
    Clean,
    /// At least one side changed somewhere.
    Drifted,
    /// Some dependency has conflict risk.
    Conflict,
}

/// Classifies the overall run from per-dependency results.
pub fn classify_summary(dependencies: &[DependencyDrift]) -> Summary {
    if dependencies.iter().any(DependencyDrift::conflict_risk) {
        return Summary::Conflict;
    }
    let any_drifted = dependencies
        .iter()
        .flat_map(|d| &d.mappings)
        .any(|m| m.local_status != FileStatus::Unchanged || m.upstream_status != FileStatus::Unchanged);
    if any_drifted {
        Summary::Drifted
    } else {
        Summary::Clean
    }
}

/// Options controlling one [`DriftEngine::analyze_all`] run.
#[derive(Debug, Clone)]
pub struct DriftOptions {
    /// Skip the upstream checkout entirely (spec §4.5 step 2): only local
    /// drift against the locked commit is computed.
    pub offline: bool,
}

impl Default for DriftOptions {
    fn default() -> Self {
        Self {
            offline: false,
        }
    }
}

/// Drives an injected [`VcsClient`] through the three-point drift pipeline
/// (spec §4.5) for every external vendor in a manifest. Internal vendors
/// have no upstream to diff against and are covered instead by
/// [`crate::compliance::propagate`].
pub struct DriftEngine<'a, V>
where
    V: VcsClient,
{
    project_root: PathBuf,
    vcs: &'a V,
    cancellation: CancellationToken,
}

impl<'a, V> DriftEngine<'a, V>
where
    V: VcsClient,
{
    /// Builds a new engine rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, vcs: &'a V, cancellation: CancellationToken) -> Self {
        Self {
            project_root: project_root.into(),
            vcs,
            cancellation,
        }
    }

    /// Analyzes every external `(vendor, ref)` pair that already has a
    /// locked commit. A vendor with no lock entry yet has no baseline to
    /// drift against and is silently skipped, not reported as an error.
    pub async fn analyze_all(&self, manifest: &Manifest, lock: &Lock, options: &DriftOptions) -> Result<Vec<DependencyDrift>, GitVendorError> {
        let mut dependencies = Vec::new();
        for vendor in &manifest.vendors {
            if vendor.is_internal() {
                continue;
            }
            for spec in &vendor.specs {
                self.cancellation.check()?;
                if let Some(dependency) = self.analyze_vendor_spec(vendor, spec, lock, options).await? {
                    dependencies.push(dependency);
                }
            }
        }
        Ok(dependencies)
    }

    async fn analyze_vendor_spec(
        &self,
        vendor: &VendorSpec,
        spec: &BranchSpec,
        lock: &Lock,
        options: &DriftOptions,
    ) -> Result<Option<DependencyDrift>, GitVendorError> {
        let locked_commit = lock.get_hash(&vendor.name, &spec.git_ref);
        if locked_commit.is_empty() {
            return Ok(None);
        }

        let mut urls = Vec::new();
        urls.extend(vendor.url.clone());
        urls.extend(vendor.mirrors.iter().cloned());
        if urls.is_empty() {
            return Err(GitVendorError::InvalidConfig {
                reason: format!("external vendor '{}' declares no url", vendor.name),
            });
        }

        // Scoped temp workspace, guaranteed removal on every exit path —
        // the same single workspace backs both the locked and upstream
        // checkouts (spec §4.5).
        let workspace = ScopedTempWorkspace::acquire(&vendor.name)?;
        let repo_path = workspace.path();
        self.vcs.init(repo_path).await?;

        // Phase 1: check out the locked commit.
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
            match self.vcs.fetch(repo_path, &locked_commit, None, &self.cancellation).await {
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
        self.vcs.checkout(repo_path, &locked_commit).await.map_err(|e| match e {
            GitVendorError::StaleCommit {
                commit, ..
            } => GitVendorError::StaleCommit {
                vendor: vendor.name.clone(),
                commit,
            },
            other => other,
        })?;
        let locked = read_mapping_sources(repo_path, spec, &vendor.name)?;

        // Phase 2: unless offline, check out the upstream ref head,
        // falling back to `origin/<ref>` when the bare ref does not
        // resolve in a shallow fetch.
        let (upstream, upstream_commit) = if options.offline {
            (locked.clone(), None)
        } else {
            self.cancellation.check()?;
            self.vcs.fetch(repo_path, &spec.git_ref, None, &self.cancellation).await?;
            if self.vcs.checkout(repo_path, &spec.git_ref).await.is_err() {
                self.vcs.checkout(repo_path, &format!("origin/{}", spec.git_ref)).await?;
            }
            let commit = self.vcs.get_head_hash(repo_path).await?;
            let snapshot = read_mapping_sources(repo_path, spec, &vendor.name)?;
            (snapshot, Some(commit))
        };

        // Phase 3: read the local destination files from the project tree.
        let fs = RootedFs::new(&self.project_root)?;
        let local = read_local_destinations(&fs, &self.project_root, spec, &vendor.name)?;

        let paths: BTreeSet<&String> = locked.keys().chain(upstream.keys()).chain(local.keys()).collect();
        let mappings = paths
            .into_iter()
            .map(|path| compute_mapping_drift(path, locked.get(path).map(String::as_str), local.get(path).map(String::as_str), upstream.get(path).map(String::as_str)))
            .collect();

        Ok(Some(DependencyDrift {
            name: vendor.name.clone(),
            mappings,
            upstream_commit,
        }))
    }
}

/// Reads every whole-file mapping's source content relative to `source_root`,
/// keyed by destination path. Directory mappings are walked like
/// [`crate::sync`]'s copy pipeline, honoring excludes. Position-narrowed
/// mappings have no "whole file" content to diff and are skipped (spec
/// §4.5 names only whole-file mappings). A source that cannot be read as
/// UTF-8, or that does not exist at this snapshot, is simply absent from
/// the map — that absence is itself meaningful to [`compute_mapping_drift`].
fn read_mapping_sources(source_root: &Path, spec: &BranchSpec, vendor_name: &str) -> Result<BTreeMap<String, String>, GitVendorError> {
    let mut out = BTreeMap::new();
    for entry in &spec.mapping {
        let mapping = entry.clone().into_mapping();
        let destination = mapping::resolve_destination(&mapping.from, &mapping.to, spec.default_target.as_deref(), vendor_name);
        let (from_path, from_position, _) = mapping::parse_position_path(&mapping.from);
        if from_position.is_some() {
            continue;
        }
        let source_full = source_root.join(&from_path);
        if source_full.is_dir() {
            for walked in walkdir::WalkDir::new(&source_full).into_iter().filter_map(std::result::Result::ok) {
                if !walked.file_type().is_file() {
                    continue;
                }
                let relative = walked.path().strip_prefix(&source_full).map_err(|_| GitVendorError::Other {
                    message: "walked entry outside its own source directory".to_string(),
                })?;
                let relative_str = mapping::normalize_separators(&relative.to_string_lossy());
                if mapping::is_excluded(&relative_str, &mapping.exclude) {
                    continue;
                }
                let dest_key = format!("{}/{relative_str}", destination.trim_end_matches('/'));
                if let Ok(content) = std::fs::read_to_string(walked.path()) {
                    out.insert(dest_key, content);
                }
            }
        } else if let Ok(content) = std::fs::read_to_string(&source_full) {
            out.insert(destination, content);
        }
    }
    Ok(out)
}

/// Reads every whole-file mapping's current destination content from the
/// project tree, keyed the same way as [`read_mapping_sources`].
fn read_local_destinations(fs: &RootedFs, project_root: &Path, spec: &BranchSpec, vendor_name: &str) -> Result<BTreeMap<String, String>, GitVendorError> {
    let mut out = BTreeMap::new();
    for entry in &spec.mapping {
        let mapping = entry.clone().into_mapping();
        let destination = mapping::resolve_destination(&mapping.from, &mapping.to, spec.default_target.as_deref(), vendor_name);
        let (_, from_position, _) = mapping::parse_position_path(&mapping.from);
        if from_position.is_some() {
            continue;
        }
        let (to_path, _, _) = mapping::parse_position_path(&destination);
        let dest_full = project_root.join(&to_path);
        if dest_full.is_dir() {
            for walked in walkdir::WalkDir::new(&dest_full).into_iter().filter_map(std::result::Result::ok) {
                if !walked.file_type().is_file() {
                    continue;
                }
                let relative = walked.path().strip_prefix(&dest_full).map_err(|_| GitVendorError::Other {
                    message: "walked entry outside its own destination directory".to_string(),
                })?;
                let relative_str = mapping::normalize_separators(&relative.to_string_lossy());
                let dest_key = format!("{}/{relative_str}", destination.trim_end_matches('/'));
                if let Ok(content) = std::fs::read_to_string(walked.path()) {
                    out.insert(dest_key, content);
                }
            }
        } else if let Ok(bytes) = fs.read(&to_path) {
            out.insert(destination, String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_original_has_zero_lines() {
        assert_eq!(count_lines(""), 0);
    }

    #[test]
    fn count_lines_bytes_counts_trailing_newline_as_extra_line() {
        assert_eq!(count_lines_bytes(""), 1);
        assert_eq!(count_lines_bytes("a\nb"), 2);
        assert_eq!(count_lines_bytes("a\nb\n"), 3);
    }

    #[test]
    fn line_diff_spec_example_five() {
        let stats = line_diff("a\nb\nc", "a\nmodified\nc");
        assert_eq!(stats.added, 1);
        assert_eq!(stats.removed, 1);
        assert!((stats.drift_pct - 66.666_666_7).abs() < 0.01);
    }

    #[test]
    fn empty_original_with_additions_is_100_percent() {
        let stats = line_diff("", "a\nb");
        assert_eq!(stats.added, 2);
        assert_eq!(stats.removed, 0);
        assert!((stats.drift_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_content_has_no_drift() {
        let stats = line_diff("a\nb\nc", "a\nb\nc");
        assert_eq!(stats.added, 0);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.drift_pct, 0.0);
    }

    #[test]
    fn unified_diff_has_headers_and_tagged_lines() {
        let diff = unified_diff("a\nb", "a\nc", "locked", "local");
        assert!(diff.starts_with("--- locked\n+++ local\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+c\n"));
        assert!(diff.contains(" a\n"));
    }

    #[test]
    fn mapping_drift_flags_conflict_when_both_sides_changed() {
        let drift = compute_mapping_drift("f.go", Some("a"), Some("b"), Some("c"));
        assert!(drift.conflict_risk());
    }

    #[test]
    fn mapping_drift_clean_when_only_upstream_moved() {
        let drift = compute_mapping_drift("f.go", Some("a"), Some("a"), Some("c"));
        assert!(!drift.conflict_risk());
        assert_eq!(drift.local_status, FileStatus::Unchanged);
        assert_eq!(drift.upstream_status, FileStatus::Modified);
    }

    #[test]
    fn summary_clean_when_nothing_changed() {
        let dep = DependencyDrift {
            name: "lib-a".into(),
            mappings: vec![compute_mapping_drift("f.go", Some("a"), Some("a"), Some("a"))],
            upstream_commit: None,
        };
        assert_eq!(classify_summary(&[dep]), Summary::Clean);
    }

    #[test]
    fn summary_conflict_when_any_dependency_has_conflict_risk() {
        let dep = DependencyDrift {
            name: "lib-a".into(),
            mappings: vec![compute_mapping_drift("f.go", Some("a"), Some("b"), Some("c"))],
            upstream_commit: None,
        };
        assert_eq!(classify_summary(&[dep]), Summary::Conflict);
    }

    #[test]
    fn summary_drifted_when_one_side_changed_without_conflict() {
        let dep = DependencyDrift {
            name: "lib-a".into(),
            mappings: vec![compute_mapping_drift("f.go", Some("a"), Some("a"), Some("b"))],
            upstream_commit: None,
        };
        assert_eq!(classify_summary(&[dep]), Summary::Drifted);
    }

    use crate::lockfile::LockDetails;
    use crate::manifest::{Direction, MappingEntry, PathMapping, SourceKind};
    use crate::vcs::fake::FakeVcsClient;

    fn external_manifest(mapping: PathMapping) -> Manifest {
        Manifest {
            schema_version: "1.2".to_string(),
            compliance: None,
            vendors: vec![VendorSpec {
                name: "lib-a".to_string(),
                source: SourceKind::External,
                url: Some("https://example.invalid/lib-a".to_string()),
                mirrors: Vec::new(),
                license: "MIT".to_string(),
                enforcement: None,
                direction: Direction::SourceCanonical,
                specs: vec![BranchSpec {
                    git_ref: "main".to_string(),
                    default_target: None,
                    mapping: vec![MappingEntry::Detailed(mapping)],
                }],
                hooks: None,
            }],
        }
    }

    fn locked_at(commit: &str) -> Lock {
        Lock {
            schema_version: "1.2".to_string(),
            vendors: vec![LockDetails {
                name: "lib-a".to_string(),
                git_ref: "main".to_string(),
                source: SourceKind::External,
                commit_hash: commit.to_string(),
                updated: "2024-01-01T00:00:00Z".to_string(),
                license_spdx: "MIT".to_string(),
                license_path: None,
                file_hashes: BTreeMap::new(),
                source_file_hashes: BTreeMap::new(),
                position_hashes: BTreeMap::new(),
            }],
        }
    }

    #[tokio::test]
    async fn no_lock_entry_yields_no_dependency() {
        let project = tempfile::tempdir().unwrap();
        let manifest = external_manifest(PathMapping {
            from: "util.go".to_string(),
            to: "vendor/util.go".to_string(),
            exclude: Vec::new(),
        });
        let lock = Lock::default();
        let vcs = FakeVcsClient::default();

        let engine = DriftEngine::new(project.path(), &vcs, CancellationToken::new());
        let dependencies = engine.analyze_all(&manifest, &lock, &DriftOptions::default()).await.unwrap();
        assert!(dependencies.is_empty());
    }

    #[tokio::test]
    async fn local_edit_is_reported_as_modified_against_locked_content() {
        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(project.path().join("vendor")).unwrap();
        std::fs::write(project.path().join("vendor/util.go"), "hand-edited locally").unwrap();

        let manifest = external_manifest(PathMapping {
            from: "util.go".to_string(),
            to: "vendor/util.go".to_string(),
            exclude: Vec::new(),
        });
        let lock = locked_at("deadbeef");

        let vcs = FakeVcsClient::default();
        *vcs.seed_files.lock().unwrap() = [("util.go".to_string(), b"locked content".to_vec())].into_iter().collect();

        let engine = DriftEngine::new(project.path(), &vcs, CancellationToken::new());
        let dependencies = engine.analyze_all(&manifest, &lock, &DriftOptions::default()).await.unwrap();

        assert_eq!(dependencies.len(), 1);
        let dep = &dependencies[0];
        assert_eq!(dep.name, "lib-a");
        assert_eq!(dep.mappings.len(), 1);
        assert_eq!(dep.mappings[0].local_status, FileStatus::Modified);
        assert_eq!(dep.mappings[0].upstream_status, FileStatus::Unchanged);
        assert!(dep.upstream_commit.is_some());
        assert_eq!(classify_summary(&dependencies), Summary::Drifted);
    }

    #[tokio::test]
    async fn offline_skips_upstream_checkout_and_only_reports_local_drift() {
        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(project.path().join("vendor")).unwrap();
        std::fs::write(project.path().join("vendor/util.go"), "locked content").unwrap();

        let manifest = external_manifest(PathMapping {
            from: "util.go".to_string(),
            to: "vendor/util.go".to_string(),
            exclude: Vec::new(),
        });
        let lock = locked_at("deadbeef");

        let vcs = FakeVcsClient::default();
        *vcs.seed_files.lock().unwrap() = [("util.go".to_string(), b"locked content".to_vec())].into_iter().collect();

        let engine = DriftEngine::new(project.path(), &vcs, CancellationToken::new());
        let options = DriftOptions {
            offline: true,
        };
        let dependencies = engine.analyze_all(&manifest, &lock, &options).await.unwrap();

        assert_eq!(dependencies.len(), 1);
        assert!(dependencies[0].upstream_commit.is_none());
        assert_eq!(dependencies[0].mappings[0].upstream_status, FileStatus::Unchanged);
        assert_eq!(classify_summary(&dependencies), Summary::Clean);
    }
}
