//! Bidirectional compliance propagation for internal vendors (spec §4.6).

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::constants::INTERNAL_REF_SENTINEL;
use crate::core::GitVendorError;
use crate::fs::RootedFs;
use crate::lockfile::Lock;
use crate::manifest::{Direction, Manifest, MappingEntry};
use crate::mapping::{self, Position};

/// Whether a source/destination pair has drifted, and on which side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftDirection {
    Synced,
    SourceDrift,
    DestDrift,
    BothDrift,
}

/// The action propagation takes for a pair in a given [`DriftDirection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationAction {
    None,
    CopySourceToDest,
    CopyDestToSource,
    WarnOnly,
    /// Both sides changed; requires manual resolution.
    Conflict,
}

/// The four hashes a propagation decision is made from.
#[derive(Debug, Clone, Copy)]
pub struct PairHashes<'a> {
    pub locked_source_hash: &'a str,
    pub current_source_hash: &'a str,
    pub locked_dest_hash: &'a str,
    pub current_dest_hash: &'a str,
}

/// Classifies a pair's drift direction (spec §4.6 table).
pub fn classify(hashes: &PairHashes<'_>) -> DriftDirection {
    let source_drifted = hashes.locked_source_hash != hashes.current_source_hash;
    let dest_drifted = hashes.locked_dest_hash != hashes.current_dest_hash;
    match (source_drifted, dest_drifted) {
        (false, false) => DriftDirection::Synced,
        (true, false) => DriftDirection::SourceDrift,
        (false, true) => DriftDirection::DestDrift,
        (true, true) => DriftDirection::BothDrift,
    }
}

/// Decides the action for a classified pair, given the vendor's configured
/// [`Direction`].
pub fn decide_action(drift: DriftDirection, direction: Direction) -> PropagationAction {
    match drift {
        DriftDirection::Synced => PropagationAction::None,
        DriftDirection::SourceDrift => PropagationAction::CopySourceToDest,
        DriftDirection::DestDrift => {
            if direction == Direction::Bidirectional {
                PropagationAction::CopyDestToSource
            } else {
                PropagationAction::WarnOnly
            }
        }
        DriftDirection::BothDrift => PropagationAction::Conflict,
    }
}

/// Renders an action for reporting, prefixing `would ` on a dry run
/// (spec §4.6).
pub fn describe_action(action: PropagationAction, dry_run: bool) -> String {
    let verb = match action {
        PropagationAction::None => return "no action".to_string(),
        PropagationAction::CopySourceToDest => "copy source to destination",
        PropagationAction::CopyDestToSource => "copy destination to source",
        PropagationAction::WarnOnly => "warn (dest drifted, direction is not bidirectional)",
        PropagationAction::Conflict => "conflict, manual resolution required",
    };
    if dry_run {
        format!("would {verb}")
    } else {
        verb.to_string()
    }
}

/// Shifts a position specifier's end by `delta` lines after a successful
/// propagation copy changed the destination's line count (spec §4.6).
///
/// Single-line, `EOF`, and column-range specifiers are left untouched.
/// Returns `Ok(None)` when no adjustment was needed, `Ok(Some(_))` with
/// the adjusted position, or [`GitVendorError::PositionRangeInverted`] when
/// the shift would invert the range.
pub fn auto_adjust_position(position: &Position, delta: i64, spec_text: &str) -> Result<Option<Position>, GitVendorError> {
    match position {
        Position::LineRange {
            start,
            end,
        } => {
            let adjusted_end = *end as i64 + delta;
            if adjusted_end < *start as i64 {
                return Err(GitVendorError::PositionRangeInverted {
                    spec: spec_text.to_string(),
                    delta,
                });
            }
            Ok(Some(Position::LineRange {
                start: *start,
                end: adjusted_end as usize,
            }))
        }
        Position::Line(_) | Position::LineToEof {
            ..
        } | Position::ColumnRange {
            ..
        } => Ok(None),
    }
}

/// One mapping's propagation outcome, for reporting.
#[derive(Debug, Clone)]
pub struct MappingPropagation {
    pub vendor: String,
    pub from: String,
    pub to: String,
    pub drift: DriftDirection,
    pub action: PropagationAction,
    pub description: String,
}

/// The result of one [`propagate`] pass across every internal vendor.
#[derive(Debug, Clone, Default)]
pub struct PropagationReport {
    pub items: Vec<MappingPropagation>,
    /// Whether any manifest mapping had its position specifier auto-adjusted,
    /// meaning the caller must persist `manifest` via [`crate::manifest::io::ManifestStore::save`].
    pub manifest_changed: bool,
}

/// Runs one compliance-propagation pass (spec §4.6) over every internal
/// vendor in `manifest`, reading the current working-tree state and the
/// vendor's locked hashes, copying drifted content through `fs`, and
/// auto-adjusting any manifest position specifier whose range end shifted.
///
/// On `dry_run`, no file is written and no position is adjusted — the
/// report's `description`s are prefixed with `would ` as if they had been.
pub fn propagate(
    fs: &RootedFs,
    project_root: &Path,
    manifest: &mut Manifest,
    lock: &Lock,
    dry_run: bool,
) -> Result<PropagationReport, GitVendorError> {
    let mut report = PropagationReport::default();

    for vendor in &mut manifest.vendors {
        if !vendor.is_internal() {
            continue;
        }
        let Some(details) = lock
            .vendors
            .iter()
            .find(|d| d.name == vendor.name && d.git_ref == INTERNAL_REF_SENTINEL)
        else {
            continue;
        };

        for spec in &mut vendor.specs {
            let default_target = spec.default_target.clone();
            for entry in &mut spec.mapping {
                let original = entry.clone().into_mapping();
                let mut mapping = original.clone();
                let destination = mapping::resolve_destination(&mapping.from, &mapping.to, default_target.as_deref(), &vendor.name);

                let (from_path, from_position, _) = mapping::parse_position_path(&mapping.from);
                let (to_path, to_position, _) = mapping::parse_position_path(&destination);

                let source_full = project_root.join(&from_path);
                let dest_full = project_root.join(&to_path);

                let locked_source_hash = details.source_file_hashes.get(&mapping.from).cloned().unwrap_or_default();
                let locked_dest_hash = details.file_hashes.get(&destination).cloned().unwrap_or_default();
                let current_source_hash = hash_if_exists(&source_full)?;
                let current_dest_hash = hash_if_exists(&dest_full)?;

                let hashes = PairHashes {
                    locked_source_hash: &locked_source_hash,
                    current_source_hash: &current_source_hash,
                    locked_dest_hash: &locked_dest_hash,
                    current_dest_hash: &current_dest_hash,
                };
                let drift = classify(&hashes);
                let action = decide_action(drift, vendor.direction);
                let description = describe_action(action, dry_run);

                if !dry_run {
                    match action {
                        PropagationAction::CopySourceToDest => {
                            let content = std::fs::read(&source_full)
                                .map_err(|e| GitVendorError::io("read", source_full.display().to_string(), e))?;
                            let old_lines = line_count_if_exists(&dest_full)?;
                            fs.write(&to_path, &content)?;
                            if let (Some(old), Some(position)) = (old_lines, to_position) {
                                let new_lines = crate::drift::count_lines_bytes(&String::from_utf8_lossy(&content));
                                if new_lines != old {
                                    let delta = new_lines as i64 - old as i64;
                                    if let Some(adjusted) = auto_adjust_position(&position, delta, &destination)? {
                                        mapping.to = mapping::format_position_suffix(&to_path, &adjusted);
                                        report.manifest_changed = true;
                                    }
                                }
                            }
                        }
                        PropagationAction::CopyDestToSource => {
                            let content = std::fs::read(&dest_full)
                                .map_err(|e| GitVendorError::io("read", dest_full.display().to_string(), e))?;
                            let old_lines = line_count_if_exists(&source_full)?;
                            fs.write(&from_path, &content)?;
                            if let (Some(old), Some(position)) = (old_lines, from_position) {
                                let new_lines = crate::drift::count_lines_bytes(&String::from_utf8_lossy(&content));
                                if new_lines != old {
                                    let delta = new_lines as i64 - old as i64;
                                    if let Some(adjusted) = auto_adjust_position(&position, delta, &mapping.from)? {
                                        mapping.from = mapping::format_position_suffix(&from_path, &adjusted);
                                        report.manifest_changed = true;
                                    }
                                }
                            }
                        }
                        PropagationAction::None | PropagationAction::WarnOnly | PropagationAction::Conflict => {}
                    }
                }

                if mapping != original {
                    *entry = MappingEntry::Detailed(mapping.clone());
                }
                report.items.push(MappingPropagation {
                    vendor: vendor.name.clone(),
                    from: mapping.from.clone(),
                    to: destination,
                    drift,
                    action,
                    description,
                });
            }
        }
    }

    Ok(report)
}

fn hash_if_exists(path: &Path) -> Result<String, GitVendorError> {
    if !path.is_file() {
        return Ok(String::new());
    }
    let content = std::fs::read(path).map_err(|e| GitVendorError::io("read", path.display().to_string(), e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

fn line_count_if_exists(path: &Path) -> Result<Option<usize>, GitVendorError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| GitVendorError::io("read", path.display().to_string(), e))?;
    Ok(Some(crate::drift::count_lines_bytes(&content)))
}
