//! Path-mapping and position engine (spec §4.2).
//!
//! Owns the position-specifier grammar, auto-path computation, exclude
//! glob matching, and content extraction by line/column. Conflict and
//! cycle detection, which need the whole manifest's auto-computed paths
//! rather than one mapping at a time, live in [`conflict`] and [`cycle`].

pub mod conflict;
pub mod cycle;

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::GitVendorError;

/// A parsed position specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// `:L<n>` — a single line.
    Line(usize),
    /// `:L<a>-L<b>` — a closed line range, `a <= b`.
    LineRange {
        start: usize,
        end: usize,
    },
    /// `:L<a>-EOF` — from `a` to the last line.
    LineToEof {
        start: usize,
    },
    /// `:L<a>C<c1>:L<b>C<c2>` — a 1-indexed column range.
    ColumnRange {
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    },
}

fn column_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<path>.*):L(?P<l1>\d+)C(?P<c1>\d+):L(?P<l2>\d+)C(?P<c2>\d+)$").unwrap())
}

fn range_to_eof_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<path>.*):L(?P<l1>\d+)-EOF$").unwrap())
}

fn line_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<path>.*):L(?P<l1>\d+)-L(?P<l2>\d+)$").unwrap())
}

fn single_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<path>.*):L(?P<l1>\d+)$").unwrap())
}

/// Parses a possibly position-suffixed path. Total: never panics, and a
/// path whose `:` suffix does not match the grammar is returned as a
/// plain path with no error.
///
/// Returns `(file_path, position, error)`. `error` is only `Some` when a
/// grammar matched syntactically but failed a semantic rule (e.g. `a > b`
/// in a line range).
pub fn parse_position_path(path: &str) -> (String, Option<Position>, Option<GitVendorError>) {
    if let Some(caps) = column_range_re().captures(path) {
        let file_path = caps["path"].to_string();
        let start_line: usize = caps["l1"].parse().unwrap();
        let start_col: usize = caps["c1"].parse().unwrap();
        let end_line: usize = caps["l2"].parse().unwrap();
        let end_col: usize = caps["c2"].parse().unwrap();
        if (start_line, start_col) > (end_line, end_col) {
            return (
                file_path.clone(),
                None,
                Some(invalid_range(path, "column range start is after end")),
            );
        }
        return (
            file_path,
            Some(Position::ColumnRange {
                start_line,
                start_col,
                end_line,
                end_col,
            }),
            None,
        );
    }

    if let Some(caps) = range_to_eof_re().captures(path) {
        let file_path = caps["path"].to_string();
        let start: usize = caps["l1"].parse().unwrap();
        return (file_path, Some(Position::LineToEof { start }), None);
    }

    if let Some(caps) = line_range_re().captures(path) {
        let file_path = caps["path"].to_string();
        let start: usize = caps["l1"].parse().unwrap();
        let end: usize = caps["l2"].parse().unwrap();
        if start > end {
            return (file_path.clone(), None, Some(invalid_range(path, "line range start exceeds end")));
        }
        return (file_path, Some(Position::LineRange { start, end }), None);
    }

    if let Some(caps) = single_line_re().captures(path) {
        let file_path = caps["path"].to_string();
        let line: usize = caps["l1"].parse().unwrap();
        return (file_path, Some(Position::Line(line)), None);
    }

    (path.to_string(), None, None)
}

fn invalid_range(path: &str, reason: &str) -> GitVendorError {
    GitVendorError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Computes the destination path when `to` is empty or `"."`.
///
/// `destination = join(default_target_or_vendor_name, basename(from))`.
/// The vendor-name fallback only applies when `default_target` is absent.
pub fn auto_path(from: &str, default_target: Option<&str>, vendor_name: &str) -> String {
    let (from_path, _, _) = parse_position_path(from);
    let basename = Path::new(&from_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| from_path.clone());
    let base_dir = default_target.unwrap_or(vendor_name);
    format!("{}/{}", base_dir.trim_end_matches('/'), basename)
}

/// Resolves the effective destination for a mapping's `to` field, applying
/// auto-path computation when `to` is empty or `"."`.
pub fn resolve_destination(from: &str, to: &str, default_target: Option<&str>, vendor_name: &str) -> String {
    if to.is_empty() || to == "." {
        auto_path(from, default_target, vendor_name)
    } else {
        to.to_string()
    }
}

/// Normalizes OS-specific separators to `/` for exclude-pattern and
/// conflict comparisons.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Tests whether `relative_path` (already `/`-normalized) matches any
/// exclude pattern. `.git` trees are always skipped regardless of
/// patterns.
pub fn is_excluded(relative_path: &str, patterns: &[String]) -> bool {
    if relative_path == ".git" || relative_path.starts_with(".git/") {
        return true;
    }
    patterns.iter().any(|pattern| glob_matches(pattern, relative_path))
}

/// Shell-style glob match with `**` directory-crossing support, against an
/// already `/`-normalized path.
fn glob_matches(pattern: &str, path: &str) -> bool {
    let pattern = normalize_separators(pattern);
    match glob::Pattern::new(&pattern) {
        Ok(p) => {
            let options = glob::MatchOptions {
                case_sensitive: true,
                require_literal_separator: !pattern.contains("**"),
                require_literal_leading_dot: false,
            };
            p.matches_with(path, options)
        }
        Err(_) => false,
    }
}

/// Extracts the substring of `content` selected by `position`. Line
/// numbers are 1-indexed; `EOF` binds to the last line. A range exceeding
/// the file is an error.
pub fn extract_by_position(content: &str, position: &Position) -> Result<String, GitVendorError> {
    let lines: Vec<&str> = content.split('\n').collect();
    let line_count = lines.len();

    let in_bounds = |n: usize| n >= 1 && n <= line_count;

    match position {
        Position::Line(n) => {
            if !in_bounds(*n) {
                return Err(out_of_range(*n, line_count));
            }
            Ok(lines[n - 1].to_string())
        }
        Position::LineRange {
            start,
            end,
        } => {
            if !in_bounds(*start) || !in_bounds(*end) {
                return Err(out_of_range((*start).max(*end), line_count));
            }
            Ok(lines[start - 1..*end].join("\n"))
        }
        Position::LineToEof {
            start,
        } => {
            if !in_bounds(*start) {
                return Err(out_of_range(*start, line_count));
            }
            Ok(lines[start - 1..].join("\n"))
        }
        Position::ColumnRange {
            start_line,
            start_col,
            end_line,
            end_col,
        } => {
            if !in_bounds(*start_line) || !in_bounds(*end_line) {
                return Err(out_of_range((*start_line).max(*end_line), line_count));
            }
            if *start_line == *end_line {
                let line = lines[start_line - 1];
                let chars: Vec<char> = line.chars().collect();
                if *start_col == 0 || *end_col > chars.len() || *start_col > *end_col {
                    return Err(out_of_range(*end_col, chars.len()));
                }
                return Ok(chars[start_col - 1..*end_col].iter().collect());
            }
            let mut out = String::new();
            for (idx, line_no) in (*start_line..=*end_line).enumerate() {
                let line = lines[line_no - 1];
                let chars: Vec<char> = line.chars().collect();
                if idx > 0 {
                    out.push('\n');
                }
                if line_no == *start_line {
                    let from = (*start_col).saturating_sub(1).min(chars.len());
                    out.push_str(&chars[from..].iter().collect::<String>());
                } else if line_no == *end_line {
                    let to = (*end_col).min(chars.len());
                    out.push_str(&chars[..to].iter().collect::<String>());
                } else {
                    out.push_str(line);
                }
            }
            Ok(out)
        }
    }
}

/// Renders `path` with `position` re-attached as a `:L…` suffix — the
/// inverse of [`parse_position_path`], used to rewrite a manifest mapping
/// after [`crate::compliance::auto_adjust_position`] shifts a range.
pub fn format_position_suffix(path: &str, position: &Position) -> String {
    match position {
        Position::Line(n) => format!("{path}:L{n}"),
        Position::LineRange {
            start,
            end,
        } => format!("{path}:L{start}-L{end}"),
        Position::LineToEof {
            start,
        } => format!("{path}:L{start}-EOF"),
        Position::ColumnRange {
            start_line,
            start_col,
            end_line,
            end_col,
        } => format!("{path}:L{start_line}C{start_col}:L{end_line}C{end_col}"),
    }
}

fn out_of_range(requested: usize, available: usize) -> GitVendorError {
    GitVendorError::InvalidPath {
        path: String::new(),
        reason: format!("position {requested} exceeds file bounds (has {available} lines)"),
    }
}
