//! Expanding source globs into file records.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{Pattern, glob};

use super::record::{Contents, FileRecord};
use crate::error::FilterError;

fn has_magic(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// The directory part of `pattern` before its first wildcard segment.
///
/// # Examples
///
/// ```
/// use gsdl::pipeline::source::glob_parent;
///
/// assert_eq!(glob_parent("src/main/html/**/*.html"), "src/main/html");
/// assert_eq!(glob_parent("src/main/less/app.less"), "src/main/less");
/// assert_eq!(glob_parent("*.css"), "");
/// ```
#[must_use]
pub fn glob_parent(pattern: &str) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal = segments
        .iter()
        .position(|s| has_magic(s))
        .unwrap_or_else(|| segments.len().saturating_sub(1));
    segments
        .iter()
        .take(literal)
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Expand `{a,b}` alternatives into separate patterns, since `glob`
/// matches braces literally.
///
/// Groups nest, and a group without a comma is kept as written.
///
/// ```
/// use gsdl::pipeline::source::expand_braces;
///
/// assert_eq!(
///     expand_braces("js/**/*.{js,es6}"),
///     vec!["js/**/*.js".to_string(), "js/**/*.es6".to_string()]
/// );
/// ```
#[must_use]
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let mut depth = 0usize;
    let mut bounds = vec![open];
    let mut close = None;
    for (i, c) in pattern.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => bounds.push(i),
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };
    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    if bounds.len() == 1 {
        return expand_braces(tail)
            .into_iter()
            .map(|rest| format!("{}{rest}", &pattern[..=close]))
            .collect();
    }
    bounds.push(close);
    bounds
        .windows(2)
        .flat_map(|w| expand_braces(&format!("{head}{}{tail}", &pattern[w[0] + 1..w[1]])))
        .collect()
}

fn rooted(root: &Path, pattern: &str) -> String {
    let root = Pattern::escape(&root.to_string_lossy());
    if pattern.is_empty() {
        root
    } else {
        format!("{}/{}", root.trim_end_matches('/'), pattern)
    }
}

fn read(path: &Path) -> Result<Contents, FilterError> {
    std::fs::read(path)
        .map(Contents::Buffer)
        .map_err(|source| FilterError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Expand `patterns` relative to `root` into records, in pattern order.
///
/// A pattern starting with `!` excludes matches of the remaining patterns.
/// Directories are skipped, and a file matched by several patterns is
/// emitted once, with the base of the first pattern that matched it.
///
/// # Errors
///
/// Returns an error if a pattern is malformed or a matched file cannot be
/// read.
pub fn src(root: &Path, patterns: &[String]) -> Result<Vec<FileRecord>, FilterError> {
    let mut excludes = Vec::new();
    for neg in patterns.iter().filter_map(|p| p.strip_prefix('!')) {
        for alt in expand_braces(neg) {
            excludes.push(Pattern::new(&rooted(root, &alt)).map_err(|e| FilterError::Pattern {
                pattern: neg.to_string(),
                message: e.to_string(),
            })?);
        }
    }

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut records = Vec::new();

    for pattern in patterns.iter().filter(|p| !p.is_empty() && !p.starts_with('!')) {
        let base = root.join(glob_parent(pattern));
        let mut entries = Vec::new();
        for alt in expand_braces(pattern) {
            entries.extend(glob(&rooted(root, &alt)).map_err(|e| FilterError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?);
        }

        for entry in entries {
            let path = entry.map_err(|e| FilterError::Io {
                path: e.path().display().to_string(),
                source: e.into_error(),
            })?;
            if !path.is_file()
                || excludes.iter().any(|x| x.matches_path(&path))
                || !seen.insert(path.clone())
            {
                continue;
            }
            let contents = read(&path)?;
            records.push(FileRecord::new(path, base.clone(), contents));
        }
    }

    Ok(records)
}

/// Whether `path` matches any of `patterns` (relative to `root`).
#[must_use]
pub fn matches_any(root: &Path, patterns: &[String], path: &Path) -> bool {
    let mut matched = false;
    for pattern in patterns.iter().filter(|p| !p.is_empty()) {
        let (negated, body) = match pattern.strip_prefix('!') {
            Some(body) => (true, body),
            None => (false, pattern.as_str()),
        };
        let hit = expand_braces(body)
            .iter()
            .filter_map(|alt| Pattern::new(&rooted(root, alt)).ok())
            .any(|compiled| compiled.matches_path(path));
        if hit {
            if negated {
                return false;
            }
            matched = true;
        }
    }
    matched
}
