//! Path normalization of a merged settings tree.
//!
//! Every section's `srcPath` entries are prefixed with the base directory
//! and every `destPath` with the dist root, each at most once, so running
//! [`normalize`] over its own output changes nothing.
use toml::{Table, Value};

use super::defaults::{DEFAULT_BASE, DEFAULT_DIST};
use crate::error::ConfigError;

/// Join two slash-separated path fragments without doubling the separator.
///
/// # Examples
///
/// ```
/// use gsdl::config::normalize::join;
///
/// assert_eq!(join("src/main/", "html/**/*.html"), "src/main/html/**/*.html");
/// assert_eq!(join("dist", ""), "dist");
/// assert_eq!(join("dist", "./css"), "dist/css");
/// ```
#[must_use]
pub fn join(root: &str, rest: &str) -> String {
    let root = root.trim_end_matches('/');
    let rest = rest.trim_start_matches("./").trim_start_matches('/');
    match (root.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}/{rest}"),
    }
}

fn prefix_once(root: &str, entry: &str) -> String {
    if entry.contains(root) {
        entry.to_string()
    } else {
        join(root, entry)
    }
}

fn non_empty_str<'a>(settings: &'a Table, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn prefix_src_path(section: &str, src: &mut Value, base: &str) -> Result<(), ConfigError> {
    match src {
        Value::String(s) => {
            if !s.is_empty() {
                *s = prefix_once(base, s);
            }
            Ok(())
        }
        Value::Array(entries) => {
            for entry in entries {
                let Value::String(s) = entry else {
                    return Err(ConfigError::InvalidSettings(format!(
                        "{section}.srcPath entries must be strings"
                    )));
                };
                *s = prefix_once(base, s);
            }
            Ok(())
        }
        _ => Err(ConfigError::InvalidSettings(format!(
            "{section}.srcPath must be a string or an array of strings"
        ))),
    }
}

/// Derive the template lookup root from an HTML source pattern: everything
/// before the first wildcard, or the whole pattern when the wildcard is
/// missing or leads.
#[must_use]
pub fn template_root(pattern: &str) -> String {
    match pattern.find('*') {
        Some(idx) if idx > 0 => pattern[..idx].to_string(),
        _ => pattern.to_string(),
    }
}

fn first_html_pattern(settings: &Table) -> Option<String> {
    let html = settings.get("html")?.as_table()?;
    match html.get("srcPath")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(entries) => entries.first()?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Normalize the source and destination paths of a merged settings tree.
///
/// # Errors
///
/// Returns an error if a `srcPath` or `destPath` has the wrong type.
pub fn normalize(mut settings: Table) -> Result<Table, ConfigError> {
    let base = non_empty_str(&settings, "base")
        .unwrap_or(DEFAULT_BASE)
        .to_string();
    let dist = non_empty_str(&settings, "dist")
        .unwrap_or(DEFAULT_DIST)
        .to_string();

    settings.insert("base".to_string(), Value::String(base.clone()));
    settings.insert("dist".to_string(), Value::String(dist.clone()));

    for (key, value) in &mut settings {
        let Value::Table(section) = value else {
            continue;
        };

        if let Some(src) = section.get_mut("srcPath") {
            prefix_src_path(key, src, &base)?;
        }

        let dest = match section.get("destPath") {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ConfigError::InvalidSettings(format!(
                    "{key}.destPath must be a string"
                )));
            }
        };
        let dest = if dest.is_empty() {
            dist.clone()
        } else {
            prefix_once(&dist, &dest)
        };
        section.insert("destPath".to_string(), Value::String(dest));
    }

    if non_empty_str(&settings, "nunjucksTemplatePath").is_none()
        && let Some(pattern) = first_html_pattern(&settings)
    {
        settings.insert(
            "nunjucksTemplatePath".to_string(),
            Value::String(template_root(&pattern)),
        );
    }

    Ok(settings)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn table(src: &str) -> Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn join_collapses_separators() {
        assert_eq!(join("src/main/", "/less/*.less"), "src/main/less/*.less");
        assert_eq!(join("src/main", "less/*.less"), "src/main/less/*.less");
        assert_eq!(join("", "less"), "less");
    }

    #[test]
    fn scalar_src_path_is_prefixed() {
        let out = normalize(table("[html]\nsrcPath = \"html/**/*.html\"\n")).unwrap();
        assert_eq!(out["html"]["srcPath"].as_str(), Some("src/main/html/**/*.html"));
    }

    #[test]
    fn array_src_path_entries_are_prefixed() {
        let out =
            normalize(table("[scss]\nsrcPath = [\"sass/*.sass\", \"src/main/scss/*.scss\"]\n"))
                .unwrap();
        let src = out["scss"]["srcPath"].as_array().unwrap();
        assert_eq!(src[0].as_str(), Some("src/main/sass/*.sass"));
        assert_eq!(src[1].as_str(), Some("src/main/scss/*.scss"));
    }

    #[test]
    fn custom_base_and_dist_are_honoured() {
        let out = normalize(table(
            "base = \"app/\"\ndist = \"public\"\n[js]\nsrcPath = \"js/*.js\"\ndestPath = \"scripts\"\n",
        ))
        .unwrap();
        assert_eq!(out["js"]["srcPath"].as_str(), Some("app/js/*.js"));
        assert_eq!(out["js"]["destPath"].as_str(), Some("public/scripts"));
    }

    #[test]
    fn missing_dest_path_defaults_to_dist() {
        let out = normalize(table("[fonts]\nsrcPath = []\n")).unwrap();
        assert_eq!(out["fonts"]["destPath"].as_str(), Some("dist"));
    }

    #[test]
    fn empty_dest_path_defaults_to_dist() {
        let out = normalize(table("[css]\ndestPath = \"\"\n")).unwrap();
        assert_eq!(out["css"]["destPath"].as_str(), Some("dist"));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let once = normalize(table(
            "[html]\nsrcPath = \"html/**/*.html\"\n[less]\nsrcPath = [\"less/*.less\"]\ndestPath = \"css\"\n",
        ))
        .unwrap();
        let twice = normalize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn template_path_stops_at_first_wildcard() {
        let out = normalize(table("[html]\nsrcPath = \"html/**/*.html\"\n")).unwrap();
        assert_eq!(out["nunjucksTemplatePath"].as_str(), Some("src/main/html/"));
    }

    #[test]
    fn template_path_uses_first_array_entry() {
        let out = normalize(table("[html]\nsrcPath = [\"pages/*.html\", \"other/*.html\"]\n"))
            .unwrap();
        assert_eq!(out["nunjucksTemplatePath"].as_str(), Some("src/main/pages/"));
    }

    #[test]
    fn explicit_template_path_is_kept() {
        let out = normalize(table(
            "nunjucksTemplatePath = \"templates\"\n[html]\nsrcPath = \"html/*.html\"\n",
        ))
        .unwrap();
        assert_eq!(out["nunjucksTemplatePath"].as_str(), Some("templates"));
    }

    #[test]
    fn template_root_without_wildcard_is_whole_pattern() {
        assert_eq!(template_root("src/main/html/index.html"), "src/main/html/index.html");
        assert_eq!(template_root("*.html"), "*.html");
    }

    #[test]
    fn non_string_src_entry_is_rejected() {
        let err = normalize(table("[js]\nsrcPath = [1, 2]\n")).unwrap_err();
        assert!(err.to_string().contains("js.srcPath"));
    }
}
