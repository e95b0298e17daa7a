//! Reading user options from a TOML file.
use std::path::Path;

use toml::Table;

use crate::error::ConfigError;

/// Load user options from `path`.
///
/// A missing file yields an empty table: no overrides.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_options(path: &Path) -> Result<Table, ConfigError> {
    if !path.exists() {
        return Ok(Table::new());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_options(&content, &path.display().to_string())
}

/// Parse user options from TOML text. `origin` names the source in errors.
///
/// # Errors
///
/// Returns an error if `content` is not valid TOML.
pub fn parse_options(content: &str, origin: &str) -> Result<Table, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::InvalidSyntax {
        path: origin.to_string(),
        message: e.message().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_options() {
        let tmp = tempfile::tempdir().unwrap();
        let table = load_options(&tmp.path().join("gsdl.toml")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn existing_file_is_parsed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gsdl.toml");
        std::fs::write(&path, "cleanName = \"wipe\"\n[server]\nport = 3000\n").unwrap();
        let table = load_options(&path).unwrap();
        assert_eq!(table["cleanName"].as_str(), Some("wipe"));
        assert_eq!(table["server"]["port"].as_integer(), Some(3000));
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gsdl.toml");
        std::fs::write(&path, "[server\nport = 3000\n").unwrap();
        let err = load_options(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
        assert!(err.to_string().contains("gsdl.toml"));
    }
}
