//! Options resolver: user overrides merged over defaults, then normalized.
//!
//! Raw options are a [`toml::Table`]. [`resolve`] turns them into
//! [`EffectiveSettings`], a distinct type, so code that needs normalized
//! settings cannot be handed raw input by mistake. Feeding
//! [`EffectiveSettings::to_options`] back through [`resolve`] yields the
//! same settings again.
pub mod defaults;
pub mod merge;
pub mod normalize;
pub mod toml_loader;

use std::path::Path;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::error::ConfigError;

/// Sections whose value must be a table when present.
const TABLE_SECTIONS: &[&str] = &[
    "server",
    "es6",
    "less",
    "scss",
    "js",
    "css",
    "style",
    "fonts",
    "html",
    "nunjucks",
    "statics",
    "data",
    "compilers",
    "autoprefixer",
    "watch",
];

/// One glob pattern or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SrcPath {
    /// A single pattern.
    One(String),
    /// Several patterns, in order.
    Many(Vec<String>),
}

impl Default for SrcPath {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl SrcPath {
    /// The patterns as a slice, in declared order.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::One(p) => std::slice::from_ref(p),
            Self::Many(ps) => ps,
        }
    }

    /// Whether there is nothing to match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns().iter().all(String::is_empty)
    }
}

/// A source set and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Source globs, prefixed with the base root.
    #[serde(default)]
    pub src_path: SrcPath,
    /// Output directory, prefixed with the dist root.
    pub dest_path: String,
}

/// One entry of `style.bundles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDescriptor {
    /// LESS entry points.
    #[serde(default)]
    pub less_in: SrcPath,
    /// SASS/SCSS entry points.
    #[serde(default)]
    pub sass_in: SrcPath,
    /// Plain CSS to include verbatim.
    #[serde(default)]
    pub css_in: SrcPath,
    /// Output file name.
    pub out: String,
}

/// The `style` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSettings {
    /// Declared bundles; may be empty.
    #[serde(default)]
    pub bundles: Vec<BundleDescriptor>,
    /// Where bundles are written.
    pub dest_path: String,
}

/// The `server` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// TCP port of the dev server.
    pub port: u16,
    /// Whether served HTML gets the live-reload snippet.
    pub livereload: bool,
}

/// Template tag markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSyntax {
    pub block_start: String,
    pub block_end: String,
    pub variable_start: String,
    pub variable_end: String,
    pub comment_start: String,
    pub comment_end: String,
}

/// The `nunjucks` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NunjucksSettings {
    /// Tag syntax used by the template renderer.
    pub tags: TagSyntax,
    /// Accepted for compatibility; templates are never cached.
    pub watch: bool,
}

/// External command lines for transforms without an in-process implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    pub less: Vec<String>,
    pub es6: Vec<String>,
    pub js_minify: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoprefixerSettings {
    /// Browserslist queries.
    pub browsers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSettings {
    /// Debounce window for file change events, in milliseconds.
    pub debounce_ms: u64,
}

/// Fully merged, path-normalized settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSettings {
    /// Source root every `srcPath` is prefixed with.
    pub base: String,
    /// Output root every `destPath` is prefixed with.
    pub dist: String,
    /// Name of the clean task (`clean` when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_name: Option<String>,
    /// Version stamped into build info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Root directory for template lookups.
    #[serde(default)]
    pub nunjucks_template_path: String,
    pub server: ServerSettings,
    pub es6: Section,
    pub less: Section,
    pub scss: Section,
    pub js: Section,
    pub css: Section,
    pub style: StyleSettings,
    pub fonts: Section,
    pub html: Section,
    pub nunjucks: NunjucksSettings,
    pub statics: Section,
    pub data: Section,
    pub compilers: CompilerSettings,
    pub autoprefixer: AutoprefixerSettings,
    pub watch: WatchSettings,
    /// Sections and keys not interpreted here, carried through unchanged.
    #[serde(flatten, default, skip_serializing_if = "Table::is_empty")]
    pub extra: Table,
}

impl EffectiveSettings {
    /// Name of the clean task.
    #[must_use]
    pub fn clean_task_name(&self) -> &str {
        self.clean_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("clean")
    }

    /// Convert back into raw options.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be represented as TOML.
    pub fn to_options(&self) -> Result<Table, ConfigError> {
        match Value::try_from(self) {
            Ok(Value::Table(table)) => Ok(table),
            Ok(_) => Err(ConfigError::InvalidSettings(
                "settings did not serialize to a table".to_string(),
            )),
            Err(e) => Err(ConfigError::InvalidSettings(e.to_string())),
        }
    }
}

fn check_sections(options: &Table) -> Result<(), ConfigError> {
    for name in TABLE_SECTIONS {
        if let Some(value) = options.get(*name)
            && !value.is_table()
        {
            return Err(ConfigError::NotATable((*name).to_string()));
        }
    }
    Ok(())
}

/// Merge `options` over the defaults and normalize the result.
///
/// # Errors
///
/// Returns an error if a known section is not a table, a path has the
/// wrong type, or the merged tree does not have the expected shape.
pub fn resolve(options: &Table) -> Result<EffectiveSettings, ConfigError> {
    check_sections(options)?;
    let merged = merge::deep_merge(defaults::default_tree()?, options.clone());
    let normalized = normalize::normalize(merged)?;
    let settings: EffectiveSettings = Value::Table(normalized)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::InvalidSettings(e.message().to_string()))?;
    check_clean_name(&settings)?;
    Ok(settings)
}

/// The clean task must not shadow a built-in task.
fn check_clean_name(settings: &EffectiveSettings) -> Result<(), ConfigError> {
    let name = settings.clean_task_name();
    let holders = crate::tasks::all_tasks(settings)
        .iter()
        .filter(|t| t.name() == name)
        .count();
    if holders > 1 {
        return Err(ConfigError::CleanNameTaken(name.to_string()));
    }
    Ok(())
}

/// Load options from `path` (absent file means no overrides) and resolve them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if
/// [`resolve`] fails.
pub fn load(path: &Path) -> Result<EffectiveSettings, ConfigError> {
    let options = toml_loader::load_options(path)?;
    resolve(&options)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn options(src: &str) -> Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn empty_options_resolve_to_defaults() {
        let settings = resolve(&Table::new()).unwrap();
        assert_eq!(settings.base, "src/main/");
        assert_eq!(settings.dist, "dist");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(
            settings.html.src_path,
            SrcPath::One("src/main/html/**/*.html".to_string())
        );
        assert_eq!(settings.html.dest_path, "dist");
        assert_eq!(settings.nunjucks_template_path, "src/main/html/");
        assert_eq!(settings.clean_task_name(), "clean");
        assert!(settings.style.bundles.is_empty());
    }

    #[test]
    fn every_section_gets_dist_destination() {
        let settings = resolve(&Table::new()).unwrap();
        for section in [
            &settings.es6,
            &settings.less,
            &settings.scss,
            &settings.js,
            &settings.css,
            &settings.fonts,
            &settings.statics,
            &settings.data,
        ] {
            assert_eq!(section.dest_path, "dist");
        }
        assert_eq!(settings.style.dest_path, "dist");
    }

    #[test]
    fn user_overrides_replace_arrays() {
        let settings = resolve(&options(
            "[scss]\nsrcPath = [\"styles/*.scss\"]\ndestPath = \"css\"\n",
        ))
        .unwrap();
        assert_eq!(
            settings.scss.src_path.patterns(),
            ["src/main/styles/*.scss".to_string()]
        );
        assert_eq!(settings.scss.dest_path, "dist/css");
    }

    #[test]
    fn bundles_are_read() {
        let settings = resolve(&options(
            "[[style.bundles]]\nlessIn = [\"src/main/less/app.less\"]\nsassIn = \"src/main/scss/app.scss\"\nout = \"bundle.css\"\n",
        ))
        .unwrap();
        let bundle = &settings.style.bundles[0];
        assert_eq!(bundle.out, "bundle.css");
        assert_eq!(bundle.less_in.patterns().len(), 1);
        assert_eq!(bundle.sass_in.patterns(), ["src/main/scss/app.scss".to_string()]);
        assert!(bundle.css_in.is_empty());
    }

    #[test]
    fn resolving_effective_settings_again_is_identity() {
        let first = resolve(&options(
            "base = \"app/\"\ncleanName = \"wipe\"\nversion = \"1.2.3\"\n[html]\nsrcPath = [\"pages/**/*.html\"]\n[js]\ndestPath = \"scripts\"\n[extra]\nflag = true\n",
        ))
        .unwrap();
        let second = resolve(&first.to_options().unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.js.dest_path, "dist/scripts");
        assert_eq!(second.html.src_path.patterns(), ["app/pages/**/*.html".to_string()]);
    }

    #[test]
    fn unknown_sections_are_carried_through() {
        let settings = resolve(&options("[gulpyll]\nposts = \"posts/*.md\"\n")).unwrap();
        let extra = settings.extra["gulpyll"].as_table().unwrap();
        assert_eq!(extra["posts"].as_str(), Some("posts/*.md"));
        assert_eq!(extra["destPath"].as_str(), Some("dist"));
    }

    #[test]
    fn known_section_must_be_a_table() {
        let err = resolve(&options("html = \"index.html\"\n")).unwrap_err();
        assert!(matches!(err, ConfigError::NotATable(ref s) if s == "html"));
    }

    #[test]
    fn wrong_field_type_is_reported() {
        let err = resolve(&options("[server]\nport = \"eighty\"\n")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings(_)));
    }

    #[test]
    fn clean_name_cannot_shadow_another_task() {
        let err = resolve(&options("cleanName = \"build\"\n")).unwrap_err();
        assert!(matches!(err, ConfigError::CleanNameTaken(ref s) if s == "build"));
        assert!(resolve(&options("cleanName = \"clean\"\n")).is_ok());
    }

    #[test]
    fn load_reads_options_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gsdl.toml");
        std::fs::write(&path, "[server]\nport = 3000\n").unwrap();
        let settings = load(&path).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert!(settings.server.livereload);
    }
}
