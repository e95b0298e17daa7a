//! Built-in settings tree that user options are merged over.
use toml::Table;

use crate::error::ConfigError;

/// Source root used when the options do not name one.
pub const DEFAULT_BASE: &str = "src/main/";

/// Output root used when the options do not name one.
pub const DEFAULT_DIST: &str = "dist";

const DEFAULTS: &str = r##"
[server]
port = 8080
livereload = true

[es6]
srcPath = ["es6/*.js"]
destPath = ""

[less]
srcPath = ["less/*.less"]
destPath = ""

[scss]
srcPath = ["sass/*.sass", "scss/*.scss"]
destPath = ""

[js]
srcPath = ["js/**/*.js"]
destPath = ""

[css]
srcPath = ["css/**/*.css"]
destPath = ""

[style]
bundles = []
destPath = ""

[fonts]
srcPath = []
destPath = ""

[html]
srcPath = "html/**/*.html"
destPath = ""

[nunjucks]
watch = false

[nunjucks.tags]
blockStart = "{%"
blockEnd = "%}"
variableStart = "{$"
variableEnd = "$}"
commentStart = "{#"
commentEnd = "#}"

[statics]
srcPath = "static/**/*"
destPath = ""

[data]
srcPath = "data/**/*.json"
destPath = ""

[compilers]
less = ["lessc", "--include-path={dir}", "-"]
es6 = ["esbuild", "{path}", "--bundle", "--format=iife"]
jsMinify = ["terser", "--compress", "--mangle"]

[autoprefixer]
browsers = ["last 2 versions"]

[watch]
debounceMs = 200
"##;

/// Parse the built-in defaults into a fresh table.
///
/// # Errors
///
/// Returns an error only if the embedded defaults are malformed.
pub fn default_tree() -> Result<Table, ConfigError> {
    toml::from_str(DEFAULTS).map_err(|e| ConfigError::InvalidSyntax {
        path: "<defaults>".to_string(),
        message: e.to_string(),
    })
}
