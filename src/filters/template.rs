//! Template rendering with a configurable tag syntax.
use std::collections::BTreeMap;
use std::path::PathBuf;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Value, path_loader};

use crate::config::TagSyntax;
use crate::error::{ConfigError, FilterError};
use crate::pipeline::{Contents, FileRecord, Filter};

/// Renders each record's contents as a template.
///
/// Includes and `extends` are looked up below the template root. A fresh
/// environment is built for every record, so edited templates are always
/// picked up.
#[derive(Debug, Clone)]
pub struct RenderTemplates {
    root: PathBuf,
    syntax: SyntaxConfig,
}

/// Build the renderer's syntax from tag markers.
///
/// # Errors
///
/// Returns an error if the markers are empty or ambiguous.
pub fn syntax_config(tags: &TagSyntax) -> Result<SyntaxConfig, ConfigError> {
    SyntaxConfig::builder()
        .block_delimiters(tags.block_start.clone(), tags.block_end.clone())
        .variable_delimiters(tags.variable_start.clone(), tags.variable_end.clone())
        .comment_delimiters(tags.comment_start.clone(), tags.comment_end.clone())
        .build()
        .map_err(|e| ConfigError::InvalidSettings(format!("nunjucks.tags: {e}")))
}

impl RenderTemplates {
    /// # Errors
    ///
    /// Returns an error if `tags` do not form a valid syntax.
    pub fn new(root: impl Into<PathBuf>, tags: &TagSyntax) -> Result<Self, ConfigError> {
        Ok(Self {
            root: root.into(),
            syntax: syntax_config(tags)?,
        })
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_syntax(self.syntax.clone());
        env.set_loader(path_loader(&self.root));
        env
    }

    fn context(record: &FileRecord) -> BTreeMap<&'static str, Value> {
        let mut ctx = BTreeMap::new();
        if let Some(build) = &record.data.build {
            ctx.insert("build", Value::from_serialize(&**build));
        }
        if let Some(site) = &record.data.site {
            ctx.insert("site", Value::from_object(site.clone()));
        }
        ctx
    }
}

impl Filter for RenderTemplates {
    fn name(&self) -> &'static str {
        "render-templates"
    }

    fn apply(&self, mut record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        let source = match &record.contents {
            Contents::Empty => return Ok(Some(record)),
            Contents::Stream => {
                return Err(FilterError::StreamingUnsupported {
                    path: record.display_path(),
                });
            }
            Contents::Buffer(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|e| FilterError::Template {
                    path: record.display_path(),
                    message: e.to_string(),
                })?
            }
        };

        let rendered = self
            .environment()
            .render_str(&source, Self::context(&record))
            .map_err(|e| FilterError::Template {
                path: record.display_path(),
                message: e.to_string(),
            })?;

        record.set_bytes(rendered.into_bytes());
        Ok(Some(record))
    }
}
