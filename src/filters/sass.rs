//! SASS and SCSS compilation.
use grass::{InputSyntax, Options};

use crate::error::FilterError;
use crate::path::split;
use crate::pipeline::{Contents, FileRecord, Filter};

/// Compiles `.scss` and `.sass` records to CSS.
///
/// Imports resolve against the record's own directory. The indented
/// syntax is chosen by the `.sass` extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompileSass;

impl Filter for CompileSass {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn apply(&self, mut record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        let source = match &record.contents {
            Contents::Empty => return Ok(Some(record)),
            Contents::Stream => {
                return Err(FilterError::StreamingUnsupported {
                    path: record.display_path(),
                });
            }
            Contents::Buffer(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };

        let syntax = if split(&record.path).extension == ".sass" {
            InputSyntax::Sass
        } else {
            InputSyntax::Scss
        };
        let dir = record.path.parent().unwrap_or(&record.path).to_path_buf();
        let options = Options::default().input_syntax(syntax).load_path(&dir);

        let css = grass::from_string(source, &options).map_err(|e| FilterError::Compile {
            compiler: "SCSS",
            path: record.display_path(),
            message: e.to_string(),
        })?;

        record.set_bytes(css.into_bytes());
        record.set_extension("css");
        Ok(Some(record))
    }
}
