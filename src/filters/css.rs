//! CSS post-processing: vendor prefixing, minification, source maps.
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use crate::error::{ConfigError, FilterError};
use crate::pipeline::{Contents, FileRecord, Filter};

/// Printed stylesheet and its optional source map (JSON).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssOutput {
    pub css: String,
    pub map: Option<String>,
}

/// Prefixes for the configured browsers and optionally minifies.
#[derive(Debug, Clone)]
pub struct ProcessCss {
    targets: Targets,
    minify: bool,
}

/// Resolve browserslist queries into lightningcss targets.
///
/// # Errors
///
/// Returns an error if a query is not understood.
pub fn targets_for(browsers: &[String]) -> Result<Targets, ConfigError> {
    if browsers.is_empty() {
        return Ok(Targets::default());
    }
    let resolved = Browsers::from_browserslist(browsers.iter().map(String::as_str))
        .map_err(|e| ConfigError::InvalidSettings(format!("autoprefixer.browsers: {e}")))?;
    Ok(Targets {
        browsers: resolved,
        ..Targets::default()
    })
}

impl ProcessCss {
    /// # Errors
    ///
    /// Returns an error if a browser query is not understood.
    pub fn new(browsers: &[String], minify: bool) -> Result<Self, ConfigError> {
        Ok(Self {
            targets: targets_for(browsers)?,
            minify,
        })
    }

    /// Process `source`, labelled `filename` in messages and maps.
    ///
    /// # Errors
    ///
    /// Returns an error if the stylesheet cannot be parsed or printed.
    pub fn process(&self, filename: &str, source: &str, with_map: bool) -> Result<CssOutput, FilterError> {
        let fail = |message: String| FilterError::Compile {
            compiler: "CSS",
            path: filename.to_string(),
            message,
        };

        let mut sheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| fail(e.to_string()))?;

        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| fail(e.to_string()))?;

        let mut map = if with_map {
            let mut map = SourceMap::new("/");
            map.add_source(filename);
            map.set_source_content(0, source)
                .map_err(|e| fail(e.to_string()))?;
            Some(map)
        } else {
            None
        };

        let printed = sheet
            .to_css(PrinterOptions {
                minify: self.minify,
                source_map: map.as_mut(),
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| fail(e.to_string()))?;

        let map = match map.as_mut() {
            Some(m) => Some(m.to_json(None).map_err(|e| fail(e.to_string()))?),
            None => None,
        };

        Ok(CssOutput {
            css: printed.code,
            map,
        })
    }

    /// Process a record and, when `with_map` is set, emit its source map as
    /// a sibling `<name>.map` record referenced from the stylesheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is a stream or cannot be processed.
    pub fn process_record(&self, mut record: FileRecord, with_map: bool) -> Result<Vec<FileRecord>, FilterError> {
        let source = match &record.contents {
            Contents::Empty => return Ok(vec![record]),
            Contents::Stream => {
                return Err(FilterError::StreamingUnsupported {
                    path: record.display_path(),
                });
            }
            Contents::Buffer(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };

        let file_name = record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out = self.process(&file_name, &source, with_map)?;

        let Some(map) = out.map else {
            record.set_bytes(out.css.into_bytes());
            return Ok(vec![record]);
        };

        let map_name = format!("{file_name}.map");
        let css = format!("{}\n/*# sourceMappingURL={map_name} */\n", out.css);
        let mut map_record = FileRecord::new(
            record.path.with_file_name(&map_name),
            record.base.clone(),
            Contents::Buffer(map.into_bytes()),
        );
        map_record.data = record.data.clone();
        record.set_bytes(css.into_bytes());
        Ok(vec![record, map_record])
    }
}

impl Filter for ProcessCss {
    fn name(&self) -> &'static str {
        "css"
    }

    fn apply(&self, record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        Ok(self.process_record(record, false)?.into_iter().next())
    }
}
