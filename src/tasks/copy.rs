//! `gsdl-copy-*`: copy assets into the dist tree verbatim.
use anyhow::Result;

use super::section::run_section;
use super::{Context, Task, TaskResult, task_deps};
use crate::pipeline::Pipeline;

macro_rules! copy_task {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $section:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $ty;

        impl Task for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn should_run(&self, ctx: &Context) -> bool {
                !ctx.settings.$section.src_path.is_empty()
            }

            fn run(&self, ctx: &Context) -> Result<TaskResult> {
                run_section(ctx, "Copy", &ctx.settings.$section, &Pipeline::new())
            }
        }
    };
}

copy_task!(
    /// Copy font files.
    CopyFonts,
    "gsdl-copy-fonts",
    fonts
);
copy_task!(
    /// Copy static assets.
    CopyStatic,
    "gsdl-copy-static",
    statics
);
copy_task!(
    /// Copy data files.
    CopyData,
    "gsdl-copy-data",
    data
);

/// Every copy step.
#[derive(Debug)]
pub struct GsdlCopy;

impl Task for GsdlCopy {
    fn name(&self) -> &'static str {
        "gsdl-copy"
    }

    task_deps![CopyFonts, CopyStatic, CopyData];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{make_context, make_context_with, read, settings, write};

    #[test]
    fn fonts_have_no_default_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = make_context(tmp.path().to_path_buf());
        assert!(!CopyFonts.should_run(&ctx));
        assert!(CopyStatic.should_run(&ctx));
        assert!(CopyData.should_run(&ctx));
    }

    #[test]
    fn static_files_keep_their_layout() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/main/static/img/logo.svg", "<svg/>");
        write(tmp.path(), "src/main/static/_drafts/keep.txt", "kept");
        let ctx = make_context(tmp.path().to_path_buf());

        CopyStatic.run(&ctx).unwrap();
        assert_eq!(read(tmp.path(), "dist/img/logo.svg"), "<svg/>");
        // Only build tasks skip underscore directories.
        assert_eq!(read(tmp.path(), "dist/_drafts/keep.txt"), "kept");
    }

    #[test]
    fn data_only_copies_json() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/main/data/site.json", "{}");
        write(tmp.path(), "src/main/data/notes.txt", "x");
        let ctx = make_context(tmp.path().to_path_buf());

        CopyData.run(&ctx).unwrap();
        assert!(tmp.path().join("dist/site.json").exists());
        assert!(!tmp.path().join("dist/notes.txt").exists());
    }

    #[test]
    fn fonts_go_to_configured_destination() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/main/fonts/a.woff2", "font");
        let ctx = make_context_with(
            tmp.path().to_path_buf(),
            settings("[fonts]\nsrcPath = [\"fonts/*.woff2\"]\ndestPath = \"fonts\"\n"),
        );

        CopyFonts.run(&ctx).unwrap();
        assert_eq!(read(tmp.path(), "dist/fonts/a.woff2"), "font");
    }
}
