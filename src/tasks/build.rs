//! `gsdl-build-*`: compile sources into the dist tree.
use std::sync::Arc;

use anyhow::Result;

use super::section::run_section;
use super::{Context, Task, TaskResult, task_deps};
use crate::bundle::Bundler;
use crate::filters::{
    AttachSitePaths, CompileSass, ExternalCommand, IgnorePartials, IgnoreUnderscoreDirs, ProcessCss,
    RenderTemplates, StampBuildInfo, StripMaps,
};
use crate::pipeline::Pipeline;

/// Production tail for style pipelines: drop maps, then minify.
fn css_for_production(pipeline: Pipeline, ctx: &Context) -> Result<Pipeline> {
    if !ctx.production {
        return Ok(pipeline);
    }
    Ok(pipeline.pipe(StripMaps).pipe(ProcessCss::new(&[], true)?))
}

/// Production tail for script pipelines: drop maps, then minify.
fn js_for_production(pipeline: Pipeline, ctx: &Context) -> Pipeline {
    if !ctx.production {
        return pipeline;
    }
    pipeline.pipe(StripMaps).pipe(ExternalCommand::new(
        "js-minify",
        ctx.settings.compilers.js_minify.clone(),
        None,
    ))
}

/// Hook point for data loading ahead of HTML rendering.
#[derive(Debug)]
pub struct BuildData;

impl Task for BuildData {
    fn name(&self) -> &'static str {
        "gsdl-build-data"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
        Ok(TaskResult::Ok)
    }
}

/// Render HTML templates with build info and site paths in scope.
#[derive(Debug)]
pub struct BuildHtml;

impl BuildHtml {
    fn pipeline(ctx: &Context) -> Result<Pipeline> {
        let settings = &ctx.settings;
        let mut pipeline = Pipeline::new().pipe(IgnoreUnderscoreDirs);
        for hook in ctx.html_hooks.iter() {
            pipeline = pipeline.pipe_shared(Arc::clone(hook));
        }
        Ok(pipeline
            .pipe(StampBuildInfo::new(Arc::clone(&ctx.build_info)))
            .pipe(AttachSitePaths)
            .pipe(RenderTemplates::new(
                ctx.path(&settings.nunjucks_template_path),
                &settings.nunjucks.tags,
            )?))
    }
}

impl Task for BuildHtml {
    fn name(&self) -> &'static str {
        "gsdl-build-html"
    }

    task_deps![BuildData];

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.html.src_path.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        run_section(ctx, "HTML", &ctx.settings.html, &Self::pipeline(ctx)?)
    }
}

/// Compile LESS sources with the configured `lessc`.
#[derive(Debug)]
pub struct BuildLess;

impl Task for BuildLess {
    fn name(&self) -> &'static str {
        "gsdl-build-less"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.less.src_path.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let pipeline = Pipeline::new()
            .pipe(IgnoreUnderscoreDirs)
            .pipe(IgnorePartials)
            .pipe(ExternalCommand::new(
                "less",
                ctx.settings.compilers.less.clone(),
                Some("css"),
            ));
        let pipeline = css_for_production(pipeline, ctx)?;
        run_section(ctx, "LESS", &ctx.settings.less, &pipeline)
    }
}

/// Compile SASS and SCSS sources.
#[derive(Debug)]
pub struct BuildScss;

impl Task for BuildScss {
    fn name(&self) -> &'static str {
        "gsdl-build-scss"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.scss.src_path.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let pipeline = Pipeline::new()
            .pipe(IgnoreUnderscoreDirs)
            .pipe(IgnorePartials)
            .pipe(CompileSass);
        let pipeline = css_for_production(pipeline, ctx)?;
        run_section(ctx, "SCSS", &ctx.settings.scss, &pipeline)
    }
}

/// Copy plain CSS, minified in production.
#[derive(Debug)]
pub struct BuildCss;

impl Task for BuildCss {
    fn name(&self) -> &'static str {
        "gsdl-build-css"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.css.src_path.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let pipeline = css_for_production(Pipeline::new().pipe(IgnoreUnderscoreDirs), ctx)?;
        run_section(ctx, "CSS", &ctx.settings.css, &pipeline)
    }
}

/// Build every declared style bundle.
#[derive(Debug)]
pub struct BuildStyle;

impl Task for BuildStyle {
    fn name(&self) -> &'static str {
        "gsdl-build-style"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let bundles = &ctx.settings.style.bundles;
        let bundler = Bundler::new(&ctx.settings, &ctx.root, ctx.production, ctx.dry_run)?;
        match bundler.build_bundles(bundles, &*ctx.log) {
            Ok(0) => Ok(TaskResult::Skipped("no bundles declared".to_string())),
            Ok(count) => {
                ctx.log.info(&format!("{count} bundle(s) built"));
                Ok(if ctx.dry_run {
                    TaskResult::DryRun
                } else {
                    TaskResult::Ok
                })
            }
            Err(e) => {
                ctx.log.error(&format!("Bundle Error: {e}"));
                Err(e.into())
            }
        }
    }
}

/// Bundle ES6 entry points with the configured bundler.
#[derive(Debug)]
pub struct BuildEs6;

impl Task for BuildEs6 {
    fn name(&self) -> &'static str {
        "gsdl-build-es6"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.es6.src_path.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let pipeline = Pipeline::new().pipe(ExternalCommand::new(
            "es6",
            ctx.settings.compilers.es6.clone(),
            None,
        ));
        run_section(ctx, "JSPM", &ctx.settings.es6, &js_for_production(pipeline, ctx))
    }
}

/// Copy plain scripts, minified in production.
#[derive(Debug)]
pub struct BuildJs;

impl Task for BuildJs {
    fn name(&self) -> &'static str {
        "gsdl-build-js"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.settings.js.src_path.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let pipeline = js_for_production(Pipeline::new().pipe(IgnoreUnderscoreDirs), ctx);
        run_section(ctx, "JS.ES5", &ctx.settings.js, &pipeline)
    }
}

/// Every build step.
#[derive(Debug)]
pub struct GsdlBuild;

impl Task for GsdlBuild {
    fn name(&self) -> &'static str {
        "gsdl-build"
    }

    task_deps![BuildHtml, BuildEs6, BuildJs, BuildStyle, BuildLess, BuildScss, BuildCss];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
        Ok(TaskResult::Ok)
    }
}
