//! Development tasks: rebuild on change and serve the dist tree.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::build::{BuildCss, BuildEs6, BuildHtml, BuildJs, BuildLess, BuildScss, BuildStyle};
use super::copy::{CopyData, CopyFonts, CopyStatic};
use super::dist::Dist;
use super::porcelain::{BuildAll, DefaultTask};
use super::{Context, Service, Task, TaskResult, task_deps};
use crate::config::{EffectiveSettings, SrcPath};
use crate::logging::Logger;
use crate::server::{self, ServeOptions};
use crate::watch::{self, WatchRule};

fn rule(patterns: Vec<String>, task: impl Task) -> Option<WatchRule> {
    (!patterns.is_empty()).then(|| WatchRule {
        patterns,
        task: Arc::new(task),
    })
}

fn patterns(src: &SrcPath) -> Vec<String> {
    src.patterns().to_vec()
}

/// Which task re-runs for a change to which sources.
///
/// Style bundles are rebuilt when any bundle input or any LESS, SCSS or
/// CSS source changes.
#[must_use]
pub fn watch_rules(settings: &EffectiveSettings) -> Vec<WatchRule> {
    let mut style: Vec<String> = settings
        .style
        .bundles
        .iter()
        .flat_map(|b| [&b.less_in, &b.sass_in, &b.css_in])
        .flat_map(|s| s.patterns().iter().cloned())
        .collect();
    if !settings.style.bundles.is_empty() {
        for section in [&settings.less, &settings.scss, &settings.css] {
            style.extend(patterns(&section.src_path));
        }
    }

    [
        rule(style, BuildStyle),
        rule(patterns(&settings.es6.src_path), BuildEs6),
        rule(patterns(&settings.js.src_path), BuildJs),
        rule(patterns(&settings.css.src_path), BuildCss),
        rule(patterns(&settings.less.src_path), BuildLess),
        rule(patterns(&settings.scss.src_path), BuildScss),
        rule(patterns(&settings.html.src_path), BuildHtml),
        rule(patterns(&settings.fonts.src_path), CopyFonts),
        rule(patterns(&settings.statics.src_path), CopyStatic),
        rule(patterns(&settings.data.src_path), CopyData),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn start_watching(ctx: &Context) -> Result<TaskResult> {
    let rules = watch_rules(&ctx.settings);
    if ctx.dry_run {
        ctx.log
            .dry_run(&format!("would watch {} source set(s)", rules.len()));
        return Ok(TaskResult::DryRun);
    }
    // Rebuild output must not wait for this task's buffered log to flush.
    let watch_ctx = ctx.with_log(Arc::new(Logger::new("watch")));
    let debounce = Duration::from_millis(ctx.settings.watch.debounce_ms);
    let handle = watch::start(watch_ctx, rules, debounce)?;
    ctx.register_service(Service::Watcher(handle));
    Ok(TaskResult::Ok)
}

fn start_server(ctx: &Context) -> Result<TaskResult> {
    let settings = &ctx.settings;
    let root = ctx.dist_dir();
    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would serve {} on port {}",
            root.display(),
            settings.server.port
        ));
        return Ok(TaskResult::DryRun);
    }
    ctx.log.info("Starting server...");
    let handle = server::start(
        ServeOptions {
            root,
            port: settings.server.port,
            livereload: settings.server.livereload,
            debounce: Duration::from_millis(settings.watch.debounce_ms),
        },
        Arc::new(Logger::new("serve")),
    )?;
    ctx.log.info(&format!("listening on http://{}/", handle.addr()));
    ctx.register_service(Service::Server(handle));
    Ok(TaskResult::Ok)
}

/// Build everything, then rebuild whatever changes.
#[derive(Debug)]
pub struct GsdlWatch;

impl Task for GsdlWatch {
    fn name(&self) -> &'static str {
        "gsdl-watch"
    }

    task_deps![DefaultTask];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        start_watching(ctx)
    }
}

/// Alias for `gsdl-watch`.
#[derive(Debug)]
pub struct Watch;

impl Task for Watch {
    fn name(&self) -> &'static str {
        "watch"
    }

    task_deps![GsdlWatch];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
        Ok(TaskResult::Ok)
    }
}

/// Like `gsdl-watch`, but only builds (no copy) up front.
#[derive(Debug)]
pub struct Watch2;

impl Task for Watch2 {
    fn name(&self) -> &'static str {
        "watch2"
    }

    task_deps![BuildAll];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        start_watching(ctx)
    }
}

/// Build, watch and serve the dist tree.
#[derive(Debug)]
pub struct Serve;

impl Task for Serve {
    fn name(&self) -> &'static str {
        "serve"
    }

    task_deps![DefaultTask, Watch];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        start_server(ctx)
    }
}

/// Serve a production build, for checking minified output.
#[derive(Debug)]
pub struct ServeProd;

impl Task for ServeProd {
    fn name(&self) -> &'static str {
        "serve-prod"
    }

    task_deps![Dist, Watch];

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        start_server(ctx)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{make_context, make_context_with, settings};

    fn rule_for<'a>(rules: &'a [WatchRule], task: &str) -> Option<&'a WatchRule> {
        rules.iter().find(|r| r.task.name() == task)
    }

    #[test]
    fn every_section_with_sources_is_watched() {
        let rules = watch_rules(&settings(""));
        for task in [
            "gsdl-build-es6",
            "gsdl-build-js",
            "gsdl-build-css",
            "gsdl-build-less",
            "gsdl-build-scss",
            "gsdl-build-html",
            "gsdl-copy-static",
            "gsdl-copy-data",
        ] {
            assert!(rule_for(&rules, task).is_some(), "{task} is not watched");
        }
        // No default font sources and no bundles.
        assert!(rule_for(&rules, "gsdl-copy-fonts").is_none());
        assert!(rule_for(&rules, "gsdl-build-style").is_none());
    }

    #[test]
    fn bundles_watch_their_inputs_and_style_sources() {
        let rules = watch_rules(&settings(
            "[[style.bundles]]\nlessIn = [\"src/main/less/app.less\"]\nout = \"app.css\"\n",
        ));
        let style = rule_for(&rules, "gsdl-build-style").unwrap();
        assert!(style.patterns.contains(&"src/main/less/app.less".to_string()));
        assert!(style.patterns.contains(&"src/main/less/*.less".to_string()));
        assert!(style.patterns.contains(&"src/main/css/**/*.css".to_string()));
    }

    #[test]
    fn dry_run_starts_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = make_context(tmp.path().to_path_buf());
        ctx.dry_run = true;

        assert!(matches!(GsdlWatch.run(&ctx).unwrap(), TaskResult::DryRun));
        assert!(matches!(Serve.run(&ctx).unwrap(), TaskResult::DryRun));
        assert!(ctx.take_services().is_empty());
    }

    #[test]
    fn watch_and_serve_register_services() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = make_context_with(
            tmp.path().to_path_buf(),
            settings("[server]\nport = 0\nlivereload = false\n"),
        );

        GsdlWatch.run(&ctx).unwrap();
        Serve.run(&ctx).unwrap();
        let services = ctx.take_services();
        assert_eq!(services.len(), 2);
        assert!(matches!(services[0], Service::Watcher(_)));
        assert!(matches!(services[1], Service::Server(_)));
    }
}
