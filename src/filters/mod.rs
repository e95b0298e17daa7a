//! Per-record transforms plugged into a [`Pipeline`](crate::pipeline::Pipeline).
pub mod build_info;
pub mod command;
pub mod concat;
pub mod css;
pub mod sass;
pub mod site_paths;
pub mod strip_maps;
pub mod template;
pub mod underscore;

pub use build_info::{BuildInfo, BuildInfoProvider, StampBuildInfo};
pub use command::ExternalCommand;
pub use css::ProcessCss;
pub use sass::CompileSass;
pub use site_paths::{AttachSitePaths, SitePaths};
pub use strip_maps::StripMaps;
pub use template::RenderTemplates;
pub use underscore::{IgnorePartials, IgnoreUnderscoreDirs};
