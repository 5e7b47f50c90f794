#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod externals;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod tags;
pub mod urls;
pub mod usage;

pub use builder::AssetListBuilder;
pub use config::{CdnConfig, PublicPathSetting};
pub use externals::compute_externals;
pub use models::{
  AssetLists, GroupSelector, ModuleDeclaration, ModuleGroup, ModuleGroups, NormalizedModule,
};
pub use normalize::normalize_module;
pub use resolver::{ResolveError, Resolver};
pub use tags::{
  FetchIntegrityProvider, HtmlTag, IntegrityError, IntegrityProvider, TagProcessOptions,
  process_tags,
};
pub use urls::TemplateError;
pub use usage::{AssumeAllUsed, ModuleUsage, UsedModules};
