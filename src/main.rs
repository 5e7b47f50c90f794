//! Command-line front end resolving CDN asset lists outside a host pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cdn_asset_bundler::builder::AssetListBuilder;
use cdn_asset_bundler::config::CdnConfig;
use cdn_asset_bundler::models::GroupSelector;
use cdn_asset_bundler::usage::AssumeAllUsed;

/// Resolve CDN asset URLs and bundler externals from a module configuration.
#[derive(Parser)]
#[command(name = "cdn-assets", version, about)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
struct Cli {
  /// Path to the JSON configuration file
  #[arg(short, long, default_value = "cdn.config.json")]
  config: PathBuf,

  /// Module group to resolve (defaults to the first declared group)
  #[arg(short, long)]
  group: Option<String>,

  /// Resolve development URLs instead of CDN URLs
  #[arg(long)]
  dev: bool,

  /// Override the configured inventory root
  #[arg(long)]
  inventory_root: Option<PathBuf>,

  /// Output public path used for locally-served assets
  #[arg(long, default_value = "/")]
  public_path: String,

  /// Write the resolved asset lists to this manifest file
  #[arg(long)]
  manifest: Option<PathBuf>,

  /// Write the computed externals map to this file
  #[arg(long)]
  externals: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  let mut config = CdnConfig::from_path(&cli.config)?;
  if cli.dev {
    config.prod = false;
  }
  if let Some(root) = cli.inventory_root {
    config.inventory_root = root;
  }

  let selector = match cli.group.as_deref() {
    Some(name) => GroupSelector::Named(name),
    None => GroupSelector::First,
  };

  let mut builder = AssetListBuilder::with_output_public_path(&config, &cli.public_path);
  let assets = builder.build(selector, &AssumeAllUsed)?;

  if let Some(path) = &cli.externals {
    let externals = builder.externals(BTreeMap::new());
    let json =
      serde_json::to_string_pretty(&externals).context("failed to serialise externals map")?;
    std::fs::write(path, json)
      .with_context(|| format!("failed to write externals to {}", path.display()))?;
    info!(path = %path.display(), "wrote externals map");
  }

  match &cli.manifest {
    Some(path) => {
      assets.write_manifest(path)?;
      info!(path = %path.display(), "wrote asset manifest");
    }
    None => println!("{}", assets.to_manifest_json()?),
  }

  Ok(())
}
