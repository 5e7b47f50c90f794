//! Build configuration surface recognised by the asset URL builder.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer};

use crate::models::ModuleGroups;

const DEFAULT_CONFIG_FILE: &str = "cdn.config.json";

/// Production URL template used when the configuration names none.
pub const DEFAULT_PROD_URL: &str = "https://unpkg.com/:name@:version/:path";

/// Development URL template used when the configuration names none.
pub const DEFAULT_DEV_URL: &str = ":name/:path";

/// Every option recognised by the builder, with its default stated in one
/// place instead of being coalesced at call sites.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CdnConfig {
  /// Declared module groups; a bare list becomes a single default group.
  pub modules: ModuleGroups,
  /// Production mode: expand the production template with no prefix.
  pub prod: bool,
  /// Group-wide production URL template.
  pub prod_url: String,
  /// Group-wide development URL template.
  pub dev_url: String,
  /// Development prefix override; `false` disables the prefix entirely and
  /// absence inherits the build output's public path.
  pub public_path: PublicPathSetting,
  /// Drop declared modules the bundle never references.
  pub optimize: bool,
  /// Value for the `crossorigin` attribute on matching emitted tags;
  /// `false` (the default) leaves tags untouched.
  #[serde(deserialize_with = "deserialize_cross_origin")]
  pub cross_origin: Option<String>,
  /// Attach subresource-integrity attributes to matching emitted tags.
  pub sri: bool,
  /// Log and omit the integrity attribute on hash failures instead of
  /// failing the build.
  pub sri_best_effort: bool,
  /// Directory under which installed packages are discovered.
  pub inventory_root: PathBuf,
}

impl Default for CdnConfig {
  fn default() -> Self {
    Self {
      modules: ModuleGroups::default(),
      prod: true,
      prod_url: DEFAULT_PROD_URL.to_string(),
      dev_url: DEFAULT_DEV_URL.to_string(),
      public_path: PublicPathSetting::Inherit,
      optimize: false,
      cross_origin: None,
      sri: false,
      sri_best_effort: false,
      inventory_root: PathBuf::from("."),
    }
  }
}

impl CdnConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall
  /// back to default values so embedding hosts that configure the builder
  /// programmatically keep working without a file on disk.
  pub fn discover(config_dir: &Path) -> Self {
    let candidate = config_dir.join(DEFAULT_CONFIG_FILE);
    Self::from_path(&candidate).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse configuration at {}", path.display()))
  }

  /// The group-wide URL template matching the active mode.
  pub fn active_template(&self) -> &str {
    if self.prod { &self.prod_url } else { &self.dev_url }
  }
}

/// How the development URL prefix is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PublicPathSetting {
  /// Inherit the build output's public path.
  #[default]
  Inherit,
  /// Emit development URLs with no prefix at all.
  Disabled,
  /// Use this exact prefix, normalised to end in a separator.
  Fixed(String),
}

impl<'de> Deserialize<'de> for PublicPathSetting {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    struct SettingVisitor;

    impl<'de> Visitor<'de> for SettingVisitor {
      type Value = PublicPathSetting;

      fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a public path string or false")
      }

      fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
      where
        E: serde::de::Error,
      {
        if value {
          Err(E::custom("publicPath accepts a string or false, not true"))
        } else {
          Ok(PublicPathSetting::Disabled)
        }
      }

      fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
      where
        E: serde::de::Error,
      {
        Ok(PublicPathSetting::Fixed(value.to_string()))
      }
    }

    deserializer.deserialize_any(SettingVisitor)
  }
}

fn deserialize_cross_origin<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  struct CrossOriginVisitor;

  impl<'de> Visitor<'de> for CrossOriginVisitor {
    type Value = Option<String>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
      formatter.write_str("a crossorigin attribute value or false")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
    where
      E: serde::de::Error,
    {
      if value {
        Err(E::custom("crossOrigin accepts a string or false, not true"))
      } else {
        Ok(None)
      }
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
      E: serde::de::Error,
    {
      Ok(Some(value.to_string()))
    }
  }

  deserializer.deserialize_any(CrossOriginVisitor)
}
