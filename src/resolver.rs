//! Version and entry-point discovery against the installed-package inventory.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

const INVENTORY_DIR_NAME: &str = "node_modules";
const PACKAGE_MANIFEST_FILE: &str = "package.json";
const DEFAULT_ENTRY_POINT: &str = "index.js";

/// The fields of an installed package's manifest the resolver cares about.
#[derive(Debug, Deserialize)]
struct PackageManifest {
  #[serde(default)]
  version: Option<String>,
  #[serde(default)]
  main: Option<String>,
}

/// Errors that can occur while resolving a module against the inventory.
#[derive(Debug)]
pub enum ResolveError {
  /// The declared module is not installed under the inventory root.
  ModuleNotFound {
    /// Declared module name.
    name: String,
    /// Inventory root that was searched.
    root: PathBuf,
  },
  /// The package manifest exists but could not be read.
  ManifestRead {
    /// Declared module name.
    name: String,
    /// Manifest path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// The package manifest could not be parsed as JSON.
  ManifestParse {
    /// Declared module name.
    name: String,
    /// Manifest path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// The package manifest declares no version.
  MissingVersion {
    /// Declared module name.
    name: String,
    /// Manifest path that was inspected.
    path: PathBuf,
  },
}

impl std::fmt::Display for ResolveError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::ModuleNotFound { name, root } => {
        write!(
          f,
          "module `{}` is not installed under {}",
          name,
          root.display()
        )
      }
      Self::ManifestRead { name, path, source } => {
        write!(
          f,
          "failed to read manifest for `{}` at {}: {}",
          name,
          path.display(),
          source
        )
      }
      Self::ManifestParse { name, path, source } => {
        write!(
          f,
          "failed to parse manifest for `{}` at {}: {}",
          name,
          path.display(),
          source
        )
      }
      Self::MissingVersion { name, path } => {
        write!(
          f,
          "manifest for `{}` at {} declares no version",
          name,
          path.display()
        )
      }
    }
  }
}

impl std::error::Error for ResolveError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::ManifestRead { source, .. } => Some(source),
      Self::ManifestParse { source, .. } => Some(source),
      _ => None,
    }
  }
}

/// Inventory lookup with a per-build version cache.
///
/// One resolver lives for exactly one build, so repeated declarations of the
/// same package hit the filesystem once; nothing is ever written back onto
/// caller-supplied declarations.
#[derive(Debug)]
pub struct Resolver {
  root: PathBuf,
  versions: BTreeMap<String, String>,
}

impl Resolver {
  /// Create a resolver rooted at the given inventory directory.
  pub fn new(inventory_root: impl Into<PathBuf>) -> Self {
    Self {
      root: inventory_root.into(),
      versions: BTreeMap::new(),
    }
  }

  /// The inventory root packages are discovered under.
  pub fn inventory_root(&self) -> &Path {
    &self.root
  }

  /// Exact installed version of the named package.
  pub fn version(&mut self, name: &str) -> Result<String, ResolveError> {
    if let Some(version) = self.versions.get(name) {
      return Ok(version.clone());
    }

    let (manifest, path) = self.read_manifest(name)?;
    let version = manifest.version.ok_or_else(|| ResolveError::MissingVersion {
      name: name.to_string(),
      path,
    })?;

    debug!(module = name, version = %version, "resolved installed version");
    self.versions.insert(name.to_string(), version.clone());
    Ok(version)
  }

  /// Default script entry point of the named package, relative to the
  /// package directory with separators normalised to forward slashes.
  pub fn default_entry_path(&mut self, name: &str) -> Result<String, ResolveError> {
    let (manifest, _) = self.read_manifest(name)?;
    let entry = manifest.main.as_deref().unwrap_or(DEFAULT_ENTRY_POINT);
    Ok(normalize_entry_path(entry))
  }

  fn read_manifest(&self, name: &str) -> Result<(PackageManifest, PathBuf), ResolveError> {
    let path = self
      .root
      .join(INVENTORY_DIR_NAME)
      .join(name)
      .join(PACKAGE_MANIFEST_FILE);

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(err) if err.kind() == ErrorKind::NotFound => {
        return Err(ResolveError::ModuleNotFound {
          name: name.to_string(),
          root: self.root.clone(),
        });
      }
      Err(source) => {
        return Err(ResolveError::ManifestRead {
          name: name.to_string(),
          path,
          source,
        });
      }
    };

    let manifest = serde_json::from_str(&content).map_err(|source| ResolveError::ManifestParse {
      name: name.to_string(),
      path: path.clone(),
      source,
    })?;
    Ok((manifest, path))
  }
}

/// Strip a leading `./` and normalise separators in a manifest entry path.
fn normalize_entry_path(entry: &str) -> String {
  let normalized = entry.replace('\\', "/");
  normalized
    .strip_prefix("./")
    .unwrap_or(&normalized)
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn install_package(root: &Path, name: &str, manifest: &str) {
    let dir = root.join("node_modules").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.json"), manifest).unwrap();
  }

  #[test]
  fn resolves_installed_versions() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", r#"{"version": "0.4.5"}"#);

    let mut resolver = Resolver::new(temp.path());
    assert_eq!(resolver.version("istanbul").unwrap(), "0.4.5");
  }

  #[test]
  fn missing_packages_are_a_dedicated_error() {
    let temp = tempdir().unwrap();
    let mut resolver = Resolver::new(temp.path());

    let err = resolver.version("istanbul").unwrap_err();
    assert!(matches!(err, ResolveError::ModuleNotFound { .. }));
    assert!(err.to_string().contains("istanbul"));
  }

  #[test]
  fn missing_version_field_is_reported() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", r#"{"main": "index.js"}"#);

    let mut resolver = Resolver::new(temp.path());
    let err = resolver.version("istanbul").unwrap_err();
    assert!(matches!(err, ResolveError::MissingVersion { .. }));
  }

  #[test]
  fn unparseable_manifest_is_reported() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", "not json");

    let mut resolver = Resolver::new(temp.path());
    let err = resolver.version("istanbul").unwrap_err();
    assert!(matches!(err, ResolveError::ManifestParse { .. }));
  }

  #[test]
  fn versions_are_cached_for_the_life_of_the_resolver() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", r#"{"version": "0.4.5"}"#);

    let mut resolver = Resolver::new(temp.path());
    assert_eq!(resolver.version("istanbul").unwrap(), "0.4.5");

    fs::remove_dir_all(temp.path().join("node_modules")).unwrap();
    assert_eq!(resolver.version("istanbul").unwrap(), "0.4.5");
  }

  #[test]
  fn default_entry_point_comes_from_the_main_field() {
    let temp = tempdir().unwrap();
    install_package(
      temp.path(),
      "jasmine",
      r#"{"version": "2.6.0", "main": "./lib/jasmine.js"}"#,
    );

    let mut resolver = Resolver::new(temp.path());
    assert_eq!(
      resolver.default_entry_path("jasmine").unwrap(),
      "lib/jasmine.js"
    );
  }

  #[test]
  fn default_entry_point_falls_back_to_index_js() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", r#"{"version": "0.4.5"}"#);

    let mut resolver = Resolver::new(temp.path());
    assert_eq!(resolver.default_entry_path("istanbul").unwrap(), "index.js");
  }

  #[test]
  fn entry_paths_use_forward_slashes() {
    let temp = tempdir().unwrap();
    install_package(
      temp.path(),
      "nyc",
      r#"{"version": "11.0.0", "main": "lib\\index.js"}"#,
    );

    let mut resolver = Resolver::new(temp.path());
    assert_eq!(resolver.default_entry_path("nyc").unwrap(), "lib/index.js");
  }
}
