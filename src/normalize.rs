//! Pure conversion of module declarations into resolved records.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{ModuleDeclaration, NormalizedModule};
use crate::resolver::{ResolveError, Resolver};

/// Resolve one declaration into a [`NormalizedModule`].
///
/// The declaration itself is never mutated; resolution state lives in the
/// resolver's per-build cache. Returns `Ok(None)` when the module is marked
/// `optional` and absent from the inventory, which excludes it from the
/// output without failing the build.
pub fn normalize_module(
  decl: &ModuleDeclaration,
  resolver: &mut Resolver,
) -> Result<Option<NormalizedModule>, ResolveError> {
  let version = match resolver.version(&decl.name) {
    Ok(version) => Some(version),
    Err(ResolveError::ModuleNotFound { .. }) if decl.optional => {
      debug!(
        module = %decl.name,
        "skipping optional module missing from the inventory"
      );
      return Ok(None);
    }
    Err(err) => return Err(err),
  };

  let mut script_paths: Vec<String> = Vec::new();
  if !decl.css_only {
    script_paths.extend(decl.path.iter().cloned());
    script_paths.extend(decl.paths.iter().cloned());
    if script_paths.is_empty() {
      script_paths.push(resolver.default_entry_path(&decl.name)?);
    }
  }

  let mut style_paths: Vec<String> = Vec::new();
  style_paths.extend(decl.style.iter().cloned());
  style_paths.extend(decl.styles.iter().cloned());

  Ok(Some(NormalizedModule {
    name: decl.name.clone(),
    version,
    script_paths,
    style_paths,
    cdn: decl.cdn.clone(),
    prod_url: decl.prod_url.clone(),
    dev_url: decl.dev_url.clone(),
    extra: extension_fields(decl),
  }))
}

/// Extra string-valued declaration fields usable as template placeholders.
fn extension_fields(decl: &ModuleDeclaration) -> BTreeMap<String, String> {
  decl
    .extra
    .iter()
    .filter_map(|(key, value)| {
      value
        .as_str()
        .map(|value| (key.clone(), value.to_string()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::path::Path;
  use tempfile::tempdir;

  fn install_package(root: &Path, name: &str, manifest: &str) {
    let dir = root.join("node_modules").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.json"), manifest).unwrap();
  }

  #[test]
  fn explicit_path_wins_over_the_resolver_default() {
    let temp = tempdir().unwrap();
    install_package(
      temp.path(),
      "istanbul",
      r#"{"version": "0.4.5", "main": "lib/report.js"}"#,
    );
    let mut resolver = Resolver::new(temp.path());

    let decl = ModuleDeclaration {
      path: Some("index.js".to_string()),
      paths: vec!["extra.js".to_string()],
      ..ModuleDeclaration::named("istanbul")
    };

    let module = normalize_module(&decl, &mut resolver).unwrap().unwrap();
    assert_eq!(module.script_paths, vec!["index.js", "extra.js"]);
    assert_eq!(module.version.as_deref(), Some("0.4.5"));
  }

  #[test]
  fn undeclared_path_uses_the_resolver_default() {
    let temp = tempdir().unwrap();
    install_package(
      temp.path(),
      "jasmine",
      r#"{"version": "2.6.0", "main": "./lib/jasmine.js"}"#,
    );
    let mut resolver = Resolver::new(temp.path());

    let module = normalize_module(&ModuleDeclaration::named("jasmine"), &mut resolver)
      .unwrap()
      .unwrap();
    assert_eq!(module.script_paths, vec!["lib/jasmine.js"]);
  }

  #[test]
  fn style_merge_prepends_the_singular_form() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "jasmine", r#"{"version": "2.6.0"}"#);
    let mut resolver = Resolver::new(temp.path());

    let decl = ModuleDeclaration {
      style: Some("dist/style.min.css".to_string()),
      styles: vec!["dist/extra.css".to_string()],
      ..ModuleDeclaration::named("jasmine")
    };

    let module = normalize_module(&decl, &mut resolver).unwrap().unwrap();
    assert_eq!(
      module.style_paths,
      vec!["dist/style.min.css", "dist/extra.css"]
    );
  }

  #[test]
  fn css_only_modules_contribute_no_script_paths() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "jasmine", r#"{"version": "2.6.0"}"#);
    let mut resolver = Resolver::new(temp.path());

    let decl = ModuleDeclaration {
      css_only: true,
      style: Some("dist/style.min.css".to_string()),
      ..ModuleDeclaration::named("jasmine")
    };

    let module = normalize_module(&decl, &mut resolver).unwrap().unwrap();
    assert!(module.script_paths.is_empty());
    assert_eq!(module.style_paths, vec!["dist/style.min.css"]);
  }

  #[test]
  fn optional_missing_modules_are_excluded_without_error() {
    let temp = tempdir().unwrap();
    let mut resolver = Resolver::new(temp.path());

    let decl = ModuleDeclaration {
      optional: true,
      ..ModuleDeclaration::named("ghost")
    };

    assert!(normalize_module(&decl, &mut resolver).unwrap().is_none());
  }

  #[test]
  fn missing_modules_fail_the_build_by_default() {
    let temp = tempdir().unwrap();
    let mut resolver = Resolver::new(temp.path());

    let err = normalize_module(&ModuleDeclaration::named("ghost"), &mut resolver).unwrap_err();
    assert!(matches!(err, ResolveError::ModuleNotFound { .. }));
  }

  #[test]
  fn string_extension_fields_are_carried_over() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", r#"{"version": "0.4.5"}"#);
    let mut resolver = Resolver::new(temp.path());

    let mut decl = ModuleDeclaration::named("istanbul");
    decl.extra.insert(
      "flavor".to_string(),
      serde_json::Value::String("slim".to_string()),
    );
    decl
      .extra
      .insert("weight".to_string(), serde_json::Value::from(3));

    let module = normalize_module(&decl, &mut resolver).unwrap().unwrap();
    assert_eq!(module.extra.get("flavor").map(String::as_str), Some("slim"));
    assert!(!module.extra.contains_key("weight"));
  }

  #[test]
  fn declarations_are_left_untouched() {
    let temp = tempdir().unwrap();
    install_package(temp.path(), "istanbul", r#"{"version": "0.4.5"}"#);
    let mut resolver = Resolver::new(temp.path());

    let decl = ModuleDeclaration::named("istanbul");
    normalize_module(&decl, &mut resolver).unwrap();

    assert!(decl.path.is_none());
    assert!(decl.paths.is_empty());
  }
}
