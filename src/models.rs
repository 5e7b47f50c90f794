//! Data structures describing declared modules and the asset lists they produce.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Group name assigned when the configuration declares a bare module list.
pub const DEFAULT_GROUP_NAME: &str = "default";

/// Author-supplied declaration of one third-party module and how to locate
/// and template its assets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDeclaration {
  /// Package name as installed under the inventory root.
  pub name: String,
  /// Explicit script entry path relative to the package root, prepended to
  /// [`paths`](Self::paths) when both forms are given.
  #[serde(default)]
  pub path: Option<String>,
  /// Additional script entry paths relative to the package root.
  #[serde(default)]
  pub paths: Vec<String>,
  /// Stylesheet path relative to the package root, prepended to
  /// [`styles`](Self::styles) when both forms are given.
  #[serde(default)]
  pub style: Option<String>,
  /// Additional stylesheet paths relative to the package root.
  #[serde(default)]
  pub styles: Vec<String>,
  /// Name the package is known as on the CDN; substituted for `:name` in
  /// production mode only.
  #[serde(default)]
  pub cdn: Option<String>,
  /// External variable the host module system maps the package name to;
  /// defaults to the package name itself.
  #[serde(default, rename = "var")]
  pub var_name: Option<String>,
  /// When true the module contributes no script asset and is excluded from
  /// the bundler externals registration.
  #[serde(default)]
  pub css_only: bool,
  /// Pre-built local script URL emitted verbatim ahead of templated URLs,
  /// bypassing the resolver and template engine for the script list.
  #[serde(default)]
  pub local_script: Option<String>,
  /// Pre-built local stylesheet URL, same contract as
  /// [`local_script`](Self::local_script) for the stylesheet list.
  #[serde(default)]
  pub local_style: Option<String>,
  /// Per-module production URL template overriding the group-wide one.
  #[serde(default)]
  pub prod_url: Option<String>,
  /// Per-module development URL template overriding the group-wide one.
  #[serde(default)]
  pub dev_url: Option<String>,
  /// When true a module missing from the inventory is excluded from the
  /// output instead of failing the build.
  #[serde(default)]
  pub optional: bool,
  /// Extra declaration fields available to templates as custom placeholders.
  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModuleDeclaration {
  /// Shorthand used by tests and embedding hosts to declare a bare module.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Whether the module declares any stylesheet path requiring templating.
  pub fn has_declared_styles(&self) -> bool {
    self.style.is_some() || !self.styles.is_empty()
  }
}

/// Module declaration resolved against the installed-package inventory.
///
/// Produced by [`crate::normalize::normalize_module`] without mutating the
/// declaration it came from; one record expands into one URL per entry in
/// [`script_paths`](Self::script_paths) and [`style_paths`](Self::style_paths).
#[derive(Debug, Clone)]
pub struct NormalizedModule {
  /// Package name as installed.
  pub name: String,
  /// Exact installed version string reported by the inventory.
  pub version: Option<String>,
  /// Ordered script paths; singular-then-plural merge of the declaration,
  /// or the resolver's default entry point when nothing was declared.
  pub script_paths: Vec<String>,
  /// Ordered stylesheet paths; empty when the module ships no stylesheet.
  pub style_paths: Vec<String>,
  /// CDN alias substituted for `:name` in production mode.
  pub cdn: Option<String>,
  /// Per-module production template override.
  pub prod_url: Option<String>,
  /// Per-module development template override.
  pub dev_url: Option<String>,
  /// Custom placeholder values carried over from the declaration.
  pub extra: BTreeMap<String, String>,
}

impl NormalizedModule {
  /// The template override matching the active mode, if any.
  pub fn template_override(&self, prod: bool) -> Option<&str> {
    if prod {
      self.prod_url.as_deref()
    } else {
      self.dev_url.as_deref()
    }
  }
}

/// A named, ordered sequence of module declarations selectable per HTML target.
#[derive(Debug, Clone)]
pub struct ModuleGroup {
  /// Group name used by the per-target selector.
  pub name: String,
  /// Declarations in author order.
  pub modules: Vec<ModuleDeclaration>,
}

/// Ordered collection of module groups.
///
/// Deserialises from either a bare module list (one group named
/// [`DEFAULT_GROUP_NAME`]) or a mapping from group name to module list,
/// preserving declaration order so the first group can act as the default
/// selection.
#[derive(Debug, Clone, Default)]
pub struct ModuleGroups {
  groups: Vec<ModuleGroup>,
}

impl ModuleGroups {
  /// Wrap a single unnamed module list as the default group.
  pub fn from_list(modules: Vec<ModuleDeclaration>) -> Self {
    Self {
      groups: vec![ModuleGroup {
        name: DEFAULT_GROUP_NAME.to_string(),
        modules,
      }],
    }
  }

  /// Build from explicitly named groups, keeping their order.
  pub fn from_groups(groups: Vec<ModuleGroup>) -> Self {
    Self { groups }
  }

  /// First declared group, the default when a target names none.
  pub fn first(&self) -> Option<&ModuleGroup> {
    self.groups.first()
  }

  /// Look up a group by name.
  pub fn get(&self, name: &str) -> Option<&ModuleGroup> {
    self.groups.iter().find(|group| group.name == name)
  }

  /// Iterate groups in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &ModuleGroup> {
    self.groups.iter()
  }

  /// True when no group declares any module.
  pub fn is_empty(&self) -> bool {
    self.groups.iter().all(|group| group.modules.is_empty())
  }
}

impl<'de> Deserialize<'de> for ModuleGroups {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
      type Value = ModuleGroups;

      fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a module list or a mapping from group name to module list")
      }

      fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
      where
        A: SeqAccess<'de>,
      {
        let mut modules = Vec::new();
        while let Some(module) = seq.next_element::<ModuleDeclaration>()? {
          modules.push(module);
        }
        Ok(ModuleGroups::from_list(modules))
      }

      fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
      where
        A: MapAccess<'de>,
      {
        let mut groups = Vec::new();
        while let Some((name, modules)) = map.next_entry::<String, Vec<ModuleDeclaration>>()? {
          groups.push(ModuleGroup { name, modules });
        }
        Ok(ModuleGroups::from_groups(groups))
      }
    }

    deserializer.deserialize_any(GroupsVisitor)
  }
}

/// Which module group an HTML generation target wants assets for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelector<'a> {
  /// Use the first declared group.
  First,
  /// Use the group with the given name; unknown names fail the build.
  Named(&'a str),
  /// The target opted out of CDN assets entirely.
  Disabled,
}

/// Final ordered URL lists handed to the host's asset-collection merge point.
///
/// Also the payload of the optional asset manifest written for external
/// consumers needing the same lists, such as server-side renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetLists {
  /// Script URLs in emission order.
  pub js: Vec<String>,
  /// Stylesheet URLs in emission order.
  pub css: Vec<String>,
}

impl AssetLists {
  /// True when neither list contains a URL.
  pub fn is_empty(&self) -> bool {
    self.js.is_empty() && self.css.is_empty()
  }

  /// Serialise the lists as prettified JSON.
  pub fn to_manifest_json(&self) -> Result<String> {
    serde_json::to_string_pretty(self).context("failed to serialise asset manifest")
  }

  /// Write the manifest JSON to disk.
  pub fn write_manifest(&self, path: &Path) -> Result<()> {
    let json = self.to_manifest_json()?;
    fs::write(path, json).with_context(|| format!("failed to write manifest to {}", path.display()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_list_becomes_the_default_group() {
    let groups: ModuleGroups =
      serde_json::from_str(r#"[{"name": "istanbul"}, {"name": "jasmine"}]"#).unwrap();

    let first = groups.first().unwrap();
    assert_eq!(first.name, DEFAULT_GROUP_NAME);
    assert_eq!(first.modules.len(), 2);
    assert_eq!(first.modules[0].name, "istanbul");
  }

  #[test]
  fn named_groups_preserve_declaration_order() {
    let groups: ModuleGroups = serde_json::from_str(
      r#"{"admin": [{"name": "nyc"}], "public": [{"name": "istanbul"}]}"#,
    )
    .unwrap();

    let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, vec!["admin", "public"]);
    assert_eq!(groups.first().unwrap().name, "admin");
    assert_eq!(groups.get("public").unwrap().modules[0].name, "istanbul");
  }

  #[test]
  fn declaration_captures_extra_fields_for_templates() {
    let module: ModuleDeclaration =
      serde_json::from_str(r#"{"name": "istanbul", "flavor": "slim"}"#).unwrap();

    assert_eq!(
      module.extra.get("flavor"),
      Some(&serde_json::Value::String("slim".to_string()))
    );
  }

  #[test]
  fn declaration_renames_the_var_keyword() {
    let module: ModuleDeclaration =
      serde_json::from_str(r#"{"name": "jasmine", "var": "Jasmine", "cssOnly": true}"#).unwrap();

    assert_eq!(module.var_name.as_deref(), Some("Jasmine"));
    assert!(module.css_only);
  }

  #[test]
  fn manifest_round_trips_through_json() {
    let lists = AssetLists {
      js: vec!["https://unpkg.com/istanbul@0.4.5/index.js".to_string()],
      css: vec!["/node_modules/jasmine/dist/style.min.css".to_string()],
    };

    let json = lists.to_manifest_json().unwrap();
    let restored: AssetLists = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, lists);
  }
}
