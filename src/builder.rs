//! Orchestrates filtering, normalisation and URL expansion for one build.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::config::CdnConfig;
use crate::externals::compute_externals;
use crate::models::{AssetLists, GroupSelector, ModuleDeclaration, ModuleGroup};
use crate::normalize::normalize_module;
use crate::resolver::Resolver;
use crate::urls::{expand_template, template_prefix, url_prefix};
use crate::usage::{ModuleUsage, filter_used};

/// Asset URL builder for one build invocation.
///
/// Owns the per-build resolver cache; create one builder per build so
/// resolution state never leaks between invocations. The host pipeline
/// calls [`build`](Self::build) once per HTML target and splices the
/// returned lists ahead of its own emitted assets.
pub struct AssetListBuilder<'a> {
  config: &'a CdnConfig,
  resolver: Resolver,
  output_public_path: String,
  prefix: String,
}

impl<'a> AssetListBuilder<'a> {
  /// Create a builder inheriting the default output public path (`/`).
  pub fn new(config: &'a CdnConfig) -> Self {
    Self::with_output_public_path(config, "/")
  }

  /// Create a builder for a host whose build output lives under the given
  /// public path; local assets are emitted relative to it.
  pub fn with_output_public_path(config: &'a CdnConfig, output_public_path: &str) -> Self {
    let output_public_path = if output_public_path.is_empty() {
      "/".to_string()
    } else {
      crate::urls::ensure_trailing_slash(output_public_path)
    };
    let prefix = url_prefix(config.prod, &config.public_path, &output_public_path);

    Self {
      config,
      resolver: Resolver::new(config.inventory_root.clone()),
      output_public_path,
      prefix,
    }
  }

  /// The prefix applied to templated URLs in the active mode.
  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// Build the ordered `js`/`css` URL lists for the selected group.
  ///
  /// Local assets come first in declaration order, then templated URLs in
  /// declaration order of module and of path within each module. A target
  /// that opted out, or an empty configuration, yields empty lists.
  pub fn build(
    &mut self,
    selector: GroupSelector<'_>,
    usage: &dyn ModuleUsage,
  ) -> Result<AssetLists> {
    let Some(group) = self.select_group(selector)? else {
      return Ok(AssetLists::default());
    };

    let selected: Vec<&ModuleDeclaration> = if self.config.optimize {
      let kept = filter_used(&group.modules, usage);
      debug!(
        group = %group.name,
        declared = group.modules.len(),
        kept = kept.len(),
        "filtered module group against bundle usage"
      );
      kept
    } else {
      group.modules.iter().collect()
    };

    let mut lists = AssetLists::default();

    for decl in &selected {
      if let Some(local) = &decl.local_script {
        lists.js.push(format!("{}{}", self.output_public_path, local));
      }
      if let Some(local) = &decl.local_style {
        lists.css.push(format!("{}{}", self.output_public_path, local));
      }
    }

    for decl in &selected {
      let wants_scripts = decl.local_script.is_none() && !decl.css_only;
      let wants_styles = decl.local_style.is_none() && decl.has_declared_styles();
      if !wants_scripts && !wants_styles {
        continue;
      }

      let Some(module) = normalize_module(decl, &mut self.resolver)
        .with_context(|| format!("failed to resolve module `{}`", decl.name))?
      else {
        continue;
      };

      let template = module
        .template_override(self.config.prod)
        .unwrap_or_else(|| self.config.active_template());

      if wants_scripts {
        for path in &module.script_paths {
          let url = expand_template(template, &module, path, self.config.prod)?;
          lists.js.push(format!("{}{}", self.prefix, url));
        }
      }
      if wants_styles {
        for path in &module.style_paths {
          let url = expand_template(template, &module, path, self.config.prod)?;
          lists.css.push(format!("{}{}", self.prefix, url));
        }
      }
    }

    Ok(lists)
  }

  /// Externals map covering every declared group, merged over the host's
  /// pre-existing entries.
  pub fn externals(&self, existing: BTreeMap<String, String>) -> BTreeMap<String, String> {
    compute_externals(&self.config.modules, existing)
  }

  /// Literal URL prefixes of every template active for the selected group,
  /// used by the tag post-processor to decide which tags it may touch.
  ///
  /// Covers the group-wide template plus every per-module override in the
  /// active mode; templates starting with a placeholder contribute nothing.
  pub fn active_prefixes(&self, selector: GroupSelector<'_>) -> Result<Vec<String>> {
    let Some(group) = self.select_group(selector)? else {
      return Ok(Vec::new());
    };

    let mut seen = BTreeSet::new();
    let mut prefixes = Vec::new();
    let mut push = |template: &str| {
      let prefix = template_prefix(template);
      if !prefix.is_empty() && seen.insert(prefix.to_string()) {
        prefixes.push(prefix.to_string());
      }
    };

    push(self.config.active_template());
    for module in &group.modules {
      let override_template = if self.config.prod {
        module.prod_url.as_deref()
      } else {
        module.dev_url.as_deref()
      };
      if let Some(template) = override_template {
        push(template);
      }
    }

    Ok(prefixes)
  }

  fn select_group(&self, selector: GroupSelector<'_>) -> Result<Option<&'a ModuleGroup>> {
    match selector {
      GroupSelector::Disabled => Ok(None),
      GroupSelector::First => Ok(self.config.modules.first()),
      GroupSelector::Named(name) => self
        .config
        .modules
        .get(name)
        .map(Some)
        .ok_or_else(|| anyhow!("unknown module group `{name}`")),
    }
  }
}
