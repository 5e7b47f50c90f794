//! Filtering declared modules against the bundle's actual usage graph.

use std::collections::BTreeSet;

use crate::models::ModuleDeclaration;

/// Verdict on whether the produced bundle actually references a module.
///
/// The host bundler computes the dependency graph; this trait is the seam
/// through which its answer reaches the asset list builder.
pub trait ModuleUsage {
  /// Returns `true` when the bundle references the named module.
  fn is_used(&self, module_name: &str) -> bool;
}

/// Usage verdict backed by the set of names the bundler reported.
#[derive(Debug, Clone, Default)]
pub struct UsedModules {
  names: BTreeSet<String>,
}

impl UsedModules {
  /// Build from the bundler-reported names, trimming and de-duplicating.
  pub fn new(names: impl IntoIterator<Item = String>) -> Self {
    let names = names
      .into_iter()
      .map(|name| name.trim().to_string())
      .filter(|name| !name.is_empty())
      .collect();
    Self { names }
  }

  /// True when the bundler reported no referenced modules at all.
  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

impl ModuleUsage for UsedModules {
  fn is_used(&self, module_name: &str) -> bool {
    self.names.contains(module_name)
  }
}

/// Verdict used when usage-based optimisation is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeAllUsed;

impl ModuleUsage for AssumeAllUsed {
  fn is_used(&self, _module_name: &str) -> bool {
    true
  }
}

/// Keep only the declarations the bundle references, preserving order.
pub fn filter_used<'a>(
  modules: &'a [ModuleDeclaration],
  usage: &dyn ModuleUsage,
) -> Vec<&'a ModuleDeclaration> {
  modules
    .iter()
    .filter(|module| usage.is_used(&module.name))
    .collect()
}
