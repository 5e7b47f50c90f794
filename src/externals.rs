//! Bundler externals derived from every declared module group.

use std::collections::BTreeMap;

use crate::models::ModuleGroups;

/// Compute the externals map the host bundler must not package internally.
///
/// Every non-`cssOnly` module across every group registers
/// `name -> var-or-name`; externals are bundler-wide even though asset
/// selection is per-target. Later declarations of the same name overwrite
/// earlier ones, and pre-existing host entries survive unless a declared
/// module shares their name.
pub fn compute_externals(
  groups: &ModuleGroups,
  existing: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
  let mut externals = existing;

  for group in groups.iter() {
    for module in group.modules.iter().filter(|module| !module.css_only) {
      let var_name = module
        .var_name
        .clone()
        .unwrap_or_else(|| module.name.clone());
      externals.insert(module.name.clone(), var_name);
    }
  }

  externals
}
