//! Attribute pass over emitted HTML asset tags.

use std::collections::BTreeMap;

use tracing::warn;

use crate::tags::integrity::{IntegrityError, IntegrityProvider};

/// Emitted HTML tag as handed over by the host's HTML generation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTag {
  /// Tag name, `script` or `link` for asset tags.
  pub tag_name: String,
  /// Attribute map the pass mutates in place.
  pub attributes: BTreeMap<String, String>,
}

impl HtmlTag {
  /// A `<script src="...">` tag.
  pub fn script(src: impl Into<String>) -> Self {
    Self {
      tag_name: "script".to_string(),
      attributes: BTreeMap::from([("src".to_string(), src.into())]),
    }
  }

  /// A `<link href="...">` tag.
  pub fn link(href: impl Into<String>) -> Self {
    Self {
      tag_name: "link".to_string(),
      attributes: BTreeMap::from([("href".to_string(), href.into())]),
    }
  }

  /// The resource URL the tag loads, when it is an asset tag at all.
  pub fn asset_url(&self) -> Option<&str> {
    match self.tag_name.as_str() {
      "script" => self.attributes.get("src").map(String::as_str),
      "link" => self.attributes.get("href").map(String::as_str),
      _ => None,
    }
  }
}

/// Options controlling the attribute pass.
#[derive(Debug, Clone, Default)]
pub struct TagProcessOptions {
  /// Value attached as the `crossorigin` attribute on matching tags.
  pub cross_origin: Option<String>,
  /// Attach `integrity` attributes computed by the provider.
  pub sri: bool,
  /// Log and omit the integrity attribute on failure instead of failing.
  pub sri_best_effort: bool,
}

/// Decorate tags whose URL starts with one of the active template prefixes.
///
/// Non-matching tags are left untouched. Each matching tag only ever
/// receives attributes derived from its own URL, so processing order does
/// not affect the result. An integrity failure aborts the pass naming the
/// URL unless best-effort mode is on, in which case the attribute is
/// omitted and a warning logged.
pub fn process_tags(
  tags: &mut [HtmlTag],
  active_prefixes: &[String],
  options: &TagProcessOptions,
  provider: &dyn IntegrityProvider,
) -> Result<(), IntegrityError> {
  for tag in tags.iter_mut() {
    let Some(url) = tag.asset_url().map(str::to_string) else {
      continue;
    };
    let matches = active_prefixes
      .iter()
      .any(|prefix| !prefix.is_empty() && url.starts_with(prefix.as_str()));
    if !matches {
      continue;
    }

    if let Some(value) = &options.cross_origin {
      tag
        .attributes
        .insert("crossorigin".to_string(), value.clone());
    }

    if options.sri {
      match provider.integrity_for(&url) {
        Ok(hash) => {
          tag.attributes.insert("integrity".to_string(), hash);
        }
        Err(err) if options.sri_best_effort => {
          warn!(url = %url, error = %err, "omitting integrity attribute");
        }
        Err(err) => return Err(err),
      }
    }
  }

  Ok(())
}
