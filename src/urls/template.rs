use std::sync::OnceLock;

use regex::Regex;

use crate::models::NormalizedModule;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":([a-z]+)").expect("invalid placeholder regex"))
}

/// Errors raised while expanding a URL template.
#[derive(Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder names neither a reserved field nor a declaration field.
    UnresolvedPlaceholder {
        /// Placeholder identifier without the leading colon.
        placeholder: String,
        /// Module whose template expansion failed.
        module: String,
    },
    /// The template demands `:version` but the module resolved none.
    MissingVersion {
        /// Module whose template expansion failed.
        module: String,
    },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedPlaceholder {
                placeholder,
                module,
            } => {
                write!(
                    f,
                    "template placeholder `:{placeholder}` has no value for module `{module}`"
                )
            }
            Self::MissingVersion { module } => {
                write!(
                    f,
                    "template requires `:version` but module `{module}` has no resolved version"
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Expand a URL template for one asset path of a resolved module.
///
/// Placeholders take the form `:identifier` (lowercase ASCII letters) and
/// are substituted in template order: `:name` resolves to the CDN alias in
/// production mode when one is declared, `:path` to the specific script or
/// stylesheet path being expanded, `:version` to the installed version, and
/// anything else to a string-valued declaration field. An identifier with
/// no value fails the expansion rather than emitting an empty segment.
pub fn expand_template(
    template: &str,
    module: &NormalizedModule,
    path_value: &str,
    prod: bool,
) -> Result<String, TemplateError> {
    let pattern = placeholder_pattern();
    let mut expanded = String::with_capacity(template.len());
    let mut last_end = 0;

    for captures in pattern.captures_iter(template) {
        let matched = captures
            .get(0)
            .expect("capture group 0 is always present");
        let identifier = captures
            .get(1)
            .expect("placeholder pattern has one capture group")
            .as_str();

        expanded.push_str(&template[last_end..matched.start()]);
        expanded.push_str(placeholder_value(module, identifier, path_value, prod)?);
        last_end = matched.end();
    }

    expanded.push_str(&template[last_end..]);
    Ok(expanded)
}

fn placeholder_value<'a>(
    module: &'a NormalizedModule,
    identifier: &str,
    path_value: &'a str,
    prod: bool,
) -> Result<&'a str, TemplateError> {
    match identifier {
        "name" => {
            if prod && let Some(cdn) = module.cdn.as_deref() {
                Ok(cdn)
            } else {
                Ok(&module.name)
            }
        }
        "path" => Ok(path_value),
        "version" => module
            .version
            .as_deref()
            .ok_or_else(|| TemplateError::MissingVersion {
                module: module.name.clone(),
            }),
        other => module
            .extra
            .get(other)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                placeholder: other.to_string(),
                module: module.name.clone(),
            }),
    }
}

/// Literal text preceding the first placeholder in a template.
///
/// Emitted tags are matched against these prefixes to decide which tags the
/// post-processor may touch. A template that starts with a placeholder has
/// no usable prefix and matches nothing.
pub fn template_prefix(template: &str) -> &str {
    match placeholder_pattern().find(template) {
        Some(found) => &template[..found.start()],
        None => template,
    }
}
