use crate::config::PublicPathSetting;

/// Normalise a public path to end in exactly one separator.
///
/// Empty values stay empty so a deliberately disabled prefix never turns
/// into a bare `/`.
pub fn ensure_trailing_slash(value: &str) -> String {
    if value.is_empty() || value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    }
}

/// Derive the prefix placed before every templated URL.
///
/// Production URLs are absolute, so the prefix is empty. In development the
/// configured public path wins, `false` disables the prefix entirely, and
/// absence inherits the build output's public path.
pub fn url_prefix(prod: bool, public_path: &PublicPathSetting, output_public_path: &str) -> String {
    if prod {
        return String::new();
    }

    match public_path {
        PublicPathSetting::Disabled => String::new(),
        PublicPathSetting::Fixed(value) => ensure_trailing_slash(value),
        PublicPathSetting::Inherit => ensure_trailing_slash(output_public_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_mode_never_prefixes() {
        let prefix = url_prefix(
            true,
            &PublicPathSetting::Fixed("/node_modules".to_string()),
            "/",
        );
        assert_eq!(prefix, "");
    }

    #[test]
    fn development_mode_uses_the_configured_path() {
        let prefix = url_prefix(
            false,
            &PublicPathSetting::Fixed("/node_modules".to_string()),
            "/",
        );
        assert_eq!(prefix, "/node_modules/");
    }

    #[test]
    fn development_mode_inherits_the_output_public_path() {
        assert_eq!(url_prefix(false, &PublicPathSetting::Inherit, "/dist"), "/dist/");
        assert_eq!(url_prefix(false, &PublicPathSetting::Inherit, "/"), "/");
    }

    #[test]
    fn disabled_public_path_means_no_prefix() {
        assert_eq!(url_prefix(false, &PublicPathSetting::Disabled, "/dist/"), "");
    }

    #[test]
    fn trailing_slashes_are_not_doubled() {
        assert_eq!(ensure_trailing_slash("/static/"), "/static/");
        assert_eq!(ensure_trailing_slash("/static"), "/static/");
        assert_eq!(ensure_trailing_slash(""), "");
    }
}
