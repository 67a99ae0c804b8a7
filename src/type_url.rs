//! Helpers for constructing and parsing `type.googleapis.com/<FQN>`-style
//! type URLs.
//!
//! This deliberately keeps two functions with different strictness:
//! [`extract_type_name`] is lenient (used for diagnostics), while
//! [`is_valid_type_url`]/[`create_type_url`] enforce the strict grammar used
//! at construction time. See `prost-types/src/type_url.rs` (`TypeUrl::new`,
//! `type_url_for`) for the pattern this is adapted from.

/// The domain used for the Google-family well-known types.
pub const GOOGLE_APIS_DOMAIN: &str = "type.googleapis.com";

/// Builds a canonical type URL `<domain>/<fqn>` using [`GOOGLE_APIS_DOMAIN`].
pub fn create_type_url(fqn: &str) -> String {
    format!("{GOOGLE_APIS_DOMAIN}/{fqn}")
}

/// Builds a type URL using an explicit domain.
pub fn create_type_url_with_domain(domain: &str, fqn: &str) -> String {
    format!("{domain}/{fqn}")
}

/// Returns `true` iff `url` is a valid type URL:
///
/// 1. it contains at least one `/`,
/// 2. the domain before the first `/` is non-empty and contains at least
///    one `.`,
/// 3. the type name after the first `/` is non-empty and contains at least
///    one `.` (enforcing a packaged name).
pub fn is_valid_type_url(url: &str) -> bool {
    let Some(slash_pos) = url.find('/') else {
        return false;
    };
    let domain = &url[..slash_pos];
    let type_name = &url[slash_pos + 1..];

    !domain.is_empty() && domain.contains('.') && !type_name.is_empty() && type_name.contains('.')
}

/// Extracts the type name portion of a type URL.
///
/// Lenient by design: if `url` has no `/`, the entire string is returned
/// unchanged (used for diagnostics only; strict validation is a separate
/// concern, see [`is_valid_type_url`]).
pub fn extract_type_name(url: &str) -> &str {
    match url.rfind('/') {
        Some(slash_pos) => &url[slash_pos + 1..],
        None => url,
    }
}
