use polsat_domain::policy::AuthorizeOptions;

/// Known profile names, default first.
pub const PROFILES: &[&str] = &["strict", "lenient", "fetch-only"];

/// Preset profiles are opinionated defaults. Returns `None` for unknown names.
pub fn preset(profile: &str) -> Option<AuthorizeOptions> {
    match profile {
        "strict" => Some(AuthorizeOptions::default()),
        "lenient" => Some(AuthorizeOptions::lenient()),
        "fetch-only" | "fetch_only" => Some(AuthorizeOptions::fetch_only()),
        _ => None,
    }
}
