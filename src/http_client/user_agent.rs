//! User agent handling for HTTP requests.

pub const USER_AGENT: &str = concat!("marketsnap/", env!("CARGO_PKG_VERSION"));

/// Resolve user agent from config value.
/// - None or empty => default marketsnap user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_agent_default() {
        assert!(resolve_user_agent(None).starts_with("marketsnap/"));
        assert!(resolve_user_agent(Some("  ")).starts_with("marketsnap/"));
    }

    #[test]
    fn test_resolve_user_agent_custom() {
        let ua = resolve_user_agent(Some("Mozilla/5.0 (compatible; SkinportAPI/1.0)"));
        assert_eq!(ua, "Mozilla/5.0 (compatible; SkinportAPI/1.0)");
    }
}
