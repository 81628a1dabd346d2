//! Default User-Agent for requests to the retrieval service.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/instaloader/instaloader";

/// Default User-Agent (tool name, crate version and project URL).
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("instaloader/{version} (+{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version_and_url() {
        let agent = default_user_agent();
        assert!(agent.starts_with(&format!("instaloader/{}", env!("CARGO_PKG_VERSION"))));
        assert!(agent.contains(PROJECT_UA_URL));
    }
}
