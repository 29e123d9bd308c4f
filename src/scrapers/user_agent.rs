use rand::seq::SliceRandom;

/// Used when no user agents are configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";

/// Pick a random user agent from the configured list, or the default.
pub fn choose_user_agent(user_agents: &[String]) -> &str {
    let mut rng = rand::thread_rng();
    user_agents
        .choose(&mut rng)
        .map(String::as_str)
        .unwrap_or(DEFAULT_USER_AGENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_falls_back_to_default() {
        assert_eq!(choose_user_agent(&[]), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_picks_from_configured_list() {
        let agents = vec!["agent-a".to_string(), "agent-b".to_string()];
        for _ in 0..20 {
            let picked = choose_user_agent(&agents);
            assert!(agents.iter().any(|a| a == picked));
        }
    }
}
