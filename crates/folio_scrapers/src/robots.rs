//! Minimal robots.txt support: the group addressed to our product token (or
//! `*` when there is none), `Allow`/`Disallow` with `*` and `$` patterns, and
//! longest-match precedence with `Allow` winning ties.

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
}

impl RobotsPolicy {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(body: &str, agent_token: &str) -> Self {
        let token = agent_token.to_ascii_lowercase();
        let mut specific: Vec<Rule> = Vec::new();
        let mut wildcard: Vec<Rule> = Vec::new();
        let mut found_specific = false;

        let mut group_agents: Vec<String> = Vec::new();
        let mut in_rules = false;

        for raw in body.lines() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_rules {
                        group_agents.clear();
                        in_rules = false;
                    }
                    group_agents.push(value.to_ascii_lowercase());
                }
                "allow" | "disallow" => {
                    in_rules = true;
                    // An empty Disallow allows everything and adds no rule.
                    if value.is_empty() {
                        continue;
                    }
                    let rule = Rule {
                        allow: key == "allow",
                        pattern: value.to_string(),
                    };
                    let targets_us = group_agents
                        .iter()
                        .any(|agent| agent != "*" && token.contains(agent.as_str()));
                    if targets_us {
                        found_specific = true;
                        specific.push(rule.clone());
                    }
                    if group_agents.iter().any(|agent| agent == "*") {
                        wildcard.push(rule);
                    }
                }
                _ => {}
            }
        }

        // A group naming us with no rules still opts us out of `*`.
        if !found_specific {
            found_specific = group_agents_named(body, &token);
        }

        Self {
            rules: if found_specific { specific } else { wildcard },
        }
    }

    pub fn is_allowed(&self, path: &str) -> bool {
        let mut best: Option<(usize, bool)> = None;
        for rule in &self.rules {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            let len = rule.pattern.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && best_allow) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.allow)),
            };
        }
        best.map_or(true, |(_, allow)| allow)
    }
}

fn group_agents_named(body: &str, token: &str) -> bool {
    body.lines().any(|raw| {
        let line = raw.split('#').next().unwrap_or_default().trim();
        line.split_once(':').is_some_and(|(key, value)| {
            let value = value.trim().to_ascii_lowercase();
            key.trim().eq_ignore_ascii_case("user-agent") && value != "*" && !value.is_empty()
                && token.contains(value.as_str())
        })
    })
}

/// Matches a robots path pattern: `*` is any run of characters, a trailing
/// `$` anchors the end, everything else is a prefix match.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };
    let parts: Vec<&str> = pattern.split('*').collect();

    let Some(first) = parts.first() else {
        return true;
    };
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    for (i, part) in parts.iter().enumerate().skip(1) {
        let is_last = i == parts.len() - 1;
        if is_last && anchored {
            return path.len() >= pos + part.len() && path.ends_with(part);
        }
        match path[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    !anchored || pos == path.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "FolioBrochureBot";

    #[test]
    fn test_wildcard_group() {
        let policy = RobotsPolicy::parse(
            "User-agent: *\nDisallow: /private\nAllow: /private/press\n",
            TOKEN,
        );
        assert!(policy.is_allowed("/about"));
        assert!(!policy.is_allowed("/private/team"));
        assert!(policy.is_allowed("/private/press/2024"));
    }

    #[test]
    fn test_specific_group_overrides_wildcard() {
        let body = "\
User-agent: *
Disallow: /

User-agent: foliobrochurebot
Disallow: /admin
";
        let policy = RobotsPolicy::parse(body, TOKEN);
        assert!(policy.is_allowed("/about"));
        assert!(!policy.is_allowed("/admin/login"));
    }

    #[test]
    fn test_empty_disallow_allows_everything() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow:\n", TOKEN);
        assert!(policy.is_allowed("/anything"));
    }

    #[test]
    fn test_grouped_agents_share_rules() {
        let body = "User-agent: googlebot\nUser-agent: *\nDisallow: /tmp # scratch\n";
        let policy = RobotsPolicy::parse(body, TOKEN);
        assert!(!policy.is_allowed("/tmp/x"));
    }

    #[test]
    fn test_patterns() {
        assert!(pattern_matches("/*.php$", "/index.php"));
        assert!(!pattern_matches("/*.php$", "/index.php?x=1"));
        assert!(pattern_matches("/shop*/cart", "/shop-eu/cart/1"));
        assert!(!pattern_matches("/shop*/cart", "/shop-eu/basket"));
        assert!(pattern_matches("/", "/anything"));
    }

    #[test]
    fn test_allow_all() {
        assert!(RobotsPolicy::allow_all().is_allowed("/private"));
    }
}
