//! Robots.txt parser and matcher
//!
//! Groups are built the way most hand-rolled parsers do it: consecutive
//! `User-agent` lines share a group, and a `User-agent` line that follows
//! rules starts a new one. Matching is longest-prefix with ties going to
//! `Allow`.

use serde::{Deserialize, Serialize};

use super::CrawlerVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsRule {
    pub kind: RuleKind,
    pub path: String,
}

/// One group of robots.txt records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsGroup {
    /// User agents, lowercased
    pub agents: Vec<String>,
    pub rules: Vec<RobotsRule>,
}

impl RobotsGroup {
    fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.rules.is_empty()
    }
}

/// Parse robots.txt content into ordered groups.
///
/// Comments (`#` to end of line), blank lines, lines without a colon and
/// directives other than `User-agent`, `Allow` and `Disallow` are ignored.
pub fn parse_robots_txt(content: &str) -> Vec<RobotsGroup> {
    let mut groups = Vec::new();
    let mut current = RobotsGroup::default();

    for raw_line in content.lines() {
        let line = raw_line.split('#').next().unwrap_or_default().trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_lowercase().as_str() {
            "user-agent" => {
                if !current.rules.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current.agents.push(value.to_lowercase());
            }
            "allow" => current.rules.push(RobotsRule {
                kind: RuleKind::Allow,
                path: value.to_string(),
            }),
            "disallow" => current.rules.push(RobotsRule {
                kind: RuleKind::Disallow,
                path: value.to_string(),
            }),
            _ => {}
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Groups naming `agent` (case-insensitive), or the `*` groups when none do.
pub fn select_groups<'a>(groups: &'a [RobotsGroup], agent: &str) -> Vec<&'a RobotsGroup> {
    let agent = agent.to_lowercase();
    let named: Vec<_> = groups
        .iter()
        .filter(|g| g.agents.iter().any(|a| *a == agent))
        .collect();
    if !named.is_empty() {
        return named;
    }
    groups
        .iter()
        .filter(|g| g.agents.iter().any(|a| a == "*"))
        .collect()
}

/// Longest matching rule across `groups` decides. An empty `Disallow`
/// allows everything unless something has already matched.
pub fn evaluate_groups(groups: &[&RobotsGroup], path: &str) -> CrawlerVerdict {
    let mut best: Option<RuleKind> = None;
    let mut best_len: Option<usize> = None;

    for rule in groups.iter().flat_map(|g| g.rules.iter()) {
        if rule.path.is_empty() {
            if rule.kind == RuleKind::Disallow && best_len.is_none() {
                best = Some(RuleKind::Allow);
                best_len = Some(0);
            }
            continue;
        }
        if !path.starts_with(&rule.path) {
            continue;
        }
        let len = rule.path.len();
        match best_len {
            Some(current) if len < current => {}
            Some(current) if len == current => {
                if rule.kind == RuleKind::Allow {
                    best = Some(RuleKind::Allow);
                }
            }
            _ => {
                best = Some(rule.kind);
                best_len = Some(len);
            }
        }
    }

    match best {
        Some(RuleKind::Allow) => CrawlerVerdict::Allow,
        Some(RuleKind::Disallow) => CrawlerVerdict::Disallow,
        None => CrawlerVerdict::Unspecified,
    }
}

/// Verdict for `agent` requesting `path`; unspecified when no group applies.
pub fn verdict_for(groups: &[RobotsGroup], agent: &str, path: &str) -> CrawlerVerdict {
    let selected = select_groups(groups, agent);
    if selected.is_empty() {
        return CrawlerVerdict::Unspecified;
    }
    evaluate_groups(&selected, path)
}
