use crate::error::{QuorumError, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Line that splits a rule file into its allow and block sections.
pub const SECTION_SEPARATOR: &str = "---";

/// Allow-section literal granting every actor full permission.
const ALLOW_ALL_LITERAL: &str = "all";

// ---------------------------------------------------------------------------
// GroupToken
// ---------------------------------------------------------------------------

/// A group reference inside an allow clause.
///
/// The raw text is preserved verbatim; anything after the first `.` or `%`
/// is a qualifier kept for display and audit only. Matching always uses
/// the stripped [`GroupToken::group`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupToken {
    raw: String,
}

impl GroupToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The bare group name used for matching.
    pub fn group(&self) -> &str {
        match self.raw.find(['.', '%']) {
            Some(i) => &self.raw[..i],
            None => &self.raw,
        }
    }

    /// The ignored qualifier suffix, if any.
    pub fn qualifier(&self) -> Option<&str> {
        self.raw.find(['.', '%']).map(|i| &self.raw[i + 1..])
    }
}

impl fmt::Display for GroupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// Clause
// ---------------------------------------------------------------------------

/// A conjunction of group tokens: satisfied only when every listed group
/// has at least one approving member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub tokens: Vec<GroupToken>,
}

impl Clause {
    pub fn new(tokens: Vec<GroupToken>) -> Self {
        Self { tokens }
    }

    /// Stripped group names, in clause order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(GroupToken::group)
    }

    /// A clause one actor can satisfy alone.
    pub fn is_single_group(&self) -> bool {
        self.tokens.len() == 1
    }

    fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<GroupToken> = line
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(GroupToken::new)
            .collect();
        if tokens.is_empty() {
            None
        } else {
            Some(Self::new(tokens))
        }
    }

    fn render(&self) -> String {
        self.tokens
            .iter()
            .map(GroupToken::raw)
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Parsed group rules: any allow clause grants (OR), every group in the
/// block set denies unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupRules {
    pub allow: Vec<Clause>,
    pub block: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Every actor is permitted.
    AllowAll,
    /// No actor is permitted.
    DenyAll,
    Groups(GroupRules),
}

impl Policy {
    /// Parse rule text of the form `<allow-section>\n---\n<block-section>`.
    ///
    /// The allow section is either the literal `all`, or one clause per
    /// line with comma-separated group tokens. The block section is one
    /// bare group name per line. An empty allow section denies everyone.
    pub fn parse(raw: &str) -> Result<Policy> {
        let mut allow_lines: Vec<&str> = Vec::new();
        let mut block_lines: Vec<&str> = Vec::new();
        let mut in_block = false;

        for line in raw.lines() {
            let line = line.trim_end_matches('\r');
            if line == SECTION_SEPARATOR {
                if in_block {
                    // content past a second separator is dropped
                    break;
                }
                in_block = true;
                continue;
            }
            if in_block {
                block_lines.push(line);
            } else {
                allow_lines.push(line);
            }
        }

        if !in_block {
            return Err(QuorumError::MalformedRule(
                "missing '---' section separator".to_string(),
            ));
        }

        let allow_lines: Vec<&str> = allow_lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        if allow_lines == [ALLOW_ALL_LITERAL] {
            return Ok(Policy::AllowAll);
        }

        let allow: Vec<Clause> = allow_lines.iter().filter_map(|l| Clause::parse(l)).collect();
        if allow.is_empty() {
            return Ok(Policy::DenyAll);
        }

        let block: BTreeSet<String> = block_lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Policy::Groups(GroupRules { allow, block }))
    }

    /// Inverse of [`Policy::parse`] for persisting a policy snapshot.
    pub fn render(&self) -> String {
        match self {
            Policy::AllowAll => format!("{ALLOW_ALL_LITERAL}\n{SECTION_SEPARATOR}\n"),
            Policy::DenyAll => format!("{SECTION_SEPARATOR}\n"),
            Policy::Groups(rules) => {
                let mut out = String::new();
                for clause in &rules.allow {
                    out.push_str(&clause.render());
                    out.push('\n');
                }
                out.push_str(SECTION_SEPARATOR);
                out.push('\n');
                for group in &rules.block {
                    out.push_str(group);
                    out.push('\n');
                }
                out
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(policy: &Policy) -> &GroupRules {
        match policy {
            Policy::Groups(r) => r,
            other => panic!("expected group rules, got {other:?}"),
        }
    }

    #[test]
    fn parses_allow_all() {
        assert_eq!(Policy::parse("all\n---\n").unwrap(), Policy::AllowAll);
        // block section is ignored for the all literal
        assert_eq!(
            Policy::parse("all\n---\nintern\n").unwrap(),
            Policy::AllowAll
        );
    }

    #[test]
    fn empty_allow_section_denies_everyone() {
        assert_eq!(Policy::parse("---\n").unwrap(), Policy::DenyAll);
        assert_eq!(Policy::parse("\n---\nintern").unwrap(), Policy::DenyAll);
    }

    #[test]
    fn missing_separator_is_malformed() {
        let err = Policy::parse("ops,owner\nintern\n").unwrap_err();
        assert!(matches!(err, QuorumError::MalformedRule(_)));
    }

    #[test]
    fn parses_clauses_and_block_groups() {
        let policy = Policy::parse("ops,owner\nfinance\n---\nintern\nguest\n").unwrap();
        let rules = groups(&policy);
        assert_eq!(rules.allow.len(), 2);
        assert_eq!(
            rules.allow[0].groups().collect::<Vec<_>>(),
            vec!["ops", "owner"]
        );
        assert!(rules.allow[1].is_single_group());
        assert!(rules.block.contains("intern"));
        assert!(rules.block.contains("guest"));
    }

    #[test]
    fn qualifier_is_preserved_but_stripped_for_matching() {
        let policy = Policy::parse("ops.lead,finance%eu\n---\n").unwrap();
        let rules = groups(&policy);
        let clause = &rules.allow[0];
        assert_eq!(clause.tokens[0].raw(), "ops.lead");
        assert_eq!(clause.tokens[0].group(), "ops");
        assert_eq!(clause.tokens[0].qualifier(), Some("lead"));
        assert_eq!(clause.tokens[1].group(), "finance");
        assert_eq!(clause.tokens[1].qualifier(), Some("eu"));
    }

    #[test]
    fn content_after_second_separator_is_dropped() {
        let policy = Policy::parse("ops\n---\nintern\n---\ngarbage\n").unwrap();
        let rules = groups(&policy);
        assert_eq!(rules.block.len(), 1);
        assert!(rules.block.contains("intern"));
    }

    #[test]
    fn render_parse_roundtrip() {
        let policy = Policy::Groups(GroupRules {
            allow: vec![
                Clause::new(vec![
                    GroupToken::new("ops.lead"),
                    GroupToken::new("finance"),
                ]),
                Clause::new(vec![GroupToken::new("owner")]),
            ],
            block: ["intern".to_string(), "guest".to_string()].into(),
        });
        assert_eq!(Policy::parse(&policy.render()).unwrap(), policy);

        let deny = Policy::DenyAll;
        assert_eq!(Policy::parse(&deny.render()).unwrap(), deny);

        let allow = Policy::AllowAll;
        assert_eq!(Policy::parse(&allow.render()).unwrap(), allow);
    }
}
