//! Turn parser: splits accepted captures into role-tagged turns.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::classifier::normalize_newlines;

static USER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:USER|You|👤)[\s:]+").expect("user prefix pattern must compile")
});

static AGENT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:AGENT|AI|Assistant|🤖)[\s:]+").expect("agent prefix pattern must compile")
});

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }

    fn other(self) -> Self {
        match self {
            Role::User => Role::Agent,
            Role::Agent => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed utterance. `text` holds trimmed, non-blank lines joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Copy of this turn in stored form: trimmed, non-blank lines joined by `\n`.
    pub fn canonical(&self) -> Self {
        Self::new(self.role, canonical_text(&self.text))
    }

    fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
    }
}

pub(crate) fn canonical_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a leading role marker off a trimmed line.
fn split_marker(line: &str) -> Option<(Role, &str)> {
    if let Some(m) = USER_PREFIX.find(line) {
        return Some((Role::User, &line[m.end()..]));
    }
    AGENT_PREFIX
        .find(line)
        .map(|m| (Role::Agent, &line[m.end()..]))
}

/// Parse `text` into turns, in input order.
///
/// Marker lines open a new turn; unmarked lines extend the open turn. Before
/// any turn is open, roles alternate starting from [`Role::User`]. Turns that
/// end up with no text are dropped.
pub fn parse(text: &str) -> Vec<Turn> {
    let text = normalize_newlines(text);
    let mut turns = Vec::new();
    let mut current: Option<Turn> = None;
    let mut last_role: Option<Role> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some((role, rest)) = split_marker(trimmed) {
            turns.extend(current.take());
            current = Some(Turn::new(role, rest.trim()));
            last_role = Some(role);
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        match current.as_mut() {
            Some(turn) => turn.push_line(trimmed),
            None => {
                let role = last_role.map_or(Role::User, Role::other);
                current = Some(Turn::new(role, trimmed));
                last_role = Some(role);
            }
        }
    }

    turns.extend(current);
    turns.retain(|turn| !turn.text.is_empty());
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explicit_markers() {
        let turns = parse("USER: What is a for-loop?\nAGENT: It repeats code. 🔧");
        assert_eq!(
            turns,
            vec![
                Turn::user("What is a for-loop?"),
                Turn::agent("It repeats code. 🔧"),
            ]
        );
    }

    #[test]
    fn test_markers_are_case_insensitive_and_accept_emoji() {
        let turns = parse("you: hi\n🤖 hello\nassistant: again\n👤 me");
        let roles: Vec<Role> = turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Agent, Role::Agent, Role::User]);
        assert_eq!(turns[1].text, "hello");
    }

    #[test]
    fn test_multiline_turn_keeps_lines_and_drops_blanks() {
        let text = "USER: first line\n\n   second line  \nAGENT: reply\n\n\nmore reply\n";
        let turns = parse(text);
        assert_eq!(turns[0].text, "first line\nsecond line");
        assert_eq!(turns[1].text, "reply\nmore reply");
    }

    #[test]
    fn test_marker_only_line_takes_next_line_as_text() {
        let turns = parse("USER:\nExplain lifetimes\nAGENT:\nThey bound references");
        assert_eq!(
            turns,
            vec![
                Turn::user("Explain lifetimes"),
                Turn::agent("They bound references"),
            ]
        );
    }

    #[test]
    fn test_empty_turns_are_dropped() {
        let turns = parse("USER:\nAGENT: answer");
        assert_eq!(turns, vec![Turn::agent("answer")]);
    }

    #[test]
    fn test_unmarked_text_defaults_to_user() {
        let turns = parse("plain question\ncontinued");
        assert_eq!(turns, vec![Turn::user("plain question\ncontinued")]);
    }

    #[test]
    fn test_crlf_input() {
        let turns = parse("USER: a\r\nb\r\nAGENT: c\r\n");
        assert_eq!(turns, vec![Turn::user("a\nb"), Turn::agent("c")]);
    }

    #[test]
    fn test_no_line_is_lost() {
        let text = "intro line\nUSER: q1\ndetail\n\nAI: a1\n```\ncode\n```\nYou: q2";
        let turns = parse(text);
        let joined: Vec<&str> = turns.iter().flat_map(|t| t.text.lines()).collect();
        for expected in ["intro line", "q1", "detail", "a1", "```", "code", "q2"] {
            assert!(joined.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_parse_is_stable() {
        let text = "USER: one\nAGENT: two\nUSER: three";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_canonical_matches_parsed_form() {
        let raw = Turn::agent("  first \r\n\n\tsecond\n");
        assert_eq!(raw.canonical(), Turn::agent("first\nsecond"));

        let parsed = parse("AGENT: first\n\nsecond");
        assert_eq!(parsed[0].canonical(), parsed[0]);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Agent.to_string(), "agent");
    }
}
