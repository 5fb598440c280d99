//! Transcript classification rules.
//!
//! The transfer client only reports failures as free text, so the mapping from
//! output to failure kind lives in an ordered table instead of scattered
//! conditionals. Each rule carries a priority. A higher-priority match wins
//! over any lower-priority one, wherever it appears. Among matches of equal
//! priority, the first rule in table order wins within a line and the last
//! matching line wins across lines.

use mrp_model::DiagnosticKind;
use tracing::debug;

/// Which transcript line is quoted as the cause of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CauseSource {
    /// The matching line itself.
    SameLine,
    /// The line after the match. Falls back to the matching line when the
    /// marker is the last line of the transcript.
    NextLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Substring searched for in each line (case-sensitive).
    pub pattern: String,
    pub kind: DiagnosticKind,
    pub cause: CauseSource,
    /// Higher values win across the whole transcript.
    pub priority: u8,
}

impl ClassificationRule {
    pub fn new(pattern: impl Into<String>, kind: DiagnosticKind, cause: CauseSource) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            cause,
            priority: 0,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    fn matches(&self, line: &str) -> bool {
        line.contains(self.pattern.as_str())
    }
}

/// Rules matching the transfer client's known failure markers.
///
/// An access denial outranks the rest: the client keeps printing generic
/// errors after a refused login, and the mailed cause must stay the denial.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new(
            "Error message",
            DiagnosticKind::ExplicitMessage,
            CauseSource::SameLine,
        ),
        ClassificationRule::new(
            "System Error.",
            DiagnosticKind::SystemError,
            CauseSource::NextLine,
        ),
        ClassificationRule::new(
            "Access denied",
            DiagnosticKind::AccessDenied,
            CauseSource::SameLine,
        )
        .with_priority(1),
        ClassificationRule::new(
            "does not exist",
            DiagnosticKind::NotFound,
            CauseSource::SameLine,
        ),
    ]
}

/// Outcome of a matched rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: DiagnosticKind,
    pub cause: String,
    /// Index of the line that matched the rule.
    pub line_index: usize,
}

/// Classify a transcript. `None` means no rule matched.
pub fn classify<S: AsRef<str>>(
    lines: &[S],
    rules: &[ClassificationRule],
) -> Option<Classification> {
    let mut outcome: Option<(u8, Classification)> = None;
    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let Some(rule) = best_rule(line, rules) else {
            continue;
        };
        if outcome
            .as_ref()
            .is_some_and(|(priority, _)| *priority > rule.priority)
        {
            continue;
        }
        let cause = match rule.cause {
            CauseSource::SameLine => line,
            CauseSource::NextLine => lines.get(index + 1).map_or(line, |next| next.as_ref()),
        };
        debug!(
            line_index = index,
            pattern = %rule.pattern,
            priority = rule.priority,
            "transfer output matched failure rule"
        );
        outcome = Some((
            rule.priority,
            Classification {
                kind: rule.kind.clone(),
                cause: cause.to_string(),
                line_index: index,
            },
        ));
    }
    outcome.map(|(_, classification)| classification)
}

/// Highest-priority rule matching `line`; table order breaks ties.
fn best_rule<'r>(line: &str, rules: &'r [ClassificationRule]) -> Option<&'r ClassificationRule> {
    rules
        .iter()
        .filter(|rule| rule.matches(line))
        .fold(None, |best: Option<&ClassificationRule>, rule| match best {
            Some(current) if current.priority >= rule.priority => Some(current),
            _ => Some(rule),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_error_quotes_following_line() {
        let transcript = [
            "pwd",
            "cd outgoing",
            "System Error.",
            "Connection timed out",
            "exit",
        ];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.kind, DiagnosticKind::SystemError);
        assert_eq!(outcome.cause, "Connection timed out");
        assert_eq!(outcome.line_index, 2);
    }

    #[test]
    fn system_error_on_last_line_quotes_itself() {
        let transcript = ["pwd", "System Error."];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.cause, "System Error.");
    }

    #[test]
    fn first_rule_wins_within_a_line() {
        let transcript = ["Error message: file 'unit_rates.csv' does not exist"];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.kind, DiagnosticKind::ExplicitMessage);
    }

    #[test]
    fn access_denied_outranks_explicit_message_on_same_line() {
        let transcript = ["Error message: Access denied"];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.kind, DiagnosticKind::AccessDenied);
    }

    #[test]
    fn last_matching_line_wins() {
        let transcript = [
            "System Error.",
            "Connection timed out",
            "File or folder 'unit_rates.csv' does not exist.",
        ];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.kind, DiagnosticKind::NotFound);
        assert_eq!(outcome.line_index, 2);
    }

    #[test]
    fn access_denied_survives_later_errors() {
        let transcript = [
            "Access denied.",
            "Error message: Connection has been unexpectedly closed.",
            "File or folder 'unit_rates.csv' does not exist.",
        ];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.kind, DiagnosticKind::AccessDenied);
        assert_eq!(outcome.cause, "Access denied.");
        assert_eq!(outcome.line_index, 0);
    }

    #[test]
    fn later_access_denied_line_replaces_earlier_one() {
        let transcript = ["Access denied.", "Access denied for user 'rpa'."];
        let outcome = classify(&transcript, &default_rules()).expect("classified");
        assert_eq!(outcome.line_index, 1);
    }

    #[test]
    fn clean_transcript_is_unclassified() {
        let transcript = [
            "Searching for host...",
            "Connecting to host...",
            "Authenticating...",
            "Session started.",
            "/outgoing",
            "unit_rates.csv | 84 KB | 512.0 KB/s | binary | 100%",
        ];
        assert_eq!(classify(&transcript, &default_rules()), None);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let transcript = ["access denied"];
        assert_eq!(classify(&transcript, &default_rules()), None);
    }

    #[test]
    fn custom_rules_are_honored() {
        let rules = vec![ClassificationRule::new(
            "Host key wasn't verified",
            DiagnosticKind::AccessDenied,
            CauseSource::SameLine,
        )];
        let transcript = ["Host key wasn't verified!"];
        let outcome = classify(&transcript, &rules).expect("classified");
        assert_eq!(outcome.kind, DiagnosticKind::AccessDenied);
    }
}
