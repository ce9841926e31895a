//! Line classification.
//!
//! Each complete line is assigned a class by running three ordered rule
//! lists: skip rules, then heading rules, then level (context) rules; the
//! first match wins and an unmatched line is regular. Patterns match
//! anywhere in the line (unanchored) — anchor with `^` explicitly. The text
//! handed in is newline-free by construction of the framer.

use anyhow::Result;
use regex::Regex;

use crate::config::config_error;

/// The class assigned to a complete input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Printed permanently on its own; the status is not promoted.
    Heading,
    /// Updates the status table at `level`, clearing all deeper levels.
    Context { level: usize },
    /// Discards the matching line and the next `count - 1` lines.
    Skip { count: u32 },
    /// Printed permanently, preceded by the pending status.
    Regular,
}

#[derive(Debug, Clone)]
pub struct SkipRule {
    pub count: u32,
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct LevelRule {
    pub level: usize,
    pub pattern: Regex,
}

/// The configured rules, each list in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    skip: Vec<SkipRule>,
    heading: Vec<Regex>,
    level: Vec<LevelRule>,
}

impl RuleSet {
    pub fn push_skip_rule(&mut self, count: u32, pattern: &str) -> Result<()> {
        if count == 0 {
            return Err(config_error("--skip-regex COUNT must be at least 1"));
        }
        self.skip.push(SkipRule {
            count,
            pattern: compile(pattern)?,
        });
        Ok(())
    }

    pub fn push_heading_rule(&mut self, pattern: &str) -> Result<()> {
        self.heading.push(compile(pattern)?);
        Ok(())
    }

    pub fn push_level_rule(&mut self, level: usize, pattern: &str) -> Result<()> {
        self.level.push(LevelRule {
            level,
            pattern: compile(pattern)?,
        });
        Ok(())
    }

    /// First-match-wins classification of a single line.
    pub fn match_line(&self, line: &str) -> LineClass {
        for rule in &self.skip {
            if rule.pattern.is_match(line) {
                return LineClass::Skip { count: rule.count };
            }
        }
        for pattern in &self.heading {
            if pattern.is_match(line) {
                return LineClass::Heading;
            }
        }
        for rule in &self.level {
            if rule.pattern.is_match(line) {
                return LineClass::Context { level: rule.level };
            }
        }
        LineClass::Regular
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| config_error(format!("invalid regex '{pattern}': {e}")))
}

/// Stateful classifier: rule matching plus the skip countdown.
#[derive(Debug)]
pub struct Classifier {
    rules: RuleSet,
    skip_remaining: u32,
}

impl Classifier {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            skip_remaining: 0,
        }
    }

    /// Classifies one complete line.
    ///
    /// Returns `None` for lines consumed by a skip rule or its countdown;
    /// the `Skip` class itself is never returned. Bypass lines (partially
    /// shown by the timeout) are regular unconditionally: no rule is
    /// evaluated and the skip countdown is untouched.
    pub fn classify(&mut self, line: &str, bypass: bool) -> Option<LineClass> {
        if bypass {
            return Some(LineClass::Regular);
        }
        if self.skip_remaining > 0 {
            self.skip_remaining -= 1;
            return None;
        }
        match self.rules.match_line(line) {
            LineClass::Skip { count } => {
                self.skip_remaining = count - 1;
                None
            }
            class => Some(class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        let mut rules = RuleSet::default();
        rules.push_skip_rule(3, "^system-header").unwrap();
        rules.push_heading_rule("^-----").unwrap();
        rules.push_level_rule(0, "^(x86|x86_64):").unwrap();
        rules.push_level_rule(1, "^Building ").unwrap();
        rules.push_level_rule(2, r"^\[").unwrap();
        rules
    }

    #[test]
    fn unmatched_lines_are_regular() {
        assert_eq!(rules().match_line("plain text"), LineClass::Regular);
    }

    #[test]
    fn first_matching_level_rule_wins() {
        let rules = rules();
        assert_eq!(
            rules.match_line("x86: start"),
            LineClass::Context { level: 0 }
        );
        assert_eq!(
            rules.match_line("[compile] f1.o"),
            LineClass::Context { level: 2 }
        );
    }

    #[test]
    fn heading_outranks_level_rules() {
        let mut rules = RuleSet::default();
        rules.push_heading_rule("^=").unwrap();
        rules.push_level_rule(0, "^=+ stage").unwrap();
        assert_eq!(rules.match_line("== stage one =="), LineClass::Heading);
    }

    #[test]
    fn skip_outranks_heading() {
        let mut rules = RuleSet::default();
        rules.push_skip_rule(1, "noise").unwrap();
        rules.push_heading_rule("noise").unwrap();
        assert_eq!(rules.match_line("noise"), LineClass::Skip { count: 1 });
    }

    #[test]
    fn patterns_match_unanchored() {
        let mut rules = RuleSet::default();
        rules.push_level_rule(0, "gcc").unwrap();
        assert_eq!(
            rules.match_line("  /usr/bin/gcc -c a.c"),
            LineClass::Context { level: 0 }
        );
    }

    #[test]
    fn zero_skip_count_is_rejected() {
        let mut rules = RuleSet::default();
        assert!(rules.push_skip_rule(0, "x").is_err());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut rules = RuleSet::default();
        assert!(rules.push_level_rule(0, "[unclosed").is_err());
    }

    #[test]
    fn skip_consumes_matching_line_and_following_count() {
        let mut classifier = Classifier::new(rules());
        assert_eq!(classifier.classify("system-header:1: warn", false), None);
        assert_eq!(classifier.classify("in arg", false), None);
        assert_eq!(classifier.classify("---^", false), None);
        // Countdown exhausted: classification resumes.
        assert_eq!(
            classifier.classify("[compile] f2.o", false),
            Some(LineClass::Context { level: 2 })
        );
    }

    #[test]
    fn countdown_swallows_lines_that_would_otherwise_match() {
        let mut classifier = Classifier::new(rules());
        assert_eq!(classifier.classify("system-header:1: warn", false), None);
        // Would be a heading, but the countdown eats it.
        assert_eq!(classifier.classify("----- x86 -----", false), None);
        assert_eq!(classifier.classify("system-header:2: more", false), None);
        // The countdown ended on the line above; this one re-arms it.
        assert_eq!(classifier.classify("system-header:3: again", false), None);
        assert_eq!(classifier.classify("a", false), None);
        assert_eq!(classifier.classify("b", false), None);
        assert_eq!(
            classifier.classify("c", false),
            Some(LineClass::Regular)
        );
    }

    #[test]
    fn bypass_lines_skip_all_rules() {
        let mut classifier = Classifier::new(rules());
        assert_eq!(
            classifier.classify("x86: would be context", true),
            Some(LineClass::Regular)
        );
        // Bypass does not touch an active countdown either.
        assert_eq!(classifier.classify("system-header:1: warn", false), None);
        assert_eq!(
            classifier.classify("----- heading -----", true),
            Some(LineClass::Regular)
        );
        assert_eq!(classifier.classify("still skipped", false), None);
    }
}
