//! Ordered text-rewrite rules.
//!
//! A [`PatchRuleSet`] is applied as a left-to-right fold: each rule rewrites
//! the output of the previous one. Rules that match a specific multi-token
//! substring must therefore come before broader rules that rewrite a shared
//! token on its own, or the specific rule never sees its input.

use regex::Regex;
use std::borrow::Cow;

/// How a rule finds the text it replaces.
#[derive(Debug, Clone)]
enum Matcher {
    /// Exact substring
    Literal(String),
    /// Regular expression; the replacement may use `$n` group references
    Pattern(Regex),
}

/// A single pattern/replacement pair.
#[derive(Debug, Clone)]
pub struct PatchRule {
    matcher: Matcher,
    replacement: String,
}

impl PatchRule {
    /// Rule that replaces every occurrence of `text`.
    pub fn literal(text: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { matcher: Matcher::Literal(text.into()), replacement: replacement.into() }
    }

    /// Rule that replaces every match of the regular expression `pattern`.
    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self { matcher: Matcher::Pattern(Regex::new(pattern)?), replacement: replacement.into() })
    }

    /// Source of the match pattern (the literal text or the regex source).
    pub fn pattern(&self) -> &str {
        match &self.matcher {
            Matcher::Literal(text) => text,
            Matcher::Pattern(re) => re.as_str(),
        }
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Whether this rule would change `text`.
    pub fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(lit) => !lit.is_empty() && text.contains(lit.as_str()),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }

    /// Replace every occurrence in `text`.
    ///
    /// Borrows the input unchanged when nothing matches.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.matcher {
            Matcher::Literal(lit) => {
                if self.matches(text) {
                    Cow::Owned(text.replace(lit.as_str(), &self.replacement))
                } else {
                    Cow::Borrowed(text)
                }
            }
            Matcher::Pattern(re) => re.replace_all(text, self.replacement.as_str()),
        }
    }
}

/// Ordered sequence of [`PatchRule`]s.
#[derive(Debug, Clone, Default)]
pub struct PatchRuleSet {
    rules: Vec<PatchRule>,
}

impl PatchRuleSet {
    pub fn new(rules: Vec<PatchRule>) -> Self {
        Self { rules }
    }

    /// Rewrites Blink/WebKit vendor syntax into its Gecko equivalent.
    pub fn firefox() -> Self {
        Self::new(vec![
            PatchRule::literal("webkit-fill", "moz"),
            PatchRule::literal("-webkit-mask-box", "mask"),
            PatchRule::literal("webkit-slider-runnable-track", "moz-range-track"),
            PatchRule::literal("webkit-slider-thumb", "moz-range-thumb"),
            // Catch-all; must follow every rule above.
            PatchRule::literal("-webkit-", "-moz-"),
            PatchRule::literal("nowrap", "pre"),
        ])
    }

    /// Append a rule after every existing rule.
    pub fn push(&mut self, rule: PatchRule) {
        self.rules.push(rule);
    }

    /// Same rules in the opposite order.
    pub fn reversed(&self) -> Self {
        Self::new(self.rules.iter().rev().cloned().collect())
    }

    pub fn rules(&self) -> &[PatchRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fold every rule over `text`, in order.
    ///
    /// Borrows the input unchanged when no rule matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.rules.iter().fold(Cow::Borrowed(text), |current, rule| {
            let rewritten = match rule.apply(&current) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            match rewritten {
                Some(s) => Cow::Owned(s),
                None => current,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rule() {
        let rule = PatchRule::literal("nowrap", "pre");
        assert_eq!(rule.apply("white-space: nowrap; x: nowrap"), "white-space: pre; x: pre");
        assert!(matches!(rule.apply("white-space: normal"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_literal_rule_treats_metacharacters_literally() {
        let rule = PatchRule::literal("a.b", "$1");
        assert_eq!(rule.apply("a.b axb"), "$1 axb");
    }

    #[test]
    fn test_empty_literal_never_matches() {
        let rule = PatchRule::literal("", "x");
        assert!(!rule.matches("anything"));
        assert_eq!(rule.apply("anything"), "anything");
    }

    #[test]
    fn test_regex_rule_with_groups() {
        let rule = PatchRule::regex(r"-webkit-(\w+)", "-moz-$1").unwrap();
        assert_eq!(rule.apply("-webkit-appearance: none"), "-moz-appearance: none");
        assert_eq!(rule.pattern(), r"-webkit-(\w+)");
    }

    #[test]
    fn test_invalid_regex_rule() {
        assert!(PatchRule::regex("(unclosed", "x").is_err());
    }

    #[test]
    fn test_firefox_slider_thumb() {
        let rules = PatchRuleSet::firefox();
        assert_eq!(rules.apply("input::-webkit-slider-thumb{}"), "input::-moz-range-thumb{}");
    }

    #[test]
    fn test_firefox_runnable_track() {
        let rules = PatchRuleSet::firefox();
        assert_eq!(
            rules.apply("::-webkit-slider-runnable-track"),
            "::-moz-range-track"
        );
    }

    #[test]
    fn test_firefox_fill_and_mask() {
        let rules = PatchRuleSet::firefox();
        assert_eq!(rules.apply("width: -webkit-fill-available"), "width: -moz-available");
        assert_eq!(rules.apply("-webkit-mask-box-image: url(a.svg)"), "mask-image: url(a.svg)");
    }

    #[test]
    fn test_firefox_catch_all_and_nowrap() {
        let rules = PatchRuleSet::firefox();
        assert_eq!(
            rules.apply("-webkit-user-select:none;white-space:nowrap"),
            "-moz-user-select:none;white-space:pre"
        );
    }

    #[test]
    fn test_fold_feeds_each_rule_the_previous_output() {
        let rules = PatchRuleSet::new(vec![
            PatchRule::literal("a", "b"),
            PatchRule::literal("b", "c"),
        ]);
        // An independent scan of the original text would give "cb".
        assert_eq!(rules.apply("ab"), "cc");
    }

    #[test]
    fn test_no_match_borrows_input() {
        let rules = PatchRuleSet::firefox();
        assert!(matches!(rules.apply("body{margin:0}"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_reversed_order_breaks_specific_rules() {
        let rules = PatchRuleSet::firefox().reversed();
        let output = rules.apply("-webkit-slider-thumb");
        assert_ne!(output, "-moz-range-thumb");
        assert_eq!(output, "-moz-slider-thumb");
    }

    #[test]
    fn test_push_appends() {
        let mut rules = PatchRuleSet::default();
        assert!(rules.is_empty());
        rules.push(PatchRule::literal("x", "y"));
        rules.push(PatchRule::literal("y", "z"));
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[1].pattern(), "y");
        assert_eq!(rules.rules()[1].replacement(), "z");
    }
}
