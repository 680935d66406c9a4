//! Declarative highlight rules
//!
//!     A rule is a regular expression plus the classes to tag its matches with. A rule
//!     engine runs a list of them against a [`HighlightView`]:
//!
//!     1. The full content is captured once, before any tagging.
//!     2. For each rule in order, every non-overlapping match against that fixed string is
//!        tagged, in match order.
//!
//!     Tagging restructures the tree but never changes symbol indices, so match positions
//!     taken from the captured string stay valid for every later rule.

use crate::notex::view::HighlightView;
use regex::Regex;
use serde::Deserialize;

/// A pattern and the classes applied to everything it matches.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    pub pattern: Regex,
    pub classes: Vec<String>,
}

impl HighlightRule {
    pub fn new<S: Into<String>>(
        pattern: &str,
        classes: impl IntoIterator<Item = S>,
    ) -> Result<Self, regex::Error> {
        Ok(HighlightRule {
            pattern: Regex::new(pattern)?,
            classes: classes.into_iter().map(Into::into).collect(),
        })
    }
}

/// Serialized form of a rule, as found in JSON or YAML engine definitions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub pattern: String,
    #[serde(alias = "styleClasses")]
    pub classes: Vec<String>,
}

/// Tag every match of every rule.
pub fn highlight_with_rules(view: &mut HighlightView<'_>, rules: &[HighlightRule]) {
    let content = view.to_string();
    let starts: Vec<usize> = content.char_indices().map(|(byte, _)| byte).collect();
    let char_index = |byte: usize| starts.binary_search(&byte).unwrap_or_else(|i| i);

    for rule in rules {
        for found in rule.pattern.find_iter(&content) {
            if found.start() == found.end() {
                continue;
            }
            let start = char_index(found.start());
            let end = char_index(found.end());
            view.tag(start, end - start, rule.classes.as_slice());
        }
    }

    tracing::debug!(rules = rules.len(), symbols = view.len(), "applied highlight rules");
}
