//! Session-scoped rule store and the cascade.

use crate::parser::CssParser;
use crate::parser::StyleRule;
use crate::parser::StyleSheet;
use bw_dom::Document;
use bw_dom::NodeId;

/// Rules collected from every style sheet seen so far in one parse, in load
/// order. Append-only.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<StyleRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` and appends its rules. Returns how many were added.
    pub fn load_rules(&mut self, text: &str) -> usize {
        let sheet = CssParser.parse(text);
        let added = sheet.rule_count();
        self.extend(sheet);
        log::debug!("loaded {added} rules ({} total)", self.rules.len());
        added
    }

    pub fn extend(&mut self, sheet: StyleSheet) {
        self.rules.extend(sheet.rules);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Cascades every matching rule into the element's `computed_style`.
    /// Returns the number of declarations that won.
    pub fn apply(&self, document: &mut Document, element: NodeId, ancestors: &[NodeId]) -> usize {
        let view: &Document = document;
        let matched: Vec<&StyleRule> = self
            .rules
            .iter()
            .filter(|rule| rule.selector.matches(view, element, ancestors))
            .collect();
        if matched.is_empty() {
            return 0;
        }

        let Some(target) = document.element_mut(element) else {
            return 0;
        };

        let mut stored = 0_usize;
        for rule in matched {
            let specificity = rule.selector.specificity();
            for declaration in &rule.declarations {
                if target
                    .computed_style
                    .cascade(&declaration.property, &declaration.value, specificity)
                {
                    stored += 1;
                }
            }
        }

        log::trace!("<{}> received {stored} declarations", target.tag_name);
        stored
    }
}
