//! Style sheet text to rule list.

use crate::selector::Selector;

/// Property/value pair inside a rule body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// One selector with its declarations in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
}

/// Rules compiled from source text, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Parses style sheet text.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    /// Lenient: anything unsupported is dropped rather than reported.
    pub fn parse(&self, input: &str) -> StyleSheet {
        let source = strip_comments(input);
        let mut rules = Vec::new();
        let mut cursor = 0_usize;

        while let Some((prelude, body, next)) = next_block(&source, cursor) {
            cursor = next;

            // Statement at-rules such as `@import x;` end up in front of the
            // next prelude.
            let prelude = prelude.rsplit(';').next().unwrap_or(prelude).trim();
            if prelude.is_empty() {
                continue;
            }
            if prelude.starts_with('@') {
                log::debug!("skipping at-rule `{}`", collapse_ws(prelude));
                continue;
            }

            let declarations = parse_declarations(body);
            if declarations.is_empty() {
                continue;
            }

            for part in split_top_level(prelude, b',') {
                let text = collapse_ws(part);
                match Selector::parse(&text) {
                    Some(selector) => rules.push(StyleRule {
                        selector,
                        declarations: declarations.clone(),
                    }),
                    None => log::debug!("skipping unsupported selector `{text}`"),
                }
            }
        }

        log::trace!("parsed {} style rules", rules.len());
        StyleSheet { rules }
    }
}

/// Tracks string literals and bracket nesting while scanning bytes.
#[derive(Debug, Default)]
struct Scanner {
    quote: Option<u8>,
    escaped: bool,
    parens: u32,
    brackets: u32,
}

impl Scanner {
    /// Consumes `byte` and reports whether it is structural, that is outside
    /// any string and any `()`/`[]` group.
    fn step(&mut self, byte: u8) -> bool {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == quote {
                self.quote = None;
            }
            return false;
        }

        match byte {
            b'"' | b'\'' => {
                self.quote = Some(byte);
                false
            }
            b'(' => {
                self.parens = self.parens.saturating_add(1);
                false
            }
            b')' => {
                self.parens = self.parens.saturating_sub(1);
                false
            }
            b'[' => {
                self.brackets = self.brackets.saturating_add(1);
                false
            }
            b']' => {
                self.brackets = self.brackets.saturating_sub(1);
                false
            }
            _ => self.parens == 0 && self.brackets == 0,
        }
    }

    fn in_string(&self) -> bool {
        self.quote.is_some()
    }
}

fn strip_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut scanner = Scanner::default();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if !scanner.in_string() && byte == b'/' && bytes.get(idx + 1) == Some(&b'*') {
            idx = match input[idx + 2..].find("*/") {
                Some(end) => idx + 2 + end + 2,
                None => bytes.len(),
            };
            continue;
        }

        scanner.step(byte);
        out.push(byte);
        idx += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Returns (prelude, body, cursor after the closing brace).
fn next_block(input: &str, from: usize) -> Option<(&str, &str, usize)> {
    let bytes = input.as_bytes();
    let mut scanner = Scanner::default();
    let mut open = None;
    let mut depth = 0_u32;

    for (idx, byte) in bytes.iter().copied().enumerate().skip(from) {
        if !scanner.step(byte) {
            continue;
        }

        match byte {
            b'{' => {
                if depth == 0 {
                    open = Some(idx);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let open = open?;
                    return Some((&input[from..open], &input[open + 1..idx], idx + 1));
                }
            }
            _ => {}
        }
    }

    None
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let mut scanner = Scanner::default();
    let mut parts = Vec::new();
    let mut start = 0_usize;

    for (idx, byte) in input.bytes().enumerate() {
        if scanner.step(byte) && byte == delimiter {
            parts.push(&input[start..idx]);
            start = idx + 1;
        }
    }
    parts.push(&input[start..]);
    parts
}

fn find_top_level(input: &str, needle: u8) -> Option<usize> {
    let mut scanner = Scanner::default();
    input
        .bytes()
        .enumerate()
        .find(|(_, byte)| scanner.step(*byte) && *byte == needle)
        .map(|(idx, _)| idx)
}

fn parse_declarations(body: &str) -> Vec<Declaration> {
    split_top_level(body, b';')
        .into_iter()
        .filter_map(|raw| {
            let colon = find_top_level(raw, b':')?;
            let property = collapse_ws(&raw[..colon]).to_ascii_lowercase();
            let value = collapse_value(&raw[colon + 1..]);
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration { property, value })
        })
        .collect()
}

fn collapse_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Like `collapse_ws`, but whitespace inside string literals is kept.
fn collapse_value(input: &str) -> String {
    let mut scanner = Scanner::default();
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for ch in input.trim().chars() {
        let literal = scanner.in_string();
        if ch.is_ascii() {
            scanner.step(ch as u8);
        }

        if !literal && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::CssParser;
    use super::Declaration;

    #[test]
    fn parses_rules_in_source_order() {
        let sheet = CssParser.parse("body div #myid { width: 100px; background-color: #ff5000; } .c1 { flex: 1; }");
        assert_eq!(sheet.rule_count(), 2);
        assert_eq!(sheet.rules[0].selector.to_string(), "body div #myid");
        assert_eq!(
            sheet.rules[0].declarations,
            vec![
                Declaration::new("width", "100px"),
                Declaration::new("background-color", "#ff5000"),
            ]
        );
        assert_eq!(sheet.rules[1].declarations, vec![Declaration::new("flex", "1")]);
    }

    #[test]
    fn selector_lists_become_separate_rules() {
        let sheet = CssParser.parse("h1, .title ,#top { color: red }");
        let selectors: Vec<_> = sheet
            .rules
            .iter()
            .map(|rule| rule.selector.to_string())
            .collect();
        assert_eq!(selectors, vec!["h1", ".title", "#top"]);
        assert!(
            sheet
                .rules
                .iter()
                .all(|rule| rule.declarations == vec![Declaration::new("color", "red")])
        );
    }

    #[test]
    fn strips_comments_and_empty_rules() {
        let sheet = CssParser.parse("/* x */ p { /* y */ height: 14px; } div { } span {;}");
        assert_eq!(sheet.rule_count(), 1);
        assert_eq!(sheet.rules[0].declarations, vec![Declaration::new("height", "14px")]);
    }

    #[test]
    fn skips_at_rules_and_unsupported_selectors() {
        let sheet = CssParser.parse(
            "@import url(a.css); @media screen { .hero { width: 1px; } } a:hover { color: red; } div > p { color: blue; } #ok { color: green; }",
        );
        assert_eq!(sheet.rule_count(), 1);
        assert_eq!(sheet.rules[0].selector.to_string(), "#ok");
    }

    #[test]
    fn keeps_separators_inside_functions_and_strings() {
        let sheet = CssParser.parse(
            r#".icon { background-color: rgb(255,  0, 0); content: "a;  b"; }"#,
        );
        assert_eq!(sheet.rule_count(), 1);
        assert_eq!(
            sheet.rules[0].declarations,
            vec![
                Declaration::new("background-color", "rgb(255, 0, 0)"),
                Declaration::new("content", "\"a;  b\""),
            ]
        );
    }

    #[test]
    fn property_names_are_lowercased_and_duplicates_kept() {
        let sheet = CssParser.parse("div { WIDTH: 10px; width: 20px }");
        assert_eq!(
            sheet.rules[0].declarations,
            vec![Declaration::new("width", "10px"), Declaration::new("width", "20px")]
        );
    }
}
