//! Descendant selectors built from type, class and id segments.

use bw_dom::Document;
use bw_dom::ElementData;
use bw_dom::NodeId;
use bw_dom::Specificity;
use core::fmt;

/// One space-separated segment of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Type(String),
    Class(String),
    Id(String),
}

impl SimpleSelector {
    /// Accepts `tag`, `.class` or `#id`. Compound segments such as
    /// `div.note` are not supported.
    pub fn parse(segment: &str) -> Option<Self> {
        let (make, name): (fn(String) -> Self, &str) = match segment.as_bytes().first()? {
            b'#' => (Self::Id, &segment[1..]),
            b'.' => (Self::Class, &segment[1..]),
            _ => (Self::Type, segment),
        };

        if name.is_empty() || !name.bytes().all(is_ident_byte) {
            return None;
        }

        match make(name.to_owned()) {
            Self::Type(tag) => Some(Self::Type(tag.to_ascii_lowercase())),
            other => Some(other),
        }
    }

    /// Class and id compare against the whole attribute value.
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(tag) => element.tag_name.eq_ignore_ascii_case(tag),
            Self::Class(class) => element.class() == Some(class.as_str()),
            Self::Id(id) => element.id() == Some(id.as_str()),
        }
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(tag) => write!(f, "{tag}"),
            Self::Class(class) => write!(f, ".{class}"),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// Segments ordered outermost first; the last one targets the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    segments: Vec<SimpleSelector>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Self> {
        let segments = text
            .split_whitespace()
            .map(SimpleSelector::parse)
            .collect::<Option<Vec<_>>>()?;

        if segments.is_empty() {
            return None;
        }

        Some(Self { segments })
    }

    pub fn segments(&self) -> &[SimpleSelector] {
        &self.segments
    }

    pub fn specificity(&self) -> Specificity {
        self.segments
            .iter()
            .fold(Specificity::default(), |mut acc, segment| {
                match segment {
                    SimpleSelector::Id(_) => acc.id += 1,
                    SimpleSelector::Class(_) => acc.class += 1,
                    SimpleSelector::Type(_) => acc.tag += 1,
                }
                acc
            })
    }

    /// `ancestors` is ordered document first, nearest ancestor last. Each
    /// ancestor, walked outward, consumes the next unmatched segment when it
    /// matches it; ancestors need not be adjacent.
    pub fn matches(&self, document: &Document, element: NodeId, ancestors: &[NodeId]) -> bool {
        let Some((subject, context)) = self.segments.split_last() else {
            return false;
        };

        let Some(target) = document.element(element) else {
            return false;
        };
        if !subject.matches(target) {
            return false;
        }

        let mut remaining = context.len();
        for ancestor in ancestors.iter().rev() {
            if remaining == 0 {
                break;
            }

            let Some(data) = document.element(*ancestor) else {
                continue;
            };
            if context[remaining - 1].matches(data) {
                remaining -= 1;
            }
        }

        remaining == 0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_')
}

#[cfg(test)]
mod tests {
    use super::Selector;
    use super::SimpleSelector;
    use bw_dom::Attribute;
    use bw_dom::Document;
    use bw_dom::ElementData;
    use bw_dom::NodeId;
    use bw_dom::Specificity;

    fn selector(text: &str) -> Selector {
        match Selector::parse(text) {
            Some(value) => value,
            None => panic!("`{text}` should parse"),
        }
    }

    fn tree() -> (Document, Vec<NodeId>, NodeId) {
        let mut doc = Document::new();
        let body = doc.append_element(doc.root(), ElementData::new("body", Vec::new()));
        let outer = doc.append_element(
            body,
            ElementData::new("div", vec![Attribute::new("id", "container")]),
        );
        let section = doc.append_element(outer, ElementData::new("section", Vec::new()));
        let leaf = doc.append_element(
            section,
            ElementData::new(
                "div",
                vec![Attribute::new("id", "myid"), Attribute::new("class", "hello")],
            ),
        );
        (doc, vec![NodeId::DOCUMENT, body, outer, section], leaf)
    }

    #[test]
    fn parses_segments() {
        let parsed = selector("body  #container .hello");
        assert_eq!(
            parsed.segments(),
            &[
                SimpleSelector::Type("body".to_owned()),
                SimpleSelector::Id("container".to_owned()),
                SimpleSelector::Class("hello".to_owned()),
            ]
        );
        assert_eq!(parsed.to_string(), "body #container .hello");
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(Selector::parse("div > p").is_none());
        assert!(Selector::parse("a:hover").is_none());
        assert!(Selector::parse("div.note").is_none());
        assert!(Selector::parse("*").is_none());
        assert!(Selector::parse("   ").is_none());
    }

    #[test]
    fn specificity_counts_each_kind() {
        assert_eq!(
            selector("#container #myid").specificity(),
            Specificity::new(0, 2, 0, 0)
        );
        assert_eq!(
            selector("body div .hello").specificity(),
            Specificity::new(0, 0, 1, 2)
        );
    }

    #[test]
    fn descendant_segments_need_not_be_adjacent() {
        let (doc, ancestors, leaf) = tree();
        assert!(selector("#container .hello").matches(&doc, leaf, &ancestors));
        assert!(selector("body #myid").matches(&doc, leaf, &ancestors));
        assert!(selector("body div section div").matches(&doc, leaf, &ancestors));
    }

    #[test]
    fn segment_order_is_enforced() {
        let (doc, ancestors, leaf) = tree();
        assert!(!selector("section body .hello").matches(&doc, leaf, &ancestors));
        assert!(!selector("#other .hello").matches(&doc, leaf, &ancestors));
        assert!(!selector("#container").matches(&doc, leaf, &ancestors));
    }

    #[test]
    fn class_must_equal_whole_attribute() {
        let mut doc = Document::new();
        let div = doc.append_element(
            doc.root(),
            ElementData::new("div", vec![Attribute::new("class", "a b")]),
        );
        let ancestors = [NodeId::DOCUMENT];
        assert!(!selector(".a").matches(&doc, div, &ancestors));
        assert!(!selector(".b").matches(&doc, div, &ancestors));
    }
}
