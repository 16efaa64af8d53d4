//! Per-element style storage: cascaded declarations and their used values.

use std::collections::BTreeMap;

/// Cascade precedence of a declaration: (inline, id, class, type).
///
/// Field order matters: the derived `Ord` compares left to right, which is
/// exactly how conflicting declarations are ranked. Components are never
/// summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub inline: u32,
    pub id: u32,
    pub class: u32,
    pub tag: u32,
}

impl Specificity {
    pub const fn new(inline: u32, id: u32, class: u32, tag: u32) -> Self {
        Self {
            inline,
            id,
            class,
            tag,
        }
    }
}

/// Winning declared value for one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadedValue {
    pub value: String,
    pub specificity: Specificity,
}

/// Property name -> winning declaration, filled by the cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    values: BTreeMap<String, CascadedValue>,
}

impl ComputedStyle {
    pub fn get(&self, property: &str) -> Option<&CascadedValue> {
        self.values.get(property)
    }

    pub fn value(&self, property: &str) -> Option<&str> {
        self.values.get(property).map(|cascaded| cascaded.value.as_str())
    }

    /// Records `value` unless the property already holds a declaration of
    /// equal or higher specificity. Returns whether the value was stored.
    pub fn cascade(&mut self, property: &str, value: &str, specificity: Specificity) -> bool {
        if let Some(existing) = self.values.get(property) {
            if specificity <= existing.specificity {
                return false;
            }
        }

        self.values.insert(
            property.to_owned(),
            CascadedValue {
                value: value.to_owned(),
                specificity,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Derives the used-value map layout and paint read from.
    pub fn resolve(&self) -> ResolvedStyle {
        let mut resolved = ResolvedStyle::default();
        for (property, cascaded) in &self.values {
            resolved.set(property, StyleValue::from_declared(&cascaded.value));
        }
        resolved
    }
}

/// Used value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Number(f32),
    Keyword(String),
}

impl StyleValue {
    /// Converts a declared value: `px` lengths become integers (fraction
    /// truncated), everything else is kept verbatim.
    pub fn from_declared(value: &str) -> Self {
        let trimmed = value.trim();
        match parse_px(trimmed) {
            Some(number) => Self::Number(number),
            None => Self::Keyword(trimmed.to_owned()),
        }
    }

    /// Numeric view; bare numeric keywords such as `flex: 2` also qualify.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Keyword(keyword) => keyword.trim().parse::<f32>().ok(),
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Keyword(keyword) => Some(keyword.as_str()),
        }
    }
}

/// Property name -> used value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStyle {
    values: BTreeMap<String, StyleValue>,
}

impl ResolvedStyle {
    pub fn get(&self, property: &str) -> Option<&StyleValue> {
        self.values.get(property)
    }

    pub fn number(&self, property: &str) -> Option<f32> {
        self.values.get(property).and_then(StyleValue::as_number)
    }

    pub fn keyword(&self, property: &str) -> Option<&str> {
        self.values.get(property).and_then(StyleValue::as_keyword)
    }

    pub fn set(&mut self, property: &str, value: StyleValue) {
        self.values.insert(property.to_owned(), value);
    }

    pub fn set_number(&mut self, property: &str, value: f32) {
        self.set(property, StyleValue::Number(value));
    }

    pub fn contains(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Mirrors `parseInt` on a `px` length: leading sign and integer digits only.
fn parse_px(value: &str) -> Option<f32> {
    let number = value.strip_suffix("px")?.trim_end();
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => (-1.0_f32, rest),
        None => (1.0_f32, number.strip_prefix('+').unwrap_or(number)),
    };

    let integer: String = digits.chars().take_while(char::is_ascii_digit).collect();
    if integer.is_empty() {
        return None;
    }

    integer.parse::<f32>().ok().map(|magnitude| sign * magnitude)
}
