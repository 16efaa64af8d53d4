//! Tokens exchanged between the tokenizer and the tree builder.

use bw_core::EngineResult;
use bw_dom::Attribute;

/// Start tag under construction or emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagToken {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

impl TagToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Assigns an attribute. A repeated name keeps its first position and
    /// takes the latest value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|attribute| attribute.name == name)
        {
            Some(existing) => existing.value = value.to_owned(),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag(TagToken),
    EndTag { name: String },
    Text(char),
    Eof,
}

/// Receives tokens as soon as the tokenizer recognizes them.
pub trait TokenSink {
    fn process_token(&mut self, token: Token) -> EngineResult<()>;
}

impl TokenSink for Vec<Token> {
    fn process_token(&mut self, token: Token) -> EngineResult<()> {
        self.push(token);
        Ok(())
    }
}
