//! Character-level markup tokenizer.
//!
//! The state machine is an explicit table: [`transition`] maps a
//! `(State, CharClass)` pair to an [`Action`] and the next state. The
//! [`Tokenizer`] only executes actions and carries the token under
//! construction. Pairs missing from the table are faults; the tokenizer does
//! not attempt error recovery.

use crate::token::TagToken;
use crate::token::Token;
use crate::token::TokenSink;
use bw_core::EngineError;
use bw_core::EngineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Data,
    TagOpen,
    EndTagOpen,
    TagName,
    BeforeAttributeName,
    AttributeName,
    BeforeAttributeValue,
    /// Carries the quote character that opened the value.
    QuotedAttributeValue(char),
    UnquotedAttributeValue,
    AfterAttributeValue,
    SelfClosingStartTag,
    Terminated,
}

impl State {
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::TagOpen => "TagOpen",
            Self::EndTagOpen => "EndTagOpen",
            Self::TagName => "TagName",
            Self::BeforeAttributeName => "BeforeAttributeName",
            Self::AttributeName => "AttributeName",
            Self::BeforeAttributeValue => "BeforeAttributeValue",
            Self::QuotedAttributeValue(_) => "QuotedAttributeValue",
            Self::UnquotedAttributeValue => "UnquotedAttributeValue",
            Self::AfterAttributeValue => "AfterAttributeValue",
            Self::SelfClosingStartTag => "SelfClosingStartTag",
            Self::Terminated => "Terminated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Eof,
    Whitespace,
    Letter,
    Digit,
    Solidus,
    LessThan,
    GreaterThan,
    Equals,
    Quote(char),
    Other,
}

impl CharClass {
    pub fn of(input: Option<char>) -> Self {
        match input {
            None => Self::Eof,
            Some('\t' | '\n' | '\u{000C}' | '\r' | ' ') => Self::Whitespace,
            Some('/') => Self::Solidus,
            Some('<') => Self::LessThan,
            Some('>') => Self::GreaterThan,
            Some('=') => Self::Equals,
            Some(quote @ ('"' | '\'')) => Self::Quote(quote),
            Some(ch) if ch.is_ascii_alphabetic() => Self::Letter,
            Some(ch) if ch.is_ascii_digit() => Self::Digit,
            Some(_) => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    EmitText,
    EmitEof,
    BeginStartTag,
    BeginEndTag,
    AppendTagName,
    BeginAttribute,
    AppendAttributeName,
    AppendAttributeValue,
    StoreAttribute,
    EmitTag,
    StoreAttributeAndEmitTag,
    EmitSelfClosingTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub next: State,
    /// Feed the same input again in `next`.
    pub reconsume: bool,
}

const fn go(action: Action, next: State) -> Option<Transition> {
    Some(Transition {
        action,
        next,
        reconsume: false,
    })
}

const fn reconsume(action: Action, next: State) -> Option<Transition> {
    Some(Transition {
        action,
        next,
        reconsume: true,
    })
}

/// The transition table. `None` means the input is not accepted in `state`.
pub fn transition(state: State, class: CharClass) -> Option<Transition> {
    use Action as A;
    use CharClass as C;
    use State as S;

    match (state, class) {
        (S::Data, C::LessThan) => go(A::None, S::TagOpen),
        (S::Data, C::Eof) => go(A::EmitEof, S::Terminated),
        (S::Data, _) => go(A::EmitText, S::Data),

        (S::TagOpen, C::Letter) => reconsume(A::BeginStartTag, S::TagName),
        (S::TagOpen, C::Solidus) => go(A::None, S::EndTagOpen),

        (S::EndTagOpen, C::Letter) => reconsume(A::BeginEndTag, S::TagName),

        (S::TagName, C::Letter | C::Digit) => go(A::AppendTagName, S::TagName),
        (S::TagName, C::Whitespace) => go(A::None, S::BeforeAttributeName),
        (S::TagName, C::Solidus) => go(A::None, S::SelfClosingStartTag),
        (S::TagName, C::GreaterThan) => go(A::EmitTag, S::Data),

        (S::BeforeAttributeName, C::Whitespace) => go(A::None, S::BeforeAttributeName),
        (S::BeforeAttributeName, C::Solidus) => go(A::None, S::SelfClosingStartTag),
        (S::BeforeAttributeName, C::GreaterThan) => go(A::EmitTag, S::Data),
        (S::BeforeAttributeName, C::Eof) => None,
        (S::BeforeAttributeName, _) => reconsume(A::BeginAttribute, S::AttributeName),

        (S::AttributeName, C::Equals) => go(A::None, S::BeforeAttributeValue),
        (S::AttributeName, C::Whitespace | C::Solidus | C::GreaterThan | C::Eof) => {
            reconsume(A::StoreAttribute, S::AfterAttributeValue)
        }
        (S::AttributeName, _) => go(A::AppendAttributeName, S::AttributeName),

        (S::BeforeAttributeValue, C::Whitespace) => go(A::None, S::BeforeAttributeValue),
        (S::BeforeAttributeValue, C::Quote(quote)) => {
            go(A::None, S::QuotedAttributeValue(quote))
        }
        (S::BeforeAttributeValue, C::Eof) => None,
        (S::BeforeAttributeValue, _) => reconsume(A::None, S::UnquotedAttributeValue),

        (S::QuotedAttributeValue(open), C::Quote(close)) if open == close => {
            go(A::StoreAttribute, S::AfterAttributeValue)
        }
        (S::QuotedAttributeValue(_), C::Eof) => None,
        (S::QuotedAttributeValue(open), _) => {
            go(A::AppendAttributeValue, S::QuotedAttributeValue(open))
        }

        (S::UnquotedAttributeValue, C::Whitespace) => {
            go(A::StoreAttribute, S::BeforeAttributeName)
        }
        (S::UnquotedAttributeValue, C::Solidus) => go(A::StoreAttribute, S::SelfClosingStartTag),
        (S::UnquotedAttributeValue, C::GreaterThan) => go(A::StoreAttributeAndEmitTag, S::Data),
        (S::UnquotedAttributeValue, C::Eof) => None,
        (S::UnquotedAttributeValue, _) => {
            go(A::AppendAttributeValue, S::UnquotedAttributeValue)
        }

        (S::AfterAttributeValue, C::Whitespace) => go(A::None, S::BeforeAttributeName),
        (S::AfterAttributeValue, C::Solidus) => go(A::None, S::SelfClosingStartTag),
        (S::AfterAttributeValue, C::GreaterThan) => go(A::EmitTag, S::Data),

        (S::SelfClosingStartTag, C::GreaterThan) => go(A::EmitSelfClosingTag, S::Data),

        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Start,
    End,
}

/// Executes the transition table one character at a time.
#[derive(Debug)]
pub struct Tokenizer {
    state: State,
    tag_kind: TagKind,
    tag: TagToken,
    attribute_name: String,
    attribute_value: String,
    offset: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            tag_kind: TagKind::Start,
            tag: TagToken::default(),
            attribute_name: String::new(),
            attribute_value: String::new(),
            offset: 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state == State::Terminated
    }

    pub fn feed_str(&mut self, input: &str, sink: &mut impl TokenSink) -> EngineResult<()> {
        for ch in input.chars() {
            self.feed(Some(ch), sink)?;
        }
        Ok(())
    }

    /// Feeds the end-of-input marker.
    pub fn finish(&mut self, sink: &mut impl TokenSink) -> EngineResult<()> {
        self.feed(None, sink)
    }

    /// Feeds one input, `None` being end of input.
    pub fn feed(&mut self, input: Option<char>, sink: &mut impl TokenSink) -> EngineResult<()> {
        if self.state == State::Terminated {
            return Err(EngineError::new(
                "html.tokenizer.terminated",
                format!("input received after end of input at offset {}", self.offset),
            ));
        }

        let class = CharClass::of(input);
        loop {
            let Some(step) = transition(self.state, class) else {
                return Err(self.unexpected(input));
            };

            self.run(step.action, input, sink)?;
            self.state = step.next;
            if !step.reconsume {
                break;
            }
        }

        if input.is_some() {
            self.offset = self.offset.saturating_add(1);
        }
        Ok(())
    }

    fn run(
        &mut self,
        action: Action,
        input: Option<char>,
        sink: &mut impl TokenSink,
    ) -> EngineResult<()> {
        match action {
            Action::None => {}
            Action::EmitText => {
                if let Some(ch) = input {
                    sink.process_token(Token::Text(ch))?;
                }
            }
            Action::EmitEof => sink.process_token(Token::Eof)?,
            Action::BeginStartTag => self.begin_tag(TagKind::Start),
            Action::BeginEndTag => self.begin_tag(TagKind::End),
            Action::AppendTagName => {
                if let Some(ch) = input {
                    self.tag.name.push(ch.to_ascii_lowercase());
                }
            }
            Action::BeginAttribute => {
                self.attribute_name.clear();
                self.attribute_value.clear();
            }
            Action::AppendAttributeName => {
                if let Some(ch) = input {
                    self.attribute_name.push(ch);
                }
            }
            Action::AppendAttributeValue => {
                if let Some(ch) = input {
                    self.attribute_value.push(ch);
                }
            }
            Action::StoreAttribute => self.store_attribute(),
            Action::EmitTag => self.emit_tag(sink)?,
            Action::StoreAttributeAndEmitTag => {
                self.store_attribute();
                self.emit_tag(sink)?;
            }
            Action::EmitSelfClosingTag => {
                self.tag.self_closing = true;
                self.emit_tag(sink)?;
            }
        }
        Ok(())
    }

    fn begin_tag(&mut self, kind: TagKind) {
        self.tag_kind = kind;
        self.tag = TagToken::default();
        self.attribute_name.clear();
        self.attribute_value.clear();
    }

    fn store_attribute(&mut self) {
        if self.attribute_name.is_empty() {
            return;
        }
        self.tag
            .set_attribute(&self.attribute_name, &self.attribute_value);
        self.attribute_name.clear();
        self.attribute_value.clear();
    }

    fn emit_tag(&mut self, sink: &mut impl TokenSink) -> EngineResult<()> {
        let tag = std::mem::take(&mut self.tag);
        log::trace!("emit {:?} tag `{}`", self.tag_kind, tag.name);
        match self.tag_kind {
            TagKind::Start => sink.process_token(Token::StartTag(tag)),
            TagKind::End => sink.process_token(Token::EndTag { name: tag.name }),
        }
    }

    fn unexpected(&self, input: Option<char>) -> EngineError {
        match input {
            Some(ch) => EngineError::new(
                "html.tokenizer.unexpected_character",
                format!(
                    "unexpected character {ch:?} in state {} at offset {}",
                    self.state.name(),
                    self.offset
                ),
            ),
            None => EngineError::new(
                "html.tokenizer.unexpected_eof",
                format!(
                    "unexpected end of input in state {} at offset {}",
                    self.state.name(),
                    self.offset
                ),
            ),
        }
    }
}

/// Tokenizes a whole string, end-of-input marker included.
pub fn tokenize(input: &str) -> EngineResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut tokenizer = Tokenizer::new();
    tokenizer.feed_str(input, &mut tokens)?;
    tokenizer.finish(&mut tokens)?;
    Ok(tokens)
}
