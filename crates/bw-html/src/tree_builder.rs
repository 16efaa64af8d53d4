//! Stack-based tree construction.
//!
//! The builder owns the document while parsing and calls back into
//! [`BuildHooks`] at the two points the later stages care about: right after
//! an element is attached (style resolution) and right before it is popped
//! (layout of its children). Because children always close before their
//! parent, layout runs post-order.

use crate::token::TagToken;
use crate::token::Token;
use crate::token::TokenSink;
use bw_core::EngineError;
use bw_core::EngineResult;
use bw_dom::Document;
use bw_dom::ElementData;
use bw_dom::NodeId;

/// Tag whose text content is a style sheet.
pub const STYLE_TAG: &str = "style";

/// Stage callbacks invoked while the tree is being built.
pub trait BuildHooks {
    /// `ancestors` is the open-element stack at the time the element was
    /// attached, document first, nearest ancestor last. It never contains
    /// `element` itself.
    fn element_opened(
        &mut self,
        document: &mut Document,
        element: NodeId,
        ancestors: &[NodeId],
    ) -> EngineResult<()> {
        let _ = (document, element, ancestors);
        Ok(())
    }

    fn style_sheet(&mut self, text: &str) -> EngineResult<()> {
        let _ = text;
        Ok(())
    }

    fn element_closed(&mut self, document: &mut Document, element: NodeId) -> EngineResult<()> {
        let _ = (document, element);
        Ok(())
    }
}

/// Hooks that do nothing; produces a bare tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl BuildHooks for NoopHooks {}

#[derive(Debug)]
pub struct TreeBuilder<H> {
    document: Document,
    stack: Vec<NodeId>,
    pending_text: Option<NodeId>,
    hooks: H,
    finished: bool,
}

impl<H: BuildHooks> TreeBuilder<H> {
    pub fn new(hooks: H) -> Self {
        let document = Document::new();
        let root = document.root();
        Self {
            document,
            stack: vec![root],
            pending_text: None,
            hooks,
            finished: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Open nodes, document first.
    pub fn open_elements(&self) -> &[NodeId] {
        &self.stack
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_parts(self) -> (Document, H) {
        (self.document, self.hooks)
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId::DOCUMENT)
    }

    fn open(&mut self, tag: TagToken) -> EngineResult<()> {
        let parent = self.current();
        let element = self
            .document
            .append_element(parent, ElementData::new(tag.name, tag.attributes));
        self.pending_text = None;

        self.hooks
            .element_opened(&mut self.document, element, &self.stack)?;

        if !tag.self_closing {
            self.stack.push(element);
        }
        Ok(())
    }

    fn text(&mut self, ch: char) {
        match self.pending_text {
            Some(node) => self.document.push_text(node, ch),
            None => {
                let parent = self.current();
                let node = self.document.append_text(parent, "");
                self.document.push_text(node, ch);
                self.pending_text = Some(node);
            }
        }
    }

    fn close(&mut self, name: &str) -> EngineResult<()> {
        if self.stack.len() <= 1 {
            return Err(EngineError::new(
                "html.tree.unbalanced_end_tag",
                format!("end tag `</{name}>` has no open element to close"),
            ));
        }

        let top = self.current();
        if let Some(element) = self.document.element(top) {
            if element.tag_name != name {
                log::warn!(
                    "end tag `</{name}>` closes open `<{}>`",
                    element.tag_name
                );
            }
        }
        self.close_top()
    }

    fn close_top(&mut self) -> EngineResult<()> {
        let top = self.current();

        if let Some(sheet) = self.style_text(top) {
            self.hooks.style_sheet(&sheet)?;
        }

        self.hooks.element_closed(&mut self.document, top)?;
        self.stack.pop();
        self.pending_text = None;
        Ok(())
    }

    fn style_text(&self, node: NodeId) -> Option<String> {
        let element = self.document.element(node)?;
        if element.tag_name != STYLE_TAG {
            return None;
        }

        self.document
            .children(node)
            .iter()
            .find_map(|child| self.document.text(*child))
            .map(str::to_owned)
    }

    fn finish(&mut self) -> EngineResult<()> {
        while self.stack.len() > 1 {
            if let Some(element) = self.document.element(self.current()) {
                log::warn!("`<{}>` left open at end of input", element.tag_name);
            }
            self.close_top()?;
        }
        self.finished = true;
        Ok(())
    }
}

impl<H: BuildHooks> TokenSink for TreeBuilder<H> {
    fn process_token(&mut self, token: Token) -> EngineResult<()> {
        match token {
            Token::StartTag(tag) => self.open(tag),
            Token::Text(ch) => {
                self.text(ch);
                Ok(())
            }
            Token::EndTag { name } => self.close(&name),
            Token::Eof => self.finish(),
        }
    }
}
