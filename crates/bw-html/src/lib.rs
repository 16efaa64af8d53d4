//! Markup tokenization and tree construction.

pub mod token;
pub mod tokenizer;
pub mod tree_builder;

use bw_core::EngineResult;
use bw_dom::Document;

pub use token::TagToken;
pub use token::Token;
pub use token::TokenSink;
pub use tokenizer::Tokenizer;
pub use tokenizer::tokenize;
pub use tree_builder::BuildHooks;
pub use tree_builder::NoopHooks;
pub use tree_builder::TreeBuilder;

/// Parses markup into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Builds the bare tree without styling or layout.
    pub fn parse(&self, input: &str) -> EngineResult<Document> {
        self.parse_with_hooks(input, NoopHooks)
            .map(|(document, _)| document)
    }

    /// Streams `input` through the tokenizer into a tree builder driving
    /// `hooks`. Any fault aborts the whole document.
    pub fn parse_with_hooks<H: BuildHooks>(
        &self,
        input: &str,
        hooks: H,
    ) -> EngineResult<(Document, H)> {
        log::debug!("parsing {} bytes of markup", input.len());

        let mut builder = TreeBuilder::new(hooks);
        let mut tokenizer = Tokenizer::new();
        tokenizer.feed_str(input, &mut builder)?;
        tokenizer.finish(&mut builder)?;

        let (document, hooks) = builder.into_parts();
        log::debug!("built document with {} nodes", document.node_count());
        Ok((document, hooks))
    }
}
