//! Renderer process pipeline from markup source to frame output.
//!
//! Styling and layout ride along with tree construction: each element is
//! cascaded as soon as it is attached, style sheets become active as soon as
//! their `<style>` element closes, and flex containers are laid out when
//! their end tag is seen.

use bw_core::EngineResult;
use bw_css::RuleStore;
use bw_dom::Document;
use bw_dom::NodeId;
use bw_html::BuildHooks;
use bw_html::HtmlParser;
use bw_layout::LayoutEngine;
use bw_render::Frame;
use bw_render::RenderConfig;
use bw_render::Renderer;

/// Per-document styling state. Rules loaded here never reach another
/// document.
#[derive(Debug, Default)]
pub struct StyleSession {
    rules: RuleStore,
    layout: LayoutEngine,
    laid_out: usize,
}

impl StyleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Number of flex containers laid out so far.
    pub fn containers_laid_out(&self) -> usize {
        self.laid_out
    }
}

impl BuildHooks for StyleSession {
    fn element_opened(
        &mut self,
        document: &mut Document,
        element: NodeId,
        ancestors: &[NodeId],
    ) -> EngineResult<()> {
        self.rules.apply(document, element, ancestors);
        if let Some(data) = document.element_mut(element) {
            data.refresh_style();
        }
        Ok(())
    }

    fn style_sheet(&mut self, text: &str) -> EngineResult<()> {
        let added = self.rules.load_rules(text);
        log::debug!("style sheet added {added} rules ({} total)", self.rules.len());
        Ok(())
    }

    fn element_closed(&mut self, document: &mut Document, element: NodeId) -> EngineResult<()> {
        if !self.layout.layout(document, element).is_empty() {
            self.laid_out += 1;
        }
        Ok(())
    }
}

/// Dedicated renderer process.
#[derive(Debug, Default)]
pub struct RendererProcess {
    html: HtmlParser,
    render: Renderer,
}

impl RendererProcess {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            html: HtmlParser,
            render: Renderer::new(config),
        }
    }

    /// Parses, styles and lays out `markup` with a fresh rule store.
    pub fn parse_document(&self, markup: &str) -> EngineResult<Document> {
        let (document, session) = self.html.parse_with_hooks(markup, StyleSession::new())?;
        log::debug!(
            "styled document: {} rules, {} flex containers",
            session.rules().len(),
            session.containers_laid_out()
        );
        Ok(document)
    }

    pub fn paint(&self, document: &Document) -> Frame {
        self.render.render(document)
    }

    pub fn render_document(&self, markup: &str) -> EngineResult<Frame> {
        let document = self.parse_document(markup)?;
        Ok(self.paint(&document))
    }
}
