//! Flex layout of a container's direct children.
//!
//! The main axis is always horizontal. Geometry is written into each item's
//! resolved `style` (`width`, `height`, `left`, `right`, `top`, `bottom`),
//! relative to the container's top-left corner.

pub mod flex;

use bw_dom::Document;
use bw_dom::NodeId;
use bw_dom::ResolvedStyle;
pub use flex::AlignContent;
pub use flex::AlignItems;
pub use flex::FlexContainer;
pub use flex::JustifyContent;
use flex::flex_factor;

/// Items sharing one row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlexLine {
    pub items: Vec<NodeId>,
    /// Main-axis space left after fixed-size items.
    pub main_space: f32,
    /// Cross extent of the line.
    pub cross_space: f32,
}

#[derive(Debug, Clone)]
struct Item {
    node: NodeId,
    factor: f32,
    width: f32,
    height: Option<f32>,
    left: f32,
    top: f32,
}

impl Item {
    fn read(node: NodeId, style: &ResolvedStyle) -> Self {
        Self {
            node,
            factor: flex_factor(style),
            width: style.number("width").unwrap_or(0.0),
            height: style.number("height").filter(|height| *height != 0.0),
            left: 0.0,
            top: 0.0,
        }
    }

    fn is_flexible(&self) -> bool {
        self.factor > 0.0
    }
}

/// Computes box geometry for flex containers.
#[derive(Debug, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    /// Lays out the direct element children of `container`. Does nothing and
    /// returns no lines unless the container's `display` is flex.
    pub fn layout(&self, document: &mut Document, container: NodeId) -> Vec<FlexLine> {
        let Some(props) = document
            .element(container)
            .and_then(|element| FlexContainer::from_style(&element.style))
        else {
            return Vec::new();
        };

        let mut items: Vec<Item> = document
            .element_children(container)
            .into_iter()
            .filter_map(|child| {
                document
                    .element(child)
                    .map(|element| Item::read(child, &element.style))
            })
            .collect();

        let main_size = props.width.unwrap_or_else(|| {
            items
                .iter()
                .filter(|item| !item.is_flexible())
                .map(|item| item.width)
                .sum()
        });

        let mut lines = collect_lines(&props, main_size, &mut items);
        let compressed = !props.wrap && lines.iter().any(|line| line.main_space < 0.0);
        if compressed {
            compress(main_size, &mut items);
        } else {
            for line in &lines {
                place_main(&props, line, &mut items);
            }
        }

        lines.retain(|line| !line.items.is_empty());
        let cross_size = place_cross(&props, &lines, &mut items);

        for item in &items {
            let Some(element) = document.element_mut(item.node) else {
                continue;
            };
            let height = item.height.unwrap_or(0.0);
            let style = &mut element.style;
            style.set_number("width", item.width);
            style.set_number("height", height);
            style.set_number("left", item.left);
            style.set_number("right", item.left + item.width);
            style.set_number("top", item.top);
            style.set_number("bottom", item.top + height);
        }

        if let Some(element) = document.element_mut(container) {
            if props.width.is_none() {
                element.style.set_number("width", main_size);
            }
            if props.height.is_none() {
                element.style.set_number("height", cross_size);
            }
            log::trace!(
                "laid out <{}>: {} items in {} lines",
                element.tag_name,
                items.len(),
                lines.len()
            );
        }

        lines
    }
}

fn collect_lines(props: &FlexContainer, main_size: f32, items: &mut [Item]) -> Vec<FlexLine> {
    let mut lines = Vec::new();
    let mut line = FlexLine {
        main_space: main_size,
        ..FlexLine::default()
    };

    for item in items.iter_mut() {
        let height = item.height.unwrap_or(0.0);

        if item.is_flexible() {
            line.items.push(item.node);
            line.cross_space = line.cross_space.max(height);
            continue;
        }

        if props.wrap {
            item.width = item.width.min(main_size);
            if line.main_space < item.width {
                let next = FlexLine {
                    main_space: main_size,
                    ..FlexLine::default()
                };
                lines.push(std::mem::replace(&mut line, next));
            }
        }

        line.items.push(item.node);
        line.main_space -= item.width;
        line.cross_space = line.cross_space.max(height);
    }

    if !props.wrap {
        if let Some(height) = props.height {
            line.cross_space = height;
        }
    }
    lines.push(line);
    lines
}

// Single nowrap line that overflows: scale every item down to fit.
fn compress(main_size: f32, items: &mut [Item]) {
    let total: f32 = items
        .iter()
        .filter(|item| !item.is_flexible())
        .map(|item| item.width)
        .sum();
    if total <= 0.0 {
        return;
    }

    let scale = main_size / total;
    let mut cursor = 0.0_f32;
    for item in items.iter_mut() {
        if item.is_flexible() {
            item.width = 0.0;
        }
        item.width = (item.width * scale).floor();
        item.left = cursor;
        cursor += item.width;
    }
}

fn place_main(props: &FlexContainer, line: &FlexLine, items: &mut [Item]) {
    let members: Vec<&mut Item> = items
        .iter_mut()
        .filter(|item| line.items.contains(&item.node))
        .collect();

    let flex_total: f32 = members.iter().map(|item| item.factor.max(0.0)).sum();
    let (mut cursor, gap) = if flex_total > 0.0 {
        (0.0, 0.0)
    } else {
        props.justify_content
            .distribute(line.main_space, members.len())
    };

    for item in members {
        if flex_total > 0.0 && item.is_flexible() {
            item.width = line.main_space * item.factor / flex_total;
        }
        item.left = cursor;
        cursor += item.width + gap;
    }
}

/// Returns the container's cross size.
fn place_cross(props: &FlexContainer, lines: &[FlexLine], items: &mut [Item]) -> f32 {
    let used: f32 = lines.iter().map(|line| line.cross_space).sum();
    let (cross_size, free) = match props.height {
        Some(height) => (height, height - used),
        None => (used, 0.0),
    };

    let (mut base, gap) = props.align_content.distribute(free, lines.len());
    let share = if lines.is_empty() {
        0.0
    } else {
        free / lines.len() as f32
    };

    for line in lines {
        let extent = match props.align_content {
            AlignContent::Stretch => line.cross_space + share,
            _ => line.cross_space,
        };

        for item in items
            .iter_mut()
            .filter(|item| line.items.contains(&item.node))
        {
            let height = match (item.height, props.align_items) {
                (Some(height), _) => height,
                (None, AlignItems::Stretch) => extent,
                (None, _) => 0.0,
            };
            item.height = Some(height);
            item.top = base + props.align_items.offset(extent, height);
        }

        base += extent + gap;
    }

    cross_size
}

#[cfg(test)]
mod tests {
    use super::FlexLine;
    use super::LayoutEngine;
    use bw_dom::Document;
    use bw_dom::ElementData;
    use bw_dom::NodeId;
    use bw_dom::StyleValue;

    fn element(doc: &mut Document, parent: NodeId, style: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new("div", Vec::new());
        for (property, value) in style {
            data.style.set(property, StyleValue::from_declared(value));
        }
        doc.append_element(parent, data)
    }

    fn number(doc: &Document, node: NodeId, property: &str) -> f32 {
        match doc.element(node).and_then(|e| e.style.number(property)) {
            Some(value) => value,
            None => panic!("`{property}` missing on {node:?}"),
        }
    }

    fn layout(doc: &mut Document, container: NodeId) -> Vec<FlexLine> {
        LayoutEngine.layout(doc, container)
    }

    #[test]
    fn non_flex_container_is_untouched() {
        let mut doc = Document::new();
        let container = element(&mut doc, NodeId::DOCUMENT, &[("width", "100px")]);
        let child = element(&mut doc, container, &[("width", "10px")]);
        assert!(layout(&mut doc, container).is_empty());
        assert!(doc.element(child).is_some_and(|e| !e.style.contains("left")));
    }

    #[test]
    fn center_splits_slack() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "500px"), ("justify-content", "center")],
        );
        let child = element(&mut doc, container, &[("width", "400px")]);
        layout(&mut doc, container);
        assert_eq!(number(&doc, child, "left"), 50.0);
        assert_eq!(number(&doc, child, "right"), 450.0);
    }

    #[test]
    fn stretch_fills_container_height() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "300px"), ("height", "100px"), ("align-items", "stretch")],
        );
        let children: Vec<_> = (0..3)
            .map(|_| element(&mut doc, container, &[("width", "50px")]))
            .collect();
        layout(&mut doc, container);
        for child in children {
            assert_eq!(number(&doc, child, "height"), 100.0);
            assert_eq!(number(&doc, child, "top"), 0.0);
            assert_eq!(number(&doc, child, "bottom"), 100.0);
        }
    }

    #[test]
    fn nowrap_overflow_is_compressed() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "500px"), ("flex-wrap", "nowrap")],
        );
        let a = element(&mut doc, container, &[("width", "300px")]);
        let b = element(&mut doc, container, &[("width", "400px")]);
        let lines = layout(&mut doc, container);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].main_space, -200.0);
        let total = number(&doc, a, "width") + number(&doc, b, "width");
        assert!(total <= 500.0 && total >= 498.0, "total {total}");
        assert_eq!(number(&doc, a, "width"), 214.0);
        assert_eq!(number(&doc, b, "left"), 214.0);
    }

    #[test]
    fn single_item_space_between_sits_at_start() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "500px"), ("justify-content", "space-between")],
        );
        let child = element(&mut doc, container, &[("width", "100px")]);
        layout(&mut doc, container);
        assert_eq!(number(&doc, child, "left"), 0.0);
    }

    #[test]
    fn wrap_opens_new_lines() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "500px"), ("align-content", "flex-start")],
        );
        let a = element(&mut doc, container, &[("width", "300px"), ("height", "40px")]);
        let b = element(&mut doc, container, &[("width", "300px"), ("height", "60px")]);
        let c = element(&mut doc, container, &[("width", "900px"), ("height", "10px")]);
        let lines = layout(&mut doc, container);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].items, vec![a]);
        assert_eq!(lines[0].main_space, 200.0);
        assert_eq!(number(&doc, b, "top"), 40.0);
        assert_eq!(number(&doc, c, "top"), 100.0);
        assert_eq!(number(&doc, c, "width"), 500.0);
        assert_eq!(number(&doc, container, "height"), 110.0);
    }

    #[test]
    fn flexible_items_share_remaining_space() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "500px"), ("height", "50px")],
        );
        let fixed = element(&mut doc, container, &[("width", "200px")]);
        let one = element(&mut doc, container, &[("flex", "1")]);
        let two = element(&mut doc, container, &[("flex", "2")]);
        layout(&mut doc, container);

        assert_eq!(number(&doc, fixed, "left"), 0.0);
        assert_eq!(number(&doc, one, "left"), 200.0);
        assert_eq!(number(&doc, one, "width"), 100.0);
        assert_eq!(number(&doc, two, "left"), 300.0);
        assert_eq!(number(&doc, two, "width"), 200.0);
    }

    #[test]
    fn align_items_positions_within_line() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "300px"), ("height", "100px"), ("align-items", "flex-end")],
        );
        let low = element(&mut doc, container, &[("width", "10px"), ("height", "30px")]);
        let container_two = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "300px"), ("height", "100px"), ("align-items", "center")],
        );
        let mid = element(&mut doc, container_two, &[("width", "10px"), ("height", "30px")]);
        layout(&mut doc, container);
        layout(&mut doc, container_two);

        assert_eq!(number(&doc, low, "top"), 70.0);
        assert_eq!(number(&doc, low, "bottom"), 100.0);
        assert_eq!(number(&doc, mid, "top"), 35.0);
    }

    #[test]
    fn missing_container_sizes_are_derived() {
        let mut doc = Document::new();
        let container = element(&mut doc, NodeId::DOCUMENT, &[("display", "flex")]);
        element(&mut doc, container, &[("width", "120px"), ("height", "20px")]);
        element(&mut doc, container, &[("width", "80px"), ("height", "45px")]);
        let lines = layout(&mut doc, container);

        assert_eq!(lines.len(), 1);
        assert_eq!(number(&doc, container, "width"), 200.0);
        assert_eq!(number(&doc, container, "height"), 45.0);
    }

    /// Two 100px-tall lines in a 100x300 container; returns each line's top.
    fn line_tops(align_content: &str) -> (f32, f32) {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[
                ("display", "flex"),
                ("width", "100px"),
                ("height", "300px"),
                ("flex-wrap", "wrap"),
                ("align-content", align_content),
            ],
        );
        let first = element(&mut doc, container, &[("width", "100px"), ("height", "100px")]);
        let second = element(&mut doc, container, &[("width", "100px"), ("height", "100px")]);
        assert_eq!(layout(&mut doc, container).len(), 2);
        (number(&doc, first, "top"), number(&doc, second, "top"))
    }

    #[test]
    fn align_content_distributes_lines() {
        assert_eq!(line_tops("flex-start"), (0.0, 100.0));
        assert_eq!(line_tops("flex-end"), (100.0, 200.0));
        assert_eq!(line_tops("center"), (50.0, 150.0));
        assert_eq!(line_tops("space-between"), (0.0, 200.0));
    }

    /// Two 100px items in a 500px row; returns each item's left edge.
    fn item_lefts(justify_content: &str) -> (f32, f32) {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[("display", "flex"), ("width", "500px"), ("justify-content", justify_content)],
        );
        let first = element(&mut doc, container, &[("width", "100px")]);
        let second = element(&mut doc, container, &[("width", "100px")]);
        layout(&mut doc, container);
        (number(&doc, first, "left"), number(&doc, second, "left"))
    }

    #[test]
    fn justify_content_distributes_items() {
        assert_eq!(item_lefts("flex-start"), (0.0, 100.0));
        assert_eq!(item_lefts("flex-end"), (300.0, 400.0));
        assert_eq!(item_lefts("space-between"), (0.0, 400.0));
        assert_eq!(item_lefts("space-around"), (75.0, 325.0));
    }

    #[test]
    fn nowrap_line_takes_container_height() {
        let mut doc = Document::new();
        let container = element(
            &mut doc,
            NodeId::DOCUMENT,
            &[
                ("display", "flex"),
                ("width", "100px"),
                ("height", "100px"),
                ("flex-wrap", "nowrap"),
                ("align-content", "flex-start"),
                ("align-items", "flex-end"),
            ],
        );
        let item = element(&mut doc, container, &[("width", "10px"), ("height", "30px")]);
        let lines = layout(&mut doc, container);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].cross_space, 100.0);
        assert_eq!(number(&doc, item, "top"), 70.0);
    }
}
