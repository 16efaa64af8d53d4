//! Flex container and item properties read from resolved styles.

use bw_dom::ResolvedStyle;
use bw_dom::StyleValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
}

impl JustifyContent {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("flex-end") => Self::FlexEnd,
            Some("center") => Self::Center,
            Some("space-between") => Self::SpaceBetween,
            Some("space-around") => Self::SpaceAround,
            _ => Self::FlexStart,
        }
    }

    /// Offset of the first item and extra gap between items for `count`
    /// items sharing `slack`.
    pub fn distribute(self, slack: f32, count: usize) -> (f32, f32) {
        let count = count as f32;
        match self {
            Self::FlexStart => (0.0, 0.0),
            Self::FlexEnd => (slack, 0.0),
            Self::Center => (slack / 2.0, 0.0),
            Self::SpaceBetween if count > 1.0 => (0.0, slack / (count - 1.0)),
            Self::SpaceBetween => (0.0, 0.0),
            Self::SpaceAround if count > 0.0 => {
                let gap = slack / count;
                (gap / 2.0, gap)
            }
            Self::SpaceAround => (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignItems {
    #[default]
    Stretch,
    FlexStart,
    FlexEnd,
    Center,
}

impl AlignItems {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("flex-start") => Self::FlexStart,
            Some("flex-end") => Self::FlexEnd,
            Some("center") => Self::Center,
            _ => Self::Stretch,
        }
    }

    /// Start of an item of `size` inside a line of `extent`.
    pub fn offset(self, extent: f32, size: f32) -> f32 {
        match self {
            Self::Stretch | Self::FlexStart => 0.0,
            Self::FlexEnd => extent - size,
            Self::Center => (extent - size) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignContent {
    #[default]
    Stretch,
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
}

impl AlignContent {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("stretch") => Self::Stretch,
            Some("flex-end") => Self::FlexEnd,
            Some("center") => Self::Center,
            Some("space-between") => Self::SpaceBetween,
            Some("space-around") => Self::SpaceAround,
            Some(_) => Self::FlexStart,
        }
    }

    /// Offset of the first line and extra gap between lines.
    pub fn distribute(self, free: f32, lines: usize) -> (f32, f32) {
        let lines = lines as f32;
        match self {
            Self::Stretch | Self::FlexStart => (0.0, 0.0),
            Self::FlexEnd => (free, 0.0),
            Self::Center => (free / 2.0, 0.0),
            Self::SpaceBetween if lines > 1.0 => (0.0, free / (lines - 1.0)),
            Self::SpaceBetween => (0.0, 0.0),
            Self::SpaceAround if lines > 0.0 => {
                let gap = free / lines;
                (gap / 2.0, gap)
            }
            Self::SpaceAround => (0.0, 0.0),
        }
    }
}

/// Container-level inputs. Unset sizes are `None`; a zero size counts as
/// unset.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexContainer {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub wrap: bool,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_content: AlignContent,
}

impl FlexContainer {
    /// `None` unless `display` asks for flex layout.
    pub fn from_style(style: &ResolvedStyle) -> Option<Self> {
        match style.keyword("display") {
            Some("flex" | "inline-flex") => {}
            _ => return None,
        }

        if let Some(direction) = style.keyword("flex-direction") {
            if direction != "row" {
                log::debug!("flex-direction `{direction}` laid out as row");
            }
        }

        Some(Self {
            width: positive(style.number("width")),
            height: positive(style.number("height")),
            wrap: style.keyword("flex-wrap") != Some("nowrap"),
            justify_content: JustifyContent::parse(style.keyword("justify-content")),
            align_items: AlignItems::parse(style.keyword("align-items")),
            align_content: AlignContent::parse(style.keyword("align-content")),
        })
    }
}

/// Flex factor: the leading number of `flex`, 0 when absent or not numeric.
pub fn flex_factor(style: &ResolvedStyle) -> f32 {
    match style.get("flex") {
        Some(StyleValue::Number(number)) => *number,
        Some(StyleValue::Keyword(keyword)) => keyword
            .split_whitespace()
            .next()
            .and_then(|first| first.parse::<f32>().ok())
            .unwrap_or(0.0),
        None => 0.0,
    }
}

fn positive(value: Option<f32>) -> Option<f32> {
    value.filter(|number| *number != 0.0)
}

#[cfg(test)]
mod tests {
    use super::AlignContent;
    use super::FlexContainer;
    use super::JustifyContent;
    use super::flex_factor;
    use bw_dom::ResolvedStyle;
    use bw_dom::StyleValue;

    fn style(pairs: &[(&str, &str)]) -> ResolvedStyle {
        let mut style = ResolvedStyle::default();
        for (property, value) in pairs {
            style.set(property, StyleValue::from_declared(value));
        }
        style
    }

    #[test]
    fn only_flex_displays_are_containers() {
        assert!(FlexContainer::from_style(&style(&[("display", "block")])).is_none());
        assert!(FlexContainer::from_style(&style(&[])).is_none());
        assert!(FlexContainer::from_style(&style(&[("display", "inline-flex")])).is_some());
    }

    #[test]
    fn missing_properties_take_defaults() {
        let Some(container) = FlexContainer::from_style(&style(&[("display", "flex")])) else {
            panic!("flex container expected");
        };
        assert!(container.wrap);
        assert_eq!(container.width, None);
        assert_eq!(container.justify_content, JustifyContent::FlexStart);
        assert_eq!(container.align_content, AlignContent::Stretch);
    }

    #[test]
    fn flex_factor_reads_leading_number() {
        assert_eq!(flex_factor(&style(&[("flex", "2")])), 2.0);
        assert_eq!(flex_factor(&style(&[("flex", "1 1 auto")])), 1.0);
        assert_eq!(flex_factor(&style(&[("flex", "none")])), 0.0);
        assert_eq!(flex_factor(&style(&[])), 0.0);
    }

    #[test]
    fn single_item_space_between_starts_at_zero() {
        assert_eq!(JustifyContent::SpaceBetween.distribute(100.0, 1), (0.0, 0.0));
        assert_eq!(JustifyContent::SpaceBetween.distribute(100.0, 3), (0.0, 50.0));
        assert_eq!(JustifyContent::SpaceAround.distribute(90.0, 3), (15.0, 30.0));
        assert_eq!(AlignContent::SpaceBetween.distribute(40.0, 1), (0.0, 0.0));
    }
}
