//! Paints laid-out documents into RGBA frames.

pub mod color;

use bw_core::EngineError;
use bw_core::EngineResult;
use bw_dom::Document;
use bw_dom::NodeId;
pub use color::Color;
use image::ImageFormat;
use image::Rgba;
use image::RgbaImage;
use std::io::Cursor;
use std::path::Path;

/// Viewport and background used when painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub clear_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800,
            viewport_height: 800,
            clear_color: Color::WHITE,
        }
    }
}

/// Painted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub image: RgbaImage,
    pub draw_calls: usize,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Colour at `(x, y)`, `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image
            .get_pixel_checked(x, y)
            .map(|Rgba([r, g, b, _])| Color::rgb(*r, *g, *b))
    }

    pub fn encode_png(&self) -> EngineResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|error| EngineError::new("render.frame.encode_failed", error.to_string()))?;
        Ok(bytes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|error| {
                EngineError::new(
                    "render.frame.save_failed",
                    format!("{}: {error}", path.display()),
                )
            })
    }
}

/// Fills each sized element with its `background-color`.
#[derive(Debug, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Paints in document order so later siblings and descendants cover
    /// earlier boxes. Item offsets are relative to their container, so each
    /// box is shifted by the accumulated offsets of its ancestors.
    pub fn render(&self, document: &Document) -> Frame {
        let mut image = RgbaImage::from_pixel(
            self.config.viewport_width,
            self.config.viewport_height,
            Rgba(self.config.clear_color.to_rgba()),
        );
        let mut draw_calls = 0_usize;
        let mut pending: Vec<(NodeId, f32, f32)> = vec![(document.root(), 0.0, 0.0)];

        while let Some((node, origin_x, origin_y)) = pending.pop() {
            let (mut x, mut y) = (origin_x, origin_y);

            if let Some(element) = document.element(node) {
                let style = &element.style;
                x += style.number("left").unwrap_or(0.0);
                y += style.number("top").unwrap_or(0.0);

                let width = style.number("width").unwrap_or(0.0);
                let height = style.number("height").unwrap_or(0.0);
                if width > 0.0 && height > 0.0 {
                    let fill = match style.get("background-color") {
                        None => Some(Color::BLACK),
                        Some(value) => match value.as_keyword().and_then(Color::parse) {
                            Some(color) => Some(color),
                            None => {
                                log::debug!(
                                    "<{}> has unsupported background-color {value:?}",
                                    element.tag_name
                                );
                                None
                            }
                        },
                    };

                    if let Some(color) = fill {
                        if fill_rect(&mut image, x, y, width, height, color) {
                            draw_calls += 1;
                        }
                    }
                }
            }

            for child in document.children(node).iter().rev() {
                pending.push((*child, x, y));
            }
        }

        log::debug!("painted {draw_calls} boxes");
        Frame { image, draw_calls }
    }
}

/// Returns false when the box lies entirely outside the image.
fn fill_rect(image: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) -> bool {
    let (max_x, max_y) = (image.width() as f32, image.height() as f32);
    let clamp_x = |value: f32| value.round().clamp(0.0, max_x) as u32;
    let clamp_y = |value: f32| value.round().clamp(0.0, max_y) as u32;
    let (x0, x1) = (clamp_x(x), clamp_x(x + width));
    let (y0, y1) = (clamp_y(y), clamp_y(y + height));
    if x0 >= x1 || y0 >= y1 {
        return false;
    }

    let pixel = Rgba(color.to_rgba());
    for row in y0..y1 {
        for column in x0..x1 {
            image.put_pixel(column, row, pixel);
        }
    }
    true
}
