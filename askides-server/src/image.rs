//! Social preview image rendering.
//!
//! The card is laid out as an SVG document and rasterised to PNG with
//! resvg. Fonts are loaded once and shared by every render.

use std::path::Path;
use std::sync::Arc;

use askides_core::config::ImageConfig;
use askides_core::escape::html_escape;
use resvg::{tiny_skia, usvg};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

const FONT_SIZE: f32 = 72.0;
const LINE_HEIGHT: f32 = FONT_SIZE * 1.25;
const PADDING_X: f32 = 128.0;
const PADDING_Y: f32 = 64.0;
/// Average advance of a bold glyph relative to the font size
const GLYPH_WIDTH: f32 = 0.55;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to load font {path}: {source}")]
    Font {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("Invalid image size {width}x{height}")]
    Size { width: u32, height: u32 },

    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}

pub struct SocialImageRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
    config: ImageConfig,
}

impl SocialImageRenderer {
    /// Build the font database from the system fonts plus `font`, which
    /// becomes the sans-serif family when given.
    pub fn new(config: ImageConfig, font: Option<&Path>) -> Result<Self, ImageError> {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();

        if let Some(path) = font {
            fontdb.load_font_file(path).map_err(|source| ImageError::Font {
                path: path.display().to_string(),
                source,
            })?;

            let family = fontdb
                .faces()
                .last()
                .and_then(|face| face.families.first())
                .map(|(name, _)| name.clone());
            if let Some(family) = family {
                tracing::debug!(%family, "Using configured font for social images");
                fontdb.set_sans_serif_family(family);
            }
        }

        tracing::debug!(faces = fontdb.len(), "Loaded font database");

        Ok(Self {
            fontdb: Arc::new(fontdb),
            config,
        })
    }

    pub fn fallback_title(&self) -> &str {
        &self.config.fallback_title
    }

    /// Lay out `title` as an SVG card
    pub fn svg(&self, title: &str) -> String {
        let width = self.config.width as f32;
        let height = self.config.height as f32;

        let max_chars =
            ((width - 2.0 * PADDING_X) / (FONT_SIZE * GLYPH_WIDTH)).max(1.0) as usize;
        let max_lines = ((height - 2.0 * PADDING_Y) / LINE_HEIGHT).max(1.0) as usize;
        let lines = wrap(title, max_chars, max_lines);

        // Centre the block; the baseline sits about 0.8em below the glyph top
        let block = lines.len() as f32 * LINE_HEIGHT;
        let top = (height - block) / 2.0 + (LINE_HEIGHT - FONT_SIZE) / 2.0;

        let mut text = String::new();
        for (i, line) in lines.iter().enumerate() {
            let y = top + i as f32 * LINE_HEIGHT + FONT_SIZE * 0.8;
            text.push_str(&format!(
                r#"<tspan x="{:.0}" y="{:.1}">{}</tspan>"#,
                width / 2.0,
                y,
                html_escape(line)
            ));
        }

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{from}"/><stop offset="1" stop-color="{to}"/></linearGradient></defs>
<rect width="{w}" height="{h}" fill="url(#bg)"/>
<text font-family="sans-serif" font-size="{size}" font-weight="700" letter-spacing="-2" fill="#ffffff" text-anchor="middle">{text}</text>
</svg>"##,
            w = self.config.width,
            h = self.config.height,
            from = html_escape(&self.config.gradient_from),
            to = html_escape(&self.config.gradient_to),
            size = FONT_SIZE,
            text = text,
        )
    }

    /// Render `title` to PNG bytes. CPU bound; call from a blocking task.
    pub fn render_png(&self, title: &str) -> Result<Vec<u8>, ImageError> {
        let svg = self.svg(title);

        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)?;

        let mut pixmap = tiny_skia::Pixmap::new(self.config.width, self.config.height).ok_or(
            ImageError::Size {
                width: self.config.width,
                height: self.config.height,
            },
        )?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| ImageError::Encode(e.to_string()))
    }
}

/// Greedy word wrap measured in grapheme clusters. Words longer than a line
/// are split; text beyond `max_lines` is cut and marked with an ellipsis.
fn wrap(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let graphemes: Vec<&str> = word.graphemes(true).collect();

        if current_len > 0 && current_len + 1 + graphemes.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + graphemes.len();
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        for chunk in graphemes.chunks(max_chars) {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
            }
            current = chunk.concat();
            current_len = chunk.len();
        }
    }
    if current_len > 0 {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let mut graphemes: Vec<&str> = last.graphemes(true).collect();
            graphemes.truncate(max_chars.saturating_sub(1));
            *last = format!("{}…", graphemes.concat().trim_end());
        }
    }

    lines
}
