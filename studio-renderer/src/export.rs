//! Scene export to image formats.
//!
//! Renders a [`Scene`] to an SVG document in scene units, then rasterizes it
//! with usvg/resvg into a tiny-skia pixmap scaled to the requested width.
//! Hidden objects are skipped; everything else is painted bottom to top.

use std::fmt::Write;
use std::sync::Arc;

use image::ImageEncoder;
use studio_core::element::{ObjectKind, SceneObject, VectorGraphic};
use studio_core::style::{Fill, LinearGradient, PaintFirst, Shadow, TextAlign, TextDirection, TextStyle};
use studio_core::Scene;

use crate::error::{RenderError, RenderResult};

/// Width of the "4K" export target.
pub const EXPORT_4K_WIDTH: u32 = 3840;

/// Approximate ascent of a line, as a fraction of the font size.
const ASCENT_EM: f32 = 0.8;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// SVG vector graphics (the SVG XML string as UTF-8 bytes).
    Svg,
}

impl ExportFormat {
    /// Pick a format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// MIME type of the encoded output.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

/// Configuration for scene export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output width in pixels used by [`SceneExporter::export`].
    pub width: u32,
    /// Backdrop color; the scene's own background color when `None`.
    pub background_color: Option<String>,
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
    /// Load the host's fonts so text is rasterized.
    pub load_system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: EXPORT_4K_WIDTH,
            background_color: None,
            jpeg_quality: 92,
            load_system_fonts: true,
        }
    }
}

/// Exports a [`Scene`] to SVG, PNG or JPEG.
pub struct SceneExporter {
    config: ExportConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SceneExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "system fonts loaded");
        }
        Self {
            config,
            fontdb: Arc::new(db),
        }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a scene at the configured width.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be rendered or encoded.
    pub fn export(&self, scene: &Scene, format: ExportFormat) -> RenderResult<Vec<u8>> {
        let width = self.config.width;
        match format {
            ExportFormat::Png => self.render_to_png(scene, width),
            ExportFormat::Jpeg => self.render_to_jpeg(scene, width),
            ExportFormat::Svg => Ok(self.render_to_svg(scene, width)?.into_bytes()),
        }
    }

    /// Output size in pixels for a target width, preserving the scene's
    /// aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] if the width is zero or the scene
    /// has no area.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn output_size(scene: &Scene, target_width: u32) -> RenderResult<(u32, u32)> {
        if target_width == 0 {
            return Err(RenderError::InvalidSize("target width is zero".to_string()));
        }
        if !(scene.width > 0.0 && scene.height > 0.0) {
            return Err(RenderError::InvalidSize(format!(
                "scene is {}x{}",
                scene.width, scene.height
            )));
        }
        let height = (scene.height * target_width as f32 / scene.width).round() as u32;
        Ok((target_width, height.max(1)))
    }

    /// Export the scene to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, scene: &Scene, target_width: u32) -> RenderResult<Vec<u8>> {
        let svg = self.render_to_svg(scene, target_width)?;
        let pixmap = self.rasterize_svg(&svg)?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }

    /// Export the scene to JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_jpeg(&self, scene: &Scene, target_width: u32) -> RenderResult<Vec<u8>> {
        let svg = self.render_to_svg(scene, target_width)?;
        let pixmap = self.rasterize_svg(&svg)?;

        // Premultiplied channels are the image composited over black.
        let (width, height) = (pixmap.width(), pixmap.height());
        let rgb: Vec<u8> = pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Export the scene to an SVG string sized to `target_width` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSize`] if no output size can be derived.
    pub fn render_to_svg(&self, scene: &Scene, target_width: u32) -> RenderResult<String> {
        let (out_w, out_h) = Self::output_size(scene, target_width)?;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            scene.width, scene.height,
        );

        let backdrop = self
            .config
            .background_color
            .as_deref()
            .unwrap_or(&scene.background_color);
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(backdrop),
        );

        let mut writer = SvgWriter {
            out: &mut svg,
            next_def: 0,
        };
        for object in scene.objects() {
            writer.object(object);
        }

        svg.push_str("</svg>");
        tracing::debug!(out_w, out_h, bytes = svg.len(), "scene rendered to svg");
        Ok(svg)
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg: &str) -> RenderResult<tiny_skia::Pixmap> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl std::fmt::Debug for SceneExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneExporter")
            .field("config", &self.config)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

/// Appends scene objects to an SVG document, numbering the definitions
/// (gradients, filters) it emits.
struct SvgWriter<'a> {
    out: &'a mut String,
    next_def: u32,
}

impl SvgWriter<'_> {
    fn def_id(&mut self, prefix: &str) -> String {
        self.next_def += 1;
        format!("{prefix}-{}", self.next_def)
    }

    fn object(&mut self, object: &SceneObject) {
        if !object.visible {
            return;
        }
        let g = &object.geometry;
        let _ = write!(
            self.out,
            "<g transform=\"translate({} {}) rotate({}) scale({} {})\">",
            g.left, g.top, g.angle, g.scale_x, g.scale_y,
        );

        match &object.kind {
            ObjectKind::BackgroundImage { image } | ObjectKind::Image { image } => {
                let _ = write!(
                    self.out,
                    "<image width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                    image.width,
                    image.height,
                    escape_xml(&image.data_uri),
                );
            }
            ObjectKind::BackgroundVector { graphic } | ObjectKind::IconVector { graphic } => {
                self.vector(graphic);
            }
            ObjectKind::Text { text, style } => {
                let size = object.intrinsic_size();
                self.text(text, style, size);
            }
            ObjectKind::Group { members } => {
                for member in members {
                    self.object(member);
                }
            }
        }

        self.out.push_str("</g>");
    }

    fn vector(&mut self, graphic: &VectorGraphic) {
        for path in &graphic.paths {
            let fill = path.fill.as_deref().map_or_else(|| "none".to_string(), escape_xml);
            let _ = write!(self.out, "<path d=\"{}\" fill=\"{fill}\"", escape_xml(&path.d));
            if let Some(stroke) = &path.stroke {
                let _ = write!(
                    self.out,
                    " stroke=\"{}\" stroke-width=\"{}\"",
                    escape_xml(stroke),
                    path.stroke_width,
                );
            }
            self.out.push_str("/>");
        }
    }

    fn text(&mut self, text: &str, style: &TextStyle, (width, height): (f32, f32)) {
        let fill = match &style.fill {
            Fill::Solid { color } => escape_xml(color),
            Fill::Linear(gradient) => {
                let id = self.gradient(gradient, width, height);
                format!("url(#{id})")
            }
        };
        let filter = style.shadow.as_ref().map(|shadow| self.shadow(shadow));

        let rtl = style.direction == TextDirection::Rtl;
        // text-anchor is relative to the writing direction.
        let (x, anchor) = match (style.text_align, rtl) {
            (TextAlign::Left, false) => (0.0, "start"),
            (TextAlign::Left, true) => (0.0, "end"),
            (TextAlign::Center, _) => (width / 2.0, "middle"),
            (TextAlign::Right, false) => (width, "end"),
            (TextAlign::Right, true) => (width, "start"),
        };

        let _ = write!(
            self.out,
            "<text font-family=\"{}, sans-serif\" font-size=\"{}\" font-weight=\"{}\" fill=\"{fill}\" text-anchor=\"{anchor}\" direction=\"{}\"",
            escape_xml(&style.font_family),
            style.font_size,
            style.font_weight,
            if rtl { "rtl" } else { "ltr" },
        );
        if let Some(stroke) = &style.stroke {
            let _ = write!(
                self.out,
                " stroke=\"{}\" stroke-width=\"{}\" stroke-linejoin=\"round\"",
                escape_xml(stroke),
                style.stroke_width,
            );
            if style.paint_first == PaintFirst::Stroke {
                self.out.push_str(" paint-order=\"stroke\"");
            }
        }
        if let Some(id) = filter {
            let _ = write!(self.out, " filter=\"url(#{id})\"");
        }
        self.out.push('>');

        let line_box = style.font_size * style.line_height;
        let leading = (line_box - style.font_size) / 2.0;
        for (index, line) in text.split('\n').enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let baseline = index as f32 * line_box + leading + style.font_size * ASCENT_EM;
            let _ = write!(
                self.out,
                "<tspan x=\"{x}\" y=\"{baseline}\">{}</tspan>",
                escape_xml(line),
            );
        }
        self.out.push_str("</text>");
    }

    /// Emit a gradient definition; coordinates move from center-relative
    /// to the object's top-left origin.
    fn gradient(&mut self, gradient: &LinearGradient, width: f32, height: f32) -> String {
        let id = self.def_id("fill");
        let c = gradient.coords;
        let (cx, cy) = (width / 2.0, height / 2.0);
        let _ = write!(
            self.out,
            "<defs><linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
            c.x1 + cx,
            c.y1 + cy,
            c.x2 + cx,
            c.y2 + cy,
        );
        for stop in &gradient.stops {
            let _ = write!(
                self.out,
                "<stop offset=\"{}\" stop-color=\"{}\"/>",
                stop.offset.clamp(0.0, 1.0),
                escape_xml(&stop.color),
            );
        }
        self.out.push_str("</linearGradient></defs>");
        id
    }

    fn shadow(&mut self, shadow: &Shadow) -> String {
        let id = self.def_id("shadow");
        let _ = write!(
            self.out,
            "<defs><filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\"/></filter></defs>",
            shadow.offset_x,
            shadow.offset_y,
            (shadow.blur / 2.0).max(0.0),
            escape_xml(&shadow.color),
        );
        id
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
