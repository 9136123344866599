//! Paint and typography styles for scene objects.
//!
//! Gradients are stored as concrete coordinates plus color stops. The
//! two-color/angle parameters a user picked cannot be recovered from those
//! coordinates, so every operation that assigns a gradient also returns the
//! [`GradientParams`] to stamp into object metadata.

use serde::{Deserialize, Serialize};

/// Default text fill color.
pub const DEFAULT_TEXT_FILL: &str = "#ffffff";

/// Default font family for new text.
pub const DEFAULT_FONT_FAMILY: &str = "Heebo";

/// Default font size for new text.
pub const DEFAULT_FONT_SIZE: f32 = 80.0;

/// Default (heavy) font weight for new text.
pub const DEFAULT_FONT_WEIGHT: u16 = 900;

/// Line height multiplier used for text layout.
pub const DEFAULT_LINE_HEIGHT: f32 = 1.16;

/// Angle used when a gradient is applied without one (left to right).
pub const HORIZONTAL_GRADIENT_ANGLE: f32 = 90.0;

/// A single gradient color stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position along the gradient line (0.0 to 1.0).
    pub offset: f32,
    /// CSS color.
    pub color: String,
}

impl ColorStop {
    /// Create a new color stop.
    #[must_use]
    pub fn new(offset: f32, color: impl Into<String>) -> Self {
        Self {
            offset,
            color: color.into(),
        }
    }
}

/// Endpoints of a linear gradient, relative to the object's center in
/// unscaled object units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientCoords {
    /// Start X.
    pub x1: f32,
    /// Start Y.
    pub y1: f32,
    /// End X.
    pub x2: f32,
    /// End Y.
    pub y2: f32,
}

/// A two-or-more stop linear gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGradient {
    /// Gradient line endpoints.
    pub coords: GradientCoords,
    /// Color stops in ascending offset order.
    pub stops: Vec<ColorStop>,
}

impl LinearGradient {
    /// Build a two-stop gradient from `color1` at offset 0 to `color2` at offset 1.
    #[must_use]
    pub fn two_stop(coords: GradientCoords, color1: &str, color2: &str) -> Self {
        Self {
            coords,
            stops: vec![ColorStop::new(0.0, color1), ColorStop::new(1.0, color2)],
        }
    }
}

/// Fill paint for text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fill {
    /// A single color.
    Solid {
        /// CSS color.
        color: String,
    },
    /// A linear gradient.
    Linear(LinearGradient),
}

impl Fill {
    /// Create a solid fill.
    #[must_use]
    pub fn solid(color: impl Into<String>) -> Self {
        Self::Solid {
            color: color.into(),
        }
    }

    /// Whether this fill is a gradient.
    #[must_use]
    pub fn is_gradient(&self) -> bool {
        matches!(self, Self::Linear(_))
    }
}

impl Default for Fill {
    fn default() -> Self {
        Self::solid(DEFAULT_TEXT_FILL)
    }
}

/// The parameters a gradient was built from, kept so the style panel can
/// restore its controls when the object is selected again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientParams {
    /// Start color.
    pub color1: String,
    /// End color.
    pub color2: String,
    /// Angle in degrees, 0 pointing up.
    pub angle: f32,
}

/// Compute gradient endpoints for a box of `width` x `height` at `angle_degrees`.
///
/// The angle is offset by -90 degrees so that 0 points up and 90 runs left to
/// right.
#[must_use]
pub fn gradient_coords(width: f32, height: f32, angle_degrees: f32) -> GradientCoords {
    let radians = (angle_degrees - 90.0).rem_euclid(360.0).to_radians();
    let (dy, dx) = radians.sin_cos();
    GradientCoords {
        x1: -width / 2.0 * dx,
        y1: -height / 2.0 * dy,
        x2: width / 2.0 * dx,
        y2: height / 2.0 * dy,
    }
}

/// Which of fill and stroke is painted first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintFirst {
    /// Fill first, stroke drawn over it.
    #[default]
    Fill,
    /// Stroke first, fill drawn over it.
    Stroke,
}

/// A drop shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    /// CSS color.
    pub color: String,
    /// Blur radius in pixels.
    pub blur: f32,
    /// Horizontal offset in pixels.
    pub offset_x: f32,
    /// Vertical offset in pixels.
    pub offset_y: f32,
}

impl Shadow {
    /// A black shadow with no blur and no offset.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            color: "#000000".to_string(),
            blur: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// The heavy drop shadow used for new text.
    #[must_use]
    pub fn text_default() -> Self {
        Self {
            color: "rgba(0,0,0,0.8)".to_string(),
            blur: 20.0,
            offset_x: 5.0,
            offset_y: 5.0,
        }
    }

    /// Return a copy with every field present in `patch` replaced.
    #[must_use]
    pub fn merged(&self, patch: &ShadowPatch) -> Self {
        Self {
            color: patch.color.clone().unwrap_or_else(|| self.color.clone()),
            blur: patch.blur.unwrap_or(self.blur),
            offset_x: patch.offset_x.unwrap_or(self.offset_x),
            offset_y: patch.offset_y.unwrap_or(self.offset_y),
        }
    }
}

/// Partial shadow fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowPatch {
    /// CSS color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Blur radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<f32>,
    /// Horizontal offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f32>,
    /// Vertical offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f32>,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    #[default]
    Right,
}

/// Writing direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    /// Left to right.
    Ltr,
    /// Right to left.
    #[default]
    Rtl,
}

/// Full style of a text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Fill paint.
    pub fill: Fill,
    /// Stroke color, if stroked.
    #[serde(default)]
    pub stroke: Option<String>,
    /// Stroke width in pixels.
    #[serde(default)]
    pub stroke_width: f32,
    /// Paint order of fill and stroke.
    #[serde(default)]
    pub paint_first: PaintFirst,
    /// Drop shadow.
    #[serde(default)]
    pub shadow: Option<Shadow>,
    /// Font family name.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Numeric font weight (100-900).
    pub font_weight: u16,
    /// Horizontal alignment.
    #[serde(default)]
    pub text_align: TextAlign,
    /// Writing direction.
    #[serde(default)]
    pub direction: TextDirection,
    /// Line height multiplier.
    #[serde(default = "TextStyle::default_line_height")]
    pub line_height: f32,
}

impl TextStyle {
    const fn default_line_height() -> f32 {
        DEFAULT_LINE_HEIGHT
    }

    /// Apply a preset. Like [`TextStyle::apply_patch`], except that a
    /// preset shadow replaces the current one instead of being merged.
    pub fn apply_preset(&mut self, preset: &TextStylePatch) {
        self.apply_patch(preset);
        if let Some(shadow) = &preset.shadow {
            self.shadow = Some(Shadow::zero().merged(shadow));
        }
    }

    /// Apply every non-fill field present in `patch`.
    ///
    /// Fills need the object's size to materialize gradients, so they are
    /// resolved by the caller through [`FillSpec::materialize`].
    pub fn apply_patch(&mut self, patch: &TextStylePatch) {
        if let Some(stroke) = &patch.stroke {
            self.stroke = Some(stroke.clone());
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width.max(0.0);
        }
        if let Some(order) = patch.paint_first {
            self.paint_first = order;
        }
        if let Some(shadow) = &patch.shadow {
            let base = self.shadow.clone().unwrap_or_else(Shadow::zero);
            self.shadow = Some(base.merged(shadow));
        }
        if let Some(family) = &patch.font_family {
            self.font_family = family.clone();
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(weight) = patch.font_weight {
            self.font_weight = weight;
        }
        if let Some(align) = patch.text_align {
            self.text_align = align;
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Fill::default(),
            stroke: None,
            stroke_width: 0.0,
            paint_first: PaintFirst::Fill,
            shadow: Some(Shadow::text_default()),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: DEFAULT_FONT_WEIGHT,
            text_align: TextAlign::Right,
            direction: TextDirection::Rtl,
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }
}

/// A gradient as described by templates and presets, before it is sized
/// to a concrete object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientSpec {
    /// Color stops.
    pub color_stops: Vec<ColorStop>,
    /// Angle in degrees; horizontal when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
}

/// Fill as supplied by a style override: either a plain color or a
/// gradient shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillSpec {
    /// A CSS color.
    Color(String),
    /// A gradient to be sized to the target object.
    Gradient(GradientSpec),
}

impl FillSpec {
    /// Turn this spec into a concrete fill for an object of the given size.
    ///
    /// Returns `None` for a gradient without stops. Two-stop gradients also
    /// yield the parameters to record in metadata.
    #[must_use]
    pub fn materialize(&self, width: f32, height: f32) -> Option<(Fill, Option<GradientParams>)> {
        match self {
            Self::Color(color) => Some((Fill::solid(color.clone()), None)),
            Self::Gradient(spec) => {
                if spec.color_stops.is_empty() {
                    return None;
                }
                let angle = spec.angle.unwrap_or(HORIZONTAL_GRADIENT_ANGLE);
                let mut stops = spec.color_stops.clone();
                stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
                let params = match stops.as_slice() {
                    [first, second] => Some(GradientParams {
                        color1: first.color.clone(),
                        color2: second.color.clone(),
                        angle,
                    }),
                    _ => None,
                };
                let gradient = LinearGradient {
                    coords: gradient_coords(width, height, angle),
                    stops,
                };
                Some((Fill::Linear(gradient), params))
            }
        }
    }
}

/// A bundle of optional text style fields, as produced by style templates,
/// AI suggestions and `addText` overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStylePatch {
    /// Fill color or gradient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillSpec>,
    /// Stroke color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Stroke width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
    /// Paint order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paint_first: Option<PaintFirst>,
    /// Shadow fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowPatch>,
    /// Font family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Font weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    /// Text alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}
