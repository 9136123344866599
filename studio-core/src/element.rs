//! Scene objects - the building blocks of a design.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::style::{GradientParams, TextStyle};
use crate::{StudioError, StudioResult};

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE_EM: f32 = 0.6;

/// Unique identifier for a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a valid UUID.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded raster image, kept as a data URI so layouts are self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterImage {
    /// `data:<mime>;base64,<payload>` URI.
    pub data_uri: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

impl RasterImage {
    /// Decode encoded image bytes (PNG, JPEG, WebP).
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the bytes are not a supported image.
    pub fn decode(bytes: &[u8]) -> StudioResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| StudioError::Decode(format!("unknown image format: {e}")))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| StudioError::Decode(e.to_string()))?;
        Ok(Self {
            data_uri: format!(
                "data:{};base64,{}",
                format.to_mime_type(),
                STANDARD.encode(bytes)
            ),
            width: decoded.width(),
            height: decoded.height(),
        })
    }

    /// Decode a `data:` URI carrying a base64 image.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the URI is malformed or the payload
    /// is not a supported image.
    pub fn from_data_uri(uri: &str) -> StudioResult<Self> {
        let payload = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, data)| data)
            .ok_or_else(|| StudioError::Decode("expected a base64 data URI".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| StudioError::Decode(e.to_string()))?;
        Self::decode(&bytes)
    }
}

/// One path of a vector graphic, with transforms already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    /// SVG path data.
    pub d: String,
    /// Fill color; `None` means the path is not filled.
    #[serde(default)]
    pub fill: Option<String>,
    /// Stroke color, if stroked.
    #[serde(default)]
    pub stroke: Option<String>,
    /// Stroke width.
    #[serde(default)]
    pub stroke_width: f32,
}

/// A parsed vector graphic (icons and vector backgrounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorGraphic {
    /// Intrinsic width.
    pub width: f32,
    /// Intrinsic height.
    pub height: f32,
    /// Paths in paint order.
    pub paths: Vec<VectorPath>,
}

impl VectorGraphic {
    /// Parse an SVG document, flattening groups and baking transforms into
    /// each path.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Decode`] if the SVG cannot be parsed.
    pub fn parse_svg(svg: &str) -> StudioResult<Self> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| StudioError::Decode(format!("SVG parsing failed: {e}")))?;

        let mut paths = Vec::new();
        collect_paths(tree.root(), &mut paths);

        let size = tree.size();
        Ok(Self {
            width: size.width(),
            height: size.height(),
            paths,
        })
    }

    /// Overwrite the fill of every filled path with `color`.
    ///
    /// Paths without a fill stay unfilled.
    pub fn recolor(&mut self, color: &str) {
        for path in &mut self.paths {
            if path.fill.is_some() {
                path.fill = Some(color.to_string());
            }
        }
    }
}

fn collect_paths(group: &usvg::Group, out: &mut Vec<VectorPath>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => collect_paths(g, out),
            usvg::Node::Path(p) => {
                let Some(data) = p.data().clone().transform(p.abs_transform()) else {
                    continue;
                };
                out.push(VectorPath {
                    d: path_data_to_string(&data),
                    fill: p.fill().map(|fill| paint_to_css(fill.paint())),
                    stroke: p.stroke().map(|stroke| paint_to_css(stroke.paint())),
                    stroke_width: p.stroke().map_or(0.0, |stroke| stroke.width().get()),
                });
            }
            usvg::Node::Image(_) | usvg::Node::Text(_) => {}
        }
    }
}

fn paint_to_css(paint: &usvg::Paint) -> String {
    match paint {
        usvg::Paint::Color(c) => format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue),
        // Gradients and patterns collapse to black; icons get recolored anyway.
        _ => "#000000".to_string(),
    }
}

fn path_data_to_string(path: &usvg::tiny_skia_path::Path) -> String {
    use usvg::tiny_skia_path::PathSegment;

    let mut d = String::new();
    for segment in path.segments() {
        let _ = match segment {
            PathSegment::MoveTo(p) => write!(d, "M{} {} ", p.x, p.y),
            PathSegment::LineTo(p) => write!(d, "L{} {} ", p.x, p.y),
            PathSegment::QuadTo(c, p) => write!(d, "Q{} {} {} {} ", c.x, c.y, p.x, p.y),
            PathSegment::CubicTo(c1, c2, p) => write!(
                d,
                "C{} {} {} {} {} {} ",
                c1.x, c1.y, c2.x, c2.y, p.x, p.y
            ),
            PathSegment::Close => write!(d, "Z "),
        };
    }
    d.trim_end().to_string()
}

/// The content of a scene object. The variant determines which style
/// fields are meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectKind {
    /// Raster background (generated or uploaded image).
    BackgroundImage {
        /// Image payload.
        image: RasterImage,
    },
    /// Vector background.
    BackgroundVector {
        /// Vector payload.
        graphic: VectorGraphic,
    },
    /// Editable text.
    Text {
        /// Literal text content.
        text: String,
        /// Text style.
        style: TextStyle,
    },
    /// Inserted raster image.
    Image {
        /// Image payload.
        image: RasterImage,
    },
    /// Inserted vector icon.
    IconVector {
        /// Vector payload.
        graphic: VectorGraphic,
    },
    /// A group of objects positioned relative to the group's origin.
    Group {
        /// Members in paint order.
        members: Vec<SceneObject>,
    },
}

impl ObjectKind {
    /// Short label for the variant, used when an object has no name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::BackgroundImage { .. } => "background-image",
            Self::BackgroundVector { .. } => "background-vector",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::IconVector { .. } => "icon-vector",
            Self::Group { .. } => "group",
        }
    }

    /// Whether this is one of the background variants.
    #[must_use]
    pub fn is_background_kind(&self) -> bool {
        matches!(
            self,
            Self::BackgroundImage { .. } | Self::BackgroundVector { .. }
        )
    }

    /// Whether this is a text object.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Position, scale and rotation. The origin is the top-left corner of the
/// unrotated bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// X position of the left edge.
    pub left: f32,
    /// Y position of the top edge.
    pub top: f32,
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Rotation in degrees.
    pub angle: f32,
}

impl Geometry {
    /// Geometry at a position with unit scale.
    #[must_use]
    pub fn at(left: f32, top: f32) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }

    /// Set a uniform scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale_x = scale;
        self.scale_y = scale;
        self
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

/// Axis-aligned bounds in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Bounds {
    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Smallest bounds containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Self {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }

    /// Whether a point lies inside.
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Display name and flags that are not part of the paint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Display name for the layer list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Marks the scene background.
    #[serde(default)]
    pub is_background: bool,
    /// Parameters of the current gradient fill, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientParams>,
}

impl ObjectMetadata {
    /// Metadata carrying only a display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A positioned, styled object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Content.
    pub kind: ObjectKind,
    /// Position, scale and rotation.
    pub geometry: Geometry,
    /// False when the object is locked.
    pub selectable: bool,
    /// False when the object is hidden.
    pub visible: bool,
    /// Name and reconstructible UI state.
    pub metadata: ObjectMetadata,
}

impl SceneObject {
    /// Create a new, selectable, visible object.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            geometry: Geometry::default(),
            selectable: true,
            visible: true,
            metadata: ObjectMetadata::default(),
        }
    }

    /// Create a text object with the given style.
    #[must_use]
    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Self::new(ObjectKind::Text {
            text: text.into(),
            style,
        })
    }

    /// Set the geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether this object is the scene background.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.metadata.is_background || self.kind.is_background_kind()
    }

    /// Whether this object is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.selectable
    }

    /// Name shown in the layer list.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.metadata
            .name
            .as_deref()
            .unwrap_or_else(|| self.kind.label())
    }

    /// Unscaled size derived from content.
    #[must_use]
    pub fn intrinsic_size(&self) -> (f32, f32) {
        match &self.kind {
            ObjectKind::BackgroundImage { image } | ObjectKind::Image { image } => {
                (image.width as f32, image.height as f32)
            }
            ObjectKind::BackgroundVector { graphic } | ObjectKind::IconVector { graphic } => {
                (graphic.width, graphic.height)
            }
            ObjectKind::Text { text, style } => measure_text(text, style),
            ObjectKind::Group { members } => members.iter().fold((0.0, 0.0), |(w, h), m| {
                let b = m.bounds();
                (w.max(b.right()), h.max(b.bottom()))
            }),
        }
    }

    /// Size after applying scale.
    #[must_use]
    pub fn scaled_size(&self) -> (f32, f32) {
        let (w, h) = self.intrinsic_size();
        (w * self.geometry.scale_x.abs(), h * self.geometry.scale_y.abs())
    }

    /// Bounding box in the coordinate space of the parent.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let (width, height) = self.scaled_size();
        Bounds {
            left: self.geometry.left,
            top: self.geometry.top,
            width,
            height,
        }
    }

    /// Check if a point (in canvas coordinates) is within this object.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.bounds().contains(x, y)
    }

    /// Copy this object under fresh IDs (members included).
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::new();
        if let ObjectKind::Group { members } = &mut copy.kind {
            for member in members.iter_mut() {
                *member = member.duplicate();
            }
        }
        copy
    }

    /// Visit this object and every nested group member.
    pub fn for_each_id(&self, f: &mut impl FnMut(ObjectId)) {
        f(self.id);
        if let ObjectKind::Group { members } = &self.kind {
            for member in members {
                member.for_each_id(f);
            }
        }
    }
}

/// Estimate the laid-out size of a text block.
///
/// Uses a fixed average advance so sizes are deterministic without fonts.
#[must_use]
pub fn measure_text(text: &str, style: &TextStyle) -> (f32, f32) {
    let lines: Vec<&str> = text.split('\n').collect();
    let longest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let width = (longest as f32 * style.font_size * GLYPH_ADVANCE_EM).max(1.0);
    #[allow(clippy::cast_precision_loss)]
    let height = lines.len() as f32 * style.font_size * style.line_height;
    (width, height)
}
