//! Contract for the AI generation and vision service.
//!
//! The studio never talks to a concrete provider. It drives a
//! [`GenerationBackend`] and parses whatever the backend hands back with
//! the helpers in this module, so a malformed answer is rejected before it
//! reaches the scene.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use studio_core::{AutoDesignElement, TextStylePatch};

use crate::error::{AppError, AppResult};

/// Number of titles requested from the title generator.
pub const TITLE_COUNT: usize = 5;

/// Visual style of a generated thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThumbnailStyle {
    /// Film look, rim lighting.
    #[default]
    Cinematic,
    /// Saturated colors.
    Vibrant,
    /// Clean and sparse.
    Minimalist,
    /// Rendered 3D look.
    #[serde(rename = "3d-render")]
    Render3d,
    /// Neon and night city.
    Cyberpunk,
    /// Anime illustration.
    Anime,
    /// Photographic.
    Realistic,
}

impl ThumbnailStyle {
    /// Wire name, also used as the gamification style tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cinematic => "cinematic",
            Self::Vibrant => "vibrant",
            Self::Minimalist => "minimalist",
            Self::Render3d => "3d-render",
            Self::Cyberpunk => "cyberpunk",
            Self::Anime => "anime",
            Self::Realistic => "realistic",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Cinematic => "High-end cinematic photography, 35mm lens, golden hour rim lighting",
            Self::Render3d => "Professional Octane 3D render, sharp vibrant textures",
            _ => "Hyper-realistic studio portrait, sharp eye focus, professional lighting",
        }
    }
}

/// Creator whose look the thumbnail imitates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatorStyle {
    /// No imitation.
    #[default]
    Custom,
    /// Extreme saturation, epic scale.
    MrBeast,
    /// Minimal tech look.
    Mkbhd,
    /// Productivity look.
    AliAbdaal,
    /// Gaming look.
    PewDiePie,
    /// Sports look.
    DudePerfect,
}

impl CreatorStyle {
    fn trait_text(self) -> &'static str {
        match self {
            Self::MrBeast => "Extreme high-saturation, vibrant colors, epic scale background",
            Self::Mkbhd => "Minimalist, professional bokeh, sharp clean tech focus",
            _ => "Modern high-impact candidate photo, sharp focus",
        }
    }
}

/// Facial expression of the subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceExpression {
    /// Natural.
    #[default]
    Natural,
    /// Shocked.
    Shocked,
    /// Happy.
    Happy,
    /// Angry.
    Angry,
    /// Determined.
    Determined,
    /// Laughing.
    Laughing,
}

impl FaceExpression {
    fn trait_text(self) -> &'static str {
        match self {
            Self::Shocked => "Extreme wide-mouthed shocked expression, popping eyes",
            Self::Happy => "Wide infectious joyful smile",
            Self::Laughing => "Loud laughing face, intense emotion",
            Self::Angry => "Fierce angry determined look",
            Self::Natural | Self::Determined => "Natural engaging face",
        }
    }
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// YouTube and desktop.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// Shorts, reels and stories.
    #[serde(rename = "9:16")]
    Portrait,
    /// Square posts.
    #[serde(rename = "1:1")]
    Square,
    /// Presentations.
    #[serde(rename = "4:3")]
    Standard,
}

impl AspectRatio {
    /// Width over height.
    #[must_use]
    pub fn ratio(self) -> f32 {
        match self {
            Self::Landscape => 16.0 / 9.0,
            Self::Portrait => 9.0 / 16.0,
            Self::Square => 1.0,
            Self::Standard => 4.0 / 3.0,
        }
    }

    /// Canvas size with the given long edge.
    #[must_use]
    pub fn canvas_size(self, long_edge: f32) -> (f32, f32) {
        let ratio = self.ratio();
        if ratio >= 1.0 {
            (long_edge, (long_edge / ratio).round())
        } else {
            ((long_edge * ratio).round(), long_edge)
        }
    }
}

/// A thumbnail generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRequest {
    /// Scene description.
    pub prompt: String,
    /// Things to keep out of the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Output aspect ratio.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Visual style.
    #[serde(default)]
    pub style: ThumbnailStyle,
    /// Subject expression.
    #[serde(default)]
    pub expression: FaceExpression,
    /// Creator look.
    #[serde(default, rename = "youTuberStyle")]
    pub creator_style: CreatorStyle,
    /// Reference photos of the subject, as image data URIs.
    #[serde(default, rename = "userPhotos")]
    pub reference_images: Vec<String>,
}

impl ThumbnailRequest {
    /// A request with default style settings.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Whether the subject's own photos are attached.
    #[must_use]
    pub fn has_reference_images(&self) -> bool {
        !self.reference_images.is_empty()
    }

    /// The text instruction sent to an image model.
    #[must_use]
    pub fn compose_prompt(&self) -> String {
        let main = format!(
            "YouTube Viral Thumbnail Concept. SCENE: {}. STYLE: {}. VIBE: {}. FACE: {}. \
             High CTR potential, no text on image.",
            self.prompt.trim(),
            self.style.description(),
            self.creator_style.trait_text(),
            self.expression.trait_text(),
        );
        if !self.has_reference_images() {
            return main;
        }
        let exclusions = self
            .negative_prompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("None");
        format!(
            "MANDATORY VISUAL RULES:\n\
             - Hyper-realistic skin textures (pores, imperfections).\n\
             - Intense rim lighting to separate subject from background.\n\
             - High-impact contrast and vibrant color grading.\n\
             - No plastic-like AI smoothing.\n\
             - Subject must have a clear \"Pattern Interrupt\" quality.\n\
             - EXCLUSIONS (Do not include): {exclusions}\n\n{main}"
        )
    }
}

/// An image returned by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// The image as a `data:` URI.
    pub data_uri: String,
    /// Optional note from the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A named text style bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextTemplate {
    /// Display name.
    pub name: String,
    /// Style fields to apply.
    pub style: TextStylePatch,
}

/// Where an analyzed image came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ImageSource {
    /// The current canvas, exported as a data URI.
    Canvas {
        /// JPEG data URI.
        data_uri: String,
    },
    /// A published YouTube thumbnail.
    Youtube {
        /// Video id.
        video_id: String,
        /// Still image URL.
        thumbnail_url: String,
    },
}

/// Virality analysis of a thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Score from 0 to 100.
    pub score: u32,
    /// Qualitative rating.
    pub rating: String,
    /// Detected visual style.
    #[serde(default)]
    pub style_detected: String,
    /// Dominant colors.
    #[serde(default)]
    pub color_palette: Vec<String>,
    /// Detected elements.
    #[serde(default)]
    pub elements: Vec<String>,
    /// Improvement suggestions.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Free-text reasoning.
    #[serde(default)]
    pub reasoning: String,
    /// Prompt that would recreate the image.
    #[serde(default)]
    pub recreation_prompt: String,
    /// Prompt tuned for a higher score.
    #[serde(default)]
    pub optimized_viral_prompt: String,
    /// Text styles matching the image.
    #[serde(default)]
    pub suggested_text_styles: Vec<TextTemplate>,
}

/// AI generation and vision service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a thumbnail background.
    async fn generate_thumbnail(&self, request: &ThumbnailRequest) -> AppResult<GeneratedImage>;

    /// Rewrite a short idea into a detailed image prompt.
    async fn expand_prompt(&self, prompt: &str) -> AppResult<String>;

    /// Propose video titles for a topic.
    async fn generate_titles(&self, topic: &str) -> AppResult<Vec<String>>;

    /// Propose text styles that suit an image.
    async fn suggest_text_styles(&self, image_data_uri: &str) -> AppResult<Vec<TextTemplate>>;

    /// Propose text placements for an image, as raw JSON.
    ///
    /// The answer is parsed with [`parse_auto_design`].
    async fn auto_design(&self, image_data_uri: &str, goal: &str) -> AppResult<serde_json::Value>;

    /// Score an image.
    async fn analyze(&self, image: &ImageSource) -> AppResult<AnalysisResult>;
}

#[derive(Deserialize)]
struct AutoDesignResponse {
    elements: Option<Vec<serde_json::Value>>,
}

/// Parse an auto-design answer into usable elements.
///
/// Individual entries that fail to decode or lack required fields are
/// dropped.
///
/// # Errors
///
/// Returns [`AppError::MalformedResponse`] if the answer has no `elements`
/// array or none of its entries can be placed.
pub fn parse_auto_design(value: serde_json::Value) -> AppResult<Vec<AutoDesignElement>> {
    let response: AutoDesignResponse = serde_json::from_value(value)?;
    let raw = response
        .elements
        .ok_or_else(|| AppError::MalformedResponse("missing elements array".to_string()))?;
    let total = raw.len();

    let elements: Vec<AutoDesignElement> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<AutoDesignElement>(v).ok())
        .filter(AutoDesignElement::is_usable)
        .collect();

    if elements.is_empty() {
        return Err(AppError::MalformedResponse(format!(
            "none of {total} auto-design elements is usable"
        )));
    }
    if elements.len() < total {
        tracing::warn!(
            dropped = total - elements.len(),
            "Dropped unusable auto-design elements"
        );
    }
    Ok(elements)
}

/// Clean up an expanded prompt: surrounding quotes and a leading
/// `Prompt:` label are removed.
///
/// # Errors
///
/// Returns [`AppError::MalformedResponse`] if nothing is left.
pub fn clean_expanded_prompt(raw: &str) -> AppResult<String> {
    let mut text = raw.trim();
    text = text.strip_prefix('"').unwrap_or(text);
    text = text.strip_suffix('"').unwrap_or(text);
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("prompt:") {
        text = &text["prompt:".len()..];
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::MalformedResponse("empty expanded prompt".to_string()));
    }
    Ok(text.to_string())
}

/// Trim titles, drop empty ones and keep at most [`TITLE_COUNT`].
///
/// # Errors
///
/// Returns [`AppError::MalformedResponse`] if no title is left.
pub fn normalize_titles(titles: Vec<String>) -> AppResult<Vec<String>> {
    let titles: Vec<String> = titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .take(TITLE_COUNT)
        .collect();
    if titles.is_empty() {
        return Err(AppError::MalformedResponse("no titles returned".to_string()));
    }
    Ok(titles)
}

/// Parse a title list answer (a JSON array of strings).
///
/// # Errors
///
/// Returns [`AppError::MalformedResponse`] if the answer is not a string
/// array or holds no titles.
pub fn parse_titles(value: serde_json::Value) -> AppResult<Vec<String>> {
    normalize_titles(serde_json::from_value(value)?)
}
