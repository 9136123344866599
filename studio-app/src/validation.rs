//! Input validation for user-supplied data.
//!
//! Everything here runs before any credit is charged or any external call
//! is made.

use thiserror::Error;
use url::Url;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_LEN: usize = 4_000;
/// Maximum number of reference photos sent with a generation request.
pub const MAX_REFERENCE_IMAGES: usize = 4;
/// Maximum project name length in characters.
pub const MAX_PROJECT_NAME_LEN: usize = 120;
/// Length of a YouTube video id.
pub const YOUTUBE_ID_LEN: usize = 11;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Prompt is empty or whitespace.
    #[error("prompt must not be empty")]
    EmptyPrompt,
    /// Prompt exceeds maximum length.
    #[error("prompt too long (max {MAX_PROMPT_LEN} chars)")]
    PromptTooLong,
    /// Too many reference photos.
    #[error("too many reference images (max {MAX_REFERENCE_IMAGES})")]
    TooManyReferenceImages,
    /// A reference photo is not a base64 image data URI.
    #[error("reference image {0} is not an image data URI")]
    InvalidReferenceImage(usize),
    /// Project name is empty or too long.
    #[error("project name must be 1-{MAX_PROJECT_NAME_LEN} chars")]
    InvalidProjectName,
    /// The URL is not a recognizable YouTube video link.
    #[error("not a YouTube video URL: {0}")]
    InvalidYoutubeUrl(String),
}

/// Validate a generation or expansion prompt.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyPrompt`] for blank input and
/// [`ValidationError::PromptTooLong`] past [`MAX_PROMPT_LEN`] characters.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    if prompt.chars().count() > MAX_PROMPT_LEN {
        return Err(ValidationError::PromptTooLong);
    }
    Ok(())
}

/// Validate the reference photos attached to a generation request.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyReferenceImages`] past
/// [`MAX_REFERENCE_IMAGES`], or [`ValidationError::InvalidReferenceImage`]
/// with the index of the first entry that is not a base64 image data URI.
pub fn validate_reference_images(images: &[String]) -> Result<(), ValidationError> {
    if images.len() > MAX_REFERENCE_IMAGES {
        return Err(ValidationError::TooManyReferenceImages);
    }
    for (index, image) in images.iter().enumerate() {
        let is_image_uri = image
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(','))
            .is_some_and(|(header, body)| header.ends_with(";base64") && !body.is_empty());
        if !is_image_uri {
            return Err(ValidationError::InvalidReferenceImage(index));
        }
    }
    Ok(())
}

/// Validate a project name.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidProjectName`] if the trimmed name is
/// empty or longer than [`MAX_PROJECT_NAME_LEN`].
pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_PROJECT_NAME_LEN {
        return Err(ValidationError::InvalidProjectName);
    }
    Ok(())
}

fn is_valid_video_id(id: &str) -> bool {
    id.len() == YOUTUBE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract the video id from a YouTube link.
///
/// Accepts `youtu.be/<id>`, `watch?v=<id>`, `embed/<id>`, `v/<id>` and
/// `shorts/<id>` forms on any `youtube.com` host.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidYoutubeUrl`] when the link cannot be
/// parsed or carries no 11-character id.
pub fn youtube_video_id(link: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidYoutubeUrl(link.to_string());
    let trimmed = link.trim();
    let url = Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{trimmed}")))
        .map_err(|_| invalid())?;

    let host = url.host_str().ok_or_else(invalid)?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let host = host.strip_prefix("m.").unwrap_or(host);
    let mut segments = url.path_segments().ok_or_else(invalid)?;

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "v" | "shorts" | "live") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    };

    candidate
        .filter(|id| is_valid_video_id(id))
        .ok_or_else(invalid)
}

/// Highest-resolution still for a YouTube video.
#[must_use]
pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/maxresdefault.jpg")
}
