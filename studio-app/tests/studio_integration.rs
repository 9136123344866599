//! Studio orchestration tests
//!
//! The studio is driven against a scripted backend so that credit
//! charging, retries, scene updates and progress can be checked together.

use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use studio_app::backend::{CreatorStyle, FaceExpression};
use studio_app::{
    AnalysisResult, AppError, AppResult, AspectRatio, GeneratedImage, GenerationBackend,
    ImageSource, MemoryProjectRepository, RetryConfig, Studio, StudioConfig, TextTemplate,
    ThumbnailRequest, ThumbnailStyle, ValidationError,
};
use studio_core::gamification::FixedClock;
use studio_core::{CreditLedger, GamificationEngine, KeyValueStore, MemoryStore, StudioError};

fn png_data_uri(rgb: [u8; 3]) -> String {
    let img = image::RgbImage::from_pixel(16, 9, image::Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    )
}

/// Scripted backend. Quota failures are served before any success.
struct ScriptedBackend {
    quota_failures: AtomicU32,
    generate_calls: AtomicU32,
    other_calls: AtomicU32,
    image: String,
    auto_design: serde_json::Value,
    score: u32,
    analyzed: Mutex<Vec<ImageSource>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            quota_failures: AtomicU32::new(0),
            generate_calls: AtomicU32::new(0),
            other_calls: AtomicU32::new(0),
            image: png_data_uri([200, 30, 30]),
            auto_design: json!({
                "elements": [{
                    "type": "text",
                    "content": "INSANE",
                    "position": { "x_percent": 50, "y_percent": 20 },
                    "style": { "fontSize_percent_of_height": 15, "fill": "#ffff00" }
                }]
            }),
            score: 50,
            analyzed: Mutex::new(Vec::new()),
        }
    }

    fn with_quota_failures(self, n: u32) -> Self {
        self.quota_failures.store(n, Ordering::SeqCst);
        self
    }

    fn with_image(mut self, data_uri: &str) -> Self {
        self.image = data_uri.to_string();
        self
    }

    fn with_auto_design(mut self, value: serde_json::Value) -> Self {
        self.auto_design = value;
        self
    }

    fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    fn other_calls(&self) -> u32 {
        self.other_calls.load(Ordering::SeqCst)
    }

    fn take_quota_failure(&self) -> bool {
        self.quota_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_thumbnail(&self, _request: &ThumbnailRequest) -> AppResult<GeneratedImage> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_quota_failure() {
            return Err(AppError::from_service_message("429 RESOURCE_EXHAUSTED"));
        }
        Ok(GeneratedImage {
            data_uri: self.image.clone(),
            explanation: None,
        })
    }

    async fn expand_prompt(&self, prompt: &str) -> AppResult<String> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("\"Prompt: {prompt}, dramatic lighting\""))
    }

    async fn generate_titles(&self, topic: &str) -> AppResult<Vec<String>> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=7).map(|i| format!("{topic} #{i}")).collect())
    }

    async fn suggest_text_styles(&self, image_data_uri: &str) -> AppResult<Vec<TextTemplate>> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        assert!(image_data_uri.starts_with("data:image/jpeg;base64,"));
        Ok(vec![serde_json::from_value(json!({
            "name": "Gold",
            "style": { "fill": "#ffcc00", "stroke": "#000000", "strokeWidth": 4 }
        }))
        .expect("template")])
    }

    async fn auto_design(&self, image_data_uri: &str, _goal: &str) -> AppResult<serde_json::Value> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        assert!(image_data_uri.starts_with("data:image/jpeg;base64,"));
        Ok(self.auto_design.clone())
    }

    async fn analyze(&self, image: &ImageSource) -> AppResult<AnalysisResult> {
        self.other_calls.fetch_add(1, Ordering::SeqCst);
        self.analyzed.lock().expect("lock").push(image.clone());
        Ok(serde_json::from_value(json!({
            "score": self.score,
            "rating": "Good",
            "optimizedViralPrompt": "a better prompt"
        }))
        .expect("analysis"))
    }
}

struct Harness {
    studio: Studio,
    backend: Arc<ScriptedBackend>,
    store: Arc<dyn KeyValueStore>,
}

fn harness(backend: ScriptedBackend) -> Harness {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("date"),
    ));
    let backend = Arc::new(backend);
    let config = StudioConfig {
        load_system_fonts: false,
        ..StudioConfig::default()
    };
    let credits = CreditLedger::with_starting_balance(Arc::clone(&store), config.starting_credits);
    let progress =
        GamificationEngine::load_with_rng(Arc::clone(&store), clock, StdRng::seed_from_u64(9))
            .expect("progress");
    let studio = Studio::from_parts(
        config,
        credits,
        progress,
        backend.clone(),
        Arc::new(MemoryProjectRepository::new()),
    );
    Harness {
        studio,
        backend,
        store,
    }
}

fn request() -> ThumbnailRequest {
    ThumbnailRequest::new("a cat riding a rocket")
}

// ==========================================================================
// Generation and credits
// ==========================================================================

#[tokio::test]
async fn test_generate_charges_and_installs_background() {
    let mut h = harness(ScriptedBackend::new());

    h.studio.generate(&request()).await.expect("generate");

    assert_eq!(h.studio.credits().balance().expect("balance"), 5);
    let scene = h.studio.editor().scene();
    assert!(scene.background().is_some());
    assert!((scene.width - 1280.0).abs() < f32::EPSILON);
    assert!((scene.height - 720.0).abs() < f32::EPSILON);

    let state = h.studio.progress().state();
    assert_eq!(state.stats.thumbnails_created, 1);
    assert!(state.achievements.contains("first_blood"));
    // Generated right after the session started.
    assert!(state.achievements.contains("speed_demon"));
    assert!(state.points >= 160);
}

#[tokio::test]
async fn test_third_generate_fails_for_credits_without_calling_backend() {
    let mut h = harness(ScriptedBackend::new());

    h.studio.generate(&request()).await.expect("first");
    assert_eq!(h.studio.credits().balance().expect("balance"), 5);
    h.studio.generate(&request()).await.expect("second");
    assert_eq!(h.studio.credits().balance().expect("balance"), 0);

    let err = h.studio.generate(&request()).await.expect_err("third");
    assert!(err.is_insufficient_credits());
    assert!(matches!(
        err,
        AppError::Core(StudioError::InsufficientCredits {
            balance: 0,
            required: 5
        })
    ));
    assert_eq!(h.studio.credits().balance().expect("balance"), 0);
    assert_eq!(h.backend.generate_calls(), 2);
    assert_eq!(h.studio.progress().state().stats.thumbnails_created, 2);
}

#[tokio::test]
async fn test_blank_prompt_is_rejected_before_charging() {
    let mut h = harness(ScriptedBackend::new());

    let err = h
        .studio
        .generate(&ThumbnailRequest::new("   "))
        .await
        .expect_err("blank prompt");
    assert!(matches!(err, AppError::Validation(ValidationError::EmptyPrompt)));
    assert_eq!(h.studio.credits().balance().expect("balance"), 10);
    assert_eq!(h.backend.generate_calls(), 0);
    assert!(h.studio.editor().scene().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_quota_errors_are_retried() {
    let mut h = harness(ScriptedBackend::new().with_quota_failures(2));

    h.studio.generate(&request()).await.expect("generate after retries");

    assert_eq!(h.backend.generate_calls(), 3);
    assert_eq!(h.studio.credits().balance().expect("balance"), 5);
    assert!(h.studio.editor().scene().background().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_leave_scene_and_progress_untouched() {
    let mut h = harness(ScriptedBackend::new().with_quota_failures(10));

    let err = h.studio.generate(&request()).await.expect_err("quota");
    assert!(matches!(err, AppError::Quota(_)));
    assert_eq!(h.backend.generate_calls(), RetryConfig::default().max_retries + 1);

    // Charged up front and not refunded.
    assert_eq!(h.studio.credits().balance().expect("balance"), 5);
    assert!(h.studio.editor().scene().is_empty());
    assert_eq!(h.studio.progress().state().stats.thumbnails_created, 0);
}

#[tokio::test]
async fn test_portrait_request_resizes_canvas() {
    let mut h = harness(ScriptedBackend::new());
    let request = ThumbnailRequest {
        aspect_ratio: AspectRatio::Portrait,
        ..request()
    };

    h.studio.generate(&request).await.expect("generate");

    let scene = h.studio.editor().scene();
    assert!((scene.width - 720.0).abs() < f32::EPSILON);
    assert!((scene.height - 1280.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_undecodable_image_leaves_design_untouched() {
    let mut h = harness(ScriptedBackend::new().with_image("data:image/png;base64,AAAA"));
    let request = ThumbnailRequest {
        aspect_ratio: AspectRatio::Portrait,
        ..request()
    };

    let err = h.studio.generate(&request).await.expect_err("bad image");
    assert!(matches!(err, AppError::MalformedResponse(_)));

    let scene = h.studio.editor().scene();
    assert!((scene.width - 1280.0).abs() < f32::EPSILON);
    assert!((scene.height - 720.0).abs() < f32::EPSILON);
    assert!(scene.background().is_none());
    assert_eq!(h.studio.credits().balance().expect("balance"), 5);
    assert_eq!(h.studio.progress().state().stats.thumbnails_created, 0);
}

#[tokio::test]
async fn test_style_and_photos_feed_progress() {
    let mut h = harness(ScriptedBackend::new());
    let request = ThumbnailRequest {
        style: ThumbnailStyle::Cyberpunk,
        expression: FaceExpression::Shocked,
        creator_style: CreatorStyle::MrBeast,
        reference_images: vec![png_data_uri([1, 2, 3])],
        ..request()
    };

    h.studio.generate(&request).await.expect("generate");

    let state = h.studio.progress().state();
    assert!(state.achievements.contains("personal_touch"));
    for challenge in &state.challenges.list {
        if challenge.name == "Neon Master" || challenge.name == "Personalization" {
            assert!(challenge.is_complete, "{} should be complete", challenge.name);
        }
    }
}

// ==========================================================================
// Analysis
// ==========================================================================

#[tokio::test]
async fn test_high_score_analysis_is_reported() {
    let mut h = harness(ScriptedBackend::new().with_score(99));
    h.studio.editor_mut().add_text(None).expect("text");

    let result = h.studio.analyze_canvas().await.expect("analyze");

    assert_eq!(result.score, 99);
    assert_eq!(h.studio.credits().balance().expect("balance"), 8);
    let state = h.studio.progress().state();
    assert_eq!(state.stats.high_scores, 1);
    assert!(state.achievements.contains("viral_master"));

    let analyzed = h.backend.analyzed.lock().expect("lock");
    assert!(matches!(
        &analyzed[0],
        ImageSource::Canvas { data_uri } if data_uri.starts_with("data:image/jpeg;base64,")
    ));
}

#[tokio::test]
async fn test_ordinary_score_is_not_reported() {
    let mut h = harness(ScriptedBackend::new().with_score(89));

    h.studio.analyze_canvas().await.expect("analyze");

    assert_eq!(h.studio.progress().state().stats.high_scores, 0);
}

#[tokio::test]
async fn test_youtube_analysis_validates_link_first() {
    let mut h = harness(ScriptedBackend::new());

    let err = h
        .studio
        .analyze_youtube("https://vimeo.com/1234")
        .await
        .expect_err("invalid link");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.studio.credits().balance().expect("balance"), 10);

    h.studio
        .analyze_youtube("https://youtu.be/dQw4w9WgXcQ")
        .await
        .expect("analyze");
    assert_eq!(h.studio.credits().balance().expect("balance"), 8);
    let analyzed = h.backend.analyzed.lock().expect("lock");
    assert_eq!(
        analyzed[0],
        ImageSource::Youtube {
            video_id: "dQw4w9WgXcQ".into(),
            thumbnail_url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".into(),
        }
    );
}

// ==========================================================================
// Auto design, titles, prompts and styles
// ==========================================================================

#[tokio::test]
async fn test_auto_design_places_text() {
    let mut h = harness(ScriptedBackend::new());

    let placed = h.studio.auto_design("make it pop").await.expect("auto design");

    assert_eq!(placed.len(), 1);
    assert_eq!(h.studio.credits().balance().expect("balance"), 7);
    assert_eq!(h.studio.editor().scene().len(), 1);
}

#[tokio::test]
async fn test_malformed_auto_design_does_not_touch_scene() {
    let mut h = harness(
        ScriptedBackend::new().with_auto_design(json!({ "elements": [{ "type": "text" }] })),
    );
    h.studio.editor_mut().add_text(None).expect("text");
    let before = h.studio.editor().to_layout_json().expect("layout");

    let err = h.studio.auto_design("make it pop").await.expect_err("malformed");

    assert!(matches!(err, AppError::MalformedResponse(_)));
    assert_eq!(h.studio.editor().to_layout_json().expect("layout"), before);
    assert_eq!(h.studio.credits().balance().expect("balance"), 7);
}

#[tokio::test]
async fn test_titles_are_capped_and_charged() {
    let mut h = harness(ScriptedBackend::new());

    let titles = h.studio.generate_titles("rust tips").await.expect("titles");

    assert_eq!(titles.len(), 5);
    assert_eq!(titles[0], "rust tips #1");
    assert_eq!(h.studio.credits().balance().expect("balance"), 9);
}

#[tokio::test]
async fn test_expand_prompt_is_free_and_rewarded() {
    let mut h = harness(ScriptedBackend::new());

    let expanded = h.studio.expand_prompt("cat").await.expect("expand");

    assert_eq!(expanded, "cat, dramatic lighting");
    assert_eq!(h.studio.credits().balance().expect("balance"), 10);
    let state = h.studio.progress().state();
    assert!(state.achievements.contains("ai_collaborator"));
    assert!(state.points >= 30);
}

#[tokio::test]
async fn test_suggested_template_applies_to_selected_text() {
    let mut h = harness(ScriptedBackend::new());
    let id = h.studio.editor_mut().add_text(None).expect("text");

    let templates = h.studio.suggest_styles().await.expect("styles");
    assert_eq!(templates[0].name, "Gold");
    assert_eq!(h.studio.apply_template(&templates[0]), 1);

    let object = h.studio.editor().scene().get(id).expect("text");
    match &object.kind {
        studio_core::ObjectKind::Text { style, .. } => {
            assert_eq!(style.stroke.as_deref(), Some("#000000"));
            assert!((style.stroke_width - 4.0).abs() < f32::EPSILON);
        }
        other => panic!("expected text, got {other:?}"),
    }
    assert_eq!(h.backend.other_calls(), 1);
}

// ==========================================================================
// Projects and persistence
// ==========================================================================

#[tokio::test]
async fn test_save_update_and_reopen_project() {
    let mut h = harness(ScriptedBackend::new());
    h.studio.editor_mut().add_text(None).expect("text");

    let created = h
        .studio
        .save_project("user-1", Some("Launch video"))
        .await
        .expect("save");
    h.studio.editor_mut().add_text(None).expect("text");
    let updated = h.studio.save_project("user-1", None).await.expect("update");
    assert_eq!(created.id, updated.id);
    assert_eq!(updated.name, "Launch video");
    assert_eq!(updated.layout.objects.len(), 2);

    h.studio.new_design();
    assert!(h.studio.editor().scene().is_empty());
    assert!(h.studio.current_project().is_none());

    h.studio.open_project(created.id).await.expect("open");
    assert_eq!(h.studio.editor().scene().len(), 2);
    assert_eq!(h.studio.list_projects("user-1").await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_opening_missing_project_keeps_design() {
    let mut h = harness(ScriptedBackend::new());
    h.studio.editor_mut().add_text(None).expect("text");

    let err = h.studio.open_project(42).await.expect_err("missing");

    assert!(matches!(err, AppError::ProjectNotFound(42)));
    assert_eq!(h.studio.editor().scene().len(), 1);
}

#[tokio::test]
async fn test_balance_is_persisted_in_store() {
    let mut h = harness(ScriptedBackend::new());

    h.studio.generate_titles("topic").await.expect("titles");

    let raw = h
        .store
        .get(studio_core::credits::CREDITS_KEY)
        .expect("get");
    assert_eq!(raw.as_deref(), Some("9"));
}
