//! The studio orchestrator.
//!
//! [`Studio`] owns the live design and the local state. Paid actions are
//! charged before the service is called; the scene and the progress state
//! are only touched once a call has returned and its answer has been
//! validated.

use std::sync::Arc;

use base64::Engine as _;
use studio_core::element::RasterImage;
use studio_core::gamification::Clock;
use studio_core::{
    ActionKind, ActionPayload, CreditAction, CreditLedger, GamificationEngine, KeyValueStore,
    ObjectId, SceneEditor,
};
use studio_renderer::{ExportConfig, ExportFormat, SceneExporter};
use tokio::time::Instant;

use crate::backend::{
    clean_expanded_prompt, normalize_titles, parse_auto_design, AnalysisResult, GeneratedImage,
    GenerationBackend, ImageSource, TextTemplate, ThumbnailRequest,
};
use crate::error::{AppError, AppResult};
use crate::projects::{Project, ProjectRepository};
use crate::retry::with_retry;
use crate::validation::{
    validate_project_name, validate_prompt, validate_reference_images, youtube_thumbnail_url,
    youtube_video_id,
};
use crate::StudioConfig;

/// Analyses scoring at least this much count as high scores.
pub const HIGH_SCORE_THRESHOLD: u32 = 90;

/// Credit-gated driver of one design session.
pub struct Studio {
    config: StudioConfig,
    editor: SceneEditor,
    credits: CreditLedger,
    progress: GamificationEngine,
    backend: Arc<dyn GenerationBackend>,
    projects: Arc<dyn ProjectRepository>,
    exporter: SceneExporter,
    current_project: Option<Project>,
    design_started: Instant,
}

impl Studio {
    /// Create a studio whose ledger and progress live in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored progress cannot be read or written.
    pub fn new(
        config: StudioConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        backend: Arc<dyn GenerationBackend>,
        projects: Arc<dyn ProjectRepository>,
    ) -> AppResult<Self> {
        let credits = CreditLedger::with_starting_balance(Arc::clone(&store), config.starting_credits);
        let progress = GamificationEngine::load(store, clock)?;
        Ok(Self::from_parts(config, credits, progress, backend, projects))
    }

    /// Create a studio from already constructed services.
    #[must_use]
    pub fn from_parts(
        config: StudioConfig,
        credits: CreditLedger,
        progress: GamificationEngine,
        backend: Arc<dyn GenerationBackend>,
        projects: Arc<dyn ProjectRepository>,
    ) -> Self {
        let exporter = SceneExporter::new(ExportConfig {
            width: config.export_width,
            load_system_fonts: config.load_system_fonts,
            ..ExportConfig::default()
        });
        let editor = SceneEditor::new(config.canvas_width, config.canvas_height);
        Self {
            config,
            editor,
            credits,
            progress,
            backend,
            projects,
            exporter,
            current_project: None,
            design_started: Instant::now(),
        }
    }

    /// The live design.
    #[must_use]
    pub fn editor(&self) -> &SceneEditor {
        &self.editor
    }

    /// Mutable access to the live design.
    pub fn editor_mut(&mut self) -> &mut SceneEditor {
        &mut self.editor
    }

    /// The credit ledger.
    #[must_use]
    pub fn credits(&self) -> &CreditLedger {
        &self.credits
    }

    /// Mutable access to the ledger, for registering listeners.
    pub fn credits_mut(&mut self) -> &mut CreditLedger {
        &mut self.credits
    }

    /// The progress engine.
    #[must_use]
    pub fn progress(&self) -> &GamificationEngine {
        &self.progress
    }

    /// Mutable access to the progress engine, for registering listeners.
    pub fn progress_mut(&mut self) -> &mut GamificationEngine {
        &mut self.progress
    }

    /// The project the design was opened from or last saved to.
    #[must_use]
    pub fn current_project(&self) -> Option<&Project> {
        self.current_project.as_ref()
    }

    /// Start over with an empty canvas.
    pub fn new_design(&mut self) {
        self.editor = SceneEditor::new(self.config.canvas_width, self.config.canvas_height);
        self.current_project = None;
        self.design_started = Instant::now();
        tracing::debug!("New design started");
    }

    // --- Paid actions ---

    /// Generate a background image and install it in the design.
    ///
    /// The canvas is resized to the requested aspect ratio.
    ///
    /// # Errors
    ///
    /// Validation errors and insufficient credits are returned before the
    /// service is called. Service errors are returned once retries are
    /// exhausted; the charge is not refunded. An image that cannot be
    /// decoded is an [`AppError::MalformedResponse`] and leaves the design
    /// untouched.
    pub async fn generate(&mut self, request: &ThumbnailRequest) -> AppResult<GeneratedImage> {
        validate_prompt(&request.prompt)?;
        validate_reference_images(&request.reference_images)?;
        let balance = self.credits.charge(CreditAction::Generate)?;
        tracing::info!(style = request.style.as_str(), balance, "Generating thumbnail");

        let backend = Arc::clone(&self.backend);
        let image = with_retry(&self.config.retry, "generate_thumbnail", || {
            backend.generate_thumbnail(request)
        })
        .await?;
        let raster = RasterImage::from_data_uri(&image.data_uri).map_err(|e| {
            AppError::MalformedResponse(format!("undecodable generated image: {e}"))
        })?;

        let long_edge = self.config.canvas_width.max(self.config.canvas_height);
        let (width, height) = request.aspect_ratio.canvas_size(long_edge);
        self.editor.set_canvas_size(width, height)?;
        self.editor.set_background_raster(raster);

        let duration_secs = self.design_started.elapsed().as_secs();
        self.design_started = Instant::now();
        let style = request.style.as_str();
        self.progress.trigger_action(
            ActionKind::ThumbnailCreated,
            &ActionPayload {
                style: Some(style.to_string()),
                duration_secs: Some(duration_secs),
                ..ActionPayload::default()
            },
        )?;
        self.progress
            .trigger_action(ActionKind::UsedStyle, &ActionPayload::style(style))?;
        if request.has_reference_images() {
            self.progress
                .trigger_action(ActionKind::UsedPersonalPhoto, &ActionPayload::default())?;
        }
        Ok(image)
    }

    /// Score the current design.
    ///
    /// # Errors
    ///
    /// Returns insufficient credits before anything else, then export or
    /// service errors.
    pub async fn analyze_canvas(&mut self) -> AppResult<AnalysisResult> {
        self.credits.charge(CreditAction::Analyze)?;
        let source = ImageSource::Canvas {
            data_uri: self.snapshot()?,
        };

        let backend = Arc::clone(&self.backend);
        let result = with_retry(&self.config.retry, "analyze", || backend.analyze(&source)).await?;
        tracing::info!(score = result.score, rating = %result.rating, "Canvas analyzed");

        if result.score >= HIGH_SCORE_THRESHOLD {
            self.progress.trigger_action(
                ActionKind::AnalysisHighScore,
                &ActionPayload::score(result.score),
            )?;
        }
        Ok(result)
    }

    /// Score a published YouTube thumbnail.
    ///
    /// # Errors
    ///
    /// Returns a validation error for links without a video id, then
    /// insufficient credits, then service errors.
    pub async fn analyze_youtube(&mut self, link: &str) -> AppResult<AnalysisResult> {
        let video_id = youtube_video_id(link)?;
        self.credits.charge(CreditAction::Analyze)?;
        let source = ImageSource::Youtube {
            thumbnail_url: youtube_thumbnail_url(&video_id),
            video_id,
        };

        let backend = Arc::clone(&self.backend);
        let result = with_retry(&self.config.retry, "analyze", || backend.analyze(&source)).await?;
        tracing::info!(score = result.score, "Competitor thumbnail analyzed");
        Ok(result)
    }

    /// Let the service lay out text for `goal` over the current design.
    ///
    /// Returns the ids of the placed text objects.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::MalformedResponse`] without touching the
    /// scene if the answer holds no usable element.
    pub async fn auto_design(&mut self, goal: &str) -> AppResult<Vec<ObjectId>> {
        validate_prompt(goal)?;
        self.credits.charge(CreditAction::AutoDesign)?;
        let snapshot = self.snapshot()?;

        let backend = Arc::clone(&self.backend);
        let raw = with_retry(&self.config.retry, "auto_design", || {
            backend.auto_design(&snapshot, goal)
        })
        .await?;
        let elements = parse_auto_design(raw)?;

        let placed = self.editor.apply_auto_design(&elements);
        tracing::info!(placed = placed.len(), "Auto design applied");
        Ok(placed)
    }

    /// Propose video titles for `topic`.
    ///
    /// # Errors
    ///
    /// Returns validation, credit, service or malformed-response errors.
    pub async fn generate_titles(&mut self, topic: &str) -> AppResult<Vec<String>> {
        validate_prompt(topic)?;
        self.credits.charge(CreditAction::Title)?;

        let backend = Arc::clone(&self.backend);
        let titles = with_retry(&self.config.retry, "generate_titles", || {
            backend.generate_titles(topic)
        })
        .await?;
        normalize_titles(titles)
    }

    // --- Free actions ---

    /// Rewrite a short idea into a detailed prompt.
    ///
    /// # Errors
    ///
    /// Returns validation, service or malformed-response errors.
    pub async fn expand_prompt(&mut self, prompt: &str) -> AppResult<String> {
        validate_prompt(prompt)?;

        let backend = Arc::clone(&self.backend);
        let raw = with_retry(&self.config.retry, "expand_prompt", || {
            backend.expand_prompt(prompt)
        })
        .await?;
        let expanded = clean_expanded_prompt(&raw)?;

        self.progress
            .trigger_action(ActionKind::PromptExpanded, &ActionPayload::default())?;
        Ok(expanded)
    }

    /// Ask for text styles that suit the current design.
    ///
    /// # Errors
    ///
    /// Returns export or service errors.
    pub async fn suggest_styles(&self) -> AppResult<Vec<TextTemplate>> {
        let snapshot = self.snapshot()?;
        let backend = Arc::clone(&self.backend);
        with_retry(&self.config.retry, "suggest_text_styles", || {
            backend.suggest_text_styles(&snapshot)
        })
        .await
    }

    /// Apply a style template to the selected text objects.
    pub fn apply_template(&mut self, template: &TextTemplate) -> usize {
        self.editor.apply_preset_style(&template.style)
    }

    // --- Export ---

    /// Export the design at the configured width.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Render`] if the export fails.
    pub fn export(&self, format: ExportFormat) -> AppResult<Vec<u8>> {
        Ok(self.exporter.export(self.editor.scene(), format)?)
    }

    /// JPEG data URI of the design at canvas resolution.
    fn snapshot(&self) -> AppResult<String> {
        let scene = self.editor.scene();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = scene.width.round().max(1.0) as u32;
        let jpeg = self.exporter.render_to_jpeg(scene, width)?;
        Ok(format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(jpeg)
        ))
    }

    // --- Projects ---

    /// Save the design for `user_id`.
    ///
    /// Updates the current project when there is one, otherwise creates a
    /// project named `name` (or a dated default name).
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad names, then repository errors.
    pub async fn save_project(&mut self, user_id: &str, name: Option<&str>) -> AppResult<Project> {
        let name = match (name, &self.current_project) {
            (Some(name), _) => name.trim().to_string(),
            (None, Some(current)) => current.name.clone(),
            (None, None) => format!("Project {}", chrono::Local::now().format("%Y-%m-%d")),
        };
        validate_project_name(&name)?;
        let layout = self.editor.to_document();

        let project = match &self.current_project {
            Some(current) if current.user_id == user_id => {
                self.projects.update(current.id, &name, layout).await?
            }
            _ => self.projects.create(user_id, &name, layout).await?,
        };
        tracing::info!(id = project.id, name = %project.name, "Project saved");
        self.current_project = Some(project.clone());
        Ok(project)
    }

    /// Replace the design with a saved project.
    ///
    /// # Errors
    ///
    /// Returns repository errors, or a layout error if the stored layout is
    /// corrupt; the live design is left unchanged in both cases.
    pub async fn open_project(&mut self, id: u64) -> AppResult<()> {
        let project = self.projects.get(id).await?;
        self.editor.load_document(project.layout.clone())?;
        tracing::info!(id, name = %project.name, "Project opened");
        self.current_project = Some(project);
        self.design_started = Instant::now();
        Ok(())
    }

    /// Projects of `user_id`, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_projects(&self, user_id: &str) -> AppResult<Vec<Project>> {
        self.projects.list_for_user(user_id).await
    }
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("config", &self.config)
            .field("objects", &self.editor.scene().len())
            .field("current_project", &self.current_project.as_ref().map(|p| p.id))
            .finish_non_exhaustive()
    }
}
