//! Gamification: points, levels, achievements, streaks and daily
//! challenges, driven by discrete action events.
//!
//! All mutation goes through [`GamificationEngine::trigger_action`]. State
//! is persisted after every mutation and listeners are told what happened.

pub mod catalog;
pub mod clock;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::event::Listeners;
use crate::store::{read_json, write_json, KeyValueStore};
use crate::{StudioError, StudioResult};

use catalog::{
    ChallengeDef, ACHIEVEMENTS, AI_COLLABORATOR, CHALLENGE_POOL, DAILY_CHALLENGE_COUNT,
    FIRST_BLOOD, LEVELS, PERFECTIONIST, PERSONAL_TOUCH, SPEED_DEMON, TEN_THUMBNAILS, VIRAL_MASTER,
};
pub use clock::{Clock, FixedClock, LocalClock};

/// Storage key of the persisted state.
pub const STATE_KEY: &str = "gamification_state";

/// Points for creating a thumbnail.
pub const THUMBNAIL_POINTS: u64 = 10;

/// Points for enhancing a prompt.
pub const PROMPT_EXPANDED_POINTS: u64 = 5;

/// Creations faster than this count toward `speed_demon`.
pub const FAST_CREATION_SECS: u64 = 120;

/// Score that unlocks `viral_master`.
pub const VIRAL_MASTER_SCORE: u32 = 99;

/// High-score analyses needed for `perfectionist`.
pub const PERFECTIONIST_COUNT: u32 = 5;

/// Action reported by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// A thumbnail was generated.
    ThumbnailCreated,
    /// A prompt was enhanced.
    PromptExpanded,
    /// An analysis scored 90 or more.
    AnalysisHighScore,
    /// A personal photo was used as a reference.
    UsedPersonalPhoto,
    /// A generation used a named style.
    UsedStyle,
}

/// Details accompanying an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    /// Style used, matched against style-specific challenges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Virality score of an analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Seconds the creation took.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

impl ActionPayload {
    /// Payload carrying a style.
    #[must_use]
    pub fn style(style: impl Into<String>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }

    /// Payload carrying a score.
    #[must_use]
    pub fn score(score: u32) -> Self {
        Self {
            score: Some(score),
            ..Self::default()
        }
    }
}

/// Consecutive-day activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStreak {
    /// Consecutive active days.
    pub count: u32,
    /// Last day with activity.
    pub last_activity_date: Option<NaiveDate>,
}

impl DailyStreak {
    fn record(&mut self, today: NaiveDate) {
        match self.last_activity_date {
            Some(last) if last == today => return,
            Some(last) if last.succ_opt() == Some(today) => self.count += 1,
            _ => self.count = 1,
        }
        self.last_activity_date = Some(today);
    }
}

/// Usage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Thumbnails generated.
    pub thumbnails_created: u32,
    /// Analyses scoring 90 or more.
    pub high_scores: u32,
    /// Creations under [`FAST_CREATION_SECS`].
    pub fast_creations: u32,
}

/// A challenge drawn for a specific day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    /// `<date>-<index>`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What to do.
    pub description: String,
    /// Points on completion.
    pub points: u64,
    /// Matching actions needed.
    pub goal: u32,
    /// Matching actions so far.
    pub current: u32,
    /// Whether the goal was reached.
    pub is_complete: bool,
    /// Action that advances the challenge.
    pub action: ActionKind,
    /// Required style, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl DailyChallenge {
    fn from_def(def: &ChallengeDef, date: NaiveDate, index: usize) -> Self {
        Self {
            id: format!("{date}-{index}"),
            name: def.name.to_string(),
            description: def.description.to_string(),
            points: def.points,
            goal: def.goal,
            current: 0,
            is_complete: false,
            action: def.action,
            style: def.style.map(str::to_string),
        }
    }

    fn matches(&self, action: ActionKind, payload: &ActionPayload) -> bool {
        if self.is_complete || self.action != action {
            return false;
        }
        match &self.style {
            Some(style) => payload.style.as_deref() == Some(style.as_str()),
            None => true,
        }
    }
}

/// Today's challenges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeBoard {
    /// Day the list was drawn for; `None` before the first draw.
    pub date: Option<NaiveDate>,
    /// The drawn challenges.
    pub list: Vec<DailyChallenge>,
}

/// Persisted progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamificationState {
    /// Accumulated points.
    pub points: u64,
    /// Current level, 1-based.
    pub level: u32,
    /// Current level name.
    pub level_name: String,
    /// Threshold of the next level; `None` at the top level.
    pub points_for_next_level: Option<u64>,
    /// Unlocked achievement IDs.
    pub achievements: BTreeSet<String>,
    /// Activity streak.
    pub daily_streak: DailyStreak,
    /// Counters.
    pub stats: Stats,
    /// Today's challenges.
    pub challenges: ChallengeBoard,
}

impl Default for GamificationState {
    fn default() -> Self {
        Self {
            points: 0,
            level: 1,
            level_name: LEVELS[0].name.to_string(),
            points_for_next_level: Some(LEVELS[1].points),
            achievements: BTreeSet::new(),
            daily_streak: DailyStreak::default(),
            stats: Stats::default(),
            challenges: ChallengeBoard::default(),
        }
    }
}

/// An achievement with its unlock flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    /// Identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// How to unlock it.
    pub description: &'static str,
    /// Points awarded on unlock.
    pub points: u64,
    /// Badge glyph.
    pub icon: &'static str,
    /// Whether it is unlocked.
    pub unlocked: bool,
}

/// State plus the full achievement catalogue, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Persisted state.
    #[serde(flatten)]
    pub state: GamificationState,
    /// Every achievement, unlocked or not.
    pub full_achievements: Vec<AchievementStatus>,
}

/// What changed during an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GamificationEvent {
    /// Points were added.
    PointsAwarded {
        /// Amount added.
        amount: u64,
        /// Why.
        reason: String,
    },
    /// A new level was reached.
    LevelUp {
        /// New level.
        level: u32,
        /// Its name.
        name: String,
    },
    /// An achievement was unlocked.
    AchievementUnlocked {
        /// Identifier.
        id: String,
        /// Display name.
        name: String,
    },
    /// A daily challenge was completed.
    ChallengeCompleted {
        /// Challenge ID.
        id: String,
        /// Display name.
        name: String,
        /// Points awarded.
        points: u64,
    },
    /// State was persisted.
    StateChanged,
}

/// The gamification state machine.
pub struct GamificationEngine {
    state: GamificationState,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    listeners: Listeners<GamificationEvent>,
    pending: Vec<GamificationEvent>,
}

impl GamificationEngine {
    /// Load persisted state (or start fresh) and rotate challenges if the
    /// stored day is not today.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read or written.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> StudioResult<Self> {
        Self::load_with_rng(store, clock, StdRng::from_entropy())
    }

    /// Like [`GamificationEngine::load`] with a caller-supplied RNG.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read or written.
    pub fn load_with_rng(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> StudioResult<Self> {
        let state = match read_json::<GamificationState>(store.as_ref(), STATE_KEY) {
            Ok(Some(state)) => state,
            Ok(None) => GamificationState::default(),
            Err(StudioError::Serialization(e)) => {
                warn!(error = %e, "persisted progress unreadable, starting fresh");
                GamificationState::default()
            }
            Err(e) => return Err(e),
        };

        let mut engine = Self {
            state,
            store,
            clock,
            rng,
            listeners: Listeners::new(),
            pending: Vec::new(),
        };
        engine.rotate_challenges();
        engine.persist()?;
        Ok(engine)
    }

    /// Register a listener.
    pub fn on_event(&mut self, listener: impl Fn(&GamificationEvent) + Send + Sync + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GamificationState {
        &self.state
    }

    /// State plus the achievement catalogue with unlock flags.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let full_achievements = ACHIEVEMENTS
            .iter()
            .map(|def| AchievementStatus {
                id: def.id,
                name: def.name,
                description: def.description,
                points: def.points,
                icon: def.icon,
                unlocked: self.state.achievements.contains(def.id),
            })
            .collect();
        ProgressSnapshot {
            state: self.state.clone(),
            full_achievements,
        }
    }

    /// Redraw today's challenges if the stored list is from another day.
    /// Returns whether a new list was drawn; prior progress is discarded.
    pub fn rotate_challenges(&mut self) -> bool {
        let today = self.clock.today();
        if self.state.challenges.date == Some(today) {
            return false;
        }
        let list = CHALLENGE_POOL
            .choose_multiple(&mut self.rng, DAILY_CHALLENGE_COUNT)
            .enumerate()
            .map(|(index, def)| DailyChallenge::from_def(def, today, index))
            .collect();
        self.state.challenges = ChallengeBoard {
            date: Some(today),
            list,
        };
        debug!(%today, "daily challenges drawn");
        true
    }

    /// Apply an action: advance matching challenges, award fixed points and
    /// achievements, level up, persist and notify.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the state cannot be persisted. The
    /// in-memory state is updated regardless.
    pub fn trigger_action(&mut self, action: ActionKind, payload: &ActionPayload) -> StudioResult<()> {
        self.rotate_challenges();
        self.state.daily_streak.record(self.clock.today());

        let mut completed = Vec::new();
        for challenge in &mut self.state.challenges.list {
            if challenge.matches(action, payload) {
                challenge.current += 1;
                if challenge.current >= challenge.goal {
                    challenge.is_complete = true;
                    completed.push((challenge.id.clone(), challenge.name.clone(), challenge.points));
                }
            }
        }
        for (id, name, points) in completed {
            info!(challenge = %name, points, "challenge completed");
            self.pending.push(GamificationEvent::ChallengeCompleted {
                id,
                name: name.clone(),
                points,
            });
            self.add_points(points, &format!("challenge: {name}"));
        }

        match action {
            ActionKind::ThumbnailCreated => {
                self.add_points(THUMBNAIL_POINTS, "thumbnail created");
                self.state.stats.thumbnails_created += 1;
                match self.state.stats.thumbnails_created {
                    1 => self.unlock(FIRST_BLOOD),
                    10 => self.unlock(TEN_THUMBNAILS),
                    _ => {}
                }
                if payload.duration_secs.is_some_and(|secs| secs < FAST_CREATION_SECS) {
                    self.state.stats.fast_creations += 1;
                    self.unlock(SPEED_DEMON);
                }
            }
            ActionKind::PromptExpanded => {
                self.add_points(PROMPT_EXPANDED_POINTS, "prompt enhanced");
                self.unlock(AI_COLLABORATOR);
            }
            ActionKind::AnalysisHighScore => {
                self.state.stats.high_scores += 1;
                if payload.score.is_some_and(|score| score >= VIRAL_MASTER_SCORE) {
                    self.unlock(VIRAL_MASTER);
                }
                if self.state.stats.high_scores >= PERFECTIONIST_COUNT {
                    self.unlock(PERFECTIONIST);
                }
            }
            ActionKind::UsedPersonalPhoto => self.unlock(PERSONAL_TOUCH),
            ActionKind::UsedStyle => {}
        }

        self.persist()
    }

    fn add_points(&mut self, amount: u64, reason: &str) {
        self.state.points += amount;
        self.pending.push(GamificationEvent::PointsAwarded {
            amount,
            reason: reason.to_string(),
        });
        self.check_level_up();
    }

    fn check_level_up(&mut self) {
        // LEVELS is 0-based, so LEVELS[level] is the next level.
        while let Some(next) = LEVELS.get(self.state.level as usize) {
            if self.state.points < next.points {
                break;
            }
            self.state.level += 1;
            self.state.level_name = next.name.to_string();
            info!(level = self.state.level, name = next.name, "level up");
            self.pending.push(GamificationEvent::LevelUp {
                level: self.state.level,
                name: next.name.to_string(),
            });
        }
        self.state.points_for_next_level = LEVELS
            .get(self.state.level as usize)
            .map(|next| next.points);
    }

    fn unlock(&mut self, id: &str) {
        let Some(def) = catalog::achievement(id) else {
            return;
        };
        if !self.state.achievements.insert(def.id.to_string()) {
            return;
        }
        info!(achievement = def.id, "achievement unlocked");
        self.pending.push(GamificationEvent::AchievementUnlocked {
            id: def.id.to_string(),
            name: def.name.to_string(),
        });
        self.add_points(def.points, &format!("achievement: {}", def.name));
    }

    fn persist(&mut self) -> StudioResult<()> {
        let result = write_json(self.store.as_ref(), STATE_KEY, &self.state);
        let mut events = std::mem::take(&mut self.pending);
        if result.is_ok() {
            events.push(GamificationEvent::StateChanged);
        }
        for event in &events {
            self.listeners.emit(event);
        }
        result
    }
}

impl std::fmt::Debug for GamificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamificationEngine")
            .field("state", &self.state)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
