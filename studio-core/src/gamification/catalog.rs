//! Fixed tables: levels, achievements and the daily challenge pool.

use super::ActionKind;

/// A level threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDef {
    /// Display name.
    pub name: &'static str,
    /// Points needed to reach the level.
    pub points: u64,
}

/// Levels in ascending order. Level `n` (1-based) is `LEVELS[n - 1]`.
pub const LEVELS: [LevelDef; 8] = [
    LevelDef { name: "Newcomer", points: 0 },
    LevelDef { name: "Creator", points: 100 },
    LevelDef { name: "Designer", points: 250 },
    LevelDef { name: "Pro Designer", points: 500 },
    LevelDef { name: "Thumbnail Artist", points: 1000 },
    LevelDef { name: "Viral Virtuoso", points: 2000 },
    LevelDef { name: "Clickbait King", points: 5000 },
    LevelDef { name: "Thumbnail God", points: 10000 },
];

/// An achievement definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDef {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// How to unlock it.
    pub description: &'static str,
    /// Points awarded once on unlock.
    pub points: u64,
    /// Badge glyph.
    pub icon: &'static str,
}

/// First thumbnail created.
pub const FIRST_BLOOD: &str = "first_blood";
/// Thumbnail created in under two minutes.
pub const SPEED_DEMON: &str = "speed_demon";
/// Virality score of 99 or more.
pub const VIRAL_MASTER: &str = "viral_master";
/// Ten thumbnails created.
pub const TEN_THUMBNAILS: &str = "ten_thumbnails";
/// Prompt enhancement used.
pub const AI_COLLABORATOR: &str = "ai_collaborator";
/// Personal photo used.
pub const PERSONAL_TOUCH: &str = "personal_touch";
/// Five high-score analyses.
pub const PERFECTIONIST: &str = "perfectionist";

/// Every achievement.
pub const ACHIEVEMENTS: [AchievementDef; 7] = [
    AchievementDef {
        id: FIRST_BLOOD,
        name: "First Blood",
        description: "Create your first thumbnail",
        points: 50,
        icon: "🩸",
    },
    AchievementDef {
        id: SPEED_DEMON,
        name: "Speed Demon",
        description: "Create a thumbnail in under 2 minutes",
        points: 100,
        icon: "⚡",
    },
    AchievementDef {
        id: VIRAL_MASTER,
        name: "Viral Master",
        description: "Reach a virality score of 99",
        points: 500,
        icon: "🏆",
    },
    AchievementDef {
        id: TEN_THUMBNAILS,
        name: "Serial Creator",
        description: "Create 10 thumbnails",
        points: 150,
        icon: "🔟",
    },
    AchievementDef {
        id: AI_COLLABORATOR,
        name: "AI Collaborator",
        description: "Use prompt enhancement",
        points: 25,
        icon: "✨",
    },
    AchievementDef {
        id: PERSONAL_TOUCH,
        name: "Personal Touch",
        description: "Use a personal photo",
        points: 75,
        icon: "👤",
    },
    AchievementDef {
        id: PERFECTIONIST,
        name: "Perfectionist",
        description: "Create 5 thumbnails scoring 90+",
        points: 250,
        icon: "🎯",
    },
];

/// Look up an achievement by ID.
#[must_use]
pub fn achievement(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// A daily challenge template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeDef {
    /// Display name.
    pub name: &'static str,
    /// What to do.
    pub description: &'static str,
    /// Points awarded on completion.
    pub points: u64,
    /// Number of matching actions needed.
    pub goal: u32,
    /// Action that advances the challenge.
    pub action: ActionKind,
    /// Required style, when the challenge is style-specific.
    pub style: Option<&'static str>,
}

/// Number of challenges drawn each day.
pub const DAILY_CHALLENGE_COUNT: usize = 3;

/// The pool daily challenges are drawn from.
pub const CHALLENGE_POOL: [ChallengeDef; 6] = [
    ChallengeDef {
        name: "Neon Master",
        description: "Create a thumbnail in the neon style",
        points: 150,
        goal: 1,
        action: ActionKind::UsedStyle,
        style: Some("cyberpunk"),
    },
    ChallengeDef {
        name: "Speed Run",
        description: "Create 3 thumbnails",
        points: 200,
        goal: 3,
        action: ActionKind::ThumbnailCreated,
        style: None,
    },
    ChallengeDef {
        name: "Personalization",
        description: "Use a personal photo",
        points: 100,
        goal: 1,
        action: ActionKind::UsedPersonalPhoto,
        style: None,
    },
    ChallengeDef {
        name: "Cinematic Touch",
        description: "Create 2 thumbnails in the cinematic style",
        points: 150,
        goal: 2,
        action: ActionKind::UsedStyle,
        style: Some("cinematic"),
    },
    ChallengeDef {
        name: "AI Enhancer",
        description: "Enhance 3 prompts",
        points: 100,
        goal: 3,
        action: ActionKind::PromptExpanded,
        style: None,
    },
    ChallengeDef {
        name: "High Scorer",
        description: "Reach a virality score above 90",
        points: 250,
        goal: 1,
        action: ActionKind::AnalysisHighScore,
        style: None,
    },
];
