// File: peacepod-moderation/src/models/moderation.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category a content flag belongs to. Stored as snake_case TEXT inside the
/// JSONB flag payloads.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    OffensiveLanguage,
    HarmfulContent,
    AggressiveTone,
    SpamLike,
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagType::OffensiveLanguage => write!(f, "offensive_language"),
            FlagType::HarmfulContent => write!(f, "harmful_content"),
            FlagType::AggressiveTone => write!(f, "aggressive_tone"),
            FlagType::SpamLike => write!(f, "spam_like"),
        }
    }
}

/// Coarse risk classification derived from the severity score.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Total mapping from a severity score to a risk level.
    pub fn from_severity(severity: i32) -> Self {
        if severity >= 5 {
            RiskLevel::High
        } else if severity >= 3 {
            RiskLevel::Medium
        } else if severity >= 1 {
            RiskLevel::Low
        } else {
            RiskLevel::None
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::None => write!(f, "none"),
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(RiskLevel::None),
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Which submission surface the content came from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Report,
    Solution,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Report => write!(f, "report"),
            ContentType::Solution => write!(f, "solution"),
        }
    }
}

impl FromStr for ContentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(ContentType::Report),
            "solution" => Ok(ContentType::Solution),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

/// One classifier hit: the category, the matched tokens, and the severity
/// contributed per match.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentFlag {
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub matches: Vec<String>,
    pub severity: i32,
}

/// Classifier output. Derived from the submitted text alone, never persisted
/// on its own (a copy is embedded into Violation and Ban rows).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentAnalysis {
    pub is_offensive: bool,
    pub flags: Vec<ContentFlag>,
    pub severity: i32,
    pub risk_level: RiskLevel,
}

impl ContentAnalysis {
    /// Analysis for text with nothing to flag.
    pub fn clean() -> Self {
        Self {
            is_offensive: false,
            flags: Vec::new(),
            severity: 0,
            risk_level: RiskLevel::None,
        }
    }
}

/// Snapshot of the triggering submission, embedded into the Ban row as JSONB.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ViolationDetails {
    pub content: String,
    pub flags: Vec<ContentFlag>,
    pub severity: i32,
    pub risk_level: RiskLevel,
    pub content_type: ContentType,
}

/// Append-only audit row, one per detected offense. Never mutated or deleted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Violation {
    pub violation_id: Uuid,
    pub user_id: String,
    pub content: String,
    pub flags: Vec<ContentFlag>,
    pub severity: i32,
    pub risk_level: RiskLevel,
    pub content_type: ContentType,
    pub created_at: DateTime<Utc>,
    /// 1-based sequential index among the user's violations.
    pub violation_number: i32,
}

/// Current-state ban row, at most one per user_id. The row is derived from
/// the violation log: `ban_expires_at` is computed from the triggering
/// violation's timestamp plus the policy duration. `is_active` is advisory;
/// whether a ban is live is always the predicate `now < ban_expires_at`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Ban {
    pub user_id: String,
    pub ban_reason: String,
    pub violation_details: ViolationDetails,
    pub ban_duration_minutes: i64,
    pub ban_created_at: DateTime<Utc>,
    pub ban_expires_at: DateTime<Utc>,
    pub violation_count: i32,
    pub is_active: bool,
}

impl Ban {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.ban_expires_at
    }
}

/// A ban confirmed live at read time, with the remaining term computed.
#[derive(Debug, Clone)]
pub struct ActiveBan {
    pub ban: Ban,
    pub time_remaining: Duration,
    pub expires_at: DateTime<Utc>,
}

/// Result of a ban-status read.
#[derive(Debug, Clone)]
pub struct BanStatus {
    pub is_banned: bool,
    pub ban_info: Option<ActiveBan>,
}

impl BanStatus {
    pub fn not_banned() -> Self {
        Self {
            is_banned: false,
            ban_info: None,
        }
    }
}

/// Outcome of applying a new ban after a violation.
#[derive(Debug, Clone)]
pub struct BanResult {
    pub ban_duration_minutes: i64,
    pub expires_at: DateTime<Utc>,
    pub violation_count: i32,
    pub ban: Ban,
}

/// Final verdict handed back to the submission pages.
#[derive(Debug, Clone)]
pub enum ModerationOutcome {
    /// Content passed the classifier and the user had no active ban.
    Allowed { analysis: ContentAnalysis },
    /// Short-circuited before classification: the user already has a live ban.
    UserBanned {
        ban_info: ActiveBan,
        message: String,
    },
    /// Content failed the classifier; a new or escalated ban was applied.
    ContentViolation {
        analysis: ContentAnalysis,
        ban_result: BanResult,
        message: String,
    },
    /// Caller supplied no user identity.
    NotAuthenticated { message: String },
    /// The store was unreachable or a write failed. Fails closed.
    ModerationError { message: String },
}

impl ModerationOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ModerationOutcome::Allowed { .. })
    }

    /// Stable machine-readable denial reason, `None` when allowed.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ModerationOutcome::Allowed { .. } => None,
            ModerationOutcome::UserBanned { .. } => Some("user_banned"),
            ModerationOutcome::ContentViolation { .. } => Some("content_violation"),
            ModerationOutcome::NotAuthenticated { .. } => Some("not_authenticated"),
            ModerationOutcome::ModerationError { .. } => Some("moderation_error"),
        }
    }

    /// Text shown to the submitting user.
    pub fn user_message(&self) -> &str {
        match self {
            ModerationOutcome::Allowed { .. } => "Content approved",
            ModerationOutcome::UserBanned { message, .. } => message,
            ModerationOutcome::ContentViolation { message, .. } => message,
            ModerationOutcome::NotAuthenticated { message } => message,
            ModerationOutcome::ModerationError { message } => message,
        }
    }
}

/// Human-readable projection of an active ban for the banner UI.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BanDisplayInfo {
    pub is_banned: bool,
    pub reason: String,
    pub expires_at: DateTime<Utc>,
    pub time_remaining_text: String,
    pub violation_count: i32,
}
