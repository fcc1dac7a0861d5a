// File: peacepod-moderation/src/services/moderation_service.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::Error;
use crate::models::{
    ActiveBan, Ban, BanDisplayInfo, BanResult, BanStatus, ContentAnalysis, ContentType,
    ModerationOutcome, Violation, ViolationDetails,
};
use crate::repositories::postgres::{PostgresBanRepository, PostgresViolationRepository};
use crate::repositories::{BanRepository, ViolationRepository};
use crate::services::ban_policy;
use crate::services::classifier;

const BAN_REASON: &str = "Inappropriate content detected";
const MODERATION_ERROR_MESSAGE: &str =
    "Unable to process content at this time. Please try again.";
const NOT_AUTHENTICATED_MESSAGE: &str = "You must be logged in to submit content.";

/// Moderation engine: classifies submitted content, records violations, and
/// manages the per-user progressive-ban lifecycle. All stored state lives in
/// the ban/violation repositories; the service itself holds none.
pub struct ModerationService {
    ban_repo: Arc<dyn BanRepository>,
    violation_repo: Arc<dyn ViolationRepository>,
}

impl ModerationService {
    pub fn new(
        ban_repo: Arc<dyn BanRepository>,
        violation_repo: Arc<dyn ViolationRepository>,
    ) -> Self {
        Self {
            ban_repo,
            violation_repo,
        }
    }

    /// Convenience constructor wiring up the Postgres repositories.
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(
            Arc::new(PostgresBanRepository::new(pool.clone())),
            Arc::new(PostgresViolationRepository::new(pool)),
        )
    }

    /// Moderate content before submission. Never returns an error: any
    /// persistence failure collapses into a denial so that uncertainty
    /// blocks the submission instead of letting it through.
    pub async fn moderate_content(
        &self,
        content: &str,
        user_id: &str,
        content_type: ContentType,
    ) -> ModerationOutcome {
        if user_id.is_empty() {
            return ModerationOutcome::NotAuthenticated {
                message: NOT_AUTHENTICATED_MESSAGE.to_string(),
            };
        }

        match self.moderate_inner(content, user_id, content_type).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error in content moderation for user {}: {:?}", user_id, e);
                ModerationOutcome::ModerationError {
                    message: MODERATION_ERROR_MESSAGE.to_string(),
                }
            }
        }
    }

    async fn moderate_inner(
        &self,
        content: &str,
        user_id: &str,
        content_type: ContentType,
    ) -> Result<ModerationOutcome, Error> {
        // An active ban short-circuits before the classifier runs.
        let ban_status = self.check_ban_status(user_id).await?;
        if let Some(ban_info) = ban_status.ban_info {
            let message = format!(
                "You are currently banned until {}. Reason: {}",
                ban_info.expires_at.format("%Y-%m-%d %H:%M UTC"),
                ban_info.ban.ban_reason
            );
            return Ok(ModerationOutcome::UserBanned { ban_info, message });
        }

        let analysis = classifier::analyze_content(content);
        if !analysis.is_offensive {
            return Ok(ModerationOutcome::Allowed { analysis });
        }

        let ban_result = self
            .apply_ban(user_id, content, &analysis, content_type)
            .await?;
        let message = format!(
            "Your content contains inappropriate material and has been blocked. \
             You have been temporarily banned for {} minutes. This is violation #{}.",
            ban_result.ban_duration_minutes, ban_result.violation_count
        );
        Ok(ModerationOutcome::ContentViolation {
            analysis,
            ban_result,
            message,
        })
    }

    /// Reads the user's ban row. An expired row is removed on the spot, so a
    /// stale ban never reports as active past its expiry instant.
    pub async fn check_ban_status(&self, user_id: &str) -> Result<BanStatus, Error> {
        let ban = match self.ban_repo.get(user_id).await? {
            Some(b) => b,
            None => return Ok(BanStatus::not_banned()),
        };

        let now = Utc::now();
        if !ban.is_live_at(now) {
            self.ban_repo.delete(user_id).await?;
            info!("Removed expired ban for user {}", user_id);
            return Ok(BanStatus::not_banned());
        }

        let expires_at = ban.ban_expires_at;
        Ok(BanStatus {
            is_banned: true,
            ban_info: Some(ActiveBan {
                time_remaining: expires_at - now,
                expires_at,
                ban,
            }),
        })
    }

    /// Full violation history for a user, in insertion order.
    pub async fn get_violations(&self, user_id: &str) -> Result<Vec<Violation>, Error> {
        self.violation_repo.list_for_user(user_id).await
    }

    /// Records a violation and writes the ban derived from it. The ban row is
    /// computed entirely from the freshly stored violation, so the two can
    /// only diverge if the second write fails, which surfaces as an error.
    pub async fn apply_ban(
        &self,
        user_id: &str,
        content: &str,
        analysis: &ContentAnalysis,
        content_type: ContentType,
    ) -> Result<BanResult, Error> {
        let prior_count = self.violation_repo.count_for_user(user_id).await?;
        let duration_minutes = ban_duration_for_prior(prior_count);

        let violation = Violation {
            violation_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            flags: analysis.flags.clone(),
            severity: analysis.severity,
            risk_level: analysis.risk_level,
            content_type,
            created_at: Utc::now(),
            violation_number: (prior_count + 1) as i32,
        };
        let stored = self.violation_repo.insert(&violation).await?;

        let ban = Ban {
            user_id: user_id.to_string(),
            ban_reason: BAN_REASON.to_string(),
            violation_details: ViolationDetails {
                content: content.to_string(),
                flags: analysis.flags.clone(),
                severity: analysis.severity,
                risk_level: analysis.risk_level,
                content_type,
            },
            ban_duration_minutes: duration_minutes,
            ban_created_at: stored.created_at,
            ban_expires_at: stored.created_at + Duration::minutes(duration_minutes),
            violation_count: stored.violation_number,
            is_active: true,
        };
        self.ban_repo.upsert(&ban).await?;

        info!(
            "Banned user {} for {} minutes (violation #{}, risk {})",
            user_id, duration_minutes, ban.violation_count, analysis.risk_level
        );

        Ok(BanResult {
            ban_duration_minutes: duration_minutes,
            expires_at: ban.ban_expires_at,
            violation_count: ban.violation_count,
            ban,
        })
    }

    /// Human-readable ban projection for the banner UI. `None` when the user
    /// is not banned.
    pub async fn get_ban_display_info(
        &self,
        user_id: &str,
    ) -> Result<Option<BanDisplayInfo>, Error> {
        let status = self.check_ban_status(user_id).await?;
        let info = match status.ban_info {
            Some(i) => i,
            None => return Ok(None),
        };

        Ok(Some(BanDisplayInfo {
            is_banned: true,
            reason: info.ban.ban_reason.clone(),
            expires_at: info.expires_at,
            time_remaining_text: format_time_remaining(info.time_remaining),
            violation_count: info.ban.violation_count,
        }))
    }

    /// Bans whose term has not yet elapsed, for the operator dashboard.
    pub async fn list_active_bans(&self) -> Result<Vec<Ban>, Error> {
        let now = Utc::now();
        let bans = self.ban_repo.list_all().await?;
        Ok(bans.into_iter().filter(|b| b.is_live_at(now)).collect())
    }

    /// Administrative sweep: deletes every expired ban row and returns how
    /// many were removed. Idempotent, and safe to interleave with per-user
    /// status checks since both sides delete-if-expired.
    pub async fn cleanup_expired_bans(&self) -> Result<u64, Error> {
        let bans = self.ban_repo.list_all().await?;
        let now = Utc::now();
        let mut removed: u64 = 0;

        for ban in bans {
            if ban.is_live_at(now) {
                continue;
            }
            match self.ban_repo.delete(&ban.user_id).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(
                        "Failed to remove expired ban for user {}: {:?}",
                        ban.user_id, e
                    );
                }
            }
        }

        Ok(removed)
    }
}

fn ban_duration_for_prior(prior_count: i64) -> i64 {
    let prior = u32::try_from(prior_count).unwrap_or(u32::MAX);
    ban_policy::ban_duration_minutes(prior)
}

/// Formats a remaining ban term as "Hh Mm", or just "Mm" under an hour.
pub fn format_time_remaining(remaining: Duration) -> String {
    let total_minutes = remaining.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
