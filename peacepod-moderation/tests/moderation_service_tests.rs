// tests/moderation_service_tests.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use peacepod_moderation::Error;
use peacepod_moderation::models::{
    Ban, BanStatus, ContentFlag, ContentType, FlagType, ModerationOutcome, RiskLevel, Violation,
    ViolationDetails,
};
use peacepod_moderation::repositories::{BanRepository, ViolationRepository};
use peacepod_moderation::services::ModerationService;

/// In-memory ban store keyed by user_id, standing in for the Postgres
/// repository. `fail` makes every call error to exercise the fail-closed
/// path.
#[derive(Default)]
struct MockBanRepo {
    bans: Mutex<HashMap<String, Ban>>,
    fail: bool,
}

#[async_trait]
impl BanRepository for MockBanRepo {
    async fn get(&self, user_id: &str) -> Result<Option<Ban>, Error> {
        if self.fail {
            return Err(Error::Parse("store unavailable".into()));
        }
        Ok(self.bans.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert(&self, ban: &Ban) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Parse("store unavailable".into()));
        }
        self.bans
            .lock()
            .unwrap()
            .insert(ban.user_id.clone(), ban.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Parse("store unavailable".into()));
        }
        self.bans.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Ban>, Error> {
        if self.fail {
            return Err(Error::Parse("store unavailable".into()));
        }
        Ok(self.bans.lock().unwrap().values().cloned().collect())
    }
}

/// Append-only in-memory violation log.
#[derive(Default)]
struct MockViolationRepo {
    rows: Mutex<Vec<Violation>>,
}

#[async_trait]
impl ViolationRepository for MockViolationRepo {
    async fn insert(&self, violation: &Violation) -> Result<Violation, Error> {
        let mut stored = violation.clone();
        stored.created_at = Utc::now();
        self.rows.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Violation>, Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<i64, Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.user_id == user_id)
            .count() as i64)
    }
}

fn build_service() -> (Arc<MockBanRepo>, Arc<MockViolationRepo>, ModerationService) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let ban_repo = Arc::new(MockBanRepo::default());
    let violation_repo = Arc::new(MockViolationRepo::default());
    let service = ModerationService::new(ban_repo.clone(), violation_repo.clone());
    (ban_repo, violation_repo, service)
}

fn sample_ban(user_id: &str, expires_in_minutes: i64, violation_count: i32) -> Ban {
    let now = Utc::now();
    Ban {
        user_id: user_id.to_string(),
        ban_reason: "Inappropriate content detected".to_string(),
        violation_details: ViolationDetails {
            content: "you're an idiot".to_string(),
            flags: vec![ContentFlag {
                flag_type: FlagType::OffensiveLanguage,
                matches: vec!["idiot".to_string()],
                severity: 1,
            }],
            severity: 1,
            risk_level: RiskLevel::Low,
            content_type: ContentType::Report,
        },
        ban_duration_minutes: 20,
        ban_created_at: now - Duration::minutes(20),
        ban_expires_at: now + Duration::minutes(expires_in_minutes),
        violation_count,
        is_active: true,
    }
}

fn sample_violation(user_id: &str, number: i32) -> Violation {
    Violation {
        violation_id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        content: "you're an idiot".to_string(),
        flags: vec![],
        severity: 1,
        risk_level: RiskLevel::Low,
        content_type: ContentType::Report,
        created_at: Utc::now() - Duration::hours(1),
        violation_number: number,
    }
}

#[tokio::test]
async fn clean_content_from_unbanned_user_is_allowed() {
    let (_, violation_repo, service) = build_service();

    let outcome = service
        .moderate_content("My locker is jammed again", "user-1", ContentType::Report)
        .await;

    assert!(outcome.is_allowed());
    assert_eq!(outcome.reason(), None);
    assert_eq!(outcome.user_message(), "Content approved");
    assert!(violation_repo.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn first_violation_records_and_bans_for_twenty_minutes() {
    let (ban_repo, violation_repo, service) = build_service();

    let outcome = service
        .moderate_content("you're an idiot", "user-1", ContentType::Report)
        .await;

    let (analysis, ban_result) = match outcome {
        ModerationOutcome::ContentViolation {
            analysis,
            ban_result,
            ..
        } => (analysis, ban_result),
        other => panic!("expected ContentViolation, got {:?}", other.reason()),
    };

    assert!(analysis.is_offensive);
    assert_eq!(ban_result.ban_duration_minutes, 20);
    assert_eq!(ban_result.violation_count, 1);

    let rows = violation_repo.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].violation_number, 1);
    assert_eq!(rows[0].content, "you're an idiot");

    let bans = ban_repo.bans.lock().unwrap();
    let ban = bans.get("user-1").expect("ban row stored");
    assert_eq!(ban.ban_duration_minutes, 20);
    assert_eq!(ban.violation_count, 1);
    assert!(ban.ban_expires_at > Utc::now());
}

#[tokio::test]
async fn banned_user_is_denied_before_classification() {
    let (ban_repo, violation_repo, service) = build_service();
    ban_repo
        .bans
        .lock()
        .unwrap()
        .insert("user-1".to_string(), sample_ban("user-1", 15, 1));

    // Clean text: only the pre-existing ban can cause a denial here.
    let outcome = service
        .moderate_content("Thanks for the help yesterday", "user-1", ContentType::Solution)
        .await;

    assert_eq!(outcome.reason(), Some("user_banned"));
    assert!(outcome.user_message().starts_with("You are currently banned until"));
    // No new violation was recorded.
    assert!(violation_repo.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn escalation_reaches_ceiling_on_sixth_violation() {
    let (_, violation_repo, service) = build_service();
    {
        let mut rows = violation_repo.rows.lock().unwrap();
        for n in 1..=5 {
            rows.push(sample_violation("user-1", n));
        }
    }

    let outcome = service
        .moderate_content("you're an idiot", "user-1", ContentType::Report)
        .await;

    match outcome {
        ModerationOutcome::ContentViolation { ban_result, .. } => {
            assert_eq!(ban_result.ban_duration_minutes, 2880);
            assert_eq!(ban_result.violation_count, 6);
        }
        other => panic!("expected ContentViolation, got {:?}", other.reason()),
    }
}

#[tokio::test]
async fn expired_ban_is_removed_lazily_on_status_check() {
    let (ban_repo, _, service) = build_service();
    ban_repo
        .bans
        .lock()
        .unwrap()
        .insert("user-1".to_string(), sample_ban("user-1", -5, 2));

    let status: BanStatus = service.check_ban_status("user-1").await.unwrap();
    assert!(!status.is_banned);
    assert!(status.ban_info.is_none());
    assert!(ban_repo.bans.lock().unwrap().is_empty());

    // With the stale row gone, a clean submission goes through.
    let outcome = service
        .moderate_content("Back with a better attitude", "user-1", ContentType::Report)
        .await;
    assert!(outcome.is_allowed());
}

#[tokio::test]
async fn cleanup_sweep_is_idempotent() {
    let (ban_repo, _, service) = build_service();
    {
        let mut bans = ban_repo.bans.lock().unwrap();
        bans.insert("expired-1".to_string(), sample_ban("expired-1", -10, 1));
        bans.insert("expired-2".to_string(), sample_ban("expired-2", -60, 3));
        bans.insert("active-1".to_string(), sample_ban("active-1", 30, 1));
    }

    let removed = service.cleanup_expired_bans().await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(service.cleanup_expired_bans().await.unwrap(), 0);

    let bans = ban_repo.bans.lock().unwrap();
    assert_eq!(bans.len(), 1);
    assert!(bans.contains_key("active-1"));
}

#[tokio::test]
async fn store_failure_denies_instead_of_allowing() {
    let ban_repo = Arc::new(MockBanRepo {
        bans: Mutex::new(HashMap::new()),
        fail: true,
    });
    let violation_repo = Arc::new(MockViolationRepo::default());
    let service = ModerationService::new(ban_repo, violation_repo);

    // Clean content, but the store is down: fail closed.
    let outcome = service
        .moderate_content("A perfectly fine sentence", "user-1", ContentType::Report)
        .await;

    assert!(!outcome.is_allowed());
    assert_eq!(outcome.reason(), Some("moderation_error"));
}

#[tokio::test]
async fn missing_user_identity_is_rejected() {
    let (_, _, service) = build_service();

    let outcome = service
        .moderate_content("anything", "", ContentType::Report)
        .await;

    assert_eq!(outcome.reason(), Some("not_authenticated"));
}

#[tokio::test]
async fn ban_display_info_formats_remaining_time() {
    let (ban_repo, _, service) = build_service();
    ban_repo
        .bans
        .lock()
        .unwrap()
        .insert("user-1".to_string(), sample_ban("user-1", 90, 2));

    let info = service
        .get_ban_display_info("user-1")
        .await
        .unwrap()
        .expect("user is banned");

    assert!(info.is_banned);
    assert_eq!(info.reason, "Inappropriate content detected");
    assert_eq!(info.violation_count, 2);
    assert!(info.time_remaining_text.starts_with("1h"));
}

#[tokio::test]
async fn display_info_is_none_for_unbanned_user() {
    let (_, _, service) = build_service();
    assert!(service.get_ban_display_info("user-1").await.unwrap().is_none());
}

#[tokio::test]
async fn violation_history_is_returned_in_order() {
    let (_, violation_repo, service) = build_service();
    {
        let mut rows = violation_repo.rows.lock().unwrap();
        rows.push(sample_violation("user-1", 1));
        rows.push(sample_violation("user-1", 2));
        rows.push(sample_violation("someone-else", 1));
    }

    let history = service.get_violations("user-1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].violation_number, 1);
    assert_eq!(history[1].violation_number, 2);
}

#[tokio::test]
async fn active_ban_listing_skips_expired_rows() {
    let (ban_repo, _, service) = build_service();
    {
        let mut bans = ban_repo.bans.lock().unwrap();
        bans.insert("expired-1".to_string(), sample_ban("expired-1", -10, 1));
        bans.insert("active-1".to_string(), sample_ban("active-1", 30, 1));
    }

    let active = service.list_active_bans().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].user_id, "active-1");
}
