// File: peacepod-moderation/src/services/classifier.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ContentAnalysis, ContentFlag, FlagType, RiskLevel};

/// Word-boundary vocabulary patterns. Each matched token contributes
/// severity 1 under `offensive_language`; duplicate matches count
/// individually.
static OFFENSIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Profanity and swear words
        r"(?i)\b(damn|hell|crap|shit|fuck|bitch|ass|bastard|piss|bloody)\b",
        // Derogatory and discriminatory terms
        r"(?i)\b(hate|stupid|idiot|loser|ugly|fat|dumb|retard|gay|lesbian|negro|nigger)\b",
        // Violence and harm
        r"(?i)\b(kill|murder|suicide|hurt|harm|die|death|blood|violence|fight|beat|punch|hit)\b",
        // Bullying terms
        r"(?i)\b(bully|threat|scare|intimidate|harassment|abuse)\b",
        // Sexual content (age-appropriate filtering)
        r"(?i)\b(sex|porn|naked|nude|breast|penis|vagina|sexual)\b",
        // Drug references
        r"(?i)\b(drug|cocaine|weed|marijuana|alcohol|beer|drunk|high)\b",
        // Threats and dangerous behavior
        r"(?i)\b(bomb|gun|weapon|terrorist|attack|destroy|revenge)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static classifier pattern"))
    .collect()
});

/// Contextual harmful phrases. Weighted 3x per occurrence under
/// `harmful_content` to reflect materially higher risk than generic
/// profanity.
static HARMFUL_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)i want to (die|kill myself|hurt myself)",
        r"(?i)you should (die|kill yourself|hurt yourself)",
        r"(?i)nobody likes you",
        r"(?i)kill yourself",
        r"(?i)go die",
        r"(?i)i hate you",
        r"(?i)you're worthless",
        r"(?i)you're stupid",
        r"(?i)i'm going to hurt",
        r"(?i)meet me after school",
        r"(?i)bring a weapon",
        r"(?i)plan to attack",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static classifier pattern"))
    .collect()
});

const HARMFUL_SEVERITY: i32 = 3;
const CAPS_RATIO_THRESHOLD: f64 = 0.7;
const CAPS_MIN_LENGTH: usize = 10;
const SPAM_RUN_LENGTH: usize = 5;

/// Analyze submitted text for offensive material. Pure and total: empty
/// input yields the clean analysis, and no input ever raises an error.
pub fn analyze_content(content: &str) -> ContentAnalysis {
    if content.is_empty() {
        return ContentAnalysis::clean();
    }

    let mut flags: Vec<ContentFlag> = Vec::new();
    let mut severity: i32 = 0;

    for pattern in OFFENSIVE_PATTERNS.iter() {
        let matches: Vec<String> = pattern
            .find_iter(content)
            .map(|m| m.as_str().to_string())
            .collect();
        if !matches.is_empty() {
            severity += matches.len() as i32;
            flags.push(ContentFlag {
                flag_type: FlagType::OffensiveLanguage,
                matches,
                severity: 1,
            });
        }
    }

    for pattern in HARMFUL_PHRASES.iter() {
        let matches: Vec<String> = pattern
            .find_iter(content)
            .map(|m| m.as_str().to_string())
            .collect();
        if !matches.is_empty() {
            severity += matches.len() as i32 * HARMFUL_SEVERITY;
            flags.push(ContentFlag {
                flag_type: FlagType::HarmfulContent,
                matches,
                severity: HARMFUL_SEVERITY,
            });
        }
    }

    // Excessive caps reads as yelling, independent of vocabulary.
    let total_chars = content.chars().count();
    let caps_chars = content.chars().filter(|c| c.is_ascii_uppercase()).count();
    if total_chars > CAPS_MIN_LENGTH
        && caps_chars as f64 / total_chars as f64 > CAPS_RATIO_THRESHOLD
    {
        severity += 1;
        flags.push(ContentFlag {
            flag_type: FlagType::AggressiveTone,
            matches: vec!["EXCESSIVE CAPS".to_string()],
            severity: 1,
        });
    }

    let runs = repeated_runs(content);
    if !runs.is_empty() {
        severity += 1;
        flags.push(ContentFlag {
            flag_type: FlagType::SpamLike,
            matches: runs,
            severity: 1,
        });
    }

    ContentAnalysis {
        is_offensive: !flags.is_empty(),
        flags,
        severity,
        risk_level: RiskLevel::from_severity(severity),
    }
}

/// Runs of 5+ identical consecutive characters. The regex crate has no
/// backreferences, so scan directly.
fn repeated_runs(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let mut j = i + 1;
        while j < chars.len() && chars[j] == chars[i] {
            j += 1;
        }
        if j - i >= SPAM_RUN_LENGTH {
            runs.push(chars[i..j].iter().collect());
        }
        i = j;
    }
    runs
}
