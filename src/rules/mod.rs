// src/rules/mod.rs - Persisted moderation rule set and the store that owns it

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

/// Mute duration applied to word violations when the admins never set one.
pub const DEFAULT_MUTE_MINUTES: u64 = 30;

/// Failures touching the persisted rule file. A parse failure at startup is
/// fatal; a save failure is reported to the admin who triggered the edit.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access rule file: {0}")]
    Io(#[from] std::io::Error),
    #[error("rule file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The complete moderation configuration, persisted as a single JSON
/// document. Entries are kept in insertion order for display; the mutators
/// on [`RuleStore`] enforce set semantics and normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub admins: Vec<i64>,
    pub forbidden_words: Vec<String>,
    pub mute_minutes: u64,
    pub allowed_links: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            forbidden_words: Vec::new(),
            mute_minutes: DEFAULT_MUTE_MINUTES,
            allowed_links: Vec::new(),
        }
    }
}

/// Trim + lowercase, applied to every word and link suffix before it is
/// stored or compared.
pub fn normalize(entry: &str) -> String {
    entry.trim().to_lowercase()
}

/// Owns the rule set and its backing file. Reads go through cheap snapshots;
/// mutations take the write lock and leave persistence to an explicit
/// [`RuleStore::save`] so a batch of edits can be flushed once.
pub struct RuleStore {
    path: PathBuf,
    owner_id: i64,
    rules: RwLock<RuleSet>,
}

impl RuleStore {
    /// Load the rule set from `path`. A missing file creates the defaults and
    /// persists them immediately; an existing file that fails to parse is a
    /// hard error so a corrupted config never silently resets.
    pub async fn load(path: impl Into<PathBuf>, owner_id: i64) -> Result<Self, StorageError> {
        let path = path.into();

        let rules = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let rules: RuleSet = serde_json::from_str(&content)?;
            info!(
                "Loaded rule set from {}: {} words, {} allowed links, {} admins",
                path.display(),
                rules.forbidden_words.len(),
                rules.allowed_links.len(),
                rules.admins.len()
            );
            rules
        } else {
            let rules = RuleSet::default();
            write_atomic(&path, &rules).await?;
            info!("Created default rule set at {}", path.display());
            rules
        };

        Ok(Self {
            path,
            owner_id,
            rules: RwLock::new(rules),
        })
    }

    /// Persist the current rule set, overwriting atomically.
    pub async fn save(&self) -> Result<(), StorageError> {
        let rules = self.rules.read().await;
        write_atomic(&self.path, &rules).await
    }

    /// Clone of the current rule set for a single evaluation or listing.
    pub async fn snapshot(&self) -> RuleSet {
        self.rules.read().await.clone()
    }

    /// True for the owner and for every stored admin.
    pub async fn is_privileged(&self, user_id: i64) -> bool {
        user_id == self.owner_id || self.rules.read().await.admins.contains(&user_id)
    }

    /// Add a forbidden word. Returns whether the set changed.
    pub async fn add_word(&self, word: &str) -> bool {
        let word = normalize(word);
        if word.is_empty() {
            return false;
        }
        let mut rules = self.rules.write().await;
        if rules.forbidden_words.contains(&word) {
            return false;
        }
        info!("Forbidden word added: '{}'", word);
        rules.forbidden_words.push(word);
        true
    }

    /// Remove a forbidden word. Removing an absent word is a no-op.
    pub async fn remove_word(&self, word: &str) -> bool {
        let word = normalize(word);
        let mut rules = self.rules.write().await;
        let before = rules.forbidden_words.len();
        rules.forbidden_words.retain(|w| *w != word);
        if rules.forbidden_words.len() != before {
            info!("Forbidden word removed: '{}'", word);
            true
        } else {
            false
        }
    }

    /// Whitelist a link suffix. Any domain containing it is exempt from the
    /// link ban.
    pub async fn add_allowed_link(&self, suffix: &str) -> bool {
        let suffix = normalize(suffix);
        if suffix.is_empty() {
            return false;
        }
        let mut rules = self.rules.write().await;
        if rules.allowed_links.contains(&suffix) {
            return false;
        }
        info!("Allowed link added: '{}'", suffix);
        rules.allowed_links.push(suffix);
        true
    }

    /// Remove a whitelisted link suffix.
    pub async fn remove_allowed_link(&self, suffix: &str) -> bool {
        let suffix = normalize(suffix);
        let mut rules = self.rules.write().await;
        let before = rules.allowed_links.len();
        rules.allowed_links.retain(|s| *s != suffix);
        if rules.allowed_links.len() != before {
            info!("Allowed link removed: '{}'", suffix);
            true
        } else {
            false
        }
    }

    /// Set the mute duration for word violations. Zero is rejected to keep
    /// the duration invariant intact.
    pub async fn set_mute_minutes(&self, minutes: u64) -> bool {
        if minutes == 0 {
            warn!("Ignoring attempt to set mute duration to 0 minutes");
            return false;
        }
        let mut rules = self.rules.write().await;
        if rules.mute_minutes == minutes {
            return false;
        }
        info!("Mute duration set to {} minutes", minutes);
        rules.mute_minutes = minutes;
        true
    }

    /// Grant admin rights. The owner is implicitly privileged and is never
    /// written into the admin list.
    pub async fn add_admin(&self, user_id: i64) -> bool {
        if user_id == self.owner_id {
            return false;
        }
        let mut rules = self.rules.write().await;
        if rules.admins.contains(&user_id) {
            return false;
        }
        info!("Admin added: {}", user_id);
        rules.admins.push(user_id);
        true
    }

    /// Revoke admin rights. Revoking a non-admin is a no-op.
    pub async fn remove_admin(&self, user_id: i64) -> bool {
        let mut rules = self.rules.write().await;
        let before = rules.admins.len();
        rules.admins.retain(|id| *id != user_id);
        if rules.admins.len() != before {
            info!("Admin removed: {}", user_id);
            true
        } else {
            false
        }
    }
}

/// Write to a sibling temp file, then rename over the target, so a crash
/// mid-write never leaves a truncated rule file behind.
async fn write_atomic(path: &Path, rules: &RuleSet) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(rules)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
