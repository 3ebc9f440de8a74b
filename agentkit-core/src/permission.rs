//! In-memory policy store mapping `(tool, action, canonical-parameter-hash)`
//! to a decision (spec §4.2). Guarded by a single read-write lock — rule
//! counts are small (dozens, not thousands), so per-key locking would be
//! over-engineering (spec §9).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::PermissionError;
use crate::fs::FileSystem;
use crate::value::{Value, hash_params};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AllowOnce,
    AlwaysAllow,
    Deny,
    AlwaysDeny,
}

impl Decision {
    /// AllowOnce and (one-shot) Deny are consumed on first read; the
    /// `Always*` variants persist until explicitly overwritten.
    fn is_one_shot(self) -> bool {
        matches!(self, Decision::AllowOnce | Decision::Deny)
    }

    fn allows(self) -> bool {
        matches!(self, Decision::AllowOnce | Decision::AlwaysAllow)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRule {
    pub tool: String,
    pub action: String,
    pub params_hash: String,
    pub decision: Decision,
    /// Original parameters, kept only for display purposes.
    pub parameters: Value,
}

fn rule_key(tool: &str, action: &str, params_hash: &str) -> String {
    format!("{tool}:{action}:{params_hash}")
}

/// Persistable, concurrency-safe rule store.
pub struct PermissionEngine {
    rules: RwLock<HashMap<String, PermissionRule>>,
    fs: Arc<dyn FileSystem>,
}

impl PermissionEngine {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            fs,
        }
    }

    /// `None` rule -> `(false, None)`. AllowOnce and one-shot Deny are
    /// consumed (removed) on read; `Always*` decisions persist.
    pub fn check_permission(&self, tool: &str, action: &str, params: &Value) -> bool {
        let hash = hash_params(params);
        let key = rule_key(tool, action, &hash);

        let one_shot_decision = {
            let rules = self.rules.read();
            match rules.get(&key) {
                None => return false,
                Some(rule) if rule.decision.is_one_shot() => Some(rule.decision),
                Some(rule) => return rule.decision.allows(),
            }
        };

        if let Some(decision) = one_shot_decision {
            let mut rules = self.rules.write();
            // Re-check under the write lock: another writer may have
            // already consumed or overwritten this rule.
            if let Some(rule) = rules.get(&key) {
                if rule.decision == decision {
                    rules.remove(&key);
                }
            }
            decision.allows()
        } else {
            false
        }
    }

    /// Upsert a rule. Grant/Deny are distinguished by convention only; any
    /// of the four decisions may be passed to either method (spec §4.2).
    pub fn grant_permission(&self, tool: &str, action: &str, params: &Value, decision: Decision) {
        self.upsert(tool, action, params, decision);
    }

    pub fn deny_permission(&self, tool: &str, action: &str, params: &Value, decision: Decision) {
        self.upsert(tool, action, params, decision);
    }

    fn upsert(&self, tool: &str, action: &str, params: &Value, decision: Decision) {
        let hash = hash_params(params);
        let key = rule_key(tool, action, &hash);
        let rule = PermissionRule {
            tool: tool.to_string(),
            action: action.to_string(),
            params_hash: hash,
            decision,
            parameters: params.clone(),
        };
        self.rules.write().insert(key, rule);
    }

    pub async fn load_from_file(&self, path: &Path) -> Result<(), PermissionError> {
        let bytes = match self.fs.read_file(path).await {
            Ok(bytes) => bytes,
            Err(err) if self.fs.is_not_found(&err) => {
                // Missing file on load is success with an empty set.
                self.rules.write().clear();
                return Ok(());
            }
            Err(source) => {
                return Err(PermissionError::Load {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        let loaded: HashMap<String, PermissionRule> = serde_json::from_slice(&bytes)?;
        *self.rules.write() = loaded;
        Ok(())
    }

    pub async fn save_to_file(&self, path: &Path) -> Result<(), PermissionError> {
        let snapshot = self.rules.read().clone();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        if let Some(parent) = path.parent() {
            self.fs
                .mkdir_all(parent)
                .await
                .map_err(|source| PermissionError::Save {
                    path: path.display().to_string(),
                    source,
                })?;
        }
        self.fs
            .write_file(path, &bytes)
            .await
            .map_err(|source| PermissionError::Save {
                path: path.display().to_string(),
                source,
            })
    }

    #[cfg(test)]
    pub(crate) fn rule_count(&self) -> usize {
        self.rules.read().len()
    }
}
