use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    AuditAction, AuditRecord, CommandStore, CustomCommand, StoreError, normalize_trigger, validate,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    commands: BTreeMap<String, CustomCommand>,
    #[serde(default)]
    audit: Vec<AuditRecord>,
    #[serde(default)]
    next_audit_id: u64,
}

impl StoreState {
    fn record(&mut self, action: AuditAction, trigger: &str, response: &str, user_id: &str) {
        self.next_audit_id += 1;
        self.audit.push(AuditRecord {
            id: self.next_audit_id,
            action,
            trigger: trigger.to_owned(),
            response: response.to_owned(),
            user_id: user_id.to_owned(),
            timestamp: OffsetDateTime::now_utc(),
        });
    }
}

/// Custom command store kept in memory and, when opened with a path,
/// mirrored to a JSON file.
///
/// Writers are serialized by a single mutex. Each mutation is applied to a
/// copy of the state, written to disk, and only then made visible, so a
/// failed write leaves both memory and file untouched.
#[derive(Debug)]
pub struct JsonStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl JsonStore {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            StoreState::default()
        };
        info!(
            path = %path.display(),
            commands = state.commands.len(),
            "Command store opened"
        );
        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T, StoreError> {
        let guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    fn commit<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if let Some(path) = &self.path {
            persist(path, &next)?;
        }
        *guard = next;
        Ok(out)
    }
}

fn persist(path: &Path, state: &StoreState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    if let Err(e) = fs::rename(&tmp, path) {
        warn!(error = %e, path = %path.display(), "Failed to replace command store file");
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

impl CommandStore for JsonStore {
    fn lookup(&self, trigger: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_trigger(trigger);
        self.read(|state| state.commands.get(&key).map(|c| c.response.clone()))
    }

    fn list_all(&self) -> Result<Vec<CustomCommand>, StoreError> {
        self.read(|state| state.commands.values().cloned().collect())
    }

    fn upsert(
        &self,
        trigger: &str,
        response: &str,
        creator: &str,
    ) -> Result<AuditAction, StoreError> {
        let key = validate(trigger, response)?;
        let action = self.commit(|state| {
            let now = OffsetDateTime::now_utc();
            let action = if let Some(existing) = state.commands.get_mut(&key) {
                response.clone_into(&mut existing.response);
                existing.updated_at = now;
                AuditAction::Update
            } else {
                state.commands.insert(
                    key.clone(),
                    CustomCommand {
                        trigger: key.clone(),
                        response: response.to_owned(),
                        created_by: creator.to_owned(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                AuditAction::Create
            };
            state.record(action, &key, response, creator);
            Ok(action)
        })?;
        info!(trigger = %key, user = %creator, action = action.as_str(), "Custom command saved");
        Ok(action)
    }

    fn delete(&self, trigger: &str, actor: &str) -> Result<String, StoreError> {
        let key = normalize_trigger(trigger);
        let removed = self.commit(|state| {
            let removed = state
                .commands
                .remove(&key)
                .ok_or_else(|| StoreError::NotFound(key.clone()))?;
            state.record(AuditAction::Delete, &key, &removed.response, actor);
            Ok(removed.response)
        })?;
        info!(trigger = %key, user = %actor, "Custom command deleted");
        Ok(removed)
    }

    fn creator(&self, trigger: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_trigger(trigger);
        self.read(|state| state.commands.get(&key).map(|c| c.created_by.clone()))
    }

    fn audit_log(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        self.read(|state| state.audit.iter().rev().take(limit).cloned().collect())
    }
}
