//! Contracts folder watcher with debouncing and change coalescing.
//!
//! Raw notify events are classified into account and contract changes.
//! Account changes are forwarded immediately; contract changes are held per
//! path until the debounce period has passed without further activity, and
//! consecutive changes to the same file are merged.

use crate::events::{AccountChange, ChangeStreams, ContractChange, ContractStatus, WatchHandle};
use crate::layout::{ProjectFiles, relative_location};
use devsync_core::config::WatcherConfig;
use devsync_core::error::{Result, SyncError};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// A classified filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawChange {
    Account(AccountChange),
    Contract(ContractChange),
}

/// Maps absolute paths under the contracts folder to project changes.
#[derive(Debug, Clone)]
pub(crate) struct Classifier {
    root: PathBuf,
    contracts: PathBuf,
    extension: String,
}

impl Classifier {
    pub(crate) fn new(root: &Path, contracts: &Path, extension: &str) -> Self {
        // notify reports canonical paths, e.g. /private/var instead of /var on macOS
        Self {
            root: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
            contracts: contracts
                .canonicalize()
                .unwrap_or_else(|_| contracts.to_path_buf()),
            extension: extension.to_string(),
        }
    }

    fn is_contract(&self, path: &Path) -> bool {
        path.starts_with(&self.contracts) && ProjectFiles::is_contract_file(path, &self.extension)
    }

    fn account_folder(&self, path: &Path) -> Option<String> {
        if path.parent() != Some(self.contracts.as_path()) {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        (!name.starts_with('.')).then_some(name)
    }

    /// Account owning a contract file: its first-level folder, or "" when the
    /// file sits directly in the contracts folder.
    fn account_of(&self, path: &Path) -> String {
        let Ok(relative) = path.strip_prefix(&self.contracts) else {
            return String::new();
        };
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(first), Some(_)) => first.as_os_str().to_string_lossy().into_owned(),
            _ => String::new(),
        }
    }

    fn contract(&self, path: &Path, status: ContractStatus) -> Option<RawChange> {
        if !self.is_contract(path) {
            return None;
        }
        let location = relative_location(&self.root, path)?;
        Some(RawChange::Contract(ContractChange::new(
            location,
            self.account_of(path),
            status,
        )))
    }

    fn created(&self, path: &Path, is_folder: bool) -> Option<RawChange> {
        if is_folder || path.is_dir() {
            return self
                .account_folder(path)
                .map(|name| RawChange::Account(AccountChange::created(name)));
        }
        self.contract(path, ContractStatus::Created)
    }

    fn removed(&self, path: &Path, kind: Option<RemoveKind>) -> Option<RawChange> {
        if let Some(change) = self.contract(path, ContractStatus::Removed) {
            return Some(change);
        }

        // A removed path cannot be inspected, so folders are recognized by
        // the reported kind or by lacking an extension.
        let maybe_folder = match kind {
            Some(RemoveKind::Folder) => true,
            Some(RemoveKind::File) => false,
            _ => path.extension().is_none(),
        };
        if !maybe_folder {
            return None;
        }
        self.account_folder(path)
            .map(|name| RawChange::Account(AccountChange::removed(name)))
    }

    fn renamed(&self, from: &Path, to: &Path) -> Vec<RawChange> {
        if self.is_contract(from) && self.is_contract(to) {
            let (Some(old_path), Some(_)) = (
                relative_location(&self.root, from),
                relative_location(&self.root, to),
            ) else {
                return Vec::new();
            };
            return self
                .contract(to, ContractStatus::Renamed { old_path })
                .into_iter()
                .collect();
        }

        self.removed(from, None)
            .into_iter()
            .chain(self.created(to, false))
            .collect()
    }

    /// Classify a notify event.
    pub(crate) fn classify(&self, event: &Event) -> Vec<RawChange> {
        let paths = &event.paths;
        if paths.is_empty() {
            return Vec::new();
        }

        match event.kind {
            EventKind::Create(kind) => paths
                .iter()
                .filter_map(|p| self.created(p, kind == CreateKind::Folder))
                .collect(),
            EventKind::Remove(kind) => paths
                .iter()
                .filter_map(|p| self.removed(p, Some(kind)))
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => {
                self.renamed(&paths[0], &paths[1])
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => paths
                .iter()
                .filter_map(|p| self.removed(p, None))
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => paths
                .iter()
                .filter_map(|p| self.created(p, false))
                .collect(),
            EventKind::Modify(ModifyKind::Name(_)) => paths
                .iter()
                .filter_map(|p| {
                    if p.exists() {
                        self.created(p, false)
                    } else {
                        self.removed(p, None)
                    }
                })
                .collect(),
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(_) => paths
                .iter()
                .filter_map(|p| self.contract(p, ContractStatus::Changed))
                .collect(),
            EventKind::Any if paths.len() >= 2 => self.renamed(&paths[0], &paths[1]),
            _ => Vec::new(),
        }
    }
}

/// Result of folding a new change into a pending one for the same path.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Merge {
    /// Keep a single pending change
    Replace(ContractChange),
    /// The changes cancel out
    Drop,
    /// The pending change must be delivered before the new one
    Split,
}

/// Merge two changes for the same path.
pub(crate) fn merge_changes(old: &ContractChange, new: &ContractChange) -> Merge {
    use ContractStatus::*;

    let status = match (&old.status, &new.status) {
        // Multiple modifications = one modification
        (Changed, Changed) => Changed,
        // Created then modified = created
        (Created, Changed) => Created,
        // Created then removed before anyone saw it = nothing
        (Created, Removed) => return Merge::Drop,
        // Modified then removed = removed
        (Changed, Removed) => Removed,
        // Removed then created = modified
        (Removed, Created) => Changed,
        // A rename only moves the location; later edits are reported separately
        (Renamed { .. }, _) => return Merge::Split,
        _ => new.status.clone(),
    };

    Merge::Replace(ContractChange {
        status,
        ..new.clone()
    })
}

#[derive(Debug)]
struct PendingChange {
    change: ContractChange,
    sequence: u64,
    last_updated: Instant,
}

/// Holds contract changes until they have been quiet for the debounce period.
#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    pending: HashMap<String, PendingChange>,
    next_sequence: u64,
}

impl Debouncer {
    /// Queue a change. Returns a change that must be delivered right away.
    pub(crate) fn push(&mut self, change: ContractChange, now: Instant) -> Option<ContractChange> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let Some(existing) = self.pending.get_mut(&change.path) else {
            debug!("Queued change for: {}", change.path);
            self.pending.insert(
                change.path.clone(),
                PendingChange {
                    change,
                    sequence,
                    last_updated: now,
                },
            );
            return None;
        };

        match merge_changes(&existing.change, &change) {
            Merge::Replace(merged) => {
                debug!("Coalesced change for: {}", merged.path);
                existing.change = merged;
                existing.last_updated = now;
                None
            }
            Merge::Drop => {
                debug!("Dropped short-lived file: {}", change.path);
                self.pending.remove(&change.path);
                None
            }
            Merge::Split => {
                let flushed = std::mem::replace(
                    existing,
                    PendingChange {
                        change,
                        sequence,
                        last_updated: now,
                    },
                );
                Some(flushed.change)
            }
        }
    }

    /// Remove and return changes quiet for at least `debounce`, oldest first.
    pub(crate) fn ready(&mut self, now: Instant, debounce: Duration) -> Vec<ContractChange> {
        let mut ready: Vec<PendingChange> = Vec::new();
        self.pending.retain(|_, pending| {
            if now.duration_since(pending.last_updated) >= debounce {
                ready.push(PendingChange {
                    change: pending.change.clone(),
                    sequence: pending.sequence,
                    last_updated: pending.last_updated,
                });
                false
            } else {
                true
            }
        });
        ready.sort_by_key(|p| p.sequence);
        ready.into_iter().map(|p| p.change).collect()
    }

    /// Remove and return every pending change, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<ContractChange> {
        let mut all: Vec<PendingChange> = self.pending.drain().map(|(_, p)| p).collect();
        all.sort_by_key(|p| p.sequence);
        all.into_iter().map(|p| p.change).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Notify-backed watcher over the contracts folder.
pub(crate) struct ProjectWatcher;

impl ProjectWatcher {
    pub(crate) fn start(
        root: &Path,
        contracts: &Path,
        extension: &str,
        config: WatcherConfig,
    ) -> Result<ChangeStreams> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (accounts_tx, accounts_rx) = mpsc::unbounded_channel();
        let (contracts_tx, contracts_rx) = mpsc::unbounded_channel();

        let classifier = Classifier::new(root, contracts, extension);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in classifier.classify(&event) {
                    let _ = raw_tx.send(change);
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        })
        .map_err(|e| SyncError::watch(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(contracts, RecursiveMode::Recursive)
            .map_err(|e| SyncError::watch(format!("Failed to watch path: {}", e)))?;

        info!(
            "Watching {} (debounce: {}ms)",
            contracts.display(),
            config.debounce_ms
        );

        let task = tokio::spawn(Self::coalesce(raw_rx, accounts_tx, contracts_tx, config));

        Ok(ChangeStreams::from_channels(accounts_rx, contracts_rx)
            .with_handle(WatchHandle::new((watcher, task))))
    }

    /// Forward account changes and debounce contract changes until the raw
    /// feed closes, then flush what is left.
    pub(crate) async fn coalesce(
        mut raw_rx: mpsc::UnboundedReceiver<RawChange>,
        accounts_tx: mpsc::UnboundedSender<AccountChange>,
        contracts_tx: mpsc::UnboundedSender<ContractChange>,
        config: WatcherConfig,
    ) {
        let mut debouncer = Debouncer::default();
        let mut ticker = interval(config.batch_interval());

        loop {
            tokio::select! {
                raw = raw_rx.recv() => match raw {
                    Some(RawChange::Account(change)) => {
                        debug!("Account folder change: {:?}", change);
                        if accounts_tx.send(change).is_err() {
                            break;
                        }
                    }
                    Some(RawChange::Contract(change)) => {
                        if let Some(flushed) = debouncer.push(change, Instant::now()) {
                            if contracts_tx.send(flushed).is_err() {
                                break;
                            }
                        }
                    }
                    None => {
                        for change in debouncer.drain() {
                            let _ = contracts_tx.send(change);
                        }
                        break;
                    }
                },
                _ = ticker.tick() => {
                    for change in debouncer.ready(Instant::now(), config.debounce()) {
                        debug!("Emitting debounced change for: {}", change.path);
                        if contracts_tx.send(change).is_err() {
                            // Receiver dropped, stop task
                            return;
                        }
                    }
                    if debouncer.len() > 0 {
                        debug!("{} contract changes still settling", debouncer.len());
                    }
                }
            }
        }
        debug!("Project watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;

    fn classifier() -> Classifier {
        Classifier::new(
            Path::new("/project"),
            Path::new("/project/cadence/contracts"),
            "cdc",
        )
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_contract_created_in_default_account() {
        let changes = classifier().classify(&event(
            EventKind::Create(CreateKind::File),
            &["/project/cadence/contracts/A.cdc"],
        ));
        assert_eq!(
            changes,
            vec![RawChange::Contract(ContractChange::created(
                "cadence/contracts/A.cdc",
                ""
            ))]
        );
    }

    #[test]
    fn test_contract_changed_in_account_folder() {
        let changes = classifier().classify(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/project/cadence/contracts/alice/nested/B.cdc"],
        ));
        assert_eq!(
            changes,
            vec![RawChange::Contract(ContractChange::changed(
                "cadence/contracts/alice/nested/B.cdc",
                "alice"
            ))]
        );
    }

    #[test]
    fn test_account_folder_lifecycle() {
        let c = classifier();
        let created = c.classify(&event(
            EventKind::Create(CreateKind::Folder),
            &["/project/cadence/contracts/bob"],
        ));
        assert_eq!(created, vec![RawChange::Account(AccountChange::created("bob"))]);

        let removed = c.classify(&event(
            EventKind::Remove(RemoveKind::Folder),
            &["/project/cadence/contracts/bob"],
        ));
        assert_eq!(removed, vec![RawChange::Account(AccountChange::removed("bob"))]);

        // Nested folders are not accounts
        let nested = c.classify(&event(
            EventKind::Create(CreateKind::Folder),
            &["/project/cadence/contracts/bob/utils"],
        ));
        assert!(nested.is_empty());
    }

    #[test]
    fn test_rename_both() {
        let changes = classifier().classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &[
                "/project/cadence/contracts/A.cdc",
                "/project/cadence/contracts/Renamed.cdc",
            ],
        ));
        assert_eq!(
            changes,
            vec![RawChange::Contract(ContractChange::renamed(
                "cadence/contracts/A.cdc",
                "cadence/contracts/Renamed.cdc",
                ""
            ))]
        );
    }

    #[test]
    fn test_ignored_paths() {
        let c = classifier();
        assert!(c
            .classify(&event(
                EventKind::Create(CreateKind::File),
                &["/project/cadence/contracts/notes.txt"],
            ))
            .is_empty());
        assert!(c
            .classify(&event(
                EventKind::Create(CreateKind::File),
                &["/project/cadence/scripts/S.cdc"],
            ))
            .is_empty());
        assert!(c
            .classify(&event(
                EventKind::Modify(ModifyKind::Metadata(notify::event::MetadataKind::Any)),
                &["/project/cadence/contracts/A.cdc"],
            ))
            .is_empty());
    }

    #[test]
    fn test_change_merging() {
        let path = "cadence/contracts/A.cdc";

        let merged = merge_changes(
            &ContractChange::changed(path, ""),
            &ContractChange::changed(path, ""),
        );
        assert_eq!(merged, Merge::Replace(ContractChange::changed(path, "")));

        let merged = merge_changes(
            &ContractChange::created(path, ""),
            &ContractChange::changed(path, ""),
        );
        assert_eq!(merged, Merge::Replace(ContractChange::created(path, "")));

        let merged = merge_changes(
            &ContractChange::changed(path, ""),
            &ContractChange::removed(path, ""),
        );
        assert_eq!(merged, Merge::Replace(ContractChange::removed(path, "")));

        let merged = merge_changes(
            &ContractChange::removed(path, ""),
            &ContractChange::created(path, ""),
        );
        assert_eq!(merged, Merge::Replace(ContractChange::changed(path, "")));

        let merged = merge_changes(
            &ContractChange::created(path, ""),
            &ContractChange::removed(path, ""),
        );
        assert_eq!(merged, Merge::Drop);

        let merged = merge_changes(
            &ContractChange::renamed("cadence/contracts/Old.cdc", path, ""),
            &ContractChange::changed(path, ""),
        );
        assert_eq!(merged, Merge::Split);
    }

    #[test]
    fn test_debouncer_waits_for_quiet_period() {
        let mut debouncer = Debouncer::default();
        let start = Instant::now();
        let debounce = Duration::from_millis(100);

        debouncer.push(ContractChange::created("a.cdc", ""), start);
        debouncer.push(ContractChange::changed("b.cdc", ""), start);
        debouncer.push(
            ContractChange::changed("a.cdc", ""),
            start + Duration::from_millis(80),
        );

        let ready = debouncer.ready(start + Duration::from_millis(120), debounce);
        assert_eq!(ready, vec![ContractChange::changed("b.cdc", "")]);

        let ready = debouncer.ready(start + Duration::from_millis(200), debounce);
        assert_eq!(ready, vec![ContractChange::created("a.cdc", "")]);
        assert_eq!(debouncer.len(), 0);
    }

    #[test]
    fn test_debouncer_split_flushes_rename() {
        let mut debouncer = Debouncer::default();
        let now = Instant::now();

        let rename = ContractChange::renamed("old.cdc", "new.cdc", "");
        assert_eq!(debouncer.push(rename.clone(), now), None);

        let flushed = debouncer.push(ContractChange::changed("new.cdc", ""), now);
        assert_eq!(flushed, Some(rename));
        assert_eq!(debouncer.drain(), vec![ContractChange::changed("new.cdc", "")]);
    }

    #[tokio::test]
    async fn test_coalesce_flushes_on_close() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (accounts_tx, mut accounts_rx) = mpsc::unbounded_channel();
        let (contracts_tx, mut contracts_rx) = mpsc::unbounded_channel();

        raw_tx
            .send(RawChange::Account(AccountChange::created("alice")))
            .unwrap();
        raw_tx
            .send(RawChange::Contract(ContractChange::created("a.cdc", "alice")))
            .unwrap();
        raw_tx
            .send(RawChange::Contract(ContractChange::changed("a.cdc", "alice")))
            .unwrap();
        drop(raw_tx);

        let config = WatcherConfig {
            debounce_ms: 60_000,
            batch_interval_ms: 10,
        };
        ProjectWatcher::coalesce(raw_rx, accounts_tx, contracts_tx, config).await;

        assert_eq!(accounts_rx.recv().await, Some(AccountChange::created("alice")));
        assert_eq!(accounts_rx.recv().await, None);
        assert_eq!(
            contracts_rx.recv().await,
            Some(ContractChange::created("a.cdc", "alice"))
        );
        assert_eq!(contracts_rx.recv().await, None);
    }
}
