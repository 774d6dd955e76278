//! Session context: the one object holding the client's side of the device
//! session — the display channel handle, the HTTP client and the event
//! sender every spawned operation reports back through.
//!
//! All mutating flows share one shape: validate locally, fire exactly one
//! request, report one [`AppEvent::Mutation`]. The UI loop reacts to a
//! success by arming the stale-echo suppression and triggering exactly one
//! listing refresh; failures surface on the status line and refresh
//! nothing. Operations racing each other (two near-simultaneous mutations)
//! are not serialized; their refreshes may interleave.

use crate::core::channel::{Channel, ChannelEvent};
use crate::core::fsm::{
    sanitize_folder_name, FsmClient, ListError, CREATED_MARKER, DELETED_MARKER,
};
use crate::core::listing::FileListing;
use crate::core::protocol::ClientMessage;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Which mutating operation an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Upload,
    CreateFolder,
    DeleteFolder,
    DeleteFile,
    Reboot,
}

impl MutationKind {
    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::Upload => "upload",
            MutationKind::CreateFolder => "create folder",
            MutationKind::DeleteFolder => "delete folder",
            MutationKind::DeleteFile => "delete file",
            MutationKind::Reboot => "reboot",
        }
    }
}

/// Everything the sequential UI loop reacts to, in arrival order.
#[derive(Debug)]
pub enum AppEvent {
    Link(ChannelEvent),
    Listing {
        folder: String,
        outcome: Result<FileListing, ListError>,
    },
    Mutation {
        kind: MutationKind,
        outcome: Result<String, String>,
    },
    Downloaded {
        name: String,
        outcome: Result<PathBuf, String>,
    },
}

/// Client session context. Cheap to clone; spawned operations take a clone.
#[derive(Clone)]
pub struct Session {
    channel: Channel,
    fsm: FsmClient,
    events: mpsc::UnboundedSender<AppEvent>,
    download_dir: PathBuf,
}

impl Session {
    pub fn new(
        channel: Channel,
        fsm: FsmClient,
        events: mpsc::UnboundedSender<AppEvent>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            channel,
            fsm,
            events,
            download_dir,
        }
    }

    /// Forward a message on the display channel.
    pub fn send(&self, msg: ClientMessage) {
        self.channel.send(msg);
    }

    fn emit(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }

    // ── Read ─────────────────────────────────────────────────────────────

    /// Fetch the listing of `folder` in the background.
    pub fn fetch_listing(&self, folder: &str) {
        let this = self.clone();
        let folder = folder.to_string();
        tokio::spawn(async move {
            let outcome = this.fsm.file_list(&folder).await;
            this.emit(AppEvent::Listing { folder, outcome });
        });
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Upload a local file into `folder`.
    ///
    /// Pre-flights `checkSpace` with the file's size and aborts before any
    /// byte of the body is transmitted when the device reports insufficient
    /// space.
    pub fn upload(&self, folder: String, local_path: PathBuf) {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.upload_inner(&folder, &local_path).await;
            this.emit(AppEvent::Mutation {
                kind: MutationKind::Upload,
                outcome,
            });
        });
    }

    async fn upload_inner(&self, folder: &str, local_path: &Path) -> Result<String, String> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| "no file selected".to_string())?;
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| format!("cannot read {}: {e}", local_path.display()))?;

        self.fsm
            .check_space(bytes.len() as u64)
            .await
            .map_err(|reason| format!("upload aborted: {reason}"))?;

        info!(file = name, folder, size = bytes.len(), "uploading");
        self.fsm.upload(folder, name, bytes).await
    }

    /// Create a folder (root-only affordance; the caller enforces that).
    /// The name is sanitized before it goes on the wire; an empty result is
    /// a local validation failure and never reaches the device.
    pub fn create_folder(&self, raw_name: &str) {
        let name = sanitize_folder_name(raw_name.trim());
        if name.is_empty() {
            self.emit(AppEvent::Mutation {
                kind: MutationKind::CreateFolder,
                outcome: Err("please enter a folder name".to_string()),
            });
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = match this.fsm.create_folder(&name).await {
                Ok(text) if text.contains(CREATED_MARKER) => Ok(text),
                // 200 without the confirming substring is still a failure.
                Ok(text) => Err(text),
                Err(err) => Err(err),
            };
            this.emit(AppEvent::Mutation {
                kind: MutationKind::CreateFolder,
                outcome,
            });
        });
    }

    /// Delete a file by full path.
    pub fn delete_file(&self, path: String) {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.fsm.delete_file(&path).await;
            this.emit(AppEvent::Mutation {
                kind: MutationKind::DeleteFile,
                outcome,
            });
        });
    }

    /// Delete a folder, guarded by an emptiness re-check.
    ///
    /// The target is re-listed first; a non-empty answer aborts with a
    /// visible refusal. Check-then-act is best-effort by design — the
    /// device offers no atomic delete-if-empty, so a concurrent writer can
    /// still win the race and the deletion failure that follows is an
    /// expected, recoverable outcome.
    pub fn delete_folder_guarded(&self, folder_path: String) {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.delete_folder_inner(&folder_path).await;
            this.emit(AppEvent::Mutation {
                kind: MutationKind::DeleteFolder,
                outcome,
            });
        });
    }

    async fn delete_folder_inner(&self, folder_path: &str) -> Result<String, String> {
        match self.fsm.file_list(folder_path).await {
            Ok(listing) if !listing.files.is_empty() => {
                return Err("cannot delete: folder is not empty".to_string());
            }
            Ok(_) => {}
            // The explicit empty marker is exactly the green light.
            Err(ListError::EmptyFolder) => {}
            Err(err) => return Err(format!("cannot verify folder is empty: {err}")),
        }

        debug!(folder = folder_path, "emptiness check passed, deleting");
        match self.fsm.delete_folder(folder_path).await {
            Ok(text) if text.contains(DELETED_MARKER) => Ok(text),
            Ok(text) => Err(text),
            Err(err) => Err(err),
        }
    }

    /// Download a file and save it under the configured download directory.
    pub fn download(&self, path: String, name: String) {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.download_inner(&path, &name).await;
            this.emit(AppEvent::Downloaded { name, outcome });
        });
    }

    async fn download_inner(&self, path: &str, name: &str) -> Result<PathBuf, String> {
        let bytes = self.fsm.download(path).await?;
        let dest = self.download_dir.join(name);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        tokio::fs::write(&dest, bytes)
            .await
            .map_err(|e| format!("cannot write {}: {e}", dest.display()))?;
        Ok(dest)
    }

    /// Ask the device to reboot. It goes unreachable for a moment; the
    /// display channel reconnects on its own.
    pub fn reboot(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.fsm.reboot().await;
            this.emit(AppEvent::Mutation {
                kind: MutationKind::Reboot,
                outcome,
            });
        });
    }
}
