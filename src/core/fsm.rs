//! HTTP client for the device's `/fsm/*` file-manager endpoints.
//!
//! One thin method per endpoint; orchestration (confirmations, the
//! check-then-act folder guard, post-mutation refreshes) lives in
//! [`crate::core::session`]. Mutation outcomes travel as `Result<String,
//! String>` — the device answers with human-readable one-liners and the UI
//! shows them verbatim.

use crate::core::listing::FileListing;
use crate::core::nav;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Header the device sets on a `400` listing response to say "this folder
/// exists but is empty" — as opposed to invalid or inaccessible.
pub const EMPTY_FOLDER_HEADER: &str = "X-Empty-Folder";

/// Substring of the `createFolder` response that confirms creation.
pub const CREATED_MARKER: &str = "created";

/// Substring of the `deleteFolder` response that confirms deletion.
pub const DELETED_MARKER: &str = "deleted";

/// Why a listing fetch failed, split the way the navigation policy needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ListError {
    /// `400` with the empty marker: the folder is fine, just empty.
    EmptyFolder,
    /// `400` without the marker: invalid or inaccessible folder.
    BadFolder,
    /// Any other non-2xx status.
    Http(u16),
    /// Transport-level failure.
    Network(String),
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListError::EmptyFolder => write!(f, "folder is empty"),
            ListError::BadFolder => write!(f, "invalid or inaccessible folder"),
            ListError::Http(status) => write!(f, "HTTP {status}"),
            ListError::Network(err) => write!(f, "{err}"),
        }
    }
}

/// Where to go after a failed listing fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ListFallback {
    /// Keep the current folder and the currently displayed listing.
    Stay,
    /// The folder is gone: fall back to its parent.
    NavigateTo(String),
}

/// Navigation policy for listing failures.
///
/// An empty folder is not a reason to leave; a bad folder falls back to the
/// parent unless already at the root; generic failures stay put and leave
/// the displayed listing unchanged.
pub fn decide_after_list_error(err: &ListError, current: &str) -> ListFallback {
    match err {
        ListError::BadFolder if current != "/" => ListFallback::NavigateTo(nav::parent_of(current)),
        _ => ListFallback::Stay,
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` before the folder name goes on
/// the wire.
pub fn sanitize_folder_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[derive(Clone)]
pub struct FsmClient {
    http: reqwest::Client,
    base: String,
}

impl FsmClient {
    /// `base` is the device's HTTP origin, e.g. `http://192.168.4.1`.
    pub fn new(base: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// `GET /fsm/filelist?folder=` — the one read endpoint.
    pub async fn file_list(&self, folder: &str) -> Result<FileListing, ListError> {
        let url = format!(
            "{}?folder={}",
            self.url("/fsm/filelist"),
            urlencoding::encode(folder)
        );
        debug!(%url, "fetching listing");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ListError::Network(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<FileListing>()
                .await
                .map_err(|e| ListError::Network(format!("bad listing body: {e}")));
        }
        if status == StatusCode::BAD_REQUEST {
            if resp.headers().contains_key(EMPTY_FOLDER_HEADER) {
                return Err(ListError::EmptyFolder);
            }
            return Err(ListError::BadFolder);
        }
        Err(ListError::Http(status.as_u16()))
    }

    /// `GET /fsm/checkSpace?size=` — pre-flight capacity probe. A non-2xx
    /// answer carries a plain-text reason.
    pub async fn check_space(&self, size: u64) -> Result<(), String> {
        let url = format!("{}?size={size}", self.url("/fsm/checkSpace"));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if resp.status().is_success() {
            return Ok(());
        }
        let reason = resp.text().await.unwrap_or_default();
        Err(if reason.is_empty() {
            "not enough space".to_string()
        } else {
            reason
        })
    }

    /// `POST /fsm/upload` — multipart `file` + `folder`. The caller is
    /// responsible for the capacity pre-flight; this method only ships.
    pub async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("folder", nav::upload_folder(folder));
        let resp = self
            .http
            .post(self.url("/fsm/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        read_mutation_response(resp, "upload failed").await
    }

    /// `POST /fsm/createFolder` — form-urlencoded `name=`.
    pub async fn create_folder(&self, name: &str) -> Result<String, String> {
        self.post_form("/fsm/createFolder", &[("name", name)], "create failed")
            .await
    }

    /// `POST /fsm/deleteFolder` — form-urlencoded `folder=`.
    pub async fn delete_folder(&self, folder: &str) -> Result<String, String> {
        self.post_form("/fsm/deleteFolder", &[("folder", folder)], "delete failed")
            .await
    }

    /// `POST /fsm/delete` — form-urlencoded `file=` with the full path.
    pub async fn delete_file(&self, file: &str) -> Result<String, String> {
        self.post_form("/fsm/delete", &[("file", file)], "delete failed")
            .await
    }

    /// `GET /fsm/download?file=` — raw bytes.
    pub async fn download(&self, file: &str) -> Result<Vec<u8>, String> {
        let url = format!(
            "{}?file={}",
            self.url("/fsm/download"),
            urlencoding::encode(file)
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("download failed: HTTP {}", resp.status().as_u16()));
        }
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string())
    }

    /// `POST /fsm/reboot` — the device goes briefly unreachable afterwards;
    /// the display channel recovers on its own.
    pub async fn reboot(&self) -> Result<String, String> {
        let resp = self
            .http
            .post(self.url("/fsm/reboot"))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        read_mutation_response(resp, "reboot failed").await
    }

    async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        fail_label: &str,
    ) -> Result<String, String> {
        let resp = self
            .http
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        read_mutation_response(resp, fail_label).await
    }
}

async fn read_mutation_response(
    resp: reqwest::Response,
    fail_label: &str,
) -> Result<String, String> {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    if status.is_success() {
        Ok(text)
    } else if text.is_empty() {
        Err(format!("{fail_label}: HTTP {}", status.as_u16()))
    } else {
        Err(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_everything_else() {
        assert_eq!(sanitize_folder_name("a/b"), "a_b");
        assert_eq!(sanitize_folder_name("logs-2024_v1"), "logs-2024_v1");
        assert_eq!(sanitize_folder_name("sp ace!"), "sp_ace_");
        assert_eq!(sanitize_folder_name(""), "");
    }

    #[test]
    fn bad_folder_falls_back_to_parent() {
        assert_eq!(
            decide_after_list_error(&ListError::BadFolder, "/missing"),
            ListFallback::NavigateTo("/".to_string())
        );
        assert_eq!(
            decide_after_list_error(&ListError::BadFolder, "/a/b"),
            ListFallback::NavigateTo("/a".to_string())
        );
    }

    #[test]
    fn bad_folder_at_root_stays() {
        assert_eq!(
            decide_after_list_error(&ListError::BadFolder, "/"),
            ListFallback::Stay
        );
    }

    #[test]
    fn empty_folder_never_navigates_away() {
        assert_eq!(
            decide_after_list_error(&ListError::EmptyFolder, "/a/b"),
            ListFallback::Stay
        );
    }

    #[test]
    fn generic_failures_stay_put() {
        assert_eq!(
            decide_after_list_error(&ListError::Http(503), "/a"),
            ListFallback::Stay
        );
        assert_eq!(
            decide_after_list_error(&ListError::Network("timeout".to_string()), "/a"),
            ListFallback::Stay
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = FsmClient::new("http://device/");
        assert_eq!(client.url("/fsm/reboot"), "http://device/fsm/reboot");
    }
}
