//! Folder navigation state and path algebra.
//!
//! Paths are absolute and slash-normalized: a leading `/`, collapsed
//! separators, and no trailing `/` except for the root itself. Every path
//! that enters the client (user navigation or a server echo) goes through
//! [`normalize`] so the rest of the code can compare strings directly.
//!
//! The device echoes a `currentFolder` back in listing responses. When the
//! client itself just navigated (or mutated and is about to refresh), that
//! echo may describe an older folder — adopting it would undo the newer
//! client-chosen path. [`NavState::arm_ignore`] suppresses exactly the next
//! echo; the flag is cleared by the very next listing response either way.

/// Normalize a folder path to its canonical absolute form.
///
/// Collapses duplicate separators, forces a leading `/` and strips the
/// trailing `/` (the root stays `/`). Idempotent.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for part in path.split('/').filter(|p| !p.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(part);
    }
    out
}

/// Parent folder of `path`; the parent of the root is the root.
pub fn parent_of(path: &str) -> String {
    let canon = normalize(path);
    match canon.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => canon[..idx].to_string(),
    }
}

/// Join a folder and a child name without doubling separators.
pub fn join(folder: &str, name: &str) -> String {
    let base = normalize(folder);
    if base == "/" {
        normalize(&format!("/{name}"))
    } else {
        normalize(&format!("{base}/{name}"))
    }
}

/// Folder form used in the upload request body: trailing slash, root stays `/`.
pub fn upload_folder(path: &str) -> String {
    let canon = normalize(path);
    if canon == "/" {
        canon
    } else {
        format!("{canon}/")
    }
}

/// Tracked folder position plus the stale-echo suppression flag.
#[derive(Debug, Clone)]
pub struct NavState {
    current: String,
    ignore_server_folder: bool,
}

impl NavState {
    pub fn new() -> Self {
        Self {
            current: "/".to_string(),
            ignore_server_folder: false,
        }
    }

    /// The current folder, canonical form.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn at_root(&self) -> bool {
        self.current == "/"
    }

    /// Jump to an arbitrary folder.
    pub fn set(&mut self, path: &str) {
        self.current = normalize(path);
    }

    /// Descend into a child folder of the current one.
    pub fn enter(&mut self, name: &str) {
        self.current = join(&self.current, name);
    }

    /// Ascend to the parent folder.
    pub fn up(&mut self) {
        self.current = parent_of(&self.current);
    }

    /// Suppress the `currentFolder` echoed by the next listing response.
    ///
    /// Armed immediately before every client-initiated navigation or
    /// post-mutation refresh.
    pub fn arm_ignore(&mut self) {
        self.ignore_server_folder = true;
    }

    /// Feed the `currentFolder` field of a listing response into the state.
    ///
    /// Adopts the server's value unless the suppression flag is armed; the
    /// flag is consumed by this call in either case.
    pub fn adopt_server_folder(&mut self, server: Option<&str>) {
        let armed = std::mem::replace(&mut self.ignore_server_folder, false);
        if armed {
            return;
        }
        if let Some(folder) = server {
            self.current = normalize(folder);
        }
    }
}

impl Default for NavState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for p in ["/", "", "//", "/a//b/", "a/b", "/a/b", "/a/b/"] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once, "input {p:?}");
        }
    }

    #[test]
    fn normalize_canonical_forms() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a/b"), "/a/b");
        assert_eq!(normalize("/a//b/"), "/a/b");
        assert_eq!(normalize("//logs/"), "/logs");
    }

    #[test]
    fn parent_rules() {
        assert_eq!(parent_of("/"), "/");
        assert_eq!(parent_of("/a"), "/");
        assert_eq!(parent_of("/a/b"), "/a");
        assert_eq!(parent_of("/a/b/"), "/a");
    }

    #[test]
    fn join_collapses_separators() {
        assert_eq!(join("/", "logs"), "/logs");
        assert_eq!(join("/a/", "b"), "/a/b");
        assert_eq!(join("/a", "/b/"), "/a/b");
    }

    #[test]
    fn upload_folder_keeps_trailing_slash() {
        assert_eq!(upload_folder("/"), "/");
        assert_eq!(upload_folder("/a"), "/a/");
        assert_eq!(upload_folder("/a/b/"), "/a/b/");
    }

    #[test]
    fn enter_and_up() {
        let mut nav = NavState::new();
        nav.enter("a");
        nav.enter("b");
        assert_eq!(nav.current(), "/a/b");
        nav.up();
        assert_eq!(nav.current(), "/a");
        nav.up();
        nav.up();
        assert_eq!(nav.current(), "/");
        assert!(nav.at_root());
    }

    #[test]
    fn armed_flag_discards_server_echo() {
        let mut nav = NavState::new();
        nav.set("/new");
        nav.arm_ignore();
        nav.adopt_server_folder(Some("/other"));
        assert_eq!(nav.current(), "/new");
        // Flag is consumed: the next echo is adopted again.
        nav.adopt_server_folder(Some("/other"));
        assert_eq!(nav.current(), "/other");
    }

    #[test]
    fn unarmed_echo_is_adopted_and_normalized() {
        let mut nav = NavState::new();
        nav.adopt_server_folder(Some("/data//logs/"));
        assert_eq!(nav.current(), "/data/logs");
        nav.adopt_server_folder(None);
        assert_eq!(nav.current(), "/data/logs");
    }
}
