//! Privileged capability flag encoding.

use serde::{Deserialize, Serialize};

/// Privileged remote-access capability flags.
///
/// Each flag is three-valued: `Some(true)`, `Some(false)` or absent. Only
/// `file_upload` distinguishes all three — `false` means "upload via
/// inspection", absent means neither token is emitted. Every other flag
/// emits its token on `true` and nothing otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegedCapabilities {
    #[serde(default)]
    pub clipboard_copy: Option<bool>,
    #[serde(default)]
    pub clipboard_paste: Option<bool>,
    #[serde(default)]
    pub file_download: Option<bool>,
    #[serde(default)]
    pub file_upload: Option<bool>,
    #[serde(default)]
    pub inspect_file_download: Option<bool>,
    #[serde(default)]
    pub inspect_file_upload: Option<bool>,
    #[serde(default)]
    pub monitor_session: Option<bool>,
    #[serde(default)]
    pub record_session: Option<bool>,
    #[serde(default)]
    pub share_session: Option<bool>,
}

impl PrivilegedCapabilities {
    /// Encode the set flags as the platform's capability token list.
    ///
    /// The emission order is fixed; create and update paths share this
    /// encoding unchanged.
    #[must_use]
    pub fn tokens(&self) -> Vec<&'static str> {
        let mut capabilities = Vec::new();

        if self.clipboard_copy == Some(true) {
            capabilities.push("CLIPBOARD_COPY");
        }
        if self.clipboard_paste == Some(true) {
            capabilities.push("CLIPBOARD_PASTE");
        }
        if self.file_download == Some(true) {
            capabilities.push("FILE_DOWNLOAD");
        }
        // file_upload is three-way: true enables the plain upload, false
        // routes uploads through inspection, absent emits neither.
        match self.file_upload {
            Some(true) => capabilities.push("FILE_UPLOAD"),
            Some(false) => capabilities.push("INSPECT_FILE_UPLOAD"),
            None => {}
        }
        if self.inspect_file_download == Some(true) {
            capabilities.push("INSPECT_FILE_DOWNLOAD");
        }
        if self.inspect_file_upload == Some(true) {
            capabilities.push("INSPECT_FILE_UPLOAD");
        }
        if self.monitor_session == Some(true) {
            capabilities.push("MONITOR_SESSION");
        }
        if self.record_session == Some(true) {
            capabilities.push("RECORD_SESSION");
        }
        if self.share_session == Some(true) {
            capabilities.push("SHARE_SESSION");
        }

        capabilities
    }
}
