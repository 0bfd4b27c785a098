//! Suffix classification of proxied targets.

use url::Url;

/// What the requested target looks like, judged by its path suffix.
///
/// The flags are independent; a target may match none of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetKind {
    pub is_manifest: bool,
    pub is_segment: bool,
    pub is_static_asset: bool,
}

impl TargetKind {
    /// Classify by the lowercased URL path, so query strings such as signed
    /// tokens do not hide the extension.
    pub fn classify(target: &Url, static_extensions: &[String]) -> Self {
        let path = target.path().to_ascii_lowercase();
        Self {
            is_manifest: path.ends_with(".m3u8"),
            is_segment: path.ends_with(".ts"),
            is_static_asset: has_static_extension(&path, static_extensions),
        }
    }

    /// Playlists and segments fetched with a 200 go through the rewriter.
    pub fn is_rewritable(&self) -> bool {
        self.is_manifest || self.is_segment
    }
}

pub fn has_static_extension(candidate: &str, static_extensions: &[String]) -> bool {
    static_extensions.iter().any(|ext| candidate.ends_with(ext.as_str()))
}
