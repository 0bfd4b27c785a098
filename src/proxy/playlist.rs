//! Playlist line rewriting.
//!
//! Every line that references another playlist, a segment or an allowed
//! static asset is replaced by a proxy URL carrying the absolute reference as
//! its `url` query value, so the player's follow-up fetches come back through
//! the proxy. Tags, comments, blank lines and anything unrecognized are
//! copied verbatim; malformed playlists are never an error.

use std::borrow::Cow;
use std::io::{self, BufRead, Write};

use url::Url;

use crate::proxy::target::has_static_extension;

/// Classification of a single playlist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Tag, comment or blank line.
    PassThrough,
    /// Nested playlist (`.m3u8`) or media segment (`.ts`).
    ManifestOrSegmentRef,
    /// Allowed static asset such as a thumbnail or subtitle page.
    StaticAssetRef,
    Opaque,
}

impl LineKind {
    pub fn is_reference(&self) -> bool {
        matches!(self, LineKind::ManifestOrSegmentRef | LineKind::StaticAssetRef)
    }
}

/// Rewrites one playlist fetched from `target`.
#[derive(Debug)]
pub struct PlaylistTransformer<'a> {
    base: Option<Url>,
    prefix: &'a str,
    static_extensions: &'a [String],
}

impl<'a> PlaylistTransformer<'a> {
    /// `prefix` is prepended to every encoded reference, e.g.
    /// `m3u8-proxy?url=`.
    pub fn new(target: &str, prefix: &'a str, static_extensions: &'a [String]) -> Self {
        let base = base_context(target);
        if base.is_none() {
            tracing::warn!(
                target_url = %target,
                "Playlist URL has no usable base, relative references are forwarded literally"
            );
        }
        Self {
            base,
            prefix,
            static_extensions,
        }
    }

    /// Directory of the playlist that relative references resolve against.
    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Classify an already trimmed line.
    pub fn classify(&self, trimmed: &str) -> LineKind {
        if trimmed.is_empty() || trimmed.starts_with('#') {
            LineKind::PassThrough
        } else if trimmed.ends_with(".m3u8") || trimmed.ends_with(".ts") {
            LineKind::ManifestOrSegmentRef
        } else if has_static_extension(trimmed, self.static_extensions) {
            LineKind::StaticAssetRef
        } else {
            LineKind::Opaque
        }
    }

    /// Rewrite a single line (without its terminator).
    pub fn rewrite_line<'l>(&self, line: &'l str) -> Cow<'l, str> {
        let trimmed = line.trim();
        if !self.classify(trimmed).is_reference() {
            return Cow::Borrowed(line);
        }
        let reference = self.resolve(trimmed);
        Cow::Owned(format!("{}{}", self.prefix, urlencoding::encode(&reference)))
    }

    fn resolve<'l>(&self, reference: &'l str) -> Cow<'l, str> {
        if is_absolute(reference) {
            return Cow::Borrowed(reference);
        }
        match &self.base {
            Some(base) => match base.join(reference) {
                Ok(resolved) => Cow::Owned(resolved.into()),
                Err(e) => {
                    tracing::debug!(reference = %reference, error = %e, "Unresolvable playlist reference");
                    Cow::Borrowed(reference)
                }
            },
            None => Cow::Borrowed(reference),
        }
    }

    /// Stream `reader` to `writer` line by line. Each emitted line ends with
    /// a single `\n`; a `\r` before the newline is dropped.
    pub fn transform<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let mut line: &[u8] = &buf;
            if let Some(rest) = line.strip_suffix(b"\n") {
                line = rest;
            }
            if let Some(rest) = line.strip_suffix(b"\r") {
                line = rest;
            }

            match std::str::from_utf8(line) {
                Ok(text) => writer.write_all(self.rewrite_line(text).as_bytes())?,
                // Not text, so it cannot be a reference.
                Err(_) => writer.write_all(line)?,
            }
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

/// Rewrite a whole in-memory playlist body.
pub fn rewrite_playlist(
    body: &[u8],
    target: &str,
    prefix: &str,
    static_extensions: &[String],
) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len() + body.len() / 2);
    PlaylistTransformer::new(target, prefix, static_extensions).transform(body, &mut out)?;
    Ok(out)
}

fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// The target with its path cut back to the containing directory.
fn base_context(target: &str) -> Option<Url> {
    let mut url = Url::parse(target).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    let dir = match url.path().rfind('/') {
        Some(idx) => url.path()[..=idx].to_string(),
        None => "/".to_string(),
    };
    url.set_path(&dir);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_static_extensions;

    const PREFIX: &str = "m3u8-proxy?url=";
    const TARGET: &str = "https://cdn.example/videos/show/index.m3u8";

    fn rewrite(body: &str, target: &str) -> String {
        let out = rewrite_playlist(body.as_bytes(), target, PREFIX, &default_static_extensions()).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn proxied(absolute: &str) -> String {
        format!("{}{}", PREFIX, urlencoding::encode(absolute))
    }

    #[test]
    fn test_media_playlist() {
        let body = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:9.009,\nseg-000.ts\n#EXTINF:9.009,\nhttps://other.cdn/ad.ts\n#EXT-X-ENDLIST\n";
        let expected = format!(
            "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:9.009,\n{}\n#EXTINF:9.009,\n{}\n#EXT-X-ENDLIST\n",
            proxied("https://cdn.example/videos/show/seg-000.ts"),
            proxied("https://other.cdn/ad.ts"),
        );
        assert_eq!(rewrite(body, TARGET), expected);
    }

    #[test]
    fn test_encoding_is_a_single_query_value() {
        let out = rewrite("seg-000.ts\n", TARGET);
        assert_eq!(
            out,
            "m3u8-proxy?url=https%3A%2F%2Fcdn.example%2Fvideos%2Fshow%2Fseg-000.ts\n"
        );
    }

    #[test]
    fn test_relative_resolution() {
        let body = "../other/low.m3u8\n/root/seg.ts\n720p/index.m3u8\n//mirror.example/a.ts\n";
        let expected = [
            proxied("https://cdn.example/videos/other/low.m3u8"),
            proxied("https://cdn.example/root/seg.ts"),
            proxied("https://cdn.example/videos/show/720p/index.m3u8"),
            proxied("https://mirror.example/a.ts"),
        ]
        .join("\n")
            + "\n";
        assert_eq!(rewrite(body, TARGET), expected);
    }

    #[test]
    fn test_target_query_is_not_inherited() {
        let out = rewrite("seg.ts\n", "https://cdn.example/live/index.m3u8?token=abc");
        assert_eq!(out, proxied("https://cdn.example/live/seg.ts") + "\n");
    }

    #[test]
    fn test_static_assets_are_rewritten() {
        let out = rewrite("thumbs/0001.jpg\nstyle.css\n", TARGET);
        assert_eq!(
            out,
            format!(
                "{}\n{}\n",
                proxied("https://cdn.example/videos/show/thumbs/0001.jpg"),
                proxied("https://cdn.example/videos/show/style.css")
            )
        );
    }

    #[test]
    fn test_opaque_lines_pass_through() {
        let body = "seg.ts?sig=1\nkey.bin\n  \n#EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\"\n";
        assert_eq!(rewrite(body, TARGET), body);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed_for_references() {
        let out = rewrite("  seg-1.ts \t\n", TARGET);
        assert_eq!(out, proxied("https://cdn.example/videos/show/seg-1.ts") + "\n");
    }

    #[test]
    fn test_line_framing() {
        assert_eq!(rewrite("#EXTM3U\r\n#EXT-X-ENDLIST", TARGET), "#EXTM3U\n#EXT-X-ENDLIST\n");
        assert_eq!(rewrite("", TARGET), "");
        assert_eq!(rewrite("\n\n", TARGET), "\n\n");
    }

    #[test]
    fn test_non_utf8_lines_are_copied() {
        let body = b"#EXTM3U\n\xff\xfe.ts\n";
        let out = rewrite_playlist(body, TARGET, PREFIX, &default_static_extensions()).unwrap();
        assert_eq!(out, body.to_vec());
    }

    #[test]
    fn test_unusable_base_forwards_references_literally() {
        let out = rewrite("seg.ts\nhttps://cdn.example/a.ts\n", "not a url");
        assert_eq!(out, format!("{}seg.ts\n{}\n", PREFIX, proxied("https://cdn.example/a.ts")));
    }

    #[test]
    fn test_base_context() {
        let transformer = PlaylistTransformer::new(TARGET, PREFIX, &[]);
        assert_eq!(transformer.base().unwrap().as_str(), "https://cdn.example/videos/show/");

        let root = PlaylistTransformer::new("https://cdn.example", PREFIX, &[]);
        assert_eq!(root.base().unwrap().as_str(), "https://cdn.example/");

        assert!(PlaylistTransformer::new("mailto:someone@example.com", PREFIX, &[]).base().is_none());
    }

    #[test]
    fn test_classify() {
        let exts = default_static_extensions();
        let transformer = PlaylistTransformer::new(TARGET, PREFIX, &exts);
        assert_eq!(transformer.classify("#EXTINF:4,"), LineKind::PassThrough);
        assert_eq!(transformer.classify(""), LineKind::PassThrough);
        assert_eq!(transformer.classify("a.m3u8"), LineKind::ManifestOrSegmentRef);
        assert_eq!(transformer.classify("a.TS"), LineKind::Opaque);
        assert_eq!(transformer.classify("a.webp"), LineKind::StaticAssetRef);
        assert_eq!(transformer.classify("a.mp4"), LineKind::Opaque);
    }

    #[test]
    fn test_second_pass_keeps_tags_and_opaque_lines() {
        let body = "#EXTM3U\n#EXTINF:4,\nseg.ts\nkey.bin\n\n#EXT-X-ENDLIST\n";
        let once = rewrite(body, TARGET);
        let twice = rewrite(&once, TARGET);

        let exts = default_static_extensions();
        let transformer = PlaylistTransformer::new(TARGET, PREFIX, &exts);
        for (first, second) in once.lines().zip(twice.lines()) {
            if !transformer.classify(first.trim()).is_reference() {
                assert_eq!(first, second);
            }
        }
        assert_eq!(once.lines().count(), twice.lines().count());
    }
}
