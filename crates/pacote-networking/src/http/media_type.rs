//! Media types recognized by the client.

use std::fmt;

/// All media (content) types the client recognizes.
///
/// Anything else is treated as [`MediaType::Binary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `image/avif`
    Avif,
    /// `application/octet-stream`
    #[default]
    Binary,
    /// `image/bmp`
    Bmp,
    /// `multipart/form-data`
    FormData,
    /// `image/gif`
    Gif,
    /// `application/gzip`
    Gzip,
    /// `text/html`
    Html,
    /// `image/vnd.microsoft.icon`
    Ico,
    /// `image/jpeg`
    Jpeg,
    /// `text/javascript`
    JavaScript,
    /// `application/json`
    Json,
    /// `application/ld+json`
    JsonLd,
    /// `application/pdf`
    Pdf,
    /// `text/plain`
    PlainText,
    /// `image/png`
    Png,
    /// `image/svg+xml`
    Svg,
    /// `image/tiff`
    Tiff,
    /// `image/webp`
    Webp,
    /// `application/xhtml+xml`
    Xhtml,
    /// `application/xml`
    Xml,
    /// `application/zip`
    Zip,
}

impl MediaType {
    /// Every media type, in matching order.
    pub const ALL: [MediaType; 21] = [
        Self::Avif,
        Self::Binary,
        Self::Bmp,
        Self::FormData,
        Self::Gif,
        Self::Gzip,
        Self::Html,
        Self::Ico,
        Self::Jpeg,
        Self::JavaScript,
        Self::Json,
        Self::JsonLd,
        Self::Pdf,
        Self::PlainText,
        Self::Png,
        Self::Svg,
        Self::Tiff,
        Self::Webp,
        Self::Xhtml,
        Self::Xml,
        Self::Zip,
    ];

    /// The MIME string of this media type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Binary => "application/octet-stream",
            Self::Bmp => "image/bmp",
            Self::FormData => "multipart/form-data",
            Self::Gif => "image/gif",
            Self::Gzip => "application/gzip",
            Self::Html => "text/html",
            Self::Ico => "image/vnd.microsoft.icon",
            Self::Jpeg => "image/jpeg",
            Self::JavaScript => "text/javascript",
            Self::Json => "application/json",
            Self::JsonLd => "application/ld+json",
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
            Self::Xhtml => "application/xhtml+xml",
            Self::Xml => "application/xml",
            Self::Zip => "application/zip",
        }
    }

    /// Whether this is an `image/*` type.
    pub fn is_image(self) -> bool {
        self.as_str().starts_with("image/")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `Content-Type` header value into a [`MediaType`].
///
/// Matching is a case-insensitive prefix match, so trailing parameters such
/// as `; charset=utf-8` are ignored. Absent or unrecognized values map to
/// [`MediaType::Binary`].
pub fn try_parse_content_type(value: Option<&str>) -> MediaType {
    let Some(value) = value else {
        return MediaType::Binary;
    };
    let value = value.trim_start().to_ascii_lowercase();

    MediaType::ALL
        .into_iter()
        .find(|media_type| value.starts_with(media_type.as_str()))
        .unwrap_or(MediaType::Binary)
}
