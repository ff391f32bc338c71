//! HTTP response model and status classification.

use std::fmt;

use url::Url;

use super::body::{Anything, HttpBody};
use super::errors::HttpError;
use super::fetch::FetchResponse;
use super::media_type::{MediaType, try_parse_content_type};
use super::request::HttpHeaders;

/// How a response body is extracted, derived from its media type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Image data, kept as bytes.
    Image,
    /// Opaque binary data (octet streams, archives, PDFs), kept as bytes.
    Binary,
    /// A JSON document, parsed.
    Json,
    /// Human-readable text (plain text, HTML, XML).
    PlainText,
    /// Anything else, read as text.
    Other,
}

impl BodyKind {
    /// The extraction kind for a media type.
    pub fn of(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Avif
            | MediaType::Bmp
            | MediaType::Gif
            | MediaType::Ico
            | MediaType::Jpeg
            | MediaType::Png
            | MediaType::Svg
            | MediaType::Tiff
            | MediaType::Webp => Self::Image,
            MediaType::Binary | MediaType::Zip | MediaType::Gzip | MediaType::Pdf => Self::Binary,
            MediaType::Json | MediaType::JsonLd => Self::Json,
            MediaType::PlainText | MediaType::Html | MediaType::Xml | MediaType::Xhtml => {
                Self::PlainText
            }
            MediaType::FormData | MediaType::JavaScript => Self::Other,
        }
    }

    /// Whether the extracted body is meant to be shown in a rendering.
    fn is_printable(self) -> bool {
        !matches!(self, Self::Image | Self::Binary)
    }
}

/// The band a response falls into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    /// 100–199.
    Informational,
    /// 200–299.
    Successful(BodyKind),
    /// 300–399 with a usable `location` header.
    Redirection {
        /// Where the response points to.
        location: Url,
    },
    /// 400–499.
    ClientError(BodyKind),
    /// 500–599, and anything that fits no other band.
    ServerError(BodyKind),
}

impl ResponseClass {
    /// The name of the band.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Informational => "Informational",
            Self::Successful(_) => "Successful",
            Self::Redirection { .. } => "Redirection",
            Self::ClientError(_) => "ClientError",
            Self::ServerError(_) => "ServerError",
        }
    }
}

/// Classify a status code.
///
/// Bands are tried in order: informational, successful, redirection, client
/// error, server error. A status outside `100..=599`, or a redirection whose
/// `location` header is missing or unparseable, falls back to
/// [`ResponseClass::ServerError`]. A relative `location` is resolved against
/// `base` when one is given.
pub fn classify(
    status_code: u16,
    headers: &HttpHeaders,
    kind: BodyKind,
    base: Option<&Url>,
) -> ResponseClass {
    match status_code {
        100..=199 => ResponseClass::Informational,
        200..=299 => ResponseClass::Successful(kind),
        300..=399 => match parse_location(headers, base) {
            Some(location) => ResponseClass::Redirection { location },
            None => ResponseClass::ServerError(kind),
        },
        400..=499 => ResponseClass::ClientError(kind),
        _ => ResponseClass::ServerError(kind),
    }
}

fn header<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn parse_location(headers: &HttpHeaders, base: Option<&Url>) -> Option<Url> {
    let location = header(headers, "location")?;
    match Url::parse(location) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(location).ok(),
        Err(_) => None,
    }
}

/// A classified HTTP response.
///
/// The status code always lies in the band of [`class`](Self::class). The
/// body may still be unresolved; it is read from the transport the first time
/// it is asked for.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    class: ResponseClass,
    status_code: u16,
    headers: HttpHeaders,
    media_type: MediaType,
    body: HttpBody,
    stringify: bool,
}

impl HttpResponse {
    /// Classify a transport response.
    ///
    /// The body is not read here. Informational and redirection responses get
    /// the empty body; every other band reads the payload according to its
    /// [`BodyKind`] when the body is first accessed.
    pub fn from_fetch_response(response: FetchResponse) -> Self {
        let status_code = response.status();
        let headers = response.headers().clone();
        let media_type = try_parse_content_type(response.header("content-type"));
        let kind = BodyKind::of(media_type);
        let class = classify(status_code, &headers, kind, response.url());

        let (body, stringify) = match &class {
            ResponseClass::Informational | ResponseClass::Redirection { .. } => {
                (HttpBody::empty(), false)
            }
            ResponseClass::Successful(kind) => (extract(response, *kind), kind.is_printable()),
            ResponseClass::ClientError(kind) | ResponseClass::ServerError(kind) => {
                (extract(response, *kind), true)
            }
        };

        Self {
            class,
            status_code,
            headers,
            media_type,
            body,
            stringify,
        }
    }

    /// Get the band.
    pub fn class(&self) -> &ResponseClass {
        &self.class
    }

    /// Get the HTTP status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get a header value, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        header(&self.headers, name)
    }

    /// Get the media type parsed from `content-type`.
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Get the body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Whether the rendering includes the body.
    pub fn stringify(&self) -> bool {
        self.stringify
    }

    /// Override whether the rendering includes the body.
    pub fn with_stringify(mut self, stringify: bool) -> Self {
        self.stringify = stringify;
        self
    }

    /// Informational, successful or redirection.
    pub fn ok(&self) -> bool {
        !self.not_ok()
    }

    /// Client or server error.
    pub fn not_ok(&self) -> bool {
        matches!(
            self.class,
            ResponseClass::ClientError(_) | ResponseClass::ServerError(_)
        )
    }

    /// Check if this is an informational response.
    pub fn is_informational(&self) -> bool {
        matches!(self.class, ResponseClass::Informational)
    }

    /// Check if this is a successful response.
    pub fn is_successful(&self) -> bool {
        matches!(self.class, ResponseClass::Successful(_))
    }

    /// Check if the response redirects to another resource.
    pub fn is_redirection(&self) -> bool {
        matches!(self.class, ResponseClass::Redirection { .. })
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self.class, ResponseClass::ClientError(_))
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.class, ResponseClass::ServerError(_))
    }

    /// The redirection target, for redirection responses.
    pub fn location(&self) -> Option<&Url> {
        match &self.class {
            ResponseClass::Redirection { location } => Some(location),
            _ => None,
        }
    }

    /// The body extraction kind, for bands that carry a body.
    pub fn body_kind(&self) -> Option<BodyKind> {
        match self.class {
            ResponseClass::Successful(kind)
            | ResponseClass::ClientError(kind)
            | ResponseClass::ServerError(kind) => Some(kind),
            _ => None,
        }
    }

    /// Escalate a client or server error response to an [`HttpError`].
    pub fn to_http_error(&self) -> Option<HttpError> {
        self.not_ok().then(|| HttpError::new(self.status_code))
    }

    /// Render the response after resolving its body.
    pub async fn describe(&self) -> String {
        if self.stringify {
            // Settle the body so the rendering can show it.
            let _ = self.body.get().await;
        }
        self.to_string()
    }
}

fn extract(response: FetchResponse, kind: BodyKind) -> HttpBody {
    HttpBody::of(move || async move {
        match kind {
            BodyKind::Image | BodyKind::Binary => response.bytes().await.map(Anything::Binary),
            BodyKind::Json => response.json().await.map(Anything::Json),
            BodyKind::PlainText | BodyKind::Other => response.text().await.map(Anything::Text),
        }
    })
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(Status Code: {} | Headers: {:?} | Body: ",
            self.class.name(),
            self.status_code,
            self.headers
        )?;
        match (self.stringify, self.body.peek()) {
            (false, _) => write!(f, "...")?,
            (true, Some(Ok(value))) => write!(f, "{value}")?,
            (true, Some(Err(e))) => write!(f, "<{e}>")?,
            (true, None) => write!(f, "<unresolved>")?,
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HttpHeaders {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn response(status: u16, content_type: &str, body: &'static str) -> HttpResponse {
        HttpResponse::from_fetch_response(
            FetchResponse::new(status)
                .with_header("content-type", content_type)
                .with_body(body),
        )
    }

    #[test]
    fn test_classify_bands() {
        let none = HttpHeaders::new();
        let kind = BodyKind::Json;

        assert_eq!(classify(100, &none, kind, None), ResponseClass::Informational);
        assert_eq!(classify(199, &none, kind, None), ResponseClass::Informational);
        assert_eq!(classify(200, &none, kind, None), ResponseClass::Successful(kind));
        assert_eq!(classify(299, &none, kind, None), ResponseClass::Successful(kind));
        assert_eq!(classify(400, &none, kind, None), ResponseClass::ClientError(kind));
        assert_eq!(classify(499, &none, kind, None), ResponseClass::ClientError(kind));
        assert_eq!(classify(500, &none, kind, None), ResponseClass::ServerError(kind));
        assert_eq!(classify(599, &none, kind, None), ResponseClass::ServerError(kind));
    }

    #[test]
    fn test_classify_unknown_status_falls_back_to_server_error() {
        let none = HttpHeaders::new();
        assert_eq!(
            classify(600, &none, BodyKind::Other, None),
            ResponseClass::ServerError(BodyKind::Other)
        );
        assert_eq!(
            classify(42, &none, BodyKind::Other, None),
            ResponseClass::ServerError(BodyKind::Other)
        );
    }

    #[test]
    fn test_classify_redirection_location() {
        let absolute = headers(&[("location", "https://github.com/web-pacotes")]);
        assert_eq!(
            classify(302, &absolute, BodyKind::Binary, None),
            ResponseClass::Redirection {
                location: Url::parse("https://github.com/web-pacotes").unwrap()
            }
        );

        let relative = headers(&[("Location", "/login")]);
        let base = Url::parse("https://github.com/settings").unwrap();
        assert_eq!(
            classify(301, &relative, BodyKind::Binary, Some(&base)),
            ResponseClass::Redirection {
                location: Url::parse("https://github.com/login").unwrap()
            }
        );
    }

    #[test]
    fn test_classify_redirection_without_location_is_server_error() {
        assert_eq!(
            classify(302, &HttpHeaders::new(), BodyKind::Binary, None),
            ResponseClass::ServerError(BodyKind::Binary)
        );
        let relative = headers(&[("location", "/login")]);
        assert_eq!(
            classify(302, &relative, BodyKind::Binary, None),
            ResponseClass::ServerError(BodyKind::Binary)
        );
    }

    #[test]
    fn test_body_kind_mapping() {
        assert_eq!(BodyKind::of(MediaType::Png), BodyKind::Image);
        assert_eq!(BodyKind::of(MediaType::Pdf), BodyKind::Binary);
        assert_eq!(BodyKind::of(MediaType::JsonLd), BodyKind::Json);
        assert_eq!(BodyKind::of(MediaType::Xhtml), BodyKind::PlainText);
        assert_eq!(BodyKind::of(MediaType::JavaScript), BodyKind::Other);
    }

    #[tokio::test]
    async fn test_json_body_is_parsed() {
        let response = response(200, "application/json; charset=utf-8", r#"{"id":7}"#);

        assert!(response.is_successful());
        assert_eq!(response.media_type(), MediaType::Json);
        assert_eq!(
            response.body().get().await.unwrap(),
            Anything::Json(serde_json::json!({"id": 7}))
        );
    }

    #[tokio::test]
    async fn test_image_body_is_kept_as_bytes() {
        let response = response(200, "image/png", "\u{89}PNG");

        assert_eq!(response.class(), &ResponseClass::Successful(BodyKind::Image));
        assert!(!response.stringify());
        assert!(matches!(
            response.body().get().await.unwrap(),
            Anything::Binary(_)
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_a_body_error() {
        let response = response(500, "application/json", "<html>oops</html>");
        assert!(response.body().get().await.is_err());
    }

    #[test]
    fn test_informational_and_redirection_have_empty_bodies() {
        let informational = HttpResponse::from_fetch_response(FetchResponse::new(101));
        assert!(informational.is_informational());
        assert!(informational.body().is_empty());
        assert!(informational.ok());

        let redirection = HttpResponse::from_fetch_response(
            FetchResponse::new(307).with_header("location", "https://example.com/next"),
        );
        assert!(redirection.is_redirection());
        assert!(redirection.body().is_empty());
        assert_eq!(
            redirection.location().map(Url::as_str),
            Some("https://example.com/next")
        );
    }

    #[test]
    fn test_error_responses_escalate() {
        let not_found = response(404, "text/plain", "missing");
        assert!(not_found.not_ok());
        assert!(not_found.is_client_error());
        assert_eq!(not_found.to_http_error(), Some(HttpError::new(404)));

        let unavailable = response(503, "text/plain", "down");
        assert!(unavailable.is_server_error());
        assert_eq!(unavailable.to_http_error().map(|e| e.status_code), Some(503));

        let ok = response(200, "text/plain", "fine");
        assert_eq!(ok.to_http_error(), None);
    }

    #[tokio::test]
    async fn test_display() {
        let response = response(200, "text/plain", "hello");
        assert_eq!(
            response.describe().await,
            r#"Successful(Status Code: 200 | Headers: {"content-type": "text/plain"} | Body: hello)"#
        );

        let hidden = response.with_stringify(false);
        assert!(hidden.to_string().ends_with("Body: ...)"));
    }
}
