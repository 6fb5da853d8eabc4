use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression as Level;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use serde::Serialize;

use crate::error::RouteError;
use crate::event::ProxyResponse;

/// Content types base64-encoded when a route sets `b64encode`.
pub const BINARY_TYPES: &[&str] = &[
    "application/octet-stream",
    "application/x-tar",
    "application/zip",
    "image/png",
    "image/jpeg",
    "image/tiff",
    "image/webp",
];

/// Response status understood by views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Empty,
    Nok,
    Found,
    NotFound,
    Conflict,
    Error,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Empty => 204,
            Self::Nok => 400,
            Self::Found => 302,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Error => 500,
        }
    }
}

/// Response payload produced by a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.into_bytes(),
            Self::Binary(b) => b,
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

/// What a view returns: status, content type and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub content_type: String,
    pub body: Body,
}

impl Reply {
    pub fn new(status: Status, content_type: impl Into<String>, body: impl Into<Body>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Serialize `value` as an `application/json` reply.
    pub fn json<T: Serialize>(status: Status, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            status,
            "application/json",
            serde_json::to_string(value)?,
        ))
    }

    /// `{"<key>": "<message>"}` as JSON.
    pub(crate) fn message(status: Status, key: &str, message: &str) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(key.to_owned(), serde_json::Value::String(message.to_owned()));
        Self::new(
            status,
            "application/json",
            serde_json::Value::Object(map).to_string(),
        )
    }
}

/// Payload compression a route may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zlib,
    Deflate,
}

impl Compression {
    /// Token as it appears in `Accept-Encoding` / `Content-Encoding`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zlib => "zlib",
            Self::Deflate => "deflate",
        }
    }

    pub fn encode(self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Level::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Level::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Self::Gzip),
            "zlib" => Ok(Self::Zlib),
            "deflate" => Ok(Self::Deflate),
            other => Err(RouteError::UnknownCompression(other.to_owned())),
        }
    }
}

/// Route-level settings that shape the proxy response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResponseOptions<'a> {
    pub cors: bool,
    pub methods: &'a [String],
    /// Already negotiated against the request's `Accept-Encoding`
    pub compression: Option<Compression>,
    pub b64encode: bool,
}

impl ResponseOptions<'_> {
    /// No CORS, no compression, no forced base64.
    pub(crate) fn plain() -> Self {
        Self {
            cors: false,
            methods: &[],
            compression: None,
            b64encode: false,
        }
    }
}

pub(crate) fn into_proxy_response(reply: Reply, opts: &ResponseOptions<'_>) -> ProxyResponse {
    let Reply {
        status,
        content_type,
        body,
    } = reply;

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_owned(), content_type.clone());

    if opts.cors {
        headers.insert("Access-Control-Allow-Origin".to_owned(), "*".to_owned());
        headers.insert(
            "Access-Control-Allow-Methods".to_owned(),
            opts.methods.join(","),
        );
        headers.insert(
            "Access-Control-Allow-Credentials".to_owned(),
            "true".to_owned(),
        );
    }

    let mut bytes = body.into_bytes();

    let compression = opts
        .compression
        .filter(|_| content_type != "application/zip");
    if let Some(method) = compression {
        match method.encode(&bytes) {
            Ok(encoded) => {
                bytes = encoded;
                headers.insert("Content-Encoding".to_owned(), method.as_str().to_owned());
            }
            Err(e) => {
                tracing::error!(compression = %method, error = %e, "compression failed; sending identity body");
            }
        }
    }

    let force_base64 = opts.b64encode && BINARY_TYPES.contains(&content_type.as_str());
    let (body, is_base64_encoded) = if force_base64 {
        (STANDARD.encode(&bytes), true)
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => (text, false),
            // The proxy response body is a string; raw bytes must be encoded
            Err(e) => (STANDARD.encode(e.as_bytes()), true),
        }
    };

    ProxyResponse {
        status_code: status.code(),
        headers,
        body,
        is_base64_encoded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn methods() -> Vec<String> {
        vec!["GET".to_owned(), "POST".to_owned()]
    }

    #[test]
    fn status_codes() {
        assert_eq!(Status::Ok.code(), 200);
        assert_eq!(Status::Empty.code(), 204);
        assert_eq!(Status::Nok.code(), 400);
        assert_eq!(Status::Found.code(), 302);
        assert_eq!(Status::NotFound.code(), 404);
        assert_eq!(Status::Conflict.code(), 409);
        assert_eq!(Status::Error.code(), 500);
    }

    #[test]
    fn plain_text_reply() {
        let reply = Reply::new(Status::Ok, "text/plain", "Yo");
        let response = into_proxy_response(reply, &ResponseOptions::plain());

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "Yo");
        assert!(!response.is_base64_encoded);
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.headers["Content-Type"], "text/plain");
    }

    #[test]
    fn cors_headers_join_methods() {
        let methods = methods();
        let opts = ResponseOptions {
            cors: true,
            methods: &methods,
            ..ResponseOptions::plain()
        };
        let response = into_proxy_response(Reply::new(Status::Ok, "text/plain", "Yo"), &opts);

        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "GET,POST");
        assert_eq!(response.headers["Access-Control-Allow-Credentials"], "true");
    }

    #[test]
    fn gzip_body_is_base64_and_decodes_back() {
        let opts = ResponseOptions {
            compression: Some(Compression::Gzip),
            ..ResponseOptions::plain()
        };
        let response = into_proxy_response(
            Reply::new(Status::Ok, "application/json", r#"{"app":"it works"}"#),
            &opts,
        );

        assert_eq!(response.headers["Content-Encoding"], "gzip");
        assert!(response.is_base64_encoded);

        let compressed = response.body_bytes().unwrap();
        let mut decoded = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, r#"{"app":"it works"}"#);
    }

    #[test]
    fn zip_content_is_never_compressed() {
        let opts = ResponseOptions {
            compression: Some(Compression::Gzip),
            ..ResponseOptions::plain()
        };
        let response = into_proxy_response(
            Reply::new(Status::Ok, "application/zip", b"PK\x03\x04".to_vec()),
            &opts,
        );
        assert!(!response.headers.contains_key("Content-Encoding"));
        assert_eq!(response.body_bytes().unwrap(), b"PK\x03\x04");
    }

    #[test]
    fn binary_type_with_b64encode() {
        let opts = ResponseOptions {
            b64encode: true,
            ..ResponseOptions::plain()
        };
        let response =
            into_proxy_response(Reply::new(Status::Ok, "image/png", PNG_MAGIC.to_vec()), &opts);
        assert!(response.is_base64_encoded);
        assert_eq!(response.body, STANDARD.encode(PNG_MAGIC));
    }

    #[test]
    fn b64encode_leaves_text_types_alone() {
        let opts = ResponseOptions {
            b64encode: true,
            ..ResponseOptions::plain()
        };
        let response = into_proxy_response(Reply::new(Status::Ok, "text/plain", "Yo"), &opts);
        assert!(!response.is_base64_encoded);
        assert_eq!(response.body, "Yo");
    }

    #[test]
    fn non_utf8_body_is_always_base64() {
        let response = into_proxy_response(
            Reply::new(Status::Ok, "image/png", PNG_MAGIC.to_vec()),
            &ResponseOptions::plain(),
        );
        assert!(response.is_base64_encoded);
        assert_eq!(response.body_bytes().unwrap(), PNG_MAGIC);
    }

    #[test]
    fn message_reply_is_json() {
        let reply = Reply::message(Status::Nok, "errorMessage", "Missing route parameter");
        assert_eq!(reply.content_type, "application/json");
        assert_eq!(
            reply.body,
            Body::Text(r#"{"errorMessage":"Missing route parameter"}"#.to_owned())
        );
    }

    #[test]
    fn compression_parses_known_names() {
        assert_eq!("zlib".parse::<Compression>().unwrap(), Compression::Zlib);
        assert!(matches!(
            "brotli".parse::<Compression>(),
            Err(RouteError::UnknownCompression(name)) if name == "brotli"
        ));
    }
}
