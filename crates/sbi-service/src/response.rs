//! Pseudo-HTTP response framing.
//!
//! Success responses use status `200 OK`; protocol, validation, admin and
//! capture errors are all framed as `405 OK` for wire compatibility with
//! existing test clients. `Content-Length` is computed from the UTF-8 byte
//! length of the body and omitted when there is no body.

use sbi_core::catalog::error_description;
use sbi_core::dto::{BiometricDto, CaptureResponse, ErrorInfo};

const ALLOW_HEADERS: &str = "DNT,X-Mx-ReqToken,Keep-Alive,User-Agent,X-Requested-With,\
If-Modified-Since,Cache-Control,Content-Type,X-PINGOTHER,Authorization";

/// Frames responses for one service instance.
#[derive(Clone, Debug)]
pub struct ResponseBuilder {
    address: String,
    port: u16,
    cors_methods: String,
}

impl ResponseBuilder {
    pub fn new(address: impl Into<String>, port: u16, allowed_methods: &[String]) -> Self {
        Self {
            address: address.into(),
            port,
            cors_methods: allowed_methods.join(","),
        }
    }

    fn cors_headers(&self) -> String {
        format!(
            "Access-Control-Allow-Headers:{ALLOW_HEADERS}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: {}\r\n\
             Access-Control-Allow-Credentials: true\r\n",
            self.cors_methods
        )
    }

    fn framed(&self, status_line: &str, body: Option<&str>) -> Vec<u8> {
        let mut response = String::new();
        response.push_str(status_line);
        response.push_str("\r\n");
        response.push_str(&self.cors_headers());
        response.push_str("CACHE-CONTROL:no-cache\r\n");
        if let Some(body) = body {
            response.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        response.push_str("Content-Type: application/json\r\n");
        response.push_str(&format!(
            "LOCATION: HTTP://{}:{}/\r\n",
            self.address, self.port
        ));
        response.push_str("Connection: close\r\n\r\n");
        if let Some(body) = body {
            response.push_str(body);
            response.push_str("\r\n\r\n");
        }
        response.into_bytes()
    }

    /// 200 response around a JSON body.
    pub fn success(&self, body: Option<&str>) -> Vec<u8> {
        self.framed("HTTP/1.1 200 OK", body)
    }

    /// 405 response around an `{errorCode, errorInfo}` body. Used for
    /// protocol, stream and admin errors alike.
    pub fn error(&self, lang: &str, code: &str, detail: &str) -> Vec<u8> {
        let body = error_body(lang, code, detail);
        self.framed("HTTP/1.1 405 OK", Some(&body))
    }

    /// 405 response around the capture error envelope.
    pub fn capture_error(
        &self,
        spec_version: &str,
        lang: &str,
        code: &str,
        in_biometrics_envelope: bool,
        for_auth: bool,
    ) -> Vec<u8> {
        let body = capture_error_body(spec_version, lang, code, in_biometrics_envelope, for_auth);
        self.framed("HTTP/1.1 405 OK", Some(&body))
    }

    /// CORS preflight answer: no body, keep-alive.
    pub fn options(&self) -> Vec<u8> {
        let mut response = String::from("HTTP/1.1 200 OK\r\n");
        response.push_str(&self.cors_headers());
        response.push_str("CACHE-CONTROL: no-cache\r\n");
        response.push_str("Connection: Keep-Alive\r\n\r\n");
        response.into_bytes()
    }

    /// Header opening an MJPEG live stream.
    pub fn stream_header(&self) -> Vec<u8> {
        format!(
            "HTTP/1.0 200 OK\r\n\
             Server: http://{}:{}\r\n\
             Connection: close\r\n\
             Max-Age: 0\r\n\
             Expires: 0\r\n\
             Cache-Control: no-cache, private\r\n\
             Pragma: no-cache\r\n\
             Content-Type: multipart/x-mixed-replace; boundary=--BoundaryString\r\n\r\n",
            self.address, self.port
        )
        .into_bytes()
    }
}

/// One framed JPEG part of an MJPEG stream.
pub fn stream_frame(image: &[u8]) -> Vec<u8> {
    let header = format!(
        "--BoundaryString\r\nContent-Type:image/jpeg\r\nContent-Length:{}\r\n\r\n",
        image.len()
    );
    let mut frame = Vec::with_capacity(header.len() + image.len() + 4);
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(image);
    frame.extend_from_slice(b"\r\n\r\n");
    frame
}

/// Bare `{errorCode, errorInfo}` JSON body.
pub fn error_body(lang: &str, code: &str, detail: &str) -> String {
    let error = ErrorInfo {
        error_code: code.to_string(),
        error_info: format!("{} {}", error_description(lang, code), detail)
            .trim()
            .to_string(),
    };
    serde_json::to_string(&error).unwrap_or_else(|_| String::from("{}"))
}

/// Capture error body: either wrapped in the biometrics-array envelope or
/// flat with a `specVersion` field, depending on what the caller expects.
pub fn capture_error_body(
    spec_version: &str,
    lang: &str,
    code: &str,
    in_biometrics_envelope: bool,
    for_auth: bool,
) -> String {
    let error = ErrorInfo::from_catalog(lang, code);
    if in_biometrics_envelope {
        let entry = BiometricDto {
            spec_version: spec_version.to_string(),
            data: String::new(),
            hash: String::new(),
            session_key: for_auth.then(String::new),
            thumbprint: for_auth.then(String::new),
            error: Some(error),
        };
        serde_json::to_string(&CaptureResponse {
            biometrics: vec![entry],
        })
        .unwrap_or_else(|_| String::from("{}"))
    } else {
        serde_json::json!({
            "specVersion": spec_version,
            "errorCode": error.error_code,
            "errorInfo": error.error_info,
        })
        .to_string()
    }
}
