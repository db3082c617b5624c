//! Line-oriented pseudo-HTTP request parser.
//!
//! The wire format is HTTP-shaped but not HTTP: the request line carries a
//! proprietary verb (`MOSIPDISC /device HTTP/1.1`), headers follow until a
//! blank line, and `Content-Length` bytes of JSON body close the request.
//! The first three tokens of the request line — method, path, and the
//! protocol marker up to its slash — form the verb key, compared
//! case-sensitively against the known verbs.
//!
//! Malformed input never surfaces as a panic: unknown verbs and empty
//! request lines come back as sentinel variants for the worker to classify,
//! and only socket-level failures (including a body shorter than the
//! declared length) produce an error.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use sbi_core::{constants, SbiError, SbiResult};

/// Decoded verb of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestVerb {
    Discover,
    DeviceInfo,
    Capture,
    RCapture,
    Stream,
    AdminStatus,
    AdminScore,
    AdminDelay,
    AdminProfile,
    Options,
    /// Verb key matched none of the known constants.
    Unrecognized(String),
    /// The request line was empty or whitespace.
    Empty,
}

impl RequestVerb {
    fn from_verb_key(key: &str, method: &str) -> RequestVerb {
        // OPTIONS preflights arrive for any path.
        if method == "OPTIONS" {
            return RequestVerb::Options;
        }
        match key {
            constants::VERB_DISCOVER => RequestVerb::Discover,
            constants::VERB_DEVICE_INFO => RequestVerb::DeviceInfo,
            constants::VERB_CAPTURE => RequestVerb::Capture,
            constants::VERB_RCAPTURE => RequestVerb::RCapture,
            constants::VERB_STREAM => RequestVerb::Stream,
            constants::VERB_ADMIN_STATUS => RequestVerb::AdminStatus,
            constants::VERB_ADMIN_SCORE => RequestVerb::AdminScore,
            constants::VERB_ADMIN_DELAY => RequestVerb::AdminDelay,
            constants::VERB_ADMIN_PROFILE => RequestVerb::AdminProfile,
            _ => RequestVerb::Unrecognized(key.to_string()),
        }
    }

    /// Transport method token, checked against the CORS allow-list and the
    /// JSON-declared method.
    pub fn method_name(&self) -> &str {
        match self {
            RequestVerb::Discover => "MOSIPDISC",
            RequestVerb::DeviceInfo => "MOSIPDINFO",
            RequestVerb::Capture => "CAPTURE",
            RequestVerb::RCapture => "RCAPTURE",
            RequestVerb::Stream => "STREAM",
            RequestVerb::AdminStatus
            | RequestVerb::AdminScore
            | RequestVerb::AdminDelay
            | RequestVerb::AdminProfile => "POST",
            RequestVerb::Options => "OPTIONS",
            RequestVerb::Unrecognized(key) => key.split(' ').next().unwrap_or(""),
            RequestVerb::Empty => "",
        }
    }
}

/// One fully read request.
#[derive(Debug)]
pub struct ParsedRequest {
    pub verb: RequestVerb,
    pub body: Option<String>,
}

/// Read one request from a freshly accepted connection.
pub async fn read_request<R>(reader: &mut R) -> SbiResult<ParsedRequest>
where
    R: AsyncBufRead + Unpin,
{
    let mut request_line = String::new();
    let read = reader.read_line(&mut request_line).await?;
    if read == 0 {
        return Err(SbiError::protocol("connection closed before request line"));
    }
    let request_line = request_line.trim_end_matches(['\r', '\n']);
    if request_line.trim().is_empty() {
        return Ok(ParsedRequest {
            verb: RequestVerb::Empty,
            body: None,
        });
    }

    let verb = parse_verb(request_line);
    let content_length = read_headers(reader).await?;

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).await.map_err(|e| {
            SbiError::protocol(format!(
                "body shorter than declared Content-Length {content_length}: {e}"
            ))
        })?;
        Some(String::from_utf8_lossy(&buf).into_owned())
    } else {
        None
    };

    Ok(ParsedRequest { verb, body })
}

fn parse_verb(request_line: &str) -> RequestVerb {
    let mut tokens = request_line.split_whitespace();
    let (Some(method), Some(path), Some(protocol)) =
        (tokens.next(), tokens.next(), tokens.next())
    else {
        return RequestVerb::Unrecognized(request_line.trim().to_string());
    };
    // "HTTP/1.1" contributes only its protocol marker to the key.
    let marker = protocol.split('/').next().unwrap_or(protocol);
    let key = format!("{method} {path} {marker}");
    RequestVerb::from_verb_key(&key, method)
}

/// Consume header lines until the blank separator, extracting
/// `Content-Length`. An absent or non-numeric value is treated as zero.
async fn read_headers<R>(reader: &mut R) -> SbiResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            // EOF inside the header block; no body can follow.
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    Ok(content_length)
}
