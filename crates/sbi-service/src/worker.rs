//! Per-connection request handling.
//!
//! One worker runs per accepted connection: read the request, dispatch on
//! the verb, drive the device helpers, frame the reply, close. The worker
//! converts every failure into a framed error response; nothing unwinds
//! past [`handle`] and the client connection is never left hanging.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use sbi_core::constants;
use sbi_core::dto::{
    BiometricDataDto, BiometricDto, CaptureRequest, CaptureResponse, DelayRequest, DeviceInfoDto,
    DiscoverDto, DiscoverRequest, ErrorInfo, MethodEnvelope, ProfileRequest, ScoreRequest,
    StatusRequest, StreamRequest,
};
use sbi_core::types::Purpose;
use sbi_core::util::{chain_hash, iso8601_timestamp};
use sbi_core::SbiResult;
use sbi_device::{DeviceFamily, DeviceHelper, SlotId};

use crate::parser::{read_request, ParsedRequest, RequestVerb};
use crate::response::{stream_frame, ResponseBuilder};
use crate::service::{DelayConfig, MockService};

const LANG: &str = "en";

/// Handle one connection end-to-end. Never returns an error: failures are
/// reported to the client as framed responses and logged.
pub async fn handle<S>(service: Arc<MockService>, stream: S)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let builder = service.response_builder();

    let read_timeout = Duration::from_millis(service.settings().server.read_timeout_ms.max(1));
    let request = match timeout(read_timeout, read_request(&mut reader)).await {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            debug!(error = %e, "malformed request");
            let _ = writer.write_all(&builder.error(LANG, "999", "")).await;
            let _ = writer.shutdown().await;
            return;
        }
        Err(_) => {
            debug!("request read timed out");
            let _ = writer.write_all(&builder.error(LANG, "501", "")).await;
            let _ = writer.shutdown().await;
            return;
        }
    };

    if let Err(e) = dispatch(&service, &builder, request, &mut writer).await {
        warn!(error = %e, "request handling failed");
        let _ = writer.write_all(&builder.error(LANG, "999", "")).await;
    }
    let _ = writer.shutdown().await;
}

async fn dispatch<W>(
    service: &Arc<MockService>,
    builder: &ResponseBuilder,
    request: ParsedRequest,
    writer: &mut W,
) -> SbiResult<()>
where
    W: AsyncWrite + Unpin,
{
    let method = request.verb.method_name().to_string();

    // Admin-configured delay injection, used to simulate slow devices.
    if let Some(delay) = service.delay_for(&method) {
        sleep(delay).await;
    }

    if !service.cors_allows(&method) {
        writer.write_all(&builder.error(LANG, "500", "")).await?;
        return Ok(());
    }

    // The JSON-declared method must agree with the transport verb.
    if let Some(body) = &request.body {
        if let Ok(envelope) = serde_json::from_str::<MethodEnvelope>(body) {
            if let Some(declared) = envelope.method {
                let declared = declared.trim();
                if !declared.is_empty() && !declared.eq_ignore_ascii_case(&method) {
                    writer
                        .write_all(&builder.error(
                            LANG,
                            "500",
                            "declared method does not match request verb",
                        ))
                        .await?;
                    return Ok(());
                }
            }
        }
    }

    match request.verb {
        RequestVerb::Options => writer.write_all(&builder.options()).await?,
        RequestVerb::Discover => {
            let body = discover(service, request.body.as_deref()).await?;
            writer.write_all(&builder.success(Some(&body))).await?;
        }
        RequestVerb::DeviceInfo => {
            let body = device_info(service).await?;
            writer.write_all(&builder.success(Some(&body))).await?;
        }
        RequestVerb::RCapture => {
            capture(service, builder, writer, request.body.as_deref(), false).await?;
        }
        RequestVerb::Capture => {
            capture(service, builder, writer, request.body.as_deref(), true).await?;
        }
        RequestVerb::Stream => {
            stream(service, builder, writer, request.body.as_deref()).await?;
        }
        RequestVerb::AdminStatus => {
            admin(service, builder, writer, constants::ADMIN_STATUS, request.body.as_deref())
                .await?;
        }
        RequestVerb::AdminScore => {
            admin(service, builder, writer, constants::ADMIN_SCORE, request.body.as_deref())
                .await?;
        }
        RequestVerb::AdminDelay => {
            admin(service, builder, writer, constants::ADMIN_DELAY, request.body.as_deref())
                .await?;
        }
        RequestVerb::AdminProfile => {
            admin(service, builder, writer, constants::ADMIN_PROFILE, request.body.as_deref())
                .await?;
        }
        RequestVerb::Unrecognized(_) | RequestVerb::Empty => {
            writer.write_all(&builder.error(LANG, "500", "")).await?;
        }
    }
    Ok(())
}

// -------------------------------------------------------------------------
// Discovery / device info
// -------------------------------------------------------------------------

async fn discover(service: &Arc<MockService>, body: Option<&str>) -> SbiResult<String> {
    let request: DiscoverRequest = body
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or_default();
    let requested = request.device_type.unwrap_or_default().trim().to_string();

    if requested.is_empty() {
        return Ok(serde_json::to_string(&vec![DiscoverDto::error_entry(
            LANG, "502",
        )])?);
    }
    let known = [
        constants::TYPE_BIOMETRIC_DEVICE,
        constants::TYPE_FINGER,
        constants::TYPE_FACE,
        constants::TYPE_IRIS,
    ];
    if !known.iter().any(|t| t.eq_ignore_ascii_case(&requested)) {
        return Ok(serde_json::to_string(&vec![DiscoverDto::error_entry(
            LANG, "502",
        )])?);
    }

    let composite = requested.eq_ignore_ascii_case(constants::TYPE_BIOMETRIC_DEVICE);
    let mut entries: Vec<DiscoverDto> = Vec::new();
    for (_, helper) in service.helpers_snapshot() {
        let mut guard = helper.lock().await;
        if composite || guard.family().device_type().eq_ignore_ascii_case(&requested) {
            guard.init_device_details();
            if let Some(entry) = guard.discover_dto() {
                entries.push(entry.clone());
            }
        }
    }
    if entries.is_empty() {
        entries.push(DiscoverDto::error_entry(LANG, "503"));
    }
    Ok(serde_json::to_string(&entries)?)
}

async fn device_info(service: &Arc<MockService>) -> SbiResult<String> {
    let mut entries: Vec<DeviceInfoDto> = Vec::new();
    for (_, helper) in service.helpers_snapshot() {
        let mut guard = helper.lock().await;
        guard.init_device_details();
        if let Some(dto) = guard.device_info_dto() {
            entries.push(dto.clone());
        }
    }
    if entries.is_empty() {
        entries.push(DeviceInfoDto {
            device_info: None,
            error: Some(ErrorInfo::from_catalog(LANG, "503")),
        });
    }
    Ok(serde_json::to_string(&entries)?)
}

// -------------------------------------------------------------------------
// Capture
// -------------------------------------------------------------------------

async fn capture<W>(
    service: &Arc<MockService>,
    builder: &ResponseBuilder,
    writer: &mut W,
    body: Option<&str>,
    for_auth: bool,
) -> SbiResult<()>
where
    W: AsyncWrite + Unpin,
{
    let request: CaptureRequest = match body.map(serde_json::from_str) {
        Some(Ok(request)) => request,
        _ => {
            writer
                .write_all(&builder.capture_error(
                    constants::SPEC_VERSION,
                    LANG,
                    "710",
                    true,
                    for_auth,
                ))
                .await?;
            return Ok(());
        }
    };
    let spec_version = request
        .spec_version
        .clone()
        .unwrap_or_else(|| constants::SPEC_VERSION.to_string());

    // Envelope validation happens before any device interaction.
    if let Err(field) = request.validate(!for_auth) {
        debug!(field, "capture request validation failed");
        writer
            .write_all(&builder.capture_error(&spec_version, LANG, "707", true, for_auth))
            .await?;
        return Ok(());
    }

    // The verb must match the device purpose: RCAPTURE drives registration
    // devices, CAPTURE drives auth devices.
    let purpose_matches = match service.purpose() {
        Purpose::Registration => !for_auth,
        Purpose::Auth => for_auth,
    };
    if !purpose_matches {
        writer
            .write_all(&builder.capture_error(&spec_version, LANG, "706", true, for_auth))
            .await?;
        return Ok(());
    }

    let bio0 = &request.bio[0];
    let device_id = bio0.device_id.clone().unwrap_or_default();
    if device_id.trim().is_empty() {
        writer
            .write_all(&builder.capture_error(&spec_version, LANG, "704", true, for_auth))
            .await?;
        return Ok(());
    }
    let Some(helper) = service.find_helper_by_device_id(&device_id).await else {
        writer
            .write_all(&builder.capture_error(&spec_version, LANG, "705", true, for_auth))
            .await?;
        return Ok(());
    };
    let sub_id = bio0.device_sub_id.unwrap_or(0) as i32;

    // Admission to the device under the per-helper lock.
    {
        let mut guard = helper.lock().await;
        let status = guard.device_status().to_string();
        if status == constants::DEVICE_STATUS_READY {
            guard.init_device();
            guard.set_device_id(device_id.trim());
            guard.set_device_sub_id(sub_id);
            guard.set_device_status(constants::DEVICE_STATUS_BUSY);
        } else if status == constants::DEVICE_STATUS_BUSY {
            if guard
                .capture_info()
                .map_or(false, |c| c.capture_started)
            {
                writer
                    .write_all(&builder.capture_error(&spec_version, LANG, "703", true, for_auth))
                    .await?;
                return Ok(());
            }
            if guard.device_id() != device_id.trim() || guard.device_sub_id() != sub_id {
                writer
                    .write_all(&builder.capture_error(&spec_version, LANG, "702", true, for_auth))
                    .await?;
                return Ok(());
            }
        } else {
            writer
                .write_all(&builder.capture_error(&spec_version, LANG, "710", true, for_auth))
                .await?;
            return Ok(());
        }

        // Snapshot the admin-mutable configuration onto the helper.
        let state = service.shared_state();
        guard.set_profile_id(state.profile_id);
        guard.set_quality_score(state.quality_score);
        guard.set_score_from_iso(state.score_from_iso);

        if guard.family().supports_exceptions() {
            if let Some(exceptions) = &bio0.exception {
                if let Some(capture) = guard.capture_info_mut() {
                    capture.exceptions.init(exceptions);
                }
            }
        }
        if let Some(capture) = guard.capture_info_mut() {
            capture.requested_score = bio0.requested_score.unwrap_or(0) as i32;
            capture.capture_started = true;
        }
    }

    // Poll until completion or the caller-supplied timeout elapses. The
    // helper lock is held per iteration only.
    let timeout_ms = request.timeout.unwrap_or(0).max(0) as u64;
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let poll_interval =
        Duration::from_millis(service.settings().capture.poll_interval_ms.max(1));
    let mut timed_out = false;
    let mut stream_ended = false;
    loop {
        if Instant::now() >= deadline {
            timed_out = true;
            break;
        }
        {
            let mut guard = helper.lock().await;
            if guard.capture_info().is_none() {
                stream_ended = true;
                break;
            }
            if let Err(e) = guard.get_bio_capture(for_auth) {
                warn!(error = %e, "bio capture failed");
                guard.deinit_device();
                guard.set_device_status(constants::DEVICE_STATUS_READY);
                writer
                    .write_all(&builder.capture_error(&spec_version, LANG, "710", true, for_auth))
                    .await?;
                return Ok(());
            }
            if guard.capture_info().map_or(false, |c| c.capture_completed) {
                break;
            }
        }
        sleep(poll_interval).await;
    }

    if stream_ended {
        writer
            .write_all(&builder.capture_error(&spec_version, LANG, "700", true, for_auth))
            .await?;
        return Ok(());
    }
    if timed_out {
        debug!("capture timed out, returning partial results");
    }

    // Assemble whatever was captured; uncaptured non-excepted slots become
    // per-entry timeout errors.
    let response_body = {
        let mut guard = helper.lock().await;
        let biometrics = assemble_biometrics(&guard, &request, &spec_version, for_auth)?;

        if let Some(capture) = guard.capture_info_mut() {
            capture.exceptions.clear();
        }
        let live = guard
            .capture_info()
            .map_or(false, |c| c.live_stream_started);
        if live {
            // The live stream owns the capture session; leave it running.
            if let Some(capture) = guard.capture_info_mut() {
                capture.capture_started = false;
                capture.capture_completed = true;
            }
        } else {
            guard.deinit_device();
            guard.set_device_status(constants::DEVICE_STATUS_READY);
        }

        if biometrics.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&CaptureResponse { biometrics })?)
        }
    };

    match response_body {
        Some(body) => writer.write_all(&builder.success(Some(&body))).await?,
        None => {
            writer
                .write_all(&builder.capture_error(&spec_version, LANG, "708", true, for_auth))
                .await?;
        }
    }
    Ok(())
}

/// Build the biometrics array for a capture response: one signed entry per
/// filled slot, one 701 error entry per requested-but-unfilled slot, and
/// nothing at all for excepted slots.
fn assemble_biometrics(
    helper: &DeviceHelper,
    request: &CaptureRequest,
    spec_version: &str,
    for_auth: bool,
) -> SbiResult<Vec<BiometricDto>> {
    let Some(capture) = helper.capture_info() else {
        return Ok(Vec::new());
    };
    let bio0 = &request.bio[0];
    let family = helper.family();

    // Face devices serve either the face sample or the exception photo,
    // depending on whether the caller flagged missing body parts.
    let slots: Vec<SlotId> = if family == DeviceFamily::Face {
        let exception_photo = bio0.exception.as_ref().map_or(false, |e| !e.is_empty());
        if exception_photo {
            vec![SlotId::ExceptionPhoto]
        } else {
            vec![SlotId::Face]
        }
    } else {
        family.slots(helper.device_sub_id()).to_vec()
    };

    let mut previous_hash = bio0
        .previous_hash
        .clone()
        .unwrap_or_default()
        .trim()
        .to_string();
    let mut biometrics = Vec::new();

    for slot in slots {
        if family.supports_exceptions() && capture.exceptions.is_checked(slot) {
            continue;
        }
        let state = capture.slot(slot);
        match state.and_then(|s| s.bio_value.clone()) {
            Some(bio_value) => {
                let Some(device_info) = helper.device_info() else {
                    continue;
                };
                let data = BiometricDataDto {
                    digital_id: device_info.digital_id.clone(),
                    device_code: device_info.device_code.clone(),
                    device_service_version: device_info.service_version.clone(),
                    bio_type: bio0
                        .bio_type
                        .clone()
                        .unwrap_or_else(|| slot.modality().to_string()),
                    bio_sub_type: slot.bio_sub_type().map(str::to_string),
                    purpose: request.purpose.clone().unwrap_or_default(),
                    env: request.env.clone().unwrap_or_default(),
                    domain_uri: for_auth
                        .then(|| request.domain_uri.clone().unwrap_or_default()),
                    bio_value: Some(bio_value),
                    transaction_id: request.transaction_id.clone(),
                    timestamp: iso8601_timestamp(),
                    requested_score: bio0.requested_score.unwrap_or(0).to_string(),
                    quality_score: state.map(|s| s.captured_score).unwrap_or(0).to_string(),
                };
                let payload = serde_json::to_vec(&data)?;
                let signed = helper.sign_payload(&payload)?;
                let hash = chain_hash(&previous_hash, &payload);
                previous_hash = hash.clone();
                biometrics.push(BiometricDto {
                    spec_version: spec_version.to_string(),
                    data: signed,
                    hash,
                    session_key: for_auth.then(String::new),
                    thumbprint: for_auth.then(String::new),
                    error: Some(ErrorInfo::from_catalog(LANG, "100")),
                });
            }
            None => {
                // Slot requested but never filled within the timeout.
                biometrics.push(BiometricDto {
                    spec_version: spec_version.to_string(),
                    data: String::new(),
                    hash: String::new(),
                    session_key: for_auth.then(String::new),
                    thumbprint: for_auth.then(String::new),
                    error: Some(ErrorInfo::from_catalog(LANG, "701")),
                });
                previous_hash = String::new();
            }
        }
    }
    Ok(biometrics)
}

// -------------------------------------------------------------------------
// Live stream
// -------------------------------------------------------------------------

async fn stream<W>(
    service: &Arc<MockService>,
    builder: &ResponseBuilder,
    writer: &mut W,
    body: Option<&str>,
) -> SbiResult<()>
where
    W: AsyncWrite + Unpin,
{
    let request: StreamRequest = match body.map(serde_json::from_str) {
        Some(Ok(request)) => request,
        _ => {
            writer.write_all(&builder.error(LANG, "610", "")).await?;
            return Ok(());
        }
    };
    let device_id = request.device_id.unwrap_or_default();
    if device_id.trim().is_empty() {
        writer.write_all(&builder.error(LANG, "604", "")).await?;
        return Ok(());
    }
    if service.purpose() != Purpose::Registration {
        writer.write_all(&builder.error(LANG, "606", "")).await?;
        return Ok(());
    }
    let Some(helper) = service.find_helper_by_device_id(&device_id).await else {
        writer.write_all(&builder.error(LANG, "605", "")).await?;
        return Ok(());
    };

    {
        let mut guard = helper.lock().await;
        if guard.device_status() != constants::DEVICE_STATUS_READY {
            writer.write_all(&builder.error(LANG, "607", "")).await?;
            return Ok(());
        }
        guard.set_device_status(constants::DEVICE_STATUS_BUSY);
        guard.init_device();
        guard.set_device_id(device_id.trim());
        guard.set_device_sub_id(request.device_sub_id as i32);
        if let Some(capture) = guard.capture_info_mut() {
            capture.live_stream_started = true;
        }
    }

    writer.write_all(&builder.stream_header()).await?;

    let deadline = request
        .timeout
        .map(|t| Instant::now() + Duration::from_millis(t.max(0) as u64));
    loop {
        let frame = {
            let mut guard = helper.lock().await;
            if guard.capture_info().is_none() {
                break;
            }
            match guard.get_live_stream() {
                Ok(true) => guard.capture_info().and_then(|c| c.image.clone()),
                Ok(false) => break,
                Err(e) => {
                    warn!(error = %e, "live stream read failed");
                    break;
                }
            }
        };
        if let Some(image) = frame {
            // A write failure means the client disconnected.
            if writer.write_all(&stream_frame(&image)).await.is_err() {
                break;
            }
        }
        if deadline.map_or(false, |d| Instant::now() >= d) {
            break;
        }
        sleep(Duration::from_millis(30)).await;
    }

    {
        let mut guard = helper.lock().await;
        if guard.capture_info().is_some() {
            guard.deinit_device();
            guard.set_device_status(constants::DEVICE_STATUS_READY);
        }
    }
    // Best effort: the client has usually gone away by now.
    let _ = writer.write_all(&builder.error(LANG, "608", "")).await;
    Ok(())
}

// -------------------------------------------------------------------------
// Admin endpoints
// -------------------------------------------------------------------------

async fn admin<W>(
    service: &Arc<MockService>,
    builder: &ResponseBuilder,
    writer: &mut W,
    endpoint: &str,
    body: Option<&str>,
) -> SbiResult<()>
where
    W: AsyncWrite + Unpin,
{
    if !service.admin_allowed(endpoint) {
        debug!(endpoint, "admin endpoint not in allow-list");
        writer.write_all(&builder.error(LANG, "709", "")).await?;
        return Ok(());
    }

    let applied = match endpoint {
        constants::ADMIN_STATUS => admin_status(service, body).await,
        constants::ADMIN_SCORE => admin_score(service, body),
        constants::ADMIN_DELAY => admin_delay(service, body),
        constants::ADMIN_PROFILE => admin_profile(service, body),
        _ => false,
    };
    if !applied {
        writer.write_all(&builder.error(LANG, "751", "")).await?;
        return Ok(());
    }

    let body = serde_json::to_string(&ErrorInfo::from_catalog(LANG, "0"))?;
    writer.write_all(&builder.success(Some(&body))).await?;
    Ok(())
}

async fn admin_status(service: &Arc<MockService>, body: Option<&str>) -> bool {
    let request: StatusRequest = body
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or_default();
    let Some(status) = request.device_status else {
        return false;
    };
    let status = status.trim().to_string();
    let known = [
        constants::DEVICE_STATUS_READY,
        constants::DEVICE_STATUS_BUSY,
        constants::DEVICE_STATUS_NOT_READY,
        constants::DEVICE_STATUS_NOT_REGISTERED,
    ];
    if !known.contains(&status.as_str()) {
        return false;
    }
    let requested_type = request.device_type.unwrap_or_default();
    let requested_type = requested_type.trim();
    let all = requested_type.is_empty()
        || requested_type.eq_ignore_ascii_case(constants::TYPE_BIOMETRIC_DEVICE);
    for (_, helper) in service.helpers_snapshot() {
        let mut guard = helper.lock().await;
        if all
            || guard
                .family()
                .device_type()
                .eq_ignore_ascii_case(requested_type)
        {
            guard.set_device_status(status.clone());
        }
    }
    true
}

fn admin_score(service: &Arc<MockService>, body: Option<&str>) -> bool {
    let request: ScoreRequest = body
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or_default();
    match (request.quality_score, request.from_iso) {
        (Some(score), from_iso) if (0..=100).contains(&score) => {
            service.set_score(score as i32, from_iso);
            true
        }
        (None, true) => {
            let current = service.shared_state().quality_score;
            service.set_score(current, true);
            true
        }
        _ => false,
    }
}

fn admin_delay(service: &Arc<MockService>, body: Option<&str>) -> bool {
    let request: DelayRequest = body
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or_default();
    match request.delay {
        Some(delay) if delay >= 0 => {
            service.set_delay(Some(DelayConfig {
                millis: delay as u64,
                methods: request.method,
            }));
            true
        }
        Some(_) => false,
        // Absent delay clears any configured injection.
        None => {
            service.set_delay(None);
            true
        }
    }
}

fn admin_profile(service: &Arc<MockService>, body: Option<&str>) -> bool {
    let request: ProfileRequest = body
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or_default();
    match request.profile_id {
        Some(profile) if !profile.trim().is_empty() => {
            service.set_profile_id(profile.trim());
        }
        _ => {
            let default = service.settings().profile.default_profile.clone();
            service.set_profile_id(default);
        }
    }
    true
}
