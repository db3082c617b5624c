//! The mock SBI service: listener lifecycle, device helper registry and
//! admin-mutable shared state.
//!
//! One `MockService` owns one listening socket. Connections are handled by
//! per-connection worker tasks; a counting semaphore acquired before each
//! worker is spawned bounds how many run at once, so excess connections
//! queue in the OS accept backlog instead of spawning unbounded tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, Notify, Semaphore};
use tracing::{debug, info, warn};

use sbi_core::settings::Settings;
use sbi_core::types::{validate_startup, BiometricType, ImageFormat, Purpose};
use sbi_core::{SbiError, SbiResult, Signer};
use sbi_device::{BioCodec, DeviceFamily, DeviceHelper, DeviceHelperConfig, StaticCodec};

use crate::response::ResponseBuilder;
use crate::tls;
use crate::worker;

/// Startup configuration for one service instance.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub purpose: Purpose,
    pub biometric_type: BiometricType,
    pub image_format: ImageFormat,
    pub settings: Settings,
}

/// Delay injection set through POST /admin/delay.
#[derive(Clone, Debug)]
pub struct DelayConfig {
    pub millis: u64,
    /// Verbs to delay; `None` delays every verb.
    pub methods: Option<Vec<String>>,
}

/// Admin-mutable shared state.
#[derive(Clone, Debug)]
pub struct SharedState {
    pub profile_id: String,
    pub quality_score: i32,
    pub score_from_iso: bool,
    pub delay: Option<DelayConfig>,
}

/// One running mock SBI device service.
pub struct MockService {
    config: ServiceConfig,
    state: RwLock<SharedState>,
    helpers: RwLock<HashMap<String, Arc<Mutex<DeviceHelper>>>>,
    port: AtomicU16,
    stopped: AtomicBool,
    shutdown: Notify,
    semaphore: Arc<Semaphore>,
    signer: Signer,
    codec: Arc<dyn BioCodec>,
}

impl MockService {
    pub fn new(config: ServiceConfig) -> SbiResult<Arc<Self>> {
        validate_startup(config.purpose, config.image_format)?;
        let settings = &config.settings;
        let signer = Signer::from_keystore(
            settings.keystore.signing_key_path.as_deref(),
            settings.keystore.signing_cert_path.as_deref(),
        )?;
        let codec: Arc<dyn BioCodec> = Arc::new(StaticCodec::new(settings.capture.quality_score));
        let state = SharedState {
            profile_id: settings.profile.default_profile.clone(),
            quality_score: settings.capture.quality_score,
            score_from_iso: settings.capture.score_from_iso,
            delay: None,
        };
        let semaphore = Arc::new(Semaphore::new(settings.server.max_connections));
        Ok(Arc::new(Self {
            state: RwLock::new(state),
            helpers: RwLock::new(HashMap::new()),
            port: AtomicU16::new(0),
            stopped: AtomicBool::new(false),
            shutdown: Notify::new(),
            semaphore,
            signer,
            codec,
            config,
        }))
    }

    /// Bind the first free port in the configured range. A range of `0..=0`
    /// binds an ephemeral port.
    pub async fn bind(&self) -> SbiResult<TcpListener> {
        let server = &self.config.settings.server;
        for port in server.min_port..=server.max_port {
            match TcpListener::bind((server.address.as_str(), port)).await {
                Ok(listener) => {
                    let bound = listener.local_addr()?.port();
                    self.port.store(bound, Ordering::SeqCst);
                    return Ok(listener);
                }
                Err(_) => continue,
            }
        }
        Err(SbiError::config(format!(
            "no free port in range {}-{} on {}",
            server.min_port, server.max_port, server.address
        )))
    }

    /// Instantiate every device helper applicable to the configured
    /// biometric type, keyed `"<Type>_<SubType>"`. Called once after the
    /// socket is bound; the registry is read-mostly afterwards.
    pub fn init_device_helpers(&self) {
        let port = self.port();
        let settings = &self.config.settings;
        let state = self.state.read().clone();
        let mut helpers = self.helpers.write();
        helpers.clear();
        for &family in DeviceFamily::for_biometric_type(self.config.biometric_type) {
            let helper_config = DeviceHelperConfig {
                family,
                port,
                purpose: self.config.purpose,
                image_format: self.config.image_format,
                profile_id: state.profile_id.clone(),
                quality_score: state.quality_score,
                score_from_iso: state.score_from_iso,
                auth_seed_range: settings.seed_range(family.device_type(), "Auth"),
                registration_seed_range: settings.seed_range(family.device_type(), "Registration"),
                server_address: settings.server.address.clone(),
                device_config_dir: settings.profile.device_config_dir.clone(),
                profile_root: settings.profile.folder.clone(),
            };
            let helper = DeviceHelper::new(helper_config, self.codec.clone(), self.signer.clone());
            helpers.insert(family.registry_key(), Arc::new(Mutex::new(helper)));
        }
        info!(count = helpers.len(), "device helpers initialized");
    }

    /// Deinitialize every helper. Called when the service stops.
    pub async fn deinit_device_helpers(&self) {
        let snapshot = self.helpers_snapshot();
        for (_, helper) in snapshot {
            helper.lock().await.deinit_device();
        }
    }

    /// Accept loop. Runs until [`MockService::stop`] is called.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> SbiResult<()> {
        let keystore = &self.config.settings.keystore;
        let acceptor = match (&keystore.tls_cert_path, &keystore.tls_key_path) {
            (Some(cert), Some(key)) => Some(tls::build_acceptor(cert, key)?),
            _ => None,
        };
        info!(
            port = self.port(),
            tls = acceptor.is_some(),
            purpose = %self.config.purpose,
            biometric_type = %self.config.biometric_type,
            "mock SBI service listening"
        );

        loop {
            if self.is_stopped() {
                break;
            }
            let (stream, peer) = tokio::select! {
                _ = self.shutdown.notified() => break,
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        if self.is_stopped() {
                            break;
                        }
                        warn!(error = %e, "error accepting client connection");
                        continue;
                    }
                },
            };
            // Admission control: take a permit before spawning the worker.
            // While the pool is exhausted this loop parks here and new
            // connections queue in the OS backlog.
            let permit = tokio::select! {
                _ = self.shutdown.notified() => break,
                permit = self.semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            debug!(%peer, "connection accepted");
            let service = self.clone();
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let _permit = permit;
                match acceptor {
                    Some(acceptor) => match acceptor.accept(stream).await {
                        Ok(tls_stream) => worker::handle(service, tls_stream).await,
                        Err(e) => warn!(error = %e, "TLS handshake failed"),
                    },
                    None => worker::handle(service, stream).await,
                }
            });
        }

        self.deinit_device_helpers().await;
        info!(port = self.port(), "mock SBI service stopped");
        Ok(())
    }

    /// Signal the accept loop to exit. In-flight workers finish their
    /// current request/response cycle.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
        self.shutdown.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    pub fn purpose(&self) -> Purpose {
        self.config.purpose
    }

    pub fn image_format(&self) -> ImageFormat {
        self.config.image_format
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn get_device_helper(&self, key: &str) -> Option<Arc<Mutex<DeviceHelper>>> {
        self.helpers.read().get(key).cloned()
    }

    /// Stable-ordered snapshot of the helper registry.
    pub fn helpers_snapshot(&self) -> Vec<(String, Arc<Mutex<DeviceHelper>>)> {
        let mut snapshot: Vec<_> = self
            .helpers
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// Resolve the helper advertising the given device id.
    pub async fn find_helper_by_device_id(
        &self,
        device_id: &str,
    ) -> Option<Arc<Mutex<DeviceHelper>>> {
        for (_, helper) in self.helpers_snapshot() {
            let matches = {
                let guard = helper.lock().await;
                guard
                    .device_info()
                    .map(|info| info.device_id.trim() == device_id.trim())
                    .unwrap_or(false)
            };
            if matches {
                return Some(helper);
            }
        }
        None
    }

    pub fn shared_state(&self) -> SharedState {
        self.state.read().clone()
    }

    pub fn set_profile_id(&self, profile_id: impl Into<String>) {
        self.state.write().profile_id = profile_id.into();
    }

    pub fn set_score(&self, quality_score: i32, from_iso: bool) {
        let mut state = self.state.write();
        state.quality_score = quality_score;
        state.score_from_iso = from_iso;
    }

    pub fn set_delay(&self, delay: Option<DelayConfig>) {
        self.state.write().delay = delay;
    }

    /// Delay to inject before answering the given verb, if configured.
    pub fn delay_for(&self, method: &str) -> Option<Duration> {
        let state = self.state.read();
        let delay = state.delay.as_ref()?;
        let applies = match &delay.methods {
            None => true,
            Some(methods) => methods.iter().any(|m| m.eq_ignore_ascii_case(method)),
        };
        applies.then(|| Duration::from_millis(delay.millis))
    }

    pub fn cors_allows(&self, method: &str) -> bool {
        !method.is_empty()
            && self
                .config
                .settings
                .cors
                .allowed_methods
                .iter()
                .any(|m| m == method)
    }

    pub fn response_builder(&self) -> ResponseBuilder {
        ResponseBuilder::new(
            self.config.settings.server.address.clone(),
            self.port(),
            &self.config.settings.cors.allowed_methods,
        )
    }

    pub fn admin_allowed(&self, endpoint: &str) -> bool {
        self.config
            .settings
            .admin
            .allowed
            .iter()
            .any(|e| e.eq_ignore_ascii_case(endpoint))
    }
}
