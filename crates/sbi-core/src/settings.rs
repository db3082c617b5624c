//! Service configuration.
//!
//! Settings are layered figment-style: compiled defaults, then
//! `MOCK_SBI_`-prefixed environment variables, then an optional TOML file.
//! Every field has a default so a bare checkout starts without any
//! configuration file.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{SbiError, SbiResult};

/// Top-level configuration for one mock service instance.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cors: CorsSettings,
    pub admin: AdminSettings,
    pub profile: ProfileSettings,
    pub seed: SeedSettings,
    pub keystore: KeystoreSettings,
    pub capture: CaptureSettings,
}

/// Listener configuration. The service binds the first free port in
/// `[min_port, max_port]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
    pub min_port: u16,
    pub max_port: u16,
    /// Admission-control permits: how many workers may run at once.
    pub max_connections: usize,
    /// Ceiling on reading one request; a client that never sends its full
    /// declared body gets an error response instead of a parked worker.
    pub read_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            min_port: 4501,
            max_port: 4600,
            max_connections: 5,
            read_timeout_ms: 30_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Methods advertised in Access-Control-Allow-Methods and accepted by
    /// the worker before dispatch.
    pub allowed_methods: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_methods: [
                "OPTIONS",
                "GET",
                "POST",
                "MOSIPDISC",
                "MOSIPDINFO",
                "CAPTURE",
                "RCAPTURE",
                "STREAM",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Admin endpoints that may be invoked at runtime. Calls to endpoints
    /// absent from this list produce an admin-error response.
    pub allowed: Vec<String>,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            allowed: ["status", "score", "delay", "profile"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Root directory holding one sub-directory of canned samples per
    /// profile id (or per 4-digit seed name under the Automatic profile).
    pub folder: PathBuf,
    pub default_profile: String,
    /// Directory holding per-device digital-id / device-info JSON blobs and
    /// stream images.
    pub device_config_dir: PathBuf,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("profiles"),
            default_profile: "Default".to_string(),
            device_config_dir: PathBuf::from("config/devices"),
        }
    }
}

/// Seed ranges for the Automatic profile. A capture derives a 4-digit
/// zero-padded directory name from the range matching its modality and
/// purpose, which selects the canned sample set to serve.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    pub auth_finger: u32,
    pub auth_iris: u32,
    pub auth_face: u32,
    pub registration_finger: u32,
    pub registration_iris: u32,
    pub registration_face: u32,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            auth_finger: 10,
            auth_iris: 10,
            auth_face: 10,
            registration_finger: 10,
            registration_iris: 10,
            registration_face: 10,
        }
    }
}

/// TLS and signing material. All paths optional: without cert/key the
/// listener speaks plaintext TCP, without signing material response
/// payloads are emitted unsigned.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeystoreSettings {
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub signing_key_path: Option<PathBuf>,
    pub signing_cert_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Static quality score reported when `score_from_iso` is off.
    pub quality_score: i32,
    /// Derive the captured score from the ISO payload via the codec
    /// collaborator instead of the static score.
    pub score_from_iso: bool,
    /// Sleep between capture poll iterations.
    pub poll_interval_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            quality_score: 40,
            score_from_iso: false,
            poll_interval_ms: 30,
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and the
    /// environment.
    pub fn load(config_path: Option<&Path>) -> SbiResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed("MOCK_SBI_").split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(SbiError::config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let settings: Settings = figment
            .extract()
            .map_err(|e| SbiError::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> SbiResult<()> {
        if self.server.min_port > self.server.max_port {
            return Err(SbiError::config(format!(
                "invalid port range {}-{}",
                self.server.min_port, self.server.max_port
            )));
        }
        if self.server.max_connections == 0 {
            return Err(SbiError::config("max_connections must be at least 1"));
        }
        match (
            &self.keystore.tls_cert_path,
            &self.keystore.tls_key_path,
        ) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(SbiError::config(
                    "TLS requires both tls_cert_path and tls_key_path",
                ))
            }
            _ => {}
        }
        Ok(())
    }

    /// Seed range for the given modality ("Finger"/"Iris"/"Face") and
    /// purpose.
    pub fn seed_range(&self, modality: &str, purpose: &str) -> u32 {
        let auth = purpose.eq_ignore_ascii_case(crate::constants::PURPOSE_AUTH);
        match (modality, auth) {
            (crate::constants::TYPE_FINGER, true) => self.seed.auth_finger,
            (crate::constants::TYPE_FINGER, false) => self.seed.registration_finger,
            (crate::constants::TYPE_IRIS, true) => self.seed.auth_iris,
            (crate::constants::TYPE_IRIS, false) => self.seed.registration_iris,
            (crate::constants::TYPE_FACE, true) => self.seed.auth_face,
            (crate::constants::TYPE_FACE, false) => self.seed.registration_face,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.min_port, 4501);
        assert_eq!(settings.capture.quality_score, 40);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nmin_port = 9000\nmax_port = 9010\n\n[capture]\nquality_score = 77"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server.min_port, 9000);
        assert_eq!(settings.capture.quality_score, 77);
        // Untouched sections keep their defaults.
        assert_eq!(settings.profile.default_profile, "Default");
    }

    #[test]
    fn inverted_port_range_is_rejected() {
        let mut settings = Settings::default();
        settings.server.min_port = 5000;
        settings.server.max_port = 4000;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn half_configured_tls_is_rejected() {
        let mut settings = Settings::default();
        settings.keystore.tls_cert_path = Some(PathBuf::from("cert.pem"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/mock-sbi.toml"))).is_err());
    }
}
