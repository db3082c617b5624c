//! Mock SBI device simulator binary.
//!
//! Startup options arrive as `key=value` pairs, matching the historical
//! launcher surface:
//!
//! ```bash
//! mock-sbi purpose=Registration biometricType="Biometric Device" imageType=JP2000
//! ```
//!
//! An invalid purpose/type/format combination aborts startup before any
//! listener is opened.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sbi_core::settings::Settings;
use sbi_core::types::{BiometricType, ImageFormat, Purpose};
use sbi_service::{MockService, ServiceConfig};

#[derive(Parser)]
#[command(name = "mock-sbi")]
#[command(about = "Mock SBI biometric device simulator", long_about = None)]
struct Cli {
    /// Optional TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Startup options as key=value pairs: purpose=Registration|Auth,
    /// biometricType="Biometric Device"|Finger|Face|Iris,
    /// imageType=JP2000|WSQ.
    options: Vec<String>,
}

struct StartupOptions {
    purpose: Purpose,
    biometric_type: BiometricType,
    image_format: ImageFormat,
}

fn parse_options(pairs: &[String]) -> Result<StartupOptions> {
    let mut purpose = Purpose::Registration;
    let mut biometric_type = BiometricType::BiometricDevice;
    let mut image_format = ImageFormat::Jp2000;

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid option {pair:?}, expected key=value");
        };
        match key.trim() {
            "purpose" => purpose = value.parse()?,
            "biometricType" => biometric_type = value.parse()?,
            "imageType" => image_format = value.parse()?,
            other => bail!("unknown option key {other:?}"),
        }
    }

    Ok(StartupOptions {
        purpose,
        biometric_type,
        image_format,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = parse_options(&cli.options)?;
    let settings =
        Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    let config = ServiceConfig {
        purpose: options.purpose,
        biometric_type: options.biometric_type,
        image_format: options.image_format,
        settings,
    };

    let service = MockService::new(config).context("failed to start mock SBI service")?;
    let listener = service.bind().await.context("failed to bind listener")?;
    service.init_device_helpers();
    info!(port = service.port(), "mock SBI device simulator started");

    let serving = service.clone();
    let server = tokio::spawn(async move { serving.serve(listener).await });

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("shutting down");
    service.stop();
    server.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_pairs_select_the_startup_options() {
        let options = parse_options(&[
            "purpose=Auth".to_string(),
            "biometricType=Finger".to_string(),
            "imageType=WSQ".to_string(),
        ])
        .unwrap();
        assert_eq!(options.purpose, Purpose::Auth);
        assert_eq!(options.biometric_type, BiometricType::Finger);
        assert_eq!(options.image_format, ImageFormat::Wsq);
    }

    #[test]
    fn defaults_apply_when_no_options_are_given() {
        let options = parse_options(&[]).unwrap();
        assert_eq!(options.purpose, Purpose::Registration);
        assert_eq!(options.biometric_type, BiometricType::BiometricDevice);
        assert_eq!(options.image_format, ImageFormat::Jp2000);
    }

    #[test]
    fn malformed_pairs_and_unknown_keys_abort() {
        assert!(parse_options(&["purpose".to_string()]).is_err());
        assert!(parse_options(&["color=blue".to_string()]).is_err());
        assert!(parse_options(&["purpose=Blank".to_string()]).is_err());
    }
}
