use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shared::{
    domain::{
        ConnectionEndpoint, Scheme, CONTROL_PATH, DEFAULT_CONTROLLER_PORT, NETWORK_PATH,
    },
    error::EndpointError,
    protocol::{TuneCommand, DEFAULT_WAVELENGTH_NM, DEFAULT_WAVELENGTH_STEP_NM},
};

pub const DEFAULT_CONFIG_PATH: &str = "controller.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub controller_host: String,
    pub controller_port: u16,
    pub control_path: String,
    pub network_path: String,
    pub wavelength_nm: f64,
    pub wavelength_step_nm: f64,
    pub remote_ip_address: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            controller_host: "127.0.0.1".into(),
            controller_port: DEFAULT_CONTROLLER_PORT,
            control_path: CONTROL_PATH.into(),
            network_path: NETWORK_PATH.into(),
            wavelength_nm: DEFAULT_WAVELENGTH_NM,
            wavelength_step_nm: DEFAULT_WAVELENGTH_STEP_NM,
            remote_ip_address: None,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    controller_host: Option<String>,
    controller_port: Option<u16>,
    control_path: Option<String>,
    network_path: Option<String>,
    wavelength_nm: Option<f64>,
    wavelength_step_nm: Option<f64>,
    remote_ip_address: Option<String>,
    log_filter: Option<String>,
}

impl Settings {
    pub fn control_endpoint(&self) -> Result<ConnectionEndpoint, EndpointError> {
        ConnectionEndpoint::new(
            Scheme::Ws,
            &self.controller_host,
            self.controller_port,
            &self.control_path,
        )
    }

    pub fn network_endpoint(&self) -> Result<ConnectionEndpoint, EndpointError> {
        ConnectionEndpoint::new(
            Scheme::Ws,
            &self.controller_host,
            self.controller_port,
            &self.network_path,
        )
    }

    /// Builds the open-time command. Both numbers must be finite and non-negative.
    pub fn tune_command(&self) -> anyhow::Result<TuneCommand> {
        let wavelength_nm = check_tune_value("wavelength_nm", self.wavelength_nm)?;
        let wavelength_step_nm = check_tune_value("wavelength_step_nm", self.wavelength_step_nm)?;
        Ok(TuneCommand::new(wavelength_nm, wavelength_step_nm))
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.controller_host {
            self.controller_host = v;
        }
        if let Some(v) = file.controller_port {
            self.controller_port = v;
        }
        if let Some(v) = file.control_path {
            self.control_path = v;
        }
        if let Some(v) = file.network_path {
            self.network_path = v;
        }
        if let Some(v) = file.wavelength_nm {
            self.wavelength_nm = v;
        }
        if let Some(v) = file.wavelength_step_nm {
            self.wavelength_step_nm = v;
        }
        if let Some(v) = file.remote_ip_address {
            self.remote_ip_address = Some(v);
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
    }

    /// Later keys win, so the `APP__` spelling overrides the short one.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        for key in ["EMM_HOST", "APP__CONTROLLER_HOST"] {
            if let Some(v) = lookup(key) {
                self.controller_host = v;
            }
        }
        for key in ["EMM_PORT", "APP__CONTROLLER_PORT"] {
            if let Some(v) = lookup(key) {
                self.controller_port = parse_env(key, &v)?;
            }
        }
        if let Some(v) = lookup("APP__CONTROL_PATH") {
            self.control_path = v;
        }
        if let Some(v) = lookup("APP__NETWORK_PATH") {
            self.network_path = v;
        }
        if let Some(v) = lookup("APP__WAVELENGTH_NM") {
            self.wavelength_nm = parse_env("APP__WAVELENGTH_NM", &v)?;
        }
        if let Some(v) = lookup("APP__WAVELENGTH_STEP_NM") {
            self.wavelength_step_nm = parse_env("APP__WAVELENGTH_STEP_NM", &v)?;
        }
        if let Some(v) = lookup("APP__REMOTE_IP_ADDRESS") {
            self.remote_ip_address = Some(v);
        }
        if let Some(v) = lookup("APP__LOG_FILTER") {
            self.log_filter = v;
        }
        Ok(())
    }
}

/// Defaults, then the TOML file, then environment variables.
///
/// A missing default config file is fine; a missing explicit one is an error.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    config_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, explicit) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file);
        }
        Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    settings.apply_env(lookup)?;
    Ok(settings)
}

fn check_tune_value(name: &str, value: f64) -> anyhow::Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!(
            "{name} must be a finite, non-negative number, got {value}"
        ));
    }
    Ok(value)
}

fn parse_env<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| anyhow!("invalid value '{raw}' for {key}: {err}"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
