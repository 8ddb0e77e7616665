//! Plugin configuration for QPLUG
//!
//! Gantree: L4_Engine → PluginConfig
//!
//! Session-wide settings plus the per-run [`EngineOverrides`] that a
//! single `execute_circuit` call may pass to the engine it builds.

use crate::backend_kind::BackendKind;
use qplug_backend::{RemoteCredentials, RemoteOptions};
use qplug_core::{QplugError, QplugResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plugin configuration
/// Gantree: PluginConfig // session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    // ========================================================================
    // Backend Selection
    // ========================================================================
    /// Backend selector (see [`BackendKind`])
    pub backend: String,

    // ========================================================================
    // Simulator Parameters
    // ========================================================================
    /// Buffer operations until flush
    pub gate_fusion: bool,

    /// Seed for measurement sampling
    pub rnd_seed: Option<u64>,

    // ========================================================================
    // Remote Parameters
    // ========================================================================
    /// Submit to hardware instead of the remote simulator
    pub use_hardware: bool,

    /// Shots per remote job
    pub num_runs: u64,

    /// Log submitted programs
    pub verbose: bool,

    /// Remote user name
    pub user: Option<String>,

    /// Remote password (never serialized)
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Remote target device
    pub device: String,

    /// Fetch this earlier job instead of submitting
    pub retrieve_execution: Option<String>,
}

impl PluginConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Default configuration for one backend
    pub fn for_backend(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set backend selector
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Enable or disable gate fusion
    pub fn with_gate_fusion(mut self, gate_fusion: bool) -> Self {
        self.gate_fusion = gate_fusion;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rnd_seed = Some(seed);
        self
    }

    /// Submit to hardware
    pub fn with_hardware(mut self, use_hardware: bool) -> Self {
        self.use_hardware = use_hardware;
        self
    }

    /// Set shots per remote job
    pub fn with_num_runs(mut self, num_runs: u64) -> Self {
        self.num_runs = num_runs;
        self
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set remote credentials
    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set remote device
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Retrieve an earlier job instead of submitting
    pub fn with_retrieve_execution(mut self, id: impl Into<String>) -> Self {
        self.retrieve_execution = Some(id.into());
        self
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Parsed backend selector
    pub fn backend_kind(&self) -> QplugResult<BackendKind> {
        BackendKind::from_str(&self.backend)
    }

    /// Credentials from config, falling back to the environment
    pub fn credentials(&self) -> Option<RemoteCredentials> {
        RemoteCredentials::resolve(self.user.as_deref(), self.password.as_deref())
    }

    /// Remote engine options with per-run overrides applied
    pub fn remote_options(&self, overrides: Option<&EngineOverrides>) -> RemoteOptions {
        RemoteOptions {
            use_hardware: self.use_hardware,
            num_runs: overrides
                .and_then(|o| o.num_runs)
                .unwrap_or(self.num_runs),
            verbose: self.verbose,
            device: self.device.clone(),
            retrieve_execution: self.retrieve_execution.clone(),
        }
    }

    /// Serialize to JSON (password omitted)
    pub fn to_json(&self) -> QplugResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> QplugResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    pub fn validate(&self) -> QplugResult<()> {
        let kind = self.backend_kind()?;

        if self.num_runs == 0 {
            return Err(QplugError::ConfigError("num_runs must be > 0".to_string()));
        }

        if self.device.trim().is_empty() {
            return Err(QplugError::ConfigError("device must not be empty".to_string()));
        }

        if self.use_hardware && kind != BackendKind::RemoteHardware {
            return Err(QplugError::ConfigError(format!(
                "use_hardware only applies to {}, not {}",
                BackendKind::RemoteHardware.name(),
                kind.name()
            )));
        }

        Ok(())
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::StateVectorSim.name().to_string(),
            gate_fusion: false,
            rnd_seed: None,
            use_hardware: false,
            num_runs: qplug_backend::remote::DEFAULT_NUM_RUNS,
            verbose: true,
            user: None,
            password: None,
            device: qplug_backend::remote::DEFAULT_DEVICE.to_string(),
            retrieve_execution: None,
        }
    }
}

impl fmt::Display for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PluginConfig({}, gate_fusion={}, seed={:?}, runs={}, device={})",
            self.backend, self.gate_fusion, self.rnd_seed, self.num_runs, self.device
        )
    }
}

// ============================================================================
// Per-Run Overrides
// ============================================================================

/// Engine keyword options for a single execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOverrides {
    /// Override gate fusion (state-vector only)
    pub gate_fusion: Option<bool>,

    /// Override seed (state-vector only)
    pub rnd_seed: Option<u64>,

    /// Override shots (remote only)
    pub num_runs: Option<u64>,
}

impl EngineOverrides {
    /// Set gate fusion
    pub fn with_gate_fusion(mut self, gate_fusion: bool) -> Self {
        self.gate_fusion = Some(gate_fusion);
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rnd_seed = Some(seed);
        self
    }

    /// Set shots
    pub fn with_num_runs(mut self, num_runs: u64) -> Self {
        self.num_runs = Some(num_runs);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.backend, "Simulator");
        assert!(!config.gate_fusion);
        assert_eq!(config.num_runs, 1024);
        assert!(config.verbose);
        assert_eq!(config.device, "ibmqx4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PluginConfig::for_backend("RemoteBackend")
            .with_num_runs(100)
            .with_hardware(true)
            .with_device("ibmqx5");
        assert_eq!(config.backend_kind().unwrap(), BackendKind::RemoteHardware);
        assert!(config.validate().is_ok());
        assert_eq!(config.remote_options(None).num_runs, 100);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            PluginConfig::for_backend("bogus").validate(),
            Err(QplugError::UnknownBackend(_))
        ));
        assert!(PluginConfig::default().with_num_runs(0).validate().is_err());
        assert!(PluginConfig::default().with_hardware(true).validate().is_err());
    }

    #[test]
    fn test_json_omits_password() {
        let config = PluginConfig::default().with_credentials("alice", "secret");
        let json = config.to_json().unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("secret"));

        let parsed = PluginConfig::from_json(&json).unwrap();
        assert_eq!(parsed.user.as_deref(), Some("alice"));
        assert_eq!(parsed.password, None);
    }

    #[test]
    fn test_partial_json() {
        let parsed = PluginConfig::from_json(r#"{"backend": "ClassicalSimulator"}"#).unwrap();
        assert_eq!(parsed.backend_kind().unwrap(), BackendKind::ClassicalSim);
        assert_eq!(parsed.num_runs, 1024);
    }

    #[test]
    fn test_overrides() {
        let overrides = EngineOverrides::default().with_num_runs(10).with_seed(3);
        let config = PluginConfig::default();
        assert_eq!(config.remote_options(Some(&overrides)).num_runs, 10);
        assert_eq!(overrides.rnd_seed, Some(3));
    }

    #[test]
    fn test_credentials_from_config() {
        let creds = PluginConfig::default()
            .with_credentials("bob", "pw")
            .credentials()
            .unwrap();
        assert_eq!(creds.user(), "bob");
    }
}
