use bridge_protocol::DEFAULT_SENTINEL;
use serde::{Deserialize, Serialize};
use transport::TargetOrigin;

use crate::error::{BridgeError, BridgeResult};

/// Default number of inbound commands handled per engine poll.
pub const DEFAULT_COMMAND_BUDGET: usize = 32;
/// Default number of deferred results emitted per engine poll.
pub const DEFAULT_COMPLETION_BUDGET: usize = 64;

/// Runtime settings for a [`Bridge`](crate::Bridge).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Sentinel string tagging the endpoint handoff broadcast.
    pub sentinel: String,
    /// Who may observe the handoff. `"*"` admits any listener on the page.
    pub target_origin: TargetOrigin,
    pub command_budget: usize,
    pub completion_budget: usize,
    /// Display flag passed to every conversion.
    pub display_math: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_owned(),
            target_origin: TargetOrigin::Any,
            command_budget: DEFAULT_COMMAND_BUDGET,
            completion_budget: DEFAULT_COMPLETION_BUDGET,
            display_math: true,
        }
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Parses a JSON config; omitted fields keep their defaults.
    pub fn from_json_str(json: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = serde_json::from_str(json)
            .map_err(|err| BridgeError::config(format!("malformed config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.sentinel.is_empty() {
            return Err(BridgeError::config("sentinel must not be empty"));
        }
        if self.command_budget == 0 {
            return Err(BridgeError::config("command_budget must be positive"));
        }
        if self.completion_budget == 0 {
            return Err(BridgeError::config("completion_budget must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`BridgeConfig`], starting from the defaults.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.config.sentinel = sentinel.into();
        self
    }

    pub fn target_origin(mut self, target: impl Into<TargetOrigin>) -> Self {
        self.config.target_origin = target.into();
        self
    }

    pub fn command_budget(mut self, budget: usize) -> Self {
        self.config.command_budget = budget;
        self
    }

    pub fn completion_budget(mut self, budget: usize) -> Self {
        self.config.completion_budget = budget;
        self
    }

    pub fn display_math(mut self, display: bool) -> Self {
        self.config.display_math = display;
        self
    }

    pub fn build(self) -> BridgeResult<BridgeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
