use crate::error::{IrError, Result};

pub const VERIFY_ENV_VAR: &str = "VKML_IR_VERIFY";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderConfig {
    // Run the verifier on every instruction before it is appended
    pub verify_on_build: bool,
    // Broadcast fill for convolution and fully-connected biases
    pub bias_fill: f32,
    // Broadcast fills for the batch-norm learnable parameters
    pub beta_fill: f32,
    pub gamma_fill: f32,
}

impl BuilderConfig {
    pub fn build(self) -> Result<Self> {
        check_fill("bias_fill", self.bias_fill)?;
        check_fill("beta_fill", self.beta_fill)?;
        check_fill("gamma_fill", self.gamma_fill)?;

        Ok(self)
    }

    // Defaults, with verify_on_build taken from VKML_IR_VERIFY when set
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            verify_on_build: read_bool(VERIFY_ENV_VAR, defaults.verify_on_build),
            ..defaults
        }
    }

    pub fn with_verify_on_build(mut self, verify_on_build: bool) -> Self {
        self.verify_on_build = verify_on_build;
        self
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            verify_on_build: cfg!(debug_assertions),
            bias_fill: 0.1,
            beta_fill: 0.0,
            gamma_fill: 1.0,
        }
    }
}

fn check_fill(field: &str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(IrError::InvalidConfig(format!(
            "{} must be finite, got {}",
            field, value
        )));
    }
    Ok(())
}

fn read_bool(key: &str, default_value: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(default_value)
}
