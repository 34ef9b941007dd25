use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Bearer token every request must present in `Authorization: Bearer <token>`.
///
/// The token defaults to empty and [`AuthConfig::validate`] refuses an empty
/// token, so a node never starts with a secret that ships in the binary. Set
/// it through the config file or `WATCHKV__AUTH__TOKEN`.
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("token", &"<redacted>").finish()
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "auth.token must be set (e.g. WATCHKV__AUTH__TOKEN)".into(),
            ));
        }
        Ok(())
    }

    /// The exact `Authorization` header value accepted by the gate.
    pub fn expected_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
