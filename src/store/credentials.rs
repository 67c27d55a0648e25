//! AWS credential bundle passed to every store call

use std::fmt;

/// Region and static keys for the AWS CLI.
///
/// Empty fields are left out of the child environment so the CLI's own
/// credential chain (instance profile, OIDC, `~/.aws`) can fill them in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AwsOptions {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl AwsOptions {
    pub fn new(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Environment variables understood by the AWS CLI
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        [
            ("AWS_REGION", &self.region),
            ("AWS_ACCESS_KEY_ID", &self.access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &self.secret_access_key),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name, value.clone()))
        .collect()
    }
}

impl fmt::Debug for AwsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &str| if v.is_empty() { "" } else { "***" };
        f.debug_struct("AwsOptions")
            .field("region", &self.region)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .finish()
    }
}
