//! The deployment configuration surface the tagger consumes.

use std::collections::BTreeMap;

/// The slice of the deployment configuration that drives tagging.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DeploymentConfig {
    /// The service being deployed; used to derive the stack name.
    pub service: String,

    /// Provider settings, including the stack tag mapping.
    pub provider: ProviderConfig,
}

/// The provider section of the deployment configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ProviderConfig {
    /// The provider the deployment targets.
    pub name: String,

    /// Default stage, overridable per invocation.
    #[serde(default)]
    pub stage: Option<String>,

    /// Default region, overridable per invocation.
    #[serde(default)]
    pub region: Option<String>,

    /// Stack name override; when absent the stack is named
    /// `<service>-<stage>`.
    #[serde(default, rename = "stackName")]
    pub stack_name: Option<String>,

    /// Tags to apply across the stack's resources.
    ///
    /// Older configurations spell this `resourceTags`; both spellings are
    /// accepted. A key that appears more than once resolves last-write-wins.
    #[serde(default, rename = "stackTags", alias = "resourceTags")]
    pub stack_tags: BTreeMap<String, String>,
}

/// Stage and region overrides from the invocation.
///
/// An override takes precedence over the corresponding provider default.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct InvocationOptions {
    /// Stage to deploy to.
    #[serde(default)]
    pub stage: Option<String>,

    /// Region to deploy to.
    #[serde(default)]
    pub region: Option<String>,
}
