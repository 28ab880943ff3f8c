//! Plugin construction and lifecycle hook dispatch.

use std::fmt;

use crate::{
    config::{DeploymentConfig, InvocationOptions},
    lifecycle::{Handler, LifecyclePhase, HOOKS},
    tag::TagSet,
    tag_stack_resources::{
        Client, TagStackResourcesError, TagStackResourcesInput, TagStackResourcesOutput,
    },
    template::{tag_template, TagTemplateOutput, Template},
};

/// The stage deployments default to when none is configured.
const DEFAULT_STAGE: &str = "dev";

/// The provider whose resources the tagger knows how to tag.
const SUPPORTED_PROVIDER: &str = "aws";

/// Merges configured stack tags into compiled templates and tags deployed
/// resources that only accept tags out-of-band.
///
/// Construction resolves the configuration surface once: the stack tag set,
/// the stage and region (invocation options override provider defaults), and
/// the stack name. The handlers are bound to phases by the static
/// [`HOOKS`] table.
///
/// ```
/// use stacktags::{DeploymentConfig, InvocationOptions, ResourceTagger, Template};
///
/// let config: DeploymentConfig = serde_json::from_value(serde_json::json!({
///     "service": "orders",
///     "provider": {"name": "aws", "stage": "prod", "stackTags": {"Env": "prod"}},
/// }))?;
/// let tagger = ResourceTagger::new(&config, &InvocationOptions::default())?;
///
/// let template: Template = r#"{
///     "Resources": {"Fn1": {"Type": "AWS::Lambda::Function", "Properties": {}}}
/// }"#
/// .parse()?;
/// let output = tagger.apply_stack_tags(template);
/// assert_eq!(output.tagged, ["Fn1"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct ResourceTagger {
    service: String,
    stage: String,
    region: Option<String>,
    stack_name: Option<String>,
    tags: TagSet,
}

impl ResourceTagger {
    /// Construct a tagger for the given deployment configuration.
    ///
    /// # Errors
    ///
    /// Fails if the deployment targets a provider other than `aws`.
    pub fn new(
        config: &DeploymentConfig,
        options: &InvocationOptions,
    ) -> Result<Self, NewResourceTaggerError> {
        if config.provider.name != SUPPORTED_PROVIDER {
            return Err(NewResourceTaggerError::UnsupportedProvider {
                name: config.provider.name.clone(),
            });
        }
        Ok(Self {
            service: config.service.clone(),
            stage: options
                .stage
                .clone()
                .or_else(|| config.provider.stage.clone())
                .unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            region: options
                .region
                .clone()
                .or_else(|| config.provider.region.clone()),
            stack_name: config.provider.stack_name.clone(),
            tags: config
                .provider
                .stack_tags
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
        })
    }

    /// The phases this plugin binds handlers to.
    #[must_use]
    pub fn hooks() -> &'static [(LifecyclePhase, Handler)] {
        HOOKS
    }

    /// The configured stack tag set.
    #[must_use]
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// The resolved stage.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// The resolved region, if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// The name of the stack this deployment creates.
    #[must_use]
    pub fn stack_name(&self) -> String {
        self.stack_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.service, self.stage))
    }

    /// Handler for [`LifecyclePhase::AfterPackageFinalize`]: merge the stack
    /// tags into `template`'s eligible resources, returning the rewritten
    /// template.
    #[must_use]
    pub fn apply_stack_tags(&self, template: Template) -> TagTemplateOutput {
        tag_template(template, &self.tags)
    }

    /// Handler for [`LifecyclePhase::AfterDeploy`]: tag the deployed stack's
    /// out-of-band resources. Does nothing when no stack tags are
    /// configured.
    ///
    /// # Errors
    ///
    /// Propagates any [`TagStackResourcesError`] from the underlying
    /// operation.
    pub async fn tag_deployed_stack(
        &self,
        client: &Client,
    ) -> Result<TagStackResourcesOutput, TagStackResourcesError> {
        client
            .tag_stack_resources(TagStackResourcesInput::new(
                self.stack_name(),
                self.tags.clone(),
            ))
            .await
    }
}

/// Errors emitted when constructing a [`ResourceTagger`].
#[derive(Debug)]
pub enum NewResourceTaggerError {
    /// The deployment targets a provider the tagger has no support for.
    UnsupportedProvider {
        /// The configured provider name.
        name: String,
    },
}

impl fmt::Display for NewResourceTaggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedProvider { name } => {
                write!(f, "provider {name} does not support stack tag propagation")
            }
        }
    }
}

impl std::error::Error for NewResourceTaggerError {}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config(provider: &str) -> DeploymentConfig {
        serde_json::from_value(serde_json::json!({
            "service": "orders",
            "provider": {
                "name": provider,
                "stage": "staging",
                "region": "eu-west-2",
                "stackTags": {"Env": "staging"},
            },
        }))
        .unwrap()
    }

    #[test]
    fn unsupported_provider_is_fatal() {
        let error = ResourceTagger::new(&config("azure"), &InvocationOptions::default())
            .unwrap_err();
        assert_matches!(
            error,
            NewResourceTaggerError::UnsupportedProvider { name } if name == "azure"
        );
    }

    #[test]
    fn options_override_provider_defaults() {
        let options = InvocationOptions {
            stage: Some("prod".to_string()),
            region: Some("us-east-1".to_string()),
        };
        let tagger = ResourceTagger::new(&config("aws"), &options).unwrap();
        assert_eq!(tagger.stage(), "prod");
        assert_eq!(tagger.region(), Some("us-east-1"));
        assert_eq!(tagger.stack_name(), "orders-prod");
    }

    #[test]
    fn provider_defaults_apply_without_options() {
        let tagger = ResourceTagger::new(&config("aws"), &InvocationOptions::default()).unwrap();
        assert_eq!(tagger.stage(), "staging");
        assert_eq!(tagger.region(), Some("eu-west-2"));
        assert_eq!(tagger.stack_name(), "orders-staging");
    }

    #[test]
    fn stage_defaults_to_dev() {
        let config: DeploymentConfig = serde_json::from_value(serde_json::json!({
            "service": "orders",
            "provider": {"name": "aws"},
        }))
        .unwrap();
        let tagger = ResourceTagger::new(&config, &InvocationOptions::default()).unwrap();
        assert_eq!(tagger.stage(), "dev");
        assert_eq!(tagger.stack_name(), "orders-dev");
        assert!(tagger.tags().is_empty());
    }

    #[test]
    fn stack_name_override() {
        let config: DeploymentConfig = serde_json::from_value(serde_json::json!({
            "service": "orders",
            "provider": {"name": "aws", "stackName": "orders-main"},
        }))
        .unwrap();
        let tagger = ResourceTagger::new(&config, &InvocationOptions::default()).unwrap();
        assert_eq!(tagger.stack_name(), "orders-main");
    }
}
