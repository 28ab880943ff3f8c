//! An operation to tag deployed stack resources that only accept tags
//! out-of-band.
//!
//! Some resource types do not propagate stack tags declaratively: API
//! Gateway stages and CloudWatch log groups must be tagged through their
//! service APIs after the stack has deployed. This module lists the deployed
//! stack's resources and issues one tagging call per matching resource.

use std::{fmt, future::Future, pin::Pin};

use futures_util::future::join_all;

use crate::tag::TagSet;

/// Resource types whose tags cannot be expressed declaratively and must be
/// applied after deployment.
pub const OUT_OF_BAND_TYPES: &[&str] = &[STAGE_TYPE, LOG_GROUP_TYPE];

const STAGE_TYPE: &str = "AWS::ApiGateway::Stage";
const LOG_GROUP_TYPE: &str = "AWS::Logs::LogGroup";
const REST_API_TYPE: &str = "AWS::ApiGateway::RestApi";

/// Convenience alias for a `Box::pin`ned `Future`.
type PinBoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A client for the post-deploy tagging operation.
///
/// A thin facade over the AWS service clients involved: CloudFormation to
/// list the deployed stack's resources, and API Gateway, CloudWatch Logs and
/// STS to tag them.
#[derive(Clone, Debug)]
pub struct Client {
    region: Option<String>,
    cloudformation: aws_sdk_cloudformation::Client,
    api_gateway: aws_sdk_apigateway::Client,
    cloudwatch_logs: aws_sdk_cloudwatchlogs::Client,
    sts: aws_sdk_sts::Client,
}

impl Client {
    /// Construct a client from shared AWS configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            region: config.region().map(ToString::to_string),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
            api_gateway: aws_sdk_apigateway::Client::new(config),
            cloudwatch_logs: aws_sdk_cloudwatchlogs::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
        }
    }

    /// Tag the deployed stack's out-of-band resources.
    ///
    /// Calls the CloudFormation `DescribeStackResources` API, filters the
    /// result to [`OUT_OF_BAND_TYPES`], and issues one tagging call per
    /// matching resource. The calls are issued concurrently and the
    /// operation completes only once every call has settled; the first
    /// failure (if any) is then returned.
    ///
    /// A stage whose stack contains no `AWS::ApiGateway::RestApi` is skipped
    /// with a diagnostic, since its ARN cannot be formed. An empty tag set
    /// short-circuits without any API call.
    ///
    /// # Errors
    ///
    /// Fails if no region is configured (resource ARNs cannot be formed), or
    /// if any of the service calls fail.
    pub async fn tag_stack_resources(
        &self,
        input: TagStackResourcesInput,
    ) -> Result<TagStackResourcesOutput, TagStackResourcesError> {
        let TagStackResourcesInput { stack_name, tags } = input;
        if tags.is_empty() {
            tracing::info!(%stack_name, "no stack tags configured; nothing to tag");
            return Ok(TagStackResourcesOutput { tagged: Vec::new() });
        }

        let resources = self
            .cloudformation
            .describe_stack_resources()
            .stack_name(&stack_name)
            .send()
            .await
            .map_err(|error| TagStackResourcesError::CloudFormationApi(error.into()))?
            .stack_resources
            .unwrap_or_default();

        if !resources.iter().any(|resource| {
            resource
                .resource_type
                .as_deref()
                .is_some_and(|resource_type| OUT_OF_BAND_TYPES.contains(&resource_type))
        }) {
            tracing::info!(%stack_name, "no resources need out-of-band tagging");
            return Ok(TagStackResourcesOutput { tagged: Vec::new() });
        }

        let region = self
            .region
            .as_deref()
            .ok_or(TagStackResourcesError::MissingRegion)?;

        // Stage ARNs are scoped to the owning rest API.
        let rest_api_id = resources
            .iter()
            .find(|resource| resource.resource_type.as_deref() == Some(REST_API_TYPE))
            .and_then(|resource| resource.physical_resource_id.as_deref());

        // Log group ARNs carry the account id, which DescribeStackResources
        // doesn't report.
        let account_id = if resources
            .iter()
            .any(|resource| resource.resource_type.as_deref() == Some(LOG_GROUP_TYPE))
        {
            Some(self.account_id().await?)
        } else {
            None
        };

        let sdk_tags = tags.as_sdk_map();
        let mut requests: Vec<PinBoxFut<'static, Result<(), TagStackResourcesError>>> = Vec::new();
        let mut tagged = Vec::new();

        for resource in &resources {
            let Some(resource_type) = resource.resource_type.as_deref() else {
                continue;
            };
            if !OUT_OF_BAND_TYPES.contains(&resource_type) {
                continue;
            }
            let logical_id = resource
                .logical_resource_id
                .as_deref()
                .expect("StackResource without logical_resource_id");
            let physical_id = resource
                .physical_resource_id
                .as_deref()
                .expect("StackResource without physical_resource_id");

            match resource_type {
                STAGE_TYPE => {
                    let Some(rest_api_id) = rest_api_id else {
                        tracing::warn!(logical_id, "stage without a rest api in its stack; skipping");
                        continue;
                    };
                    let request = self
                        .api_gateway
                        .tag_resource()
                        .resource_arn(stage_arn(region, rest_api_id, physical_id))
                        .set_tags(Some(sdk_tags.clone()))
                        .send();
                    requests.push(Box::pin(async move {
                        request
                            .await
                            .map(|_| ())
                            .map_err(|error| TagStackResourcesError::ApiGatewayApi(error.into()))
                    }));
                }
                LOG_GROUP_TYPE => {
                    let account_id = account_id
                        .as_deref()
                        .expect("account id resolved when log groups are present");
                    let request = self
                        .cloudwatch_logs
                        .tag_resource()
                        .resource_arn(log_group_arn(region, account_id, physical_id))
                        .set_tags(Some(sdk_tags.clone()))
                        .send();
                    requests.push(Box::pin(async move {
                        request
                            .await
                            .map(|_| ())
                            .map_err(|error| TagStackResourcesError::CloudWatchLogsApi(error.into()))
                    }));
                }
                _ => continue,
            }
            tagged.push(logical_id.to_string());
        }

        // Every call settles before the first failure is reported.
        for result in join_all(requests).await {
            result?;
        }

        tracing::info!(%stack_name, tagged = tagged.len(), "tagged deployed stack resources");
        Ok(TagStackResourcesOutput { tagged })
    }

    async fn account_id(&self) -> Result<String, TagStackResourcesError> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|error| TagStackResourcesError::StsApi(error.into()))?;
        Ok(identity
            .account
            .expect("GetCallerIdentityOutput without account"))
    }
}

/// The input for the `tag_stack_resources` operation.
#[derive(Clone, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TagStackResourcesInput {
    /// The name of the deployed stack whose resources to tag.
    pub stack_name: String,

    /// Tags to apply to each matching resource.
    pub tags: TagSet,
}

impl TagStackResourcesInput {
    /// Construct an input for the given `stack_name` and `tags`.
    pub fn new(stack_name: impl Into<String>, tags: TagSet) -> Self {
        Self {
            stack_name: stack_name.into(),
            tags,
        }
    }
}

/// The output of the `tag_stack_resources` operation.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct TagStackResourcesOutput {
    /// Logical ids of the resources that were tagged.
    pub tagged: Vec<String>,
}

/// Errors emitted by a `tag_stack_resources` operation.
///
/// **Note:** the inner error of the API variants will always be an AWS SDK
/// error, but since those are generic over the type of service errors we
/// either need a variant per API used, or `Box`. If you do need to
/// programmatically match a particular API error you can use
/// [`Box::downcast`].
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum TagStackResourcesError {
    /// A CloudFormation API error occurred while listing stack resources.
    CloudFormationApi(Box<dyn std::error::Error>),

    /// An API Gateway tagging call failed.
    ApiGatewayApi(Box<dyn std::error::Error>),

    /// A CloudWatch Logs tagging call failed.
    CloudWatchLogsApi(Box<dyn std::error::Error>),

    /// An STS call to resolve the account id failed.
    StsApi(Box<dyn std::error::Error>),

    /// No region is configured, so resource ARNs cannot be formed.
    MissingRegion,
}

impl fmt::Display for TagStackResourcesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CloudFormationApi(error) => write!(f, "CloudFormation API error: {error}"),
            Self::ApiGatewayApi(error) => write!(f, "API Gateway API error: {error}"),
            Self::CloudWatchLogsApi(error) => write!(f, "CloudWatch Logs API error: {error}"),
            Self::StsApi(error) => write!(f, "STS API error: {error}"),
            Self::MissingRegion => {
                write!(f, "no region is configured; resource ARNs cannot be formed")
            }
        }
    }
}

impl std::error::Error for TagStackResourcesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CloudFormationApi(error)
            | Self::ApiGatewayApi(error)
            | Self::CloudWatchLogsApi(error)
            | Self::StsApi(error) => Some(error.as_ref()),
            Self::MissingRegion => None,
        }
    }
}

fn stage_arn(region: &str, rest_api_id: &str, stage_name: &str) -> String {
    format!("arn:aws:apigateway:{region}::/restapis/{rest_api_id}/stages/{stage_name}")
}

fn log_group_arn(region: &str, account_id: &str, log_group_name: &str) -> String {
    format!("arn:aws:logs:{region}:{account_id}:log-group:{log_group_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_arn_format() {
        assert_eq!(
            stage_arn("eu-west-2", "a1b2c3", "prod"),
            "arn:aws:apigateway:eu-west-2::/restapis/a1b2c3/stages/prod"
        );
    }

    #[test]
    fn log_group_arn_format() {
        assert_eq!(
            log_group_arn("eu-west-2", "123456789012", "/aws/lambda/orders-prod-fn"),
            "arn:aws:logs:eu-west-2:123456789012:log-group:/aws/lambda/orders-prod-fn"
        );
    }

    #[test]
    fn out_of_band_types_also_in_declarative_allow_list() {
        // their template Tags still merge declaratively; the post-deploy
        // pass covers what the template pass cannot express.
        for resource_type in OUT_OF_BAND_TYPES {
            assert!(crate::template::SUPPORTED_TYPES
                .iter()
                .any(|(supported, _)| supported == resource_type));
        }
    }
}
