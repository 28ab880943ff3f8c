//! The infrastructure template model and the `tag_template` operation.

use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::tag::{ResourceTags, TagEncoding, TagSet};

/// Resource types eligible for declarative tagging, with the tag encoding
/// each type's schema requires.
pub const SUPPORTED_TYPES: &[(&str, TagEncoding)] = &[
    ("AWS::Lambda::Function", TagEncoding::List),
    ("AWS::SQS::Queue", TagEncoding::List),
    ("AWS::Kinesis::Stream", TagEncoding::List),
    ("AWS::DynamoDB::Table", TagEncoding::List),
    ("AWS::S3::Bucket", TagEncoding::List),
    ("AWS::ApiGateway::Stage", TagEncoding::List),
    ("AWS::Logs::LogGroup", TagEncoding::List),
    ("AWS::ApiGatewayV2::Api", TagEncoding::Map),
    ("AWS::ApiGatewayV2::Stage", TagEncoding::Map),
    ("AWS::SSM::Parameter", TagEncoding::Map),
];

fn supported_encoding(resource_type: &str) -> Option<TagEncoding> {
    SUPPORTED_TYPES
        .iter()
        .find(|(supported, _)| *supported == resource_type)
        .map(|&(_, encoding)| encoding)
}

/// A generated infrastructure template.
///
/// Only the `Resources` mapping is modeled; every other template section
/// round-trips through [`extra`](Self::extra) unmodified. Resource
/// declarations are kept as raw JSON values so that declarations the walk
/// doesn't touch serialize back exactly as they were parsed.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Template {
    /// Logical resource id to resource declaration.
    #[serde(
        rename = "Resources",
        default,
        skip_serializing_if = "serde_json::Map::is_empty"
    )]
    pub resources: serde_json::Map<String, Value>,

    /// Template sections other than `Resources`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Template {
    /// Construct a template from a JSON value.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a JSON object or its `Resources` entry is
    /// not a mapping.
    pub fn from_value(value: Value) -> Result<Self, ParseTemplateError> {
        serde_json::from_value(value).map_err(ParseTemplateError)
    }

    /// The template as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("Template serialization cannot fail")
    }
}

impl FromStr for Template {
    type Err = ParseTemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(ParseTemplateError)
    }
}

/// An error parsing a template document.
#[derive(Debug)]
pub struct ParseTemplateError(serde_json::Error);

impl fmt::Display for ParseTemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid template: {}", self.0)
    }
}

impl std::error::Error for ParseTemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// The output of the `tag_template` operation.
#[derive(Clone, Debug, PartialEq)]
pub struct TagTemplateOutput {
    /// The rewritten template.
    pub template: Template,

    /// Logical ids of the resources whose tags were extended.
    pub tagged: Vec<String>,

    /// Eligible resources that were left untouched, with the reason.
    pub skipped: Vec<SkippedResource>,
}

/// Diagnostic record for an eligible resource the walk could not tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkippedResource {
    /// The logical id of the resource in the template.
    pub logical_id: String,

    /// The declared resource type.
    pub resource_type: String,

    /// Why the resource was skipped.
    pub reason: SkipReason,
}

impl fmt::Display for SkippedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for {} ({})",
            self.reason, self.resource_type, self.logical_id
        )
    }
}

/// Why an eligible resource was left untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The resource declaration has no `Properties` block.
    MissingProperties,

    /// The resource's `Tags` value is in neither known encoding.
    UnusableTags,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProperties => write!(f, "Properties not available"),
            Self::UnusableTags => write!(f, "Tags not usable"),
        }
    }
}

/// Merge the configured stack tags into every eligible resource of
/// `template`, returning the rewritten template.
///
/// Each resource declaration is visited exactly once. Resources whose `Type`
/// is not in [`SUPPORTED_TYPES`] are left untouched. An eligible resource
/// without a `Properties` block (or with a `Tags` value in neither known
/// encoding) is skipped with a diagnostic. Tag keys the resource already
/// declares always win over stack tags; stack tags with new keys are
/// appended, rendered in the encoding the resource type requires.
///
/// An empty tag set returns the template unchanged.
#[must_use]
pub fn tag_template(template: Template, stack_tags: &TagSet) -> TagTemplateOutput {
    if stack_tags.is_empty() {
        tracing::info!("no stack tags configured; template left unchanged");
        return TagTemplateOutput {
            template,
            tagged: Vec::new(),
            skipped: Vec::new(),
        };
    }

    let Template { resources, extra } = template;
    let mut tagged = Vec::new();
    let mut skipped = Vec::new();

    let resources = resources
        .into_iter()
        .map(|(logical_id, resource)| {
            let resource = tag_resource(&logical_id, resource, stack_tags, &mut tagged, &mut skipped);
            (logical_id, resource)
        })
        .collect();

    tracing::info!(
        tagged = tagged.len(),
        skipped = skipped.len(),
        "updated resource tags"
    );
    TagTemplateOutput {
        template: Template { resources, extra },
        tagged,
        skipped,
    }
}

fn tag_resource(
    logical_id: &str,
    mut resource: Value,
    stack_tags: &TagSet,
    tagged: &mut Vec<String>,
    skipped: &mut Vec<SkippedResource>,
) -> Value {
    let Some(resource_type) = resource
        .get("Type")
        .and_then(Value::as_str)
        .map(ToString::to_string)
    else {
        return resource;
    };
    let Some(encoding) = supported_encoding(&resource_type) else {
        return resource;
    };

    let Some(properties) = resource.get_mut("Properties").and_then(Value::as_object_mut) else {
        tracing::warn!(logical_id, %resource_type, "properties not available");
        skipped.push(SkippedResource {
            logical_id: logical_id.to_string(),
            resource_type,
            reason: SkipReason::MissingProperties,
        });
        return resource;
    };

    let existing = match properties.get("Tags") {
        None => ResourceTags::default(),
        Some(value) => match ResourceTags::decode(value) {
            Some(existing) => existing,
            None => {
                tracing::warn!(logical_id, %resource_type, "unrecognized Tags value");
                skipped.push(SkippedResource {
                    logical_id: logical_id.to_string(),
                    resource_type,
                    reason: SkipReason::UnusableTags,
                });
                return resource;
            }
        },
    };

    let merged = existing.merge(stack_tags);
    properties.insert("Tags".to_string(), merged.encode(encoding));
    tagged.push(logical_id.to_string());
    resource
}
