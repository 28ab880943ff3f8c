#![warn(clippy::pedantic)]

//! Stack tag propagation for CloudFormation templates and deployed
//! resources.
//!
//! Deployment configuration carries a set of stack tags meant to apply
//! uniformly across a stack's resources. This crate propagates them in two
//! steps, bound to the host deployment tool's lifecycle by a static hook
//! table:
//!
//! - [`tag_template`] merges the stack tags into the `Tags` property of
//!   every supported resource in a compiled template, without overriding
//!   tags a resource already declares;
//! - [`Client::tag_stack_resources`] tags the deployed resources whose
//!   types only accept tags out-of-band (API Gateway stages, CloudWatch log
//!   groups), one concurrent tagging call per resource.
//!
//! [`ResourceTagger`] resolves the configuration surface once and exposes
//! both steps as phase handlers.

mod config;
mod lifecycle;
mod plugin;
mod tag;
mod tag_stack_resources;
mod template;

pub use config::{DeploymentConfig, InvocationOptions, ProviderConfig};
pub use lifecycle::{handler_for, Handler, InvalidPhase, LifecyclePhase, HOOKS};
pub use plugin::{NewResourceTaggerError, ResourceTagger};
pub use tag::{ResourceTags, Tag, TagEncoding, TagSet};
pub use tag_stack_resources::{
    Client, TagStackResourcesError, TagStackResourcesInput, TagStackResourcesOutput,
    OUT_OF_BAND_TYPES,
};
pub use template::{
    tag_template, ParseTemplateError, SkipReason, SkippedResource, TagTemplateOutput, Template,
    SUPPORTED_TYPES,
};
