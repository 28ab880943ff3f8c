//! Lifecycle phases and the static hook table.
//!
//! The host deployment tool invokes registered handlers at named lifecycle
//! phases. Rather than binding callbacks dynamically by phase name, the
//! bindings live in a static table ([`HOOKS`]) resolved once at startup.

use std::str::FromStr;

use serde_plain::forward_display_to_serde;

/// A lifecycle phase at which the host invokes registered handlers.
///
/// The serialized form of each variant is the host's phase identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum LifecyclePhase {
    /// After the provider template has been compiled and custom resources
    /// merged into it.
    #[serde(rename = "after:aws:package:finalize:mergeCustomProviderResources")]
    AfterPackageFinalize,

    /// After the deployment has finished.
    #[serde(rename = "after:deploy:deploy")]
    AfterDeploy,
}

forward_display_to_serde!(LifecyclePhase);

/// An error marker returned when trying to parse an unknown phase identifier.
#[derive(Debug, Eq, PartialEq)]
pub struct InvalidPhase;

impl FromStr for LifecyclePhase {
    type Err = InvalidPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_plain::from_str(s).map_err(|_| InvalidPhase)
    }
}

/// The handler a phase is bound to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Handler {
    /// Merge the configured stack tags into the compiled template.
    ApplyStackTags,

    /// Tag deployed resources that only accept tags out-of-band.
    TagDeployedResources,
}

/// The phase-to-handler bindings.
pub const HOOKS: &[(LifecyclePhase, Handler)] = &[
    (LifecyclePhase::AfterPackageFinalize, Handler::ApplyStackTags),
    (LifecyclePhase::AfterDeploy, Handler::TagDeployedResources),
];

/// Look up the handler bound to `phase`.
#[must_use]
pub fn handler_for(phase: LifecyclePhase) -> Option<Handler> {
    HOOKS
        .iter()
        .find(|(bound, _)| *bound == phase)
        .map(|&(_, handler)| handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_phase() {
        // the identifiers are part of the host contract, so check both.
        assert_eq!(
            format!("{}", LifecyclePhase::AfterPackageFinalize).as_str(),
            "after:aws:package:finalize:mergeCustomProviderResources"
        );
        assert_eq!(
            "after:deploy:deploy".parse(),
            Ok(LifecyclePhase::AfterDeploy)
        );
        assert_eq!("oh no".parse::<LifecyclePhase>(), Err(InvalidPhase));
    }

    #[test]
    fn every_phase_has_a_handler() {
        assert_eq!(
            handler_for(LifecyclePhase::AfterPackageFinalize),
            Some(Handler::ApplyStackTags)
        );
        assert_eq!(
            handler_for(LifecyclePhase::AfterDeploy),
            Some(Handler::TagDeployedResources)
        );
    }
}
