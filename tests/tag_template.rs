use serde_json::json;

use stacktags::{handler_for, Handler, LifecyclePhase, ResourceTagger, SkipReason, Template};

mod common;

use common::{get_tagger, COMPILED_TEMPLATE};

#[test]
fn stack_tags_merge_into_supported_resources() {
    let tagger = get_tagger(json!({"Env": "prod", "Owner": "teamB"}));
    let template: Template = COMPILED_TEMPLATE.parse().unwrap();

    let output = tagger.apply_stack_tags(template);

    // no Tags property: the stack tags become the tag list
    assert_eq!(
        output.template.resources["Fn1"]["Properties"]["Tags"],
        json!([
            {"Key": "Env", "Value": "prod"},
            {"Key": "Owner", "Value": "teamB"},
        ])
    );

    // declared key wins, new key appended
    assert_eq!(
        output.template.resources["Table1"]["Properties"]["Tags"],
        json!([
            {"Key": "Owner", "Value": "teamA"},
            {"Key": "Env", "Value": "prod"},
        ])
    );

    // map-encoded resource type gets map tags
    assert_eq!(
        output.template.resources["HttpApi"]["Properties"]["Tags"],
        json!({"Env": "prod", "Owner": "teamB"})
    );
}

#[test]
fn unsupported_resources_and_other_sections_untouched() {
    let tagger = get_tagger(json!({"Env": "prod"}));
    let template: Template = COMPILED_TEMPLATE.parse().unwrap();
    let before = template.to_value();

    let output = tagger.apply_stack_tags(template);

    assert_eq!(
        output.template.resources["FnRole"],
        before["Resources"]["FnRole"]
    );
    assert_eq!(output.template.to_value()["Outputs"], before["Outputs"]);
    assert_eq!(
        output.template.to_value()["AWSTemplateFormatVersion"],
        before["AWSTemplateFormatVersion"]
    );
}

#[test]
fn resource_without_properties_is_skipped() {
    let tagger = get_tagger(json!({"Env": "prod"}));
    let template: Template = COMPILED_TEMPLATE.parse().unwrap();

    let output = tagger.apply_stack_tags(template);

    let skipped: Vec<_> = output
        .skipped
        .iter()
        .map(|skipped| (skipped.logical_id.as_str(), skipped.reason))
        .collect();
    assert_eq!(skipped, [("Bucket", SkipReason::MissingProperties)]);
    assert_eq!(
        output.template.resources["Bucket"],
        json!({"Type": "AWS::S3::Bucket"})
    );
}

#[test]
fn empty_tag_configuration_modifies_nothing() {
    let tagger = get_tagger(json!({}));
    let template: Template = COMPILED_TEMPLATE.parse().unwrap();
    let before = template.to_value();

    let output = tagger.apply_stack_tags(template);
    assert_eq!(output.template.to_value(), before);
    assert!(output.tagged.is_empty());
    assert!(output.skipped.is_empty());
}

#[test]
fn hook_table_routes_phases_to_handlers() {
    assert_eq!(ResourceTagger::hooks().len(), 2);
    assert_eq!(
        handler_for(
            "after:aws:package:finalize:mergeCustomProviderResources"
                .parse()
                .unwrap()
        ),
        Some(Handler::ApplyStackTags)
    );
    assert_eq!(
        handler_for(LifecyclePhase::AfterDeploy),
        Some(Handler::TagDeployedResources)
    );
}
