use stacktags::{DeploymentConfig, InvocationOptions, ResourceTagger};

pub const COMPILED_TEMPLATE: &str = r#"{
    "AWSTemplateFormatVersion": "2010-09-09",
    "Resources": {
        "Fn1": {
            "Type": "AWS::Lambda::Function",
            "Properties": {
                "Runtime": "provided.al2",
                "Handler": "bootstrap"
            }
        },
        "Table1": {
            "Type": "AWS::DynamoDB::Table",
            "Properties": {
                "BillingMode": "PAY_PER_REQUEST",
                "Tags": [{"Key": "Owner", "Value": "teamA"}]
            }
        },
        "FnRole": {
            "Type": "AWS::IAM::Role",
            "Properties": {
                "AssumeRolePolicyDocument": {},
                "Tags": [{"Key": "Owner", "Value": "teamA"}]
            }
        },
        "HttpApi": {
            "Type": "AWS::ApiGatewayV2::Api",
            "Properties": {
                "ProtocolType": "HTTP"
            }
        },
        "Bucket": {
            "Type": "AWS::S3::Bucket"
        }
    },
    "Outputs": {
        "FnName": {"Value": {"Ref": "Fn1"}}
    }
}"#;

pub fn config_with_tags(tags: serde_json::Value) -> DeploymentConfig {
    serde_json::from_value(serde_json::json!({
        "service": "orders",
        "provider": {
            "name": "aws",
            "stage": "prod",
            "region": "eu-west-2",
            "stackTags": tags,
        },
    }))
    .unwrap()
}

pub fn get_tagger(tags: serde_json::Value) -> ResourceTagger {
    ResourceTagger::new(&config_with_tags(tags), &InvocationOptions::default()).unwrap()
}
