use std::{env, fs, process};

use stacktags::{
    handler_for, Client, DeploymentConfig, Handler, InvocationOptions, LifecyclePhase,
    ResourceTagger, Template,
};

const USAGE: &str =
    "Usage: cargo run --example cli -- <phase> <config.json> [template.json] [stage] [region]";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(error) = try_main().await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let [phase, config_path]: [_; 2] = env::args()
        .skip(1)
        .take(2)
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| USAGE)?;
    let phase: LifecyclePhase = phase.parse().map_err(|_| USAGE)?;

    let config: DeploymentConfig = serde_json::from_str(&fs::read_to_string(config_path)?)?;
    let options = InvocationOptions {
        stage: env::args().nth(4),
        region: env::args().nth(5),
    };
    let tagger = ResourceTagger::new(&config, &options)?;

    match handler_for(phase).ok_or(USAGE)? {
        Handler::ApplyStackTags => {
            let template_path = env::args().nth(3).ok_or(USAGE)?;
            let template: Template = fs::read_to_string(template_path)?.parse()?;

            let output = tagger.apply_stack_tags(template);
            for skipped in &output.skipped {
                eprintln!("skipped: {skipped}");
            }
            println!("{}", serde_json::to_string_pretty(&output.template)?);
        }
        Handler::TagDeployedResources => {
            let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
            if let Some(region) = tagger.region() {
                loader = loader.region(aws_config::Region::new(region.to_string()));
            }
            let client = Client::new(&loader.load().await);

            let output = tagger.tag_deployed_stack(&client).await?;
            eprintln!("=== Tagged {} resources ===", output.tagged.len());
            for logical_id in &output.tagged {
                eprintln!("- {logical_id}");
            }
        }
    }

    Ok(())
}
