//! Ensure a namespace and repository exist, then print what the
//! registry holds.
//!
//! Expects `REGISTRY_ENDPOINT`, `REGISTRY_API_TOKEN` and
//! `REGISTRY_INSTANCE_ID` in the environment.

use registry_control::RegistryConfiguration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = RegistryConfiguration::from_env()?;
    let client = config.client()?;

    client.ensure_namespace("demo").await?;
    client.ensure_repository("demo", "app").await?;

    for namespace in client.list_namespaces().await? {
        println!("{namespace}");
        for repository in client.list_repositories(&namespace).await? {
            println!("  {repository}");
            let tags = client
                .list_image_tags((namespace.as_str(), repository.as_str()))
                .await?;
            for tag in tags {
                println!("    {tag}");
            }
        }
    }

    Ok(())
}
