//! Records a provider credential into `config.json`'s `api_keys` map.
//!
//! Acquiring the credential itself (OAuth flows, device codes) is left to
//! the embedding application; this command only recognizes the handful of
//! environment variables the remote ingestor collaborator reads from.

use arc_query::ArcError;

use crate::context::RuntimeContext;

fn env_var_for(provider: &str) -> anyhow::Result<&'static str> {
    match provider {
        "github" => Ok("GITHUB_TOKEN"),
        "linear" => Ok("LINEAR_API_KEY"),
        "notion" => Ok("NOTION_API_KEY"),
        "jira" => Ok("ARC_JIRA_TOKEN"),
        other => Err(ArcError::InvalidInput(format!("unknown provider '{other}'; expected github, linear, notion, or jira")).into()),
    }
}

pub fn run(ctx: &RuntimeContext, provider: &str) -> anyhow::Result<()> {
    let env_var = env_var_for(provider)?;
    let token = std::env::var(env_var).map_err(|_| ArcError::AuthError(format!("{env_var} is not set")))?;

    let mut config = ctx.config.clone();
    config.api_keys.insert(provider.to_string(), token);
    arc_config::config::save_config(&ctx.config_root, &config)?;

    if !ctx.quiet {
        println!("stored credential for '{provider}' read from {env_var}");
    }
    Ok(())
}
