//! `contextclaw config` — Show the effective configuration.

use contextclaw_config::ContextConfig;

pub fn show(config: &ContextConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("# ContextClaw configuration");
    println!("# config dir: {}", ContextConfig::config_dir().display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
