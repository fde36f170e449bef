use textlens_lib::services::config_store::{AppConfig, ConfigStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // `textlens init-config` writes a default config file and exits.
    if args.get(1).map(String::as_str) == Some("init-config") {
        let dir = ConfigStore::default_config_dir()
            .ok_or_else(|| anyhow::anyhow!("no config directory available on this platform"))?;
        let store = ConfigStore::new(dir);
        let mut config = store.load()?;
        if config.version.is_empty() {
            config = AppConfig {
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..config
            };
        }
        store.save(&config)?;
        println!("Config written to {}", store.config_file().display());
        return Ok(());
    }

    textlens_lib::run().await
}
