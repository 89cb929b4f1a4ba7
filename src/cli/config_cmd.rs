use crate::cli::{check_config, AppContext, ConfigCommands};
use crate::config::{self, Config};
use crate::error::Result;
use crate::ui;

/// Run config subcommands
pub fn run_config(ctx: &AppContext, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
        ConfigCommands::Init { force } => init_config(ctx, force),
    }
}

fn show_config(ctx: &AppContext) -> Result<()> {
    check_config(&ctx.config)?;

    let redacted = config::redact_config(&ctx.config);
    println!("{}", toml::to_string_pretty(&redacted)?);
    Ok(())
}

fn init_config(ctx: &AppContext, force: bool) -> Result<()> {
    let path = &ctx.config_path;

    if path.exists() && !force {
        ui::print_warning(&format!("Config file already exists at {}", path.display()));
        ui::print_info("Use --force to overwrite");
        return Ok(());
    }

    config::save_config_to(&Config::default(), path)?;
    ui::print_success(&format!("Created config file at {}", path.display()));
    ui::print_info("Set settings.source to share a settings document between machines");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_defaults_and_respects_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let ctx = AppContext::new(Config::default(), path.clone(), KvStore::open(dir.path()), None);

        init_config(&ctx, false).unwrap();
        let written = config::load_config_from(&path).unwrap();
        assert_eq!(written.api.timeout_seconds, 60);

        std::fs::write(&path, "[api]\ntimeout_seconds = 5\n").unwrap();
        init_config(&ctx, false).unwrap();
        assert_eq!(config::load_config_from(&path).unwrap().api.timeout_seconds, 5);

        init_config(&ctx, true).unwrap();
        assert_eq!(config::load_config_from(&path).unwrap().api.timeout_seconds, 60);
    }
}
