use crate::cli::{AppContext, KeyCommands};
use crate::config;
use crate::error::{Result, WizardError};
use crate::llm::validate_api_key;
use crate::storage::API_KEY_KEY;
use crate::ui;

/// Where a resolved API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// `--api-key` or `OPENAI_API_KEY`
    Flag,
    /// Output of `api.key_command`
    Command,
    /// Saved with `key set` or by a previous session
    Stored,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Flag => write!(f, "--api-key / OPENAI_API_KEY"),
            KeySource::Command => write!(f, "api.key_command"),
            KeySource::Stored => write!(f, "stored key"),
        }
    }
}

/// Run key subcommands
pub fn run_key(ctx: &AppContext, command: KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Set { key } => set_key(ctx, key),
        KeyCommands::Clear => clear_key(ctx),
        KeyCommands::Status => key_status(ctx),
    }
}

/// Find the API key, trying the flag, the key command and the store in that order
pub fn resolve_api_key(ctx: &AppContext) -> Result<Option<(String, KeySource)>> {
    if let Some(key) = ctx.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(Some((key.to_string(), KeySource::Flag)));
    }

    if let Some(command) = ctx.config.api.key_command.as_deref().filter(|c| !c.trim().is_empty()) {
        tracing::debug!("running api.key_command");
        return Ok(Some((config::get_api_key_from_command(command)?, KeySource::Command)));
    }

    Ok(ctx
        .storage
        .get(API_KEY_KEY)?
        .filter(|k| !k.is_empty())
        .map(|key| (key, KeySource::Stored)))
}

/// Resolve the API key, asking for one interactively when none is configured
pub(crate) fn require_api_key(ctx: &AppContext) -> Result<String> {
    if let Some((key, source)) = resolve_api_key(ctx)? {
        tracing::debug!(source = %source, "using API key");
        return Ok(key);
    }
    if !ui::is_interactive() {
        return Err(WizardError::Configuration(
            "No API key found. Use --api-key, OPENAI_API_KEY or `giftwizard key set`".to_string(),
        ));
    }

    let key = ui::prompt_password("OpenAI API key:")?;
    let key = key.trim();
    validate_api_key(key)?;
    let remember = ui::prompt_confirm("Remember this key for later sessions?", false)?;
    keep_prompted_key(ctx, key, remember)?;
    Ok(key.to_string())
}

/// Store a key entered at the prompt only when the user asked for it
fn keep_prompted_key(ctx: &AppContext, key: &str, remember: bool) -> Result<()> {
    if remember {
        ctx.storage.set(API_KEY_KEY, key)?;
        ui::print_success(&format!("API key saved to {}", ctx.storage.path().display()));
    } else {
        tracing::debug!("API key used for this session only");
    }
    Ok(())
}

fn set_key(ctx: &AppContext, key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None if ui::is_interactive() => ui::prompt_password("OpenAI API key:")?,
        None => {
            return Err(WizardError::InvalidInput(
                "API key required (pass it as an argument)".to_string(),
            ))
        }
    };
    let key = key.trim();
    validate_api_key(key)?;
    ctx.storage.set(API_KEY_KEY, key)?;
    ui::print_success(&format!("Stored API key {}", mask_key(key)));
    Ok(())
}

fn clear_key(ctx: &AppContext) -> Result<()> {
    if ctx.storage.remove(API_KEY_KEY)? {
        ui::print_success("Stored API key removed");
    } else {
        ui::print_info("No API key stored");
    }
    Ok(())
}

fn key_status(ctx: &AppContext) -> Result<()> {
    match resolve_api_key(ctx)? {
        Some((key, source)) => {
            println!("{} (from {})", mask_key(&key), source);
            if let Err(e) = validate_api_key(&key) {
                ui::print_warning(&e.to_string());
            }
        }
        None => ui::print_info("No API key configured"),
    }
    Ok(())
}

/// Show only the start and end of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::KvStore;
    use tempfile::tempdir;

    fn context(dir: &std::path::Path, flag: Option<&str>, command: Option<&str>) -> AppContext {
        let mut config = Config::default();
        config.api.key_command = command.map(str::to_string);
        AppContext::new(
            config,
            dir.join("config.toml"),
            KvStore::open(dir),
            flag.map(str::to_string),
        )
    }

    #[test]
    fn test_flag_wins_over_store() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), Some("sk-flag"), None);
        ctx.storage.set(API_KEY_KEY, "sk-stored").unwrap();

        let (key, source) = resolve_api_key(&ctx).unwrap().unwrap();
        assert_eq!(key, "sk-flag");
        assert_eq!(source, KeySource::Flag);
    }

    #[cfg(unix)]
    #[test]
    fn test_key_command_wins_over_store() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), None, Some("echo sk-command"));
        ctx.storage.set(API_KEY_KEY, "sk-stored").unwrap();

        let (key, source) = resolve_api_key(&ctx).unwrap().unwrap();
        assert_eq!(key, "sk-command");
        assert_eq!(source, KeySource::Command);
    }

    #[test]
    fn test_falls_back_to_stored_key() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), Some("  "), None);
        assert!(resolve_api_key(&ctx).unwrap().is_none());

        ctx.storage.set(API_KEY_KEY, "sk-stored").unwrap();
        let (key, source) = resolve_api_key(&ctx).unwrap().unwrap();
        assert_eq!(key, "sk-stored");
        assert_eq!(source, KeySource::Stored);
    }

    #[test]
    fn test_set_key_validates_and_stores() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), None, None);

        assert!(set_key(&ctx, Some("sk-short".to_string())).is_err());
        assert!(ctx.storage.get(API_KEY_KEY).unwrap().is_none());

        let valid = format!("sk-{}", "x".repeat(40));
        set_key(&ctx, Some(format!(" {} ", valid))).unwrap();
        assert_eq!(ctx.storage.get(API_KEY_KEY).unwrap(), Some(valid));
    }

    #[test]
    fn test_prompted_key_is_stored_only_on_request() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), None, None);
        let key = format!("sk-{}", "y".repeat(40));

        keep_prompted_key(&ctx, &key, false).unwrap();
        assert!(ctx.storage.get(API_KEY_KEY).unwrap().is_none());

        keep_prompted_key(&ctx, &key, true).unwrap();
        assert_eq!(ctx.storage.get(API_KEY_KEY).unwrap(), Some(key));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijklmnop"), "sk-abc…mnop");
        assert_eq!(mask_key("short"), "*****");
    }
}
