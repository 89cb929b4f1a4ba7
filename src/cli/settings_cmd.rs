use crate::cli::{AppContext, SettingsCommands};
use crate::error::{Result, WizardError};
use crate::settings::{Settings, SettingsLayer, SettingsStore};
use crate::ui;
use std::path::Path;

/// Run settings subcommands
pub async fn run_settings(ctx: &AppContext, command: SettingsCommands) -> Result<()> {
    let mut store = ctx.settings_store();

    match command {
        SettingsCommands::Show => {
            store.initialize().await?;
            show_settings(&store)
        }
        SettingsCommands::Export => {
            store.initialize().await?;
            println!("{}", store.export()?);
            Ok(())
        }
        SettingsCommands::Import { file } => {
            store.initialize().await?;
            import_settings(&mut store, &file)
        }
        SettingsCommands::Reset => {
            let had_override = store.has_override()?;
            store.reset().await?;
            if had_override {
                ui::print_success("Local settings override removed");
            } else {
                ui::print_info("No local override; settings already at their defaults");
            }
            Ok(())
        }
        SettingsCommands::Validate => validate_settings(&mut store).await,
        SettingsCommands::Set { model, temperature } => {
            store.initialize().await?;
            set_settings(&mut store, model, temperature)
        }
    }
}

fn show_settings(store: &SettingsStore) -> Result<()> {
    let settings = store.settings();

    match store.source() {
        Some(source) => println!("Source:      {}", source),
        None => println!("Source:      built-in defaults"),
    }
    println!("Override:    {}", if store.has_override()? { "yes" } else { "no" });
    println!("Model:       {}", settings.model);
    println!("Temperature: {}", settings.temperature);
    println!();

    if !settings.common_description.is_empty() {
        println!("{}", console::style(&settings.common_description).dim());
        println!();
    }

    print_questions(settings);
    Ok(())
}

fn print_questions(settings: &Settings) {
    println!("{:<4} {:<8} {}", "#", "TYPE", "QUESTION");
    println!("{}", "-".repeat(60));
    for i in 0..settings.step_count() {
        let Some(question) = settings.question(i) else {
            continue;
        };
        println!("{:<4} {:<8} {}", i + 1, question.kind, question.text);
        if !question.chips.is_empty() {
            println!("{:<13} [{}]", "", question.chips.join(", "));
        }
    }
}

fn import_settings(store: &mut SettingsStore, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let settings = store.import(&content)?;
    ui::print_success(&format!(
        "Imported settings from {} ({} questions)",
        file.display(),
        settings.step_count()
    ));
    Ok(())
}

async fn validate_settings(store: &mut SettingsStore) -> Result<()> {
    let settings = store.initialize().await?;

    let mut warnings = Vec::new();
    if settings.prompts.recommendation_prompt.as_deref().map_or(true, |p| p.trim().is_empty()) {
        warnings.push("prompts.recommendationPrompt is not set; recommendations will fail");
    }
    if settings.prompts.next_question_prompt.as_deref().map_or(true, |p| p.trim().is_empty()) {
        warnings.push("prompts.nextQuestionPrompt is not set; ai questions will use their static text");
    }
    if crate::llm::estimate_cost(&settings.model, 0).is_none() {
        warnings.push("model has no known price; cost estimates are unavailable");
    }

    for warning in warnings {
        ui::print_warning(warning);
    }
    ui::print_success("Settings are valid");
    Ok(())
}

fn set_settings(store: &mut SettingsStore, model: Option<String>, temperature: Option<f64>) -> Result<()> {
    if model.is_none() && temperature.is_none() {
        return Err(WizardError::InvalidInput(
            "Nothing to change (use --model or --temperature)".to_string(),
        ));
    }

    let settings = store.save(SettingsLayer {
        model,
        temperature,
        ..SettingsLayer::default()
    })?;
    ui::print_success(&format!(
        "Saved settings (model {}, temperature {})",
        settings.model, settings.temperature
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_rejects_out_of_range_temperature() {
        let dir = tempdir().unwrap();
        let mut store = SettingsStore::new(KvStore::open(dir.path()), None);
        store.initialize().await.unwrap();

        assert!(set_settings(&mut store, None, None).is_err());
        assert!(matches!(
            set_settings(&mut store, None, Some(2.5)),
            Err(WizardError::Configuration(_))
        ));
        assert!(!store.has_override().unwrap());

        set_settings(&mut store, Some("gpt-4o".to_string()), Some(1.0)).unwrap();
        assert!(store.has_override().unwrap());
        assert_eq!(store.settings().model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_import_from_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("import.json");
        std::fs::write(&file, r#"{"model": "gpt-3.5-turbo", "apiEndpoint": "https://x"}"#).unwrap();

        let mut store = SettingsStore::new(KvStore::open(dir.path()), None);
        store.initialize().await.unwrap();
        import_settings(&mut store, &file).unwrap();
        assert_eq!(store.settings().model, "gpt-3.5-turbo");
        assert!(!store.export().unwrap().contains("apiEndpoint"));
    }
}
