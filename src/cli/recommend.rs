use crate::cli::key_cmd::require_api_key;
use crate::cli::{print_recommendations, AppContext};
use crate::error::{Result, WizardError};
use crate::transcript::Transcript;
use crate::ui;
use serde_json::json;

/// Run the recommend command
pub async fn run_recommend(ctx: &AppContext, answers: Vec<String>, json_output: bool) -> Result<()> {
    let answers: Vec<String> = answers.into_iter().map(|a| a.trim().to_string()).collect();
    if answers.iter().any(String::is_empty) {
        return Err(WizardError::InvalidInput("Answers must not be empty".to_string()));
    }

    let mut store = ctx.settings_store();
    let settings = store.initialize().await?.clone();
    if answers.len() > settings.step_count() {
        ui::print_warning(&format!(
            "{} answers given for {} questions",
            answers.len(),
            settings.step_count()
        ));
    }

    let api_key = require_api_key(ctx)?;
    let client = ctx.api_client(&settings, &api_key)?;
    let transcript = Transcript::from_answers(&settings.questions, &answers);

    let spinner = (!json_output).then(|| ui::Spinner::new("Finding gift ideas..."));
    let result = client.recommendations(&transcript).await;
    if let Some(spinner) = spinner {
        match &result {
            Ok(_) => spinner.finish_and_clear(),
            Err(_) => spinner.finish_with_error("Request failed"),
        }
    }
    let completion = result?;

    if let Err(e) = ctx.storage.set_last_answers(transcript.exchanges()) {
        tracing::warn!(error = %e, "could not save answers");
    }

    if json_output {
        let output = json!({
            "keywords": completion.value.keywords,
            "descriptions": completion.value.descriptions,
            "model": client.model(),
            "total_tokens": completion.total_tokens,
            "cached": completion.from_cache,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_recommendations(&completion.value, client.model(), completion.total_tokens);
    }
    Ok(())
}
