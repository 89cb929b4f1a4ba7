use crate::cli::key_cmd::require_api_key;
use crate::cli::{print_recommendations, AppContext};
use crate::error::{Result, WizardError};
use crate::llm::ChatTransport;
use crate::ui;
use crate::wizard::{Question, QuestionSource, Wizard};
use tracing::Instrument;
use uuid::Uuid;

/// Run the interactive wizard
pub async fn run_ask(ctx: &AppContext) -> Result<()> {
    if !ui::is_interactive() {
        return Err(WizardError::InvalidInput(
            "The wizard needs a terminal; use `giftwizard recommend --answer ...` instead".to_string(),
        ));
    }

    let mut store = ctx.settings_store();
    let spinner = ui::Spinner::new("Loading settings...");
    let settings = match store.initialize().await {
        Ok(settings) => {
            spinner.finish_and_clear();
            settings.clone()
        }
        Err(e) => {
            spinner.finish_with_error("Could not load settings");
            return Err(e);
        }
    };

    let api_key = require_api_key(ctx)?;
    let client = ctx.api_client(&settings, &api_key)?;
    let mut wizard = Wizard::new(&settings, &client);

    let session = Uuid::new_v4();
    run_session(ctx, &mut wizard)
        .instrument(tracing::info_span!("session", id = %session))
        .await
}

async fn run_session<T: ChatTransport>(ctx: &AppContext, wizard: &mut Wizard<'_, T>) -> Result<()> {
    loop {
        tracing::info!("wizard started");
        if !wizard.common_description().is_empty() {
            ui::print_info(wizard.common_description());
            ui::print_blank();
        }

        while let Some(question) = wizard.current().cloned() {
            let (step, total) = wizard.progress();
            let answer = ask_question(&question, step, total)?;

            let spinner = (step < total).then(|| ui::Spinner::new("Preparing the next question..."));
            let result = wizard.answer(&answer).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            match result {
                Ok(_) => {}
                Err(WizardError::InvalidInput(message)) => ui::print_warning(&message),
                Err(e) => return Err(e),
            }
        }

        recommend_until_done(ctx, wizard).await?;

        ui::print_blank();
        if !ui::prompt_confirm("Start over with new answers?", false)? {
            return Ok(());
        }
        wizard.restart();
        ui::print_blank();
    }
}

fn ask_question(question: &Question, step: usize, total: usize) -> Result<String> {
    let heading = format!("[{}/{}] {}", step, total, question.text);
    if !question.description.is_empty() {
        println!("{}", console::style(&question.description).dim());
    }
    if question.source == QuestionSource::Generated {
        tracing::debug!(step, "showing generated question");
    }

    ui::prompt_answer(&heading, &question.chips)
}

async fn recommend_until_done<T: ChatTransport>(ctx: &AppContext, wizard: &Wizard<'_, T>) -> Result<()> {
    loop {
        let spinner = ui::Spinner::new("Finding gift ideas...");
        match wizard.recommend().await {
            Ok(completion) => {
                spinner.finish_and_clear();
                if let Err(e) = ctx.storage.set_last_answers(wizard.transcript().exchanges()) {
                    tracing::warn!(error = %e, "could not save answers");
                }
                ui::print_blank();
                print_recommendations(&completion.value, wizard.model(), completion.total_tokens);
                return Ok(());
            }
            Err(e) => {
                spinner.finish_with_error(&e.to_string());
                if !ui::prompt_confirm("Try again?", true)? {
                    return Err(e);
                }
            }
        }
    }
}
