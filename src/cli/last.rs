use crate::cli::AppContext;
use crate::error::Result;
use crate::ui;

/// Run the last command
pub fn run_last(ctx: &AppContext, json_output: bool, clear: bool) -> Result<()> {
    if clear {
        if ctx.storage.clear_last_answers()? {
            ui::print_success("Saved answers removed");
        } else {
            ui::print_info("No saved answers");
        }
        return Ok(());
    }

    let Some(snapshot) = ctx.storage.last_answers()? else {
        ui::print_info("No completed session yet");
        return Ok(());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Last session: {}", snapshot.saved_at.format("%Y-%m-%d %H:%M UTC"));
    println!("{}", "-".repeat(60));
    for (i, exchange) in snapshot.answers.iter().enumerate() {
        let question = if exchange.question.is_empty() {
            format!("질문 {}", i + 1)
        } else {
            exchange.question.clone()
        };
        println!("{}", console::style(question).dim());
        println!("  {}", exchange.answer);
    }
    Ok(())
}
