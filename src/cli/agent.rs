//! Agent command handlers (interactive chat, single ask, resume).

use anyhow::Result;
use tokio::sync::mpsc;

use chefbot::agent::{AgentEvent, AgentLoop, TurnOutcome};
use chefbot::session::Interrupt;

use super::common::{create_agent, load_config, prompt, read_line};

const QUIT_WORDS: &[&str] = &["q", "quit", "exit", "종료"];

/// Longest tool result echoed to the terminal, in characters.
const RESULT_PREVIEW_CHARS: usize = 120;

enum Step<'a> {
    Turn(&'a str),
    Resume(&'a str),
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::ToolCall {
            name, arguments, ..
        } => {
            println!("  [tool] {} {}", name, arguments);
        }
        AgentEvent::ToolResult {
            name,
            content,
            is_error,
            ..
        } => {
            let mut preview: String = content.chars().take(RESULT_PREVIEW_CHARS).collect();
            if content.chars().count() > RESULT_PREVIEW_CHARS {
                preview.push_str("...");
            }
            let marker = if *is_error { "error" } else { "ok" };
            println!("  [{}] {} -> {}", marker, name, preview);
        }
        AgentEvent::AnswerChunk { .. } | AgentEvent::Interrupt(_) => {}
    }
}

/// Run one step while printing tool progress as it happens.
async fn run_step(agent: &AgentLoop, thread_id: &str, step: Step<'_>) -> Result<TurnOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let work = async move {
        let tx = tx;
        match step {
            Step::Turn(text) => agent.run_turn(thread_id, text, Some(&tx)).await,
            Step::Resume(decision) => agent.resume(thread_id, decision, Some(&tx)).await,
        }
    };
    let printer = async {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    };

    let (outcome, ()) = tokio::join!(work, printer);
    Ok(outcome?)
}

fn print_interrupt(interrupt: &Interrupt) {
    println!();
    println!("{}", interrupt.awaiting);
    println!("({})", interrupt.reason);
}

fn print_outcome(outcome: &TurnOutcome, thread_id: &str, interactive: bool) {
    match outcome {
        TurnOutcome::Answer(text) => {
            println!();
            println!("{}", text);
            println!();
        }
        TurnOutcome::Interrupted(interrupt) => {
            print_interrupt(interrupt);
            if !interactive {
                println!();
                println!(
                    "Continue with: chefbot resume --thread {} <yes|no>",
                    thread_id
                );
            }
        }
    }
}

/// Interactive chat. While an interrupt is pending the next line is taken as
/// the decision.
pub(crate) async fn cmd_chat(thread_id: String) -> Result<()> {
    let config = load_config()?;
    let agent = create_agent(&config)?;

    let mut pending = agent.store().load(&thread_id).await?.pending_interrupt;

    println!("ChefBot");
    println!(
        "Thread '{}'. Type your message and press Enter. Type 'q' or '종료' to stop.",
        thread_id
    );
    println!();
    if let Some(interrupt) = &pending {
        print_interrupt(interrupt);
    }

    loop {
        prompt("> ")?;
        let Some(input) = read_line()? else {
            println!();
            break;
        };
        if input.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&input.to_lowercase().as_str()) {
            println!("Goodbye!");
            break;
        }

        let step = if pending.is_some() {
            Step::Resume(&input)
        } else {
            Step::Turn(&input)
        };

        match run_step(&agent, &thread_id, step).await {
            Ok(outcome) => {
                print_outcome(&outcome, &thread_id, true);
                pending = outcome.interrupt().cloned();
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
            }
        }
    }

    Ok(())
}

/// Single-message mode.
pub(crate) async fn cmd_ask(message: String, thread_id: String) -> Result<()> {
    let config = load_config()?;
    let agent = create_agent(&config)?;

    let outcome = run_step(&agent, &thread_id, Step::Turn(&message)).await?;
    print_outcome(&outcome, &thread_id, false);
    Ok(())
}

/// Answer a pending interrupt from the command line.
pub(crate) async fn cmd_resume(thread_id: String, decision: String) -> Result<()> {
    let config = load_config()?;
    let agent = create_agent(&config)?;

    let outcome = run_step(&agent, &thread_id, Step::Resume(&decision)).await?;
    print_outcome(&outcome, &thread_id, false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_words() {
        for word in ["q", "exit", "quit", "종료"] {
            assert!(QUIT_WORDS.contains(&word));
        }
        assert!(!QUIT_WORDS.contains(&"안녕"));
    }
}
