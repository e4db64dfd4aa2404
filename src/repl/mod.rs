//! Interactive terminal loop
//!
//! Reads a line, hands it to the routing agent, prints the answer. A failed
//! turn prints its error and the loop keeps going; only `exit`/`quit` or EOF
//! end the session.

use std::io::{self, BufRead, Write};

use colored::*;
use log::error;

use crate::agent::RoutingAgent;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::tools::ToolRouter;

/// Check for the exit commands, case-insensitive, surrounding whitespace
/// ignored.
pub fn should_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Run the interactive loop until exit or EOF.
pub async fn run<L, T>(agent: &RoutingAgent<L, T>) -> Result<()>
where
    L: LlmClient,
    T: ToolRouter,
{
    println!(
        "{}",
        "Medical data agent ready. Ask a question, or type 'exit' to stop.".cyan()
    );

    let stdin = io::stdin();
    loop {
        print!("{} ", "You:".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            // EOF: behave like exit
            println!();
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if should_exit(input) {
            println!("{}", "Goodbye!".cyan());
            break;
        }

        match agent.answer(input).await {
            Ok(answer) => {
                println!("\n{} {}\n", "Agent:".blue().bold(), answer.text);
            }
            Err(e) => {
                error!("turn failed: {}", e);
                println!("\n{} {}\n", "Error:".red().bold(), e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_exact() {
        assert!(should_exit("exit"));
        assert!(should_exit("quit"));
    }

    #[test]
    fn test_should_exit_case_insensitive() {
        assert!(should_exit("EXIT"));
        assert!(should_exit("Quit"));
        assert!(should_exit("qUiT"));
    }

    #[test]
    fn test_should_exit_trims_whitespace() {
        assert!(should_exit("  exit  "));
        assert!(should_exit("\tquit\n"));
    }

    #[test]
    fn test_should_exit_rejects_other_input() {
        assert!(!should_exit("exit now"));
        assert!(!should_exit("how many patients?"));
        assert!(!should_exit(""));
        assert!(!should_exit("quitting"));
    }
}
