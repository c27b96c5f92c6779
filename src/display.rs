//! Terminal rendering for summaries and answers.

use crate::openai::AnswerOutcome;
use colored::Colorize;

/// Split a summary into sentence bullets, each ending with a period
pub fn summary_bullets(summary: &str) -> Vec<String> {
    summary
        .replace('\n', " ")
        .split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.ends_with('.') {
                s.to_string()
            } else {
                format!("{s}.")
            }
        })
        .collect()
}

pub fn print_summary(summary: &str) {
    println!("{}", "📝 Summary:".green().bold());
    for bullet in summary_bullets(summary) {
        println!("  • {bullet}");
    }
}

pub fn print_answer(outcome: AnswerOutcome) {
    let answered = outcome.is_answered();
    let text = outcome.into_text();
    println!("{}", "💡 Answer:".green().bold());
    if answered {
        println!("  {text}");
    } else {
        println!("  {}", text.yellow());
    }
}
