//! Yes/no confirmation before destructive work.

use std::io::{self, BufRead, Write};

use colored::*;

/// Answer to a confirmation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Not asked: the session is non-interactive.
    Bypassed,
}

impl Answer {
    pub fn proceeds(self) -> bool {
        !matches!(self, Answer::No)
    }
}

/// Something that can be asked whether to go on.
pub trait ConfirmationGate {
    fn ask(&mut self, question: &str) -> Answer;
}

/// Prompts on stdout and reads the answer from stdin.
///
/// A non-interactive gate never prompts and always answers [`Answer::Bypassed`].
pub struct ShellGate<R = io::StdinLock<'static>, W = io::Stdout> {
    interactive: bool,
    input: R,
    output: W,
}

impl ShellGate {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> ShellGate<R, W> {
    pub fn with_io(interactive: bool, input: R, output: W) -> Self {
        Self {
            interactive,
            input,
            output,
        }
    }

    fn prompt(&mut self, question: &str) -> io::Result<Answer> {
        write!(self.output, "{} {} ", question.yellow(), "[y/N]".dimmed())?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Answer::Yes,
            _ => Answer::No,
        })
    }
}

impl<R: BufRead, W: Write> ConfirmationGate for ShellGate<R, W> {
    fn ask(&mut self, question: &str) -> Answer {
        if !self.interactive {
            return Answer::Bypassed;
        }
        // unreadable input counts as a refusal
        self.prompt(question).unwrap_or_else(|e| {
            tracing::warn!("failed to read confirmation answer: {}", e);
            Answer::No
        })
    }
}

/// Gate with a fixed answer, for scripted runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedGate(pub Answer);

impl ConfirmationGate for FixedGate {
    fn ask(&mut self, question: &str) -> Answer {
        tracing::debug!(question, answer = ?self.0, "confirmation answered without prompting");
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(interactive: bool, typed: &str) -> (Answer, String) {
        let mut out = Vec::new();
        let answer = ShellGate::with_io(interactive, typed.as_bytes(), &mut out).ask("Continue?");
        (answer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_yes_answers() {
        assert_eq!(ask(true, "y\n").0, Answer::Yes);
        assert_eq!(ask(true, "YES\n").0, Answer::Yes);
    }

    #[test]
    fn test_default_is_no() {
        assert_eq!(ask(true, "\n").0, Answer::No);
        assert_eq!(ask(true, "").0, Answer::No);
        assert_eq!(ask(true, "nope\n").0, Answer::No);
    }

    #[test]
    fn test_non_interactive_bypasses_without_prompting() {
        let (answer, printed) = ask(false, "n\n");
        assert_eq!(answer, Answer::Bypassed);
        assert!(answer.proceeds());
        assert!(printed.is_empty());
    }

    #[test]
    fn test_prompt_is_printed() {
        let (_, printed) = ask(true, "y\n");
        assert!(printed.contains("Continue?"));
    }
}
