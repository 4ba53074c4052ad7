use std::sync::Mutex;

use colored::Colorize;
use dialoguer::console::Term;
use dialoguer::Confirm;
use tracing::warn;

pub trait Prompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;

    fn notify(&self, message: &str);
}

#[derive(Clone, Debug, Default)]
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        match Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact_on(&Term::stderr())
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "confirmation prompt unavailable, treating as declined");
                false
            }
        }
    }

    fn notify(&self, message: &str) {
        println!(
            "{}{}{} {}",
            "[".bold().white(),
            "INF".bold().green(),
            "]".bold().white(),
            message
        );
    }
}

#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answer: bool,
    questions: Mutex<Vec<String>>,
    notices: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut q) = self.questions.lock() {
            q.push(message.to_string());
        }
        self.answer
    }

    fn notify(&self, message: &str) {
        if let Ok(mut n) = self.notices.lock() {
            n.push(message.to_string());
        }
    }
}

impl<P: Prompt + ?Sized> Prompt for &P {
    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }

    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}
