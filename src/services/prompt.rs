use std::io::{self, BufRead, Write};

/// What the operator is being asked to locate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// e.g. `Fallout4.ini`
    pub marker: String,
    /// e.g. `C:/Users/Your Name/Documents/My Games/Fallout4`
    pub example: String,
}

/// Interactive fallback used when no probe could locate a folder.
#[cfg_attr(test, mockall::automock)]
pub trait PathPrompt: Send + Sync {
    /// Ask for a directory.
    ///
    /// `rejected` carries the previous answer when it did not name an existing
    /// directory. Returns `None` when no answer can be obtained.
    fn ask_directory(&self, request: &PromptRequest, rejected: Option<String>) -> Option<String>;
}

/// Prompt on stdout, answer on stdin. End of input yields `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl PathPrompt for ConsolePrompt {
    fn ask_directory(&self, request: &PromptRequest, rejected: Option<String>) -> Option<String> {
        let mut stdout = io::stdout().lock();
        if let Some(previous) = rejected {
            let _ = writeln!(
                stdout,
                "'{}' is not a valid or existing directory path. Please try again.",
                previous
            );
        } else {
            let _ = writeln!(
                stdout,
                "> > > PLEASE ENTER THE FULL DIRECTORY PATH WHERE YOUR {} IS LOCATED < < <",
                request.marker
            );
        }
        let _ = write!(stdout, "(EXAMPLE: {} | Press ENTER to confirm.)\n> ", request.example);
        let _ = stdout.flush();
        drop(stdout);

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) => None,
            Ok(_) => Some(answer.trim().to_string()),
            Err(e) => {
                tracing::warn!("Could not read from console: {}", e);
                None
            }
        }
    }
}

/// Prompt for unattended runs: never answers, so an unresolvable folder stops the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompt;

impl PathPrompt for NonInteractivePrompt {
    fn ask_directory(&self, request: &PromptRequest, _rejected: Option<String>) -> Option<String> {
        tracing::warn!(
            "No interactive input available to locate the folder containing {}",
            request.marker
        );
        None
    }
}
