use std::process::ExitCode;

/// How a command finished, and what to say about it.
#[derive(Debug)]
pub struct Exit {
    failed: bool,
    message: Option<String>,
}

impl Exit {
    #[must_use]
    pub fn success() -> Self {
        Self {
            failed: false,
            message: None,
        }
    }

    #[must_use]
    pub fn error() -> Self {
        Self {
            failed: true,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn report(self) -> ExitCode {
        if let Some(message) = self.message {
            eprintln!("{message}");
        }
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
