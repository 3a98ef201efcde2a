use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write message to `{command}`: {source}")]
    WriteBody {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Delivery { command: String, status: String },
}

/// Delivers a rendered report to a recipient. Delivery failure is reported to
/// the caller and never changes a test verdict.
pub trait Notifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Pipes an RFC 822 style message into the local `sendmail` binary.
#[derive(Debug, Clone)]
pub struct SendmailNotifier {
    command: String,
    from: Option<String>,
}

impl SendmailNotifier {
    pub fn new(from: Option<String>) -> Self {
        Self {
            command: "sendmail".to_string(),
            from,
        }
    }

    #[cfg(test)]
    fn with_command(command: impl Into<String>, from: Option<String>) -> Self {
        Self {
            command: command.into(),
            from,
        }
    }
}

impl Notifier for SendmailNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let mut child = Command::new(&self.command)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| NotifyError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let message = format_message(self.from.as_deref(), recipient, subject, body);
        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(message.as_bytes())
                .map_err(|source| NotifyError::WriteBody {
                    command: self.command.clone(),
                    source,
                })?;
        }
        drop(child.stdin.take());

        let status = child.wait().map_err(|source| NotifyError::Spawn {
            command: self.command.clone(),
            source,
        })?;
        if !status.success() {
            return Err(NotifyError::Delivery {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

fn format_message(from: Option<&str>, recipient: &str, subject: &str, body: &str) -> String {
    let mut message = String::new();
    if let Some(from) = from {
        message.push_str(&format!("From: {from}\n"));
    }
    message.push_str(&format!("To: {recipient}\nSubject: {subject}\n\n{body}"));
    message
}
