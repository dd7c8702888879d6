use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use teloxide::{prelude::Requester, types::ChatId, Bot};
use tokio::sync::mpsc;

/// Domain events the handlers emit. The consumer task turns them into audit
/// lines and admin notifications; handlers never wait on either sink.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    SessionStarted {
        user: String,
        section: String,
    },
    SessionCompleted {
        user: String,
        section: String,
        score: usize,
        total: usize,
    },
}

impl AuditEvent {
    fn line(&self) -> String {
        match self {
            AuditEvent::SessionStarted { user, section } => {
                format!("{user} started '{section}'")
            }
            AuditEvent::SessionCompleted {
                user,
                section,
                score,
                total,
            } => format!("{user} finished '{section}' with {score}/{total}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl AuditLog {
    /// Spawns the consumer task. Both sinks are best-effort: a failed file
    /// append or admin send is logged at debug level and dropped.
    pub fn spawn(bot: Bot, path: PathBuf, admin_chat: Option<ChatId>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let line = event.line();

                if let Err(e) = append_line(&path, &line) {
                    log::debug!("audit file write failed: {e}");
                }

                if let Some(chat) = admin_chat {
                    if let Err(e) = bot.send_message(chat, line.as_str()).await {
                        log::debug!("admin notification failed: {e}");
                    }
                }
            }
        });

        Self { tx }
    }

    pub fn record(&self, event: AuditEvent) {
        // the receiver only goes away on shutdown
        let _ = self.tx.send(event);
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
