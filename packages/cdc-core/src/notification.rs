//! Notifications emitted for change events and the sinks they go to.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::envelope::{ChangeEnvelope, Operation, RowSnapshot};

/// Human-readable notice about a `messages` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A row was inserted with status `pending`
    NewPending {
        id: String,
        content: String,
        status: String,
    },
    /// A row was updated
    Updated {
        id: String,
        content: String,
        status: String,
    },
    /// A row was deleted
    Deleted { id: String },
}

impl Notification {
    /// Builds the notification for a decoded envelope, if any.
    ///
    /// A missing snapshot for the operation yields `None` rather than an
    /// error; producers are not trusted to follow the presence rules.
    pub fn from_envelope(envelope: ChangeEnvelope) -> Option<Self> {
        match envelope.operation {
            Operation::Create => {
                let row = envelope.after?;
                row.is_pending().then(|| Notification::new_pending(row))
            }
            Operation::Update => envelope.after.map(|row| Notification::Updated {
                id: row.id,
                content: row.content,
                status: row.status,
            }),
            Operation::Delete => envelope.before.map(|row| Notification::Deleted { id: row.id }),
            Operation::Read | Operation::Unknown(_) => None,
        }
    }

    fn new_pending(row: RowSnapshot) -> Self {
        Notification::NewPending {
            id: row.id,
            content: row.content,
            status: row.status,
        }
    }

    /// Returns the id of the row this notification is about.
    pub fn id(&self) -> &str {
        match self {
            Notification::NewPending { id, .. }
            | Notification::Updated { id, .. }
            | Notification::Deleted { id } => id,
        }
    }

    /// Returns the banner title.
    pub fn title(&self) -> &'static str {
        match self {
            Notification::NewPending { .. } => "NEW PENDING MESSAGE",
            Notification::Updated { .. } => "MESSAGE UPDATED",
            Notification::Deleted { .. } => "MESSAGE DELETED",
        }
    }

    fn closing_rule(&self) -> &'static str {
        match self {
            Notification::NewPending { .. } => "==========================================",
            Notification::Updated { .. } | Notification::Deleted { .. } => {
                "======================================"
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "========== {} ==========", self.title())?;
        match self {
            Notification::NewPending {
                id,
                content,
                status,
            }
            | Notification::Updated {
                id,
                content,
                status,
            } => {
                writeln!(f, "ID:      {}", id)?;
                writeln!(f, "Content: {}", content)?;
                writeln!(f, "Status:  {}", status)?;
            }
            Notification::Deleted { id } => {
                writeln!(f, "ID:      {}", id)?;
            }
        }
        writeln!(f, "{}", self.closing_rule())?;
        writeln!(f)
    }
}

/// Destination for notifications.
pub trait NotificationSink: Send {
    /// Writes one notification.
    fn emit(&mut self, notification: &Notification) -> io::Result<()>;
}

/// Writes notification blocks to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn emit(&mut self, notification: &Notification) -> io::Result<()> {
        let mut out = io::stdout().lock();
        write!(out, "{}", notification)?;
        out.flush()
    }
}

/// Keeps notifications in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything emitted so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.notifications.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.lock().is_empty()
    }
}

impl NotificationSink for CollectingSink {
    fn emit(&mut self, notification: &Notification) -> io::Result<()> {
        self.notifications.lock().push(notification.clone());
        Ok(())
    }
}
