use serde::Serialize;

use crate::sieve::dispatcher::ActionContext;
use crate::sieve::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivered {
    pub recipient: String,
    pub folder: String,
    pub message: Vec<u8>,
}

/// A message forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sent {
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    pub message: Vec<u8>,
}

/// A notice composed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub sender: String,
    pub recipients: Vec<String>,
    pub message: String,
}

/// Records every side effect instead of performing it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryStore {
    pub delivered: Vec<Delivered>,
    pub sent: Vec<Sent>,
    pub replies: Vec<Reply>,
}

impl ActionContext for MemoryStore {
    fn deliver(&mut self, recipient: &str, folder: &str, message: &[u8]) -> Result<()> {
        self.delivered.push(Delivered {
            recipient: recipient.to_string(),
            folder: folder.to_string(),
            message: message.to_vec(),
        });
        Ok(())
    }

    fn send(&mut self, sender: Option<&str>, recipients: &[String], message: &[u8]) -> Result<()> {
        self.sent.push(Sent {
            sender: sender.map(str::to_string),
            recipients: recipients.to_vec(),
            message: message.to_vec(),
        });
        Ok(())
    }

    fn reply(&mut self, sender: &str, recipients: &[String], message: &str) -> Result<()> {
        self.replies.push(Reply {
            sender: sender.to_string(),
            recipients: recipients.to_vec(),
            message: message.to_string(),
        });
        Ok(())
    }
}
