use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::sieve::dispatcher::ActionContext;
use crate::sieve::error::{Result, SieveError};

const OUTBOX_DIR: &str = "outbox";

/// Envelope written next to every queued outbound message.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    kind: &'a str,
    sender: Option<&'a str>,
    recipients: &'a [String],
}

/// Delivers into `<root>/<recipient>/<folder>/` and queues outbound mail in
/// `<root>/outbox/`, one `.eml` file per message.
#[derive(Debug, Clone)]
pub struct FolderStore {
    root: PathBuf,
}

impl FolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder_path(&self, recipient: &str, folder: &str) -> Result<PathBuf> {
        let mut path = self.root.join(component(recipient)?);
        // `/` and `.` both separate folder levels
        for level in folder.split(['/', '.']) {
            path.push(component(level)?);
        }
        Ok(path)
    }

    pub fn outbox(&self) -> PathBuf {
        self.root.join(OUTBOX_DIR)
    }

    fn queue(&self, envelope: &Envelope, message: &[u8]) -> Result<PathBuf> {
        let path = write_message(&self.outbox(), message)?;
        let data = serde_json::to_string_pretty(envelope)?;
        fs::write(path.with_extension("json"), data)?;
        Ok(path)
    }
}

/// A single safe path component.
fn component(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() || name == ".." || name.contains(['/', '\\', '\0']) {
        Err(SieveError::Delivery(format!("Invalid mailbox name \"{name}\"")))
    } else {
        Ok(name)
    }
}

/// Writes `message` to the first free `<n>.eml` in `dir`.
fn write_message(dir: &Path, message: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut n = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "eml"))
        .count()
        + 1;
    loop {
        let path = dir.join(format!("{n}.eml"));
        if !path.exists() {
            fs::write(&path, message)?;
            return Ok(path);
        }
        n += 1;
    }
}

impl ActionContext for FolderStore {
    fn deliver(&mut self, recipient: &str, folder: &str, message: &[u8]) -> Result<()> {
        let dir = self.folder_path(recipient, folder)?;
        let path = write_message(&dir, message)?;
        tracing::debug!(context = "store", event = "deliver", path = %path.display());
        Ok(())
    }

    fn send(&mut self, sender: Option<&str>, recipients: &[String], message: &[u8]) -> Result<()> {
        let envelope = Envelope {
            kind: "send",
            sender,
            recipients,
        };
        let path = self.queue(&envelope, message)?;
        tracing::debug!(context = "store", event = "queue", path = %path.display());
        Ok(())
    }

    fn reply(&mut self, sender: &str, recipients: &[String], message: &str) -> Result<()> {
        let envelope = Envelope {
            kind: "reply",
            sender: Some(sender),
            recipients,
        };
        let path = self.queue(&envelope, message.as_bytes())?;
        tracing::debug!(context = "store", event = "queue", path = %path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sieve-engine-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_folder_paths() {
        let store = FolderStore::new("/var/mail");
        assert_eq!(
            store.folder_path("bob@example.com", "INBOX").unwrap(),
            PathBuf::from("/var/mail/bob@example.com/INBOX")
        );
        assert_eq!(
            store.folder_path("bob@example.com", "Lists/rust").unwrap(),
            PathBuf::from("/var/mail/bob@example.com/Lists/rust")
        );
        assert!(store.folder_path("bob", "../etc").is_err());
        assert!(store.folder_path("..", "INBOX").is_err());
        assert!(store.folder_path("bob", "").is_err());
    }

    #[test]
    fn test_deliver_and_queue() {
        let root = scratch("deliver");
        let mut store = FolderStore::new(&root);

        store.deliver("bob", "INBOX", b"one").unwrap();
        store.deliver("bob", "INBOX", b"tw\xf6").unwrap();
        assert_eq!(fs::read_to_string(root.join("bob/INBOX/1.eml")).unwrap(), "one");
        assert_eq!(fs::read(root.join("bob/INBOX/2.eml")).unwrap(), b"tw\xf6");

        store
            .send(Some("alice@x"), &["carol@y".to_string()], b"fwd")
            .unwrap();
        assert_eq!(fs::read_to_string(root.join("outbox/1.eml")).unwrap(), "fwd");
        let envelope: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(root.join("outbox/1.json")).unwrap())
                .unwrap();
        assert_eq!(envelope["kind"], "send");
        assert_eq!(envelope["recipients"][0], "carol@y");

        let _ = fs::remove_dir_all(&root);
    }
}
