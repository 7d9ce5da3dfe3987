use serde::{Deserialize, Serialize};

/// A deferred effect recorded during evaluation and executed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Keep,
    FileInto { destination: String },
    Redirect { address: String },
    Reject { message: String },
    Vacation(Vacation),
}

/// Auto-reply parameters of the `vacation` extension (RFC 5230).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacation {
    pub days: u64,
    pub subject: Option<String>,
    pub from: Option<String>,
    /// Other addresses the recipient goes by; a reply needs one of them, or
    /// the recipient itself, in a destination header.
    pub addresses: Vec<String>,
    pub mime: bool,
    /// Names the response for the host's once-per-`days` bookkeeping.
    pub handle: Option<String>,
    pub reason: String,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::FileInto { .. } => "fileinto",
            Self::Redirect { .. } => "redirect",
            Self::Reject { .. } => "reject",
            Self::Vacation(_) => "vacation",
        }
    }

    /// Actions that send mail back out and so must be guarded against loops.
    pub fn is_loop_sensitive(&self) -> bool {
        matches!(self, Self::Redirect { .. } | Self::Reject { .. } | Self::Vacation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let action = Action::FileInto {
            destination: "Junk".to_string(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"action":"fileinto","destination":"Junk"}"#);
        assert_eq!(serde_json::to_string(&Action::Keep).unwrap(), r#"{"action":"keep"}"#);
    }

    #[test]
    fn test_loop_sensitivity() {
        assert!(!Action::Keep.is_loop_sensitive());
        assert!(Action::Redirect {
            address: "a@b".to_string()
        }
        .is_loop_sensitive());
    }
}
