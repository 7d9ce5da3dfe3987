//! Executes the action list produced by an evaluation.

use std::collections::BTreeMap;

use crate::model::action::{Action, Vacation};
use crate::model::mail::MailAdapter;
use crate::model::message::ParsedMessage;
use crate::sieve::error::{Result, SieveError};

/// Side effects the host performs on behalf of the dispatcher.
pub trait ActionContext {
    /// Stores `message` in `folder` of the `recipient`'s mailbox.
    fn deliver(&mut self, recipient: &str, folder: &str, message: &[u8]) -> Result<()>;

    /// Forwards `message` unchanged with the given envelope.
    fn send(&mut self, sender: Option<&str>, recipients: &[String], message: &[u8]) -> Result<()>;

    /// Sends a newly composed notice back to the original sender.
    fn reply(&mut self, sender: &str, recipients: &[String], message: &str) -> Result<()>;
}

/// Last recipient each loop-sensitive action was handled for, kept with the
/// message so a re-entering message is recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopMarkers {
    markers: BTreeMap<String, String>,
}

impl LoopMarkers {
    /// Fails if `action` was already handled for `recipient`, records it otherwise.
    pub fn check_and_mark(&mut self, action: &str, recipient: &str) -> Result<()> {
        if self
            .markers
            .get(action)
            .is_some_and(|marked| marked.eq_ignore_ascii_case(recipient))
        {
            return Err(SieveError::LoopDetected {
                action: action.to_string(),
                recipient: recipient.to_string(),
            });
        }
        self.markers
            .insert(action.to_string(), recipient.to_string());
        Ok(())
    }

    pub fn get(&self, action: &str) -> Option<&str> {
        self.markers.get(action).map(String::as_str)
    }
}

/// Headers a vacation reply looks for the recipient in.
const ADDRESSED_HEADERS: [&str; 6] = ["to", "cc", "bcc", "resent-to", "resent-cc", "resent-bcc"];

/// One message in transit: its envelope, raw bytes and loop markers.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    pub message: Vec<u8>,
    pub markers: LoopMarkers,
    subject: Option<String>,
    message_id: Option<String>,
    auto_submitted: bool,
    /// Addresses the message was visibly sent to.
    addressed_to: Vec<String>,
}

impl Delivery {
    pub fn new(sender: Option<String>, recipients: Vec<String>, message: &ParsedMessage) -> Self {
        let auto_submitted = message
            .first_header("Auto-Submitted")
            .is_some_and(|value| !value.trim().eq_ignore_ascii_case("no"));
        Self {
            // The null reverse path is no sender at all
            sender: sender.filter(|s| !s.is_empty() && s != "<>"),
            recipients,
            message: message.raw().to_vec(),
            markers: LoopMarkers::default(),
            subject: message.first_header("Subject"),
            message_id: message.first_header("Message-ID"),
            auto_submitted,
            addressed_to: ADDRESSED_HEADERS
                .iter()
                .flat_map(|name| message.addresses(name))
                .map(|address| address.address())
                .collect(),
        }
    }

    /// Whether `recipient` or one of its `alternates` appears in a
    /// destination header of the message.
    pub fn is_addressed_to(&self, recipient: &str, alternates: &[String]) -> bool {
        std::iter::once(recipient)
            .chain(alternates.iter().map(String::as_str))
            .map(|address| address.trim().trim_start_matches('<').trim_end_matches('>'))
            .any(|wanted| {
                self.addressed_to
                    .iter()
                    .any(|address| address.eq_ignore_ascii_case(wanted))
            })
    }

    /// The single recipient an action is performed for.
    pub fn sole_recipient(&self, action: &str) -> Result<&str> {
        match self.recipients.as_slice() {
            [recipient] => Ok(recipient),
            other => Err(SieveError::Recipients {
                action: action.to_string(),
                count: other.len(),
            }),
        }
    }
}

pub struct ActionDispatcher {
    inbox: String,
}

impl ActionDispatcher {
    pub fn new(inbox: impl Into<String>) -> Self {
        Self {
            inbox: inbox.into(),
        }
    }

    /// Runs every action in order. The first failure, a detected loop
    /// included, aborts the rest.
    pub fn dispatch(
        &self,
        actions: &[Action],
        delivery: &mut Delivery,
        context: &mut dyn ActionContext,
    ) -> Result<()> {
        for action in actions {
            let recipient = delivery.sole_recipient(action.name())?.to_string();
            if action.is_loop_sensitive() {
                if let Err(e) = delivery.markers.check_and_mark(action.name(), &recipient) {
                    tracing::warn!(
                        context = "sieve",
                        event = "loop-detected",
                        action = action.name(),
                        recipient = recipient.as_str(),
                    );
                    return Err(e);
                }
            }
            tracing::info!(
                context = "sieve",
                event = "dispatch",
                action = action.name(),
                recipient = recipient.as_str(),
            );

            match action {
                Action::Keep => context.deliver(&recipient, &self.inbox, &delivery.message)?,
                Action::FileInto { destination } => {
                    context.deliver(&recipient, destination, &delivery.message)?
                }
                Action::Redirect { address } => context.send(
                    delivery.sender.as_deref(),
                    std::slice::from_ref(address),
                    &delivery.message,
                )?,
                Action::Reject { message } => {
                    let Some(sender) = delivery.sender.clone() else {
                        tracing::info!(context = "sieve", event = "reject-skipped", reason = "no sender");
                        continue;
                    };
                    let notice = compose_notice(
                        &recipient,
                        &sender,
                        &format!(
                            "Message rejected: {}",
                            delivery.subject.as_deref().unwrap_or("(no subject)")
                        ),
                        delivery.message_id.as_deref(),
                        false,
                        message,
                    );
                    context.reply(&recipient, &[sender], &notice)?;
                }
                Action::Vacation(vacation) => {
                    self.vacation(vacation, &recipient, delivery, context)?;
                }
            }
        }
        Ok(())
    }

    fn vacation(
        &self,
        vacation: &Vacation,
        recipient: &str,
        delivery: &Delivery,
        context: &mut dyn ActionContext,
    ) -> Result<()> {
        let Some(sender) = delivery.sender.clone() else {
            tracing::info!(context = "sieve", event = "vacation-skipped", reason = "no sender");
            return Ok(());
        };
        if delivery.auto_submitted {
            tracing::info!(context = "sieve", event = "vacation-skipped", reason = "auto-submitted");
            return Ok(());
        }
        if !delivery.is_addressed_to(recipient, &vacation.addresses) {
            tracing::info!(context = "sieve", event = "vacation-skipped", reason = "not addressed");
            return Ok(());
        }

        let from = vacation.from.as_deref().unwrap_or(recipient);
        let subject = match (&vacation.subject, &delivery.subject) {
            (Some(subject), _) => subject.clone(),
            (None, Some(original)) => format!("Auto: {original}"),
            (None, None) => "Automated reply".to_string(),
        };
        let notice = compose_notice(
            from,
            &sender,
            &subject,
            delivery.message_id.as_deref(),
            vacation.mime,
            &vacation.reason,
        );
        tracing::debug!(
            context = "sieve",
            event = "vacation",
            days = vacation.days,
            handle = vacation.handle.as_deref().unwrap_or(""),
        );
        context.reply(from, &[sender], &notice)
    }
}

/// A minimal RFC 822 notice. With `mime` the body already carries its own
/// MIME headers.
pub fn compose_notice(
    from: &str,
    to: &str,
    subject: &str,
    in_reply_to: Option<&str>,
    mime: bool,
    body: &str,
) -> String {
    let mut notice = format!("From: <{from}>\r\nTo: <{to}>\r\nSubject: {subject}\r\n");
    if let Some(id) = in_reply_to {
        notice.push_str(&format!("In-Reply-To: {id}\r\nReferences: {id}\r\n"));
    }
    notice.push_str("Auto-Submitted: auto-replied\r\n");
    if mime {
        notice.push_str("MIME-Version: 1.0\r\n");
        notice.push_str(body);
    } else {
        notice.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        notice.push_str(body);
        if !body.ends_with('\n') {
            notice.push_str("\r\n");
        }
    }
    notice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory_store::{MemoryStore, Reply};

    const MESSAGE: &str = "From: alice@example.org\r\n\
To: Bob <bob@example.com>\r\n\
Subject: Lunch\r\n\
Message-ID: <1@example.org>\r\n\
\r\n\
Noon?\r\n";

    fn delivery(recipients: &[&str]) -> Delivery {
        Delivery::new(
            Some("alice@example.org".to_string()),
            recipients.iter().map(|r| r.to_string()).collect(),
            &ParsedMessage::parse(MESSAGE),
        )
    }

    #[test]
    fn test_keep_and_fileinto_deliver() {
        let mut store = MemoryStore::default();
        let mut delivery = delivery(&["bob@example.com"]);
        let actions = [
            Action::Keep,
            Action::FileInto {
                destination: "Lists".to_string(),
            },
        ];
        ActionDispatcher::new("INBOX")
            .dispatch(&actions, &mut delivery, &mut store)
            .unwrap();

        assert_eq!(store.delivered.len(), 2);
        assert_eq!(store.delivered[0].folder, "INBOX");
        assert_eq!(store.delivered[1].folder, "Lists");
        assert_eq!(store.delivered[1].recipient, "bob@example.com");
        assert_eq!(store.delivered[1].message, MESSAGE.as_bytes());
    }

    #[test]
    fn test_redirect_loop_aborts_dispatch() {
        let mut store = MemoryStore::default();
        let mut delivery = delivery(&["bob@example.com"]);
        let redirect = Action::Redirect {
            address: "carol@example.net".to_string(),
        };
        let actions = [redirect.clone(), redirect, Action::Keep];
        let result = ActionDispatcher::new("INBOX").dispatch(&actions, &mut delivery, &mut store);

        assert!(matches!(
            result,
            Err(SieveError::LoopDetected { ref action, ref recipient })
                if action == "redirect" && recipient == "bob@example.com"
        ));
        assert_eq!(store.sent.len(), 1);
        assert!(store.delivered.is_empty());
    }

    #[test]
    fn test_recipient_count_is_enforced() {
        let dispatcher = ActionDispatcher::new("INBOX");
        for recipients in [&[][..], &["a@x", "b@x"][..]] {
            let mut store = MemoryStore::default();
            let mut delivery = delivery(recipients);
            assert!(matches!(
                dispatcher.dispatch(&[Action::Keep], &mut delivery, &mut store),
                Err(SieveError::Recipients { count, .. }) if count == recipients.len()
            ));
        }
    }

    #[test]
    fn test_reject_notice() {
        let mut store = MemoryStore::default();
        let mut delivery = delivery(&["bob@example.com"]);
        let actions = [Action::Reject {
            message: "Not interested".to_string(),
        }];
        ActionDispatcher::new("INBOX")
            .dispatch(&actions, &mut delivery, &mut store)
            .unwrap();

        let Reply {
            sender,
            recipients,
            message,
        } = &store.replies[0];
        assert_eq!(sender, "bob@example.com");
        assert_eq!(recipients, &["alice@example.org"]);
        assert!(message.contains("Subject: Message rejected: Lunch\r\n"));
        assert!(message.contains("In-Reply-To: <1@example.org>\r\n"));
        assert!(message.ends_with("Not interested\r\n"));
    }

    fn away(addresses: &[&str]) -> Action {
        Action::Vacation(Vacation {
            days: 7,
            subject: None,
            from: None,
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            mime: false,
            handle: None,
            reason: "Away".to_string(),
        })
    }

    fn replies_to(message: &str, recipient: &str, vacation: Action) -> usize {
        let mut store = MemoryStore::default();
        let mut delivery = Delivery::new(
            Some("alice@example.org".to_string()),
            vec![recipient.to_string()],
            &ParsedMessage::parse(message),
        );
        ActionDispatcher::new("INBOX")
            .dispatch(&[vacation], &mut delivery, &mut store)
            .unwrap();
        store.replies.len()
    }

    #[test]
    fn test_vacation_skips_auto_submitted() {
        let auto_replied = format!("Auto-Submitted: auto-replied\r\n{MESSAGE}");
        assert_eq!(replies_to(&auto_replied, "bob@example.com", away(&[])), 0);

        let generated = format!("Auto-Submitted: Auto-Generated; owner=x\r\n{MESSAGE}");
        assert_eq!(replies_to(&generated, "bob@example.com", away(&[])), 0);

        let explicit_no = format!("Auto-Submitted: no\r\n{MESSAGE}");
        assert_eq!(replies_to(&explicit_no, "bob@example.com", away(&[])), 1);
    }

    #[test]
    fn test_vacation_needs_the_recipient_in_a_destination_header() {
        // Only there through Bcc or a list
        assert_eq!(replies_to(MESSAGE, "robert@example.com", away(&[])), 0);
        assert_eq!(
            replies_to(MESSAGE, "robert@example.com", away(&["BOB@example.com"])),
            1
        );

        let resent = "From: alice@example.org\r\nResent-To: robert@example.com\r\n\r\nHi\r\n";
        assert_eq!(replies_to(resent, "<robert@example.com>", away(&[])), 1);
    }

    #[test]
    fn test_vacation_needs_a_sender() {
        let vacation = away(&[]);
        let dispatcher = ActionDispatcher::new("INBOX");

        let mut store = MemoryStore::default();
        let mut with_sender = delivery(&["bob@example.com"]);
        dispatcher
            .dispatch(std::slice::from_ref(&vacation), &mut with_sender, &mut store)
            .unwrap();
        assert_eq!(store.replies.len(), 1);
        assert!(store.replies[0].message.contains("Subject: Auto: Lunch\r\n"));

        let mut store = MemoryStore::default();
        let mut null_sender = Delivery::new(
            Some("<>".to_string()),
            vec!["bob@example.com".to_string()],
            &ParsedMessage::parse(MESSAGE),
        );
        dispatcher
            .dispatch(&[vacation], &mut null_sender, &mut store)
            .unwrap();
        assert!(store.replies.is_empty());
    }

    #[test]
    fn test_markers_are_per_action() {
        let mut markers = LoopMarkers::default();
        markers.check_and_mark("redirect", "a@x").unwrap();
        markers.check_and_mark("reject", "a@x").unwrap();
        markers.check_and_mark("redirect", "b@x").unwrap();
        assert_eq!(markers.get("redirect"), Some("b@x"));
        assert!(markers.check_and_mark("redirect", "B@X").is_err());
    }
}
