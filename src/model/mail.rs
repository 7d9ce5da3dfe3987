use crate::model::action::Action;
use crate::model::address::MailAddress;

/// Read-only view of one message plus its append-only action list.
///
/// Implemented by the host; the interpreter never mutates anything but the
/// action list.
pub trait MailAdapter {
    /// All values of a header, case-insensitive on the name, in message order.
    fn header(&self, name: &str) -> Vec<String>;

    /// Mailboxes of every address-list header called `name`, groups
    /// flattened, in message order.
    fn addresses(&self, name: &str) -> Vec<MailAddress>;

    fn header_names(&self) -> Vec<String>;

    /// SMTP reverse path. `Some("")` is the null sender `<>`.
    fn envelope_from(&self) -> Option<String>;

    fn envelope_to(&self) -> Option<String>;

    /// Message size in bytes.
    fn size(&self) -> u64;

    fn body(&self) -> &[u8];

    fn add_action(&mut self, action: Action);

    fn actions(&self) -> &[Action];
}
