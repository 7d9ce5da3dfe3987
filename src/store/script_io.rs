use std::fs;
use std::path::Path;

use crate::model::message::ParsedMessage;
use crate::sieve::error::{Result, SieveError};

pub fn load_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        SieveError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

/// Reads an RFC 822 message byte for byte.
pub fn load_message(path: &Path) -> Result<ParsedMessage> {
    let bytes = fs::read(path).map_err(|e| {
        SieveError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    Ok(ParsedMessage::parse(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mail::MailAdapter;

    #[test]
    fn test_missing_file_names_the_path() {
        let err = load_script(Path::new("/nonexistent/filter.sieve")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/filter.sieve"));
    }

    #[test]
    fn test_load_message_size_matches_the_file() {
        let path = std::env::temp_dir().join(format!("sieve-engine-msg-{}.eml", std::process::id()));
        fs::write(&path, b"Subject: caf\xe9\r\n\r\nd\xe9j\xe0\r\n").unwrap();
        let on_disk = fs::metadata(&path).unwrap().len();
        let message = load_message(&path).unwrap();
        assert_eq!(message.size(), on_disk);
        assert_eq!(message.raw(), fs::read(&path).unwrap().as_slice());
        assert_eq!(message.body(), b"d\xe9j\xe0\r\n");
        let _ = fs::remove_file(&path);
    }
}
