use std::fmt;

use crate::errors::BotError;

/// Identifier of a job, chosen by whoever proposes it
///
/// # Invariants
/// - Must not be empty
/// - Must not contain ':' (the wire field separator)
/// - Must not contain whitespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    /// Creates a new JobId
    ///
    /// # Example
    /// ```
    /// use botsync::protocol::JobId;
    ///
    /// let id = JobId::new("42").expect("valid job id");
    /// assert_eq!(id.as_str(), "42");
    /// assert!(JobId::new("4:2").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, BotError> {
        let id = id.into();
        if Self::is_valid(&id) {
            Ok(JobId(id))
        } else {
            Err(BotError::MalformedMessage(format!("Invalid job id: {:?}", id)))
        }
    }

    fn is_valid(id: &str) -> bool {
        !id.is_empty() && !id.contains(':') && !id.contains(char::is_whitespace)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_numeric_id() {
        assert!(JobId::new("42").is_ok());
    }

    #[test]
    fn valid_uuid_like_id() {
        assert!(JobId::new("5f0c-aa-17").is_ok());
    }

    #[test]
    fn invalid_empty_id() {
        assert!(JobId::new("").is_err());
    }

    #[test]
    fn invalid_id_with_separator() {
        assert!(JobId::new("a:b").is_err());
    }

    #[test]
    fn invalid_id_with_whitespace() {
        assert!(JobId::new("a b").is_err());
    }

    #[test]
    fn job_id_display() {
        let id = JobId::new("999").unwrap();
        assert_eq!(format!("{}", id), "999");
    }
}
