use thiserror::Error;

use crate::agent::AgentId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown name: {0}")]
    UnknownName(#[from] strum::ParseError),

    #[error("No applicable action for agent {0}")]
    NoApplicableAction(AgentId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_applicable_action_display() {
        let e = Error::NoApplicableAction(AgentId::Male);
        assert_eq!(e.to_string(), "No applicable action for agent M");
    }

    #[test]
    fn unknown_name_from_parse_error() {
        let e: Error = strum::ParseError::VariantNotFound.into();
        assert!(e.to_string().starts_with("Unknown name"));
    }
}
