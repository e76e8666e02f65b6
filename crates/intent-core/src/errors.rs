//! Collaborator error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntentError {
    /// No stored credential; surfaced to the user as a setup hint, not a
    /// failure.
    #[error("no api key configured")]
    MissingCredential,

    #[error("model api request failed: {0}")]
    Http(String),

    /// The collaborator answered, but not with anything parseable.
    #[error("model reply was not a command: {0}")]
    Parse(String),

    #[error("credential store failure: {0}")]
    Store(String),
}
