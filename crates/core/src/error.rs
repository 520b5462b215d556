#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Missing credential field: {0}")]
    MissingCredential(&'static str),
}
