use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("no palette matches the provided data")]
    NoMatch,
    #[error("more than one palette matches exactly (score {score}): {}", names.join(", "))]
    Ambiguous { score: u32, names: Vec<String> },
    #[error("unknown palette `{0}`")]
    UnknownPalette(String),
    #[error("invalid palette configuration for `{selector}`: {message}")]
    Configuration { selector: String, message: String },
}
