use crate::ids::WidgetId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A child list referenced the same widget twice.
    DuplicateChild(WidgetId),
    MissingAttr(String),
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::DuplicateChild(id) => {
                write!(f, "duplicate child widget {}, only use each child once", id.0)
            }
            ModelError::MissingAttr(name) => write!(f, "attribute {name:?} is not set"),
            ModelError::TypeMismatch { name, expected } => {
                write!(f, "attribute {name:?} is not a {expected}")
            }
        }
    }
}

impl std::error::Error for ModelError {}
