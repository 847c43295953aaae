use engine::ConfigError;
use model::{ModelError, WidgetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The operation is not legal in the view's current lifecycle state.
    BadState {
        state: &'static str,
        op: &'static str,
    },
    Config(ConfigError),
    Model(ModelError),
    UnknownWidget(WidgetId),
    UnknownModelName { name: String },
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewError::BadState { state, op } => {
                write!(f, "cannot {op} while the view is {state}")
            }
            ViewError::Config(err) => write!(f, "{err}"),
            ViewError::Model(err) => write!(f, "{err}"),
            ViewError::UnknownWidget(id) => write!(f, "no widget model with id {}", id.0),
            ViewError::UnknownModelName { name } => {
                write!(f, "no widget class registered as {name:?}")
            }
        }
    }
}

impl std::error::Error for ViewError {}

impl From<ConfigError> for ViewError {
    fn from(err: ConfigError) -> Self {
        ViewError::Config(err)
    }
}

impl From<ModelError> for ViewError {
    fn from(err: ModelError) -> Self {
        ViewError::Model(err)
    }
}
