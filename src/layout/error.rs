use std::any::Any;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("{engine} solver panicked: {message}")]
    SolverPanicked {
        engine: &'static str,
        message: String,
    },
    #[error("{engine} solver produced a non-finite position for node `{node}`")]
    NonFinite { engine: &'static str, node: String },
}

impl LayoutError {
    pub(super) fn from_panic(engine: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::SolverPanicked { engine, message }
    }
}
