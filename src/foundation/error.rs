/// Convenience result type used across campath.
pub type CampathResult<T> = Result<T, CampathError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum CampathError {
    /// Camera-path structure or options are missing fields or inconsistent.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A requested output channel is absent from a frame's render outputs.
    #[error("channel not found: '{channel}' (available: {})", available.join(", "))]
    ChannelNotFound {
        /// Requested channel name.
        channel: String,
        /// Channel names the renderer did produce for this frame.
        available: Vec<String>,
    },

    /// Image geometry disagrees within a frame or with the sink's bound geometry.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Destination path could not be created or written.
    #[error("resource error: {0}")]
    Resource(String),

    /// The scene renderer failed to produce outputs for a view.
    #[error("render error: {0}")]
    Render(String),

    /// Encoding a frame (image file or video container) failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The run was cancelled before completion.
    #[error("interrupted")]
    Interrupted,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CampathError {
    /// Build a [`CampathError::MalformedInput`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Build a [`CampathError::ChannelNotFound`] value.
    pub fn channel_not_found(channel: impl Into<String>, available: Vec<String>) -> Self {
        Self::ChannelNotFound {
            channel: channel.into(),
            available,
        }
    }

    /// Build a [`CampathError::ShapeMismatch`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Build a [`CampathError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`CampathError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CampathError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Return `true` for per-frame conditions that a run may continue past.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::ChannelNotFound { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
