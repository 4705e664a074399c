pub type StripResult<T> = Result<T, StripError>;

/// Crate-wide error taxonomy.
///
/// Variants map onto how callers are expected to react: source and load failures abort the
/// current operation, effect failures and single live-photo encoding failures are degraded
/// locally, validation failures are raised before any rendering work starts.
#[derive(thiserror::Error, Debug)]
pub enum StripError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("load failure: {0}")]
    LoadFailure(String),

    #[error("encoding unavailable: {0}")]
    EncodingUnavailable(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("effect unavailable: {0}")]
    EffectUnavailable(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("rendering unavailable: {0}")]
    RenderingUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StripError {
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::LoadFailure(msg.into())
    }

    pub fn encoding_unavailable(msg: impl Into<String>) -> Self {
        Self::EncodingUnavailable(msg.into())
    }

    pub fn encoding_failed(msg: impl Into<String>) -> Self {
        Self::EncodingFailed(msg.into())
    }

    pub fn effect_unavailable(msg: impl Into<String>) -> Self {
        Self::EffectUnavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn rendering(msg: impl Into<String>) -> Self {
        Self::RenderingUnavailable(msg.into())
    }

    /// `true` for failures a component may swallow and degrade from (effects, encoding).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EffectUnavailable(_) | Self::EncodingUnavailable(_) | Self::EncodingFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            StripError::source_unavailable("x")
                .to_string()
                .contains("source unavailable:")
        );
        assert!(StripError::load("x").to_string().contains("load failure:"));
        assert!(
            StripError::encoding_unavailable("x")
                .to_string()
                .contains("encoding unavailable:")
        );
        assert!(
            StripError::encoding_failed("x")
                .to_string()
                .contains("encoding failed:")
        );
        assert!(
            StripError::effect_unavailable("x")
                .to_string()
                .contains("effect unavailable:")
        );
        assert!(
            StripError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            StripError::rendering("x")
                .to_string()
                .contains("rendering unavailable:")
        );
    }

    #[test]
    fn recoverable_covers_effects_and_encoding_only() {
        assert!(StripError::effect_unavailable("x").is_recoverable());
        assert!(StripError::encoding_failed("x").is_recoverable());
        assert!(StripError::encoding_unavailable("x").is_recoverable());
        assert!(!StripError::load("x").is_recoverable());
        assert!(!StripError::validation("x").is_recoverable());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = StripError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
