/// Convenience alias for results produced by this crate.
pub type KilnResult<T> = Result<T, KilnError>;

/// Error type shared across the pipeline.
///
/// Pipeline-internal conditions (a missing surface at draw time, an unknown
/// returned resource id, an empty frame build) are absorbed where they occur
/// and never show up here; these variants cover caller-supplied malformed
/// input and environment failures at the crate boundary.
#[derive(thiserror::Error, Debug)]
pub enum KilnError {
    /// Malformed caller input (mismatched array lengths, bad dimensions).
    #[error("validation error: {0}")]
    Validation(String),

    /// A paint or raster operation could not be carried out.
    #[error("paint error: {0}")]
    Paint(String),

    /// Serialized picture data could not be read or written.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other underlying failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KilnError {
    /// Build a [`KilnError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KilnError::Paint`].
    pub fn paint(msg: impl Into<String>) -> Self {
        Self::Paint(msg.into())
    }

    /// Build a [`KilnError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            KilnError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(KilnError::paint("x").to_string().contains("paint error:"));
        assert!(
            KilnError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = KilnError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
