pub type FormfillResult<T> = Result<T, FormfillError>;

#[derive(thiserror::Error, Debug)]
pub enum FormfillError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("field render error: {0}")]
    Field(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FormfillError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn asset_not_found(msg: impl Into<String>) -> Self {
        Self::AssetNotFound(msg.into())
    }

    pub fn field(msg: impl Into<String>) -> Self {
        Self::Field(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FormfillError::schema("x")
                .to_string()
                .contains("schema error:")
        );
        assert!(
            FormfillError::asset_not_found("x")
                .to_string()
                .contains("asset not found:")
        );
        assert!(
            FormfillError::field("x")
                .to_string()
                .contains("field render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FormfillError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
