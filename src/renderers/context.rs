use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::utils::error::Error;

/// Per-request context threaded through every render stage: the caller's
/// cancellation token plus key/value fields stages include in their logs.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    cancellation: CancellationToken,
    fields: Vec<(String, String)>,
}

impl RenderContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        RenderContext {
            cancellation,
            fields: Vec::new(),
        }
    }

    /// Returns a child context carrying one more log field.
    pub fn with_value(&self, key: &str, value: impl fmt::Display) -> Self {
        let mut fields = self.fields.clone();
        fields.push((key.to_string(), value.to_string()));

        RenderContext {
            cancellation: self.cancellation.clone(),
            fields,
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn check_cancelled(&self) -> Result<(), Error> {
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(())
    }
}

impl fmt::Display for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
