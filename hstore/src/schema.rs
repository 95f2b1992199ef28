use async_trait::async_trait;
use hstore_common::ConditionalSync;

use crate::{HstoreError, Value};

/// A [`Schema`] validates every value offered for commit, and may normalize
/// it on the way through.
///
/// The store treats the schema as an external engine: whatever `parse`
/// returns is what gets persisted, and whatever error it produces is
/// surfaced to the committer unchanged. The deferred signature accommodates
/// engines that validate asynchronously; synchronous ones simply return
/// immediately.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Schema: ConditionalSync {
    /// Validate `value`, returning the (possibly normalized) value to
    /// persist, or a [`HstoreError::Validation`] describing the rejection.
    async fn parse(&self, value: Value) -> Result<Value, HstoreError>;
}

/// The permissive [`Schema`]: every value passes through untouched.
#[derive(Clone, Debug, Default)]
pub struct AnySchema;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Schema for AnySchema {
    async fn parse(&self, value: Value) -> Result<Value, HstoreError> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_passes_values_through_any_schema() -> anyhow::Result<()> {
        let value = Value::object([("key", Value::from("value"))]);
        let parsed = AnySchema.parse(value.clone()).await?;
        assert_eq!(parsed, value);
        Ok(())
    }
}
