// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Selection-run parameters.

An open, named parameter bag handed unmodified from the caller to the probe
family's selector. The core itself only reads `seed` and `selector`; every
other entry is for the family's own algorithm variant.
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ProbeError, ProbeResult};

/// Option key for the candidate shuffling seed
pub const OPTION_SEED: &str = "seed";

/// Option key naming the selector variant
pub const OPTION_SELECTOR: &str = "selector";

/// Name of the built-in category-driven selector
pub const DEFAULT_SELECTOR: &str = "default";

/// Cooperative cancellation flag shared between a selection run and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next checkpoint.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Named parameters of one selection run
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    params: HashMap<String, Value>,
    cancel: Option<CancelToken>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(params: HashMap<String, Value>) -> Self {
        Self {
            params,
            cancel: None,
        }
    }

    /// Add a parameter (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Add a parameter in-place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with(OPTION_SEED, seed)
    }

    pub fn with_selector(self, name: &str) -> Self {
        self.with(OPTION_SELECTOR, name)
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Shuffling seed, if the caller asked for randomized tie-breaking
    pub fn seed(&self) -> Option<u64> {
        self.get_u64(OPTION_SEED)
    }

    /// Requested selector variant, [`DEFAULT_SELECTOR`] when absent
    pub fn selector(&self) -> &str {
        self.get_str(OPTION_SELECTOR).unwrap_or(DEFAULT_SELECTOR)
    }

    pub fn params(&self) -> &HashMap<String, Value> {
        &self.params
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelToken::is_cancelled)
    }

    /// Cancellation checkpoint between selection stages
    pub fn checkpoint(&self) -> ProbeResult<()> {
        if self.is_cancelled() {
            Err(ProbeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_bag() {
        let options = SelectOptions::new()
            .with_seed(42)
            .with("selector", "default")
            .with("ratio", 0.5)
            .with("strict", true);

        assert_eq!(options.seed(), Some(42));
        assert_eq!(options.get_str("selector"), Some("default"));
        assert_eq!(options.get_f64("ratio"), Some(0.5));
        assert_eq!(options.get_bool("strict"), Some(true));
        assert_eq!(options.get("missing"), None);
        assert_eq!(options.params().len(), 4);
    }

    #[test]
    fn test_from_map_passes_values_through() {
        let mut params = HashMap::new();
        params.insert("seed".to_string(), json!(7));
        params.insert("custom".to_string(), json!({"a": [1, 2]}));
        let options = SelectOptions::from_map(params);

        assert_eq!(options.seed(), Some(7));
        assert_eq!(options.get("custom"), Some(&json!({"a": [1, 2]})));
    }

    #[test]
    fn test_checkpoint() {
        let token = CancelToken::new();
        let options = SelectOptions::new().with_cancel_token(token.clone());
        assert!(options.checkpoint().is_ok());

        token.cancel();
        assert!(matches!(options.checkpoint(), Err(ProbeError::Cancelled)));

        token.reset();
        assert!(options.checkpoint().is_ok());
    }
}
