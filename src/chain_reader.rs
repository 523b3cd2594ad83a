//! # Chain Reader
//!
//! The single seam through which the SDK touches the chain: a raw `eth_call`
//! against a target address with pre-encoded call data. Adapters encode and
//! decode on their own (see `contracts`), so any middleware, or an in-memory
//! double in tests, can stand behind [`ContractReader`].

use async_trait::async_trait;
use ethers::prelude::{Middleware, TransactionRequest};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::Bytes;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::contracts::ViewCall;
use crate::types::conversions::ConversionError;

/// Failure of a single contract read.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("eth_call {method} failed: {reason}")]
    Call { method: &'static str, reason: String },
    #[error("eth_call {method} timed out after {timeout:?}")]
    Timeout {
        method: &'static str,
        timeout: Duration,
    },
    #[error("failed to decode {method} output: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("{method} returned {actual_bytes} bytes, expected {expected_bytes}")]
    ShapeMismatch {
        method: &'static str,
        expected_bytes: usize,
        actual_bytes: usize,
    },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Read-only access to contract view functions.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Executes `call` and returns the raw ABI-encoded return data.
    async fn call(&self, call: &ViewCall) -> Result<Bytes, ReadError>;
}

/// [`ContractReader`] backed by an ethers middleware.
pub struct ProviderReader<M: Middleware> {
    provider: Arc<M>,
    timeout: Duration,
}

impl<M: Middleware> ProviderReader<M> {
    pub fn new(provider: Arc<M>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl<M> ContractReader for ProviderReader<M>
where
    M: Middleware + 'static,
{
    async fn call(&self, call: &ViewCall) -> Result<Bytes, ReadError> {
        let tx_request = TransactionRequest::new()
            .to(call.target)
            .data(call.call_data.clone());
        let typed_tx: TypedTransaction = tx_request.into();

        debug!("eth_call {} -> {:?}", call.signature, call.target);
        match tokio::time::timeout(self.timeout, self.provider.call(&typed_tx, None)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(ReadError::Call {
                method: call.signature,
                reason: e.to_string(),
            }),
            Err(_) => Err(ReadError::Timeout {
                method: call.signature,
                timeout: self.timeout,
            }),
        }
    }
}
