pub mod deepseek;
mod http_errors;

use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

use crate::request::CompletionRequest;

/// Status and body exactly as received. Non-2xx statuses are not errors at
/// this layer; the API reports failures in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + 'a>>;

pub trait CompletionTransport {
    fn send<'a>(&'a self, request: &'a CompletionRequest) -> TransportFuture<'a>;
}
