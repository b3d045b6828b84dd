//! Scripted in-memory [`Transport`] for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::transport::Transport;

/// What the mock answers for one call.
#[derive(Debug)]
pub enum MockReply {
    Value(Value),
    Error(ClientError),
    /// Answers after a delay.
    Delayed(Duration, Box<MockReply>),
    /// Never answers.
    Pending,
}

impl MockReply {
    pub fn value(value: Value) -> Self {
        MockReply::Value(value)
    }

    pub fn error(error: ClientError) -> Self {
        MockReply::Error(error)
    }

    pub fn delayed(delay: Duration, reply: MockReply) -> Self {
        MockReply::Delayed(delay, Box::new(reply))
    }
}

type Handler = dyn Fn(&str, &[Value]) -> MockReply + Send + Sync;

/// A transport whose answers come from a closure over `(method, params)`.
/// Every call is recorded.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockTransport {
    pub fn new<H>(handler: H) -> Self
    where
        H: Fn(&str, &[Value]) -> MockReply + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls made so far, in arrival order.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((method.to_string(), params.clone()));
        }

        let mut reply = (self.handler)(method, &params);
        loop {
            match reply {
                MockReply::Value(value) => return Ok(value),
                MockReply::Error(error) => return Err(error),
                MockReply::Delayed(delay, next) => {
                    tokio::time::sleep(delay).await;
                    reply = *next;
                }
                MockReply::Pending => return std::future::pending().await,
            }
        }
    }
}
