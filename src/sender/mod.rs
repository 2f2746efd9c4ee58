pub mod client;
pub mod delivery;
pub mod transmission;

pub use client::{ClientConfig, ClientError, ConnectionStats, HttpClient};
pub use delivery::{RemoteDelivery, RemoteDeliveryError};
pub use transmission::{AttemptError, HttpTransport};

use crate::domain::LogRecord;
use crate::reliability::RetryPolicy;
use std::future::Future;

/// One delivery attempt of one record. Retrying is the caller's business.
pub trait RecordTransport: Send + Sync {
    fn transmit(
        &self,
        record: &LogRecord,
    ) -> impl Future<Output = Result<(), AttemptError>> + Send;
}

/// The primary sink. Resolves to the number of attempts used on success.
pub trait RemoteSink: Send + Sync {
    fn send(
        &self,
        record: &LogRecord,
    ) -> impl Future<Output = Result<u32, RemoteDeliveryError>> + Send;
}

/// Remote sink backed by the HTTP collector described by `policy`.
pub type HttpRemoteSink = RemoteDelivery<HttpTransport>;

impl HttpRemoteSink {
    pub fn from_policy(policy: RetryPolicy) -> Result<Self, ClientError> {
        let client = HttpClient::new(ClientConfig::from_policy(&policy))?;
        Ok(RemoteDelivery::new(HttpTransport::new(client), policy))
    }
}
