//! panlog-client - HTTP client for the appliance XML log-retrieval API
//!
//! The appliance exposes log retrieval as asynchronous jobs: a fetch request
//! returns a job id, and the job is then polled until it reports `FIN` (with
//! entries) or `FAIL`. This crate issues those requests and decodes the XML
//! envelopes; it never sleeps or loops. [`ApplianceClient::poll_job`] performs
//! exactly one status check per invocation, which pushes the retry/backoff
//! policy up to the orchestrator where it can be tested without wall-clock
//! waits.
//!
//! # Example
//!
//! ```rust,no_run
//! use panlog_client::{ApplianceClient, JobPoll};
//! use panlog_core::{LogKind, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), panlog_client::ClientError> {
//!     let client = ApplianceClient::new("panorama.example.net")?;
//!     let token = client.keygen("admin", "secret").await?;
//!     let session = Session::new("panorama.example.net", token, 1);
//!
//!     let job = client.start_fetch(&session, LogKind::Config, Some(100), 0).await?;
//!     loop {
//!         match client.poll_job(&session, LogKind::Config, &job).await? {
//!             JobPoll::Pending => tokio::time::sleep(std::time::Duration::from_secs(2)).await,
//!             JobPoll::Completed(entries) => {
//!                 println!("{} entries", entries.len());
//!                 break;
//!             }
//!             JobPoll::Failed(reason) => {
//!                 eprintln!("job failed: {reason}");
//!                 break;
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The [`testing`] module provides [`testing::FakeAppliance`], an in-process
//! server speaking the same XML protocol with scriptable job outcomes.

mod client;
mod error;
pub mod testing;

pub use client::{ApplianceClient, JobHandle, JobPoll};
pub use error::{ClientError, Result};
