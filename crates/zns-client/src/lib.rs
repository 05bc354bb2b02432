//! Zalo Notification Service (ZNS) client library.
//!
//! Sends pre-approved template messages to phone numbers over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use zns_client::{TemplateMessage, ZnsClient, ZnsConfig};
//!
//! # async fn example() -> Result<(), zns_client::ZnsError> {
//! let client = ZnsClient::new(ZnsConfig::new("access-token"))?;
//!
//! let message = TemplateMessage::new("84901234567", "420761")
//!     .with_field("tenantName", "Lan")
//!     .with_tracking_id("invoice_42");
//! let receipt = client.send_template(&message).await?;
//! println!("Accepted: {}", receipt.message);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::ZnsClient;
pub use config::ZnsConfig;
pub use error::ZnsError;
pub use types::{SendReceipt, SentMessage, TemplateMessage};
