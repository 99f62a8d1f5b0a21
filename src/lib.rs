/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

//! # mail-direct
//!
//! _mail-direct_ delivers e-mail messages straight to the recipient's mail
//! exchangers, without a relay or smarthost:
//!
//! - Resolves the recipient domain's **MX** records (falling back to the
//!   domain itself when it publishes none).
//! - Speaks **SMTP** (_RFC 5321_) to the exchangers directly on port 25.
//! - Opportunistically upgrades the connection with **STARTTLS**
//!   (_RFC 3207_), falling back to plaintext when the server refuses.
//! - Fails over to the next exchanger when one stops responding.
//! - Generates the message with [`mail-builder`](https://crates.io/crates/mail-builder).
//! - Full async (requires Tokio).
//!
//! ## Usage Example
//!
//! ```rust
//!     let request = DeliveryRequest::new("john@example.com", "jane@example.org")?
//!         .from_name("John Doe")
//!         .subject("Hi!")
//!         .html_body("<h1>Hello, world!</h1>")
//!         .text_body("Hello world!");
//!
//!     let outcome = DirectTransport::new()?.send(&request).await;
//!     if !outcome.success {
//!         eprintln!("Delivery failed: {}", outcome.error.unwrap());
//!     }
//! ```
//!
//! ## License
//!
//! Licensed under either of
//!
//!  * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//!  * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.
//!

pub mod address;
pub mod compose;
pub mod request;
pub mod resolve;
pub mod smtp;
pub mod transport;

use std::fmt::Display;

pub use address::is_valid_address;
pub use compose::{Composer, MessageComposer};
pub use mail_builder;
pub use request::{Attachment, DeliveryRequest};
pub use resolve::{Exchanger, MxResolver, Resolver, StaticResolver};
pub use transport::DirectTransport;

#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// TLS error
    Tls(rustls::Error),

    /// Invalid TLS name provided.
    InvalidTLSName,

    /// Malformed sender, recipient or reply-to address.
    InvalidAddress(String),

    /// DNS lookup failure.
    Dns(hickory_resolver::ResolveError),

    /// The recipient domain has no usable mail exchangers.
    NoExchangers(String),

    /// The message could not be built.
    Compose(std::io::Error),

    /// The server refused the mailbox.
    Rejected(smtp::reply::Reply),

    /// The server closed the session before the message was accepted.
    Closed(smtp::reply::Reply),

    /// The connection was closed unexpectedly.
    ConnectionClosed,

    /// Reply line exceeds the maximum length.
    ReplyTooLong,

    /// Connection timeout.
    Timeout,

    /// Every exchanger timed out.
    AllExchangersTimedOut,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result of one delivery.
#[derive(Debug)]
pub struct Outcome {
    pub success: bool,
    pub error: Option<Error>,
}

impl Outcome {
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl From<Result<()>> for Outcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Outcome {
                success: true,
                error: None,
            },
            Err(err) => Outcome {
                success: false,
                error: Some(err),
            },
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Tls(e) => write!(f, "TLS error: {}", e),
            Error::InvalidTLSName => write!(f, "Invalid TLS name provided"),
            Error::InvalidAddress(e) => write!(f, "Invalid e-mail address: {:?}", e),
            Error::Dns(e) => write!(f, "DNS lookup failed: {}", e),
            Error::NoExchangers(e) => write!(f, "No mail exchangers found for {}", e),
            Error::Compose(e) => write!(f, "Failed to build message: {}", e),
            Error::Rejected(e) => write!(f, "Rejected by server: {}", e),
            Error::Closed(e) => write!(f, "Connection closed by server: {}", e),
            Error::ConnectionClosed => write!(f, "Connection closed unexpectedly"),
            Error::ReplyTooLong => write!(f, "Reply line too long"),
            Error::Timeout => write!(f, "Connection timeout"),
            Error::AllExchangersTimedOut => write!(f, "all exchangers timed out"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Error::Tls(err)
    }
}

impl From<hickory_resolver::ResolveError> for Error {
    fn from(err: hickory_resolver::ResolveError) -> Self {
        Error::Dns(err)
    }
}

#[cfg(test)]
mod test {
    use crate::{smtp::reply::Reply, Error, Outcome};

    #[test]
    fn outcome_from_result() {
        let outcome = Outcome::from(Ok(()));
        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert!(outcome.into_result().is_ok());

        let outcome = Outcome::from(Err(Error::AllExchangersTimedOut));
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_ref().unwrap().to_string(),
            "all exchangers timed out"
        );
        assert!(matches!(
            outcome.into_result(),
            Err(Error::AllExchangersTimedOut)
        ));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            Error::Rejected(Reply::parse("550 5.1.1 User unknown")).to_string(),
            "Rejected by server: 550 5.1.1 User unknown"
        );
        assert_eq!(
            Error::InvalidAddress("jane".to_string()).to_string(),
            "Invalid e-mail address: \"jane\""
        );
    }
}
