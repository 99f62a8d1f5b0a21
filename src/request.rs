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

use std::time::Duration;

use crate::address::is_valid_address;

/// Default idle timeout of a connection to an exchanger.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

/// A file attached to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content_type: String,
    pub filename: String,
    pub contents: Vec<u8>,
}

/// One message to be handed to the recipient's mail exchangers.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    from: String,
    to: String,
    from_name: Option<String>,
    reply_to: Option<String>,
    subject: String,
    text_body: Option<String>,
    html_body: Option<String>,
    attachments: Vec<Attachment>,
    upgrade_connection: bool,
    timeout: Duration,
}

impl DeliveryRequest {
    /// Creates a new request, failing if either address is malformed.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> crate::Result<Self> {
        let from = from.into();
        let to = to.into();

        for address in [&from, &to] {
            if !is_valid_address(address) {
                return Err(crate::Error::InvalidAddress(address.clone()));
            }
        }

        Ok(DeliveryRequest {
            from,
            to,
            from_name: None,
            reply_to: None,
            subject: String::new(),
            text_body: None,
            html_body: None,
            attachments: Vec::new(),
            upgrade_connection: true,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Sets the sender's display name.
    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = Some(name.into());
        self
    }

    /// Sets the Reply-To address.
    pub fn reply_to(mut self, address: impl Into<String>) -> crate::Result<Self> {
        let address = address.into();
        if is_valid_address(&address) {
            self.reply_to = Some(address);
            Ok(self)
        } else {
            Err(crate::Error::InvalidAddress(address))
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Adds an attachment.
    pub fn attachment(
        mut self,
        content_type: impl Into<String>,
        filename: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.attachments.push(Attachment {
            content_type: content_type.into(),
            filename: filename.into(),
            contents: contents.into(),
        });
        self
    }

    /// Attempt to upgrade the connection with STARTTLS (default `true`).
    pub fn upgrade_connection(mut self, upgrade_connection: bool) -> Self {
        self.upgrade_connection = upgrade_connection;
        self
    }

    /// Sets the idle timeout of each connection.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn get_from(&self) -> &str {
        &self.from
    }

    pub fn get_to(&self) -> &str {
        &self.to
    }

    pub fn get_from_name(&self) -> Option<&str> {
        self.from_name.as_deref()
    }

    pub fn get_reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    pub fn get_subject(&self) -> &str {
        &self.subject
    }

    pub fn get_text_body(&self) -> Option<&str> {
        self.text_body.as_deref()
    }

    pub fn get_html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }

    pub fn get_attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn get_upgrade_connection(&self) -> bool {
        self.upgrade_connection
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Domain whose exchangers receive the message.
    pub fn recipient_domain(&self) -> &str {
        domain_of(&self.to)
    }

    /// Domain announced in EHLO unless the transport overrides it.
    pub fn sender_domain(&self) -> &str {
        domain_of(&self.from)
    }
}

fn domain_of(address: &str) -> &str {
    address.rsplit_once('@').map_or("", |(_, domain)| domain)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{DeliveryRequest, DEFAULT_TIMEOUT};
    use crate::Error;

    #[test]
    fn build_request() {
        let request = DeliveryRequest::new("john@example.com", "jane@Example.ORG")
            .unwrap()
            .from_name("John Doe")
            .subject("Hi!")
            .text_body("Hello world!")
            .html_body("<h1>Hello, world!</h1>")
            .attachment("image/png", "pretzels.png", [1u8, 2, 3, 4].as_ref())
            .reply_to("replies@example.com")
            .unwrap();

        assert_eq!(request.get_from(), "john@example.com");
        assert_eq!(request.get_to(), "jane@Example.ORG");
        assert_eq!(request.get_from_name(), Some("John Doe"));
        assert_eq!(request.get_reply_to(), Some("replies@example.com"));
        assert_eq!(request.get_subject(), "Hi!");
        assert_eq!(request.get_attachments().len(), 1);
        assert_eq!(request.get_attachments()[0].contents, [1, 2, 3, 4]);
        assert_eq!(request.recipient_domain(), "Example.ORG");
        assert_eq!(request.sender_domain(), "example.com");
        assert!(request.get_upgrade_connection());
        assert_eq!(request.get_timeout(), DEFAULT_TIMEOUT);

        let request = request
            .upgrade_connection(false)
            .timeout(Duration::from_secs(1));
        assert!(!request.get_upgrade_connection());
        assert_eq!(request.get_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn reject_invalid_addresses() {
        for (from, to) in [
            ("john", "jane@example.org"),
            ("john@example.com", "jane"),
            ("", ""),
            ("john@example.com", "jane@localhost"),
        ] {
            assert!(matches!(
                DeliveryRequest::new(from, to),
                Err(Error::InvalidAddress(_))
            ));
        }

        assert!(matches!(
            DeliveryRequest::new("john@example.com", "jane@example.org")
                .unwrap()
                .reply_to("not an address"),
            Err(Error::InvalidAddress(_))
        ));
    }
}
