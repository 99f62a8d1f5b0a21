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

use mail_builder::MessageBuilder;

use crate::request::DeliveryRequest;

/// End-of-data marker written after the last message line.
pub const END_OF_DATA: &[u8] = b"\r\n.\r\n";

/// Produces the lines written during the DATA phase.
pub trait Composer {
    /// Returns the message as wire lines, each one including its line
    /// terminator and already dot-stuffed, followed by [`END_OF_DATA`].
    fn compose(&self, request: &DeliveryRequest) -> crate::Result<Vec<Vec<u8>>>;
}

/// Builds RFC 5322 messages with `mail-builder`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageComposer;

impl Composer for MessageComposer {
    fn compose(&self, request: &DeliveryRequest) -> crate::Result<Vec<Vec<u8>>> {
        let mut message = match request.get_from_name() {
            Some(name) => MessageBuilder::new().from((name, request.get_from())),
            None => MessageBuilder::new().from(request.get_from()),
        }
        .to(request.get_to())
        .subject(request.get_subject());

        if let Some(reply_to) = request.get_reply_to() {
            message = message.reply_to(reply_to);
        }
        if let Some(body) = request.get_text_body() {
            message = message.text_body(body);
        }
        if let Some(body) = request.get_html_body() {
            message = message.html_body(body);
        }
        for attachment in request.get_attachments() {
            message = message.attachment(
                attachment.content_type.as_str(),
                attachment.filename.as_str(),
                attachment.contents.as_slice(),
            );
        }

        message
            .write_to_vec()
            .map(|message| into_lines(&message))
            .map_err(crate::Error::Compose)
    }
}

/// Splits a message into wire lines, applying the transparency procedure
/// (a leading dot is doubled) and appending the end-of-data marker.
pub fn into_lines(message: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut line_start = true;

    for line in message.split_inclusive(|byte| *byte == b'\n') {
        let mut wire = Vec::with_capacity(line.len() + 1);
        if line_start && line.first() == Some(&b'.') {
            wire.push(b'.');
        }
        wire.extend_from_slice(line);
        line_start = line.ends_with(b"\r\n");
        lines.push(wire);
    }

    lines.push(END_OF_DATA.to_vec());
    lines
}
