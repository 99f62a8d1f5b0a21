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

pub mod connection;
pub mod reply;
pub mod session;
pub mod stream;
pub mod tls;

use crate::request::DeliveryRequest;

/// Commands issued by the delivery state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ehlo,
    StartTls,
    MailFrom,
    RcptTo,
    Data,
    Quit,
}

impl Command {
    /// Renders the command line, including its CRLF terminator.
    pub fn to_line(self, request: &DeliveryRequest, helo_host: &str) -> String {
        match self {
            Command::Ehlo => format!("EHLO {helo_host}\r\n"),
            Command::StartTls => "STARTTLS\r\n".to_string(),
            Command::MailFrom => format!("MAIL FROM:<{}>\r\n", request.get_from()),
            Command::RcptTo => format!("RCPT TO:<{}>\r\n", request.get_to()),
            Command::Data => "DATA\r\n".to_string(),
            Command::Quit => "QUIT\r\n".to_string(),
        }
    }
}
