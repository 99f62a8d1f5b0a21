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

use std::fmt::Display;

/// Code assigned to lines that do not start with a reply code.
pub const UNRECOGNIZED: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    PositiveCompletion = 2,
    PositiveIntermediate = 3,
    TransientNegativeCompletion = 4,
    PermanentNegativeCompletion = 5,
    Invalid = 0,
}

/// A single SMTP reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    message: String,
}

impl Reply {
    /// Parses one reply line, without its line terminator.
    ///
    /// Only a line starting with three digits followed by whitespace carries
    /// a code. Continuation lines (`250-...`) and noise are returned with
    /// code [`UNRECOGNIZED`].
    pub fn parse(line: &str) -> Self {
        let bytes = line.as_bytes();
        match bytes {
            [a, b, c, sep, ..]
                if a.is_ascii_digit()
                    && b.is_ascii_digit()
                    && c.is_ascii_digit()
                    && sep.is_ascii_whitespace() =>
            {
                Reply {
                    code: (a - b'0') as u16 * 100 + (b - b'0') as u16 * 10 + (c - b'0') as u16,
                    message: line[4..].trim_end().to_string(),
                }
            }
            _ => Reply {
                code: UNRECOGNIZED,
                message: line.to_string(),
            },
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        match self.code / 100 {
            2 => Severity::PositiveCompletion,
            3 => Severity::PositiveIntermediate,
            4 => Severity::TransientNegativeCompletion,
            5 => Severity::PermanentNegativeCompletion,
            _ => Severity::Invalid,
        }
    }
}

impl Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::smtp::reply::{Reply, Severity, UNRECOGNIZED};

    #[test]
    fn reply_parser() {
        let reply = Reply::parse("220 mx.example.com ESMTP ready");
        assert_eq!(reply.code(), 220);
        assert_eq!(reply.message(), "mx.example.com ESMTP ready");
        assert_eq!(reply.severity(), Severity::PositiveCompletion);
        assert_eq!(reply.to_string(), "220 mx.example.com ESMTP ready");

        let reply = Reply::parse("354\tEnd data with <CR><LF>.<CR><LF>");
        assert_eq!(reply.code(), 354);
        assert_eq!(reply.severity(), Severity::PositiveIntermediate);

        let reply = Reply::parse("550 5.1.1 User unknown");
        assert_eq!(reply.code(), 550);
        assert_eq!(reply.message(), "5.1.1 User unknown");
        assert_eq!(reply.severity(), Severity::PermanentNegativeCompletion);

        // Text beginning with numbers is still a single code
        let reply = Reply::parse("250 234 Text beginning with numbers");
        assert_eq!(reply.code(), 250);
        assert_eq!(reply.message(), "234 Text beginning with numbers");

        // Bare code with a trailing space
        let reply = Reply::parse("250 ");
        assert_eq!(reply.code(), 250);
        assert_eq!(reply.to_string(), "250");
    }

    #[test]
    fn unrecognized_lines() {
        for line in [
            "250-PIPELINING",
            "250",
            "25 OK",
            "2x0 OK",
            "abc def",
            "",
            "These pretzels are making me thirsty",
        ] {
            let reply = Reply::parse(line);
            assert_eq!(reply.code(), UNRECOGNIZED, "{line:?}");
            assert_eq!(reply.severity(), Severity::Invalid);
        }
    }
}
