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

//! Reply-driven SMTP client state machine.
//!
//! [`Session::next`] is a pure transition function: it receives the code of
//! one server reply and returns the updated session together with the
//! [`Action`] the connection has to carry out. Nothing is ever written
//! unless a reply asked for it.

use super::Command;

/// Protocol phase of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connected, no step taken yet. The first `250` seen here (the answer
    /// to the plaintext EHLO) is what triggers the STARTTLS attempt.
    Init,
    AwaitStartTlsAck,
    AwaitEhloAck,
    AwaitMailAck,
    AwaitRcptAck,
    AwaitDataAck,
    AwaitFinalAck,
    AwaitQuitAck,
    Terminated,
}

/// How a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    /// The server acknowledged `QUIT` after accepting the message.
    Delivered,
    /// The server refused the mailbox (`550`).
    Rejected,
    /// The server closed the session (`221`) before the message went through.
    Closed,
}

/// What the connection must do after a reply has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to write, wait for the next reply or the idle timeout.
    Wait,
    Send(Command),
    /// Upgrade the connection to TLS in place, then send `EHLO` over it.
    StartTls,
    /// Write the composed message followed by the end-of-data marker.
    SendMessage,
    /// Tear the connection down.
    Terminate(End),
}

/// Per-attempt protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    /// Index of the exchanger this session talks to.
    pub exchanger: usize,
    /// The connection has been upgraded to TLS.
    pub upgraded: bool,
    /// STARTTLS must not be attempted, either by request or because the
    /// server refused it.
    pub tls_disabled: bool,
    pub teardown: bool,
    /// The server accepted the message.
    pub delivered: bool,
    pub last_code: u16,
    upgrade_connection: bool,
}

impl Session {
    pub fn new(upgrade_connection: bool) -> Self {
        Session {
            phase: Phase::Init,
            exchanger: 0,
            upgraded: false,
            tls_disabled: !upgrade_connection,
            teardown: false,
            delivered: false,
            last_code: 0,
            upgrade_connection,
        }
    }

    /// Returns a fresh session aimed at the next exchanger.
    pub fn failover(self) -> Self {
        Session {
            exchanger: self.exchanger + 1,
            ..Session::new(self.upgrade_connection)
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    fn may_upgrade(&self) -> bool {
        !self.tls_disabled && !self.upgraded
    }

    /// Handles the code of one server reply.
    pub fn next(self, code: u16) -> (Session, Action) {
        if self.is_terminated() || code == super::reply::UNRECOGNIZED {
            return (self, Action::Wait);
        }

        let mut session = Session {
            last_code: code,
            ..self
        };

        let action = match (code, self.phase) {
            (550, _) => session.terminate(End::Rejected),
            (221, Phase::AwaitQuitAck) => session.terminate(End::Delivered),
            (221, _) => session.terminate(End::Closed),
            (220, Phase::AwaitStartTlsAck) if self.may_upgrade() => {
                session.upgraded = true;
                session.phase = Phase::AwaitEhloAck;
                Action::StartTls
            }
            (220, _) => Action::Send(Command::Ehlo),
            (502 | 503, _) if self.may_upgrade() => {
                session.tls_disabled = true;
                session.advance(Phase::AwaitMailAck, Command::MailFrom)
            }
            (354, Phase::AwaitDataAck) => {
                session.phase = Phase::AwaitFinalAck;
                Action::SendMessage
            }
            (250, Phase::Init) if self.may_upgrade() => {
                session.advance(Phase::AwaitStartTlsAck, Command::StartTls)
            }
            (250, Phase::Init | Phase::AwaitEhloAck) => {
                session.advance(Phase::AwaitMailAck, Command::MailFrom)
            }
            (250, Phase::AwaitMailAck) => session.advance(Phase::AwaitRcptAck, Command::RcptTo),
            (250, Phase::AwaitRcptAck) => session.advance(Phase::AwaitDataAck, Command::Data),
            (250, Phase::AwaitFinalAck) => {
                session.delivered = true;
                session.advance(Phase::AwaitQuitAck, Command::Quit)
            }
            _ => Action::Wait,
        };

        (session, action)
    }

    fn advance(&mut self, phase: Phase, command: Command) -> Action {
        self.phase = phase;
        Action::Send(command)
    }

    fn terminate(&mut self, end: End) -> Action {
        self.teardown = true;
        self.phase = Phase::Terminated;
        Action::Terminate(end)
    }
}
