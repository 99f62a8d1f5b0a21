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

use tokio_rustls::TlsConnector;
use tracing::{debug, trace, warn};

use crate::{
    compose::{Composer, MessageComposer},
    request::DeliveryRequest,
    resolve::{Exchanger, MxResolver, Resolver},
    smtp::{
        connection::Connection,
        reply::{Reply, Severity},
        session::{Action, End, Session},
        tls::build_tls_connector,
        Command,
    },
    Error, Outcome,
};

/// Default SMTP port of mail exchangers.
pub const DEFAULT_PORT: u16 = 25;

/// Delivers messages directly to the recipient's mail exchangers.
pub struct DirectTransport<R = MxResolver, C = MessageComposer> {
    resolver: R,
    composer: C,
    tls_connector: TlsConnector,
    port: u16,
    helo_host: Option<String>,
}

impl DirectTransport<MxResolver, MessageComposer> {
    /// Creates a transport that looks up exchangers using the system DNS
    /// configuration.
    pub fn new() -> crate::Result<Self> {
        Ok(Self::with_resolver(MxResolver::new()?))
    }
}

impl<R: Resolver> DirectTransport<R, MessageComposer> {
    /// Creates a transport that looks up exchangers with `resolver`.
    pub fn with_resolver(resolver: R) -> Self {
        DirectTransport {
            resolver,
            composer: MessageComposer,
            tls_connector: build_tls_connector(false),
            port: DEFAULT_PORT,
            helo_host: None,
        }
    }
}

impl<R, C> DirectTransport<R, C> {
    /// Replaces the message composer.
    pub fn composer<T: Composer>(self, composer: T) -> DirectTransport<R, T> {
        DirectTransport {
            resolver: self.resolver,
            composer,
            tls_connector: self.tls_connector,
            port: self.port,
            helo_host: self.helo_host,
        }
    }

    /// Sets the port used for exchangers without a port of their own.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the EHLO hostname, the sender's domain is used otherwise.
    pub fn helo_host(mut self, host: impl Into<String>) -> Self {
        self.helo_host = Some(host.into());
        self
    }

    /// Accept any certificate presented after STARTTLS.
    pub fn allow_invalid_certs(mut self, allow_invalid_certs: bool) -> Self {
        self.tls_connector = build_tls_connector(allow_invalid_certs);
        self
    }
}

impl<R: Resolver, C: Composer> DirectTransport<R, C> {
    /// Delivers a message and reports how it went.
    pub async fn send(&self, request: &DeliveryRequest) -> Outcome {
        let result = self.deliver(request).await;
        match &result {
            Ok(()) => debug!("Message for {} delivered", request.get_to()),
            Err(err) => debug!("Message for {} not delivered: {}", request.get_to(), err),
        }
        result.into()
    }

    /// Delivers a message, trying the next exchanger each time one times out.
    pub async fn deliver(&self, request: &DeliveryRequest) -> crate::Result<()> {
        let domain = request.recipient_domain();
        let exchangers = self.resolver.resolve_exchangers(domain).await?;
        if exchangers.is_empty() {
            return Err(Error::NoExchangers(domain.to_string()));
        }

        let mut session = Session::new(request.get_upgrade_connection());
        while let Some(exchanger) = exchangers.get(session.exchanger) {
            match self.attempt(exchanger, &mut session, request).await {
                Err(Error::Timeout) => {
                    warn!(
                        "Connection to {} timed out (attempt {} of {})",
                        exchanger.host,
                        session.exchanger + 1,
                        exchangers.len()
                    );
                    session = session.failover();
                }
                result => return result,
            }
        }

        Err(Error::AllExchangersTimedOut)
    }

    async fn attempt(
        &self,
        exchanger: &Exchanger,
        session: &mut Session,
        request: &DeliveryRequest,
    ) -> crate::Result<()> {
        let mut conn = Connection::connect(
            &exchanger.host,
            exchanger.port.unwrap_or(self.port),
            request.get_timeout(),
        )
        .await?;

        let result = self.converse(&mut conn, exchanger, session, request).await;
        if session.teardown {
            conn.close().await;
        }

        match result {
            Err(err) if session.delivered => {
                debug!("{} accepted the message, ignoring: {}", exchanger.host, err);
                Ok(())
            }
            result => result,
        }
    }

    async fn converse(
        &self,
        conn: &mut Connection,
        exchanger: &Exchanger,
        session: &mut Session,
        request: &DeliveryRequest,
    ) -> crate::Result<()> {
        let helo_host = self
            .helo_host
            .as_deref()
            .unwrap_or_else(|| request.sender_domain());

        loop {
            let reply = Reply::parse(&conn.read_line().await?);
            let (next, action) = session.next(reply.code());
            *session = next;

            match action {
                Action::Wait => {
                    if matches!(
                        reply.severity(),
                        Severity::TransientNegativeCompletion
                            | Severity::PermanentNegativeCompletion
                    ) {
                        debug!(
                            "{} replied {} during {:?}",
                            exchanger.host, reply, session.phase
                        );
                    }
                }
                Action::Send(command) => {
                    conn.write_line(&command.to_line(request, helo_host))
                        .await?;
                }
                Action::StartTls => {
                    conn.start_tls(&self.tls_connector, &exchanger.host).await?;
                    conn.write_line(&Command::Ehlo.to_line(request, helo_host))
                        .await?;
                }
                Action::SendMessage => {
                    let lines = self.composer.compose(request)?;
                    trace!("-> {} message line(s)", lines.len());
                    conn.write_lines(&lines).await?;
                }
                Action::Terminate(End::Delivered) => return Ok(()),
                Action::Terminate(End::Rejected) => return Err(Error::Rejected(reply)),
                Action::Terminate(End::Closed) => return Err(Error::Closed(reply)),
            }
        }
    }
}
