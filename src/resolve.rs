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

use std::future::Future;

use hickory_resolver::{name_server::TokioConnectionProvider, TokioResolver};
use tracing::{debug, warn};

/// A mail exchanger for the recipient's domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchanger {
    pub host: String,
    /// MX preference, lower values are tried first.
    pub preference: u16,
    /// Overrides the transport's port for this exchanger.
    pub port: Option<u16>,
}

impl Exchanger {
    pub fn new(host: impl Into<String>, preference: u16) -> Self {
        Exchanger {
            host: host.into(),
            preference,
            port: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Looks up the mail exchangers of a domain.
pub trait Resolver {
    /// Returns the exchangers ordered by preference. An empty list is
    /// never returned, [`crate::Error::NoExchangers`] is used instead.
    fn resolve_exchangers(
        &self,
        domain: &str,
    ) -> impl Future<Output = crate::Result<Vec<Exchanger>>> + Send;
}

/// DNS MX resolver.
pub struct MxResolver {
    resolver: TokioResolver,
}

impl MxResolver {
    /// Creates a resolver from the system DNS configuration.
    pub fn new() -> crate::Result<Self> {
        Ok(MxResolver {
            resolver: TokioResolver::builder(TokioConnectionProvider::default())?.build(),
        })
    }
}

impl Resolver for MxResolver {
    async fn resolve_exchangers(&self, domain: &str) -> crate::Result<Vec<Exchanger>> {
        debug!("Resolving mail exchangers for {domain}");

        let exchangers = match self.resolver.mx_lookup(domain).await {
            Ok(mx_lookup) => mx_lookup
                .iter()
                .map(|mx| Exchanger::new(mx.exchange().to_utf8(), mx.preference()))
                .collect(),
            Err(err) if err.is_no_records_found() => {
                // No MX records, the domain itself is the implicit exchanger.
                debug!("No MX records for {domain}, using the domain as exchanger");
                vec![Exchanger::new(domain, 0)]
            }
            Err(err) => {
                warn!("MX lookup failed for {domain}: {err}");
                return Err(err.into());
            }
        };

        let exchangers = sort_exchangers(exchangers);
        if exchangers.is_empty() {
            return Err(crate::Error::NoExchangers(domain.to_string()));
        }

        debug!(
            "Resolved {} exchanger(s) for {domain}: {:?}",
            exchangers.len(),
            exchangers.iter().map(|mx| &mx.host).collect::<Vec<_>>()
        );
        Ok(exchangers)
    }
}

/// Drops null MX entries, strips the root label and sorts by preference.
fn sort_exchangers(exchangers: Vec<Exchanger>) -> Vec<Exchanger> {
    let mut exchangers = exchangers
        .into_iter()
        .filter_map(|mut mx| {
            let host = mx.host.trim_end_matches('.');
            if host.is_empty() {
                None
            } else {
                mx.host = host.to_string();
                Some(mx)
            }
        })
        .collect::<Vec<_>>();
    exchangers.sort_by_key(|mx| mx.preference);
    exchangers
}

/// Resolver returning a fixed list of exchangers for every domain.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    exchangers: Vec<Exchanger>,
}

impl StaticResolver {
    pub fn new(exchangers: impl IntoIterator<Item = Exchanger>) -> Self {
        StaticResolver {
            exchangers: exchangers.into_iter().collect(),
        }
    }
}

impl Resolver for StaticResolver {
    async fn resolve_exchangers(&self, domain: &str) -> crate::Result<Vec<Exchanger>> {
        if self.exchangers.is_empty() {
            Err(crate::Error::NoExchangers(domain.to_string()))
        } else {
            Ok(self.exchangers.clone())
        }
    }
}
