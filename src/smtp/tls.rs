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

use std::{io, sync::Arc};

use rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms},
    pki_types::{CertificateDer, ServerName, UnixTime},
    ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_rustls::TlsConnector;

use crate::Error;

/// Builds the connector used for STARTTLS upgrades.
///
/// Exchangers often present self-signed or mismatched certificates, with
/// `allow_invalid_certs` any certificate is accepted while the handshake
/// signatures are still verified.
pub fn build_tls_connector(allow_invalid_certs: bool) -> TlsConnector {
    let builder = ClientConfig::builder();
    let config = if !allow_invalid_certs {
        builder
            .with_root_certificates(RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            })
            .with_no_client_auth()
    } else {
        let algorithms = builder.crypto_provider().signature_verification_algorithms;
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AnyCertificate { algorithms }))
            .with_no_client_auth()
    };

    TlsConnector::from(Arc::new(config))
}

/// Unwraps the rustls error carried by a failed handshake.
pub(crate) fn handshake_error(err: io::Error) -> Error {
    let kind = err.kind();
    if let Some(inner) = err.into_inner() {
        match inner.downcast::<rustls::Error>() {
            Ok(error) => Error::Tls(*error),
            Err(error) => Error::Io(io::Error::new(kind, error)),
        }
    } else {
        Error::Io(io::Error::new(kind, "Unspecified"))
    }
}

#[doc(hidden)]
#[derive(Debug)]
struct AnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod test {
    use std::io;

    use super::{build_tls_connector, handshake_error};
    use crate::Error;

    #[test]
    fn build_connectors() {
        build_tls_connector(false);
        build_tls_connector(true);
    }

    #[test]
    fn unwrap_handshake_errors() {
        assert!(matches!(
            handshake_error(io::Error::new(
                io::ErrorKind::InvalidData,
                rustls::Error::DecryptError
            )),
            Error::Tls(rustls::Error::DecryptError)
        ));
        assert!(matches!(
            handshake_error(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
            Error::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof
        ));
    }
}
