use futures::future::BoxFuture;
use std::time::Duration;

use super::filter::RequestFilter;
use super::models::CertificateStatus;
use super::source::{decline, Rejection, Response, Source, SourceError};
use super::store::{StatusStore, StoreError};
use super::types::OCSPRequest;

/// Answers from pre-generated responses kept in the status store, after
/// filtering out requests for certificates that cannot be ours.
pub struct DBSource<S> {
    store: S,
    filter: RequestFilter,
    timeout: Option<Duration>,
}

impl<S: StatusStore> DBSource<S> {
    /// A zero `timeout` is the same as none.
    pub fn new(store: S, filter: RequestFilter, timeout: Option<Duration>) -> DBSource<S> {
        DBSource {
            store,
            filter,
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    async fn lookup(&self, serial: &str) -> Result<CertificateStatus, StoreError> {
        let lookup = self.store.select_certificate_status(serial, self.timeout);
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup).await
                .unwrap_or_else(|_| Err(StoreError::Timeout(timeout))),
            None => lookup.await,
        }
    }

    async fn handle_ocsp(&self, req: &OCSPRequest) -> Result<Response, SourceError> {
        if let Err(rejection) = self.filter.check_request(req) {
            return Err(decline(rejection));
        }

        let serial = req.serial_number.to_hex();
        let key_hash = hex::encode(&req.issuer_key_hash);
        debug!("Searching for OCSP issued by us for serial {}", serial);

        let cert_status = match self.lookup(&serial).await {
            Ok(s) => s,
            Err(StoreError::NoRows) => return Err(decline(Rejection::NotInStore { serial })),
            Err(e) => {
                error!(target: "audit", "Looking up OCSP response for CA={}, Serial={}: {}", key_hash, serial, e);
                return Err(SourceError::Internal);
            }
        };

        if cert_status.is_expired {
            return Err(decline(Rejection::Expired { key_hash, serial }));
        }
        if !cert_status.has_generated_response() {
            return Err(decline(Rejection::NeverGenerated { key_hash, serial }));
        }
        if !self.filter.response_matches_issuer(req, cert_status.issuer()) {
            return Err(decline(Rejection::IssuerMismatch { key_hash, serial }));
        }

        debug!("OCSP Response sent for CA={}, Serial={}", key_hash, serial);
        Ok(Response::new(cert_status.ocsp_response))
    }
}

impl<S: StatusStore> Source for DBSource<S> {
    fn response<'a>(&'a self, request: &'a OCSPRequest) -> BoxFuture<'a, Result<Response, SourceError>> {
        Box::pin(self.handle_ocsp(request))
    }
}
