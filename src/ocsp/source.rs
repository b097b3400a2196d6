use futures::future::BoxFuture;

use super::types::{HashAlgorithm, OCSPRequest};

/// A pre-signed OCSP response ready to be sent.
#[derive(Debug, Clone)]
pub struct Response {
    pub der: Vec<u8>,
    pub headers: Vec<rocket::http::Header<'static>>,
}

impl Response {
    pub fn new(der: Vec<u8>) -> Response {
        Response {
            der,
            headers: vec![],
        }
    }
}

/// Failures visible to the transport. `NotFound` deliberately carries no
/// reason; the cause is only ever logged.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("no response available")]
    NotFound,
    #[error("internal error")]
    Internal,
}

/// Why a request was declined. Never leaves the process except through logs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Rejection {
    UnsupportedAlgorithm(HashAlgorithm),
    UnknownIssuer {
        key_hash: String,
    },
    SerialOutOfRange {
        serial: String,
    },
    NotInStore {
        serial: String,
    },
    Expired {
        key_hash: String,
        serial: String,
    },
    NeverGenerated {
        key_hash: String,
        serial: String,
    },
    IssuerMismatch {
        key_hash: String,
        serial: String,
    },
}

impl Rejection {
    pub fn level(&self) -> log::Level {
        match self {
            Self::UnsupportedAlgorithm(_) | Self::UnknownIssuer { .. } |
            Self::SerialOutOfRange { .. } | Self::NotInStore { .. } => log::Level::Debug,
            Self::Expired { .. } => log::Level::Info,
            Self::NeverGenerated { .. } | Self::IssuerMismatch { .. } => log::Level::Warn,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedAlgorithm(a) =>
                write!(f, "request CA key hash uses unsupported algorithm {:?}", a),
            Self::UnknownIssuer { key_hash } =>
                write!(f, "request intended for wrong issuer cert {}", key_hash),
            Self::SerialOutOfRange { serial } =>
                write!(f, "request serial {} has wrong prefix", serial),
            Self::NotInStore { serial } =>
                write!(f, "no response stored for serial {}", serial),
            Self::Expired { key_hash, serial } =>
                write!(f, "response not sent (expired) for CA={}, Serial={}", key_hash, serial),
            Self::NeverGenerated { key_hash, serial } =>
                write!(f, "response not sent (ocsp_last_updated is unset) for CA={}, Serial={}", key_hash, serial),
            Self::IssuerMismatch { key_hash, serial } =>
                write!(f, "response not sent (issuer and serial mismatch) for CA={}, Serial={}", key_hash, serial),
        }
    }
}

/// The one way to turn a rejection into a failure: log the real cause, hand
/// back the uniform `NotFound`.
pub(crate) fn decline(rejection: Rejection) -> SourceError {
    log!(rejection.level(), "Not responding to OCSP request: {}", rejection);
    SourceError::NotFound
}

/// Something that can answer OCSP requests. Exactly one implementation is
/// chosen at startup.
pub trait Source: Send + Sync {
    fn response<'a>(&'a self, request: &'a OCSPRequest) -> BoxFuture<'a, Result<Response, SourceError>>;
}

/// Runs `source` until it answers or `cancel` resolves, whichever is first.
/// A cancelled lookup is dropped and reported as `Internal`. `cancel` should
/// be a deadline (see [`shutdown_deadline`]), not the shutdown signal itself.
pub async fn respond_until<C>(
    source: &dyn Source, request: &OCSPRequest, cancel: C,
) -> Result<Response, SourceError>
    where C: std::future::Future<Output = ()>
{
    tokio::select! {
        biased;
        result = source.response(request) => result,
        _ = cancel => {
            error!(
                target: "audit",
                "OCSP lookup cancelled for CA={}, Serial={}",
                hex::encode(&request.issuer_key_hash), request.serial_number
            );
            Err(SourceError::Internal)
        }
    }
}

/// Resolves once `grace` has passed after `shutdown` resolved. Lookups still
/// running at that point are cut off; those that finish within the grace
/// period are answered normally.
pub async fn shutdown_deadline<S>(shutdown: S, grace: std::time::Duration)
    where S: std::future::Future<Output = ()>
{
    shutdown.await;
    tokio::time::sleep(grace).await;
}
