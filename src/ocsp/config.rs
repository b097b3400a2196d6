use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one issuer certificate must be configured")]
    NoIssuerCertificates,
    #[error("unable to read issuer certificate {path:?}: {source}")]
    ReadCertificate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse issuer certificate {path:?}: {source}")]
    ParseCertificate {
        path: PathBuf,
        source: openssl::error::ErrorStack,
    },
    #[error("unable to decode issuer SubjectPublicKeyInfo: {0:?}")]
    ParsePublicKey(asn1::ParseError),
    #[error("cryptographic operation failed: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
    #[error("serial prefix {0:?} is not a hexadecimal string")]
    InvalidSerialPrefix(String),
    #[error("invalid response source URL {url:?}: {source}")]
    InvalidSourceUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("response source {0:?} does not name a local file")]
    NotAFilePath(String),
    #[error("unable to read OCSP responses from {path:?}: {source}")]
    ReadResponses {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("OCSP response #{index} is not valid base64: {source}")]
    DecodeResponse {
        index: usize,
        source: base64::DecodeError,
    },
    #[error("OCSP response #{index} could not be parsed: {source}")]
    ParseResponse {
        index: usize,
        source: super::types::ResponseParseError,
    },
    #[error("unable to read configuration: {0}")]
    Figment(#[from] figment::Error),
}

/// The `ocsp_responder` configuration section.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ResponderConfig {
    /// Either a `file:` URL naming a file of base64 encoded responses, or a
    /// database URL used when `databases.ocsp.url` is not set.
    pub source: Option<String>,
    pub issuer_certs: Vec<PathBuf>,
    pub required_serial_prefixes: Vec<String>,
    /// Per-lookup timeout in milliseconds, 0 disables it.
    pub timeout_ms: u64,
    /// Upper bound in seconds on the advertised Cache-Control max-age, 0 disables it.
    pub max_age: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    File(PathBuf),
    Database,
}

impl ResponderConfig {
    /// Reads the `ocsp_responder` section.
    pub fn from_figment(figment: &figment::Figment) -> Result<ResponderConfig, ConfigError> {
        Ok(figment.extract_inner::<ResponderConfig>("ocsp_responder")?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms {
            0 => None,
            t => Some(Duration::from_millis(t)),
        }
    }

    pub fn max_age(&self) -> Option<u64> {
        match self.max_age {
            0 => None,
            m => Some(m),
        }
    }

    pub fn source_kind(&self) -> Result<SourceKind, ConfigError> {
        match self.source.as_deref() {
            Some(source) if source.starts_with("file:") => Ok(SourceKind::File(file_source_path(source)?)),
            _ => Ok(SourceKind::Database),
        }
    }

    /// The database URL given through `source`, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty() && !s.starts_with("file:"))
    }

    pub fn request_filter(&self) -> Result<super::filter::RequestFilter, ConfigError> {
        let issuers = super::issuers::IssuerKeyIndex::from_pem_files(&self.issuer_certs)?;
        super::filter::RequestFilter::new(issuers, &self.required_serial_prefixes)
    }
}

/// Resolves a `file:` URL to a path. `file:///abs/path` is absolute, while
/// `file:rel/path` is relative to the working directory.
pub fn file_source_path(source: &str) -> Result<PathBuf, ConfigError> {
    let rest = source.strip_prefix("file:").ok_or_else(|| ConfigError::NotAFilePath(source.to_string()))?;
    if rest.starts_with("//") {
        let url = url::Url::parse(source).map_err(|e| ConfigError::InvalidSourceUrl {
            url: source.to_string(),
            source: e,
        })?;
        url.to_file_path().map_err(|_| ConfigError::NotAFilePath(source.to_string()))
    } else if rest.is_empty() {
        Err(ConfigError::NotAFilePath(source.to_string()))
    } else {
        Ok(PathBuf::from(rest))
    }
}
