use base64::prelude::*;
use futures::future::BoxFuture;
use std::collections::HashMap;

use super::config::ConfigError;
use super::source::{decline, Rejection, Response, Source, SourceError};
use super::types::{parse_ocsp_resp, OCSPRequest};

/// A fixed set of pre-signed responses held in memory, keyed by canonical
/// serial. Useful for tests and small deployments without a database.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    responses: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> MemorySource {
        Self::default()
    }

    /// Indexes each DER response under every serial it covers. A later
    /// response for the same serial replaces an earlier one.
    pub fn from_responses<I: IntoIterator<Item = Vec<u8>>>(responses: I) -> Result<MemorySource, ConfigError> {
        let mut source = MemorySource::new();
        for (index, der) in responses.into_iter().enumerate() {
            let metadata = parse_ocsp_resp(&der).map_err(|e| ConfigError::ParseResponse {
                index,
                source: e,
            })?;
            for serial in metadata.serials {
                source.responses.insert(serial.to_hex(), der.clone());
            }
        }
        Ok(source)
    }

    /// Loads whitespace separated base64 encoded DER responses from `path`.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<MemorySource, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadResponses {
            path: path.to_path_buf(),
            source: e,
        })?;

        let responses = contents.split_whitespace().enumerate().map(|(index, b64)| {
            BASE64_STANDARD.decode(b64).map_err(|e| ConfigError::DecodeResponse {
                index,
                source: e,
            })
        }).collect::<Result<Vec<_>, _>>()?;

        let source = Self::from_responses(responses)?;
        info!("Loaded {} OCSP responses from {}", source.len(), path.display());
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl Source for MemorySource {
    fn response<'a>(&'a self, request: &'a OCSPRequest) -> BoxFuture<'a, Result<Response, SourceError>> {
        let serial = request.serial_number.to_hex();
        let result = match self.responses.get(&serial) {
            Some(der) => {
                debug!("OCSP Response sent for Serial={}", serial);
                Ok(Response::new(der.clone()))
            }
            None => Err(decline(Rejection::NotInStore { serial })),
        };
        Box::pin(futures::future::ready(result))
    }
}
