use super::config::ConfigError;
use super::types::HashAlgorithm;
use std::collections::HashMap;

/// OCSP requests identify their issuer by a SHA-1 key hash.
pub const ISSUER_KEY_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::SHA1;

/// Stable identifier of an issuing certificate: the first 7 bytes of the
/// SHA-256 digest of its DER encoding, as a big-endian integer.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct IssuerID(pub i64);

impl IssuerID {
    pub fn from_certificate(cert: &openssl::x509::X509Ref) -> Result<IssuerID, openssl::error::ErrorStack> {
        let digest = openssl::hash::hash(openssl::hash::MessageDigest::sha256(), &cert.to_der()?)?;
        let mut id = [0; 8];
        id[1..].copy_from_slice(&digest[..7]);
        Ok(IssuerID(i64::from_be_bytes(id)))
    }
}

impl std::fmt::Display for IssuerID {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Hashes the subjectPublicKey bit string of `cert`, excluding the
/// surrounding SubjectPublicKeyInfo.
pub fn issuer_key_hash(cert: &openssl::x509::X509Ref, algorithm: HashAlgorithm) -> Result<Vec<u8>, ConfigError> {
    let spki_der = cert.public_key()?.public_key_to_der()?;
    let spki = asn1::parse_single::<super::proto::SubjectPublicKeyInfo>(&spki_der)
        .map_err(ConfigError::ParsePublicKey)?;
    Ok(openssl::hash::hash(algorithm.message_digest(), spki.subject_public_key.as_bytes())?.to_vec())
}

/// Issuer key hashes of every CA this responder answers for, built once at
/// startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct IssuerKeyIndex {
    key_hashes: HashMap<IssuerID, Vec<u8>>,
}

impl IssuerKeyIndex {
    pub fn new(issuers: &[openssl::x509::X509]) -> Result<IssuerKeyIndex, ConfigError> {
        if issuers.is_empty() {
            return Err(ConfigError::NoIssuerCertificates);
        }

        let mut key_hashes = HashMap::with_capacity(issuers.len());
        for issuer in issuers {
            let id = IssuerID::from_certificate(issuer)?;
            let key_hash = issuer_key_hash(issuer, ISSUER_KEY_HASH_ALGORITHM)?;
            debug!("Loaded issuer {} with key hash {}", id, hex::encode(&key_hash));
            key_hashes.insert(id, key_hash);
        }

        Ok(IssuerKeyIndex {
            key_hashes
        })
    }

    pub fn from_pem_files<P: AsRef<std::path::Path>>(paths: &[P]) -> Result<IssuerKeyIndex, ConfigError> {
        let issuers = paths.iter().map(|path| {
            let path = path.as_ref();
            let pem = std::fs::read(path).map_err(|e| ConfigError::ReadCertificate {
                path: path.to_path_buf(),
                source: e,
            })?;
            openssl::x509::X509::from_pem(&pem).map_err(|e| ConfigError::ParseCertificate {
                path: path.to_path_buf(),
                source: e,
            })
        }).collect::<Result<Vec<_>, _>>()?;

        Self::new(&issuers)
    }

    pub fn key_hash(&self, id: IssuerID) -> Option<&[u8]> {
        self.key_hashes.get(&id).map(|h| h.as_slice())
    }

    pub fn contains_key_hash(&self, key_hash: &[u8]) -> bool {
        self.key_hashes.values().any(|h| h.as_slice() == key_hash)
    }

    pub fn len(&self) -> usize {
        self.key_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_hashes.is_empty()
    }
}
