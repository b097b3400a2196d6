use super::config::ConfigError;
use super::issuers::{IssuerID, IssuerKeyIndex, ISSUER_KEY_HASH_ALGORITHM};
use super::source::Rejection;
use super::types::{HashAlgorithm, OCSPRequest};

/// Decides whether a request is for a certificate this responder could have
/// issued, before anything is looked up.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    issuer_key_hash_algorithm: HashAlgorithm,
    issuer_key_hashes: IssuerKeyIndex,
    serial_prefixes: Vec<String>,
}

impl RequestFilter {
    /// An empty `serial_prefixes` accepts any serial.
    pub fn new<S: AsRef<str>>(issuer_key_hashes: IssuerKeyIndex, serial_prefixes: &[S]) -> Result<RequestFilter, ConfigError> {
        let serial_prefixes = serial_prefixes.iter().map(|prefix| {
            let prefix = prefix.as_ref();
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidSerialPrefix(prefix.to_string()));
            }
            Ok(prefix.to_ascii_uppercase())
        }).collect::<Result<Vec<_>, _>>()?;

        Ok(RequestFilter {
            issuer_key_hash_algorithm: ISSUER_KEY_HASH_ALGORITHM,
            issuer_key_hashes,
            serial_prefixes,
        })
    }

    pub fn issuer_key_hash_algorithm(&self) -> HashAlgorithm {
        self.issuer_key_hash_algorithm
    }

    pub fn issuers(&self) -> &IssuerKeyIndex {
        &self.issuer_key_hashes
    }

    pub fn check_request(&self, req: &OCSPRequest) -> Result<(), Rejection> {
        if req.hash_algorithm != self.issuer_key_hash_algorithm {
            return Err(Rejection::UnsupportedAlgorithm(req.hash_algorithm));
        }

        if !self.issuer_key_hashes.contains_key_hash(&req.issuer_key_hash) {
            return Err(Rejection::UnknownIssuer {
                key_hash: hex::encode(&req.issuer_key_hash),
            });
        }

        if !self.serial_prefixes.is_empty() {
            let serial = req.serial_number.to_hex();
            if !self.serial_prefixes.iter().any(|prefix| serial.starts_with(prefix.as_str())) {
                return Err(Rejection::SerialOutOfRange {
                    serial,
                });
            }
        }

        Ok(())
    }

    /// Whether the stored response's issuer is the one the request named.
    pub fn response_matches_issuer(&self, req: &OCSPRequest, issuer: IssuerID) -> bool {
        match self.issuer_key_hashes.key_hash(issuer) {
            Some(key_hash) => key_hash == req.issuer_key_hash.as_slice(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocsp::test_util;

    fn filter(prefixes: &[&str]) -> (RequestFilter, test_util::TestIssuer) {
        let a = test_util::issuer("Test Issuer A");
        let index = IssuerKeyIndex::new(&[a.cert.clone()]).unwrap();
        (RequestFilter::new(index, prefixes).unwrap(), a)
    }

    #[test]
    fn accepts_known_issuer() {
        let (filter, a) = filter(&[]);
        assert_eq!(filter.check_request(&test_util::request(&test_util::key_hash(&a), "00AB")), Ok(()));
        assert_eq!(filter.check_request(&test_util::request(&test_util::key_hash(&a), "11AB")), Ok(()));
    }

    #[test]
    fn rejects_other_algorithms() {
        let (filter, a) = filter(&[]);
        let mut req = test_util::request(&test_util::key_hash(&a), "00AB");
        req.hash_algorithm = HashAlgorithm::SHA256;
        assert_eq!(filter.check_request(&req), Err(Rejection::UnsupportedAlgorithm(HashAlgorithm::SHA256)));
    }

    #[test]
    fn rejects_unknown_issuer() {
        let (filter, _) = filter(&["00"]);
        let b = test_util::issuer("Test Issuer B");
        assert!(matches!(
            filter.check_request(&test_util::request(&test_util::key_hash(&b), "00AB")),
            Err(Rejection::UnknownIssuer { .. })
        ));
    }

    #[test]
    fn algorithm_checked_before_issuer() {
        let (filter, _) = filter(&[]);
        let mut req = test_util::request(&[0; 32], "00AB");
        req.hash_algorithm = HashAlgorithm::SHA256;
        assert!(matches!(filter.check_request(&req), Err(Rejection::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn enforces_serial_prefixes() {
        let (filter, a) = filter(&["00", "7f"]);
        let key_hash = test_util::key_hash(&a);
        assert_eq!(filter.check_request(&test_util::request(&key_hash, "00AB")), Ok(()));
        assert_eq!(filter.check_request(&test_util::request(&key_hash, "7F01")), Ok(()));
        assert_eq!(
            filter.check_request(&test_util::request(&key_hash, "11AB")),
            Err(Rejection::SerialOutOfRange { serial: "11AB".to_string() })
        );
    }

    #[test]
    fn rejects_invalid_prefixes() {
        let a = test_util::issuer("Test Issuer A");
        let index = IssuerKeyIndex::new(&[a.cert.clone()]).unwrap();
        assert!(matches!(RequestFilter::new(index.clone(), &["0x"]), Err(ConfigError::InvalidSerialPrefix(_))));
        assert!(matches!(RequestFilter::new(index, &[""]), Err(ConfigError::InvalidSerialPrefix(_))));
    }

    #[test]
    fn matches_response_issuer() {
        let a = test_util::issuer("Test Issuer A");
        let b = test_util::issuer("Test Issuer B");
        let index = IssuerKeyIndex::new(&[a.cert.clone(), b.cert.clone()]).unwrap();
        let filter = RequestFilter::new::<&str>(index, &[]).unwrap();
        let id_a = IssuerID::from_certificate(&a.cert).unwrap();
        let id_b = IssuerID::from_certificate(&b.cert).unwrap();

        let req = test_util::request(&test_util::key_hash(&a), "00AB");
        assert!(filter.response_matches_issuer(&req, id_a));
        assert!(!filter.response_matches_issuer(&req, id_b));
        assert!(!filter.response_matches_issuer(&req, IssuerID(0)));
    }
}
