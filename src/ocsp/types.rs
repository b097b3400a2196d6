use super::proto;

use chrono::prelude::*;

lazy_static! {
    static ref ID_MD5: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("1.2.840.113549.2.5").unwrap();
    static ref ID_SHA1: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("1.3.14.3.2.26").unwrap();
    static ref ID_SHA224: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.4").unwrap();
    static ref ID_SHA256: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.1").unwrap();
    static ref ID_SHA384: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.2").unwrap();
    static ref ID_SHA512: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.3").unwrap();
    static ref ID_SHA3_224: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.7").unwrap();
    static ref ID_SHA3_256: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.8").unwrap();
    static ref ID_SHA3_384: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.9").unwrap();
    static ref ID_SHA3_512: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("2.16.840.1.101.3.4.2.10").unwrap();

    pub(crate) static ref ID_PKIX_OCSP_BASIC: asn1::ObjectIdentifier = asn1::ObjectIdentifier::from_string("1.3.6.1.5.5.7.48.1.1").unwrap();

    pub(crate) static ref MALFORMED_REQUEST_RESPONSE: Vec<u8> = status_only_response(OCSPResponseStatus::MalformedRequest);
    pub(crate) static ref INTERNAL_ERROR_RESPONSE: Vec<u8> = status_only_response(OCSPResponseStatus::InternalError);
    pub(crate) static ref UNAUTHORIZED_RESPONSE: Vec<u8> = status_only_response(OCSPResponseStatus::Unauthorized);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OCSPResponseStatus {
    Successful = 0,
    MalformedRequest = 1,
    InternalError = 2,
    Unauthorized = 6,
}

impl OCSPResponseStatus {
    /// The DER `OCSPResponse` carrying only this status.
    pub fn response_bytes(&self) -> &'static [u8] {
        match self {
            Self::MalformedRequest => &MALFORMED_REQUEST_RESPONSE,
            Self::Unauthorized => &UNAUTHORIZED_RESPONSE,
            _ => &INTERNAL_ERROR_RESPONSE,
        }
    }
}

fn status_only_response(status: OCSPResponseStatus) -> Vec<u8> {
    asn1::write_single(&proto::StatusOnlyOCSPResponse {
        response_status: asn1::Enumerated::new(status as u32),
    }).unwrap()
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HashAlgorithm {
    MD5,
    SHA1,
    SHA224,
    SHA256,
    SHA384,
    SHA512,
    SHA3_224,
    SHA3_256,
    SHA3_384,
    SHA3_512,
}

impl HashAlgorithm {
    fn from_oid(oid: &asn1::ObjectIdentifier) -> Option<HashAlgorithm> {
        if oid.eq(&ID_MD5) {
            Some(HashAlgorithm::MD5)
        } else if oid.eq(&ID_SHA1) {
            Some(HashAlgorithm::SHA1)
        } else if oid.eq(&ID_SHA224) {
            Some(HashAlgorithm::SHA224)
        } else if oid.eq(&ID_SHA256) {
            Some(HashAlgorithm::SHA256)
        } else if oid.eq(&ID_SHA384) {
            Some(HashAlgorithm::SHA384)
        } else if oid.eq(&ID_SHA512) {
            Some(HashAlgorithm::SHA512)
        } else if oid.eq(&ID_SHA3_224) {
            Some(HashAlgorithm::SHA3_224)
        } else if oid.eq(&ID_SHA3_256) {
            Some(HashAlgorithm::SHA3_256)
        } else if oid.eq(&ID_SHA3_384) {
            Some(HashAlgorithm::SHA3_384)
        } else if oid.eq(&ID_SHA3_512) {
            Some(HashAlgorithm::SHA3_512)
        } else {
            None
        }
    }

    pub fn message_digest(&self) -> openssl::hash::MessageDigest {
        match self {
            Self::MD5 => openssl::hash::MessageDigest::md5(),
            Self::SHA1 => openssl::hash::MessageDigest::sha1(),
            Self::SHA224 => openssl::hash::MessageDigest::sha224(),
            Self::SHA256 => openssl::hash::MessageDigest::sha256(),
            Self::SHA384 => openssl::hash::MessageDigest::sha384(),
            Self::SHA512 => openssl::hash::MessageDigest::sha512(),
            Self::SHA3_224 => openssl::hash::MessageDigest::sha3_224(),
            Self::SHA3_256 => openssl::hash::MessageDigest::sha3_256(),
            Self::SHA3_384 => openssl::hash::MessageDigest::sha3_384(),
            Self::SHA3_512 => openssl::hash::MessageDigest::sha3_512(),
        }
    }
}

/// A certificate serial number, held as its minimal big-endian magnitude.
///
/// The canonical string form is the uppercase hex of the DER `INTEGER`
/// content octets, so `0xAB` renders as `00AB` and zero as `00`. It is used
/// both as the status-store key and for serial prefix matching.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Serial(Vec<u8>);

impl Serial {
    pub fn from_bytes(bytes: &[u8]) -> Serial {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Serial(bytes[start..].to_vec())
    }

    pub fn from_hex(serial: &str) -> Result<Serial, hex::FromHexError> {
        let bytes = if serial.len() % 2 == 1 {
            hex::decode(format!("0{}", serial))?
        } else {
            hex::decode(serial)?
        };
        Ok(Serial::from_bytes(&bytes))
    }

    pub fn der_content(&self) -> Vec<u8> {
        match self.0.first() {
            None => vec![0],
            Some(b) if b & 0x80 != 0 => {
                let mut out = Vec::with_capacity(self.0.len() + 1);
                out.push(0);
                out.extend_from_slice(&self.0);
                out
            }
            Some(_) => self.0.clone(),
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.der_content())
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Serial {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "Serial({})", self.to_hex())
    }
}

/// The single certificate an OCSP request asks about.
#[derive(Clone)]
pub struct OCSPRequest {
    pub hash_algorithm: HashAlgorithm,
    pub issuer_name_hash: Vec<u8>,
    pub issuer_key_hash: Vec<u8>,
    pub serial_number: Serial,
}

impl std::fmt::Debug for OCSPRequest {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("OCSPRequest")
            .field("hash_algorithm", &self.hash_algorithm)
            .field("issuer_name_hash", &hex::encode(&self.issuer_name_hash))
            .field("issuer_key_hash", &hex::encode(&self.issuer_key_hash))
            .field("serial_number", &self.serial_number)
            .finish()
    }
}

/// Parses a DER OCSP request. Only the first entry of `requestList` is used.
pub fn parse_ocsp_req(req: &[u8]) -> Result<OCSPRequest, OCSPResponseStatus> {
    let outer_request = match asn1::parse_single::<proto::OCSPRequest>(req) {
        Ok(r) => r,
        Err(e) => {
            debug!("Error parsing OCSP request: {:?}", e);
            return Err(OCSPResponseStatus::MalformedRequest);
        }
    };
    let tbs_request = outer_request.tbs_request;

    if tbs_request.version != proto::Version::V1 as u8 {
        debug!("Received unsupported OCSP request version: {}", tbs_request.version);
        return Err(OCSPResponseStatus::MalformedRequest);
    }

    let first_request = match tbs_request.request_list.clone().next() {
        Some(r) => r,
        None => {
            debug!("Received OCSP request with an empty request list");
            return Err(OCSPResponseStatus::MalformedRequest);
        }
    };
    let cert_id = first_request.request_cert;

    let hash_algorithm = match HashAlgorithm::from_oid(&cert_id.hash_algorithm.algorithm) {
        Some(a) => a,
        None => {
            debug!("Unknown digest algorithm: {:?}", cert_id.hash_algorithm.algorithm);
            return Err(OCSPResponseStatus::MalformedRequest);
        }
    };

    Ok(OCSPRequest {
        hash_algorithm,
        issuer_name_hash: cert_id.issuer_name_hash.to_vec(),
        issuer_key_hash: cert_id.issuer_key_hash.to_vec(),
        serial_number: Serial::from_bytes(cert_id.serial_number.as_bytes()),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseParseError {
    #[error("malformed DER: {0:?}")]
    Asn1(asn1::ParseError),
    #[error("response status {0} is not successful")]
    NotSuccessful(u32),
    #[error("response has no response bytes")]
    NoResponseBytes,
    #[error("response type is not id-pkix-ocsp-basic")]
    UnsupportedResponseType,
    #[error("response contains no single responses")]
    NoSingleResponses,
    #[error("invalid GeneralizedTime")]
    InvalidTime,
}

impl From<asn1::ParseError> for ResponseParseError {
    fn from(from: asn1::ParseError) -> ResponseParseError {
        ResponseParseError::Asn1(from)
    }
}

/// What the transport and the static source need to know about a pre-signed response.
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    pub serials: Vec<Serial>,
}

fn parse_generalized_time(tlv: &asn1::Tlv<'_>) -> Result<DateTime<Utc>, ResponseParseError> {
    let value = std::str::from_utf8(tlv.data()).map_err(|_| ResponseParseError::InvalidTime)?;
    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%SZ")
        .map_err(|_| ResponseParseError::InvalidTime)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Reads the timing and serials out of a DER OCSP response, without verifying it.
///
/// `this_update` and `next_update` come from the first single response.
pub fn parse_ocsp_resp(resp: &[u8]) -> Result<ResponseMetadata, ResponseParseError> {
    let outer = asn1::parse_single::<proto::OCSPResponse>(resp)?;
    let status = outer.response_status.value();
    if status != OCSPResponseStatus::Successful as u32 {
        return Err(ResponseParseError::NotSuccessful(status));
    }
    let response_bytes = outer.response_bytes.ok_or(ResponseParseError::NoResponseBytes)?;
    if !response_bytes.response_type.eq(&ID_PKIX_OCSP_BASIC) {
        return Err(ResponseParseError::UnsupportedResponseType);
    }

    let basic = asn1::parse_single::<proto::BasicOCSPResponse>(response_bytes.response)?;
    let tbs = basic.tbs_response_data;
    // producedAt is not reported but must still be well formed.
    parse_generalized_time(&tbs.produced_at)?;

    let mut first_update = None;
    let mut serials = vec![];
    for single in tbs.responses {
        if first_update.is_none() {
            let this_update = parse_generalized_time(&single.this_update)?;
            let next_update = single.next_update.as_ref().map(parse_generalized_time).transpose()?;
            first_update = Some((this_update, next_update));
        }
        serials.push(Serial::from_bytes(single.cert_id.serial_number.as_bytes()));
    }

    let (this_update, next_update) = first_update.ok_or(ResponseParseError::NoSingleResponses)?;

    Ok(ResponseMetadata {
        this_update,
        next_update,
        serials,
    })
}
