#[derive(asn1::Asn1Read)]
pub struct OCSPRequest<'a> {
    pub tbs_request: TBSRequest<'a>,
    #[explicit(0)]
    pub signature: Option<asn1::Tlv<'a>>,
}

#[derive(asn1::Asn1Read)]
pub struct TBSRequest<'a> {
    #[explicit(0)]
    #[default(0)]
    pub version: u8,
    #[explicit(1)]
    pub requester_name: Option<asn1::Tlv<'a>>,
    pub request_list: asn1::SequenceOf<'a, Request<'a>>,
    #[explicit(2)]
    pub request_extensions: Option<asn1::Tlv<'a>>,
}

pub enum Version {
    V1 = 0
}

#[derive(asn1::Asn1Read)]
pub struct Request<'a> {
    pub request_cert: CertID<'a>,
    #[explicit(0)]
    pub single_request_extensions: Option<asn1::Tlv<'a>>
}

#[derive(asn1::Asn1Read)]
pub struct CertID<'a> {
    pub hash_algorithm: AlgorithmIdentifier<'a>,
    pub issuer_name_hash: &'a [u8],
    pub issuer_key_hash: &'a [u8],
    pub serial_number: asn1::BigUint<'a>,
}

#[derive(asn1::Asn1Read)]
pub struct AlgorithmIdentifier<'a> {
    pub algorithm: asn1::ObjectIdentifier,
    pub parameters: Option<asn1::Tlv<'a>>,
}

/// Only the key material is hashed for an OCSP issuer key hash, never the
/// algorithm wrapper (RFC 6960 section 4.1.1).
#[derive(asn1::Asn1Read)]
pub struct SubjectPublicKeyInfo<'a> {
    pub algorithm: AlgorithmIdentifier<'a>,
    pub subject_public_key: asn1::BitString<'a>,
}

#[derive(asn1::Asn1Read)]
pub struct OCSPResponse<'a> {
    pub response_status: asn1::Enumerated,
    #[explicit(0)]
    pub response_bytes: Option<ResponseBytes<'a>>,
}

/// An `OCSPResponse` without `responseBytes`, used for every non-successful status.
#[derive(asn1::Asn1Write)]
pub struct StatusOnlyOCSPResponse {
    pub response_status: asn1::Enumerated,
}

#[derive(asn1::Asn1Read)]
pub struct ResponseBytes<'a> {
    pub response_type: asn1::ObjectIdentifier,
    pub response: &'a [u8],
}

#[derive(asn1::Asn1Read)]
pub struct BasicOCSPResponse<'a> {
    pub tbs_response_data: ResponseData<'a>,
    pub signature_algorithm: AlgorithmIdentifier<'a>,
    pub signature: asn1::BitString<'a>,
    #[explicit(0)]
    pub certs: Option<asn1::Tlv<'a>>,
}

// Times are kept as raw TLVs and decoded in `types`.
#[derive(asn1::Asn1Read)]
pub struct ResponseData<'a> {
    #[explicit(0)]
    #[default(0)]
    pub version: u8,
    pub responder_id: asn1::Tlv<'a>,
    pub produced_at: asn1::Tlv<'a>,
    pub responses: asn1::SequenceOf<'a, SingleResponse<'a>>,
    #[explicit(1)]
    pub response_extensions: Option<asn1::Tlv<'a>>
}

#[derive(asn1::Asn1Read)]
pub struct SingleResponse<'a> {
    pub cert_id: CertID<'a>,
    pub cert_status: asn1::Tlv<'a>,
    pub this_update: asn1::Tlv<'a>,
    #[explicit(0)]
    pub next_update: Option<asn1::Tlv<'a>>,
    #[explicit(1)]
    pub single_extensions: Option<asn1::Tlv<'a>>
}
