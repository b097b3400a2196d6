//! Certificate, request and response fixtures for the OCSP tests.

use chrono::prelude::*;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509, X509Builder, X509NameBuilder};

pub struct TestIssuer {
    pub cert: X509,
    pub key: PKey<Private>,
    point: Vec<u8>,
}

pub fn issuer(common_name: &str) -> TestIssuer {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let ec_key = EcKey::generate(&group).unwrap();
    let mut ctx = openssl::bn::BigNumContext::new().unwrap();
    let point = ec_key.public_key()
        .to_bytes(&group, PointConversionForm::UNCOMPRESSED, &mut ctx)
        .unwrap();
    let key = PKey::from_ec_key(ec_key).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    TestIssuer {
        cert: builder.build(),
        key,
        point,
    }
}

/// SHA-1 over the issuer's uncompressed EC point, which is exactly the
/// content of its subjectPublicKey bit string.
pub fn key_hash(issuer: &TestIssuer) -> Vec<u8> {
    openssl::hash::hash(MessageDigest::sha1(), &issuer.point).unwrap().to_vec()
}

pub fn leaf(issuer: &TestIssuer, serial_hex: &str) -> X509 {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "leaf.example.com").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&BigNum::from_hex_str(serial_hex).unwrap().to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(issuer.cert.subject_name()).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(90).unwrap()).unwrap();
    builder.sign(&issuer.key, MessageDigest::sha256()).unwrap();
    builder.build()
}

pub fn ocsp_request_der(issuer: &TestIssuer, serial_hex: &str) -> Vec<u8> {
    let leaf = leaf(issuer, serial_hex);
    let cert_id = openssl::ocsp::OcspCertId::from_cert(MessageDigest::sha1(), &leaf, &issuer.cert).unwrap();
    let mut req = openssl::ocsp::OcspRequest::new().unwrap();
    req.add_id(cert_id).unwrap();
    req.to_der().unwrap()
}

pub fn request(key_hash: &[u8], serial_hex: &str) -> super::types::OCSPRequest {
    super::types::OCSPRequest {
        hash_algorithm: super::types::HashAlgorithm::SHA1,
        issuer_name_hash: vec![0; 20],
        issuer_key_hash: key_hash.to_vec(),
        serial_number: super::types::Serial::from_hex(serial_hex).unwrap(),
    }
}

#[derive(asn1::Asn1Write)]
struct OCSPResponseWrite<'a> {
    response_status: asn1::Enumerated,
    #[explicit(0)]
    response_bytes: Option<ResponseBytesWrite<'a>>,
}

#[derive(asn1::Asn1Write)]
struct ResponseBytesWrite<'a> {
    response_type: asn1::ObjectIdentifier,
    response: &'a [u8],
}

#[derive(asn1::Asn1Write)]
struct AlgorithmIdentifierWrite {
    algorithm: asn1::ObjectIdentifier,
}

#[derive(asn1::Asn1Write)]
struct BasicOCSPResponseWrite<'a> {
    tbs_response_data: ResponseDataWrite<'a>,
    signature_algorithm: AlgorithmIdentifierWrite,
    signature: asn1::BitString<'a>,
}

#[derive(asn1::Asn1Write)]
struct ResponseDataWrite<'a> {
    responder_id: asn1::Tlv<'a>,
    produced_at: asn1::Tlv<'a>,
    responses: asn1::SequenceOfWriter<'a, SingleResponseWrite<'a>>,
}

#[derive(asn1::Asn1Write)]
struct SingleResponseWrite<'a> {
    cert_id: CertIDWrite<'a>,
    cert_status: asn1::Tlv<'a>,
    this_update: asn1::Tlv<'a>,
    #[explicit(0)]
    next_update: Option<asn1::Tlv<'a>>,
}

#[derive(asn1::Asn1Write)]
struct CertIDWrite<'a> {
    hash_algorithm: AlgorithmIdentifierWrite,
    issuer_name_hash: &'a [u8],
    issuer_key_hash: &'a [u8],
    serial_number: asn1::BigUint<'a>,
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    assert!(content.len() < 0x80);
    let mut out = vec![tag, content.len() as u8];
    out.extend_from_slice(content);
    out
}

fn generalized_time(time: DateTime<Utc>) -> Vec<u8> {
    tlv(0x18, time.format("%Y%m%d%H%M%SZ").to_string().as_bytes())
}

/// A successful, unsigned basic OCSP response with a `good` status for each serial.
pub fn ocsp_response_der(
    issuer_key_hash: &[u8], serials: &[&str], this_update: DateTime<Utc>, next_update: Option<DateTime<Utc>>,
) -> Vec<u8> {
    let sha1 = asn1::ObjectIdentifier::from_string("1.3.14.3.2.26").unwrap();
    let ecdsa_with_sha256 = asn1::ObjectIdentifier::from_string("1.2.840.10045.4.3.2").unwrap();

    let responder_id = tlv(0xa2, &tlv(0x04, issuer_key_hash));
    let good = tlv(0x80, &[]);
    let this_update = generalized_time(this_update);
    let next_update = next_update.map(generalized_time);
    let serials = serials.iter()
        .map(|s| super::types::Serial::from_hex(s).unwrap().der_content())
        .collect::<Vec<_>>();

    let responses = serials.iter().map(|serial| SingleResponseWrite {
        cert_id: CertIDWrite {
            hash_algorithm: AlgorithmIdentifierWrite { algorithm: sha1.clone() },
            issuer_name_hash: &[0; 20],
            issuer_key_hash,
            serial_number: asn1::BigUint::new(serial).unwrap(),
        },
        cert_status: asn1::parse_single(&good).unwrap(),
        this_update: asn1::parse_single(&this_update).unwrap(),
        next_update: next_update.as_ref().map(|n| asn1::parse_single(n).unwrap()),
    }).collect::<Vec<_>>();

    let basic = asn1::write_single(&BasicOCSPResponseWrite {
        tbs_response_data: ResponseDataWrite {
            responder_id: asn1::parse_single(&responder_id).unwrap(),
            produced_at: asn1::parse_single(&this_update).unwrap(),
            responses: asn1::SequenceOfWriter::new(&responses[..]),
        },
        signature_algorithm: AlgorithmIdentifierWrite { algorithm: ecdsa_with_sha256 },
        signature: asn1::BitString::new(&[0xde, 0xad, 0xbe, 0xef], 0).unwrap(),
    }).unwrap();

    asn1::write_single(&OCSPResponseWrite {
        response_status: asn1::Enumerated::new(0),
        response_bytes: Some(ResponseBytesWrite {
            response_type: super::types::ID_PKIX_OCSP_BASIC.clone(),
            response: &basic,
        }),
    }).unwrap()
}
