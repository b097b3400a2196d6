use super::schema::*;
use chrono::prelude::*;

/// One row per issued certificate, written by the issuance pipeline.
#[derive(Queryable, Identifiable, Debug, Clone)]
#[diesel(primary_key(serial), table_name = certificate_status)]
pub struct CertificateStatus {
    pub serial: String,
    pub issuer_id: i64,
    pub ocsp_response: Vec<u8>,
    pub ocsp_last_updated: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

impl CertificateStatus {
    pub fn issuer(&self) -> super::issuers::IssuerID {
        super::issuers::IssuerID(self.issuer_id)
    }

    /// Rows that have never had a response signed carry no (or a zero) update time.
    pub fn has_generated_response(&self) -> bool {
        match self.ocsp_last_updated {
            Some(t) => t.timestamp() > 0,
            None => false,
        }
    }
}
