table! {
    certificate_status (serial) {
        serial -> Varchar,
        issuer_id -> Int8,
        ocsp_response -> Bytea,
        ocsp_last_updated -> Nullable<Timestamptz>,
        is_expired -> Bool,
    }
}
