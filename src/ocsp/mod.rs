use base64::prelude::*;
use base64::engine::{general_purpose::{GeneralPurpose, GeneralPurposeConfig}, DecodePaddingMode};
use chrono::prelude::*;
use rocket::http::uri::{fmt::Path, Segments};

mod proto;
mod types;
pub mod schema;
pub mod config;
pub mod filter;
pub mod issuers;
pub mod memory;
pub mod models;
pub mod processing;
pub mod source;
pub mod store;
#[cfg(test)]
mod test_util;

pub use config::{ConfigError, ResponderConfig, SourceKind};
pub use filter::RequestFilter;
pub use issuers::{IssuerID, IssuerKeyIndex};
pub use memory::MemorySource;
pub use processing::DBSource;
pub use source::{respond_until, shutdown_deadline, Response, Source, SourceError};
pub use store::{PgStatusStore, StatusStore, StoreError};
pub use types::{parse_ocsp_req, parse_ocsp_resp, HashAlgorithm, OCSPRequest, OCSPResponseStatus, ResponseMetadata, ResponseParseError, Serial};

const REQUEST_LIMIT: usize = 4096;
const INDEX_MAX_AGE: &str = "max-age=43200";

const STANDARD_ANY_PAD: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const URL_SAFE_ANY_PAD: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub struct OCSPResponse {
    status: rocket::http::Status,
    value: Vec<u8>,
    headers: Vec<rocket::http::Header<'static>>,
}

impl OCSPResponse {
    fn status_only(http_status: rocket::http::Status, status: OCSPResponseStatus) -> OCSPResponse {
        OCSPResponse {
            status: http_status,
            value: status.response_bytes().to_vec(),
            headers: vec![],
        }
    }

    /// Wraps a stored response, deriving the caching headers from its own
    /// validity period.
    fn signed(response: Response, max_age: Option<u64>, now: DateTime<Utc>) -> Result<OCSPResponse, types::ResponseParseError> {
        let metadata = types::parse_ocsp_resp(&response.der)?;

        let etag = hex::encode_upper(openssl::sha::sha256(&response.der));
        let mut headers = vec![
            rocket::http::Header::new("ETag", format!("\"{}\"", etag)),
            rocket::http::Header::new("Last-Modified", http_date(metadata.this_update)),
        ];

        let mut cache_for = match metadata.next_update {
            Some(next_update) => {
                headers.push(rocket::http::Header::new("Expires", http_date(next_update)));
                (next_update - now).num_seconds().max(0) as u64
            }
            None => 0,
        };
        if let Some(max_age) = max_age {
            cache_for = cache_for.min(max_age);
        }
        headers.push(rocket::http::Header::new(
            "Cache-Control", format!("max-age={}, public, no-transform, must-revalidate", cache_for),
        ));

        headers.extend(response.headers);

        Ok(OCSPResponse {
            status: rocket::http::Status::Ok,
            value: response.der,
            headers,
        })
    }
}

fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

impl<'r> rocket::response::Responder<'r, 'static> for OCSPResponse {
    fn respond_to(self, _req: &'r rocket::request::Request<'_>) -> rocket::response::Result<'static> {
        let mut builder = rocket::response::Response::build();

        builder.status(self.status);
        builder.header(rocket::http::ContentType::new("application", "ocsp-response"));
        builder.raw_header("Date", http_date(Utc::now()));
        for header in self.headers {
            builder.header(header);
        }

        builder.sized_body(self.value.len(), std::io::Cursor::new(self.value));

        builder.ok()
    }
}

/// Turns a raw DER request into the HTTP answer. Never fails: every outcome
/// is some OCSP response.
pub async fn handle_ocsp<C>(req: &[u8], source: &dyn Source, max_age: Option<u64>, cancel: C) -> OCSPResponse
    where C: std::future::Future<Output = ()>
{
    let request = match types::parse_ocsp_req(req) {
        Ok(r) => r,
        Err(status) => return OCSPResponse::status_only(rocket::http::Status::Ok, status),
    };
    debug!("Received OCSP request: {:?}", request);

    match respond_until(source, &request, cancel).await {
        Ok(response) => match OCSPResponse::signed(response, max_age, Utc::now()) {
            Ok(r) => r,
            Err(e) => {
                error!(
                    target: "audit",
                    "Stored OCSP response for CA={}, Serial={} is unusable: {}",
                    hex::encode(&request.issuer_key_hash), request.serial_number, e
                );
                OCSPResponse::status_only(rocket::http::Status::InternalServerError, OCSPResponseStatus::InternalError)
            }
        },
        Err(SourceError::NotFound) => OCSPResponse::status_only(rocket::http::Status::Ok, OCSPResponseStatus::Unauthorized),
        Err(SourceError::Internal) => OCSPResponse::status_only(
            rocket::http::Status::InternalServerError, OCSPResponseStatus::InternalError,
        ),
    }
}

#[derive(Responder)]
pub struct IndexResponse {
    inner: (),
    cache_control: rocket::http::Header<'static>,
}

#[get("/")]
pub fn index() -> IndexResponse {
    IndexResponse {
        inner: (),
        cache_control: rocket::http::Header::new("Cache-Control", INDEX_MAX_AGE),
    }
}

#[head("/<_request..>")]
pub fn ocsp_head(_request: Segments<'_, Path>) -> rocket::http::Status {
    rocket::http::Status::MethodNotAllowed
}

#[get("/<request..>", rank = 2)]
pub async fn ocsp_get(
    request: Segments<'_, Path>, source: &rocket::State<Box<dyn Source>>,
    config: &rocket::State<ResponderConfig>, rocket_config: &rocket::Config, shutdown: rocket::Shutdown,
) -> Result<OCSPResponse, rocket::http::Status> {
    let request = request.collect::<Vec<_>>().join("/");
    let ocsp_req = match STANDARD_ANY_PAD.decode(&request).or_else(|_| URL_SAFE_ANY_PAD.decode(&request)) {
        Ok(r) => r,
        Err(_) => {
            debug!("Undecodable OCSP GET request: {}", request);
            return Err(rocket::http::Status::BadRequest);
        }
    };

    let deadline = source::shutdown_deadline(shutdown, shutdown_grace(rocket_config));
    Ok(handle_ocsp(&ocsp_req, source.inner().as_ref(), config.max_age(), deadline).await)
}

#[post("/", format = "application/ocsp-request", data = "<request>")]
pub async fn ocsp_post(
    request: rocket::data::Data<'_>, source: &rocket::State<Box<dyn Source>>,
    config: &rocket::State<ResponderConfig>, rocket_config: &rocket::Config, shutdown: rocket::Shutdown,
) -> Result<OCSPResponse, rocket::http::Status> {
    let ocsp_req = match request.open(REQUEST_LIMIT * rocket::data::ByteUnit::B).into_bytes().await {
        Ok(r) => r,
        Err(_) => return Err(rocket::http::Status::InternalServerError)
    };

    if !ocsp_req.is_complete() {
        return Err(rocket::http::Status::PayloadTooLarge);
    }

    let deadline = source::shutdown_deadline(shutdown, shutdown_grace(rocket_config));
    Ok(handle_ocsp(&ocsp_req, source.inner().as_ref(), config.max_age(), deadline).await)
}

fn shutdown_grace(config: &rocket::Config) -> std::time::Duration {
    std::time::Duration::from_secs(config.shutdown.grace as u64)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index, ocsp_head, ocsp_get, ocsp_post]
}

/// Assembles the responder from its configuration: picks the response source,
/// attaches the database pool if it needs one, and mounts the routes.
pub fn build(figment: figment::Figment, config: ResponderConfig) -> Result<rocket::Rocket<rocket::Build>, ConfigError> {
    let rocket = match config.source_kind()? {
        SourceKind::File(path) => {
            let source = MemorySource::from_file(&path)?;
            rocket::custom(figment).manage(Box::new(source) as Box<dyn Source>)
        }
        SourceKind::Database => {
            let filter = config.request_filter()?;
            info!("Answering for {} issuer(s)", filter.issuers().len());
            let timeout = config.timeout();

            let figment = match config.database_url() {
                Some(url) if figment.find_value("databases.ocsp.url").is_err() => {
                    figment.merge(("databases.ocsp.url", url))
                }
                _ => figment,
            };

            rocket::custom(figment)
                .attach(crate::DBConn::fairing())
                .attach(rocket::fairing::AdHoc::try_on_ignite("OCSP Status Store", move |rocket| async move {
                    let pool = match crate::DBConn::pool(&rocket) {
                        Some(p) => p.clone(),
                        None => {
                            error!("OCSP database pool is not available");
                            return Err(rocket);
                        }
                    };

                    let source = DBSource::new(PgStatusStore::new(pool), filter, timeout);
                    Ok(rocket.manage(Box::new(source) as Box<dyn Source>))
                }))
        }
    };

    Ok(rocket.manage(config).mount("/", routes()))
}
