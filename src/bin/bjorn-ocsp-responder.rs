#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

#[launch]
fn rocket() -> _ {
    pretty_env_logger::init();
    info!("Bjorn OCSP Responder version {} starting up...", env!("CARGO_PKG_VERSION"));

    let figment = rocket::Config::figment();
    let config = match bjorn_ocsp::ocsp::ResponderConfig::from_figment(&figment) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid 'ocsp_responder' configuration: {}", e);
            std::process::exit(1);
        }
    };

    match bjorn_ocsp::ocsp::build(figment, config) {
        Ok(r) => r,
        Err(e) => {
            error!("Unable to start OCSP responder: {}", e);
            std::process::exit(1);
        }
    }
}
