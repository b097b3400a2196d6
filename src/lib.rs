#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate rocket_sync_db_pools;
#[macro_use]
extern crate log;
#[macro_use]
extern crate diesel;

pub mod ocsp;

#[database("ocsp")]
pub struct DBConn(rocket_sync_db_pools::diesel::PgConnection);
