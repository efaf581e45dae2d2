pub mod hub;
pub mod routes;
