//! Minimal HTTP/1.1 layer used by the client and the DoH transport.

pub mod response;
pub mod streamfactory;

pub use response::HttpResponse;
pub use streamfactory::{build_request, HttpStream, HttpStreamFactory};
