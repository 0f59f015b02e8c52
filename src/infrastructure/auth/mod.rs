pub mod middleware;
pub mod request_id;

pub use middleware::{caller_middleware, Caller, X_DEVICE_ID};
pub use request_id::{request_id_middleware, RequestId};
