pub mod attribution;

pub use attribution::AttributionMiddleware;
