mod request;
mod response;

pub use request::PlotTableRequest;
pub use response::{HealthResponse, MapResponse, ResetResponse, UploadResponse};
