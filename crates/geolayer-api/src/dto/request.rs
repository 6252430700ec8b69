use serde::Deserialize;

/// Point conversion request body
#[derive(Debug, Deserialize)]
pub struct PlotTableRequest {
    pub handle: Option<String>,
    pub lat_col: Option<String>,
    pub lon_col: Option<String>,
}
