mod health;
mod layers;
mod markers;
mod reset;
mod table;
mod upload;

pub use health::health_check;
pub use layers::{get_layer, list_layers};
pub use markers::list_markers;
pub use reset::reset_session;
pub use table::plot_table;
pub use upload::{handle_upload, sanitize_filename};
