pub mod geoapify;

pub use geoapify::{GeoapifyClient, GeoapifyConfig};
