pub mod http_probe;
pub mod record;

pub use http_probe::{HostProber, ProbeMode, ProbeReport};
pub use record::ProbeRecord;
