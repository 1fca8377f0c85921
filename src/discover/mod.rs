pub mod crtsh;
pub mod subdomain;
pub mod urlscan;

pub use subdomain::{ReconReport, SourceOutcome, SubdomainEnumerator};
