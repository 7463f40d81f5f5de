//! Cloud Run data sources.

pub mod http_source;
pub mod mock;
pub mod token;

pub use http_source::HttpCloudRunSource;
pub use mock::MockCloudRunSource;
pub use token::AccessTokenProvider;
