// Provider module: market data access.

pub mod fetcher;
pub mod traits;

pub use fetcher::ProviderImpl;
pub use traits::Provider;
