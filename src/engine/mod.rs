mod fetcher;
mod kind;
mod manager;
mod query;
mod registry;
mod scheduler;
pub mod state;
mod traits;

pub use fetcher::{FetchError, HttpFetcher};
pub use kind::{ProxyKind, UnknownKind};
pub use manager::{refresh_all, RefreshFailure, RefreshReport, StandardManager};
pub use query::{QueryError, QueryService};
pub use registry::{RegistryError, SourceRegistry};
pub use scheduler::{delay_until_next_boundary, Scheduler};
pub use state::{Phase, RefreshState};
pub use traits::{ListFetcher, ListManager};
