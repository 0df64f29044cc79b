pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{IdentityAdapter, PgProfileStore, ServerDeps};
pub use traits::{BaseIdentityProvider, BaseProfileStore, SessionLookup};
