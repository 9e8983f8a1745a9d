//! opbatch end-to-end test support.
//!
//! - `fixture` - a seeded database in a temporary directory
//! - `assertion` - fluent checks on batch responses
//!
//! Test files import everything through [`prelude`].

mod assertion;
mod fixture;

pub use assertion::{expect, ResponseAssert};
pub use fixture::{TestDb, SEED_SQL};

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

pub mod prelude {
    pub use crate::{expect, init_tracing_for_tests, ResponseAssert, TestDb};
    pub use opbatch_core::Value;
    pub use opbatch_resolver::EmptyDependencyPolicy;
    pub use opbatch_session::{BatchResponse, ExecutionOptions, StatusCode};
    pub use serde_json::json;
}
