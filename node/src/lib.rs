//! Vigil node: turns requests into witnessed blocks.
//!
//! The node owns the ledger and the DPoS state and runs every request
//! through the same pipeline:
//! - check the blueprint against the ledger
//! - elect a new round when the current one has ended
//! - forge with the current forger, then sign, verify and append
//! - apply the block's effect and pay out the forge reward
//!
//! [`spawn_node`] puts a node behind a tokio channel so that concurrent
//! callers are served one request at a time.

pub mod config;
pub mod error;
pub mod genesis;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod payout;
pub mod queue;
pub mod request;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::Node;
pub use payout::split_reward;
pub use queue::{spawn_node, NodeHandle};
pub use request::{PayoutCredit, PayoutReport, PayoutWarning, ProcessOutcome, Request};
