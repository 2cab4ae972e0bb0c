//! C4: protocol-agnostic dispatch with pooled connections, a per-upstream circuit breaker,
//! health monitoring, and retry with backoff.

pub mod breaker;
pub mod grpc_dispatch;
pub mod health;
pub mod http_dispatch;
pub mod pool;
pub mod protocol;
pub mod runtime;

pub use protocol::DispatchResponse;
pub use runtime::DispatchRuntime;
