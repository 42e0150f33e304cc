//! Commands: requests to change one aggregate.

use uuid::Uuid;

/// A request addressed to a single aggregate, decided against its history.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name such as `cart.add_item`, recorded on handler spans.
    fn command_type(&self) -> &'static str;

    /// Caller-supplied id linking the command to the log lines it produces.
    fn correlation_id(&self) -> Uuid;

    /// The stream the command reads and appends to.
    fn aggregate_id(&self) -> Uuid;
}
