/// Worker count used when the host parallelism cannot be detected
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Lower bound on the worker pool
pub const MIN_CONCURRENCY: usize = 1;
/// Pseudo step name used when a final item has no producer
pub const FINAL_REQUESTER: &str = "<final>";
/// Producer name recorded for root inputs in the registry
pub const ROOT_PRODUCER: &str = "<root>";
