// Daemon defaults

// Default RPC server bind address, admin methods are only served to loopback clients
pub const DEFAULT_RPC_BIND_ADDRESS: &str = "127.0.0.1:8080";
// Number of actix workers for the RPC server
pub const DEFAULT_RPC_WORKERS: usize = 4;

// Default directory of the sled backend
pub const DEFAULT_STORAGE_DIR: &str = "storage/";

// Accrual sweep period, the engine tolerates any frequency
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

// Attempts of an atomic unit before giving up on concurrency conflicts
pub const DEFAULT_MAX_ATOMIC_ATTEMPTS: u32 = 8;
// Base delay between two attempts, multiplied by the attempt number
pub const ATOMIC_RETRY_BACKOFF_MS: u64 = 2;

// Buffered events per subscriber before it starts lagging
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;
