pub const BYTES_PER_KB: usize = 1024;
pub const BYTES_PER_MB: usize = 1_048_576;
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;
pub const MILLIS_PER_SECOND: f64 = 1000.0;
