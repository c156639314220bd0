//! Verbosity mapping for `-v` flags

/// Log filter for a `-v` count
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        // -vvv adds detail to the output format, not more events
        _ => "trace",
    }
}
