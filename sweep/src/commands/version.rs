/// Get the version string for sweep and libsweep
pub fn get_version_string() -> String {
    format!(
        "sweep {}\nlibsweep {}",
        env!("CARGO_PKG_VERSION"),
        libsweep::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
