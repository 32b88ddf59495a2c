/// Get the version string for manifesto and libmanifesto
pub fn get_version_string() -> String {
    format!(
        "manifesto {}\nlibmanifesto {}",
        env!("CARGO_PKG_VERSION"),
        libmanifesto::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
