fn main() {
    for (from, to) in [
        ("TARGET", "LORALOG_BUILD_TARGET"),
        ("PROFILE", "LORALOG_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(from) {
            println!("cargo:rustc-env={to}={value}");
        }
        println!("cargo:rerun-if-env-changed={from}");
    }
}
