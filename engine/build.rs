use std::env;

fn main() {
    // write build time info
    built::write_built_file().expect("Failed to acquire build-time information");
    // unconditionally rerun this build script so build time info is always up to date
    #[cfg(not(debug_assertions))]
    println!("cargo:rerun-if-changed=foobaz");

    // the default dispatch seed can be baked in at build time.
    // The config module falls back to it when DISPATCH_SEED is not set at runtime.
    if let Ok(val) = env::var("DEFAULT_DISPATCH_SEED") {
        println!("cargo:rustc-env=EMERGENCY_NET_DEFAULT_SEED={}", val);
    }
    println!("cargo:rerun-if-env-changed=DEFAULT_DISPATCH_SEED");
}
