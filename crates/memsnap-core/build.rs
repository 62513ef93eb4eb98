//! Build script for memsnap-core
//!
//! This script checks system requirements before compilation:
//! - Minimum Rust version (C string literals = Rust 1.77.0+)
//! - Target platform (the native layer only exists on Windows)
//!
//! ## Requirements
//!
//! - **Rust**: 1.77.0 or newer (`c"..."` literals in the Windows layer)
//! - **Windows**: Windows 8.1 / Server 2012 R2 or newer for snapshot dumps
//!   (`PssCaptureSnapshot`); direct dumps work on any supported release
//! - **Other targets**: the crate builds, but every native entry point reports
//!   `UnsupportedPlatform`

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 77, 0);

        if rustc_version < min_rust_version {
            panic!(
                "memsnap-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // Build scripts run on the host, so look at the target through cargo's env
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        println!(
            "cargo:warning=memsnap-core targets Windows; building for `{target_os}` leaves only the portable layer"
        );
    }
}
