//! Build script for postal-facade
//!
//! Linking is only needed when the `system-libpostal` feature is enabled.
//! In that case libpostal is located through pkg-config, with a fallback to
//! `LIBPOSTAL_LIB_DIR` for installs that ship no `.pc` file.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LIBPOSTAL_LIB_DIR");
    println!("cargo:rerun-if-env-changed=LIBPOSTAL_STATIC");

    // Cargo exposes enabled features to build scripts as env vars
    if env::var_os("CARGO_FEATURE_SYSTEM_LIBPOSTAL").is_none() {
        return;
    }

    if try_pkg_config() {
        return;
    }

    println!("cargo:warning=pkg-config could not find libpostal, falling back to -lpostal");
    setup_manual_linking();
}

/// Try to use system-installed libpostal via pkg-config
fn try_pkg_config() -> bool {
    let statik = env::var_os("LIBPOSTAL_STATIC").is_some();
    match pkg_config::Config::new().statik(statik).probe("libpostal") {
        Ok(library) => {
            for path in &library.link_paths {
                println!("cargo:rustc-link-search=native={}", path.display());
            }
            true
        }
        Err(e) => {
            println!("cargo:warning=pkg-config probe failed: {e}");
            false
        }
    }
}

/// Link against libpostal without pkg-config metadata
fn setup_manual_linking() {
    if let Ok(lib_dir) = env::var("LIBPOSTAL_LIB_DIR") {
        println!("cargo:rustc-link-search=native={lib_dir}");
    }

    if env::var_os("LIBPOSTAL_STATIC").is_some() {
        println!("cargo:rustc-link-lib=static=postal");

        // Link additional libraries that libpostal depends on
        if cfg!(target_os = "linux") {
            println!("cargo:rustc-link-lib=pthread");
            println!("cargo:rustc-link-lib=m");
            println!("cargo:rustc-link-lib=dl");
        } else if cfg!(target_os = "macos") {
            println!("cargo:rustc-link-lib=pthread");
            println!("cargo:rustc-link-lib=m");
        }
    } else {
        println!("cargo:rustc-link-lib=postal");
    }
}
