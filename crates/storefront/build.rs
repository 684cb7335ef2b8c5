//! Build script for the storefront crate.
//!
//! Fingerprints `static/css/main.css` so the stylesheet can be served with an
//! immutable cache header. The hash is exposed as `CSS_HASH` and the file is
//! copied to `static/css/derived/main.<hash>.css`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest kept in the file name.
const HASH_LENGTH: usize = 8;

fn main() {
    let Some(manifest_dir) = env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set; skipping CSS fingerprint");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    match fingerprint_css(&manifest_dir) {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            println!("cargo:warning=Could not fingerprint main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

fn fingerprint_css(manifest_dir: &Path) -> io::Result<String> {
    let css_path = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = fs::read(&css_path)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash: String = digest.chars().take(HASH_LENGTH).collect();

    let derived_dir = manifest_dir.join("static/css/derived");
    fs::create_dir_all(&derived_dir)?;
    fs::write(derived_dir.join(format!("main.{hash}.css")), &content)?;

    Ok(hash)
}
