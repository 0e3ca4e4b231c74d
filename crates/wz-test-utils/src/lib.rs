//! Test utilities for the WZ crates
//!
//! Provides a builder for synthetic archives and discovery of real archive
//! files for tests and benches that want them.

pub mod fixture;

pub use fixture::{
    ArchiveFixture, BuiltArchive, PROPERTY_MARKER, StringForm, write_obfuscated_string,
    write_obfuscated_string_as, write_var_int,
};

use std::path::{Path, PathBuf};
use wz_crypto::WzVariant;

/// Environment variable pointing at a real `.wz` file
pub const DATA_ENV_VAR: &str = "WZ_TEST_DATA";

/// Environment variable naming the keystream variant of that file
pub const VARIANT_ENV_VAR: &str = "WZ_TEST_VARIANT";

/// Attempts to locate a real WZ archive
///
/// Checks `WZ_TEST_DATA` first, then a few common install locations for
/// `Base.wz`.
pub fn find_wz_data() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(DATA_ENV_VAR) {
        let path = PathBuf::from(path);
        if is_valid_wz_file(&path) {
            return Some(path);
        }
    }

    common_wz_paths()
        .into_iter()
        .find(|path| is_valid_wz_file(path))
}

/// Variant to open the discovered archive with, `Gms` when unset
pub fn wz_test_variant() -> WzVariant {
    std::env::var(VARIANT_ENV_VAR)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

fn common_wz_paths() -> Vec<PathBuf> {
    let base_dirs: &[&str] = if cfg!(windows) {
        &[
            "C:\\Nexon\\MapleStory",
            "C:\\Program Files\\Wizet\\MapleStory",
            "C:\\Program Files (x86)\\Wizet\\MapleStory",
        ]
    } else {
        &["~/MapleStory", "~/Games/MapleStory", "/opt/maplestory"]
    };

    base_dirs
        .iter()
        .map(|base| PathBuf::from(shellexpand::tilde(base).to_string()).join("Base.wz"))
        .collect()
}

/// Check that `path` is a file starting with the archive magic
pub fn is_valid_wz_file(path: &Path) -> bool {
    use std::io::Read;

    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).is_ok() && &magic == b"PKG1"
}

/// Print instructions for pointing tests at a real archive
pub fn print_setup_instructions() {
    println!("WZ Data Setup Instructions:");
    println!("===========================");
    println!();
    println!("To run tests that require a real archive, set:");
    println!();
    println!("  {DATA_ENV_VAR} = /path/to/Base.wz");
    println!("  {VARIANT_ENV_VAR} = gms | msea | kms | classic   (optional, default gms)");
    println!();
    println!("Example:");
    println!("  export {DATA_ENV_VAR}=\"$HOME/MapleStory/Base.wz\"");
}

/// Get a real archive path or skip the test with a helpful message
#[macro_export]
macro_rules! require_wz_data {
    () => {
        match $crate::find_wz_data() {
            Some(path) => path,
            None => {
                println!("Skipping test - no WZ data found");
                $crate::print_setup_instructions();
                return;
            }
        }
    };
}
