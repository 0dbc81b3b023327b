//! Build script for spotfetch.
//!
//! Copies the `.env.example` template from the crate root into the user's local
//! data directory, next to the `.env` file that `config::load_env` reads at
//! startup. A missing template or an unwritable data directory only produces a
//! cargo warning.
//!
//! Destination:
//! - Linux: `~/.local/share/spotfetch/.env.example`
//! - macOS: `~/Library/Application Support/spotfetch/.env.example`
//! - Windows: `%LOCALAPPDATA%/spotfetch/.env.example`

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotfetch");

    let copied = fs::create_dir_all(&out_dir)
        .and_then(|_| fs::read_to_string(&env_example_path))
        .and_then(|contents| fs::write(out_dir.join(".env.example"), contents));

    if let Err(e) = copied {
        println!(
            "cargo:warning=could not copy .env.example to {}: {}",
            out_dir.display(),
            e
        );
    }

    Ok(())
}
