//! Build script for playlist-master.
//!
//! Copies the configuration templates into the local data directory
//! (`~/.local/share/playlist-master` on Linux), next to the `.env` file the
//! binary reads at startup.

use std::{env, fs, path::PathBuf};

const TEMPLATES: [&str; 2] = [".env.example", "config.example.toml"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for template in TEMPLATES {
        println!("cargo:rerun-if-changed={}", template);
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("playlist-master");
    fs::create_dir_all(&out_dir)?;

    for template in TEMPLATES {
        let source = manifest_dir.join(template);
        if source.is_file() {
            fs::copy(&source, out_dir.join(template))?;
        } else {
            println!("cargo:warning={} not found at {}", template, source.display());
        }
    }

    Ok(())
}
