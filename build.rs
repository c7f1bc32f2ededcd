use std::{env, path::PathBuf};

use anyhow::Context;
use fs_extra::{copy_items, dir::CopyOptions};

// Stages the studio model, environment map, lookup tables and marker sprite
// from `assets/` into OUT_DIR, where the web bundle picks them up.
fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR").context("OUT_DIR not set")?;
    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy_items(&[assets], &out_dir, &options)
        .with_context(|| format!("copying assets to {out_dir}"))?;
    Ok(())
}
