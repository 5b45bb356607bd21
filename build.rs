use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Textures the globe scene samples at runtime.
const SCENE_TEXTURES: [&str; 5] = [
    "earthmap4k.jpg",
    "earth_normalmap_flat4k.jpg",
    "earthspec4k.jpg",
    "fair_clouds_4k.png",
    "starry_background.jpg",
];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        println!("cargo:warning=no assets/ directory, the globe will render with fallback textures");
        return Ok(());
    }

    for texture in SCENE_TEXTURES {
        if !assets_src.join(texture).exists() {
            println!("cargo:warning=assets/{texture} is missing, a fallback texture will be used");
        }
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], out_dir, &copy_options)?;

    Ok(())
}
