use std::env;
use std::fs;
use std::io;
use std::path::Path;

// Copies ui/ into OUT_DIR for rust-embed, minifying HTML in release builds.
fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=ui/");

    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
    let dest = Path::new(&out_dir).join("ui");
    let src = Path::new("ui");

    if dest.exists() {
        fs::remove_dir_all(&dest)?;
    }
    fs::create_dir_all(&dest)?;

    let minify = env::var("PROFILE").is_ok_and(|p| p == "release");
    if src.exists() {
        for entry in fs::read_dir(src)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name() else {
                continue;
            };
            copy_asset(&path, &dest.join(file_name), minify)?;
        }
    }
    Ok(())
}

fn copy_asset(from: &Path, to: &Path, minify: bool) -> io::Result<()> {
    if minify && from.extension().is_some_and(|e| e == "html") {
        let source = fs::read(from)?;
        let mut cfg = minify_html::Cfg::new();
        cfg.minify_css = true;
        cfg.minify_js = true;
        cfg.keep_comments = false;
        fs::write(to, minify_html::minify(&source, &cfg))
    } else {
        fs::copy(from, to).map(|_| ())
    }
}
