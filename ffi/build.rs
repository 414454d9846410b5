use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    // cbindgen failures surface as warnings only.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("EPOINT_H")
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(crate_dir.join("include/epoint.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen: {e}"),
    }
}
