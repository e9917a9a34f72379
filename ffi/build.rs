use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let Ok(crate_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let out = PathBuf::from(&crate_dir).join("include");
    if let Err(err) = std::fs::create_dir_all(&out) {
        println!("cargo:warning=header not generated: {err}");
        return;
    }

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("SIDEHUSTLE_FFI_H")
        .with_cpp_compat(true)
        .generate();
    match generated {
        Ok(bindings) => {
            bindings.write_to_file(out.join("sidehustle_ffi.h"));
        }
        Err(err) => println!("cargo:warning=header not generated: {err}"),
    }
}
