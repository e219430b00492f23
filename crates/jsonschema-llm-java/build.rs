use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = PathBuf::from(&crate_dir).join("include");
    let _ = std::fs::create_dir_all(&out_dir);

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        ..Default::default()
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("jsonschema_llm_java.h"));
        }
        Err(err) => {
            // Header generation is a convenience for Panama FFM callers; a
            // failure here must never break a plain `cargo build`.
            println!("cargo:warning=cbindgen header generation skipped: {err}");
        }
    }
}
