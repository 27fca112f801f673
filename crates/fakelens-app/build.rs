use std::fs;
use std::path::PathBuf;

fn workspace_version_file() -> PathBuf {
    let manifest_dir =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set"));
    // The app crate sits at <workspace>/crates/fakelens-app.
    manifest_dir
        .ancestors()
        .nth(2)
        .expect("app crate lives two levels below the workspace root")
        .join("VERSION")
}

fn main() {
    let version_file = workspace_version_file();
    println!("cargo:rerun-if-changed={}", version_file.display());

    let version = fs::read_to_string(&version_file)
        .expect("workspace VERSION file should be readable")
        .trim()
        .to_string();
    assert!(!version.is_empty(), "workspace VERSION file is empty");

    println!("cargo:rustc-env=FAKELENS_VERSION={version}");
}
