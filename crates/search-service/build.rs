//! Build script for search-service.
//!
//! Compiles the protobuf definitions into Rust code using tonic-build.

use std::env;
use std::path::PathBuf;

const PROTOS: &[&str] = &[
    "../../proto/search.proto",
    "../../proto/google/longrunning/operations.proto",
    "../../proto/google/rpc/status.proto",
    "../../proto/google/api/httpbody.proto",
    "../../proto/registry/registry.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    for proto in PROTOS {
        println!("cargo:rerun-if-changed={}", proto);
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("search_descriptor.bin"))
        .compile_protos(PROTOS, &["../../proto"])?;

    Ok(())
}
