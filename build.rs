use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let descriptor_path = PathBuf::from(env::var("OUT_DIR")?).join("usergate_descriptor.bin");

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(descriptor_path)
        .emit_rerun_if_changed(false)
        .compile_protos(&["proto/usergate.proto"], &["proto"])?;

    Ok(())
}
