//! Build script emitting build metadata for the health endpoints

use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    EmitBuilder::builder().build_date().build_timestamp().emit()?;

    Ok(())
}
