//! Front-end checks shared by every backend that accepts WGSL source.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::ShaderStage;

/// Entry point every renderer kernel exposes.
pub const ENTRY_POINT: &str = "tpm";

/// Parses and validates `source`, returning the diagnostic text on failure.
///
/// The module must contain a compute entry point named `entry_point`.
pub fn validate_wgsl(source: &str, entry_point: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let has_entry = module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == ShaderStage::Compute);
    if !has_entry {
        return Err(format!("missing compute entry point `{entry_point}`"));
    }
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r"
@group(0) @binding(0) var<storage, read_write> out: array<f32>;

@compute @workgroup_size(1)
fn tpm(@builtin(global_invocation_id) id: vec3<u32>) {
    out[id.x] = 1.0;
}
";

    #[test]
    fn accepts_minimal_kernel() {
        assert!(validate_wgsl(MINIMAL, ENTRY_POINT).is_ok());
    }

    #[test]
    fn rejects_wrong_entry_point() {
        let err = validate_wgsl(MINIMAL, "main").unwrap_err();
        assert!(err.contains("main"), "diagnostic should name the entry point: {err}");
    }

    #[test]
    fn reports_parse_errors() {
        let err = validate_wgsl("fn tpm( {", ENTRY_POINT).unwrap_err();
        assert!(!err.is_empty());
    }
}
