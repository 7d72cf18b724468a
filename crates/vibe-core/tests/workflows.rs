//! End-to-end apply flows against the in-memory host.
//!
//! Run with: `cargo test -p vibe-core`

use std::fs;
use std::path::Path;

use serde_json::json;
use vibe_core::apply::workflow::{apply_file_grade, apply_live_grade, load_grade_file};
use vibe_core::host::memory::{HostCall, MemoryHost};
use vibe_core::{
    AppliedVia, FsLutInstaller, GradeError, GradeErrorKind, InstalledLut, LutAsset, LutInstaller,
};

const CUBE: &str = "TITLE \"Vibe-to-LUT Generated\"\nLUT_3D_SIZE 2\n\n\
0.000000 0.000000 0.000000\n1.000000 0.000000 0.000000\n\
0.000000 1.000000 0.000000\n1.000000 1.000000 0.000000\n\
0.000000 0.000000 1.000000\n1.000000 0.000000 1.000000\n\
0.000000 1.000000 1.000000\n1.000000 1.000000 1.000000\n";

/// Installer whose disk is always full.
struct FailingInstaller;

impl LutInstaller for FailingInstaller {
    fn install(&self, asset: &LutAsset) -> Result<InstalledLut, GradeError> {
        Err(GradeError::Io {
            path: asset.relative_path().into(),
            source: std::io::Error::other("no space left on device"),
        })
    }
}

fn live_payload() -> serde_json::Value {
    json!({
        "primary": {
            "lift": {"r": 0.0, "g": 0.0, "b": 0.0},
            "gamma": {"r": 1.0, "g": 1.0, "b": 1.0},
            "gain": {"r": 1.0, "g": 1.0, "b": 1.0},
            "contrast": 0.5,
            "pivot": 0.4
        },
        "lutContent": CUBE
    })
}

fn write_blueprint(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let blueprint = json!({
        "timestamp": 1717171717,
        "cst": {"is_log": false, "input_gamma": "Rec.709", "output_gamma": "Rec.709"},
        "primary": {
            "lift": [0.0, 0.0, 0.0],
            "gamma": [1.0, 1.0, 1.0],
            "gain": [0.2, 1.0, 1.0],
            "saturation": 1.1,
            "contrast": 1.0,
            "pivot": 0.435
        },
        "look": {"temp": 0.0, "tint": 0.0, "skin_protect": 0.0}
    });
    fs::write(&path, blueprint.to_string()).unwrap();
    path
}

#[test]
fn test_live_grade_installs_preview_and_applies_lut_only() {
    let luts = tempfile::tempdir().unwrap();
    let installer = FsLutInstaller::new(luts.path());
    let mut host = MemoryHost::new().with_clip_name("A001_C002");

    let outcome = apply_live_grade(&mut host, &installer, &live_payload()).unwrap();
    assert_eq!(outcome.clip, "A001_C002");
    assert_eq!(outcome.message(), "Applied to Node 2");
    assert_eq!(outcome.result.applied_via, AppliedVia::Lut);
    assert!(outcome.result.skipped_cdl);
    assert_eq!(outcome.lut.relative_path, "VibeEngine/Temp/Vibe_Live_Preview.cube");
    assert_eq!(fs::read_to_string(&outcome.lut.installed_path).unwrap(), CUBE);

    // Refresh precedes the LUT call; CDL is never sent.
    let calls = host.log().calls();
    assert_eq!(calls[0], HostCall::RefreshLutCatalog);
    assert!(matches!(calls[1], HostCall::SetLut { node_index: 2, accepted: true, .. }));
    assert!(host.log().set_cdl_calls().is_empty());
}

#[test]
fn test_live_grade_without_lut_content_is_rejected_before_any_mutation() {
    let luts = tempfile::tempdir().unwrap();
    let installer = FsLutInstaller::new(luts.path());
    let mut host = MemoryHost::new();

    let mut payload = live_payload();
    payload.as_object_mut().unwrap().remove("lutContent");
    let err = apply_live_grade(&mut host, &installer, &payload).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::Validation);
    assert_eq!(err.to_string(), "Missing 'lutContent' in payload");
    assert!(host.log().calls().is_empty());
    assert!(!luts.path().join("VibeEngine").exists());
}

#[test]
fn test_live_grade_with_non_text_lut_content_is_computation_error() {
    let luts = tempfile::tempdir().unwrap();
    let installer = FsLutInstaller::new(luts.path());
    let mut host = MemoryHost::new();

    let mut payload = live_payload();
    payload["lutContent"] = json!(5);
    let err = apply_live_grade(&mut host, &installer, &payload).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::Computation);
    assert!(host.log().calls().is_empty());

    payload["lutContent"] = json!("");
    let err = apply_live_grade(&mut host, &installer, &payload).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::Validation);
}

#[test]
fn test_live_grade_checks_clip_before_payload() {
    let installer = FailingInstaller;
    let mut host = MemoryHost::new().without_clip();
    let err = apply_live_grade(&mut host, &installer, &json!({})).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::State);
}

#[test]
fn test_live_grade_install_failure_aborts_before_host_mutation() {
    let mut host = MemoryHost::new();
    let err = apply_live_grade(&mut host, &FailingInstaller, &live_payload()).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::Io);
    assert!(host.log().calls().is_empty());
}

#[test]
fn test_live_grade_falls_back_to_node_one() {
    let luts = tempfile::tempdir().unwrap();
    let installer = FsLutInstaller::new(luts.path());
    let mut host = MemoryHost::new().reject_lut_on(&[2]);

    let outcome = apply_live_grade(&mut host, &installer, &live_payload()).unwrap();
    assert_eq!(outcome.message(), "Applied to Node 1");
    assert_eq!(outcome.result.node_index, 1);
}

#[test]
fn test_live_grade_rejected_on_both_nodes_fails() {
    let luts = tempfile::tempdir().unwrap();
    let installer = FsLutInstaller::new(luts.path());
    let mut host = MemoryHost::new().reject_lut_on(&[1, 2]);

    let err = apply_live_grade(&mut host, &installer, &live_payload()).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::HostRejection);
    assert!(host.log().set_cdl_calls().is_empty());
}

#[test]
fn test_file_grade_without_sibling_applies_cdl() {
    let work = tempfile::tempdir().unwrap();
    let luts = tempfile::tempdir().unwrap();
    let grade = write_blueprint(work.path(), "look.json");
    let mut host = MemoryHost::new();

    let outcome = apply_file_grade(&mut host, &FsLutInstaller::new(luts.path()), &grade).unwrap();
    assert_eq!(outcome.result.applied_via, AppliedVia::Cdl);
    assert_eq!(outcome.result.node_index, 2);
    assert!(outcome.lut.is_none());
    assert_eq!(host.log().refresh_count(), 0);

    let cdl_calls = host.log().set_cdl_calls();
    assert_eq!(cdl_calls.len(), 1);
    let (params, accepted) = &cdl_calls[0];
    assert!(*accepted);
    assert_eq!(params.slope, "0.200000 1.000000 1.000000");
    assert_eq!(params.offset, "0.000000 0.000000 0.000000");
    assert_eq!(params.saturation, "1.1");
}

#[test]
fn test_file_grade_with_sibling_installs_and_skips_cdl() {
    let work = tempfile::tempdir().unwrap();
    let luts = tempfile::tempdir().unwrap();
    let grade = write_blueprint(work.path(), "teal_orange.json");
    fs::write(work.path().join("teal_orange.cube"), CUBE).unwrap();
    let mut host = MemoryHost::new();

    let outcome = apply_file_grade(&mut host, &FsLutInstaller::new(luts.path()), &grade).unwrap();
    assert_eq!(outcome.result.applied_via, AppliedVia::Lut);
    assert!(outcome.result.skipped_cdl);
    let lut = outcome.lut.unwrap();
    assert_eq!(lut.relative_path, "VibeEngine/teal_orange.cube");
    assert!(luts.path().join("VibeEngine").join("teal_orange.cube").is_file());
    assert_eq!(host.log().refresh_count(), 1);
    assert!(host.log().set_cdl_calls().is_empty());
}

#[test]
fn test_file_grade_with_rejected_lut_falls_through_to_cdl() {
    let work = tempfile::tempdir().unwrap();
    let luts = tempfile::tempdir().unwrap();
    let grade = write_blueprint(work.path(), "look.json");
    fs::write(work.path().join("look.cube"), CUBE).unwrap();
    let mut host = MemoryHost::new().reject_lut_on(&[1, 2]);

    let outcome = apply_file_grade(&mut host, &FsLutInstaller::new(luts.path()), &grade).unwrap();
    assert_eq!(outcome.result.applied_via, AppliedVia::Cdl);
    assert_eq!(host.log().set_lut_calls().len(), 2);
    assert_eq!(host.log().set_cdl_calls().len(), 1);
}

#[test]
fn test_file_grade_install_failure_halts() {
    let work = tempfile::tempdir().unwrap();
    let grade = write_blueprint(work.path(), "look.json");
    fs::write(work.path().join("look.cube"), CUBE).unwrap();
    let mut host = MemoryHost::new();

    let err = apply_file_grade(&mut host, &FailingInstaller, &grade).unwrap_err();
    assert_eq!(err.kind(), GradeErrorKind::Io);
    assert!(host.log().calls().is_empty());
}

#[test]
fn test_unreadable_grade_files_are_reported() {
    let work = tempfile::tempdir().unwrap();
    let missing = work.path().join("nope.json");
    assert_eq!(load_grade_file(&missing).unwrap_err().kind(), GradeErrorKind::Io);

    let garbled = work.path().join("garbled.json");
    fs::write(&garbled, "{ not json").unwrap();
    assert_eq!(
        load_grade_file(&garbled).unwrap_err().kind(),
        GradeErrorKind::Validation
    );
}
