use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn headless_run_prints_plan_and_final_state() {
    let mut cmd = Command::cargo_bin("prism-runtime").expect("binary exists");
    cmd.arg("--headless").arg("--frames").arg("24");
    cmd.assert()
        .success()
        .stdout(contains("Draw plan:"))
        .stdout(contains(" - bobber (Static)"))
        .stdout(contains(" - orbiter (Static)"))
        .stdout(contains(" - spinner (Static)"))
        .stdout(contains(" - Cube (Static)"))
        .stdout(contains(" - voxel-batch-0 (Instanced)"))
        .stdout(contains(" - model-0 (Skinned)"))
        .stdout(contains(" - skybox (Skybox)"))
        .stdout(contains("Simulated 24 frames"))
        .stdout(contains("Camera eye=(0.00, 3.00, -6.00)"));
}

#[test]
fn unknown_argument_is_rejected() {
    let mut cmd = Command::cargo_bin("prism-runtime").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert().failure();
}
