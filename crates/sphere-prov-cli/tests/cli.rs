//! Runs the built `sphere-prov` binary.

use std::process::Command;

fn sphere_prov(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sphere-prov"))
        .args(args)
        .env_remove("SPHERE_DPS_SCOPE_ID")
        .env_remove("SPHERE_DPS_TIMEOUT_MS")
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn resolve_prints_profile_json() {
    let out = sphere_prov(&["resolve", "0ne00ABCDEF"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["scope_prefix"], "0ne");
}

#[test]
fn resolve_rejects_unknown_prefix() {
    let out = sphere_prov(&["resolve", "abc"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn simulate_china_run_succeeds() {
    let out = sphere_prov(&[
        "simulate",
        "0cn00ABCDEF",
        "--hub-uri",
        "myhub.azure-devices.cn",
        "--assign-after",
        "2",
    ]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let keys: Vec<_> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["event"] == "hub_set_option")
        .map(|e| e["key"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(keys, vec!["SetDeviceId", "TrustedCerts"]);
}

#[test]
fn simulate_accepts_result_code_suffix() {
    let out = sphere_prov(&["simulate", "0ne00ABCDEF", "--fail-with", "disabled"]);
    assert_eq!(out.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["result"]["secondary"]["code"], "PROV_DEVICE_RESULT_DISABLED");
}

#[test]
fn simulate_without_scope_needs_environment() {
    let out = sphere_prov(&["simulate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn trust_anchor_fingerprint_is_stable() {
    let out = sphere_prov(&["trust-anchor", "--fingerprint"]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap().trim_end(),
        "f024a876236935dcd7232d5d5d747823fe75b51f9f108b2a8e5bacdcf818a07e"
    );
}
