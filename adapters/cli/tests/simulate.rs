use std::process::Command;

#[test]
fn simulate_prints_json_report() {
    let output = Command::new(env!("CARGO_BIN_EXE_dice-defense"))
        .args([
            "simulate",
            "--seconds",
            "10",
            "--seed",
            "3",
            "--deck",
            "fire,iron",
            "--json",
        ])
        .output()
        .expect("failed to run dice-defense binary");

    assert!(output.status.success(), "simulate should succeed");
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("report is valid json");
    assert_eq!(report["ticks"], 300);
    assert_eq!(report["state"]["grid"].as_array().map(Vec::len), Some(15));
    assert!(report["summons"].as_u64().is_some_and(|summons| summons > 0));
}

#[test]
fn simulate_rejects_unknown_units() {
    let output = Command::new(env!("CARGO_BIN_EXE_dice-defense"))
        .args(["simulate", "--deck", "fire,lava"])
        .output()
        .expect("failed to run dice-defense binary");

    assert!(!output.status.success());
}
