use std::fs;
use std::process::Command;

use gwas_power::config::Scenario;
use tempfile::tempdir;

fn gwas_power() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gwas-power"))
}

#[test]
fn run_writes_every_table_into_the_output_directory() {
    let tmp = tempdir().expect("temporary directory");
    let config_path = tmp.path().join("scenario.toml");
    let out_dir = tmp.path().join("results");

    let scenario = "sample_size = 1800.0\n\
threshold = 6e-8\n\
\n\
[effect_sweep]\n\
maf = 0.2\n\
\n\
[maf_sweep]\n\
beta = 0.24\n\
\n\
[[published]]\n\
label = \"sQTL study\"\n\
parameter = \"effect\"\n\
value = 0.24\n\
discovery_rate = 0.5\n";
    fs::write(&config_path, scenario).expect("write scenario");

    let output = gwas_power()
        .args([
            "run",
            config_path.to_str().expect("path str"),
            "--out-dir",
            out_dir.to_str().expect("path str"),
        ])
        .output()
        .expect("run gwas-power cli");

    assert!(output.status.success(), "CLI exited with {output:?}");

    let effect = fs::read_to_string(out_dir.join("effect_curve.tsv")).expect("effect curve");
    assert_eq!(effect.lines().next(), Some("parameter\tvalue\tpower"));
    assert_eq!(effect.lines().count(), 22);

    let maf = fs::read_to_string(out_dir.join("maf_curve.tsv")).expect("maf curve");
    assert_eq!(maf.lines().count(), 26);

    let comparison =
        fs::read_to_string(out_dir.join("published_comparison.tsv")).expect("comparison");
    assert_eq!(comparison.lines().count(), 2);
    assert!(comparison.lines().nth(1).unwrap().starts_with("sQTL study\teffect\t0.24\t0.5\t"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sQTL study"), "stdout was {stdout}");
}

#[test]
fn init_writes_a_loadable_default_scenario() {
    let tmp = tempdir().expect("temporary directory");
    let path = tmp.path().join("default.toml");

    let status = gwas_power()
        .args(["init", path.to_str().expect("path str")])
        .status()
        .expect("run gwas-power cli");
    assert!(status.success(), "CLI exited with status {status:?}");

    let loaded = Scenario::load(&path).expect("load written scenario");
    assert_eq!(loaded, Scenario::default());
    assert!(loaded.published.is_empty());
}

#[test]
fn out_of_range_threshold_exits_with_failure() {
    let output = gwas_power()
        .args(["power", "--n", "1800", "--maf", "0.2", "--beta", "0.24", "--threshold", "1.5"])
        .output()
        .expect("run gwas-power cli");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1.5"), "stderr was {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn negative_effect_matches_its_positive_counterpart() {
    let run = |beta: &str| {
        let output = gwas_power()
            .args(["power", "--n", "1800", "--maf", "0.2", "--beta", beta])
            .output()
            .expect("run gwas-power cli");
        assert!(output.status.success(), "CLI exited with {output:?}");
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .expect("power on stdout")
    };

    let negative = run("-0.24");
    let positive = run("0.24");
    assert!((negative - 0.6335).abs() < 1e-3, "power was {negative}");
    assert!((negative - positive).abs() < 1e-12);
}

#[test]
fn effect_curve_streams_to_stdout_without_out() {
    let output = gwas_power()
        .args([
            "effect-curve", "--n", "1800", "--maf", "0.2", "--start", "0.0", "--end", "0.1",
            "--step", "0.05", "--threads", "2",
        ])
        .output()
        .expect("run gwas-power cli");

    assert!(output.status.success(), "CLI exited with {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("effect\t0.0\t"));
}

#[test]
fn vanishing_step_is_reported_not_allocated() {
    let output = gwas_power()
        .args(["maf-curve", "--n", "1800", "--beta", "0.24", "--step", "1e-300"])
        .output()
        .expect("run gwas-power cli");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("points"));
}
