use gwas_power::config::{ConfigError, PublishedRate, Scenario};
use gwas_power::report::{run_scenario, write_comparison_tsv, write_curve_tsv};
use gwas_power::sweep::SweptParameter;
use std::fs;
use tempfile::tempdir;

#[test]
fn default_scenario_survives_a_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.toml");

    let scenario = Scenario {
        published: vec![PublishedRate {
            label: "sQTL discovery".to_string(),
            parameter: SweptParameter::Effect,
            value: 0.2,
            discovery_rate: 0.3,
        }],
        ..Scenario::default()
    };
    scenario.save(&path).unwrap();

    let loaded = Scenario::load(&path).unwrap();
    assert_eq!(loaded, scenario);
}

#[test]
fn loading_rejects_an_out_of_domain_threshold() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "sample_size = 1800.0\nthreshold = 1.5\n\n[effect_sweep]\nmaf = 0.2\n",
    )
    .unwrap();

    let err = Scenario::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidParameters { .. }));
    assert!(err.to_string().contains("1.5"));
}

#[test]
fn loading_reports_malformed_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "sample_size = \n").unwrap();
    assert!(matches!(
        Scenario::load(&path),
        Err(ConfigError::TomlParseError(_))
    ));
}

#[test]
fn full_scenario_produces_both_curves_and_comparisons() {
    let scenario = Scenario {
        published: vec![
            PublishedRate {
                label: "effect study".to_string(),
                parameter: SweptParameter::Effect,
                value: 0.24,
                discovery_rate: 0.6,
            },
            PublishedRate {
                label: "maf study".to_string(),
                parameter: SweptParameter::Maf,
                value: 0.05,
                discovery_rate: 0.02,
            },
        ],
        ..Scenario::default()
    };

    let report = run_scenario(&scenario).unwrap();
    let effect = report.effect_curve.unwrap();
    let maf = report.maf_curve.unwrap();
    assert_eq!(effect.points.len(), 21);
    assert_eq!(maf.points.len(), 25);
    assert_eq!(report.comparisons.len(), 2);
    assert!((report.comparisons[0].predicted - 0.6335).abs() < 1e-3);

    let dir = tempdir().unwrap();
    let curve_path = dir.path().join("effect_curve.tsv");
    write_curve_tsv(&effect, fs::File::create(&curve_path).unwrap()).unwrap();
    let text = fs::read_to_string(&curve_path).unwrap();
    assert_eq!(text.lines().count(), 22);

    let mut buf = Vec::new();
    write_comparison_tsv(&report.comparisons, &mut buf).unwrap();
    let table = String::from_utf8(buf).unwrap();
    let mut lines = table.lines();
    assert_eq!(
        lines.next(),
        Some("label\tparameter\tvalue\tobserved\tpredicted\tdifference")
    );
    assert!(lines.next().unwrap().starts_with("effect study\teffect\t0.24\t0.6\t"));
}

#[test]
fn loading_rejects_a_maf_grid_past_one_half() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wide_maf.toml");
    fs::write(
        &path,
        "sample_size = 1800.0\nthreshold = 6e-8\n\n\
         [maf_sweep]\nbeta = 0.24\ngrid = { start = 0.3, end = 0.9, step = 0.1 }\n",
    )
    .unwrap();

    match Scenario::load(&path) {
        Err(ConfigError::InvalidParameters { section, .. }) => assert_eq!(section, "maf_sweep"),
        other => panic!("expected the MAF grid to be rejected, got {other:?}"),
    }
}

#[test]
fn loading_rejects_a_grid_with_a_vanishing_step() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dense.toml");
    fs::write(
        &path,
        "sample_size = 1800.0\nthreshold = 6e-8\n\n\
         [effect_sweep]\nmaf = 0.2\ngrid = { start = 0.0, end = 0.4, step = 1e-300 }\n",
    )
    .unwrap();

    assert!(matches!(
        Scenario::load(&path),
        Err(ConfigError::InvalidGrid {
            section: "effect_sweep",
            ..
        })
    ));
}
