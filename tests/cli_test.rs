use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Result, anyhow};
use tempfile::tempdir;

fn run(args: &[&str]) -> Result<Output> {
    let binary_path = env!("CARGO_BIN_EXE_payment-eda");
    Ok(Command::new(binary_path)
        .args(args)
        .env_remove("EDA_DATA_PATH")
        .env_remove("EDA_OUTPUT_PATH")
        .output()?)
}

fn sample() -> String {
    Path::new("samples").join("transactions.csv").display().to_string()
}

#[test]
fn test_preprocess_writes_augmented_table_and_prints_view() -> Result<()> {
    let dir = tempdir()?;
    let output_path = dir.path().join("updated_data.csv");
    let output_arg = output_path.display().to_string();

    let output = run(&[
        "--data-path",
        &sample(),
        "--preprocess",
        "--output-path",
        &output_arg,
        "--view",
        "users",
    ])?;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout)?;
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("Users Analysis"));
    assert!(stdout.contains("Top 10 users by number of orders"));
    let top_row = stdout
        .lines()
        .skip_while(|l| !l.starts_with("Top 10 users"))
        .nth(2)
        .ok_or_else(|| anyhow!("top users table has no rows"))?;
    let fields: Vec<&str> = top_row.split_whitespace().collect();
    assert_eq!(fields, vec!["A", "3"]);

    let written = std::fs::read_to_string(&output_path)?;
    let header = written.lines().next().ok_or_else(|| anyhow!("empty output file"))?;
    assert!(!header.contains("Unnamed: 0"));
    assert!(header.ends_with("days_since_first_visit,weeks_since_first_visit"));
    assert_eq!(written.lines().count(), 11);

    Ok(())
}

#[test]
fn test_json_report_of_seasonality() -> Result<()> {
    let dir = tempdir()?;
    let output_arg = dir.path().join("updated_data.csv").display().to_string();

    let output = run(&[
        "--data-path",
        &sample(),
        "--preprocess",
        "--output-path",
        &output_arg,
        "--view",
        "seasonality",
        "--format",
        "json",
    ])?;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["header"], "Seasonality Analysis");

    let month = &report["output"]["blocks"][0];
    assert_eq!(month["type"], "chart");
    assert_eq!(month["title"], "Average Payment Amount by Month");
    assert_eq!(month["kind"]["kind"], "bar");

    let first = &month["kind"]["bars"][0];
    assert_eq!(first[0], "1");
    let mean = first[1].as_f64().ok_or_else(|| anyhow!("mean is not a number"))?;
    assert!((mean - 20.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_derived_view_without_preprocess_fails() -> Result<()> {
    let output = run(&["--data-path", &sample(), "--view", "user-retention"])?;

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("schema error while rendering 'User Retention'"));
    assert!(stderr.contains("weeks_since_first_visit"));

    Ok(())
}

#[test]
fn test_strict_fx_rejects_zero_mid_market_rate() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("zero_mid.csv");
    std::fs::write(
        &input,
        "user_id,created_at,user_first_visit,fx_rate,mid_market_fx_rate\n\
         A,2024-01-01 10:00:00,2023-12-25 00:00:00,1.05,0.0\n",
    )?;
    let input_arg = input.display().to_string();
    let output_arg = dir.path().join("out.csv").display().to_string();

    let lenient = run(&[
        "--data-path",
        &input_arg,
        "--preprocess",
        "--output-path",
        &output_arg,
        "--view",
        "users",
    ])?;
    assert!(lenient.status.success());

    let strict = run(&[
        "--data-path",
        &input_arg,
        "--preprocess",
        "--output-path",
        &output_arg,
        "--strict-fx",
        "--view",
        "users",
    ])?;
    assert!(!strict.status.success());
    let stderr = String::from_utf8(strict.stderr)?;
    assert!(stderr.contains("division anomaly while deriving columns"));
    assert!(stderr.contains("mid_market_fx_rate"));

    Ok(())
}

#[test]
fn test_missing_data_path_is_usage_error() -> Result<()> {
    let output = run(&["--view", "users"])?;

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("--data-path"));

    Ok(())
}
