mod common;

use std::cell::RefCell;

use chrono::{Local, NaiveDate};
use common::{FakeClient, config_in, files_in, ids};
use indicator_tools::Result;
use indicator_tools::io::excel_read;
use indicator_tools::io::http::{HttpClient, HttpResponse};
use indicator_tools::model::{ApiKind, CellValue};
use indicator_tools::pipeline::{ProcessOutcome, Processor};
use indicator_tools::progress::{NoopObserver, ProgressObserver, Stage, StageEvent};
use serde_json::json;
use tempfile::tempdir;

struct PanickingObserver;

impl ProgressObserver for PanickingObserver {
    fn on_stage(&self, _event: &StageEvent) {
        panic!("observer failure");
    }
}

struct PanickingClient;

impl HttpClient for PanickingClient {
    fn get(&self, _url: &url::Url) -> Result<HttpResponse> {
        panic!("transport exploded");
    }
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 16).expect("valid date")
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

#[test]
fn athena_run_cleans_values_and_attaches_iso_codes() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let client = FakeClient::ok(json!({
        "fact": [{"dim.COUNTRY": "Kenya", "Value": "12 [adjusted]"}]
    }));
    let processor = Processor::new(config, &client).with_date(run_date());

    let outcome =
        processor.unified_data_processor("WHO Athena", &ids(&["MDG_0000000001"]), &NoopObserver);

    let (file, message) = outcome.into_parts();
    let file = file.expect("artifact produced");
    assert!(file.ends_with("WHO_Athena/GHO_Athena_Cleaned_2025-04-16.xlsx"));
    assert_eq!(
        message,
        format!("Processing complete. Final data saved to: {}", file.display())
    );
    assert_eq!(client.request_count(), 1);
    assert_eq!(
        client.last_request().path(),
        "/api/GHO/MDG_0000000001"
    );

    let final_table = excel_read::read_table(&file).expect("final workbook read");
    assert_eq!(final_table.columns(), &["COUNTRY", "ISO_Code", "Value"]);
    assert_eq!(final_table.value(0, "COUNTRY"), Some(&text("Kenya")));
    assert_eq!(final_table.value(0, "ISO_Code"), Some(&text("KEN")));
    assert_eq!(final_table.value(0, "Value"), Some(&text("12")));

    let combined = excel_read::read_table(
        &temp_dir
            .path()
            .join("out/WHO_Athena/WHO_Athena_Combined_2025-04-16.xlsx"),
    )
    .expect("combined workbook read");
    assert_eq!(combined.value(0, "Value"), Some(&text("12 [adjusted]")));
}

#[test]
fn athena_run_attaches_indicator_codes_after_gho() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let client = FakeClient::ok(json!({
        "fact": [
            {"dim": {"GHO": "Life expectancy at birth (years)", "COUNTRY": "Uganda", "YEAR": "2019"}, "Value": "63.4 [62.1-64.8]"},
            {"dim": {"GHO": "Life expectancy at birth (years)", "COUNTRY": "Narnia", "YEAR": "2019"}, "Value": "70.0"}
        ]
    }));
    let processor = Processor::new(config, &client).with_date(run_date());

    let outcome =
        processor.unified_data_processor("WHO Athena", &ids(&["WHOSIS_000001"]), &NoopObserver);

    let file = outcome.artifact().expect("artifact produced").to_path_buf();
    let table = excel_read::read_table(&file).expect("final workbook read");
    assert_eq!(
        table.columns(),
        &["GHO", "IndicatorCode", "COUNTRY", "ISO_Code", "YEAR", "Value"]
    );
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value(0, "IndicatorCode"), Some(&text("WHOSIS_000001")));
    assert_eq!(table.value(0, "ISO_Code"), Some(&text("UGA")));
    assert_eq!(table.value(1, "ISO_Code"), Some(&CellValue::Null));
    assert_eq!(table.value(0, "Value"), Some(&text("63.4")));
}

#[test]
fn dhs_run_writes_combined_workbook() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let client = FakeClient::ok(json!({
        "Data": [
            {"CountryName": "Kenya", "IndicatorId": "FE_FRTR_W_TFR", "Value": 3.4, "SurveyYear": 2022},
            {"CountryName": "Ghana", "IndicatorId": "FE_FRTR_W_TFR", "Value": 3.9, "SurveyYear": 2022}
        ]
    }));
    let processor = Processor::new(config, &client).with_date(run_date());

    let outcome =
        processor.unified_data_processor("DHS Program", &ids(&["FE_FRTR_W_TFR"]), &NoopObserver);

    let file = outcome.artifact().expect("artifact produced").to_path_buf();
    assert!(file.ends_with("DHS_Program/DHS_Program_Combined_2025-04-16.xlsx"));
    let table = excel_read::read_table(&file).expect("workbook read");
    assert_eq!(
        table.columns(),
        &["CountryName", "IndicatorId", "Value", "SurveyYear"]
    );
    assert_eq!(table.value(1, "Value"), Some(&CellValue::Number(3.9)));
}

#[test]
fn dhs_empty_data_is_a_warning_without_artifact() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let client = FakeClient::ok(json!({"Data": []}));
    let processor = Processor::new(config, &client).with_date(run_date());

    let outcome =
        processor.unified_data_processor("DHS Program", &ids(&["FE_FRTR_W_TFR"]), &NoopObserver);

    assert_eq!(
        outcome,
        ProcessOutcome::Failed {
            message: "Warning: API response contains no data for the provided indicator IDs."
                .to_string()
        }
    );
    assert!(!temp_dir.path().join("out/DHS_Program").exists());
}

#[test]
fn empty_selection_fails_without_network_calls() {
    for (label, short) in [("WHO Athena", "Athena"), ("DHS Program", "DHS")] {
        let temp_dir = tempdir().expect("temporary directory");
        let client = FakeClient::ok(json!({}));
        let processor = Processor::new(config_in(temp_dir.path()), &client);

        let (file, message) = processor
            .unified_data_processor(label, &[], &NoopObserver)
            .into_parts();

        assert!(file.is_none());
        assert_eq!(
            message,
            format!("Error: No {short} indicators selected. Please choose at least one indicator.")
        );
        assert_eq!(client.request_count(), 0);
    }
}

#[test]
fn unknown_api_label_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::ok(json!({}));
    let processor = Processor::new(config_in(temp_dir.path()), &client);

    let outcome = processor.unified_data_processor("World Bank", &ids(&["X"]), &NoopObserver);

    assert_eq!(outcome.message(), "Invalid API selection.");
    assert!(outcome.artifact().is_none());
    assert_eq!(client.request_count(), 0);
}

#[test]
fn http_failure_surfaces_status_and_body() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::with_status(404, "Not Found");
    let processor = Processor::new(config_in(temp_dir.path()), &client);

    let outcome = processor.unified_data_processor("WHO Athena", &ids(&["BAD"]), &NoopObserver);

    assert_eq!(
        outcome.message(),
        "Error: API request failed with status code 404\nResponse: Not Found"
    );
    assert!(outcome.artifact().is_none());
}

#[test]
fn missing_fact_field_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::ok(json!({"dimension": []}));
    let processor = Processor::new(config_in(temp_dir.path()), &client);

    let outcome = processor.unified_data_processor("WHO Athena", &ids(&["X"]), &NoopObserver);

    assert!(outcome.message().starts_with("Error: No 'fact' data found"));
    assert!(!outcome.is_done());
}

#[test]
fn missing_lookup_file_fails_after_intermediate_writes() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    std::fs::remove_file(&config.indicator_lookup_path).expect("lookup removed");
    let missing = config.indicator_lookup_path.clone();
    let client = FakeClient::ok(json!({"fact": [{"dim.COUNTRY": "Kenya", "Value": "1"}]}));
    let processor = Processor::new(config, &client).with_date(run_date());

    let (file, message) = processor
        .unified_data_processor("WHO Athena", &ids(&["X"]), &NoopObserver)
        .into_parts();

    assert!(file.is_none());
    assert_eq!(
        message,
        format!(
            "Error: Indicator lookup file not found at {}. Please upload it.",
            missing.display()
        )
    );
    let written = files_in(&temp_dir.path().join("out/WHO_Athena"));
    assert_eq!(written.len(), 2);
}

#[test]
fn same_day_runs_overwrite_previous_outputs() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let first = FakeClient::ok(json!({"fact": [{"dim.COUNTRY": "Kenya", "Value": "1"}]}));
    let second = FakeClient::ok(json!({"fact": [{"dim.COUNTRY": "Uganda", "Value": "2"}]}));

    let first_file = Processor::new(config.clone(), &first)
        .with_date(run_date())
        .unified_data_processor("WHO Athena", &ids(&["X"]), &NoopObserver)
        .into_parts()
        .0
        .expect("first artifact");
    let second_file = Processor::new(config, &second)
        .with_date(run_date())
        .unified_data_processor("WHO Athena", &ids(&["X"]), &NoopObserver)
        .into_parts()
        .0
        .expect("second artifact");

    assert_eq!(first_file, second_file);
    assert_eq!(files_in(&temp_dir.path().join("out/WHO_Athena")).len(), 3);
    let table = excel_read::read_table(&second_file).expect("final workbook read");
    assert_eq!(table.value(0, "ISO_Code"), Some(&text("UGA")));
}

#[test]
fn progress_is_reported_in_increasing_fractions() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::ok(json!({"fact": [{"dim.COUNTRY": "Kenya", "Value": "1"}]}));
    let processor = Processor::new(config_in(temp_dir.path()), &client).with_date(run_date());
    let events: RefCell<Vec<StageEvent>> = RefCell::new(Vec::new());
    let observer = |event: &StageEvent| events.borrow_mut().push(event.clone());

    let outcome = processor.unified_data_processor("WHO Athena", &ids(&["X"]), &observer);

    assert!(outcome.is_done());
    let events = events.into_inner();
    let stages: Vec<Stage> = events.iter().map(|event| event.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Fetching,
            Stage::Normalizing,
            Stage::Cleaning,
            Stage::Enriching,
            Stage::Persisting,
            Stage::Done,
        ]
    );
    assert!(events.windows(2).all(|pair| pair[0].fraction < pair[1].fraction));
    assert_eq!(events.last().map(|event| event.fraction), Some(1.0));
}

#[test]
fn panicking_observer_does_not_change_the_outcome() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::ok(json!({"Data": [{"CountryName": "Kenya", "Value": 1.0}]}));
    let processor = Processor::new(config_in(temp_dir.path()), &client).with_date(run_date());
    let outcome =
        processor.unified_data_processor("DHS Program", &ids(&["X"]), &PanickingObserver);

    assert!(outcome.is_done());
}

#[test]
fn unpinned_processor_names_files_with_the_date_of_each_run() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::ok(json!({"Data": [{"CountryName": "Kenya", "Value": 1.0}]}));
    let processor = Processor::new(config_in(temp_dir.path()), &client);

    let before = Local::now().date_naive();
    let outcome = processor.unified_data_processor("DHS Program", &ids(&["X"]), &NoopObserver);
    let after = Local::now().date_naive();

    let file = outcome.artifact().expect("artifact produced").to_path_buf();
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name")
        .to_string();
    let expected: Vec<String> = [before, after]
        .iter()
        .map(|date| format!("DHS_Program_Combined_{}.xlsx", date.format("%Y-%m-%d")))
        .collect();
    assert!(expected.contains(&name), "unexpected artifact name {name}");
}

#[test]
fn pinned_date_overrides_the_clock() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::ok(json!({}));
    let processor = Processor::new(config_in(temp_dir.path()), &client).with_date(run_date());

    let paths = processor.artifact_paths(ApiKind::WhoAthena);

    assert!(paths.final_output.ends_with("GHO_Athena_Cleaned_2025-04-16.xlsx"));
}

#[test]
fn panic_inside_a_stage_becomes_a_failed_outcome() {
    let temp_dir = tempdir().expect("temporary directory");
    let processor = Processor::new(config_in(temp_dir.path()), PanickingClient);

    let (file, message) = processor
        .unified_data_processor("WHO Athena", &ids(&["X"]), &NoopObserver)
        .into_parts();

    assert!(file.is_none());
    assert_eq!(message, "An unexpected error occurred: transport exploded");
}

#[test]
fn no_content_response_is_reported_as_failed_request() {
    let temp_dir = tempdir().expect("temporary directory");
    let client = FakeClient::with_status(204, "");
    let processor = Processor::new(config_in(temp_dir.path()), &client);

    let outcome = processor.unified_data_processor("DHS Program", &ids(&["X"]), &NoopObserver);

    assert_eq!(
        outcome.message(),
        "Error: API request failed with status code 204\nResponse: "
    );
    assert!(outcome.artifact().is_none());
}
