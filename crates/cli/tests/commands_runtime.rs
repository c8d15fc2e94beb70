use std::fs;
use std::path::Path;

use serde_json::Value;
use shopmetrics_cli::commands::{calendar, check, run};
use shopmetrics_core::config::EngineConfig;

fn write_inputs(dir: &Path) {
    fs::write(
        dir.join("orders.csv"),
        "order_id,customer_id,order_date,ship_date,ship_mode,region\n\
         O-1,C-1,2023-03-10,2023-03-13,standard class,south\n\
         O-2,C-2,2023-05-02,2023-05-04,first class,west\n",
    )
    .expect("write orders");
    fs::write(
        dir.join("customers.csv"),
        "customer_id,customer_name,gender,age,city,state,segment\n\
         C-1,Asha Rao,Female,34,Austin,Texas,consumer\n\
         C-2,Ben Ito,Male,52,Portland,Oregon,corporate\n",
    )
    .expect("write customers");
    fs::write(
        dir.join("products.csv"),
        "product_id,product_name,category,sub_category,brand,cost_price\n\
         P-1,Desk Lamp,furniture,lighting,Lumo,5.00\n\
         P-2,Monitor,technology,displays,Viewx,120.00\n",
    )
    .expect("write products");
    fs::write(
        dir.join("order_items.csv"),
        "order_id,product_id,quantity,unit_price,discount\n\
         O-1,P-1,3,10.00,0.10\n\
         O-2,P-2,1,200.00,0.00\n",
    )
    .expect("write order items");
    fs::write(dir.join("returns.csv"), "order_id\nO-2\n").expect("write returns");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

#[test]
fn run_exports_tables_and_reports_counts() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    write_inputs(input.path());

    let result = run::run(&EngineConfig::default(), input.path(), output.path());
    assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "run");
    assert_eq!(payload["status"], "ok");
    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.contains("exported 4 tables"));
    assert!(message.contains("2 fact rows"));

    let clv = fs::read_to_string(output.path().join("customer_clv.csv")).expect("clv table");
    assert!(clv.lines().next().unwrap_or("").starts_with("customer_id,customer_name,segment"));
    let rfm = fs::read_to_string(output.path().join("rfm_segmentation.csv")).expect("rfm table");
    assert_eq!(rfm.lines().count(), 3);
}

#[test]
fn run_is_idempotent_across_invocations() {
    let input = tempfile::tempdir().expect("input dir");
    let first_out = tempfile::tempdir().expect("first output dir");
    let second_out = tempfile::tempdir().expect("second output dir");
    write_inputs(input.path());

    let config = EngineConfig::default();
    let first = run::run(&config, input.path(), first_out.path());
    let second = run::run(&config, input.path(), second_out.path());
    assert_eq!(first.exit_code, 0);
    assert_eq!(second.exit_code, 0);

    for name in
        ["sales_fact.csv", "customer_clv.csv", "rfm_segmentation.csv", "product_performance.csv"]
    {
        let a = fs::read(first_out.path().join(name)).expect("first bytes");
        let b = fs::read(second_out.path().join(name)).expect("second bytes");
        assert_eq!(a, b, "{name} differs between invocations");
    }
}

#[test]
fn run_reports_missing_inputs_as_load_failure() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");

    let result = run::run(&EngineConfig::default(), input.path(), output.path());
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "run");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "input_load");
}

#[test]
fn check_surfaces_row_level_findings_without_failing() {
    let input = tempfile::tempdir().expect("input dir");
    write_inputs(input.path());
    // Point one item at a missing product and one return at a missing order.
    fs::write(
        input.path().join("order_items.csv"),
        "order_id,product_id,quantity,unit_price,discount\n\
         O-1,P-1,3,10.00,0.10\n\
         O-1,P-404,1,10.00,0.00\n",
    )
    .expect("write order items");
    fs::write(input.path().join("returns.csv"), "order_id\nO-404\n").expect("write returns");

    let result = check::run(&EngineConfig::default(), input.path());
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "ok");
    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.contains("2 skipped"));
    assert!(message.contains("missing product `P-404`"));
    assert!(message.contains("missing order `O-404`"));
}

#[test]
fn calendar_writes_the_date_dimension() {
    let output = tempfile::tempdir().expect("output dir");

    let result = calendar::run(&EngineConfig::default(), output.path());
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "calendar");
    assert_eq!(payload["status"], "ok");

    let dimension =
        fs::read_to_string(output.path().join("date_dimension.csv")).expect("dimension table");
    // Header plus one row per day of 2022 through 2024.
    assert_eq!(dimension.lines().count(), 1097);
}
