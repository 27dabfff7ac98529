//! End-to-end tests of the JSON-RPC adapter against scripted Android tools

use std::sync::Arc;

use avd_pilot::emulator::testing::ScriptedRunner;
use avd_pilot::emulator::DeviceBridge;
use avd_pilot::model::ModelClient;
use avd_pilot::protocol::error_codes;
use avd_pilot::server::Server;
use avd_pilot::toolchain::AndroidTool;
use avd_pilot::PilotContext;
use serde_json::{json, Value};

const DEVICES: &str = "List of devices attached\nemulator-5554\tdevice\n";

fn server(runner: Arc<ScriptedRunner>) -> Server {
    // Nothing listens here; model tools are not exercised.
    let models = ModelClient::new("http://127.0.0.1:9");
    Server::new(PilotContext::new(DeviceBridge::new(runner), models, "llama3"))
}

async fn call(server: &Server, request: Value) -> Value {
    let response = server
        .handle_line(&request.to_string())
        .await
        .expect("request with id gets a response");
    serde_json::to_value(response).unwrap()
}

fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

fn text_of(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let server = server(Arc::new(ScriptedRunner::new()));

    let init = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await;
    assert_eq!(init["result"]["serverInfo"]["name"], json!("avd-pilot"));

    let listed = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let names: Vec<&str> = listed["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();

    for expected in ["list_avds", "start_emulator", "launch_app", "swipe", "list_system_images", "chat"] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }
}

#[tokio::test]
async fn notifications_get_no_response() {
    let server = server(Arc::new(ScriptedRunner::new()));

    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(response.is_none());
}

#[tokio::test]
async fn null_id_gets_a_response() {
    let server = server(Arc::new(ScriptedRunner::new()));

    let response = server
        .handle_line(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
        .await
        .expect("explicit null id is answered");
    let response = serde_json::to_value(response).unwrap();

    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["result"], json!({}));
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let server = server(Arc::new(ScriptedRunner::new()));

    let response = serde_json::to_value(server.handle_line("{not json").await.unwrap()).unwrap();
    assert_eq!(response["error"]["code"], json!(error_codes::PARSE_ERROR));
    assert_eq!(response["id"], Value::Null);
}

#[tokio::test]
async fn unknown_method_is_reported() {
    let server = server(Arc::new(ScriptedRunner::new()));

    let response = call(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "devices/reboot"})).await;
    assert_eq!(response["error"]["code"], json!(error_codes::METHOD_NOT_FOUND));
}

#[tokio::test]
async fn missing_argument_issues_no_command() {
    let runner = Arc::new(ScriptedRunner::new());
    let server = server(runner.clone());

    let response = call(&server, tool_call(4, "launch_app", json!({"port": 5554}))).await;

    assert_eq!(response["error"]["code"], json!(error_codes::INVALID_PARAMS));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn ill_typed_port_issues_no_command() {
    let runner = Arc::new(ScriptedRunner::new());
    let server = server(runner.clone());

    let response = call(&server, tool_call(5, "stop_emulator", json!({"port": "5554"}))).await;

    assert_eq!(response["error"]["code"], json!(error_codes::INVALID_PARAMS));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn unsupported_direction_issues_no_command() {
    let runner = Arc::new(ScriptedRunner::new());
    let server = server(runner.clone());

    let response = call(&server, tool_call(6, "swipe", json!({"port": 5554, "direction": "diagonal"}))).await;

    assert_eq!(response["error"]["code"], json!(error_codes::INVALID_PARAMS));
    assert!(response["error"]["message"].as_str().unwrap().contains("diagonal"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn direction_must_match_exactly() {
    let runner = Arc::new(ScriptedRunner::new());
    let server = server(runner.clone());

    for (id, direction) in [(13, "Up"), (14, " left "), (15, "RIGHT")] {
        let response = call(&server, tool_call(id, "swipe", json!({"port": 5554, "direction": direction}))).await;
        assert_eq!(response["error"]["code"], json!(error_codes::INVALID_PARAMS), "{direction:?}");
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn swipe_up_on_phone() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on(AndroidTool::Adb, "wm size", "Physical size: 1080x2400\n")
            .on(AndroidTool::Adb, "wm density", "Physical density: 420\n")
            .on(AndroidTool::Adb, "input swipe", ""),
    );
    let server = server(runner.clone());

    let response = call(&server, tool_call(7, "swipe", json!({"port": 5554, "direction": "up"}))).await;

    assert_eq!(response["result"]["isError"], json!(false));
    assert_eq!(runner.count(AndroidTool::Adb, "input swipe 540 1920 540 480 300"), 1);
}

#[tokio::test]
async fn stop_failure_is_a_tool_error() {
    let runner = Arc::new(ScriptedRunner::new().on_fail(
        AndroidTool::Adb,
        "emu kill",
        "error: device 'emulator-5560' not found",
    ));
    let server = server(runner);

    let response = call(&server, tool_call(8, "stop_emulator", json!({"port": 5560}))).await;

    assert_eq!(response["result"]["isError"], json!(true));
    assert!(text_of(&response).contains("5560"));
}

#[tokio::test]
async fn launch_on_stopped_emulator_reports_not_running() {
    let runner = Arc::new(ScriptedRunner::new().on(AndroidTool::Adb, "devices", DEVICES));
    let server = server(runner.clone());

    let response = call(
        &server,
        tool_call(9, "launch_app", json!({"port": 5556, "package": "com.android.settings"})),
    )
    .await;

    assert_eq!(response["result"]["isError"], json!(true));
    assert!(text_of(&response).contains("port 5556"));
    assert_eq!(runner.count(AndroidTool::Adb, "pm list packages"), 0);
}

#[tokio::test]
async fn start_emulator_passes_only_given_flags() {
    let runner = Arc::new(ScriptedRunner::new());
    let server = server(runner.clone());

    let response = call(
        &server,
        tool_call(10, "start_emulator", json!({"avd_name": "Pixel_6", "cold_boot": true})),
    )
    .await;

    assert_eq!(response["result"]["isError"], json!(false));
    assert_eq!(runner.calls()[0].args, vec!["-avd", "Pixel_6", "-no-snapshot-load"]);
}

#[tokio::test]
async fn listing_failure_is_an_empty_list() {
    let runner = Arc::new(ScriptedRunner::new().on_fail(AndroidTool::AvdManager, "list avd", "boom"));
    let server = server(runner);

    let response = call(&server, tool_call(11, "list_avds", json!({}))).await;

    assert_eq!(response["result"]["isError"], json!(false));
    let avds: Value = serde_json::from_str(text_of(&response)).unwrap();
    assert_eq!(avds, json!([]));
}

#[tokio::test]
async fn running_resource_reads_adb() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .on(AndroidTool::Adb, "emu avd name", "Pixel_6\nOK\n")
            .on(AndroidTool::Adb, "devices", DEVICES),
    );
    let server = server(runner);

    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 12, "method": "resources/read", "params": {"uri": "emulator://running"}}),
    )
    .await;

    let text = response["result"]["contents"][0]["text"].as_str().unwrap();
    let running: Value = serde_json::from_str(text).unwrap();
    assert_eq!(running[0]["name"], json!("Pixel_6"));
    assert_eq!(running[0]["port"], json!(5554));
}

#[tokio::test]
async fn serve_writes_one_line_per_request() {
    let server = server(Arc::new(ScriptedRunner::new()));

    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
        "\n"
    );
    let mut output = Vec::new();

    server
        .serve(tokio::io::BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], json!(1));
    assert_eq!(lines[1]["result"]["resources"][0]["uri"], json!("emulator://avds"));
}
