// Schema validation tests for the MQTT wire format
//
// Instances are built as raw JSON (independent of the bridge's structs) and
// checked against the schema files in schemas/mqtt/.

use std::path::PathBuf;

use serde_json::{Value, json};

fn schema_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas/mqtt")
}

fn read_json(path: &std::path::Path) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn validator(schema_name: &str) -> jsonschema::Validator {
    let path = schema_dir().join(schema_name);
    let schema = read_json(&path)
        .unwrap_or_else(|e| panic!("Failed to load schema {}: {e}", path.display()));
    jsonschema::options()
        .with_retriever(SchemaDirRetriever)
        .build(&schema)
        .unwrap_or_else(|e| panic!("Failed to compile schema {schema_name}: {e}"))
}

fn validate(schema_name: &str, instance: &Value) {
    let errors: Vec<String> = validator(schema_name)
        .iter_errors(instance)
        .map(|e| format!("  - {e}"))
        .collect();
    assert!(
        errors.is_empty(),
        "Schema validation failed for {schema_name}:\n{}\nInstance: {}",
        errors.join("\n"),
        serde_json::to_string_pretty(instance).unwrap()
    );
}

fn validate_fails(schema_name: &str, instance: &Value) {
    assert!(
        !validator(schema_name).is_valid(instance),
        "Expected {schema_name} to reject instance:\n{}",
        serde_json::to_string_pretty(instance).unwrap()
    );
}

// Resolves relative $refs ("keypad_state.schema.json", which the validator
// presents as "json-schema:///keypad_state.schema.json") from schemas/mqtt/
struct SchemaDirRetriever;

impl jsonschema::Retrieve for SchemaDirRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(path) = uri_str.strip_prefix("file://") {
            return read_json(std::path::Path::new(path));
        }
        let filename = uri_str.strip_prefix("json-schema:///").unwrap_or(uri_str);
        let path = schema_dir().join(filename);
        if path.exists() {
            return read_json(&path);
        }
        Err(format!("Cannot retrieve schema: {uri_str}").into())
    }
}

fn armed_keypad() -> Value {
    json!({
        "name": "Front Door",
        "location": "Home",
        "statusCode": 10204,
        "state": "Armed-Stay",
        "stateDisplay": "Armed-Stay",
        "detail": "Armed Stay, Bypass",
        "detailDisplay": "Armed Stay, Bypass",
        "isArmed": true,
        "isBypass": true,
        "lastStatusUpdate": "2026-03-01 10:00:00"
    })
}

fn unread_keypad() -> Value {
    json!({
        "name": "Garage",
        "location": "Home",
        "statusCode": null,
        "state": null,
        "stateDisplay": null,
        "detail": null,
        "detailDisplay": null,
        "isArmed": null,
        "isBypass": null,
        "lastStatusUpdate": null
    })
}

fn home_location() -> Value {
    json!({
        "id": 1001,
        "name": "Home",
        "devices": [
            { "id": 7, "name": "Security Panel", "classId": 1, "securityPanel": true },
            { "id": 8, "name": "Automation", "classId": null, "securityPanel": false }
        ]
    })
}

// =========================================================================
// Keypad state
// =========================================================================

#[test]
fn keypad_state_valid() {
    validate("keypad_state.schema.json", &armed_keypad());
}

#[test]
fn keypad_state_before_first_read() {
    validate("keypad_state.schema.json", &unread_keypad());
}

#[test]
fn keypad_state_every_state_type() {
    for state in ["Disarmed", "Armed-Away", "Armed-Stay", "Armed-Night", "Arming", "Disarming"] {
        let mut keypad = armed_keypad();
        keypad["state"] = json!(state);
        keypad["stateDisplay"] = json!(state);
        validate("keypad_state.schema.json", &keypad);
    }
}

#[test]
fn keypad_state_unknown_type_rejected() {
    let mut keypad = armed_keypad();
    keypad["state"] = json!("Armed-Vacation");
    validate_fails("keypad_state.schema.json", &keypad);
}

#[test]
fn keypad_state_missing_field() {
    let mut keypad = armed_keypad();
    keypad.as_object_mut().unwrap().remove("isBypass");
    validate_fails("keypad_state.schema.json", &keypad);
}

#[test]
fn keypad_state_extra_field_rejected() {
    let mut keypad = armed_keypad();
    keypad["locationName"] = json!("Home");
    validate_fails("keypad_state.schema.json", &keypad);
}

#[test]
fn keypad_state_iso_timestamp_rejected() {
    let mut keypad = armed_keypad();
    keypad["lastStatusUpdate"] = json!("2026-03-01T10:00:00Z");
    validate_fails("keypad_state.schema.json", &keypad);
}

#[test]
fn keypad_state_is_armed_as_string_rejected() {
    let mut keypad = armed_keypad();
    keypad["isArmed"] = json!("yes");
    validate_fails("keypad_state.schema.json", &keypad);
}

// =========================================================================
// Location
// =========================================================================

#[test]
fn location_valid() {
    validate("location.schema.json", &home_location());
}

#[test]
fn location_without_devices() {
    validate(
        "location.schema.json",
        &json!({ "id": 1002, "name": "Cabin", "devices": [] }),
    );
}

#[test]
fn location_device_missing_flag_rejected() {
    validate_fails(
        "location.schema.json",
        &json!({
            "id": 1001,
            "name": "Home",
            "devices": [{ "id": 7, "name": "Security Panel", "classId": 1 }]
        }),
    );
}

// =========================================================================
// Snapshot
// =========================================================================

#[test]
fn snapshot_valid() {
    validate(
        "snapshot.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "SNAPSHOT",
            "state": {
                "keypads": [armed_keypad(), unread_keypad()],
                "locations": [home_location()]
            }
        }),
    );
}

#[test]
fn snapshot_empty_arrays() {
    validate(
        "snapshot.schema.json",
        &json!({
            "now": 0,
            "op": "SNAPSHOT",
            "state": { "keypads": [], "locations": [] }
        }),
    );
}

#[test]
fn snapshot_invalid_keypad_rejected() {
    let mut keypad = armed_keypad();
    keypad["statusCode"] = json!("10204");
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "SNAPSHOT",
            "state": { "keypads": [keypad], "locations": [] }
        }),
    );
}

#[test]
fn snapshot_wrong_op() {
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "WRONG",
            "state": { "keypads": [], "locations": [] }
        }),
    );
}

#[test]
fn snapshot_missing_state() {
    validate_fails(
        "snapshot.schema.json",
        &json!({ "now": 1738900000000_u64, "op": "SNAPSHOT" }),
    );
}

#[test]
fn snapshot_now_as_float_rejected() {
    validate_fails(
        "snapshot.schema.json",
        &json!({
            "now": 1738900000000.5,
            "op": "SNAPSHOT",
            "state": { "keypads": [], "locations": [] }
        }),
    );
}

// =========================================================================
// Keypad status
// =========================================================================

#[test]
fn keypad_status_valid() {
    validate(
        "keypad_status.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "KEYPAD_STATUS",
            "keypad": armed_keypad(),
            "changed": true
        }),
    );
}

#[test]
fn keypad_status_missing_changed() {
    validate_fails(
        "keypad_status.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "KEYPAD_STATUS",
            "keypad": armed_keypad()
        }),
    );
}

// =========================================================================
// CMD_ACK
// =========================================================================

#[test]
fn cmd_ack_success() {
    validate(
        "command_ack.schema.json",
        &json!({ "now": 1738900000000_u64, "op": "CMD_ACK", "success": true }),
    );
}

#[test]
fn cmd_ack_failure_with_error() {
    validate(
        "command_ack.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "CMD_ACK",
            "success": false,
            "src": { "op": "ARM_AWAY", "keypad": "Shed" },
            "error": "Unknown keypad: Shed"
        }),
    );
}

#[test]
fn cmd_ack_echoes_op_id() {
    validate(
        "command_ack.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "CMD_ACK",
            "op_id": "abc-123",
            "success": true,
            "src": { "op": "DISARM", "keypad": "Front Door", "op_id": "abc-123" }
        }),
    );
}

#[test]
fn cmd_ack_numeric_op_id_rejected() {
    validate_fails(
        "command_ack.schema.json",
        &json!({ "now": 1738900000000_u64, "op": "CMD_ACK", "op_id": 7, "success": true }),
    );
}

#[test]
fn cmd_ack_with_snapshot_data() {
    validate(
        "command_ack.schema.json",
        &json!({
            "now": 1738900000000_u64,
            "op": "CMD_ACK",
            "success": true,
            "src": { "op": "SNAPSHOT" },
            "data": {
                "now": 1738900000000_u64,
                "op": "SNAPSHOT",
                "state": { "keypads": [], "locations": [] }
            }
        }),
    );
}

#[test]
fn cmd_ack_wrong_op_rejected() {
    validate_fails(
        "command_ack.schema.json",
        &json!({ "now": 1738900000000_u64, "op": "ACK", "success": true }),
    );
}

// =========================================================================
// Inbound commands
// =========================================================================

#[test]
fn command_keypad_actions() {
    for op in [
        "DISARM",
        "ARM_AWAY",
        "ARM_STAY",
        "ARM_STAY_NIGHT",
        "ARM_STAY_INSTANT",
        "ARM_AWAY_INSTANT",
        "REFRESH",
    ] {
        validate(
            "command.schema.json",
            &json!({ "op": op, "keypad": "Front Door" }),
        );
    }
}

#[test]
fn command_without_keypad() {
    for op in ["SNAPSHOT", "PING", "REFRESH"] {
        validate("command.schema.json", &json!({ "op": op }));
    }
}

#[test]
fn command_arm_requires_keypad() {
    validate_fails("command.schema.json", &json!({ "op": "ARM_AWAY" }));
}

#[test]
fn command_with_op_id() {
    validate(
        "command.schema.json",
        &json!({ "op": "DISARM", "keypad": "Front Door", "op_id": "abc-123" }),
    );
}

#[test]
fn command_unknown_op_rejected() {
    validate_fails("command.schema.json", &json!({ "op": "ZONE_BYPASS_ENABLE", "zone": 1 }));
}

#[test]
fn command_extra_field_rejected() {
    validate_fails("command.schema.json", &json!({ "op": "PING", "extra": true }));
}
