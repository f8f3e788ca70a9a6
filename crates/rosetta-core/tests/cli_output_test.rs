#![allow(clippy::unwrap_used)]
// Golden corpus for the console output parser: captured device output,
// one case per shape the parser must recognize.

use pretty_assertions::assert_eq;

use rosetta_core::format::CliFormatter;
use rosetta_core::{ErrorCategory, Formatter, Record, Value};

fn parse_records(text: &str) -> Vec<Record> {
    let resp = CliFormatter.parse(text).unwrap();
    assert!(resp.success, "unexpected failure: {:?}", resp.error);
    resp.record_slice().to_vec()
}

fn field<'a>(rec: &'a Record, key: &str) -> &'a Value {
    rec.get(key)
        .unwrap_or_else(|| panic!("record has no `{key}`: {rec:?}"))
}

// ── Tables ──────────────────────────────────────────────────────────

const INTERFACE_PRINT_V6: &str = "\
Flags: D - dynamic, X - disabled, R - running, S - slave
 #     NAME                                TYPE       ACTUAL-MTU L2MTU  MAX-L2MTU
 0  R  ether1                              ether            1500  1598       2028
 1  X  ether2                              ether            1500  1598       2028
 2     wlan1                               wlan             1500  1600       2290
";

const INTERFACE_PRINT_V7: &str = "\
Flags: R - RUNNING
Columns: NAME, TYPE, ACTUAL-MTU, L2MTU, MAX-L2MTU, MAC-ADDRESS
 #   NAME    TYPE    ACTUAL-MTU  L2MTU  MAX-L2MTU  MAC-ADDRESS
 0 R ether1  ether         1500   1598       9796  48:8F:5A:00:00:01
 1 R bridge  bridge        1500   1598             48:8F:5A:00:00:02
";

#[test]
fn test_v6_interface_table() {
    let records = parse_records(INTERFACE_PRINT_V6);
    assert_eq!(records.len(), 3);

    assert_eq!(field(&records[0], "_index"), &Value::from("0"));
    assert_eq!(field(&records[0], "_flags"), &Value::from("R"));
    assert_eq!(field(&records[0], "running"), &Value::Bool(true));
    assert_eq!(field(&records[0], "name"), &Value::from("ether1"));
    assert_eq!(field(&records[0], "type"), &Value::from("ether"));

    assert_eq!(field(&records[1], "disabled"), &Value::Bool(true));
    assert_eq!(field(&records[1], "running"), &Value::Bool(false));

    assert!(!records[2].contains_key("_flags"));
    assert_eq!(field(&records[2], "name"), &Value::from("wlan1"));
    assert_eq!(field(&records[2], "type"), &Value::from("wlan"));
}

#[test]
fn test_v7_table_skips_column_headers() {
    let records = parse_records(INTERFACE_PRINT_V7);
    assert_eq!(records.len(), 2);
    assert_eq!(field(&records[1], "_index"), &Value::from("1"));
    assert_eq!(field(&records[1], "name"), &Value::from("bridge"));
    assert_eq!(field(&records[1], "type"), &Value::from("bridge"));
}

#[test]
fn test_single_flagged_row() {
    let records = parse_records("0 R  ether1  ether");
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(field(rec, "_flags"), &Value::from("R"));
    assert_eq!(field(rec, "running"), &Value::Bool(true));
    assert_eq!(field(rec, "disabled"), &Value::Bool(false));
    assert_eq!(field(rec, "dynamic"), &Value::Bool(false));
    assert_eq!(field(rec, "invalid"), &Value::Bool(false));
    assert_eq!(field(rec, "name"), &Value::from("ether1"));
    assert_eq!(field(rec, "type"), &Value::from("ether"));
}

#[test]
fn test_combined_flags() {
    let records = parse_records(" 4 XI  vlan100  vlan");
    let rec = &records[0];
    assert_eq!(field(rec, "_flags"), &Value::from("XI"));
    assert_eq!(field(rec, "disabled"), &Value::Bool(true));
    assert_eq!(field(rec, "invalid"), &Value::Bool(true));
    assert_eq!(field(rec, "running"), &Value::Bool(false));
}

// ── Key/value blocks ────────────────────────────────────────────────

const SYSTEM_RESOURCE_PRINT: &str = "
                   uptime: 3d4h12m
                  version: 7.13.2 (stable)
               build-time: Nov/08/2023 09:17:56
              free-memory: 898.4MiB
                 cpu-load: 3%
               board-name: RB5009UG+S+
";

#[test]
fn test_key_value_block_is_one_record() {
    let records = parse_records(SYSTEM_RESOURCE_PRINT);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(field(rec, "uptime"), &Value::from("3d4h12m"));
    assert_eq!(field(rec, "version"), &Value::from("7.13.2 (stable)"));
    assert_eq!(field(rec, "build-time"), &Value::from("Nov/08/2023 09:17:56"));
    assert_eq!(field(rec, "cpu-load"), &Value::from("3%"));
    assert_eq!(field(rec, "board-name"), &Value::from("RB5009UG+S+"));
}

// ── Detail print ────────────────────────────────────────────────────

const INTERFACE_DETAIL: &str = r#"Flags: X - disabled, R - running
 0  R name="ether1" default-name="ether1" mtu=1500
      mac-address=48:8F:5A:00:00:01 arp=enabled

 1  X ;;; spare port
      name="ether2" default-name="ether2" comment="spare \"B\"" mtu=1500
"#;

#[test]
fn test_detail_rows_fold_continuations() {
    let records = parse_records(INTERFACE_DETAIL);
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(field(first, "running"), &Value::Bool(true));
    assert_eq!(field(first, "name"), &Value::from("ether1"));
    assert_eq!(field(first, "default-name"), &Value::from("ether1"));
    assert_eq!(field(first, "mtu"), &Value::from("1500"));
    assert_eq!(field(first, "mac-address"), &Value::from("48:8F:5A:00:00:01"));
    assert_eq!(field(first, "arp"), &Value::from("enabled"));
    assert!(!first.contains_key("type"));

    let second = &records[1];
    assert_eq!(field(second, "disabled"), &Value::Bool(true));
    assert_eq!(field(second, "name"), &Value::from("ether2"));
    assert_eq!(field(second, "comment"), &Value::from(r#"spare "B""#));
}

const ADDRESS_PRINT_WITH_COMMENT: &str = "\
Flags: X - disabled, I - invalid, D - dynamic
 #   ADDRESS            NETWORK         INTERFACE
 0   ;;; management
     192.168.88.1/24    192.168.88.0    bridge
 1 D 10.0.0.5/24        10.0.0.0        ether1
";

#[test]
fn test_comment_line_defers_columns() {
    let records = parse_records(ADDRESS_PRINT_WITH_COMMENT);
    assert_eq!(records.len(), 2);

    assert_eq!(field(&records[0], "comment"), &Value::from("management"));
    assert_eq!(field(&records[0], "name"), &Value::from("192.168.88.1/24"));

    assert_eq!(field(&records[1], "dynamic"), &Value::Bool(true));
    assert_eq!(field(&records[1], "name"), &Value::from("10.0.0.5/24"));
    assert!(!records[1].contains_key("comment"));
}

// ── Ids, raw text, errors ───────────────────────────────────────────

#[test]
fn test_created_id() {
    let resp = CliFormatter.parse("\n*2B\n").unwrap();
    assert!(resp.success);
    assert_eq!(resp.id.as_deref(), Some("*2B"));
}

#[test]
fn test_unstructured_passthrough() {
    let text = "Rebooting...\nBye.";
    let resp = CliFormatter.parse(text).unwrap();
    assert!(resp.success);
    assert_eq!(resp.raw_text(), Some(text));
}

#[test]
fn test_error_corpus() {
    let cases = [
        ("no such item (4)", "NOT_FOUND", ErrorCategory::NotFound),
        ("failure: already have such address", "DUPLICATE", ErrorCategory::Conflict),
        ("invalid value for argument mtu", "VALIDATION_ERROR", ErrorCategory::Validation),
        ("syntax error (line 1 column 5)", "VALIDATION_ERROR", ErrorCategory::Validation),
        ("bad command name prnt (line 1 column 11)", "BAD_COMMAND", ErrorCategory::Unsupported),
        ("expected end of command (line 1 column 12)", "CLI_ERROR", ErrorCategory::Internal),
        ("input does not match any value of interface", "CLI_ERROR", ErrorCategory::Internal),
        ("Failure: could not allocate", "CLI_ERROR", ErrorCategory::Internal),
    ];

    for (text, code, category) in cases {
        let resp = CliFormatter.parse(text).unwrap();
        assert!(!resp.success, "{text}");
        assert!(resp.data.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, code, "{text}");
        assert_eq!(err.category, category, "{text}");
        assert_eq!(err.message, text);
    }
}
