use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_lmsd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn lmsd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn question_bank() -> serde_json::Value {
    let items: Vec<serde_json::Value> = (1..=23)
        .map(|i| {
            let topic = if i % 2 == 0 { "Recursion" } else { "Sorting" };
            json!({
                "id": format!("q{}", i),
                "title": format!("{} question {}", topic, i),
                "tags": [if i % 3 == 0 { "exam" } else { "practice" }],
                "points": i
            })
        })
        .collect();
    json!(items)
}

fn ids(page: &serde_json::Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|i| i["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn search_then_paginate() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = send(
        &mut stdin,
        &mut reader,
        "1",
        "bank.query",
        json!({ "items": question_bank(), "search": "recursion", "page": 2, "pageSize": 5 }),
    );
    assert_eq!(resp["ok"], true, "{}", resp);
    let page = &resp["result"];
    assert_eq!(page["totalItems"], 11);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(ids(page), vec!["q12", "q14", "q16", "q18", "q20"]);
    assert_eq!(page["items"][0]["points"], 12);

    let tagged = send(
        &mut stdin,
        &mut reader,
        "2",
        "bank.query",
        json!({ "items": question_bank(), "search": "EXAM", "pageSize": 100 }),
    );
    assert_eq!(tagged["result"]["totalItems"], 7);

    let _ = child.kill();
}

#[test]
fn defaults_and_clamping() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let first = send(
        &mut stdin,
        &mut reader,
        "1",
        "bank.query",
        json!({ "items": question_bank() }),
    );
    assert_eq!(first["result"]["page"], 1);
    assert_eq!(first["result"]["pageSize"], 10);
    assert_eq!(first["result"]["totalPages"], 3);

    let past_end = send(
        &mut stdin,
        &mut reader,
        "2",
        "bank.query",
        json!({ "items": question_bank(), "page": 40 }),
    );
    assert_eq!(past_end["result"]["page"], 3);
    assert_eq!(ids(&past_end["result"]), vec!["q21", "q22", "q23"]);

    let nothing = send(
        &mut stdin,
        &mut reader,
        "3",
        "bank.query",
        json!({ "items": question_bank(), "search": "graphs" }),
    );
    assert_eq!(nothing["result"]["totalItems"], 0);
    assert_eq!(nothing["result"]["totalPages"], 1);

    let bad = send(
        &mut stdin,
        &mut reader,
        "4",
        "bank.query",
        json!({ "items": question_bank(), "page": 0 }),
    );
    assert_eq!(bad["error"]["code"], "bad_params");

    let missing = send(&mut stdin, &mut reader, "5", "bank.query", json!({}));
    assert_eq!(missing["error"]["code"], "bad_params");

    let numeric_search = send(
        &mut stdin,
        &mut reader,
        "6",
        "bank.query",
        json!({ "items": question_bank(), "search": 5 }),
    );
    assert_eq!(numeric_search["error"]["code"], "bad_params");
    assert_eq!(numeric_search["error"]["details"]["search"], 5);

    let null_search = send(
        &mut stdin,
        &mut reader,
        "7",
        "bank.query",
        json!({ "items": question_bank(), "search": null }),
    );
    assert_eq!(null_search["result"]["totalItems"], 23);

    let _ = child.kill();
}
