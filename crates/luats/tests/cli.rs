//! End-to-end runs of the `luats` binary.

use assert_cmd::Command;
use std::fs;

fn luats() -> Command {
    Command::cargo_bin("luats").unwrap()
}

#[test]
fn prints_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.lua");
    fs::write(&input, "local x = 1\nprint(x)\n").unwrap();

    luats()
        .arg(&input)
        .assert()
        .success()
        .stdout("let x = 1;\nconsole.log(x);\n");
}

#[test]
fn writes_code_and_source_map() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("main.lua");
    let out = dir.path().join("out");
    fs::write(&input, "local x = 1\nprint(x)\n").unwrap();

    luats()
        .arg(&input)
        .arg("--out-dir")
        .arg(&out)
        .arg("--source-map")
        .assert()
        .success();

    let code = fs::read_to_string(out.join("main.ts")).unwrap();
    assert_eq!(
        code,
        "let x = 1;\nconsole.log(x);\n//# sourceMappingURL=main.ts.map\n"
    );
    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("main.ts.map")).unwrap()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "main.ts");
}

#[test]
fn colliding_output_names_fail_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut inputs = Vec::new();
    for sub in ["a", "b"] {
        fs::create_dir(dir.path().join(sub)).unwrap();
        let input = dir.path().join(sub).join("util.lua");
        fs::write(&input, "print(1)\n").unwrap();
        inputs.push(input);
    }

    let assert = luats().args(&inputs).arg("--out-dir").arg(&out).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("would both be written to"), "{stderr}");
    assert!(!out.join("util.ts").exists());
}

#[test]
fn deny_diagnostics_fails_on_unsupported_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("jump.lua");
    fs::write(&input, "goto done\n::done::\n").unwrap();

    let assert = luats().arg(&input).arg("--deny-diagnostics").assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("jump.lua:1:0: goto statements are not supported"), "{stderr}");

    // without the flag the same diagnostics are only reported
    luats().arg(&input).assert().success();
}

#[test]
fn parse_errors_fail() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.lua");
    fs::write(&input, "local = = 1\n").unwrap();

    luats().arg(&input).assert().failure();
}
