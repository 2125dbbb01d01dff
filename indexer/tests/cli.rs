use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const DUMP: &str = r#"<mediawiki>
  <page>
    <title>Cats</title>
    <revision>
      <timestamp>2020-01-01</timestamp>
      <contributor><username>alice</username></contributor>
      <text>Cats are animals. Cats run and cats sleep.</text>
    </revision>
  </page>
  <page>
    <title>Dogs</title>
    <revision>
      <timestamp>2021-06-01</timestamp>
      <contributor><username>bob</username></contributor>
      <text>Dogs chase cats</text>
    </revision>
  </page>
  <page>
    <title>User:Bob</title>
    <revision><text>cats cats cats cats</text></revision>
  </page>
</mediawiki>"#;

fn indexer() -> Command {
    Command::new(env!("CARGO_BIN_EXE_indexer"))
}

fn build(input: &Path, output: &Path) -> Output {
    indexer().args(["build", "--input"]).arg(input).arg("--output").arg(output).output().unwrap()
}

#[test]
fn build_then_query_and_lookup() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("dump.xml");
    let output = dir.path().join("wiki.idx");
    fs::write(&input, DUMP).unwrap();

    let status = indexer()
        .args(["build", "--threads", "2", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(output.exists());

    let out =
        indexer().args(["query", "--index"]).arg(&output).arg("cats").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let cats = stdout.find("Cats [alice").unwrap();
    let dogs = stdout.find("Dogs [bob").unwrap();
    assert!(cats < dogs, "{stdout}");
    assert!(!stdout.contains("User:Bob"));

    let lookup = |title: &str| {
        let mut cmd = indexer();
        cmd.args(["lookup", "--index"]).arg(&output).args(["--title", title]);
        cmd.output().unwrap()
    };
    let out = lookup("Dogs");
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("author: bob\ttimestamp: 2021-06-01"));
    assert!(!lookup("User:Bob").status.success());

    let out = indexer().args(["info", "--index"]).arg(&output).output().unwrap();
    assert!(String::from_utf8(out.stdout).unwrap().contains("documents: 2"));
}

#[test]
fn broken_corpus_fails_without_writing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("dump.xml");
    let output = dir.path().join("wiki.idx");
    fs::write(&input, "<mediawiki><page><title>A</title></revision></mediawiki>").unwrap();

    let out = build(&input, &output);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("loading corpus"));
    assert!(!output.exists());
}

#[test]
fn input_that_is_not_a_dump_fails_without_writing() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("wiki.idx");
    let inputs = ["", "just some plain text, not xml", r#"{"id": 1, "body": "json"}"#];
    for (i, contents) in inputs.into_iter().enumerate() {
        let input = dir.path().join(format!("input{i}"));
        fs::write(&input, contents).unwrap();
        let out = build(&input, &output);
        assert!(!out.status.success(), "{contents:?}");
        assert!(String::from_utf8_lossy(&out.stderr).contains("no root element"), "{contents:?}");
        assert!(!output.exists(), "{contents:?}");
    }
}
