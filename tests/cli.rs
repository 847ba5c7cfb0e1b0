// 命令行集成测试
//
// 只覆盖不需要网络的路径：源语言还原、示例配置生成与参数校验

use std::fs;

use assert_cmd::Command;

fn livetranslate(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("livetranslate").expect("binary is built");
    cmd.current_dir(dir.path())
        .env_remove("LIVETRANSLATE_CONFIG")
        .env_remove("LIVETRANSLATE_API_URL")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_source_language_passes_document_through() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    fs::write(
        &input,
        "<html><body><p>Welcome home</p><script>var x = 1;</script></body></html>",
    )
    .unwrap();

    let output = livetranslate(&dir)
        .arg(&input)
        .args(["--lang", "en"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let html = String::from_utf8(output.stdout).unwrap();
    assert!(html.contains("<p>Welcome home</p>"));
    assert!(html.contains("var x = 1;"));
    assert!(!html.contains("data-translated"));
}

#[test]
fn test_output_file_option() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    let out = dir.path().join("out.html");
    fs::write(&input, "<p>Hello</p>").unwrap();

    livetranslate(&dir)
        .arg(&input)
        .args(["--lang", "en", "--output"])
        .arg(&out)
        .assert()
        .success();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("<p>Hello</p>"));
}

#[test]
fn test_init_config_writes_example() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("livetranslate.toml");

    livetranslate(&dir)
        .arg("--init-config")
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("chunk_size = 25"));
    assert!(content.contains("source_lang = \"en\""));
}

#[test]
fn test_missing_language_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    fs::write(&input, "<p>Hello</p>").unwrap();

    livetranslate(&dir).arg(&input).assert().failure();
}

#[test]
fn test_invalid_api_url_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    fs::write(&input, "<p>Hello</p>").unwrap();

    livetranslate(&dir)
        .arg(&input)
        .args(["--lang", "fr", "--api-url", "not a url"])
        .assert()
        .failure();
}
