use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use serde_json::Value;
use tempfile::{NamedTempFile, tempdir};
use zip::ZipArchive;

use bucket_browser::app::{AppCore, CancelToken};
use bucket_browser::args::{ArchiveArgs, Command};
use bucket_browser::domain::ArchiveRequest;
use bucket_browser::start::{load_archive_request, run_command};
use bucket_browser::testing::FakeObjectStore;
use bucket_browser::utils::log_utils::Logger;

fn sample_core() -> (AppCore, Arc<FakeObjectStore>) {
    let store = Arc::new(FakeObjectStore::with_objects([
        ("docs/", ""),
        ("docs/guide.md", "# Guide"),
        ("docs/api/v1.md", "v1"),
        ("images/logo.png", "png"),
        ("readme.txt", "hi"),
    ]));
    (AppCore::new(store.clone()), store)
}

fn run(core: &AppCore, command: Command) -> Result<Value, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    run_command(core, &command, &Logger::new(0), &CancelToken::new(), &mut out)
        .map_err(|e| e.to_string())?;
    Ok(serde_json::from_slice(&out)?)
}

fn archive_args(output: std::path::PathBuf) -> ArchiveArgs {
    ArchiveArgs {
        keys: vec![],
        folders: vec![],
        request_json: None,
        output,
        skipped_manifest: false,
        spool_memory_limit: 1024,
    }
}

#[test]
fn test_list_groups_by_delimiter() -> Result<(), Box<dyn std::error::Error>> {
    let (core, _) = sample_core();
    let json = run(
        &core,
        Command::List {
            prefix: "docs/".to_string(),
            delimiter: "/".to_string(),
        },
    )?;

    assert_eq!(json["files"], serde_json::json!(["docs/guide.md"]));
    assert_eq!(json["folders"], serde_json::json!(["docs/api/"]));
    Ok(())
}

#[test]
fn test_folders_prints_sorted_paths() -> Result<(), Box<dyn std::error::Error>> {
    let (core, _) = sample_core();
    let json = run(&core, Command::Folders)?;

    assert_eq!(
        json["folders"],
        serde_json::json!(["docs/", "docs/api/", "images/"])
    );
    Ok(())
}

#[test]
fn test_presign_prints_url_and_expiry() -> Result<(), Box<dyn std::error::Error>> {
    let (core, _) = sample_core();
    let json = run(
        &core,
        Command::Presign {
            object_key: "readme.txt".to_string(),
            expires: 120,
        },
    )?;

    let url = json["url"].as_str().ok_or("url missing")?;
    assert!(url.contains("readme.txt"));
    assert!(url.ends_with("X-Amz-Expires=120"));
    assert!(json["expires_at"].as_str().is_some());
    Ok(())
}

#[test]
fn test_archive_merges_cli_and_json_request() -> Result<(), Box<dyn std::error::Error>> {
    let (core, store) = sample_core();
    let dir = tempdir()?;
    let request_file = NamedTempFile::new()?;
    fs::write(
        request_file.path(),
        r#"{"keys": ["readme.txt", "gone.bin"], "folders": ["images/"]}"#,
    )?;

    let mut args = archive_args(dir.path().join("bundle.zip"));
    args.keys = vec!["docs/guide.md".to_string(), "readme.txt".to_string()];
    args.request_json = Some(request_file.path().to_path_buf());
    let output = args.output.clone();

    let json = run(&core, Command::Archive(args))?;
    assert_eq!(json["entries"], 3);
    assert_eq!(json["cancelled"], false);
    assert_eq!(json["skipped"][0]["key"], "gone.bin");
    assert_eq!(json["skipped"][0]["reason"], "fetch");

    let bytes = fs::read(&output)?;
    let archive = ZipArchive::new(Cursor::new(bytes))?;
    let names: Vec<&str> = archive.file_names().collect();
    let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["docs/guide.md", "images/logo.png", "readme.txt"]);
    assert_eq!(store.closed(), store.opened());
    Ok(())
}

#[test]
fn test_archive_with_manifest_flag_adds_manifest_entry() -> Result<(), Box<dyn std::error::Error>> {
    let (core, _) = sample_core();
    let dir = tempdir()?;
    let mut args = archive_args(dir.path().join("with-manifest.zip"));
    args.keys = vec!["readme.txt".to_string(), "nope".to_string()];
    args.skipped_manifest = true;
    let output = args.output.clone();

    run(&core, Command::Archive(args))?;

    let mut archive = ZipArchive::new(Cursor::new(fs::read(&output)?))?;
    assert_eq!(archive.len(), 2);
    assert!(archive.by_name("_skipped_keys.txt").is_ok());
    Ok(())
}

#[test]
fn test_empty_archive_request_writes_empty_zip() -> Result<(), Box<dyn std::error::Error>> {
    let (core, _) = sample_core();
    let dir = tempdir()?;
    let args = archive_args(dir.path().join("empty.zip"));
    let output = args.output.clone();

    let json = run(&core, Command::Archive(args))?;
    assert_eq!(json["entries"], 0);

    let archive = ZipArchive::new(Cursor::new(fs::read(&output)?))?;
    assert_eq!(archive.len(), 0);
    Ok(())
}

#[test]
fn test_archive_to_dash_streams_zip_bytes_to_output() -> Result<(), Box<dyn std::error::Error>> {
    let (core, store) = sample_core();
    let mut args = archive_args(std::path::PathBuf::from("-"));
    args.folders = vec!["docs/".to_string()];

    let mut out = Vec::new();
    run_command(
        &core,
        &Command::Archive(args),
        &Logger::new(0),
        &CancelToken::new(),
        &mut out,
    )
    .map_err(|e| e.to_string())?;

    let archive = ZipArchive::new(Cursor::new(out))?;
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"docs/api/v1.md"));
    assert_eq!(store.closed(), store.opened());
    Ok(())
}

#[test]
fn test_request_json_rejects_null_fields() -> Result<(), Box<dyn std::error::Error>> {
    let request_file = NamedTempFile::new()?;
    fs::write(request_file.path(), r#"{"keys": null, "folders": []}"#)?;

    let mut args = archive_args(std::path::PathBuf::from("unused.zip"));
    args.request_json = Some(request_file.path().to_path_buf());

    assert!(load_archive_request(&args).is_err());
    Ok(())
}

#[test]
fn test_request_json_missing_fields_default_to_empty() {
    let parsed: ArchiveRequest =
        serde_json::from_str(r#"{"folders": ["a/"]}"#).expect("missing keys is allowed");
    assert!(parsed.keys.is_empty());
    assert_eq!(parsed.folders, vec!["a/".to_string()]);

    assert!(serde_json::from_str::<ArchiveRequest>(r#"{"keys": "a"}"#).is_err());
}
