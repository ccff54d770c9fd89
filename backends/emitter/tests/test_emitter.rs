use std::fs;

use emitter::{EmitOptions, Emitter, OverwritePolicy};
use ir::{FileEncoding, GeneratedCode, GeneratedFile};

fn code(files: Vec<GeneratedFile>) -> GeneratedCode {
    GeneratedCode { files, ..Default::default() }
}

#[tokio::test]
async fn test_writes_nested_files() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let out = temp_dir.path().join("generated");
    let emitter = Emitter::new(EmitOptions::new(&out));

    let report = emitter
        .write(&code(vec![
            GeneratedFile::new("src/routes/users.ts", "export const users = [];"),
            GeneratedFile::new("package.json", "{}"),
        ]))
        .await
        .expect("write");

    assert!(report.is_success());
    assert_eq!(report.written.len(), 2);
    assert_eq!(
        fs::read_to_string(out.join("src/routes/users.ts")).expect("read"),
        "export const users = [];"
    );
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let out = temp_dir.path().join("generated");
    let emitter = Emitter::new(EmitOptions { dry_run: true, ..EmitOptions::new(&out) });

    let report = emitter.write(&code(vec![GeneratedFile::new("a.ts", "a")])).await.expect("write");

    assert!(report.dry_run);
    assert_eq!(report.written, vec![out.join("a.ts")]);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_escaping_paths_fail_per_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let emitter = Emitter::new(EmitOptions::new(temp_dir.path().join("out")));

    let report = emitter
        .write(&code(vec![
            GeneratedFile::new("../outside.ts", "x"),
            GeneratedFile::new("inside.ts", "y"),
        ]))
        .await
        .expect("write");

    assert_eq!(report.written.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "../outside.ts");
    assert!(!temp_dir.path().join("outside.ts").exists());
}

#[tokio::test]
async fn test_parent_segments_inside_output_are_normalized() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let out = temp_dir.path().join("out");
    let emitter = Emitter::new(EmitOptions::new(&out));

    let report = emitter
        .write(&code(vec![GeneratedFile::new("src/../a.ts", "a"), GeneratedFile::new("src/../../b.ts", "b")]))
        .await
        .expect("write");

    assert_eq!(report.written, vec![out.join("a.ts")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, "src/../../b.ts");
    assert_eq!(fs::read_to_string(out.join("a.ts")).expect("a.ts"), "a");
    assert!(!temp_dir.path().join("b.ts").exists());
}

#[tokio::test]
async fn test_overwrite_policies() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let out = temp_dir.path().to_path_buf();
    fs::write(out.join("same.ts"), "same").expect("seed");
    fs::write(out.join("changed.ts"), "old").expect("seed");

    let output = code(vec![GeneratedFile::new("same.ts", "same"), GeneratedFile::new("changed.ts", "new")]);

    let never = Emitter::new(EmitOptions { overwrite: OverwritePolicy::Never, ..EmitOptions::new(&out) });
    let report = never.write(&output).await.expect("write");
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(fs::read_to_string(out.join("changed.ts")).expect("read"), "old");

    let if_changed =
        Emitter::new(EmitOptions { overwrite: OverwritePolicy::IfChanged, ..EmitOptions::new(&out) });
    let report = if_changed.write(&output).await.expect("write");
    assert_eq!(report.skipped, vec![out.join("same.ts")]);
    assert_eq!(report.written, vec![out.join("changed.ts")]);
    assert_eq!(fs::read_to_string(out.join("changed.ts")).expect("read"), "new");
}

#[tokio::test]
async fn test_per_file_overwrite_flag_wins() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let out = temp_dir.path().to_path_buf();
    fs::write(out.join(".env"), "SECRET=mine").expect("seed");

    let mut env = GeneratedFile::new(".env", "SECRET=changeme");
    env.overwrite = Some(false);

    let report = Emitter::new(EmitOptions::new(&out)).write(&code(vec![env])).await.expect("write");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(fs::read_to_string(out.join(".env")).expect("read"), "SECRET=mine");
}

#[tokio::test]
async fn test_base64_content_is_decoded() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let mut icon = GeneratedFile::new("public/icon.bin", "AAECAw==");
    icon.encoding = Some(FileEncoding::Base64);

    let report =
        Emitter::new(EmitOptions::new(temp_dir.path())).write(&code(vec![icon])).await.expect("write");
    assert!(report.is_success());
    assert_eq!(fs::read(temp_dir.path().join("public/icon.bin")).expect("read"), vec![0u8, 1, 2, 3]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_mode_is_applied() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let mut script = GeneratedFile::new("scripts/start.sh", "#!/bin/sh\nnode dist/index.js\n");
    script.mode = Some(0o755);

    Emitter::new(EmitOptions::new(temp_dir.path())).write(&code(vec![script])).await.expect("write");
    let mode = fs::metadata(temp_dir.path().join("scripts/start.sh")).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}
