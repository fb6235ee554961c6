use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::process::{Command, Output};

fn translate_movie(temp: &TempDir, args: &[&str]) -> Output {
    translate_movie_with_env(temp, args, &[])
}

fn translate_movie_with_env(temp: &TempDir, args: &[&str], envs: &[(&str, String)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_translate-movie"));
    command.args(args).current_dir(temp.path());
    for key in [
        "DEBUG",
        "RUST_LOG",
        "LOG_DIR",
        "TOOL_EXIT_POLICY",
        "TRANSLATION_BATCH_SIZES",
        "SOURCE_LANG",
        "TARGET_LANG",
        "CANONICAL_SUBTITLES",
    ] {
        command.env_remove(key);
    }
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().expect("failed to run translate-movie")
}

/// Stand-in whisper: chatters on stdout and writes `<dir>/<stem>.srt`.
#[cfg(unix)]
const FAKE_WHISPER: &str = r#"#!/bin/sh
echo "WHISPER STDOUT CHATTER"
video="$1"
shift
while [ $# -gt 0 ]; do
    if [ "$1" = "--output_dir" ]; then dir="$2"; fi
    shift
done
name=$(basename "$video")
printf '1\n00:00:00,000 --> 00:00:01,000\nhello\n' > "$dir/${name%.*}.srt"
"#;

/// Stand-in node: chatters on stdout and writes the `--output` file.
#[cfg(unix)]
const FAKE_NODE: &str = r#"#!/bin/sh
echo "NODE STDOUT CHATTER"
while [ $# -gt 0 ]; do
    if [ "$1" = "--output" ]; then out="$2"; fi
    shift
done
printf '1\n00:00:00,000 --> 00:00:01,000\nczesc\n' > "$out"
"#;

#[cfg(unix)]
fn install_script(temp: &TempDir, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let script = temp.child(name);
    script.write_str(body).unwrap();
    std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
    script.path().display().to_string()
}

/// Fake tool environment plus a video, returning the video path and tool variables.
#[cfg(unix)]
fn fake_toolchain(temp: &TempDir) -> (String, Vec<(&'static str, String)>) {
    temp.child("translator/cli").create_dir_all().unwrap();
    temp.child("translator/cli/translator.mjs").touch().unwrap();
    temp.child("movies").create_dir_all().unwrap();
    temp.child("movies/talk.mp4").write_str("video").unwrap();

    let envs = vec![
        ("WHISPER_PATH", install_script(temp, "whisper", FAKE_WHISPER)),
        ("NODE_PATH_BIN", install_script(temp, "node", FAKE_NODE)),
        (
            "TRANSLATOR_PATH",
            temp.child("translator").path().display().to_string(),
        ),
    ];
    (temp.child("movies/talk.mp4").path().display().to_string(), envs)
}

#[test]
fn no_arguments_prints_help_and_fails() {
    let temp = TempDir::new().unwrap();
    let output = translate_movie(&temp, &[]);

    assert!(!output.status.success());
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("--file"));
    assert!(text.contains("--net"));
    assert!(output.stdout.is_empty());
}

#[test]
fn explicit_help_succeeds() {
    let temp = TempDir::new().unwrap();
    let output = translate_movie(&temp, &["--help"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--skip-whisper"));
}

#[test]
fn file_and_net_together_are_rejected() {
    let temp = TempDir::new().unwrap();
    let output = translate_movie(&temp, &["--file", "a.mp4", "--net", "https://example.com/v"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn unknown_flag_is_rejected() {
    let temp = TempDir::new().unwrap();
    let output = translate_movie(&temp, &["--file", "a.mp4", "--turbo"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_source_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let output = translate_movie(&temp, &["--skip-whisper"]);

    assert_eq!(output.status.code(), Some(1));
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("one of --file or --net is required"));
    assert!(text.contains("Usage"));
}

#[test]
fn missing_local_file_fails_before_tools() {
    let temp = TempDir::new().unwrap();
    let output = translate_movie(&temp, &["--file", "missing.mp4"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("File not found: missing.mp4"));
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_config_file_fails() {
    let temp = TempDir::new().unwrap();
    temp.child("translate-movie.toml")
        .write_str("exit_policy = \"sometimes\"\n")
        .unwrap();

    let output = translate_movie(&temp, &["--file", "a.mp4"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration error"));
}

#[cfg(unix)]
#[test]
fn successful_run_prints_only_report_on_stdout() {
    let temp = TempDir::new().unwrap();
    let (video, envs) = fake_toolchain(&temp);

    let output = translate_movie_with_env(&temp, &["--file", &video], &envs);

    assert_eq!(output.status.code(), Some(0));
    let movies = temp.child("movies");
    let expected = format!(
        "\n=== Done! ===\nVideo file: {}\nSource subtitles (en): {}\nTranslated subtitles (pl): {}\n",
        video,
        movies.child("talk.srt").path().display(),
        movies.child("talk_pl.srt").path().display()
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WHISPER STDOUT CHATTER"));
    assert!(stderr.contains("NODE STDOUT CHATTER"));
    assert!(!stderr.contains("Running command:"));
    assert!(movies.child("talk_pl.srt").path().is_file());
}

#[cfg(unix)]
#[test]
fn debug_toggle_adds_diagnostics_on_stderr_only() {
    let temp = TempDir::new().unwrap();
    let (video, mut envs) = fake_toolchain(&temp);
    envs.push(("DEBUG", "TRUE".to_string()));

    let output = translate_movie_with_env(&temp, &["--file", &video], &envs);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("\n=== Done! ===\n"));
    assert!(!stdout.contains("Running command:"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Running command:"));
    assert!(stderr.contains("WHISPER_PATH overridden from environment"));
    assert!(stderr.contains("WHISPER STDOUT CHATTER"));
}

#[cfg(unix)]
#[test]
fn config_file_origin_is_logged() {
    let temp = TempDir::new().unwrap();
    let (video, envs) = fake_toolchain(&temp);
    temp.child("translate-movie.toml")
        .write_str("[translator]\ntarget_lang = \"de\"\n")
        .unwrap();

    let output = translate_movie_with_env(&temp, &["--file", &video], &envs);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Loaded configuration from translate-movie.toml"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("talk_de.srt"));
}

#[cfg(unix)]
#[test]
fn failing_tool_exit_respects_policy() {
    let temp = TempDir::new().unwrap();
    let (video, envs) = fake_toolchain(&temp);
    install_script(&temp, "node", &format!("{}exit 3\n", FAKE_NODE));

    let strict = translate_movie_with_env(&temp, &["--file", &video], &envs);
    assert_eq!(strict.status.code(), Some(1));
    assert!(strict.stdout.is_empty());

    let mut lenient_envs = envs.clone();
    lenient_envs.push(("TOOL_EXIT_POLICY", "lenient".to_string()));
    let lenient = translate_movie_with_env(&temp, &["--file", &video], &lenient_envs);
    assert_eq!(lenient.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&lenient.stdout).contains("talk_pl.srt"));
}
