use tracing::{info, Level};
use xcloud_listener::config::LogConfig;
use xcloud_listener::logging::{init_logging, LogSink};

#[test]
fn log_lines_are_appended_to_the_file() {
    let td = tempfile::tempdir().unwrap();
    let file = td.path().join("xcloud-listener.log");
    std::fs::write(&file, "previous run\n").unwrap();
    std::env::remove_var("RUST_LOG");

    let guard = init_logging(&LogConfig {
        file: file.clone(),
        max_level: Level::INFO,
    })
    .expect("first init");
    assert_eq!(guard.sink(), &LogSink::File(file.clone()));

    info!("host started for test");
    drop(guard);

    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.starts_with("previous run\n"), "{text}");
    assert!(text.contains("host started for test"), "{text}");

    let err = init_logging(&LogConfig {
        file: td.path().join("second.log"),
        max_level: Level::INFO,
    })
    .err();
    assert!(err.is_some(), "a second global subscriber must be refused");
}
