use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

const SECRETS: &[&str] = &[
    "CANVAS_API_URL",
    "CANVAS_API_TOKEN",
    "NOTION_API_TOKEN",
    "NOTION_DATABASE_ID_COURSES",
    "NOTION_DATABASE_ID_ASSIGNMENTS",
    "NOTION_DATABASE_ID_FILES",
    "NOTION_DATABASE_ID_ANNOUNCEMENTS",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
];

#[test]
fn help_describes_the_tool() {
    let mut cmd = Command::cargo_bin("canvas-sync").expect("Binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn run_without_secrets_fails_with_the_missing_variable() {
    let mut cmd = Command::cargo_bin("canvas-sync").expect("Binary exists");
    for key in SECRETS {
        cmd.env_remove(key);
    }
    cmd.current_dir(std::env::temp_dir());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("CANVAS_API_TOKEN"));
}

#[test]
fn missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("canvas-sync").expect("Binary exists");
    cmd.current_dir(std::env::temp_dir())
        .arg("--config")
        .arg("definitely-missing-canvas-sync.yaml");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
#[serial]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use canvas_sync::cli::{run, Cli};

    let cli = Cli {
        config: Some(std::path::PathBuf::from("dummy.yaml")),
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
