//! `chatpane status`: show persisted state and whether the bridge is up.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::session::read_pending;
use crate::store::{FileStateStore, StateKey, StateStore};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn run(state_dir: &Path, bridge_url: &str) -> anyhow::Result<()> {
    let store = FileStateStore::new(state_dir);

    println!();
    println!("  chatpane v{}", env!("CARGO_PKG_VERSION"));
    for line in state_lines(&store) {
        println!("  {line}");
    }

    let health_url = format!("{}/health", bridge_url.trim_end_matches('/'));
    match check_health(&health_url).await {
        Some(body) => {
            let muted = body.get("muted").and_then(Value::as_bool).unwrap_or(false);
            println!("  Health: OK ({health_url}, muted: {muted})");
        }
        None => {
            println!("  Health: unreachable ({health_url})");
            println!();
            println!("  Bridge is not running.");
            println!("  Start with: chatpane");
        }
    }

    println!();
    Ok(())
}

fn state_lines(store: &FileStateStore) -> Vec<String> {
    let show = |key: StateKey| store.get(key).unwrap_or_else(|| "not set".to_string());
    let pending = match read_pending(store) {
        Some(marker) => format!("yes ({}s old)", marker.age().as_secs()),
        None => "no".to_string(),
    };
    vec![
        format!("State dir: {}", store.dir().display()),
        format!("Chat: {}", show(StateKey::ActiveChat)),
        format!("Pane: {}", show(StateKey::SelectedPane)),
        format!("Pending: {pending}"),
    ]
}

async fn check_health(url: &str) -> Option<Value> {
    let client = reqwest::Client::builder()
        .timeout(HEALTH_TIMEOUT)
        .build()
        .ok()?;
    let resp = client.get(url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.json().await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::now_ms;

    #[test]
    fn lists_persisted_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path());
        store.set(StateKey::ActiveChat, "111").unwrap();
        store.set(StateKey::Pending, &now_ms().to_string()).unwrap();

        let lines = state_lines(&store);
        assert_eq!(lines[1], "Chat: 111");
        assert_eq!(lines[2], "Pane: not set");
        assert!(lines[3].starts_with("Pending: yes"));
    }

    #[tokio::test]
    async fn health_probe_fails_when_nothing_listens() {
        assert!(check_health("http://127.0.0.1:9/health").await.is_none());
    }
}
