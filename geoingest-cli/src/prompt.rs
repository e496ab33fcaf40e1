//! Confirmation des chargements proches des limites

use std::io::{BufRead, Write};

use futures::future::BoxFuture;
use futures::FutureExt;
use geoingest::{ConfirmLoad, DatasetBudgetStats};
use tracing::warn;

/// Demande confirmation sur l'entrée standard (`y`/`yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl ConfirmLoad for StdinConfirm {
    fn confirm<'a>(&'a self, stats: &'a DatasetBudgetStats, label: &'a str) -> BoxFuture<'a, bool> {
        let question = format!(
            "{} is large ({} features, {} vertices). Continue? [y/N] ",
            label, stats.feature_count, stats.vertex_count
        );

        async move {
            let answer = tokio::task::spawn_blocking(move || {
                let mut stdout = std::io::stdout();
                let _ = write!(stdout, "{}", question);
                let _ = stdout.flush();

                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line).map(|_| line)
            })
            .await;

            match answer {
                Ok(Ok(line)) => is_yes(&line),
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read confirmation, declining");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "Confirmation task failed, declining");
                    false
                }
            }
        }
        .boxed()
    }
}

/// Accepte sans demander (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl ConfirmLoad for AutoConfirm {
    fn confirm<'a>(&'a self, _stats: &'a DatasetBudgetStats, _label: &'a str) -> BoxFuture<'a, bool> {
        futures::future::ready(true).boxed()
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "o" | "oui")
}
