//! Interface de terminal do flexmig: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`MigrationProgress`] imprime uma linha por
//! status observado enquanto o poller acompanha a migração.

use std::io::{self, Write};

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::poller::{PollOutcome, StatusObserver};
use crate::state_machine::{JobStatus, MigrationState, PollSummary};

/// Texto legível para um status de migração.
pub fn describe(status: &JobStatus) -> String {
    match &status.state {
        MigrationState::Deploying => "Deploying engines...".to_string(),
        MigrationState::NotAssigned => "Assigning...".to_string(),
        MigrationState::Waiting => "Waiting...".to_string(),
        MigrationState::Starting => "Starting...".to_string(),
        MigrationState::Restarting => "Restarting...".to_string(),
        MigrationState::InProgress => match status.bytes_processed {
            Some(bytes) => format!("IN_PROGRESS. Bytes processed {bytes}"),
            None => "IN_PROGRESS. Starting...".to_string(),
        },
        MigrationState::InProgressCanceling => "Canceling...".to_string(),
        MigrationState::Stopping => "STOPPING...".to_string(),
        MigrationState::Stopped => "STOPPED".to_string(),
        MigrationState::Canceled => "CANCELED".to_string(),
        MigrationState::Succeeded => match status.objects_failed {
            Some(failed) if failed > 0 => format!("DONE with {failed} FAILED objects"),
            _ => "DONE".to_string(),
        },
        MigrationState::Failed => "FAILED".to_string(),
        MigrationState::NoConnectionToEngine => "NO_CONNECTION_TO_ENGINE".to_string(),
        MigrationState::Unknown(raw) => format!("Unknown migration state {raw}"),
    }
}

/// Indicador visual de progresso para uma migração no terminal.
///
/// Cada status recebido vira uma linha permanente acima do spinner; o
/// resultado final aparece em verde (sucesso), vermelho (falha) ou
/// amarelo (cancelado / sucesso parcial). Quando o spinner está oculto
/// (stderr não é um terminal), as linhas vão direto para `out`.
pub struct MigrationProgress<W = io::Stdout> {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    out: W,
    green: Style,
    red: Style,
    yellow: Style,
}

impl MigrationProgress {
    /// Inicia o spinner para a migração `id`, escrevendo em stdout.
    pub fn start(id: i64) -> Self {
        let pb = ProgressBar::new_spinner();
        // O template é fixo; se falhar, fica o estilo padrão.
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Migration {id}: polling..."));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self::with_output(pb, io::stdout())
    }
}

impl<W: Write> MigrationProgress<W> {
    pub fn with_output(pb: ProgressBar, out: W) -> Self {
        Self {
            pb,
            out,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    // Linha permanente: acima do spinner se visível, senão direto em `out`.
    fn line(&mut self, text: String) {
        if self.pb.is_hidden() {
            // Falha de escrita (ex.: pipe fechado) não interrompe o polling.
            let _ = writeln!(self.out, "{text}");
        } else {
            self.pb.println(text);
        }
    }

    /// Finaliza o spinner e exibe o resultado final.
    pub fn complete(&mut self, outcome: &PollOutcome) {
        self.pb.finish_and_clear();
        let text = match outcome {
            PollOutcome::Finished(summary) if summary.final_status.is_clean_success() => format!(
                "  {} Migration {} succeeded",
                self.green.apply_to("✓"),
                summary.job_id
            ),
            PollOutcome::Finished(summary) => {
                let style = if summary.final_status.state == MigrationState::Succeeded {
                    &self.yellow
                } else {
                    &self.red
                };
                format!(
                    "  {} Migration {} finished: {}",
                    style.apply_to("✗"),
                    summary.job_id,
                    describe(&summary.final_status)
                )
            }
            PollOutcome::Cancelled { last_status, polls } => {
                let last = last_status
                    .as_ref()
                    .map(describe)
                    .unwrap_or_else(|| "no status yet".to_string());
                format!(
                    "  {} Polling cancelled after {polls} status checks (last: {last})",
                    self.yellow.apply_to("↻")
                )
            }
        };
        // Depois de finish_and_clear a barra está oculta; vai para `out`.
        let _ = writeln!(self.out, "{text}");
    }

    /// Encerra o spinner sem resultado (ex.: erro de polling).
    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

impl<W: Write> StatusObserver for MigrationProgress<W> {
    fn on_status(&mut self, status: &JobStatus) {
        self.line(format!("  {}", describe(status)));
        self.pb.set_message(status.state.to_string());
    }
}

/// Imprime o resumo do polling em JSON.
pub fn print_summary(summary: &PollSummary) {
    println!(
        "{}",
        serde_json::to_string_pretty(summary).unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_without_bytes_is_starting() {
        let status = JobStatus::new(MigrationState::InProgress);
        assert_eq!(describe(&status), "IN_PROGRESS. Starting...");
    }

    #[test]
    fn in_progress_reports_bytes() {
        let status = JobStatus::new(MigrationState::InProgress).with_bytes(1024);
        assert_eq!(describe(&status), "IN_PROGRESS. Bytes processed 1024");
    }

    #[test]
    fn success_mentions_failed_objects() {
        let clean = JobStatus::new(MigrationState::Succeeded).with_objects_failed(0);
        assert_eq!(describe(&clean), "DONE");

        let partial = JobStatus::new(MigrationState::Succeeded).with_objects_failed(4);
        assert_eq!(describe(&partial), "DONE with 4 FAILED objects");
    }

    #[test]
    fn unknown_state_is_described() {
        let status = JobStatus::new(MigrationState::from_wire("ARCHIVING"));
        assert_eq!(describe(&status), "Unknown migration state ARCHIVING");
    }

    fn hidden_progress() -> MigrationProgress<Vec<u8>> {
        MigrationProgress::with_output(ProgressBar::hidden(), Vec::new())
    }

    fn output(progress: &MigrationProgress<Vec<u8>>) -> String {
        String::from_utf8_lossy(&progress.out).into_owned()
    }

    #[test]
    fn hidden_spinner_still_prints_status_lines() {
        let mut progress = hidden_progress();
        assert!(progress.pb.is_hidden());

        progress.on_status(&JobStatus::new(MigrationState::Waiting));
        progress.on_status(&JobStatus::new(MigrationState::InProgress).with_bytes(2048));

        assert_eq!(
            output(&progress),
            "  Waiting...\n  IN_PROGRESS. Bytes processed 2048\n"
        );
    }

    #[test]
    fn cancelled_outcome_reports_last_status() {
        let mut progress = hidden_progress();
        progress.complete(&PollOutcome::Cancelled {
            last_status: Some(JobStatus::new(MigrationState::Starting)),
            polls: 3,
        });

        let out = output(&progress);
        assert!(out.contains("cancelled after 3 status checks"));
        assert!(out.contains("(last: Starting...)"));
    }

    #[test]
    fn every_known_state_has_a_line() {
        for state in MigrationState::KNOWN.iter() {
            let line = describe(&JobStatus::new(state.clone()));
            assert!(!line.is_empty());
            assert!(!line.starts_with("Unknown"));
        }
    }
}
