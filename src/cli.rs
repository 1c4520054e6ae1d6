//! Interface de linha de comando do flexmig baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, watch,
//! providers, login) e flags globais que sobrescrevem `flexmig.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// flexmig: inicia e acompanha migrações de armazenamento em nuvem.
#[derive(Debug, Parser)]
#[command(name = "flexmig", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./flexmig.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// URL base da API de gerenciamento.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Intervalo entre consultas de status, em milissegundos.
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Falhas consecutivas toleradas antes de desistir.
    #[arg(long, global = true)]
    pub max_failures: Option<u32>,

    /// Continua consultando quando o serviço perde a conexão com o engine.
    #[arg(long, global = true, default_value_t = false)]
    pub keep_polling_without_engine: bool,

    /// Imprime o resumo final em JSON.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Registra as contas, inicia a migração e acompanha até o fim.
    Run,

    /// Acompanha uma migração existente.
    Watch {
        /// Id da migração.
        id: i64,
    },

    /// Lista os provedores de armazenamento suportados.
    Providers,

    /// Troca usuário e senha por um token da API e o imprime.
    Login,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_watch_subcommand() {
        let cli = Cli::parse_from(["flexmig", "watch", "42"]);
        match cli.command {
            Command::Watch { id } => assert_eq!(id, 42),
            _ => panic!("expected Watch command"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "flexmig",
            "--base-url",
            "https://example.test",
            "--interval-ms",
            "1000",
            "--max-failures",
            "5",
            "--keep-polling-without-engine",
            "--verbose",
            "run",
        ]);
        assert!(matches!(cli.command, Command::Run));
        assert_eq!(cli.base_url.as_deref(), Some("https://example.test"));
        assert_eq!(cli.interval_ms, Some(1000));
        assert_eq!(cli.max_failures, Some(5));
        assert!(cli.keep_polling_without_engine);
        assert!(cli.verbose);
    }

    #[test]
    fn cli_flags_after_subcommand() {
        let cli = Cli::parse_from(["flexmig", "providers", "--config", "other.toml", "--json"]);
        assert!(matches!(cli.command, Command::Providers));
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
        assert!(cli.json);
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
