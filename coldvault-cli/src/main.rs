//! coldvault command-line client

use std::future::Future;
use std::process::ExitCode;

use clap::Parser;
use coldvault_client::{ClientError, UploadFailure};
use coldvault_core::CoreError;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, LogFormat};

const EXIT_FAILURE: u8 = 1;
const EXIT_VALIDATION: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_VALIDATION } else { 0 };
            // --help and --version land here too
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(cli.log_format);

    let cancel = CancellationToken::new();
    let listener = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            watch_interrupts(next_interrupt, cancel).await;
            std::process::exit(i32::from(EXIT_CANCELLED));
        }
    });

    let result = commands::run(cli, &cancel).await;
    // the command has reached a terminal state; stop listening
    listener.abort();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Initialize tracing on stderr, keeping stdout for command output
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coldvault=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wait for the next Ctrl+C or SIGTERM and name it
async fn next_interrupt() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    }
}

/// Cancel on the first interrupt; return on the second
async fn watch_interrupts<F, Fut>(mut interrupt: F, cancel: CancellationToken)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = &'static str>,
{
    let first = interrupt().await;
    warn!("Received {}, cancelling; repeat to exit immediately", first);
    cancel.cancel();

    let second = interrupt().await;
    error!("Received {} again, exiting without cleanup", second);
}

/// Map a failure onto the process exit code
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(failure) = cause.downcast_ref::<UploadFailure>() {
            return client_exit_code(&failure.error);
        }
        if let Some(client) = cause.downcast_ref::<ClientError>() {
            return client_exit_code(client);
        }
        if cause.is::<CoreError>() || cause.is::<std::io::Error>() {
            return EXIT_VALIDATION;
        }
    }
    EXIT_FAILURE
}

fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Cancelled => EXIT_CANCELLED,
        e if e.is_validation() => EXIT_VALIDATION,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldvault_client::{RemoteErrorKind, UploadStage};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_exit_codes() {
        let remote = ClientError::remote("DescribeVault", RemoteErrorKind::NotFound, "no vault");
        assert_eq!(exit_code(&anyhow::Error::new(remote)), EXIT_FAILURE);

        let invalid = ClientError::validation("empty archive");
        assert_eq!(exit_code(&anyhow::Error::new(invalid)), EXIT_VALIDATION);

        let core = CoreError::InvalidVaultName("a b".into());
        assert_eq!(exit_code(&anyhow::Error::new(core)), EXIT_VALIDATION);

        assert_eq!(exit_code(&anyhow::anyhow!("something else")), EXIT_FAILURE);
    }

    #[test]
    fn test_cancelled_upload_exit_code() {
        let failure = UploadFailure {
            stage: UploadStage::PartsUploading,
            error: ClientError::Cancelled,
            upload_id: Some("up-1".into()),
            abort: None,
        };
        assert_eq!(exit_code(&anyhow::Error::new(failure)), EXIT_CANCELLED);
    }

    #[test]
    fn test_upload_failure_cause_printed_once() {
        let failure = UploadFailure {
            stage: UploadStage::Completing,
            error: ClientError::remote("CompleteMultipartUpload", RemoteErrorKind::SizeMismatch, "bad size"),
            upload_id: Some("up-1".into()),
            abort: None,
        };
        let rendered = format!("{:#}", anyhow::Error::new(failure));
        assert_eq!(
            rendered,
            "upload failed while completing: CompleteMultipartUpload failed (size mismatch): bad size"
        );
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_second_ends_watch() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<&'static str>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let interrupt = move || {
            let rx = rx.clone();
            async move { rx.lock().await.recv().await.unwrap_or("closed channel") }
        };

        let cancel = CancellationToken::new();
        let watch = tokio::spawn(watch_interrupts(interrupt, cancel.clone()));

        tx.send("Ctrl+C").unwrap();
        cancel.cancelled().await;
        tokio::task::yield_now().await;
        assert!(!watch.is_finished());

        tx.send("Ctrl+C").unwrap();
        tokio::time::timeout(Duration::from_secs(5), watch)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::new(ClientError::Cancelled).context("uploading photos");
        assert_eq!(exit_code(&err), EXIT_CANCELLED);
    }
}
