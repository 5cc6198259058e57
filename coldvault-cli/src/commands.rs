//! Command handlers

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use coldvault_client::{Client, ClientConfig, LogProgress, RetryPolicy, UploadReceipt};
use coldvault_core::{tree_hash_reader, AccountId, ArchivePlan, Sha256Hasher, TreeHash, VaultName};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::{Cli, Command, OutputFormat};

/// Run the parsed command to completion
pub async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let output = cli.output;
    let config = client_config(&cli)?;

    match cli.command {
        // offline, needs no credentials
        Command::TreeHash { file } => tree_hash(file, output).await,
        command => {
            let client = Client::connect(config).await;
            run_remote(&client, command, output, cancel).await
        }
    }
}

async fn run_remote(
    client: &Client,
    command: Command,
    output: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Command::ListVaults => {
            let vaults = client.list_vaults().await?;
            emit(output, &vaults, |vaults| {
                if vaults.is_empty() {
                    println!("No vaults");
                }
                for (i, vault) in vaults.iter().enumerate() {
                    println!("{} ({}/{})", vault.vault_name, i + 1, vaults.len());
                    println!("  archives: {}", vault.number_of_archives);
                    println!("  size:     {}", vault.size_in_bytes);
                }
            })
        }
        Command::DescribeVault(args) => {
            let vault = client.describe_vault(&vault_name(&args.vault_name)?).await?;
            emit(output, &vault, |vault| {
                println!("{}", vault.vault_name);
                println!("  created:  {}", vault.creation_date.as_deref().unwrap_or("-"));
                println!("  archives: {}", vault.number_of_archives);
                println!("  size:     {}", vault.size_in_bytes);
                println!("  inventory: {}", vault.last_inventory_date.as_deref().unwrap_or("-"));
            })
        }
        Command::ListJobs(args) => {
            let jobs = client.list_jobs(&vault_name(&args.vault_name)?).await?;
            emit(output, &jobs, |jobs| {
                if jobs.is_empty() {
                    println!("No jobs");
                }
                for (i, job) in jobs.iter().enumerate() {
                    let state = if job.completed { "done" } else { "pending" };
                    println!("[{}] {} ({}/{})", state, job.action, i + 1, jobs.len());
                    println!("  status:  {}", job.status_code.as_deref().unwrap_or("-"));
                    println!("  message: {}", job.status_message.as_deref().unwrap_or("-"));
                    println!("  job id:  {}", job.job_id);
                }
            })
        }
        Command::DeleteArchive { vault, archive_id } => {
            client
                .delete_archive(&vault_name(&vault.vault_name)?, &archive_id)
                .await?;
            emit(output, &Done::new("archive deleted", archive_id), |done| {
                println!("Deleted archive {}", done.id)
            })
        }
        Command::ListMultipartUploads(args) => {
            let uploads = client
                .list_multipart_uploads(&vault_name(&args.vault_name)?)
                .await?;
            emit(output, &uploads, |uploads| {
                if uploads.is_empty() {
                    println!("No open uploads");
                }
                for (i, upload) in uploads.iter().enumerate() {
                    println!(
                        "{} ({}/{})",
                        upload.archive_description.as_deref().unwrap_or("<no description>"),
                        i + 1,
                        uploads.len()
                    );
                    println!("  part size: {}", upload.part_size);
                    println!("  upload id: {}", upload.upload_id);
                }
            })
        }
        Command::AbortMultipartUpload { vault, upload_id } => {
            client
                .abort_multipart_upload(&vault_name(&vault.vault_name)?, &upload_id)
                .await?;
            emit(output, &Done::new("upload aborted", upload_id), |done| {
                println!("Aborted upload {}", done.id)
            })
        }
        Command::InitiateMultipartUpload {
            vault,
            archive_file,
            archive_description,
        } => {
            let vault = vault_name(&vault.vault_name)?;
            let result = client
                .upload_archive(
                    &vault,
                    &archive_file,
                    archive_description.as_deref(),
                    Arc::new(LogProgress::new()),
                    cancel,
                )
                .await;

            match result {
                Ok(receipt) => emit(output, &receipt, print_receipt),
                Err(failure) => {
                    if failure.left_open_upload() {
                        if let Some(upload_id) = &failure.upload_id {
                            error!(
                                upload_id = %upload_id,
                                "Upload may still be open; remove it with: coldvault abort-multipart-upload -v {} -i {}",
                                vault,
                                upload_id
                            );
                        }
                    }
                    Err(failure.into())
                }
            }
        }
        Command::TreeHash { file } => tree_hash(file, output).await,
    }
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let account_id = AccountId::new(&cli.account_id)?;
    let mut config = ClientConfig::new(account_id)
        .with_retry(RetryPolicy::default().with_max_attempts(cli.retries.saturating_add(1)));
    if let Some(region) = &cli.region {
        config = config.with_region(region);
    }
    if let Some(url) = &cli.endpoint_url {
        config = config.with_endpoint_url(url);
    }
    Ok(config)
}

fn vault_name(name: &str) -> Result<VaultName> {
    Ok(VaultName::new(name)?)
}

/// Acknowledgement for commands without a payload
#[derive(Debug, Serialize)]
struct Done {
    result: &'static str,
    id: String,
}

impl Done {
    fn new(result: &'static str, id: String) -> Self {
        Self { result, id }
    }
}

#[derive(Debug, Serialize)]
struct TreeHashReport {
    path: PathBuf,
    plan: ArchivePlan,
    tree_hash: TreeHash,
}

async fn tree_hash(path: PathBuf, output: OutputFormat) -> Result<()> {
    let report = tokio::task::spawn_blocking(move || hash_file(&path))
        .await
        .context("tree hash task failed")??;

    emit(output, &report, |report| {
        println!("{}", report.path.display());
        println!("  size:      {}", report.plan.total_size);
        println!("  part size: {}", report.plan.part_size);
        println!("  parts:     {}", report.plan.part_count);
        println!("  tree hash: {}", report.tree_hash);
    })
}

fn hash_file(path: &Path) -> Result<TreeHashReport> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let plan = ArchivePlan::for_size(file.metadata()?.len());
    let tree_hash = tree_hash_reader(&Sha256Hasher, BufReader::new(file))?;
    info!(path = %path.display(), %tree_hash, "Tree hash computed");

    Ok(TreeHashReport {
        path: path.to_path_buf(),
        plan,
        tree_hash,
    })
}

fn print_receipt(receipt: &UploadReceipt) {
    println!("Upload complete");
    println!("  archive id: {}", receipt.archive_id);
    println!("  location:   {}", receipt.location.as_deref().unwrap_or("-"));
    println!("  checksum:   {}", receipt.checksum);
    println!("  size:       {}", receipt.archive_size);
    println!("  parts:      {} x {}", receipt.part_count, receipt.part_size);
}

/// Write a result to stdout as JSON or through `text`
fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_hash_file_of_zero_filled_parts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 3 * 1024 * 1024]).unwrap();

        let report = hash_file(file.path()).unwrap();
        assert_eq!(report.plan.part_count, 3);
        assert_eq!(
            report.tree_hash.to_hex(),
            "ca6cc129a4514ec765de86a4e7a49adf44842c9cac213c383ebe4071271bdf21"
        );
    }

    #[test]
    fn test_hash_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_client_config_from_cli() {
        let cli = Cli::try_parse_from([
            "coldvault",
            "list-vaults",
            "-a",
            "123456789012",
            "-r",
            "eu-west-1",
            "--retries",
            "4",
        ])
        .unwrap();

        let config = client_config(&cli).unwrap();
        assert_eq!(config.account_id.as_str(), "123456789012");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_bad_account_id_rejected() {
        let cli = Cli::try_parse_from(["coldvault", "list-vaults", "-a", "not-an-account"]).unwrap();
        assert!(client_config(&cli).is_err());
    }
}
