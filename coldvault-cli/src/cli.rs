//! Command-line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// coldvault: manage cold storage vaults and upload archives to them.
///
/// Credentials come from the usual AWS provider chain (environment,
/// shared profile, instance role).
#[derive(Parser, Debug)]
#[command(name = "coldvault", author, version, about, long_about = None)]
pub struct Cli {
    /// Account owning the vaults; `-` means the credentials' own account
    #[arg(short = 'a', long, global = true, env = "GLACIER_ACCOUNT_ID", default_value = "-")]
    pub account_id: String,

    /// Service region
    #[arg(short = 'r', long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Send requests to this endpoint instead of the regional one
    #[arg(long, global = true, env = "GLACIER_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Result format on stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Extra attempts per part after a throttled or dropped request
    #[arg(long, global = true, default_value_t = 2)]
    pub retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the jobs of a vault
    #[command(alias = "listJobs")]
    ListJobs(VaultArgs),

    /// Delete an archive from a vault
    #[command(alias = "deleteArchive")]
    DeleteArchive {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short = 'i', long)]
        archive_id: String,
    },

    /// List the account's vaults
    #[command(alias = "listVaults")]
    ListVaults,

    /// Show a vault's metadata
    #[command(alias = "describeVault")]
    DescribeVault(VaultArgs),

    /// Upload a file as a new archive in parts
    #[command(alias = "initiateMultipartUpload")]
    InitiateMultipartUpload {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short = 'f', long, value_name = "PATH")]
        archive_file: PathBuf,

        #[arg(short = 'd', long)]
        archive_description: Option<String>,
    },

    /// List uploads that were started but neither completed nor aborted
    #[command(alias = "listMultipartUploads")]
    ListMultipartUploads(VaultArgs),

    /// Abort an open upload
    #[command(alias = "abortMultipartUpload")]
    AbortMultipartUpload {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short = 'i', long)]
        upload_id: String,
    },

    /// Print the part plan and tree hash of a local file without uploading
    TreeHash {
        #[arg(value_name = "PATH")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct VaultArgs {
    #[arg(short = 'v', long)]
    pub vault_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let cli = Cli::try_parse_from([
            "coldvault",
            "initiate-multipart-upload",
            "-v",
            "photos",
            "-f",
            "/tmp/2024.tar",
            "-d",
            "2024 photos",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.retries, 2);
        match cli.command {
            Command::InitiateMultipartUpload {
                vault,
                archive_file,
                archive_description,
            } => {
                assert_eq!(vault.vault_name, "photos");
                assert_eq!(archive_file, PathBuf::from("/tmp/2024.tar"));
                assert_eq!(archive_description.as_deref(), Some("2024 photos"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_camel_case_aliases() {
        let cli = Cli::try_parse_from(["coldvault", "abortMultipartUpload", "-v", "photos", "-i", "up-1"]).unwrap();
        assert!(matches!(cli.command, Command::AbortMultipartUpload { ref upload_id, .. } if upload_id == "up-1"));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["coldvault", "list-vaults", "-a", "123456789012", "--retries", "0"]).unwrap();
        assert_eq!(cli.account_id, "123456789012");
        assert_eq!(cli.retries, 0);
        assert!(matches!(cli.command, Command::ListVaults));
    }

    #[test]
    fn test_missing_vault_is_usage_error() {
        let err = Cli::try_parse_from(["coldvault", "describe-vault"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
