use std::path::PathBuf;

use clap::Parser;

use crate::sync::excludes::ExcludeSet;
use crate::sync::paths::clean_remote_path;

pub const DEFAULT_REMOTE_ROOT: &str = "0:/sys";
pub const DEFAULT_PASSWORD: &str = "reprap";
pub const DEFAULT_PORT: u16 = 80;

/// Back up the files of a Duet controller to a local directory.
#[derive(Debug, Clone, Parser)]
#[command(name = "duetbackup", version)]
pub struct Cli {
    /// Host name or IP address of the Duet
    #[arg(long, env = "DUET_DOMAIN")]
    pub domain: String,

    /// HTTP port of the Duet
    #[arg(long, env = "DUET_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory on the Duet to create a backup of
    #[arg(long, env = "DUET_DIR_TO_BACKUP", default_value = DEFAULT_REMOTE_ROOT)]
    pub dir_to_backup: String,

    /// Local output directory of the backup
    #[arg(long, env = "DUET_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Connection password
    #[arg(long, env = "DUET_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,

    /// Remove local files that have been deleted on the Duet
    #[arg(long, env = "DUET_REMOVE_LOCAL")]
    pub remove_local: bool,

    /// Exclude remote paths starting with this string (repeatable)
    #[arg(long = "exclude", value_name = "PREFIX")]
    pub excludes: Vec<String>,

    /// Log every file that is checked
    #[arg(short, long, env = "DUET_VERBOSE")]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub base_url: String,
    pub password: String,
    pub remote_root: String,
    pub out_dir: PathBuf,
    pub excludes: ExcludeSet,
    pub remove_local: bool,
    pub verbose: bool,
}

impl BackupConfig {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let domain = cli.domain.trim();
        if domain.is_empty() {
            anyhow::bail!("--domain must not be empty");
        }
        if cli.out_dir.as_os_str().is_empty() {
            anyhow::bail!("--out-dir must not be empty");
        }

        let out_dir = std::path::absolute(&cli.out_dir).unwrap_or(cli.out_dir);

        Ok(Self {
            base_url: format!("http://{domain}:{}", cli.port),
            password: cli.password,
            remote_root: clean_remote_path(&cli.dir_to_backup),
            out_dir,
            excludes: cli.excludes.iter().collect(),
            remove_local: cli.remove_local,
            verbose: cli.verbose,
        })
    }
}
