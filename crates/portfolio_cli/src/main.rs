//! Command-line front end for the portfolio contact form.
//!
//! # Responsibility
//! - Act as the UI layer: each command drives `ContactoService` through a
//!   terminal `ContactoView`.
//! - Resolve settings from flags, environment variables and `.env`.

mod view;

use clap::{Args, Parser, Subcommand};
use log::info;
use portfolio_core::config::{
    DEFAULT_QUOTA_BYTES, DEFAULT_STORAGE_KEY, DEFAULT_USAGE_WARNING_RATIO,
};
use portfolio_core::db::{open_db, DbError};
use portfolio_core::{
    default_log_level, init_logging, ConfigError, ContactoId, ContactoPatch, ContactoRepository,
    ContactoService, ContactoView, FormData, KeyValueStore, KvContactoRepository, LoggingError,
    MemoryStore, Notification, PortfolioConfig, ServiceError, SqliteStore, StoreError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use view::{print_detail, TerminalView};

#[derive(Parser, Debug)]
#[command(
    name = "portfolio",
    version,
    about = "Manage contact-form submissions of the portfolio site"
)]
struct Cli {
    /// SQLite file holding the contact store.
    #[arg(long, env = "PORTFOLIO_DB", default_value = "portfolio.sqlite3")]
    db: PathBuf,

    /// Use a throwaway in-memory store instead of `--db`.
    #[arg(long)]
    memory: bool,

    /// Key under which the contact blob is stored.
    #[arg(long, env = "PORTFOLIO_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    storage_key: String,

    /// Byte quota enforced on the store.
    #[arg(long, env = "PORTFOLIO_QUOTA_BYTES", default_value_t = DEFAULT_QUOTA_BYTES)]
    quota_bytes: u64,

    /// Usage share that triggers the storage warning.
    #[arg(long, env = "PORTFOLIO_WARNING_RATIO", default_value_t = DEFAULT_USAGE_WARNING_RATIO)]
    warning_ratio: f64,

    #[arg(long, env = "PORTFOLIO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "PORTFOLIO_LOG_DIR")]
    log_dir: Option<String>,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a new contact form.
    Submit(SubmitArgs),
    /// List stored contacts.
    List,
    /// Show every field of one contact.
    Show { id: String },
    /// Replace message fields of one contact.
    Edit(EditArgs),
    /// Delete one contact (asks for confirmation).
    Delete { id: String },
    /// Delete every stored contact (asks for confirmation).
    Clear,
    /// Write the collection as JSON to a file or stdout.
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Merge a JSON export into the stored collection.
    Import { file: PathBuf },
    /// Show storage utilization.
    Stats,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    nombre: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    telefono: Option<String>,
    #[arg(long)]
    asunto: Option<String>,
    #[arg(long)]
    mensaje: Option<String>,
    /// Email, Phone or WhatsApp.
    #[arg(long, default_value = "Email")]
    preferencia: String,
    #[arg(long)]
    acepta_terminos: bool,
}

impl SubmitArgs {
    fn to_form(&self) -> FormData {
        let mut form = FormData::new().with("preferenciaContacto", self.preferencia.as_str());
        let optional = [
            ("nombre", &self.nombre),
            ("email", &self.email),
            ("telefono", &self.telefono),
            ("asunto", &self.asunto),
            ("mensaje", &self.mensaje),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                form.set(name, value.as_str());
            }
        }
        if self.acepta_terminos {
            form.set("aceptaTerminos", "on");
        }
        form
    }
}

#[derive(Args, Debug)]
struct EditArgs {
    id: String,
    #[arg(long)]
    asunto: Option<String>,
    /// Pass an empty string to clear the message.
    #[arg(long)]
    mensaje: Option<String>,
    #[arg(long)]
    telefono: Option<String>,
    #[arg(long)]
    preferencia: Option<String>,
}

impl EditArgs {
    fn to_patch(&self) -> ContactoPatch {
        ContactoPatch {
            asunto: self.asunto.clone(),
            mensaje: self.mensaje.clone(),
            telefono: self.telefono.clone(),
            preferencia_contacto: self.preferencia.clone(),
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Store(StoreError),
    InvalidId(String),
    Io { path: PathBuf, source: std::io::Error },
    /// Feedback already shown by the view.
    Service(ServiceError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "failed to open database: {err}"),
            Self::Store(err) => write!(f, "failed to open store: {err}"),
            Self::InvalidId(value) => write!(f, "invalid contact id `{value}`"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Service(err) => Some(err),
            Self::InvalidId(_) => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Service(_)) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("portfolio: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = PortfolioConfig {
        storage_key: cli.storage_key.clone(),
        quota_bytes: cli.quota_bytes,
        usage_warning_ratio: cli.warning_ratio,
    };
    config.validate().map_err(CliError::Config)?;

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(CliError::Logging)?;
    }

    if cli.memory {
        info!("event=cli_start module=cli status=ok store=memory");
        return execute(MemoryStore::with_quota(config.quota_bytes), &config, &cli);
    }

    info!("event=cli_start module=cli status=ok store=sqlite");
    let conn = open_db(&cli.db).map_err(CliError::Db)?;
    let store = SqliteStore::try_new(&conn)
        .map_err(CliError::Store)?
        .with_quota(Some(config.quota_bytes));
    execute(store, &config, &cli)
}

fn execute<S: KeyValueStore>(
    store: S,
    config: &PortfolioConfig,
    cli: &Cli,
) -> Result<(), CliError> {
    let repo = KvContactoRepository::from_config(store, config);
    let mut service = ContactoService::new(repo, TerminalView::new(cli.yes))
        .with_usage_warning_ratio(config.usage_warning_ratio);

    match &cli.command {
        Command::Submit(args) => {
            let contacto = service.submit(&args.to_form())?;
            println!("id: {}", contacto.id());
        }
        Command::List => {
            service.refresh()?;
        }
        Command::Show { id } => {
            let id = parse_id(id)?;
            let found = service
                .repo()
                .get_by_id(&id)
                .map_err(ServiceError::from)
                .and_then(|found| found.ok_or_else(|| ServiceError::NotFound(id.clone())));
            match found {
                Ok(contacto) => print_detail(&contacto),
                Err(err) => return Err(report_failure(service.view_mut(), err)),
            }
        }
        Command::Edit(args) => {
            let id = parse_id(&args.id)?;
            service.edit(&id, &args.to_patch())?;
        }
        Command::Delete { id } => {
            let id = parse_id(id)?;
            service.delete(&id)?;
        }
        Command::Clear => {
            service.clear_all()?;
        }
        Command::Export { output } => {
            let json = service.export()?;
            match output {
                Some(path) => std::fs::write(path, json).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?,
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(file).map_err(|source| CliError::Io {
                path: file.clone(),
                source,
            })?;
            service.import(&json)?;
        }
        Command::Stats => {
            let report = match service.storage_report() {
                Ok(report) => report,
                Err(err) => return Err(report_failure(service.view_mut(), err)),
            };
            let usage = report.usage;
            println!("contactos:  {}", usage.record_count);
            println!("usado:      {} bytes", usage.used_bytes);
            println!("cuota:      {} bytes", usage.quota_bytes);
            println!("uso:        {:.1}%", usage.percent());
            if report.near_quota {
                println!("aviso:      considera migrar a un almacenamiento con más capacidad");
            }
        }
    }
    Ok(())
}

fn report_failure(view: &mut TerminalView, err: ServiceError) -> CliError {
    view.notify(Notification::error(err.user_message()));
    CliError::Service(err)
}

fn parse_id(value: &str) -> Result<ContactoId, CliError> {
    ContactoId::parse(value).ok_or_else(|| CliError::InvalidId(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn submit_args_build_form_with_wire_names() {
        let cli = Cli::try_parse_from([
            "portfolio",
            "--memory",
            "submit",
            "--nombre",
            "Ana Ruiz",
            "--email",
            "ana@x.com",
            "--asunto",
            "consulta",
            "--acepta-terminos",
        ])
        .unwrap();

        let Command::Submit(args) = cli.command else {
            panic!("expected submit command");
        };
        let form = args.to_form();
        assert_eq!(form.get("nombre"), Some("Ana Ruiz"));
        assert_eq!(form.get("preferenciaContacto"), Some("Email"));
        assert!(form.is_checked("aceptaTerminos"));
        assert_eq!(form.get("telefono"), None);
    }

    #[test]
    fn yes_flag_is_global() {
        let cli = Cli::try_parse_from(["portfolio", "delete", "abc123", "--yes"]).unwrap();
        assert!(cli.yes);
        assert!(matches!(cli.command, Command::Delete { ref id } if id == "abc123"));
    }
}
