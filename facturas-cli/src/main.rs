use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use facturas_client::{Pipeline, UpdateFields};
use facturas_core::aggregate::{
    category_key, collaborator_key, month_range, project_key, time_series_by_group,
    totals_by_group,
};
use facturas_core::{dates, Decision, Filter, NormalizedInvoice, Status};

mod config;
mod report;

#[derive(Parser, Debug)]
#[command(name = "facturas", version, about = "Gestión de facturas de gastos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config.toml under ~/.facturas/
    InitConfig,

    /// Upload a document and run it through analysis
    Upload {
        /// Path to the PDF/image to submit
        file: PathBuf,

        /// Project id to classify under
        #[arg(long)]
        proyect: String,

        /// Category key to classify under
        #[arg(long)]
        category: String,
    },

    /// List invoices, optionally filtered
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one invoice in full
    Show { id: String },

    /// Edit extracted fields on an invoice
    Update {
        id: String,

        #[arg(long)]
        ruc: Option<String>,

        #[arg(long)]
        serie: Option<String>,

        #[arg(long)]
        correlativo: Option<String>,

        /// Issue date; re-encoded to ISO for the backend
        #[arg(long)]
        fecha_emision: Option<String>,

        #[arg(long)]
        moneda: Option<String>,

        #[arg(long)]
        monto: Option<String>,

        #[arg(long)]
        proyect: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Global status counts plus the filtered list
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Approve a pending invoice
    Approve {
        id: String,

        /// Who is approving
        #[arg(long)]
        actor: String,

        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Reject a pending invoice (a reason is mandatory)
    Reject {
        id: String,

        #[arg(long)]
        actor: String,

        #[arg(long)]
        reason: String,
    },

    /// Delete an invoice record
    Delete { id: String },

    /// Aggregated reports over the filtered collection
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Reference data
    Refs {
        #[command(subcommand)]
        command: RefsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Totals per project (zero-sum groups omitted)
    ByProject {
        #[command(flatten)]
        filter: FilterArgs,

        /// Write the report as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Totals per category (zero-sum groups omitted)
    ByCategory {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Month-by-month totals per collaborator
    Collaborators {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum RefsCommand {
    Categories,
    Projects,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Project id or display name
    #[arg(long)]
    proyect: Option<String>,

    /// Category key or display name
    #[arg(long)]
    category: Option<String>,

    /// pending, approved or rejected (any casing)
    #[arg(long)]
    status: Option<String>,

    /// Start date, e.g. 01/03/2025 or 2025-03-01
    #[arg(long)]
    from: Option<String>,

    /// End date, inclusive
    #[arg(long)]
    to: Option<String>,

    /// Minimum amount, inclusive
    #[arg(long)]
    min: Option<f64>,

    /// Maximum amount, inclusive
    #[arg(long)]
    max: Option<f64>,
}

impl FilterArgs {
    fn into_filter(self) -> Result<Filter> {
        let mut filter = Filter::new();
        if let Some(p) = self.proyect {
            filter = filter.with_proyect(p);
        }
        if let Some(c) = self.category {
            filter = filter.with_category(c);
        }
        if let Some(s) = &self.status {
            match Status::parse(s) {
                Some(status) => filter = filter.with_status(status),
                None => bail!("estado desconocido: {s} (pending/approved/rejected)"),
            }
        }
        if let Some(from) = &self.from {
            let d = dates::parse_flexible(from)
                .with_context(|| format!("fecha inválida: {from}"))?;
            filter = filter.with_date_from(d);
        }
        if let Some(to) = &self.to {
            let d = dates::parse_flexible(to)
                .with_context(|| format!("fecha inválida: {to}"))?;
            filter = filter.with_date_to(d);
        }
        if let Some(min) = self.min {
            filter = filter.with_amount_min(min);
        }
        if let Some(max) = self.max {
            filter = filter.with_amount_max(max);
        }
        Ok(filter)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Command::InitConfig) {
        return config::init_config();
    }

    let cfg = config::load_config()?;
    let mut pipeline = Pipeline::new(cfg.to_api_config());
    pipeline.refresh_references().await?;

    match cli.command {
        Command::InitConfig => unreachable!("handled above"),

        Command::Upload { file, proyect, category } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "documento.pdf".to_string());

            let invoice = pipeline
                .submit_document(bytes, &name, &proyect, &category, |pct| {
                    println!("  subiendo... {pct}%");
                })
                .await?;

            println!("Factura creada: {}", invoice.id);
            print_invoice(&invoice);
        }

        Command::List { filter } => {
            let invoices = pipeline.load_invoices(&filter.into_filter()?).await?;
            println!("{} facturas", invoices.len());
            for inv in &invoices {
                println!(
                    "{} | {} | {:<12} | {:<25} | {:<20} | {}",
                    inv.id, inv.date, inv.status_label, inv.project_name, inv.category_name,
                    inv.total
                );
            }
        }

        Command::Show { id } => {
            let raw = pipeline.invoices().by_id(&id).await?;
            print_invoice(&facturas_core::normalize(&raw, pipeline.reference_maps()));
        }

        Command::Update { id, ruc, serie, correlativo, fecha_emision, moneda, monto, proyect, category } => {
            let fields = UpdateFields {
                ruc,
                serie,
                correlativo,
                fecha_emision,
                moneda,
                monto_total: monto,
                proyect,
                category,
            };
            let raw = pipeline.invoices().update(&id, fields).await?;
            // Resync rather than trusting the patched echo alone.
            let invoices = pipeline.load_invoices(&Filter::new()).await?;
            println!("Factura {} actualizada.", raw.id);
            print_counts(&invoices);
        }

        Command::Stats { filter } => {
            let overview = pipeline.load_overview(&filter.into_filter()?).await?;
            println!(
                "{} facturas en total ({} pendientes, {} aprobadas, {} rechazadas)",
                overview.total, overview.pending, overview.approved, overview.rejected
            );
            println!("{} en la vista filtrada", overview.invoices.len());
            for inv in &overview.invoices {
                println!(
                    "{} | {} | {:<12} | {:<25} | {}",
                    inv.id, inv.date, inv.status_label, inv.project_name, inv.total
                );
            }
        }

        Command::Approve { id, actor, yes } => {
            if !yes && !confirm(&format!("¿Aprobar la factura {id}?"))? {
                println!("Cancelado.");
                return Ok(());
            }
            let invoices = pipeline
                .decide(&id, Decision::Approve { actor })
                .await?;
            println!("Factura {id} aprobada.");
            print_counts(&invoices);
        }

        Command::Reject { id, actor, reason } => {
            let invoices = pipeline
                .decide(&id, Decision::Reject { actor, reason })
                .await?;
            println!("Factura {id} rechazada.");
            print_counts(&invoices);
        }

        Command::Delete { id } => {
            pipeline.invoices().delete(&id).await?;
            println!("Factura {id} eliminada.");
        }

        Command::Report { command } => run_report(&pipeline, command).await?,

        Command::Refs { command } => match command {
            RefsCommand::Categories => {
                for c in pipeline.references().list_categories().await? {
                    println!("{:<25} {}", c.key, c.name);
                }
            }
            RefsCommand::Projects => {
                for p in pipeline.references().list_projects().await? {
                    println!("{:<25} {}", p.id, p.name);
                }
            }
        },
    }

    Ok(())
}

async fn run_report(pipeline: &Pipeline, command: ReportCommand) -> Result<()> {
    match command {
        ReportCommand::ByProject { filter, csv } => {
            let filter = filter.into_filter()?;
            let invoices = pipeline.load_invoices(&filter).await?;
            let totals = totals_by_group(&invoices, project_key);
            report::render_totals("Totales por proyecto", &totals);
            if let Some(path) = csv {
                report::write_totals_csv(&path, &totals)?;
                println!("CSV: {}", path.display());
            }
        }
        ReportCommand::ByCategory { filter, csv } => {
            let filter = filter.into_filter()?;
            let invoices = pipeline.load_invoices(&filter).await?;
            let totals = totals_by_group(&invoices, category_key);
            report::render_totals("Totales por categoría", &totals);
            if let Some(path) = csv {
                report::write_totals_csv(&path, &totals)?;
                println!("CSV: {}", path.display());
            }
        }
        ReportCommand::Collaborators { filter, csv } => {
            let filter = filter.into_filter()?;
            let invoices = pipeline.load_invoices(&filter).await?;
            let months = month_range(filter.date_from, filter.date_to, &invoices);
            let series = time_series_by_group(&invoices, collaborator_key, &months);
            report::render_series("Totales por colaborador y mes", &series);
            if let Some(path) = csv {
                report::write_series_csv(&path, &series)?;
                println!("CSV: {}", path.display());
            }
        }
    }
    Ok(())
}

fn print_invoice(inv: &NormalizedInvoice) {
    println!("id:          {}", inv.id);
    println!("fecha:       {}", inv.date);
    println!("estado:      {}", inv.status_label);
    println!("proyecto:    {}", inv.project_name);
    println!("categoría:   {}", inv.category_name);
    println!("proveedor:   {}", inv.supplier);
    println!("RUC:         {}", inv.ruc);
    println!("documento:   {} {}-{}", inv.document_type, inv.serie, inv.correlativo);
    println!("emisión:     {}", inv.issue_date);
    println!("total:       {}", inv.total);
    if let Some(by) = &inv.approved_by {
        println!("aprobada por: {by}");
    }
    if let Some(by) = &inv.rejected_by {
        let reason = inv.rejection_reason.as_deref().unwrap_or("-");
        println!("rechazada por: {by} ({reason})");
    }
    if let Some(url) = &inv.file {
        println!("archivo:     {url}");
    }
}

fn print_counts(invoices: &[NormalizedInvoice]) {
    let count = |s: Status| invoices.iter().filter(|i| i.status == s).count();
    println!(
        "Colección recargada: {} facturas ({} pendientes, {} aprobadas, {} rechazadas)",
        invoices.len(),
        count(Status::Pending),
        count(Status::Approved),
        count(Status::Rejected),
    );
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [s/N] ");
    io::stdout().flush().ok();
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "s" || answer == "si" || answer == "y")
}
