//! InsurTrack CLI
//!
//! Command-line interface for tracking insurance policies

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use insurtrack::ai::{self, ExtractedPolicy, GenerativeModel};
use insurtrack::backup::{self, ExportFile};
use insurtrack::calendar;
use insurtrack::stats::{format_currency, upcoming_renewals};
use insurtrack::{
    compute_stats, Config, ContractDocument, FileStore, InsurancePolicy, PolicyDraft,
    PolicyStatus, PolicyStore, PolicyType, PremiumFrequency,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "insurtrack", version, about = "Track insurance policies, renewals and coverage")]
struct Cli {
    /// Directory holding the saved policy collection
    #[arg(long, global = true, env = "INSURTRACK_DATA_DIR", default_value = insurtrack::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Gemini API key used for analysis and document extraction
    #[arg(long, global = true, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name for AI requests
    #[arg(long, global = true, env = "INSURTRACK_MODEL", default_value = insurtrack::ai::gemini::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the model API
    #[arg(long, global = true, env = "INSURTRACK_API_BASE", default_value = insurtrack::ai::gemini::DEFAULT_API_BASE)]
    api_base: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all policies
    List {
        /// Print the raw JSON records
        #[arg(long)]
        json: bool,
    },
    /// Show one policy in detail
    Show { id: String },
    /// Add a new policy
    Add {
        #[command(flatten)]
        fields: PolicyFields,
        /// Pre-fill unset fields by analyzing a contract document
        #[arg(long, value_name = "FILE")]
        from_document: Option<PathBuf>,
        /// Also attach the analyzed document to the new policy
        #[arg(long, requires = "from_document")]
        attach: bool,
    },
    /// Change fields of an existing policy
    Edit {
        id: String,
        #[command(flatten)]
        fields: PolicyFields,
    },
    /// Delete a policy
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show portfolio statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Ask the AI for a narrative analysis of your coverage
    Analyze {
        /// Render bold markers and line breaks as HTML
        #[arg(long)]
        html: bool,
    },
    /// Extract policy details from a contract document
    Extract {
        file: PathBuf,
        /// Media type of the document (guessed from the extension by default)
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Attach a contract document to a policy
    Attach {
        id: String,
        file: PathBuf,
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Remove the attached contract from a policy
    Detach { id: String },
    /// Write a policy's attached contract to disk
    ContractSave {
        id: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Export all policies to a backup file
    Export {
        /// Write a spreadsheet listing instead of a JSON backup
        #[arg(long)]
        csv: bool,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Replace all policies with the contents of a backup file
    Import {
        file: PathBuf,
        #[arg(long, short)]
        yes: bool,
    },
    /// Write a calendar reminder one month before a policy expires
    Remind {
        id: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

/// Editable policy fields; all optional so the same set serves add and edit
#[derive(Debug, Args)]
struct PolicyFields {
    #[arg(long)]
    provider: Option<String>,
    #[arg(long = "number")]
    policy_number: Option<String>,
    #[arg(long = "type")]
    policy_type: Option<PolicyType>,
    #[arg(long)]
    premium: Option<f64>,
    #[arg(long = "frequency")]
    premium_frequency: Option<PremiumFrequency>,
    #[arg(long = "start", value_name = "YYYY-MM-DD")]
    start_date: Option<NaiveDate>,
    #[arg(long = "end", value_name = "YYYY-MM-DD")]
    end_date: Option<NaiveDate>,
    #[arg(long)]
    status: Option<PolicyStatus>,
    #[arg(long)]
    coverage_details: Option<String>,
    #[arg(long)]
    license_plate: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long = "insured-person")]
    insured_person_name: Option<String>,
}

impl From<PolicyFields> for PolicyDraft {
    fn from(f: PolicyFields) -> Self {
        PolicyDraft {
            provider: f.provider,
            policy_number: f.policy_number,
            policy_type: f.policy_type,
            premium: f.premium,
            premium_frequency: f.premium_frequency,
            start_date: f.start_date,
            end_date: f.end_date,
            status: f.status,
            coverage_details: f.coverage_details,
            license_plate: f.license_plate,
            address: f.address,
            insured_person_name: f.insured_person_name,
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config {
            data_dir: cli.data_dir.clone(),
            api_key: cli.api_key.clone(),
            model: cli.model.clone(),
            api_base: cli.api_base.clone(),
        }
    }
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn write_file(dir: &Path, file_name: &str, contents: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, contents).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

fn write_export(dir: &Path, file: &ExportFile) -> anyhow::Result<PathBuf> {
    write_file(dir, &file.file_name, file.contents.as_bytes())
}

fn read_document(file: &Path, mime_type: Option<String>) -> anyhow::Result<ContractDocument> {
    let bytes = fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contract".to_string());
    let mime_type = mime_type.unwrap_or_else(|| ai::guess_mime_type(&file_name).to_string());
    Ok(ContractDocument { file_name, mime_type, bytes })
}

fn find<'a>(store: &'a PolicyStore<FileStore>, id: &str) -> anyhow::Result<&'a InsurancePolicy> {
    match store.get(id) {
        Some(policy) => Ok(policy),
        None => bail!("no policy with id {:?}", id),
    }
}

fn print_table(policies: &[InsurancePolicy]) {
    println!(
        "{:<38} {:<16} {:<7} {:<14} {:>12} {:<14} {:<10} {:<10} {:<9}",
        "ID", "Provider", "Type", "Policy #", "Premium", "Frequency", "Start", "End", "Status"
    );
    println!("{}", "-".repeat(140));
    for p in policies {
        println!(
            "{:<38} {:<16} {:<7} {:<14} {:>12} {:<14} {:<10} {:<10} {:<9}",
            p.id,
            p.provider,
            p.policy_type,
            p.policy_number,
            format_currency(p.premium),
            p.premium_frequency,
            p.start_date,
            p.end_date,
            p.status,
        );
    }
}

fn print_policy(p: &InsurancePolicy) {
    println!("{} - {} Insurance", p.provider, p.policy_type);
    println!("  ID:        {}", p.id);
    println!("  Policy #:  {}", p.policy_number);
    println!("  Premium:   {} / {}", format_currency(p.premium), p.premium_frequency.as_str().replace('-', " "));
    if p.premium_frequency.is_recognized() {
        println!("  Annual:    {}", format_currency(p.annual_premium()));
    } else {
        println!("  Annual:    not counted (unrecognized billing frequency)");
    }
    println!("  Effective: {} - {}", p.start_date, p.end_date);
    println!("  Status:    {}", p.status);
    if let Some((label, value)) = p.type_detail() {
        println!("  {:<10} {}", format!("{}:", label), value);
    }
    if let Some(details) = &p.coverage_details {
        println!("  Details:   {}", details);
    }
    if p.has_contract() {
        println!(
            "  Contract:  {} ({})",
            p.contract_file_name.as_deref().unwrap_or("contract"),
            p.contract_mime_type.as_deref().unwrap_or("unknown type")
        );
    }
}

fn print_extracted(found: &ExtractedPolicy) -> anyhow::Result<()> {
    if found.is_empty() {
        println!("No policy details were found in the document.");
    } else {
        println!("{}", serde_json::to_string_pretty(found)?);
    }
    Ok(())
}

async fn extract_from_file<M: GenerativeModel + ?Sized>(
    model: &M,
    document: &ContractDocument,
) -> anyhow::Result<ExtractedPolicy> {
    Ok(ai::extract_policy_details(model, &document.bytes, &document.mime_type).await?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from(&cli);
    log::debug!("Using data directory {}", config.data_dir.display());

    let model = config.model_client();
    let mut store = PolicyStore::open(config.file_store());

    match cli.command {
        Command::List { json } => {
            if json {
                println!("{}", insurtrack::policy::encode_policies_pretty(store.policies())?);
            } else if store.is_empty() {
                println!("No policies yet. Add one with `insurtrack add`.");
            } else {
                print_table(store.policies());
            }
        }

        Command::Show { id } => print_policy(find(&store, &id)?),

        Command::Add { fields, from_document, attach } => {
            let mut draft = PolicyDraft::from(fields);
            let mut document = None;

            if let Some(path) = from_document {
                let doc = read_document(&path, None)?;
                let found = extract_from_file(&model, &doc).await?;
                draft.fill_missing_from(found.into());
                document = Some(doc);
            }

            let id = store.add(draft)?.id.clone();
            if attach {
                if let Some(doc) = document {
                    store.attach_contract(&id, doc)?;
                }
            }
            println!("Added policy:");
            print_policy(find(&store, &id)?);
        }

        Command::Edit { id, fields } => {
            let draft = PolicyDraft::from(fields);
            if draft.is_empty() {
                bail!("nothing to change; pass at least one field option");
            }
            print_policy(store.update(&id, draft)?);
        }

        Command::Delete { id, yes } => {
            let policy = find(&store, &id)?;
            let question = format!("Are you sure you want to delete {} {}?", policy.provider, policy.policy_number);
            if yes || confirm(&question)? {
                let removed = store.delete(&id)?;
                println!("Deleted {} ({})", removed.policy_number, removed.provider);
            } else {
                println!("Cancelled.");
            }
        }

        Command::Stats { json } => {
            let now = Utc::now();
            let stats = compute_stats(store.policies(), now);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total Policies:       {}", stats.total_policies);
                println!("Total Annual Premium: {}", format_currency(stats.annual_premium));
                println!("Upcoming Renewals:    {} (in next 30 days)", stats.upcoming_renewals);
                for p in upcoming_renewals(store.policies(), now) {
                    println!("  - {} {} ends {}", p.provider, p.policy_number, p.end_date);
                }
                if !stats.by_type.is_empty() {
                    println!("\nBy type:");
                    for row in &stats.by_type {
                        println!(
                            "  {:<7} {:>3} policies  {:>14} / year",
                            row.policy_type,
                            row.count,
                            format_currency(row.annual_premium)
                        );
                    }
                }
            }
        }

        Command::Analyze { html } => {
            println!("Reviewing your policies. This may take a moment...");
            let analysis = ai::analyze_coverage(&model, store.policies()).await?;
            if html {
                println!("{}", ai::render_markup(&analysis));
            } else {
                println!("{}", analysis);
            }
        }

        Command::Extract { file, mime_type } => {
            let doc = read_document(&file, mime_type)?;
            let found = extract_from_file(&model, &doc).await?;
            print_extracted(&found)?;
        }

        Command::Attach { id, file, mime_type } => {
            let doc = read_document(&file, mime_type)?;
            let policy = store.attach_contract(&id, doc)?;
            println!(
                "Attached {} to {}",
                policy.contract_file_name.as_deref().unwrap_or_default(),
                policy.policy_number
            );
        }

        Command::Detach { id } => {
            let policy = store.detach_contract(&id)?;
            println!("Removed contract from {}", policy.policy_number);
        }

        Command::ContractSave { id, out } => {
            let doc = store.contract(&id)?;
            let path = write_file(&out, &doc.file_name, &doc.bytes)?;
            println!("Contract written to {}", path.display());
        }

        Command::Export { csv, out } => {
            let today = Utc::now().date_naive();
            let file = if csv {
                backup::export_csv(store.policies(), today)?
            } else {
                backup::export_json(store.policies(), today)?
            };
            let path = write_export(&out, &file)?;
            println!("Exported {} policies to {}", store.len(), path.display());
        }

        Command::Import { file, yes } => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;

            let current = store.len();
            let approve = |incoming: &[InsurancePolicy]| {
                let question = format!(
                    "Importing will replace all {} current policies with {} from the file. Continue?",
                    current,
                    incoming.len()
                );
                yes || confirm(&question).unwrap_or_else(|e| {
                    log::warn!("Could not read confirmation: {}", e);
                    false
                })
            };

            match store.import_backup(&contents, approve)? {
                Some(count) => println!("Successfully imported {} policies.", count),
                None => println!("Import cancelled."),
            }
        }

        Command::Remind { id, out } => {
            let policy = find(&store, &id)?;
            let ics = calendar::reminder_ics(policy, Utc::now())?;
            let path = write_file(&out, calendar::REMINDER_FILE_NAME, ics.as_bytes())?;
            println!(
                "Reminder for {} set on {}; calendar file written to {}",
                policy.policy_number,
                calendar::reminder_date(policy.end_date)?,
                path.display()
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
