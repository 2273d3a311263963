//! PeerLens CLI: browse analyses and questions, run generations.
//!
//! Usage:
//!   peerlens analyses list [--search text] [--status all|draft|in-progress|completed] [--sort date|name|status]
//!   peerlens analyses generate <name> --description d --period "Q1 2024" --warehouse primary --internal-doc f --competitor "Bank=doc1,doc2"
//!   peerlens questions ask <question> --analysis <name> --dashboard "Cash Flow" --report "Operating Cash Flow"
//!   peerlens questions status <id> in-progress
//!   peerlens seed [--db path]

use clap::{Parser, Subcommand};
use peerlens::{
    AnalysisId, AnalysisQuery, AnalysisSortKey, CollectionStore, Config, Dashboard,
    GenerationOrchestrator, GenerationOutcome, MemoryStore, OpenStore, PipelineState,
    QuestionDraft, QuestionId, QuestionQuery, QuestionSortKey, QuestionStatus, ResearchMetrics,
    ResearchResponse, SessionRegistry, SqliteStore, Stage, StatusFilter, ValidationError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "peerlens",
    version,
    about = "Comparative bank analysis: build, generate and browse peer analyses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to a YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use a throwaway in-memory store preloaded with demo data
    #[arg(long, global = true)]
    memory: bool,
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and generate analyses
    Analyses {
        #[command(subcommand)]
        action: AnalysisAction,
    },
    /// Browse, ask and answer market questions
    Questions {
        #[command(subcommand)]
        action: QuestionAction,
    },
    /// Load the demo analyses and questions into the database
    Seed,
}

#[derive(Subcommand)]
enum AnalysisAction {
    /// List analyses
    List {
        /// Case-insensitive text matched against name and description
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "date")]
        sort: AnalysisSortKey,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show one analysis
    Show {
        id: String,
    },
    /// Build an analysis and run the generation pipeline over it
    Generate {
        /// Analysis name
        name: String,
        #[arg(long)]
        description: String,
        /// Reporting period label, e.g. "Q1 2024"
        #[arg(long)]
        period: String,
        /// Data warehouse id: primary, reporting or risk
        #[arg(long)]
        warehouse: String,
        /// Internal document to attach (repeatable)
        #[arg(long = "internal-doc")]
        internal_docs: Vec<String>,
        /// Competitor as "Name=doc1,doc2" (repeatable)
        #[arg(long = "competitor")]
        competitors: Vec<String>,
        /// Override the per-stage delay
        #[arg(long)]
        stage_delay_ms: Option<u64>,
    },
}

#[derive(Subcommand)]
enum QuestionAction {
    /// List market questions
    List {
        /// Text matched against question, analysis name and report
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "date")]
        sort: QuestionSortKey,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Submit a new question against a dashboard report
    Ask {
        question: String,
        /// Name of the analysis the question is about
        #[arg(long)]
        analysis: String,
        /// Dashboard label, e.g. "Balance Sheet"
        #[arg(long)]
        dashboard: String,
        /// Report label within the dashboard, e.g. "Capital Ratios"
        #[arg(long)]
        report: String,
    },
    /// Record an analyst response to a question
    Respond {
        id: String,
        text: String,
        #[arg(long)]
        analyst: String,
        /// Confidence between 0 and 1
        #[arg(long)]
        confidence: Option<f64>,
        /// Attachment to reference (repeatable)
        #[arg(long = "attachment")]
        attachments: Vec<String>,
    },
    /// Move a question to another status
    Status {
        id: String,
        /// draft, pending, in-progress or answered
        status: QuestionStatus,
    },
    /// Question counts by status and the most active analysts
    Metrics,
    /// Print the dashboard and report taxonomy
    Taxonomy,
}

fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_store(cli: &Cli, config: &Config) -> Result<Arc<dyn CollectionStore>, String> {
    if cli.memory {
        let store =
            MemoryStore::with_seed_data().map_err(|e| format!("Failed to seed store: {}", e))?;
        return Ok(Arc::new(store));
    }
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

/// Split `Name=doc1,doc2` into the competitor name and its documents
fn parse_competitor(spec: &str) -> (&str, Vec<&str>) {
    match spec.split_once('=') {
        Some((name, docs)) => (name, docs.split(',').collect()),
        None => (spec, Vec::new()),
    }
}

fn page_window(page: usize, page_size: usize) -> (usize, usize) {
    (page.saturating_sub(1) * page_size, page_size)
}

fn cmd_analyses_list(
    store: &dyn CollectionStore,
    query: AnalysisQuery,
    page: usize,
    page_size: usize,
) -> i32 {
    let analyses = match store.list_analyses() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let (offset, limit) = page_window(page, page_size);
    let result = query.offset(offset).limit(limit).execute(&analyses);
    if result.total_count == 0 {
        println!("No analyses match.");
        return 0;
    }
    println!(
        "{:<36}  {:<40}  {:<8}  {:<12}  {:>10}",
        "ID", "NAME", "PERIOD", "STATUS", "CREATED"
    );
    println!("{}", "-".repeat(114));
    for a in &result.items {
        let status = match a.progress {
            Some(p) => format!("{} {}%", a.status.as_str(), p),
            None => a.status.as_str().to_string(),
        };
        println!(
            "{:<36}  {:<40}  {:<8}  {:<12}  {:>10}",
            a.id.as_str(),
            a.name,
            a.period.label(),
            status,
            a.created_at.format("%Y-%m-%d").to_string()
        );
    }
    println!(
        "page {} of {} ({} matching)",
        page,
        result.pages(page_size),
        result.total_count
    );
    0
}

fn cmd_analyses_show(store: &dyn CollectionStore, id: &str) -> i32 {
    match store.get_analysis(&AnalysisId::from_string(id)) {
        Ok(Some(a)) => {
            println!("{} ({})", a.name, a.id);
            println!("  period:      {}", a.period);
            println!("  status:      {}", a.status);
            println!("  created:     {}", a.created_at.to_rfc3339());
            println!("  competitors: {}", a.competitors.join(", "));
            if !a.description.is_empty() {
                println!("  {}", a.description);
            }
            0
        }
        Ok(None) => {
            eprintln!("Error: analysis '{}' not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

struct GenerateArgs {
    name: String,
    description: String,
    period: String,
    warehouse: String,
    internal_docs: Vec<String>,
    competitors: Vec<String>,
    stage_delay: Duration,
}

fn render_progress(state: &PipelineState) {
    match state {
        PipelineState::Idle => {}
        PipelineState::Running {
            stage_index,
            progress,
        } => match Stage::at(*stage_index) {
            Some(stage) => println!("[{:>3}%] {}", progress, stage.agent_name()),
            None => println!("[{:>3}%] all stages finished", progress),
        },
        PipelineState::Completed(a) => println!("[100%] stored analysis {}", a.id),
        PipelineState::Abandoned => println!("generation abandoned"),
    }
}

fn cmd_analyses_generate(store: Arc<dyn CollectionStore>, args: GenerateArgs) -> i32 {
    let registry = Arc::new(SessionRegistry::new());
    let session = registry.open();

    let filled = registry.edit(&session, |state| -> Result<(), ValidationError> {
        state.set_name(args.name.as_str());
        state.set_description(args.description.as_str());
        state.select_period(&args.period)?;
        state.select_data_warehouse(&args.warehouse)?;
        state.attach_internal_documents(args.internal_docs.iter().map(String::as_str));
        for spec in &args.competitors {
            let (name, docs) = parse_competitor(spec);
            if !state.add_competitor(name) {
                eprintln!("Warning: ignoring competitor '{}'", name);
                continue;
            }
            if let Some(index) = state.competitor_index(name.trim()) {
                state.attach_competitor_documents(index, docs);
            }
        }
        Ok(())
    });
    match filled {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            return 1;
        }
        None => {
            eprintln!("Error: session vanished before it was filled");
            return 1;
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start runtime: {}", e);
            return 1;
        }
    };

    runtime.block_on(async move {
        let orchestrator =
            Arc::new(GenerationOrchestrator::new(store).with_stage_delay(args.stage_delay));
        let mut updates = orchestrator.subscribe();
        let printer = tokio::spawn(async move {
            loop {
                let state = updates.borrow_and_update().clone();
                render_progress(&state);
                if state.is_terminal() || updates.changed().await.is_err() {
                    break;
                }
            }
        });

        let mut run = {
            let registry = registry.clone();
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { registry.generate(&session, &orchestrator).await })
        };
        let joined = tokio::select! {
            joined = &mut run => joined,
            _ = tokio::signal::ctrl_c() => {
                registry.close(&session);
                run.await
            }
        };

        // Dropping the last sender ends the printer loop
        drop(orchestrator);
        printer.await.ok();

        match joined {
            Ok(Ok(GenerationOutcome::Completed(analysis))) => {
                println!("Generated '{}' ({})", analysis.name, analysis.id);
                0
            }
            Ok(Ok(GenerationOutcome::Abandoned { stage_index })) => {
                eprintln!(
                    "Generation abandoned after {} of {} stages",
                    stage_index,
                    Stage::COUNT
                );
                130
            }
            Ok(Err(e)) => {
                eprintln!("Error: {}", e);
                1
            }
            Err(e) => {
                eprintln!("Error: generation task failed: {}", e);
                1
            }
        }
    })
}

fn cmd_questions_list(
    store: &dyn CollectionStore,
    query: QuestionQuery,
    page: usize,
    page_size: usize,
) -> i32 {
    let questions = match store.list_market_questions() {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let (offset, limit) = page_window(page, page_size);
    let result = query.offset(offset).limit(limit).execute(&questions);
    if result.total_count == 0 {
        println!("No questions match.");
        return 0;
    }
    for q in &result.items {
        println!("{}  [{}]  {}", q.id, q.status, q.question);
        println!(
            "    {} / {} / {}  ({} responses)",
            q.analysis_name,
            q.dashboard,
            q.report,
            q.responses.len()
        );
    }
    println!(
        "page {} of {} ({} matching)",
        page,
        result.pages(page_size),
        result.total_count
    );
    0
}

fn cmd_questions_ask(
    store: &dyn CollectionStore,
    question: &str,
    analysis: &str,
    dashboard: &str,
    report: &str,
) -> i32 {
    let mut draft = QuestionDraft::new();
    draft.set_question(question);
    draft.set_analysis(analysis);
    if let Err(e) = draft.select_dashboard_label(dashboard) {
        eprintln!("Error: {}", e);
        return 1;
    }
    if let Err(e) = draft.select_report_label(report) {
        eprintln!("Error: {}", e);
        let offered: Vec<_> = draft.available_reports().iter().map(|r| r.label()).collect();
        eprintln!("Reports under '{}': {}", dashboard, offered.join(", "));
        return 1;
    }
    let question = match draft.submit() {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match store.insert_market_question(&question) {
        Ok(()) => {
            println!("Submitted question {}", question.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_questions_respond(
    store: &dyn CollectionStore,
    id: &str,
    response: ResearchResponse,
) -> i32 {
    match store.add_response(&QuestionId::from_string(id), response) {
        Ok(q) => {
            println!(
                "Recorded response on {} ({} total, now {})",
                q.id,
                q.responses.len(),
                q.status
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_questions_status(store: &dyn CollectionStore, id: &str, status: QuestionStatus) -> i32 {
    match store.set_question_status(&QuestionId::from_string(id), status) {
        Ok(q) => {
            println!("Question {} is now {}", q.id, q.status);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_questions_metrics(store: &dyn CollectionStore) -> i32 {
    let questions = match store.list_market_questions() {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let metrics = ResearchMetrics::from_questions(&questions);
    println!("Questions: {}", metrics.total_questions);
    for status in QuestionStatus::ALL {
        println!("  {:<12} {}", status.as_str(), metrics.count(status));
    }
    if metrics.top_analysts.is_empty() {
        return 0;
    }
    println!("Analysts:");
    for analyst in &metrics.top_analysts {
        match analyst.avg_confidence {
            Some(avg) => println!(
                "  {}  {} responses, avg confidence {:.0}%",
                analyst.name,
                analyst.responses,
                avg * 100.0
            ),
            None => println!("  {}  {} responses", analyst.name, analyst.responses),
        }
    }
    0
}

fn cmd_questions_taxonomy() -> i32 {
    for dashboard in Dashboard::ALL {
        println!("{}", dashboard);
        for report in dashboard.reports() {
            println!("  - {}", report);
        }
    }
    0
}

fn cmd_seed(store: &dyn CollectionStore) -> i32 {
    match peerlens::seed_store(store) {
        Ok(inserted) => {
            println!("Seeded {} demo items", inserted);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level, cli.log_json);

    if let Commands::Questions {
        action: QuestionAction::Taxonomy,
    } = cli.command
    {
        std::process::exit(cmd_questions_taxonomy());
    }

    let store = match open_store(&cli, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Analyses { action } => match action {
            AnalysisAction::List {
                search,
                status,
                sort,
                page,
                page_size,
            } => {
                let query = AnalysisQuery::new()
                    .search(search)
                    .with_status(status)
                    .sort_by(sort);
                cmd_analyses_list(
                    store.as_ref(),
                    query,
                    page.max(1),
                    page_size.unwrap_or(config.page_size).max(1),
                )
            }
            AnalysisAction::Show { id } => cmd_analyses_show(store.as_ref(), &id),
            AnalysisAction::Generate {
                name,
                description,
                period,
                warehouse,
                internal_docs,
                competitors,
                stage_delay_ms,
            } => {
                let stage_delay = stage_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| config.stage_delay());
                cmd_analyses_generate(
                    store,
                    GenerateArgs {
                        name,
                        description,
                        period,
                        warehouse,
                        internal_docs,
                        competitors,
                        stage_delay,
                    },
                )
            }
        },
        Commands::Questions { action } => match action {
            QuestionAction::List {
                search,
                sort,
                page,
                page_size,
            } => {
                let query = QuestionQuery::new().search(search).sort_by(sort);
                cmd_questions_list(
                    store.as_ref(),
                    query,
                    page.max(1),
                    page_size.unwrap_or(config.page_size).max(1),
                )
            }
            QuestionAction::Ask {
                question,
                analysis,
                dashboard,
                report,
            } => cmd_questions_ask(store.as_ref(), &question, &analysis, &dashboard, &report),
            QuestionAction::Respond {
                id,
                text,
                analyst,
                confidence,
                attachments,
            } => {
                let mut response = ResearchResponse::new(analyst, text);
                if let Some(c) = confidence {
                    response = response.with_confidence(c);
                }
                for attachment in attachments {
                    response = response.with_attachment(attachment);
                }
                cmd_questions_respond(store.as_ref(), &id, response)
            }
            QuestionAction::Status { id, status } => {
                cmd_questions_status(store.as_ref(), &id, status)
            }
            QuestionAction::Metrics => cmd_questions_metrics(store.as_ref()),
            QuestionAction::Taxonomy => cmd_questions_taxonomy(),
        },
        Commands::Seed => cmd_seed(store.as_ref()),
    };
    std::process::exit(code);
}
