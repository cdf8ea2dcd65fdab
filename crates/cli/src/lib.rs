use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ctc_assistant::guide::{self, StatusTag, TestKind};
use ctc_assistant::vin::check_vin;
use ctc_assistant::{Assistant, ChatMode, GeminiClient, InlineImage, LatLng, DISPATCH_PHONE};
use ctc_history::{
    normalize_value, prefs, recent, session, HistoryCommand, HistoryController, HistoryManager,
    LookupKind, SortMode, Theme,
};
use ctc_protocol::serialize_json;
use ctc_store::FileStore;
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

pub mod command;
pub mod config;
mod render;

use command::CommandHandler;
use config::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "ctc")]
#[command(about = "Clean Truck Check compliance coach", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Data directory (overrides CTC_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Maximum lookups kept per history (overrides CTC_HISTORY_CAP)
    #[arg(long, global = true)]
    cap: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a compliance lookup and print the status page link
    Check(CheckArgs),

    /// Show lookup history for the active identity
    History(HistoryArgs),

    /// Clear lookup history for the active identity
    Clear,

    /// Sign in as a fleet identity (email)
    Login(IdentityArgs),

    /// Create a fleet identity and sign in
    Register(IdentityArgs),

    /// Sign out; history falls back to the shared list
    Logout,

    /// Show the active identity and preferences
    Whoami(JsonFlag),

    /// Show or change the display theme
    Theme(ThemeArgs),

    /// Ask the compliance assistant
    Ask(AskArgs),

    /// List recently asked questions
    Recent,

    /// Find the county for a ZIP code and who to call for testing
    #[command(name = "find-tester")]
    FindTester(FindTesterArgs),

    /// Read a VIN from a photo
    Scan(ScanArgs),

    /// Read engine family and model year from an emissions label photo
    #[command(name = "engine-tag")]
    EngineTag(ImageArgs),

    /// Describe what a photo or short clip of a component shows about compliance
    Analyze(AnalyzeArgs),

    /// Print the pre-test checklist for an OVI (smoke) or OBD test
    Checklist(ChecklistArgs),

    /// Explain a status tag from a compliance notice
    Decode(DecodeArgs),

    /// Execute a JSON Command API request
    Command(CommandArgs),
}

#[derive(Args)]
struct JsonFlag {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// VIN, entity id or TRUCRS id
    value: String,

    #[arg(long, value_enum, default_value_t = KindFlag::Vin)]
    kind: KindFlag,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// Case-insensitive substring filter
    #[arg(long, short = 's', default_value = "")]
    search: String,

    #[arg(long, value_enum, default_value_t = SortFlag::Newest)]
    sort: SortFlag,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IdentityArgs {
    email: String,

    /// Move lookups made while signed out into this identity's history
    #[arg(long)]
    adopt: bool,
}

#[derive(Args)]
struct ThemeArgs {
    #[arg(value_enum)]
    theme: Option<ThemeFlag>,
}

#[derive(Args)]
struct AskArgs {
    question: String,

    #[arg(long, value_enum, default_value_t = ModeFlag::Standard)]
    mode: ModeFlag,

    /// Attach a photo to the question
    #[arg(long)]
    image: Option<PathBuf>,

    /// Latitude for maps mode
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude for maps mode
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,
}

#[derive(Args)]
struct FindTesterArgs {
    zip: String,
}

#[derive(Args)]
struct ScanArgs {
    image: PathBuf,

    /// Record the detected VIN as a lookup
    #[arg(long)]
    confirm: bool,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ImageArgs {
    image: PathBuf,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Photo or video of the component
    media: PathBuf,

    /// Question to ask instead of the default compliance review
    #[arg(long)]
    prompt: Option<String>,
}

#[derive(Args)]
struct ChecklistArgs {
    /// Test to prepare for (ovi, smoke or obd); both when omitted
    test: Option<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DecodeArgs {
    /// Tag as printed, e.g. NON-COMPLIANCE; all tags when omitted
    tag: Option<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON payload (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing JSON payload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum KindFlag {
    Vin,
    Entity,
    Trucrs,
    Owner,
}

impl KindFlag {
    const fn as_domain(self) -> LookupKind {
        match self {
            KindFlag::Vin => LookupKind::Vin,
            KindFlag::Entity | KindFlag::Owner => LookupKind::Entity,
            KindFlag::Trucrs => LookupKind::Trucrs,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SortFlag {
    Newest,
    Oldest,
    Value,
}

impl SortFlag {
    const fn as_domain(self) -> SortMode {
        match self {
            SortFlag::Newest => SortMode::Newest,
            SortFlag::Oldest => SortMode::Oldest,
            SortFlag::Value => SortMode::Value,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum ThemeFlag {
    Light,
    Dark,
    Toggle,
}

#[derive(Copy, Clone, ValueEnum)]
enum ModeFlag {
    Standard,
    Search,
    Maps,
    Thinking,
}

impl ModeFlag {
    const fn as_domain(self) -> ChatMode {
        match self {
            ModeFlag::Standard => ChatMode::Standard,
            ModeFlag::Search => ChatMode::Search,
            ModeFlag::Maps => ChatMode::Maps,
            ModeFlag::Thinking => ChatMode::Thinking,
        }
    }
}

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout is reserved for JSON when a command produces it
    let json_output = match &cli.command {
        Commands::Command(_) => true,
        Commands::Check(args) => args.json,
        Commands::History(args) => args.json,
        Commands::Whoami(args) => args.json,
        Commands::Scan(args) => args.json,
        Commands::EngineTag(args) => args.json,
        Commands::Checklist(args) => args.json,
        Commands::Decode(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = Settings::load(&Overrides {
        data_dir: cli.data_dir.clone(),
        cap: cli.cap,
    })?;
    log::debug!("Using data directory {}", settings.data_dir.display());
    let store = FileStore::open(&settings.data_dir).with_context(|| {
        format!(
            "Failed to open data directory {}",
            settings.data_dir.display()
        )
    })?;

    match cli.command {
        Commands::Check(args) => run_check(args, store, &settings)?,
        Commands::History(args) => run_history(args, store, &settings)?,
        Commands::Clear => run_clear(store, &settings)?,
        Commands::Login(args) => run_sign_in(args, store, &settings, false)?,
        Commands::Register(args) => run_sign_in(args, store, &settings, true)?,
        Commands::Logout => run_logout(store)?,
        Commands::Whoami(args) => run_whoami(args, store, &settings)?,
        Commands::Theme(args) => run_theme(args, store)?,
        Commands::Ask(args) => run_ask(args, store, &settings).await?,
        Commands::Recent => run_recent(store)?,
        Commands::FindTester(args) => run_find_tester(args, &settings).await?,
        Commands::Scan(args) => run_scan(args, store, &settings).await?,
        Commands::EngineTag(args) => run_engine_tag(args, &settings).await?,
        Commands::Analyze(args) => run_analyze(args, &settings).await?,
        Commands::Checklist(args) => run_checklist(args)?,
        Commands::Decode(args) => run_decode(args)?,
        Commands::Command(args) => run_command(args, store, &settings)?,
    }

    Ok(())
}

fn controller(store: FileStore, settings: &Settings) -> HistoryController<FileStore> {
    HistoryController::new(HistoryManager::new(store, settings.history))
}

fn assistant(settings: &Settings) -> Result<Assistant<GeminiClient>> {
    let client =
        GeminiClient::new(settings.gemini.clone()).context("Failed to build HTTP client")?;
    if !client.has_api_key() {
        log::debug!("No GEMINI_API_KEY configured; assistant runs offline");
    }
    Ok(Assistant::new(client))
}

fn run_check(args: CheckArgs, store: FileStore, settings: &Settings) -> Result<()> {
    let kind = args.kind.as_domain();
    if normalize_value(&args.value).is_none() {
        anyhow::bail!("Nothing to look up: the value is empty");
    }
    if kind == LookupKind::Vin {
        if let Err(issue) = check_vin(&args.value) {
            log::warn!("{issue}; recording it anyway");
        }
    }
    let mut controller = controller(store, settings);
    let history = controller.dispatch(HistoryCommand::RecordLookup {
        value: args.value,
        kind,
    });
    let Some(recorded) = history.first() else {
        anyhow::bail!("Lookup was not recorded");
    };

    if args.json {
        let out = json!({
            "recorded": recorded,
            "url": recorded.lookup_url(),
            "bucket": controller.manager().bucket().to_string(),
            "history": history,
        });
        print_stdout(&serialize_json(&out, false)?)?;
    } else {
        print_stdout(&format!(
            "Recorded {} {}\nCheck status: {}",
            recorded.kind,
            recorded.value,
            recorded.lookup_url()
        ))?;
    }
    Ok(())
}

fn run_history(args: HistoryArgs, store: FileStore, settings: &Settings) -> Result<()> {
    let mut controller = controller(store, settings);
    controller.dispatch(HistoryCommand::SetSort(args.sort.as_domain()));
    let visible = controller.dispatch(HistoryCommand::SetFilter(args.search));
    let total = controller.manager().history().len();

    if args.json {
        let out = json!({
            "bucket": controller.manager().bucket().to_string(),
            "total": total,
            "search": controller.view().search().trim(),
            "sort": controller.view().sort(),
            "history": visible,
        });
        print_stdout(&serialize_json(&out, false)?)?;
    } else {
        log::info!("History: {}", controller.manager().bucket());
        print_stdout(&render::history_table(&visible, total))?;
    }
    Ok(())
}

fn run_clear(store: FileStore, settings: &Settings) -> Result<()> {
    let mut controller = controller(store, settings);
    let bucket = controller.manager().bucket();
    controller.dispatch(HistoryCommand::Clear);
    print_stdout(&format!("Cleared {bucket} history"))
}

fn run_sign_in(
    args: IdentityArgs,
    mut store: FileStore,
    settings: &Settings,
    register: bool,
) -> Result<()> {
    let outcome = if register {
        session::register(&mut store, &args.email)?
    } else {
        session::login(&mut store, &args.email)?
    };
    let mut manager = HistoryManager::new(store, settings.history);
    let history = if args.adopt {
        manager.adopt_global_history()
    } else {
        manager.history()
    };
    let verb = if outcome.created {
        "Created and signed in as"
    } else {
        "Signed in as"
    };
    print_stdout(&format!(
        "{verb} {} ({} lookups in history)",
        outcome.identity,
        history.len()
    ))
}

fn run_logout(mut store: FileStore) -> Result<()> {
    match session::logout(&mut store)? {
        Some(identity) => print_stdout(&format!("Signed out {identity}")),
        None => print_stdout("Not signed in"),
    }
}

fn run_whoami(args: JsonFlag, store: FileStore, settings: &Settings) -> Result<()> {
    let manager = HistoryManager::new(store, settings.history);
    let identity = session::active_identity(manager.store());
    let theme = prefs::load_theme(manager.store());
    if args.json {
        let out = json!({
            "identity": identity,
            "bucket": manager.bucket().to_string(),
            "theme": theme,
            "known_identities": session::known_identities(manager.store()),
            "data_dir": settings.data_dir,
        });
        print_stdout(&serialize_json(&out, false)?)
    } else {
        print_stdout(&format!(
            "Identity: {}\nHistory: {}\nTheme: {theme}",
            identity.as_deref().unwrap_or("(signed out)"),
            manager.bucket()
        ))
    }
}

fn run_theme(args: ThemeArgs, mut store: FileStore) -> Result<()> {
    let theme = match args.theme {
        None => prefs::load_theme(&store),
        Some(ThemeFlag::Toggle) => prefs::toggle_theme(&mut store)?,
        Some(ThemeFlag::Light) => set_theme(&mut store, Theme::Light)?,
        Some(ThemeFlag::Dark) => set_theme(&mut store, Theme::Dark)?,
    };
    print_stdout(theme.as_str())
}

fn set_theme(store: &mut FileStore, theme: Theme) -> Result<Theme> {
    prefs::save_theme(store, theme)?;
    Ok(theme)
}

async fn run_ask(args: AskArgs, mut store: FileStore, settings: &Settings) -> Result<()> {
    let image = args
        .image
        .as_deref()
        .map(InlineImage::from_path)
        .transpose()
        .context("Failed to read image")?;
    let location = args
        .lat
        .zip(args.lng)
        .map(|(latitude, longitude)| LatLng {
            latitude,
            longitude,
        });

    recent::save_recent_question(&mut store, &args.question);

    let reply = assistant(settings)?
        .ask(&args.question, args.mode.as_domain(), &[], location, image)
        .await;
    if reply.offline {
        log::warn!("Assistant offline; showing a saved answer");
    }
    print_stdout(&render::chat_reply(&reply))
}

fn run_recent(store: FileStore) -> Result<()> {
    let questions = recent::recent_questions(&store);
    if questions.is_empty() {
        return print_stdout("No recent questions.");
    }
    let lines: Vec<String> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {q}", i + 1))
        .collect();
    print_stdout(&lines.join("\n"))
}

async fn run_find_tester(args: FindTesterArgs, settings: &Settings) -> Result<()> {
    let county = assistant(settings)?.lookup_county(&args.zip).await?;
    print_stdout(&format!(
        "{county}: certified mobile testers dispatch statewide. Call {DISPATCH_PHONE}."
    ))
}

async fn run_scan(args: ScanArgs, store: FileStore, settings: &Settings) -> Result<()> {
    let image = InlineImage::from_path(&args.image).context("Failed to read image")?;
    let scan = assistant(settings)?
        .extract_vin(image)
        .await
        .context("VIN scan failed")?;

    if scan.is_detected() {
        if let Err(issue) = check_vin(&scan.vin) {
            log::warn!("Scanned VIN looks wrong: {issue}");
        }
    }

    let recorded = if args.confirm && scan.is_detected() {
        let mut controller = controller(store, settings);
        controller
            .dispatch(HistoryCommand::RecordLookup {
                value: scan.vin.clone(),
                kind: LookupKind::Vin,
            })
            .into_iter()
            .next()
    } else {
        if args.confirm {
            log::warn!("No VIN detected; nothing recorded");
        }
        None
    };

    if args.json {
        let out = json!({
            "scan": scan,
            "detected": scan.is_detected(),
            "recorded": recorded,
        });
        return print_stdout(&serialize_json(&out, false)?);
    }
    let mut text = render::vin_scan(&scan);
    if let Some(item) = recorded {
        text.push_str(&format!("\nRecorded. Check status: {}", item.lookup_url()));
    }
    print_stdout(&text)
}

async fn run_engine_tag(args: ImageArgs, settings: &Settings) -> Result<()> {
    let image = InlineImage::from_path(&args.image).context("Failed to read image")?;
    let tag = assistant(settings)?
        .extract_engine_tag(image)
        .await
        .context("Engine tag scan failed")?;
    if args.json {
        print_stdout(&serialize_json(&tag, false)?)
    } else {
        print_stdout(&render::engine_tag(&tag))
    }
}

async fn run_analyze(args: AnalyzeArgs, settings: &Settings) -> Result<()> {
    let media = InlineImage::from_path(&args.media).context("Failed to read media")?;
    let analysis = assistant(settings)?
        .analyze_media(media, args.prompt.as_deref())
        .await
        .context("Analysis failed")?;
    print_stdout(&analysis)
}

fn run_checklist(args: ChecklistArgs) -> Result<()> {
    let lists: Vec<&guide::Checklist> = match &args.test {
        Some(raw) => vec![guide::checklist(
            raw.parse::<TestKind>().map_err(anyhow::Error::msg)?,
        )],
        None => TestKind::ALL.into_iter().map(guide::checklist).collect(),
    };
    if args.json {
        return print_stdout(&serialize_json(&lists, false)?);
    }
    let text: Vec<String> = lists.into_iter().map(render::checklist).collect();
    print_stdout(&text.join("\n\n"))
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let tags = match &args.tag {
        Some(raw) => vec![raw.parse::<StatusTag>().map_err(anyhow::Error::msg)?],
        None => StatusTag::ALL.to_vec(),
    };
    if args.json {
        let out: Vec<_> = tags
            .iter()
            .map(|tag| json!({ "tag": tag, "meaning": tag.meaning() }))
            .collect();
        return print_stdout(&serialize_json(&out, false)?);
    }
    print_stdout(&render::status_tags(&tags))
}

fn run_command(args: CommandArgs, store: FileStore, settings: &Settings) -> Result<()> {
    let raw = read_payload(&args)?;
    let mut handler = CommandHandler::new(store, settings.history);
    let response = handler.execute_raw(&raw);

    print_stdout(&serialize_json(&response, args.pretty)?)?;

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}
