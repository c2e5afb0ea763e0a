use std::fmt;

use chrono::{Days, NaiveDate};
use hifz_core::model::{
    BasicEntry, GradeValue, JadeedDraft, PageEntry, PageNumber, ReviewDraft, Section, Stage,
    StudentId, WindowConfig,
};
use services::{Clock, EntryService, HifzServices, StudentOverview};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStudentId { raw: String },
    InvalidWindow { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStudentId { raw } => write!(f, "invalid --student value: {raw}"),
            ArgsError::InvalidWindow { raw } => {
                write!(f, "invalid --window value (expected a length >= 1): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- report   [--db <sqlite_url>] [--student <id>] [--window <n>] [--json]");
    eprintln!("  cargo run -p app -- students [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- seed     [--db <sqlite_url>] [--student <id>] [--name <name>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:hifz.sqlite3");
    eprintln!("  --student 1");
    eprintln!("  --window 10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  HIFZ_DB_URL, HIFZ_STUDENT_ID, HIFZ_WINDOW, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Report,
    Students,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "report" => Some(Self::Report),
            "students" => Some(Self::Students),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    student_id: StudentId,
    window: WindowConfig,
    json: bool,
    name: String,
}

fn parse_window(raw: &str) -> Result<WindowConfig, ArgsError> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .and_then(|len| WindowConfig::custom(len).ok())
        .ok_or_else(|| ArgsError::InvalidWindow {
            raw: raw.to_string(),
        })
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("HIFZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:hifz.sqlite3".into()), normalize_sqlite_url);
        let mut student_id = std::env::var("HIFZ_STUDENT_ID")
            .ok()
            .and_then(|value| value.parse::<StudentId>().ok())
            .unwrap_or_else(|| StudentId::new(1));
        let mut window = std::env::var("HIFZ_WINDOW")
            .ok()
            .and_then(|value| parse_window(&value).ok())
            .unwrap_or_default();
        let mut json = false;
        let mut name = "Demo Student".to_string();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--student" if cmd != Command::Students => {
                    let value = require_value(args, "--student")?;
                    student_id = value
                        .parse::<StudentId>()
                        .map_err(|_| ArgsError::InvalidStudentId { raw: value.clone() })?;
                }
                "--window" if cmd == Command::Report => {
                    let value = require_value(args, "--window")?;
                    window = parse_window(&value)?;
                }
                "--json" if cmd == Command::Report => json = true,
                "--name" if cmd == Command::Seed => {
                    name = require_value(args, "--name")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            student_id,
            window,
            json,
            name,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

fn print_report(overview: &StudentOverview) {
    let student = &overview.student;
    println!("{} (id {})", student.name(), student.id());
    if let Some(teacher) = student.teacher_name() {
        println!("Teacher: {teacher}");
    }
    println!();

    match overview.jadeed {
        Some(position) => {
            let marker = if position.is_approximate() { " (approximate)" } else { "" };
            println!(
                "Jadeed: page {}{marker}, {:.1}% of the mushaf",
                position.page, overview.completion_percent
            );
        }
        None => println!("Jadeed: no pages recorded yet"),
    }
    println!(
        "Jadeed progress: {} pages + {} ayahs over {} sessions",
        overview.jadeed_progress.pages,
        overview.jadeed_progress.ayahs,
        overview.jadeed_progress.sessions
    );

    match overview.juzhali_range {
        Some(range) => println!(
            "Juzhali window ({} pages): {}-{}",
            overview.window_length, range.start, range.end
        ),
        None => println!("Juzhali window: empty"),
    }

    if overview.murajaat_pages.is_empty() {
        println!("Murajaat: nothing eligible yet");
    } else {
        println!("Murajaat:");
        for (section, pages) in &overview.murajaat_pages {
            let first = pages.first().copied().unwrap_or_default();
            let last = pages.last().copied().unwrap_or_default();
            println!("  section {section}: pages {first}-{last} ({} pages)", pages.len());
        }
    }
    println!();

    println!("Health:");
    for stage in &overview.stages {
        match stage.health {
            Some(health) => println!(
                "  {:<9} {:>5.1}%  {}  ({} records)",
                stage.stage.as_str(),
                health.score,
                health.tier.message(),
                stage.records
            ),
            None => println!("  {:<9} no data", stage.stage.as_str()),
        }
    }
    if let Some(health) = overview.juzhali_window_health {
        println!(
            "  window    {:>5.1}%  {}",
            health.score,
            health.tier.message()
        );
    }

    if !overview.data_format.has_detailed() {
        println!();
        println!("Detailed mistake analytics unavailable: only marks-sheet records exist.");
        return;
    }

    if !overview.weak_sections.is_empty() {
        println!();
        println!("Weak sections:");
        for weak in &overview.weak_sections {
            println!("  section {}: {} major mistakes", weak.section, weak.major);
        }
    }
    if !overview.weak_pages.is_empty() {
        println!();
        println!("Weak pages:");
        for weak in &overview.weak_pages {
            println!("  page {}: {} major mistakes", weak.page, weak.major);
        }
    }

    if !overview.juzhali_page_map.is_empty() {
        println!();
        println!("Juzhali pages:");
        for (page, tier) in &overview.juzhali_page_map {
            println!("  {page:>3}  {tier}");
        }
    }
}

//
// ─── SEED ──────────────────────────────────────────────────────────────────────
//

const SEED_DAYS: u16 = 20;
const SEED_PAGES_PER_DAY: u16 = 3;

fn page(n: u16) -> Result<PageNumber, hifz_core::Error> {
    Ok(PageNumber::new(n)?)
}

fn days_ago(today: NaiveDate, days: u16) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(today)
}

/// Writes a few weeks of plausible history for one student.
async fn seed(entries: &EntryService, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let today = entries.today();
    entries
        .register_student(args.student_id, &args.name, None, Some(days_ago(today, SEED_DAYS)))
        .await?;

    for day in 0..SEED_DAYS {
        let start = day * SEED_PAGES_PER_DAY + 1;
        let end = start + SEED_PAGES_PER_DAY - 1;
        let mut draft = JadeedDraft::new(days_ago(today, SEED_DAYS - day), page(start)?, page(end)?);
        draft.pages_completed = f64::from(SEED_PAGES_PER_DAY);
        draft.minor_mistakes = u32::from(day % 3);
        draft.overall_grade = Some(GradeValue::from(if day % 4 == 0 { "جيد" } else { "جيد جدا" }));
        entries.commit_jadeed(args.student_id, draft).await?;
    }

    let last = SEED_DAYS * SEED_PAGES_PER_DAY;
    let mut juzhali = ReviewDraft::juzhali(days_ago(today, 1));
    for (offset, (major, minor)) in [(0, 0), (1, 1), (0, 3), (0, 0), (2, 1)].into_iter().enumerate() {
        let offset = u16::try_from(offset)?;
        let mut entry = PageEntry::new(page(last - offset)?, major, minor);
        if major > 0 {
            entry = entry.with_mistake("Memorization", "Forgot the opening of the page");
        }
        juzhali.record_page(entry);
    }
    juzhali.set_overall_grade("جيد");
    entries.commit_review(args.student_id, juzhali).await?;

    let mut murajaat = ReviewDraft::murajaat(today, Section::new(1)?);
    for (n, major, minor) in [(1, 0, 1), (2, 1, 0), (3, 0, 0), (4, 0, 2)] {
        murajaat.record_page(PageEntry::new(page(n)?, major, minor));
    }
    murajaat.set_overall_grade("جيد جدا");
    murajaat.set_notes("Steady recitation");
    entries.commit_review(args.student_id, murajaat).await?;

    let mut marks = BasicEntry::new(Stage::Murajaat, days_ago(today, 7));
    marks.section = Some(Section::new(2)?);
    marks.page = Some("21-25".into());
    marks.overall_grade = Some(GradeValue::Numeric(7.5));
    entries.record_basic(args.student_id, &marks).await?;

    log::info!("seeded student {} through page {last}", args.student_id);
    println!(
        "Seeded student {} ({}) with {} Jadeed sessions through page {last}.",
        args.student_id, args.name, SEED_DAYS
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means a report.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Report,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Report,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite in the binary glue.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = HifzServices::new_sqlite(&parsed.db_url, Clock::default_clock()).await?;
    log::debug!("opened {}", parsed.db_url);

    match cmd {
        Command::Report => {
            let overview = services
                .progress()
                .overview(parsed.student_id, &parsed.window)
                .await?;
            if parsed.json {
                println!("{}", overview.to_json()?);
            } else {
                print_report(&overview);
            }
        }
        Command::Students => {
            let students = services.progress().students().await?;
            if students.is_empty() {
                println!("No students yet. Run `seed` to create one.");
            }
            for student in students {
                match student.teacher_name() {
                    Some(teacher) => println!("{:>4}  {}  ({teacher})", student.id(), student.name()),
                    None => println!("{:>4}  {}", student.id(), student.name()),
                }
            }
        }
        Command::Seed => seed(&services.entries(), &parsed).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
