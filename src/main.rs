use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nevermore_core::CourseLayout;
use nevermore_quiz::config::{default_config_path, Config};
use nevermore_quiz::{CourseProcessor, ProcessingResult, QuestionCounter, StructureAuditor};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nevermore-quiz")]
#[command(version)]
#[command(about = "Assemble lesson quizzes and summary quizzes for a video course")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: Overrides,

    /// Config file (defaults to nevermore-quiz.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Overrides {
    /// Seed for reproducible question sampling
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Lessons grouped into each quiz
    #[arg(long, global = true)]
    lessons_per_quiz: Option<usize>,

    /// Maximum questions per summary quiz file
    #[arg(long, global = true)]
    summary_cap: Option<usize>,

    /// Minimum summary questions per section
    #[arg(long, global = true)]
    min_summary: Option<usize>,

    /// Lesson directory to leave out (repeatable)
    #[arg(long = "omit", value_name = "LESSON", global = true)]
    omit: Vec<String>,

    /// Rewrite quiz files that already exist
    #[arg(long, global = true)]
    overwrite: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate quizzes, then summary quizzes
    Generate {
        /// Course directory
        course_dir: PathBuf,
    },
    /// Generate the primary quizzes and the quiz mapping file
    Quizzes {
        /// Course directory
        course_dir: PathBuf,
    },
    /// Generate summary quizzes from questions unused by existing quizzes
    Summary {
        /// Course directory
        course_dir: PathBuf,
    },
    /// Count questions per lesson and section
    Count {
        /// Course directory
        course_dir: PathBuf,
    },
    /// Check section and lesson naming and lesson videos
    Audit {
        /// Course directory
        course_dir: PathBuf,

        /// Also check video durations with ffprobe
        #[arg(long)]
        probe_durations: bool,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        path: Option<PathBuf>,
    },
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.processing.seed = Some(seed);
        }
        if let Some(lessons) = self.lessons_per_quiz {
            config.quiz.lessons_per_quiz = lessons;
        }
        if let Some(cap) = self.summary_cap {
            config.quiz.summary_cap = cap;
        }
        if let Some(min) = self.min_summary {
            config.quiz.min_summary = min;
        }
        config.quiz.omitted_lessons.extend(self.omit);
        if self.overwrite {
            config.processing.skip_existing = false;
        }
    }
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();
}

fn log_result(result: &ProcessingResult) {
    info!("✅ Written: {}", result.artifacts.written.len());
    info!("⏭️ Skipped (already present): {}", result.artifacts.skipped.len());
    if result.has_failures() {
        for path in &result.artifacts.failed {
            error!("❌ Failed: {}", path.display());
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Bootstrap subscriber while the config file is read
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .finish();
    let (mut config, source) =
        tracing::subscriber::with_default(bootstrap, || Config::load_with_source(cli.config.as_deref()))?;
    cli.overrides.apply(&mut config);
    init_logging(&config.logging.level, cli.verbose);

    match &source {
        Some(path) => info!("📄 Loaded configuration from: {}", path.display()),
        None => info!("📄 No config file found, using defaults"),
    }

    if cli.verbose {
        info!("Verbose logging enabled");
    }

    let succeeded = match cli.command {
        Commands::Generate { course_dir } => {
            info!("🚀 Nevermore quiz generation starting...");
            info!("{}", config.summary());
            let mut processor = CourseProcessor::new(config, course_dir)?;
            let result = processor.generate_all().await?;
            log_result(&result);
            !result.has_failures()
        }
        Commands::Quizzes { course_dir } => {
            let mut processor = CourseProcessor::new(config, course_dir)?;
            let result = processor.generate_quizzes().await?;
            log_result(&result);
            !result.has_failures()
        }
        Commands::Summary { course_dir } => {
            let mut processor = CourseProcessor::new(config, course_dir)?;
            let result = processor.generate_summary_quizzes().await?;
            log_result(&result);
            !result.has_failures()
        }
        Commands::Count { course_dir } => {
            config.validate()?;
            let layout = CourseLayout::new(course_dir, config.artifacts.clone());
            let counter = QuestionCounter::new(&layout, config.quiz.omitted_set(), config.quiz.lessons_per_quiz);
            let course = counter
                .count()
                .await
                .with_context(|| format!("Failed to count questions in {}", layout.root().display()))?;
            course.log_report();
            true
        }
        Commands::Audit {
            course_dir,
            probe_durations,
        } => {
            let mut audit_config = config.audit.clone();
            audit_config.probe_durations |= probe_durations;
            let layout = CourseLayout::new(course_dir, config.artifacts.clone());
            let findings = StructureAuditor::new(&layout, audit_config).audit().await?;

            if findings.is_empty() {
                info!("✅ Course structure looks good");
            }
            for finding in &findings {
                warn!("⚠️ {}", finding);
            }
            findings.is_empty()
        }
        Commands::InitConfig { path } => {
            let path = path.unwrap_or_else(default_config_path);
            Config::default().save(&path)?;
            info!("Edit {} and pass it with --config", path.display());
            true
        }
    };

    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
