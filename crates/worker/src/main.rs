use anyhow::Context;
use clap::{Parser, Subcommand};
use scorecard_core::batch::{
    BatchKind, BatchSummary, CompanyScoring, RecommendationBatchRunner, RunOptions,
};
use scorecard_core::config::Settings;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod rationale;
mod store;

#[derive(Debug, Parser)]
#[command(name = "scorecard_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Score as of this date (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long, global = true)]
    as_of_date: Option<String>,

    /// Score companies from price and financials only.
    #[arg(long, global = true)]
    without_sentiment: bool,

    /// Skip the text-generation provider and store the score summary.
    #[arg(long, global = true)]
    no_rationale: bool,

    /// Classify and log, but do not write to the database.
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recompute recommendations for every company.
    Companies,
    /// Recompute recommendations for every asset.
    Assets,
    /// Recompute the recommendation for one company.
    Company {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let run_id = uuid::Uuid::new_v4();

    let options = RunOptions {
        as_of: resolve_as_of_date(args.as_of_date.as_deref())?,
        recommended_at: chrono::Utc::now(),
        company_scoring: if args.without_sentiment {
            CompanyScoring::PriceFinancial
        } else {
            CompanyScoring::WithSentiment
        },
    };
    tracing::info!(%run_id, as_of = %options.as_of, command = ?args.command, dry_run = args.dry_run, "worker started");

    let rationale = rationale::build(&settings, args.no_rationale)?;

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    let source = Arc::new(scorecard_core::storage::subjects::PgSubjectSource::new(pool.clone()));
    let store = store::build(pool.clone(), args.dry_run);
    let runner = RecommendationBatchRunner::new(source, store, rationale, options);

    match args.command {
        Command::Companies => run_locked(&pool, &runner, BatchKind::Companies, run_id).await,
        Command::Assets => run_locked(&pool, &runner, BatchKind::Assets, run_id).await,
        Command::Company { id } => match runner.run_company(id).await {
            Ok(outcome) => {
                tracing::info!(
                    %run_id,
                    company_id = id,
                    record_id = outcome.record_id,
                    recommendation = %outcome.stored.recommendation.recommendation_type,
                    investment_score = outcome.stored.recommendation.investment_score,
                    risk_level = %outcome.stored.recommendation.risk_level,
                    "company recommendation updated"
                );
                Ok(())
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(%run_id, company_id = id, error = %err, "company recommendation failed");
                Err(err)
            }
        },
    }
}

async fn run_locked(
    pool: &sqlx::PgPool,
    runner: &RecommendationBatchRunner,
    kind: BatchKind,
    run_id: uuid::Uuid,
) -> anyhow::Result<()> {
    let Some(lock) = scorecard_core::storage::lock::try_acquire_batch_lock(pool, kind).await? else {
        tracing::warn!(%run_id, kind = kind.as_str(), "batch lock not acquired; another run in progress");
        return Ok(());
    };

    let result = match kind {
        BatchKind::Companies => runner.run_companies().await,
        BatchKind::Assets => runner.run_assets().await,
    };

    let lock_kind = lock.kind();
    match lock.release().await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(%run_id, kind = lock_kind.as_str(), "batch lock was not held at release"),
        Err(err) => tracing::warn!(%run_id, kind = lock_kind.as_str(), error = %err, "batch lock release failed"),
    }

    match result {
        Ok(summary) => {
            report(run_id, &summary);
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%run_id, kind = kind.as_str(), error = %err, "batch aborted");
            Err(err)
        }
    }
}

fn report(run_id: uuid::Uuid, summary: &BatchSummary) {
    for (subject, error) in &summary.failed {
        tracing::warn!(%run_id, %subject, %error, "subject not updated");
    }

    tracing::info!(
        %run_id,
        kind = summary.kind.as_str(),
        total = summary.total(),
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "batch summary"
    );

    if !summary.failed.is_empty() {
        sentry::capture_message(
            &format!(
                "{} batch finished with {} failed subject(s)",
                summary.kind.as_str(),
                summary.failed.len()
            ),
            sentry::Level::Warning,
        );
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn resolve_as_of_date(as_of_date_arg: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of-date {s:?} (expected YYYY-MM-DD)"));
    }
    Ok(chrono::Utc::now().date_naive())
}
