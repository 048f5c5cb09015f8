use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use trawler::queue::RedisJobQueue;
use trawler::search::{SearchQuery, TantivySink};
use trawler::storage::{Database, JobRepository};
use trawler::urls::normalize_url;
use trawler::{init, CrawlerConfig, Worker};
use tracing::info;

#[derive(Parser)]
#[command(name = "trawler")]
#[command(about = "A distributed web crawler feeding a full-text search index")]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Run a crawl worker process
    Worker,
    /// Submit a crawl job for a seed URL
    Crawl {
        #[arg(short, long)]
        url: String,
        #[arg(long, default_value = "3")]
        max_depth: i32,
        #[arg(long)]
        domain: Vec<String>,
        #[arg(long, default_value = "5")]
        priority: i32,
    },
    /// Query the full-text index
    Search {
        query: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
        #[arg(long)]
        domain: Option<String>,
    },
    /// Show frontier and queue statistics
    Stats,
}

#[tokio::main]
async fn main() -> trawler::Result<()> {
    let args = Args::parse();

    init()?;

    let config = CrawlerConfig::from_file(&args.config).unwrap_or_else(|e| {
        info!("Using default configuration ({}: {})", args.config, e);
        CrawlerConfig::default()
    });

    match args.command {
        Commands::Worker => {
            let pool = Database::connect(&config.storage.database_url, 10).await?;
            Database::migrate(&pool).await?;

            let queue = Arc::new(RedisJobQueue::connect(&config.storage.redis_url).await?);
            let sink = Arc::new(TantivySink::new(Path::new(&config.storage.index_path))?);

            let worker = Arc::new(Worker::new(config, pool, queue, sink).await?);
            worker.run().await?;
        }
        Commands::Crawl {
            url,
            max_depth,
            domain,
            priority,
        } => {
            let pool = Database::connect(&config.storage.database_url, 5).await?;
            Database::migrate(&pool).await?;

            let seed = normalize_url(&url, None)?;
            let jobs = JobRepository::new(pool.clone());
            let job = jobs.create(&seed, max_depth, &domain, priority).await?;

            let frontier = trawler::frontier::Frontier::new(pool);
            frontier
                .enqueue(&seed, None, 0, priority, Some(job.id))
                .await?;

            println!("Submitted crawl job {} for {}", job.id, seed);
        }
        Commands::Search {
            query,
            limit,
            domain,
        } => {
            let search = SearchQuery::open(Path::new(&config.storage.index_path))?;
            let hits = search.search_in_domain(&query, domain.as_deref(), limit)?;

            if hits.is_empty() {
                println!("No results for '{}'", query);
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "{:2}. {} [{:.2}]\n    {}",
                    rank + 1,
                    hit.title.as_deref().unwrap_or("(untitled)"),
                    hit.score,
                    hit.url
                );
            }
        }
        Commands::Stats => {
            let pool = Database::connect(&config.storage.database_url, 5).await?;
            let frontier = trawler::frontier::Frontier::new(pool.clone());
            let stats = frontier.stats().await?;

            println!("Frontier:");
            println!("  pending:    {}", stats.pending);
            println!("  processing: {}", stats.processing);
            println!("  completed:  {}", stats.completed);
            println!("  failed:     {}", stats.failed);

            if let Ok(queue) = RedisJobQueue::connect(&config.storage.redis_url).await {
                use trawler::queue::JobQueue;
                let counts = queue.counts().await?;
                println!("Job queue:");
                println!("  waiting:   {}", counts.waiting);
                println!("  active:    {}", counts.active);
                println!("  delayed:   {}", counts.delayed);
                println!("  completed: {}", counts.completed);
                println!("  failed:    {}", counts.failed);
            }
        }
    }

    Ok(())
}
