use anyhow::Context;
use clap::{Parser, ValueEnum};

use rspods::contexts::create_client;
use rspods::utils::{calculate_age, config};
use rspods::{get_replica_set_pods, logging, PodSource, ReplicaSetPodFetcher, ReplicaSetPods};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

/// Show the pods of a replica set, most restarted first
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Name of the replica set
    replica_set: String,

    #[arg(short, long, env = "RSPODS_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Maximum number of pods to show; 0 or less shows all of them
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    limit: i64,

    /// Stored kubeconfig name, kubeconfig file path, or "default"
    #[arg(long, env = "RSPODS_KUBECONFIG", default_value = config::DEFAULT_KUBECONFIG)]
    kubeconfig: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let client = create_client(&cli.kubeconfig)
        .await
        .with_context(|| format!("Failed to connect using kubeconfig '{}'", cli.kubeconfig))?;
    let fetcher = ReplicaSetPodFetcher::new(client);

    let pods = fetch_ranked_pods(&fetcher, &cli).await?;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pods)?),
        OutputFormat::Table => print!("{}", render_table(&pods)),
    }
    Ok(())
}

async fn fetch_ranked_pods<S>(source: &S, cli: &Cli) -> anyhow::Result<ReplicaSetPods>
where
    S: PodSource,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    get_replica_set_pods(source, &cli.namespace, &cli.replica_set, cli.limit)
        .await
        .with_context(|| format!("Failed to fetch pods of {}/{}", cli.namespace, cli.replica_set))
}

fn render_table(pods: &ReplicaSetPods) -> String {
    let rows: Vec<[String; 4]> = pods
        .pods
        .iter()
        .map(|pod| {
            let containers = pod
                .pod_containers()
                .iter()
                .map(|c| format!("{}:{}", c.name, c.restart_count))
                .collect::<Vec<_>>()
                .join(",");
            [
                pod.name.clone(),
                pod.total_restart_count().to_string(),
                calculate_age(pod.start_time.as_ref()),
                containers,
            ]
        })
        .collect();

    let header = ["NAME", "RESTARTS", "AGE", "CONTAINERS"].map(String::from);
    let mut widths = header.each_ref().map(String::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("   ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
