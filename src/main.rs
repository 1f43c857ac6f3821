//! sysdash - System Telemetry Aggregator Binary
//!
//! Serves aggregated host telemetry over HTTP, or prints a single snapshot.

use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use sysdash::{
    start_web_server, Aggregator, AggregatorConfig, Snapshot, SysinfoProvider, WebConfig,
    DEFAULT_WEB_PORT,
};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sysdash")]
#[command(about = "System telemetry aggregator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Aggregates CPU, memory, disk, network, battery, process and thermal metrics into one snapshot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Seconds a filesystem listing is reused
    #[arg(long, default_value_t = 10)]
    fs_ttl: u64,

    /// Seconds a disk layout is reused
    #[arg(long, default_value_t = 30)]
    layout_ttl: u64,

    /// Seconds a battery reading is reused
    #[arg(long, default_value_t = 10)]
    battery_ttl: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve(ServeArgs),

    /// Print a snapshot and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// Aggregation passes to run before printing the last one
    #[arg(long, default_value_t = 1)]
    passes: u32,

    /// Delay between passes in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(&cli, args).await?,
        None => serve_command(&cli, &ServeArgs { no_cors: false }).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = build_subscriber(log_filter(cli, rust_log.as_deref()));

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// `RUST_LOG` directives win when they parse; otherwise the CLI flags pick the level.
fn log_filter(cli: &Cli, rust_log: Option<&str>) -> EnvFilter {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
        })
}

fn build_subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish()
}

fn aggregator_config(cli: &Cli) -> AggregatorConfig {
    AggregatorConfig::default()
        .with_file_system_ttl(Duration::from_secs(cli.fs_ttl))
        .with_disk_layout_ttl(Duration::from_secs(cli.layout_ttl))
        .with_battery_ttl(Duration::from_secs(cli.battery_ttl))
}

fn build_aggregator(cli: &Cli) -> Aggregator {
    Aggregator::new(Arc::new(SysinfoProvider::new()), aggregator_config(cli))
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    info!("Starting sysdash...");

    let web_config = web_config(cli, args);

    info!("Web server configuration:");
    info!("  - Bind address: {}:{}", web_config.host, web_config.port);
    info!("  - CORS enabled: {}", web_config.enable_cors);
    info!(
        "  - Cache TTLs: fs {:?}, layout {:?}, battery {:?}",
        web_config.aggregator.file_system_ttl,
        web_config.aggregator.disk_layout_ttl,
        web_config.aggregator.battery_ttl
    );

    start_web_server(web_config, Arc::new(SysinfoProvider::new())).await?;

    Ok(())
}

fn web_config(cli: &Cli, args: &ServeArgs) -> WebConfig {
    WebConfig::new(&cli.host, cli.port)
        .with_cors(!args.no_cors)
        .with_aggregator(aggregator_config(cli))
}

async fn snapshot_command(cli: &Cli, args: &SnapshotArgs) -> anyhow::Result<()> {
    if args.format != "json" && args.format != "pretty" {
        anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
    }

    let passes = if args.passes == 0 {
        warn!("--passes 0 requested, running a single pass");
        1
    } else {
        args.passes
    };

    let mut aggregator = build_aggregator(cli);
    let mut snapshot = aggregator.get_snapshot().await;
    for _ in 1..passes {
        tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        snapshot = aggregator.get_snapshot().await;
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_pretty_snapshot(&snapshot);
    }

    Ok(())
}

fn print_pretty_snapshot(snapshot: &Snapshot) {
    println!("System Snapshot ({})", snapshot.system_time);
    println!("==========================================");
    println!();

    println!("CPU:");
    println!("  Model: {}", snapshot.cpu_name);
    println!("  Cores: {}", snapshot.cpu_cores);
    println!("  Usage: {}%", snapshot.cpu);
    println!(
        "  Load: {:.2}, {:.2}, {:.2}",
        snapshot.load_average[0], snapshot.load_average[1], snapshot.load_average[2]
    );
    match &snapshot.temperature {
        Some(celsius) => println!("  Temperature: {}°C", celsius),
        None => println!("  Temperature: n/a"),
    }
    println!();

    println!("Memory:");
    println!("  Usage: {}% ({})", snapshot.ram, snapshot.ram_text);
    println!(
        "  Process: {:.1} MB resident",
        snapshot.heap.resident_bytes as f64 / 1024.0 / 1024.0
    );
    println!();

    if let Some(disk) = &snapshot.disk {
        println!("Disk ({}):", disk.mount_point);
        println!(
            "  {:.1} GB total, {:.1}% used",
            disk.total_bytes as f64 / 1024.0 / 1024.0 / 1024.0,
            disk.usage_percent
        );
        println!();
    }

    if !snapshot.file_system_info.is_empty() {
        println!("Filesystems:");
        for fs in &snapshot.file_system_info {
            println!(
                "  {} ({}): {:.1}% used",
                fs.mount, fs.fs_type, fs.usage_percent
            );
        }
        println!();
    }

    if !snapshot.network.is_empty() {
        println!("Network:");
        for iface in &snapshot.network {
            println!(
                "  {}: {} (TX: {:.1} MB, RX: {:.1} MB)",
                iface.iface,
                if iface.is_up { "UP" } else { "DOWN" },
                iface.tx_bytes as f64 / 1024.0 / 1024.0,
                iface.rx_bytes as f64 / 1024.0 / 1024.0
            );
        }
        println!(
            "  Speed: {:.1} KB/s down, {:.1} KB/s up",
            snapshot.network_speed.download / 1024.0,
            snapshot.network_speed.upload / 1024.0
        );
        println!();
    }

    if let Some(battery) = &snapshot.battery_status {
        println!("Battery:");
        println!(
            "  {}%{}",
            battery.percent,
            if battery.is_charging { " (charging)" } else { "" }
        );
        println!();
    }

    println!("System:");
    println!("  Hostname: {}", snapshot.hostname);
    println!("  Platform: {} ({})", snapshot.platform, snapshot.architecture);
    println!("  Uptime: {} seconds", snapshot.uptime);
    println!(
        "  Processes: {} ({} running, {} sleeping, {} blocked)",
        snapshot.process_count.all,
        snapshot.process_count.running,
        snapshot.process_count.sleeping,
        snapshot.process_count.blocked
    );
}
