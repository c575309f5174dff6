mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use lokal::config::TUNNEL_TEMPLATE;
use lokal::{Lokal, TunnelFile, TunnelResponse};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    match cli.command {
        Commands::Create { config, base_url } => create_tunnel(&config, base_url).await,
        Commands::Check { config } => check_tunnel_file(&config),
        Commands::Template { output } => generate_template(output.as_deref()),
    }
}

/// 创建隧道并以 JSON 输出守护进程响应
async fn create_tunnel(path: &str, base_url: Option<String>) -> Result<()> {
    info!("Loading tunnel definition from: {}", path);
    let mut file = TunnelFile::load(path)?;
    if let Some(url) = base_url {
        file.daemon.base_url = url;
    }

    let lokal = Lokal::with_config(file.daemon.clone()).context("Invalid daemon configuration")?;
    let tunnel = file.tunnel.build(&lokal);
    let response = tunnel
        .create()
        .await
        .with_context(|| format!("Failed to create tunnel '{}'", file.tunnel.name))?;

    let output = match response {
        TunnelResponse::Success(info) => serde_json::to_value(info)?,
        TunnelResponse::Failure { message } => {
            serde_json::json!({ "success": false, "message": message })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// 检查隧道定义文件
fn check_tunnel_file(path: &str) -> Result<()> {
    let file = TunnelFile::load(path)?;
    let lokal = Lokal::with_config(file.daemon.clone()).context("Invalid daemon configuration")?;
    file.tunnel
        .build(&lokal)
        .validate()
        .context("Tunnel validation failed")?;

    println!("✓ Tunnel definition is valid: {}", path);
    println!("  daemon: {}", lokal.base_url());
    Ok(())
}

/// 生成隧道定义模板
fn generate_template(output: Option<&str>) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, TUNNEL_TEMPLATE)
            .with_context(|| format!("Failed to write tunnel template to {}", path))?;
        println!("Generated tunnel template: {}", path);
    } else {
        println!("{}", TUNNEL_TEMPLATE);
    }

    Ok(())
}
