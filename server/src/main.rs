use clap::Parser;
use museos_cli::{config::ServerConfig, utils};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Local server for the CDMX museum visualizer", long_about = None)]
struct Args {
    /// Port to listen on (defaults to MUSEOS_PORT or 8000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to serve (defaults to MUSEOS_ROOT or the current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(root) = args.root {
        config.root = root;
    }
    let root = config.root.canonicalize().unwrap_or_else(|_| config.root.clone());

    let listener = server::bind(&config).await?;

    println!("{}", "=".repeat(50));
    println!("🏛️ CDMX MUSEOS - Servidor Local");
    println!("{}", "=".repeat(50));
    println!();
    println!("✓ Servidor iniciado en: http://localhost:{}", config.port);
    println!("✓ Directorio: {}", root.display());
    println!();
    println!("Presiona Ctrl+C para detener el servidor");
    println!("{}", "=".repeat(50));

    server::serve(listener, &config).await?;
    println!("\n✓ Servidor detenido.");
    Ok(())
}
