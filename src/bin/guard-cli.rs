use clap::{Parser, Subcommand};
use futures_util::stream;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Probe an ingress-guard server's origin gate and upload limit", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:7860")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a GET with a chosen Origin or Referer
    Probe {
        #[arg(long, default_value = "/api/v1/flows")]
        path: String,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        referer: Option<String>,
    },
    /// Stream a body of `chunks` × `chunk_kb` KiB to the upload endpoint
    Upload {
        #[arg(long, default_value_t = 3)]
        chunks: usize,
        #[arg(long, default_value_t = 400)]
        chunk_kb: usize,
        #[arg(long)]
        origin: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Probe { path, origin, referer } => {
            let mut headers = HeaderMap::new();
            if let Some(origin) = origin {
                headers.insert(ORIGIN, HeaderValue::from_str(&origin)?);
            }
            if let Some(referer) = referer {
                headers.insert(REFERER, HeaderValue::from_str(&referer)?);
            }
            let res = client
                .get(format!("{}{}", cli.url, path))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Upload { chunks, chunk_kb, origin } => {
            let body = stream::iter(
                (0..chunks).map(move |_| Ok::<_, std::io::Error>(vec![0u8; chunk_kb * 1024])),
            );
            let mut request = client
                .post(format!("{}/api/v1/files/upload", cli.url))
                .body(reqwest::Body::wrap_stream(body));
            if let Some(origin) = origin {
                request = request.header(ORIGIN, origin);
            }
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    println!("Status: {}", status);

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
