use byu_jwt::prelude::*;
use std::env;
use std::process::ExitCode;

// Usage: BYU_JWT=<token> [BYU_JWT_HOST=https://api-sandbox.byu.edu] cargo run --example verify_token
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(token) = env::var("BYU_JWT") else {
        eprintln!("Set BYU_JWT to the token to verify");
        return ExitCode::FAILURE;
    };

    let mut builder = ConfigBuilder::new();
    if let Ok(host) = env::var("BYU_JWT_HOST") {
        builder = match builder.host(&host) {
            Ok(builder) => builder,
            Err(e) => {
                eprintln!("Invalid host: {}", e);
                return ExitCode::FAILURE;
            }
        };
    }
    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(issuer) = get_issuer(&token) {
        println!("Token claims to be issued by {}", issuer);
    }

    let verifier = Verifier::new(config);
    match verifier.decode(&token).await {
        Ok(decoded) => {
            match serde_json::to_string_pretty(&decoded) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Could not render claims: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Token rejected: {}", e);
            let mut cause = std::error::Error::source(&e);
            while let Some(inner) = cause {
                eprintln!("  caused by: {}", inner);
                cause = inner.source();
            }
            ExitCode::FAILURE
        }
    }
}
