//! Example: Query NEAR mainnet for various information.
//!
//! Run with: RUST_LOG=near_jsonrpc_client=debug cargo run --example mainnet

use near_jsonrpc_client::{ClientConfig, MAINNET_RPC_URL, NearRpcClient, Result, types::*};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = NearRpcClient::new(ClientConfig::new(MAINNET_RPC_URL).with_retries(2))?;
    println!("=== NEAR Mainnet RPC Client (API {}) ===\n", near_jsonrpc_client::latest::VERSION);

    // 1. Node status
    println!("1. Fetching node status...");
    let status = client.status().await?;
    println!("   Chain ID: {}", status.chain_id);
    println!("   Protocol version: {}", status.protocol_version);
    println!("   Latest block height: {}", status.sync_info.latest_block_height);
    println!("   Latest block hash: {}", status.sync_info.latest_block_hash);
    println!("   Syncing: {}", status.sync_info.syncing);
    println!();

    // 2. Latest finalized block
    println!("2. Fetching latest block...");
    let block = client
        .block(RpcBlockRequest::from(RpcBlockRequestFinality {
            finality: Finality::Final,
        }))
        .await?;
    println!("   Block height: {}", block.header.height);
    println!("   Block hash: {}", block.header.hash);
    println!("   Author: {}", block.author);
    println!("   Chunks: {}", block.chunks.len());
    println!();

    // 3. Gas price
    println!("3. Fetching gas price...");
    let gas = client.gas_price(None).await?;
    println!("   Gas price: {} yoctoNEAR", gas.gas_price);
    println!();

    // 4. Account
    println!("4. Viewing account `near`...");
    let account = client.view_account("near", Finality::Final).await?;
    match account.amount.as_near_f64() {
        Ok(near) => println!("   Balance: {near:.2} NEAR"),
        Err(_) => println!("   Balance: {} yoctoNEAR", account.amount),
    }
    println!("   Storage used: {} bytes", account.storage_usage);
    println!();

    // 5. Any method by name
    println!("5. Calling `health` through a method handle...");
    if let Some(health) = client.method("health") {
        health.call(None).await?;
        println!("   Node is healthy");
    }

    println!("\n=== Done! ===");
    Ok(())
}
