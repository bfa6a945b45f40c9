#[tokio::main]
async fn main() {
    if let Err(err) = ssh_broker::mcp::server::run_stdio().await {
        eprintln!("ssh-broker: {}", err);
        std::process::exit(1);
    }
}
