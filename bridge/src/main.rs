mod fan_override;
mod host;
mod outdoor;
mod thermostat;
mod timer;
mod weather;
mod writer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
