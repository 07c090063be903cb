use hub::runtime::{boot, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    boot::init_logging();
    let (state, config) = boot::boot()?;
    serve::serve(state, config).await
}
