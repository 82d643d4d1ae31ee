use flux_router::{logger, Config, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config path (without extension) as the first argument
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg)?;

    // Build the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = cfg.server.port;
    let mut app = Server::new(cfg);

    app.route("/hello")
        .get(|_req, res| Ok(res.end("Hello World")?))
        .post(|req, res| Ok(res.json(req.query())?));

    app.start(port, |addr| println!("server started on {addr}"))
        .await?;
    Ok(())
}
