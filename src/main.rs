use chromedriver_fetch::error::with_context;
use chromedriver_fetch::infrastructure::logging::init_logger;
use chromedriver_fetch::{Cli, CommandHandler, Config, ContextualResult, RunOptions};
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprint!("{}", e.user_message());
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> ContextualResult<()> {
    let config = with_context(Config::load(), "加载配置文件")?;
    let options = with_context(RunOptions::from_cli(cli, &config), "解析命令行参数")?;
    let handler = with_context(CommandHandler::new(options), "初始化 HTTP 客户端")?;
    handler.run().await
}
