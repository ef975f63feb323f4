use anyhow::Result;
use pdf_notes::interaction::{self, Prompter};
use pdf_notes::utils::logging;
use pdf_notes::{App, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 交互部分在处理开始前完成
    let request = interaction::resolve_request(&config, &mut Prompter::stdio())?;

    let app = App::initialize(config).await?;

    tokio::select! {
        result = app.run(request) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("\n用户中断，程序退出");
        }
    }

    Ok(())
}
