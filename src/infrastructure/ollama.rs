//! 本地 Ollama 服务
//!
//! Ollama 提供兼容 OpenAI 的接口（`http://localhost:11434/v1`），
//! 所以 LLM 调用部分不需要区分；这里只负责在端口空闲时把 `ollama serve` 拉起来。

use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{error, info};

/// 等待服务启动的时间
const STARTUP_GRACE: Duration = Duration::from_secs(1);

/// 检查端口上是否已有服务在监听
pub async fn is_listening(port: u16) -> bool {
    TcpStream::connect(("127.0.0.1", port)).await.is_ok()
}

/// 确保 ollama 服务可用
///
/// 端口已被占用时直接返回 `true`；否则启动 `<command> serve`，
/// 稍等片刻后返回端口是否可连接。启动失败只记录日志。
pub async fn ensure_ollama(command: &str, port: u16) -> bool {
    if is_listening(port).await {
        info!("✓ 端口 {} 上已有 ollama 服务", port);
        return true;
    }

    let spawned = Command::new(command)
        .arg("serve")
        .env("OLLAMA_HOST", format!("127.0.0.1:{}", port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = spawned {
        error!("❌ 启动 {} serve 失败: {}", command, e);
        return false;
    }

    sleep(STARTUP_GRACE).await;

    let up = is_listening(port).await;
    if up {
        info!("🚀 ollama serve 启动成功 (端口 {})", port);
    } else {
        error!("❌ ollama serve 已启动但端口 {} 仍不可连接", port);
    }
    up
}
