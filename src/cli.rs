use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lokal")]
#[command(author, version, about = "Create tunnels through the local Lokal Client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 根据隧道定义文件创建隧道
    Create {
        /// 隧道定义文件路径
        #[arg(short, long, default_value = "tunnel.toml")]
        config: String,

        /// 覆盖守护进程地址
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    /// 检查隧道定义文件（不连接守护进程）
    Check {
        /// 隧道定义文件路径
        #[arg(short, long)]
        config: String,
    },
    /// 生成隧道定义模板
    Template {
        /// 输出文件路径
        #[arg(short, long)]
        output: Option<String>,
    },
}
