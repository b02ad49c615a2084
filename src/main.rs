// ==========================================
// 订单表格导入系统 - 命令行入口
// ==========================================
// 子命令: import / init-db / config
// 退出码: 致命中止时非 0（行级失败不影响退出码）
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use order_sheet_import::config::{ConfigManager, ImportConfigReader};
use order_sheet_import::db::{get_default_db_path, init_schema, open_sqlite_connection};
use order_sheet_import::{logging, ImportReport, OrderImportRunner, APP_NAME, VERSION};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "order-sheet-import")]
#[command(about = "订单表格导入: 订单导出表 → 订单/明细", long_about = None)]
struct Cli {
    /// 数据库路径（默认: $ORDER_SHEET_IMPORT_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导入订单表格（.xlsx/.xlsm/.xls/.ods/.csv）
    Import {
        /// 表格文件路径
        file: PathBuf,

        /// 演练: 完整执行后回滚，不留任何写入
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// 表头行号（从 0 开始）
        #[arg(long)]
        header_row: Option<usize>,

        /// 新订单的默认币种
        #[arg(long)]
        currency: Option<String>,

        /// 添加明细时检查库存（不扣减）
        #[arg(long, default_value_t = false)]
        track_inventory: bool,

        /// 输出完整 JSON 报告
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// 初始化数据库 schema（幂等）
    InitDb,

    /// 查看或修改导入配置
    Config {
        /// 写入配置项（KEY=VALUE，可重复）
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::debug!("{} v{}", APP_NAME, VERSION);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);

    match cli.cmd {
        Commands::InitDb => {
            open_database(&db_path)?;
            println!("数据库已初始化: {}", db_path);
            Ok(())
        }

        Commands::Config { set } => {
            let conn = Arc::new(Mutex::new(open_database(&db_path)?));
            let config = ConfigManager::from_connection(conn);

            for pair in &set {
                let (key, value) = pair
                    .split_once('=')
                    .with_context(|| format!("配置项格式应为 KEY=VALUE: {}", pair))?;
                config
                    .set_global_config_value(key.trim(), value.trim())
                    .with_context(|| format!("写入配置失败: {}", key))?;
            }

            // 校验生效配置可被解析
            config.column_layout().context("列布局配置无效")?;
            config.import_options().context("导入选项配置无效")?;

            println!("{}", config.get_config_snapshot().context("读取配置失败")?);
            Ok(())
        }

        Commands::Import {
            file,
            dry_run,
            header_row,
            currency,
            track_inventory,
            json,
        } => {
            if !file.exists() {
                bail!("文件不存在: {}", file.display());
            }

            let conn = Arc::new(Mutex::new(open_database(&db_path)?));
            let config = ConfigManager::from_connection(conn.clone());

            let layout = config.column_layout().context("列布局配置无效")?;
            let mut options = config.import_options().context("导入选项配置无效")?;

            // 命令行参数覆盖配置
            options.dry_run = dry_run;
            if let Some(idx) = header_row {
                options.header_row_index = idx;
            }
            if let Some(code) = currency {
                options.default_currency = code.trim().to_uppercase();
            }
            if track_inventory {
                options.track_inventory_levels = true;
            }

            let runner = OrderImportRunner::new(conn, layout, options);
            match runner.run_file(&file) {
                Ok(report) => {
                    print_report(&report, json)?;
                    Ok(())
                }
                Err(aborted) => {
                    print_report(&aborted.report, json)?;
                    Err(anyhow::Error::new(aborted.source)
                        .context(format!("导入中止: {}", file.display())))
                }
            }
        }
    }
}

/// 打开数据库并确保 schema 存在
fn open_database(db_path: &str) -> Result<rusqlite::Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
        }
    }

    let conn = open_sqlite_connection(db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("数据库 schema 初始化失败")?;
    Ok(conn)
}

fn print_report(report: &ImportReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("报告序列化失败")?
        );
        return Ok(());
    }

    println!("{}", report.summary_line());
    for failure in &report.failures {
        println!(
            "  行 {} [{}] {}",
            failure.row_index, failure.kind, failure.message
        );
    }
    for warning in &report.warnings {
        println!("  行 {} [告警] {}", warning.row_index, warning.message);
    }
    Ok(())
}
