use crate::config::AppConfig;

/// 初始化日志：同时输出到终端和数据目录下的日志文件
pub fn init_logging(config: &AppConfig) -> Result<(), fern::InitError> {
    std::fs::create_dir_all(&config.data_dir)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.log_level_filter())
        .level_for("tao", log::LevelFilter::Warn)
        .level_for("wry", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .chain(fern::log_file(config.log_path())?)
        .apply()?;

    Ok(())
}
